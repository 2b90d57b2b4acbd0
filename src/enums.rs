/*
 * This file is part of libmodorder
 *
 * Copyright (C) 2017 Oliver Hamlet
 *
 * libmodorder is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * libmodorder is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with libmodorder. If not, see <http://www.gnu.org/licenses/>.
 */

/// The mechanism through which a game persists its load order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LoadOrderMethod {
    /// Load order is defined by plugin file modification timestamps.
    Timestamp,
    /// Load order is defined by `loadorder.txt`, with `plugins.txt` holding
    /// the active plugins.
    Textfile,
    /// Load order and active plugins are both defined by `plugins.txt`,
    /// using a leading asterisk to mark active plugins.
    Asterisk,
}

/// The games that the library supports.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GameId {
    Morrowind,
    Oblivion,
    Skyrim,
    Fallout3,
    FalloutNV,
    Fallout4,
    SkyrimSE,
}

impl GameId {
    pub fn to_esplugin_id(self) -> esplugin::GameId {
        match self {
            GameId::Morrowind => esplugin::GameId::Morrowind,
            GameId::Oblivion => esplugin::GameId::Oblivion,
            GameId::Skyrim => esplugin::GameId::Skyrim,
            GameId::Fallout3 => esplugin::GameId::Fallout3,
            GameId::FalloutNV => esplugin::GameId::FalloutNV,
            GameId::Fallout4 => esplugin::GameId::Fallout4,
            GameId::SkyrimSE => esplugin::GameId::SkyrimSE,
        }
    }
}
