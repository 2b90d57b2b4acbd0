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

//! # libmodorder
//!
//! libmodorder is a free software library for manipulating the load order and
//! active status of plugins for the following games:
//!
//! * TES III: Morrowind
//! * TES IV: Oblivion
//! * TES V: Skyrim
//! * TES V: Skyrim Special Edition
//! * Fallout 3
//! * Fallout: New Vegas
//! * Fallout 4
//!
//! ## Thread Safety
//!
//! Reading and writing data through a single [GameHandle] is protected by
//! mutual exclusion. Game handles operate independently, so using more than
//! one game handle for a single game across multiple threads is not advised:
//! filesystem changes made when writing data are not atomic and data races
//! may occur under such usage.
//!
//! ## Data Caching
//!
//! Plugin data is cached to improve performance. Each game handle has its
//! own unique cache, and change detection is performed whenever an operation
//! on a game handle is called, using file and directory modification times.
//! If changes are detected, the necessary data are reloaded before the
//! operation acts on them.
//!
//! Edits made to a plugin are only detected if that plugin's timestamp
//! changes. If edits are made and the timestamp is unchanged, the changes
//! can only be picked up through [GameHandle::update_cache].
//!
//! ## Plugin Validity
//!
//! Where operations take one or more plugin filenames, they check that these
//! filenames correspond to valid plugins: files ending in `.esp`, `.esm`,
//! `.esp.ghost` or `.esm.ghost` whose headers parse for the given game. This
//! is more permissive than the games themselves, but the library uses no
//! plugin data beyond the header record, so later corruption or invalid data
//! does not affect its behaviour.
//!
//! ## Valid Load Orders
//!
//! Any load order that is set must contain only installed plugins, contain
//! no duplicate entries, load all master files before all non-master files
//! (the master bit flag, rather than the file extension, is what is
//! checked), list no more than 255 plugins as active, and, for games other
//! than the timestamp-based ones, list the game's master file first.
//!
//! Loading is less strict: a missing game master is inferred to load first,
//! installed implicitly active plugins are inferred to be active, and an
//! over-full active plugin list is trimmed from the end.

mod encoding;
mod enums;
mod error;
mod game_settings;
mod ghostable_path;
mod handle;
mod ini;
mod load_order;
mod path_cache;
mod plugin;
#[cfg(test)]
mod tests;

pub use crate::enums::{GameId, LoadOrderMethod};
pub use crate::error::Error;
pub use crate::game_settings::GameSettings;
pub use crate::handle::GameHandle;
pub use crate::load_order::{ReadableLoadOrder, WritableLoadOrder};
pub use crate::plugin::Plugin;
