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

use std::path::Path;
use std::sync::RwLock;

use log::warn;

use crate::enums::{GameId, LoadOrderMethod};
use crate::error::Error;
use crate::game_settings::GameSettings;
use crate::load_order::WritableLoadOrder;

/// A game's load order state, kept coherent with the filesystem.
///
/// Every operation begins by bringing the in-memory state up to date with
/// what is on disk, which is cheap when nothing has changed externally, and
/// mutations write their result back before returning. If a reload or a
/// write-back fails, the cached state is discarded so that the next
/// operation rebuilds it from disk.
///
/// Operations on one handle are serialised; handles for the same game
/// directories operate independently and the last write wins at file
/// granularity.
pub struct GameHandle {
    load_order: RwLock<Box<dyn WritableLoadOrder + Send + Sync>>,
}

impl GameHandle {
    /// Create a handle for a game installed at `game_path`.
    ///
    /// `local_path` is the game's folder under the user's local app data
    /// directory. It may only be omitted on Windows, where it can be looked
    /// up, or for Morrowind, which keeps everything in the game folder.
    ///
    /// If the game stores its load order in text files, this checks whether
    /// those files agree with each other and logs a warning when they do
    /// not; [GameHandle::is_self_consistent] exposes the same check.
    pub fn new(
        game_id: GameId,
        game_path: &Path,
        local_path: Option<&Path>,
    ) -> Result<GameHandle, Error> {
        if !game_path.is_dir() {
            return Err(Error::InvalidPath(game_path.to_path_buf()));
        }

        let game_settings = match local_path {
            Some(local_path) => {
                if local_path.exists() && !local_path.is_dir() {
                    return Err(Error::InvalidPath(local_path.to_path_buf()));
                }

                GameSettings::with_local_path(game_id, game_path, local_path)?
            }
            None => GameSettings::new(game_id, game_path)?,
        };

        let load_order = game_settings.into_load_order();

        match load_order.is_self_consistent() {
            Ok(true) => {}
            Ok(false) => warn!(
                "The load order and active plugins files for {game_id:?} do not agree with \
                 each other"
            ),
            Err(e) => warn!("Could not check whether the load order files agree: {e}"),
        }

        Ok(GameHandle {
            load_order: RwLock::new(load_order),
        })
    }

    pub fn game_id(&self) -> Result<GameId, Error> {
        Ok(self.load_order.read()?.game_settings().id())
    }

    pub fn load_order_method(&self) -> Result<LoadOrderMethod, Error> {
        Ok(self.load_order.read()?.game_settings().load_order_method())
    }

    pub fn game_master(&self) -> Result<String, Error> {
        Ok(self
            .load_order
            .read()?
            .game_settings()
            .master_file()
            .to_owned())
    }

    /// Replace the game's master file. Only games with timestamp-based load
    /// ordering support this; for the others the master file is structural.
    pub fn set_game_master(&self, master_file: &str) -> Result<(), Error> {
        self.load_order
            .write()?
            .game_settings_mut()
            .set_master_file(master_file.to_owned())
    }

    pub fn implicitly_active_plugins(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .load_order
            .read()?
            .game_settings()
            .implicitly_active_plugins()
            .to_vec())
    }

    pub fn is_implicitly_active(&self, plugin_name: &str) -> Result<bool, Error> {
        Ok(self
            .load_order
            .read()?
            .game_settings()
            .is_implicitly_active(plugin_name))
    }

    /// Whether the game's load order files agree with each other. Games with
    /// a single source of truth are always self-consistent.
    pub fn is_self_consistent(&self) -> Result<bool, Error> {
        self.load_order.read()?.is_self_consistent()
    }

    /// Discard all cached state and reload from disk.
    pub fn update_cache(&self) -> Result<(), Error> {
        let mut load_order = self.load_order.write()?;
        load_order.clear();

        load_with_cleanup(load_order.as_mut())
    }

    /// Reload the load order and active plugin lists and write them straight
    /// back out, dropping entries for plugins that are no longer installed
    /// and restoring the structural rules the files may have broken.
    pub fn fix_plugin_lists(&self) -> Result<(), Error> {
        let mut load_order = self.load_order.write()?;

        load_with_cleanup(load_order.as_mut())?;

        if let Err(e) = load_order.save() {
            load_order.clear();
            return Err(e);
        }

        Ok(())
    }

    pub fn load_order(&self) -> Result<Vec<String>, Error> {
        self.query(|load_order| {
            load_order
                .plugin_names()
                .into_iter()
                .map(str::to_owned)
                .collect()
        })
    }

    pub fn set_load_order(&self, plugin_names: &[&str]) -> Result<(), Error> {
        self.mutate(|load_order| load_order.set_load_order(plugin_names))
    }

    pub fn plugin_position(&self, plugin_name: &str) -> Result<Option<usize>, Error> {
        self.query(|load_order| load_order.index_of(plugin_name))
    }

    pub fn plugin_at_position(&self, position: usize) -> Result<Option<String>, Error> {
        self.query(|load_order| load_order.plugin_at(position).map(str::to_owned))
    }

    pub fn set_plugin_position(&self, plugin_name: &str, position: usize) -> Result<(), Error> {
        self.mutate(|load_order| load_order.set_plugin_index(plugin_name, position))
    }

    pub fn active_plugins(&self) -> Result<Vec<String>, Error> {
        self.query(|load_order| {
            load_order
                .active_plugin_names()
                .into_iter()
                .map(str::to_owned)
                .collect()
        })
    }

    pub fn is_plugin_active(&self, plugin_name: &str) -> Result<bool, Error> {
        self.query(|load_order| load_order.is_active(plugin_name))
    }

    pub fn set_plugin_active(&self, plugin_name: &str, active: bool) -> Result<(), Error> {
        self.mutate(|load_order| {
            if active {
                load_order.activate(plugin_name)
            } else {
                load_order.deactivate(plugin_name)
            }
        })
    }

    pub fn set_active_plugins(&self, active_plugin_names: &[&str]) -> Result<(), Error> {
        self.mutate(|load_order| load_order.set_active_plugins(active_plugin_names))
    }

    fn query<T>(
        &self,
        operation: impl FnOnce(&(dyn WritableLoadOrder + Send + Sync)) -> T,
    ) -> Result<T, Error> {
        let mut load_order = self.load_order.write()?;

        load_with_cleanup(load_order.as_mut())?;

        Ok(operation(load_order.as_ref()))
    }

    fn mutate<T>(
        &self,
        operation: impl FnOnce(&mut (dyn WritableLoadOrder + Send + Sync)) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut load_order = self.load_order.write()?;

        load_with_cleanup(load_order.as_mut())?;

        let result = operation(load_order.as_mut())?;

        if let Err(e) = load_order.save() {
            load_order.clear();
            return Err(e);
        }

        Ok(result)
    }
}

fn load_with_cleanup(load_order: &mut (dyn WritableLoadOrder + Send + Sync)) -> Result<(), Error> {
    if let Err(e) = load_order.load() {
        load_order.clear();
        return Err(e);
    }

    Ok(())
}
