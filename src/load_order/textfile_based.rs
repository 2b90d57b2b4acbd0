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

use log::debug;
use unicase::eq;

use super::mutable::MutableLoadOrder;
use super::readable::ReadableLoadOrder;
use super::writable::WritableLoadOrder;
use super::{create_parent_dirs, find_first_non_master_position, plugin_line_mapper,
            read_plugin_names, read_utf8_plugin_names};
use crate::encoding::utf8_to_windows_1252;
use crate::error::Error;
use crate::game_settings::GameSettings;
use crate::path_cache::PathCache;
use crate::plugin::{trim_dot_ghost, Plugin};

/// Load order defined by `loadorder.txt` (UTF-8, every installed plugin),
/// with `plugins.txt` (Windows-1252) holding the active plugins minus the
/// game's master file, which is implicitly active. The active plugins file
/// doubles as an order source when `loadorder.txt` is absent.
#[derive(Clone, Debug)]
pub struct TextfileBasedLoadOrder {
    game_settings: GameSettings,
    plugins: Vec<Plugin>,
    path_cache: PathCache,
}

impl TextfileBasedLoadOrder {
    pub fn new(game_settings: GameSettings) -> Self {
        Self {
            game_settings,
            plugins: Vec::new(),
            path_cache: PathCache::default(),
        }
    }
}

impl ReadableLoadOrder for TextfileBasedLoadOrder {
    fn game_settings(&self) -> &GameSettings {
        &self.game_settings
    }

    fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }
}

impl MutableLoadOrder for TextfileBasedLoadOrder {
    fn plugins_mut(&mut self) -> &mut Vec<Plugin> {
        &mut self.plugins
    }

    fn path_cache(&self) -> &PathCache {
        &self.path_cache
    }

    fn path_cache_mut(&mut self) -> &mut PathCache {
        &mut self.path_cache
    }

    fn insert_position(&self, plugin: &Plugin) -> Option<usize> {
        if plugin.name_matches(self.game_settings().master_file()) {
            Some(0)
        } else if plugin.is_master_file() {
            find_first_non_master_position(self.plugins())
        } else {
            None
        }
    }
}

impl WritableLoadOrder for TextfileBasedLoadOrder {
    fn game_settings_mut(&mut self) -> &mut GameSettings {
        &mut self.game_settings
    }

    fn load(&mut self) -> Result<(), Error> {
        self.reload_changed_plugins();

        let load_order_file_modified = self
            .game_settings()
            .load_order_file()
            .map(|p| self.path_cache().is_modified(p))
            .unwrap_or(false);
        let active_file_modified = self
            .path_cache()
            .is_modified(self.game_settings().active_plugins_file());

        if load_order_file_modified {
            if let Some(path) = self.game_settings().load_order_file().cloned() {
                debug!("Load order file has changed, re-reading it");
                let plugin_names = read_utf8_plugin_names(&path)?;
                self.apply_ordered_entries(&plugin_names)?;
            }
        } else if active_file_modified {
            // With no load order file to go by, the active plugins file's
            // order is the best source available.
            debug!("Active plugins file has changed, re-reading it as an order source");
            let plugin_names = read_plugin_names(
                self.game_settings().active_plugins_file(),
                plugin_line_mapper,
            )?;
            self.apply_ordered_entries(&plugin_names)?;
        }

        let plugins_directory = self.game_settings().plugins_directory();
        if plugins_directory.is_dir() && self.path_cache().is_modified(&plugins_directory) {
            debug!("Plugins directory has changed, scanning it");
            self.add_missing_plugins()?;
        }

        if active_file_modified {
            let plugin_names = read_plugin_names(
                self.game_settings().active_plugins_file(),
                plugin_line_mapper,
            )?;
            self.activate_listed_plugins(&plugin_names)?;
        }

        self.add_implicitly_active_plugins()?;

        self.deactivate_excess_plugins();

        self.observe_tracked_paths();

        Ok(())
    }

    fn save(&mut self) -> Result<(), Error> {
        if let Some(path) = self.game_settings().load_order_file().cloned() {
            create_parent_dirs(&path)?;

            let mut contents = Vec::new();
            for plugin in self.plugins() {
                contents.extend_from_slice(plugin.name().as_bytes());
                contents.push(b'\n');
            }

            std::fs::write(&path, contents).map_err(|e| Error::IoError(path.clone(), e))?;
            self.path_cache_mut().observe(&path);
        }

        let path = self.game_settings().active_plugins_file().clone();
        create_parent_dirs(&path)?;

        let mut contents = Vec::new();
        let mut encode_error = None;
        let master_file = self.game_settings().master_file().to_owned();
        for plugin in self.plugins() {
            // The game master is not listed: it is loaded unconditionally.
            if !plugin.is_active() || plugin.name_matches(&master_file) {
                continue;
            }

            match utf8_to_windows_1252(plugin.name()) {
                Ok(bytes) => {
                    contents.extend_from_slice(&bytes);
                    contents.push(b'\n');
                }
                Err(error) => {
                    encode_error = Some(error);
                }
            }
        }

        std::fs::write(&path, contents).map_err(|e| Error::IoError(path.clone(), e))?;
        self.path_cache_mut().observe(&path);

        match encode_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn set_load_order(&mut self, plugin_names: &[&str]) -> Result<(), Error> {
        let master_file = self.game_settings().master_file().to_owned();
        if plugin_names.is_empty() || !eq(plugin_names[0], master_file.as_str()) {
            return Err(Error::GameMasterMustLoadFirst(master_file));
        }

        self.replace_plugins(plugin_names)?;

        // The game's master file is always loaded.
        if let Some(plugin) = self.plugins_mut().first_mut() {
            plugin.activate()?;
        }

        Ok(())
    }

    fn set_plugin_index(&mut self, plugin_name: &str, position: usize) -> Result<(), Error> {
        let master_file = self.game_settings().master_file().to_owned();

        if position != 0 && !self.plugins().is_empty() && eq(plugin_name, master_file.as_str()) {
            return Err(Error::GameMasterMustLoadFirst(master_file));
        }
        if position == 0 && !eq(plugin_name, master_file.as_str()) {
            return Err(Error::GameMasterMustLoadFirst(master_file));
        }

        self.move_or_insert_plugin_with_index(plugin_name, position)
    }

    fn is_self_consistent(&self) -> Result<bool, Error> {
        let load_order_file = match self.game_settings().load_order_file() {
            Some(path) => path,
            None => return Ok(true),
        };

        if !load_order_file.exists() || !self.game_settings().active_plugins_file().exists() {
            return Ok(true);
        }

        let load_order_names = read_utf8_plugin_names(load_order_file)?;
        let active_names = read_plugin_names(
            self.game_settings().active_plugins_file(),
            plugin_line_mapper,
        )?;

        // Names that only appear in loadorder.txt don't make the two files
        // disagree; once they are dropped, the files must list the same
        // plugins in the same order.
        let filtered_names: Vec<&String> = load_order_names
            .iter()
            .filter(|l| active_names.iter().any(|a| plugin_names_match(a, l)))
            .collect();

        let consistent = filtered_names.len() == active_names.len()
            && filtered_names
                .iter()
                .zip(active_names.iter())
                .all(|(l, a)| plugin_names_match(l, a));

        Ok(consistent)
    }
}

fn plugin_names_match(name1: &str, name2: &str) -> bool {
    eq(trim_dot_ghost(name1), trim_dot_ghost(name2))
}
