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
use super::{create_parent_dirs, find_first_non_master_position, read_plugin_names};
use crate::encoding::{utf8_to_windows_1252, windows_1252_to_utf8};
use crate::error::Error;
use crate::game_settings::GameSettings;
use crate::path_cache::PathCache;
use crate::plugin::Plugin;

/// Load order and active set both defined by `plugins.txt` (Windows-1252):
/// every plugin is listed, with a leading `*` marking the active ones.
/// Implicitly active plugins never appear in the file and cluster at the
/// start of the load order in their declared order.
#[derive(Clone, Debug)]
pub struct AsteriskBasedLoadOrder {
    game_settings: GameSettings,
    plugins: Vec<Plugin>,
    path_cache: PathCache,
}

impl AsteriskBasedLoadOrder {
    pub fn new(game_settings: GameSettings) -> Self {
        Self {
            game_settings,
            plugins: Vec::new(),
            path_cache: PathCache::default(),
        }
    }
}

impl ReadableLoadOrder for AsteriskBasedLoadOrder {
    fn game_settings(&self) -> &GameSettings {
        &self.game_settings
    }

    fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }
}

impl MutableLoadOrder for AsteriskBasedLoadOrder {
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
        // Implicitly active plugins keep their declared order at the start of
        // the load order, packed by how many of their predecessors are
        // installed.
        let mut installed_count = 0;
        for plugin_name in self.game_settings().implicitly_active_plugins() {
            if plugin.name_matches(plugin_name) {
                return Some(installed_count);
            }

            if self.index_of(plugin_name).is_some()
                || Plugin::is_valid(plugin_name, self.game_settings())
            {
                installed_count += 1;
            }
        }

        if plugin.is_master_file() {
            find_first_non_master_position(self.plugins())
        } else {
            None
        }
    }
}

impl WritableLoadOrder for AsteriskBasedLoadOrder {
    fn game_settings_mut(&mut self) -> &mut GameSettings {
        &mut self.game_settings
    }

    fn load(&mut self) -> Result<(), Error> {
        self.reload_changed_plugins();

        let active_file_modified = self
            .path_cache()
            .is_modified(self.game_settings().active_plugins_file());

        if active_file_modified {
            debug!("Active plugins file has changed, re-reading it");
            let plugin_names = read_plugin_names(
                self.game_settings().active_plugins_file(),
                asterisk_line_mapper,
            )?;

            let plugin_names: Vec<String> = {
                let game_settings = self.game_settings();
                plugin_names
                    .into_iter()
                    .filter(|name| !game_settings.is_implicitly_active(name))
                    .collect()
            };

            self.apply_ordered_entries(&plugin_names)?;
        }

        let plugins_directory = self.game_settings().plugins_directory();
        if plugins_directory.is_dir() && self.path_cache().is_modified(&plugins_directory) {
            debug!("Plugins directory has changed, scanning it");
            self.add_missing_plugins()?;
        }

        if active_file_modified {
            let active_names = read_plugin_names(
                self.game_settings().active_plugins_file(),
                active_asterisk_line_mapper,
            )?;
            self.activate_listed_plugins(&active_names)?;
        }

        self.add_implicitly_active_plugins()?;

        self.deactivate_excess_plugins();

        self.observe_tracked_paths();

        Ok(())
    }

    fn save(&mut self) -> Result<(), Error> {
        let path = self.game_settings().active_plugins_file().clone();
        create_parent_dirs(&path)?;

        let mut contents = Vec::new();
        let mut encode_error = None;
        for plugin in self.plugins() {
            // Implicitly active plugins must not be listed.
            if self.game_settings().is_implicitly_active(plugin.name()) {
                continue;
            }

            match utf8_to_windows_1252(plugin.name()) {
                Ok(bytes) => {
                    if plugin.is_active() {
                        contents.push(b'*');
                    }
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
}

fn asterisk_line_mapper(line: &[u8]) -> Result<Option<String>, Error> {
    let name = line.strip_prefix(b"*").unwrap_or(line);

    windows_1252_to_utf8(name).map(Some)
}

fn active_asterisk_line_mapper(line: &[u8]) -> Result<Option<String>, Error> {
    match line.strip_prefix(b"*") {
        Some(name) => windows_1252_to_utf8(name).map(Some),
        None => Ok(None),
    }
}
