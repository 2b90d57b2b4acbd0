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

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;

use super::mutable::MutableLoadOrder;
use super::readable::ReadableLoadOrder;
use super::writable::WritableLoadOrder;
use super::{create_parent_dirs, find_first_non_master_position, plugin_line_mapper,
            read_plugin_names};
use crate::encoding::utf8_to_windows_1252;
use crate::enums::GameId;
use crate::error::Error;
use crate::game_settings::GameSettings;
use crate::ini::{read_game_files, read_game_files_prelude};
use crate::path_cache::PathCache;
use crate::plugin::Plugin;

/// Load order defined by plugin file modification timestamps, in ascending
/// order with masters before non-masters. The active plugins file only holds
/// the active set: for Morrowind it is the ini's `[Game Files]` section, for
/// the other games a plain list.
#[derive(Clone, Debug)]
pub struct TimestampBasedLoadOrder {
    game_settings: GameSettings,
    plugins: Vec<Plugin>,
    path_cache: PathCache,
}

impl TimestampBasedLoadOrder {
    pub fn new(game_settings: GameSettings) -> Self {
        Self {
            game_settings,
            plugins: Vec::new(),
            path_cache: PathCache::default(),
        }
    }
}

impl ReadableLoadOrder for TimestampBasedLoadOrder {
    fn game_settings(&self) -> &GameSettings {
        &self.game_settings
    }

    fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }
}

impl MutableLoadOrder for TimestampBasedLoadOrder {
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
        if plugin.is_master_file() {
            find_first_non_master_position(self.plugins())
        } else {
            None
        }
    }
}

impl WritableLoadOrder for TimestampBasedLoadOrder {
    fn game_settings_mut(&mut self) -> &mut GameSettings {
        &mut self.game_settings
    }

    fn load(&mut self) -> Result<(), Error> {
        self.reload_changed_plugins();

        let plugins_directory = self.game_settings().plugins_directory();
        if plugins_directory.is_dir() && self.path_cache().is_modified(&plugins_directory) {
            debug!("Plugins directory has changed, scanning it");
            self.add_missing_plugins()?;

            self.plugins_mut().sort_by(compare_timestamp_order);
        }

        if self
            .path_cache()
            .is_modified(self.game_settings().active_plugins_file())
        {
            debug!("Active plugins file has changed, re-reading it");
            let plugin_names = read_active_plugin_names(self.game_settings())?;
            self.activate_listed_plugins(&plugin_names)?;
        }

        self.add_implicitly_active_plugins()?;

        self.deactivate_excess_plugins();

        self.observe_tracked_paths();

        Ok(())
    }

    fn save(&mut self) -> Result<(), Error> {
        // Reuse the timestamps that are already set, padding with one-minute
        // increments where plugins currently share a timestamp, so that the
        // on-disk modification times change as little as possible.
        let mut timestamps: BTreeSet<SystemTime> = self
            .plugins()
            .iter()
            .map(Plugin::modification_time)
            .collect();

        while timestamps.len() < self.plugins().len() {
            let next = *timestamps.iter().next_back().unwrap_or(&UNIX_EPOCH)
                + Duration::from_secs(60);
            timestamps.insert(next);
        }

        let timestamps: Vec<SystemTime> = timestamps.into_iter().collect();
        for (plugin, timestamp) in self.plugins_mut().iter_mut().zip(timestamps) {
            plugin.set_modification_time(timestamp)?;
        }

        save_active_plugins(self)?;

        self.observe_tracked_paths();

        Ok(())
    }

    fn set_load_order(&mut self, plugin_names: &[&str]) -> Result<(), Error> {
        self.replace_plugins(plugin_names)
    }

    fn set_plugin_index(&mut self, plugin_name: &str, position: usize) -> Result<(), Error> {
        self.move_or_insert_plugin_with_index(plugin_name, position)
    }
}

fn compare_timestamp_order(a: &Plugin, b: &Plugin) -> Ordering {
    if a.is_master_file() == b.is_master_file() {
        // sort_by is stable, so plugins sharing a timestamp keep their
        // existing relative order.
        a.modification_time().cmp(&b.modification_time())
    } else if a.is_master_file() {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn read_active_plugin_names(game_settings: &GameSettings) -> Result<Vec<String>, Error> {
    if game_settings.id() == GameId::Morrowind {
        read_game_files(game_settings.active_plugins_file())
    } else {
        read_plugin_names(game_settings.active_plugins_file(), plugin_line_mapper)
    }
}

fn save_active_plugins(load_order: &mut TimestampBasedLoadOrder) -> Result<(), Error> {
    let path = load_order.game_settings().active_plugins_file().clone();
    create_parent_dirs(&path)?;

    let is_morrowind = load_order.game_settings().id() == GameId::Morrowind;
    let mut contents = if is_morrowind {
        read_game_files_prelude(&path)?
    } else {
        Vec::new()
    };

    let mut encode_error = None;
    let mut entry_index = 0;
    for plugin in load_order.plugins() {
        if !plugin.is_active() {
            continue;
        }

        match utf8_to_windows_1252(plugin.name()) {
            Ok(bytes) => {
                if is_morrowind {
                    contents.extend_from_slice(format!("GameFile{entry_index}=").as_bytes());
                    entry_index += 1;
                }
                contents.extend_from_slice(&bytes);
                contents.push(b'\n');
            }
            Err(error) => {
                // Other entries are still written; the failure is reported
                // once the file is complete.
                encode_error = Some(error);
            }
        }
    }

    std::fs::write(&path, contents).map_err(|e| Error::IoError(path.clone(), e))?;
    load_order.path_cache_mut().observe(&path);

    match encode_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
