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

use std::collections::HashSet;
use std::mem;

use log::warn;
use rayon::prelude::*;

use super::find_first_non_master_position;
use super::readable::ReadableLoadOrder;
use crate::error::Error;
use crate::game_settings::GameSettings;
use crate::path_cache::PathCache;
use crate::plugin::{trim_dot_ghost, Plugin};

pub const MAX_ACTIVE_PLUGINS: usize = 255;

/// Mutation helpers shared by the three load order strategies. Each helper
/// either upholds the load order's structural rules (no duplicates, masters
/// before non-masters, implicit actives present and active, at most 255
/// active) or reports an error without committing a change.
pub trait MutableLoadOrder: ReadableLoadOrder {
    fn plugins_mut(&mut self) -> &mut Vec<Plugin>;

    fn path_cache(&self) -> &PathCache;

    fn path_cache_mut(&mut self) -> &mut PathCache;

    /// Where a plugin belongs when appended rather than explicitly placed.
    /// `None` means the end of the load order.
    fn insert_position(&self, plugin: &Plugin) -> Option<usize>;

    fn append_position(&self, plugin: &Plugin) -> usize {
        self.insert_position(plugin)
            .unwrap_or_else(|| self.plugins().len())
    }

    fn count_active_plugins(&self) -> usize {
        self.plugins().iter().filter(|p| p.is_active()).count()
    }

    fn find_plugin_mut(&mut self, plugin_name: &str) -> Option<&mut Plugin> {
        self.plugins_mut()
            .iter_mut()
            .find(|p| p.name_matches(plugin_name))
    }

    fn insert(&mut self, plugin: Plugin) -> usize {
        match self.insert_position(&plugin) {
            Some(position) => {
                self.plugins_mut().insert(position, plugin);
                position
            }
            None => {
                self.plugins_mut().push(plugin);
                self.plugins().len() - 1
            }
        }
    }

    fn add_to_load_order(&mut self, plugin_name: &str) -> Result<usize, Error> {
        let plugin = Plugin::new(plugin_name, self.game_settings())?;

        Ok(self.insert(plugin))
    }

    fn find_or_add(&mut self, plugin_name: &str) -> Result<usize, Error> {
        match self.index_of(plugin_name) {
            Some(index) => Ok(index),
            None => self.add_to_load_order(plugin_name),
        }
    }

    /// Re-read any plugin whose backing file has changed since it was last
    /// parsed, dropping entries whose files are gone or no longer parse.
    fn reload_changed_plugins(&mut self) {
        self.plugins_mut()
            .retain_mut(|plugin| match plugin.has_file_changed() {
                Ok(false) => true,
                Ok(true) => {
                    let reloaded = plugin.reload().is_ok();
                    if !reloaded {
                        warn!(
                            "Dropping \"{}\" from the load order: it no longer parses",
                            plugin.name()
                        );
                    }
                    reloaded
                }
                Err(_) => {
                    warn!(
                        "Dropping \"{}\" from the load order: its file cannot be read",
                        plugin.name()
                    );
                    false
                }
            });
    }

    /// Append every installed plugin that is not already present. Implicitly
    /// active plugins are left out: they are appended separately so that
    /// they land in their method-specific positions.
    fn add_missing_plugins(&mut self) -> Result<(), Error> {
        let filenames = self.missing_plugin_filenames()?;

        let new_plugins: Vec<Plugin> = {
            let game_settings = self.game_settings();
            filenames
                .par_iter()
                .filter(|filename| Plugin::is_valid(filename, game_settings))
                .filter_map(|filename| Plugin::new(filename, game_settings).ok())
                .collect()
        };

        for plugin in new_plugins {
            if self.index_of(plugin.name()).is_none() {
                self.insert(plugin);
            }
        }

        Ok(())
    }

    fn missing_plugin_filenames(&self) -> Result<Vec<String>, Error> {
        let directory = self.game_settings().plugins_directory();
        if !directory.is_dir() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&directory)
            .map_err(|e| Error::IoError(directory.clone(), e))?
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false));

        let mut candidates = Vec::new();
        for entry in entries {
            if let Some(filename) = entry.file_name().to_str() {
                if !self
                    .game_settings()
                    .is_implicitly_active(trim_dot_ghost(filename))
                    && self.index_of(filename).is_none()
                {
                    let modification_time = entry.metadata().and_then(|m| m.modified()).ok();
                    candidates.push((filename.to_owned(), modification_time));
                }
            }
        }

        // Sort by ascending modification time, breaking ties by filename in
        // descending order, so that appends are deterministic whatever order
        // the directory iterates in.
        candidates.sort_by(|a, b| match a.1.cmp(&b.1) {
            std::cmp::Ordering::Equal => b.0.cmp(&a.0),
            x => x,
        });

        let filenames: Vec<String> = candidates.into_iter().map(|(name, _)| name).collect();

        // When a plugin exists both ghosted and unghosted, the unghosted file
        // wins.
        let mut seen: HashSet<String> = HashSet::with_capacity(filenames.len());
        let (unghosted, ghosted): (Vec<String>, Vec<String>) = filenames
            .into_iter()
            .partition(|f| trim_dot_ghost(f).len() == f.len());

        let mut filenames = Vec::new();
        for filename in unghosted.into_iter().chain(ghosted) {
            if seen.insert(trim_dot_ghost(&filename).to_lowercase()) {
                filenames.push(filename);
            }
        }

        Ok(filenames)
    }

    /// Add any installed implicitly active plugins that are missing, at their
    /// method-specific positions, and activate them. A missing game master is
    /// inferred to load first rather than being required.
    fn add_implicitly_active_plugins(&mut self) -> Result<(), Error> {
        let implicitly_active_plugins =
            self.game_settings().implicitly_active_plugins().to_vec();

        for plugin_name in implicitly_active_plugins {
            if self.is_active(&plugin_name) || !Plugin::is_valid(&plugin_name, self.game_settings())
            {
                continue;
            }

            let index = self.find_or_add(&plugin_name)?;
            self.plugins_mut()[index].activate()?;
        }

        Ok(())
    }

    /// Deactivate from the end of the load order until no more than the
    /// maximum are active, leaving implicitly active plugins alone.
    fn deactivate_excess_plugins(&mut self) {
        let implicitly_active_plugins =
            self.game_settings().implicitly_active_plugins().to_vec();
        let mut count = self.count_active_plugins();

        if count > MAX_ACTIVE_PLUGINS {
            warn!(
                "{} plugins are active, deactivating down to the limit of {}",
                count, MAX_ACTIVE_PLUGINS
            );
        }

        for plugin in self.plugins_mut().iter_mut().rev() {
            if count <= MAX_ACTIVE_PLUGINS {
                break;
            }
            if plugin.is_active()
                && !implicitly_active_plugins
                    .iter()
                    .any(|i| plugin.name_matches(i))
            {
                plugin.deactivate();
                count -= 1;
            }
        }
    }

    /// Apply one entry read from an order file: a known name moves to its
    /// recomputed append position only if that position differs, a new valid
    /// name is inserted there, anything else is skipped.
    fn move_or_insert_entry(&mut self, plugin_name: &str) -> Result<(), Error> {
        if let Some(current_position) = self.index_of(plugin_name) {
            let mut new_position = self.append_position(&self.plugins()[current_position]);

            if new_position != current_position {
                if new_position > current_position {
                    new_position -= 1;
                }

                let plugin = self.plugins_mut().remove(current_position);
                self.plugins_mut().insert(new_position, plugin);
            }
        } else if Plugin::is_valid(plugin_name, self.game_settings()) {
            self.add_to_load_order(plugin_name)?;
        } else {
            warn!(
                "Ignoring \"{}\": it is not an installed plugin",
                plugin_name
            );
        }

        Ok(())
    }

    fn apply_ordered_entries(&mut self, plugin_names: &[String]) -> Result<(), Error> {
        for plugin_name in plugin_names {
            self.move_or_insert_entry(plugin_name)?;
        }
        Ok(())
    }

    /// Clear every active flag, then activate the named plugins, appending
    /// any that are installed but not yet listed. Names that resolve to
    /// nothing installed are skipped.
    fn activate_listed_plugins(&mut self, plugin_names: &[String]) -> Result<(), Error> {
        for plugin in self.plugins_mut().iter_mut() {
            plugin.deactivate();
        }

        for plugin_name in plugin_names {
            let index = match self.index_of(plugin_name) {
                Some(index) => Some(index),
                None if Plugin::is_valid(plugin_name, self.game_settings()) => {
                    Some(self.add_to_load_order(plugin_name)?)
                }
                None => {
                    warn!(
                        "Ignoring active plugin \"{}\": it is not installed",
                        plugin_name
                    );
                    None
                }
            };

            if let Some(index) = index {
                self.plugins_mut()[index].activate()?;
            }
        }

        Ok(())
    }

    /// Stage a full replacement sequence and swap it in, then append any
    /// installed plugins the given names left out.
    fn replace_plugins(&mut self, plugin_names: &[&str]) -> Result<(), Error> {
        validate_plugin_names(plugin_names, self.game_settings())?;

        let mut plugins = map_to_plugins(self, plugin_names)?;

        if !is_partitioned_by_master_flag(&plugins) {
            return Err(Error::NonMasterBeforeMaster);
        }

        mem::swap(&mut plugins, self.plugins_mut());

        self.add_missing_plugins()
    }

    /// Move a plugin to the given position, or insert it there, after
    /// checking that the move keeps all masters before all non-masters.
    fn move_or_insert_plugin_with_index(
        &mut self,
        plugin_name: &str,
        position: usize,
    ) -> Result<(), Error> {
        match self.index_of(plugin_name) {
            Some(current_position) => {
                let is_master = self.plugins()[current_position].is_master_file();
                self.validate_master_partition(is_master, position, Some(current_position))?;

                let plugin = self.plugins_mut().remove(current_position);
                let position = position.min(self.plugins().len());
                self.plugins_mut().insert(position, plugin);
            }
            None => {
                if !Plugin::is_valid(plugin_name, self.game_settings()) {
                    return Err(Error::InvalidPlugin(plugin_name.to_owned()));
                }

                let plugin = Plugin::new(plugin_name, self.game_settings())?;
                self.validate_master_partition(plugin.is_master_file(), position, None)?;

                let position = position.min(self.plugins().len());
                self.plugins_mut().insert(position, plugin);
            }
        }

        Ok(())
    }

    fn validate_master_partition(
        &self,
        is_master: bool,
        position: usize,
        current_position: Option<usize>,
    ) -> Result<(), Error> {
        let partition_point = find_first_non_master_position(self.plugins())
            .unwrap_or_else(|| self.plugins().len());

        if !is_master && position < partition_point {
            return Err(Error::NonMasterBeforeMaster);
        }

        if is_master
            && ((position > partition_point && partition_point != self.plugins().len())
                || (current_position
                    .map(|c| c < partition_point)
                    .unwrap_or(false)
                    && position == partition_point))
        {
            return Err(Error::NonMasterBeforeMaster);
        }

        Ok(())
    }

    fn observe_tracked_paths(&mut self) {
        let plugins_directory = self.game_settings().plugins_directory();
        let active_plugins_file = self.game_settings().active_plugins_file().clone();
        let load_order_file = self.game_settings().load_order_file().cloned();

        let path_cache = self.path_cache_mut();
        path_cache.observe(&plugins_directory);
        path_cache.observe(&active_plugins_file);
        if let Some(path) = load_order_file {
            path_cache.observe(&path);
        }
    }

    /// Discard all in-memory state, forcing the next load to rebuild from
    /// disk.
    fn clear(&mut self) {
        self.plugins_mut().clear();
        self.path_cache_mut().clear();
    }
}

fn validate_plugin_names(
    plugin_names: &[&str],
    game_settings: &GameSettings,
) -> Result<(), Error> {
    let mut unique_plugin_names = HashSet::with_capacity(plugin_names.len());
    for plugin_name in plugin_names {
        if !unique_plugin_names.insert(trim_dot_ghost(plugin_name).to_lowercase()) {
            return Err(Error::DuplicatePlugin((*plugin_name).to_owned()));
        }
    }

    let invalid_plugin = plugin_names
        .iter()
        .find(|p| !Plugin::is_valid(p, game_settings));

    match invalid_plugin {
        Some(x) => Err(Error::InvalidPlugin((*x).to_owned())),
        None => Ok(()),
    }
}

fn to_plugin(
    plugin_name: &str,
    existing_plugins: &[Plugin],
    game_settings: &GameSettings,
) -> Result<Plugin, Error> {
    match existing_plugins.iter().find(|p| p.name_matches(plugin_name)) {
        None => Plugin::new(plugin_name, game_settings),
        Some(x) => Ok(x.clone()),
    }
}

fn map_to_plugins<T: MutableLoadOrder + ?Sized>(
    load_order: &T,
    plugin_names: &[&str],
) -> Result<Vec<Plugin>, Error> {
    plugin_names
        .iter()
        .map(|n| to_plugin(n, load_order.plugins(), load_order.game_settings()))
        .collect()
}

fn is_partitioned_by_master_flag(plugins: &[Plugin]) -> bool {
    let first_non_master_position = match find_first_non_master_position(plugins) {
        None => return true,
        Some(x) => x,
    };

    match plugins.iter().rposition(Plugin::is_master_file) {
        None => true,
        Some(last_master_position) => last_master_position < first_non_master_position,
    }
}
