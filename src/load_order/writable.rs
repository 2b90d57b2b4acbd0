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

use unicase::eq;

use super::mutable::{MutableLoadOrder, MAX_ACTIVE_PLUGINS};
use crate::error::Error;
use crate::game_settings::GameSettings;
use crate::plugin::Plugin;

/// The public mutations. `load` and `save` are strategy-specific; the
/// active-set operations are shared.
pub trait WritableLoadOrder: MutableLoadOrder {
    fn game_settings_mut(&mut self) -> &mut GameSettings;

    /// Bring the in-memory state into agreement with the on-disk state,
    /// re-reading only what the path cache reports as changed.
    fn load(&mut self) -> Result<(), Error>;

    fn save(&mut self) -> Result<(), Error>;

    fn set_load_order(&mut self, plugin_names: &[&str]) -> Result<(), Error>;

    fn set_plugin_index(&mut self, plugin_name: &str, position: usize) -> Result<(), Error>;

    /// Whether the on-disk sources agree with one another. Only the Textfile
    /// method has more than one source, so this defaults to true.
    fn is_self_consistent(&self) -> Result<bool, Error> {
        Ok(true)
    }

    fn activate(&mut self, plugin_name: &str) -> Result<(), Error> {
        if !self.is_active(plugin_name) && self.count_active_plugins() >= MAX_ACTIVE_PLUGINS {
            return Err(Error::TooManyActivePlugins);
        }

        if self.index_of(plugin_name).is_none() {
            if !Plugin::is_valid(plugin_name, self.game_settings()) {
                return Err(Error::InvalidPlugin(plugin_name.to_owned()));
            }

            self.add_to_load_order(plugin_name)?;
        }

        self.find_plugin_mut(plugin_name)
            .ok_or_else(|| Error::PluginNotFound(plugin_name.to_owned()))?
            .activate()
    }

    fn deactivate(&mut self, plugin_name: &str) -> Result<(), Error> {
        if self.game_settings().is_implicitly_active(plugin_name) {
            return Err(Error::ImplicitlyActivePlugin(plugin_name.to_owned()));
        }

        // A plugin that is not in the load order is already inactive.
        if let Some(plugin) = self.find_plugin_mut(plugin_name) {
            plugin.deactivate();
        }

        Ok(())
    }

    fn set_active_plugins(&mut self, active_plugin_names: &[&str]) -> Result<(), Error> {
        if active_plugin_names.len() > MAX_ACTIVE_PLUGINS {
            return Err(Error::TooManyActivePlugins);
        }

        for plugin_name in active_plugin_names {
            if self.index_of(plugin_name).is_none()
                && !Plugin::is_valid(plugin_name, self.game_settings())
            {
                return Err(Error::InvalidPlugin((*plugin_name).to_owned()));
            }
        }

        let implicitly_active_plugins =
            self.game_settings().implicitly_active_plugins().to_vec();
        for plugin_name in implicitly_active_plugins {
            if !Plugin::is_valid(&plugin_name, self.game_settings()) {
                continue;
            }

            if !active_plugin_names.iter().any(|p| eq(*p, plugin_name.as_str())) {
                return Err(Error::ImplicitlyActivePlugin(plugin_name));
            }
        }

        for plugin in self.plugins_mut().iter_mut() {
            plugin.deactivate();
        }

        for plugin_name in active_plugin_names {
            let index = self.find_or_add(plugin_name)?;
            self.plugins_mut()[index].activate()?;
        }

        Ok(())
    }
}
