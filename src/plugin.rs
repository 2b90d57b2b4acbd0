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

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use esplugin::ParseOptions;
use filetime::{set_file_mtime, FileTime};
use unicase::eq;

use crate::enums::GameId;
use crate::error::Error;
use crate::game_settings::GameSettings;
use crate::ghostable_path::GhostablePath;

/// One installed plugin: its canonical (unghosted) name, the physical path
/// and parsed header data behind it, the modification time observed when it
/// was last read, and whether it is active. Identity is the canonical name,
/// compared case-insensitively.
#[derive(Clone, Debug)]
pub struct Plugin {
    name: String,
    path: PathBuf,
    game: GameId,
    active: bool,
    modification_time: SystemTime,
    data: esplugin::Plugin,
}

impl Plugin {
    pub fn new(filename: &str, game_settings: &GameSettings) -> Result<Plugin, Error> {
        let filepath = game_settings.plugin_path(filename).resolve_path()?;

        let modification_time = file_modification_time(&filepath)?;

        let mut data = esplugin::Plugin::new(game_settings.id().to_esplugin_id(), &filepath);
        data.parse_file(ParseOptions::header_only())
            .map_err(|_| Error::PluginParsingError(filepath.clone()))?;

        let name = name_string(&filepath)?;

        Ok(Plugin {
            name,
            path: filepath,
            game: game_settings.id(),
            active: false,
            modification_time,
            data,
        })
    }

    /// The canonical filename, with any `.ghost` suffix stripped.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_matches(&self, string: &str) -> bool {
        eq(self.name.as_str(), trim_dot_ghost(string))
    }

    pub fn modification_time(&self) -> SystemTime {
        self.modification_time
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the master flag is set in the plugin's header. The file
    /// extension is not what is checked.
    pub fn is_master_file(&self) -> bool {
        self.data.is_master_file()
    }

    /// The master files this plugin declares as its dependencies.
    pub fn masters(&self) -> Result<Vec<String>, Error> {
        self.data
            .masters()
            .map_err(|_| Error::PluginParsingError(self.path.clone()))
    }

    pub fn has_file_changed(&self) -> Result<bool, Error> {
        let current_modification_time = file_modification_time(&self.path)?;

        Ok(self.modification_time != current_modification_time)
    }

    pub fn reload(&mut self) -> Result<(), Error> {
        self.modification_time = file_modification_time(&self.path)?;
        self.data
            .parse_file(ParseOptions::header_only())
            .map_err(|_| Error::PluginParsingError(self.path.clone()))
    }

    pub fn set_modification_time(&mut self, time: SystemTime) -> Result<(), Error> {
        set_file_mtime(&self.path, FileTime::from_system_time(time))
            .map_err(|e| Error::IoError(self.path.clone(), e))?;

        self.modification_time = time;
        Ok(())
    }

    /// Set the active flag, un-ghosting the plugin file first if necessary.
    /// Idempotent when the plugin is already active.
    pub fn activate(&mut self) -> Result<(), Error> {
        if self.active {
            return Ok(());
        }

        if self.path.has_ghost_extension() {
            let new_path = self.path.unghost()?;

            self.modification_time = file_modification_time(&new_path)?;

            let mut data = esplugin::Plugin::new(self.game.to_esplugin_id(), &new_path);
            data.parse_file(ParseOptions::header_only())
                .map_err(|_| Error::PluginParsingError(new_path.clone()))?;

            self.data = data;
            self.path = new_path;
        }

        self.active = true;
        Ok(())
    }

    /// Clear the active flag. Deactivation never ghosts the file.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_valid(filename: &str, game_settings: &GameSettings) -> bool {
        if !has_plugin_extension(filename) {
            return false;
        }

        match game_settings.plugin_path(filename).resolve_path() {
            Ok(filepath) => esplugin::Plugin::is_valid(
                game_settings.id().to_esplugin_id(),
                &filepath,
                ParseOptions::header_only(),
            ),
            Err(_) => false,
        }
    }
}

impl PartialEq for Plugin {
    fn eq(&self, other: &Plugin) -> bool {
        eq(self.name.as_str(), other.name.as_str())
    }
}

impl Eq for Plugin {}

impl PartialEq<str> for Plugin {
    fn eq(&self, other: &str) -> bool {
        self.name_matches(other)
    }
}

pub fn trim_dot_ghost(string: &str) -> &str {
    if iends_with_ascii(string, ".ghost") {
        &string[..string.len() - ".ghost".len()]
    } else {
        string
    }
}

fn name_string(path: &Path) -> Result<String, Error> {
    match path.file_name().and_then(|f| f.to_str()) {
        Some(filename) => Ok(trim_dot_ghost(filename).to_owned()),
        None => Err(Error::NoFilename(path.to_path_buf())),
    }
}

fn has_plugin_extension(filename: &str) -> bool {
    let filename = trim_dot_ghost(filename);

    iends_with_ascii(filename, ".esp") || iends_with_ascii(filename, ".esm")
}

fn iends_with_ascii(string: &str, suffix: &str) -> bool {
    string.len() >= suffix.len()
        && string
            .bytes()
            .rev()
            .zip(suffix.bytes().rev())
            .all(|(b1, b2)| b1.eq_ignore_ascii_case(&b2))
}

fn file_modification_time(path: &Path) -> Result<SystemTime, Error> {
    path.metadata()
        .and_then(|metadata| metadata.modified())
        .map_err(|e| Error::IoError(path.to_path_buf(), e))
}
