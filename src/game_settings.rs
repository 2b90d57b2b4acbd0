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

use unicase::eq;

use crate::enums::{GameId, LoadOrderMethod};
use crate::error::Error;
use crate::ini::use_my_games_directory;
use crate::load_order::{
    AsteriskBasedLoadOrder, TextfileBasedLoadOrder, TimestampBasedLoadOrder, WritableLoadOrder,
};

/// Immutable per-handle policy: where the load order lives for a game, which
/// file is its main master, which plugins it forces active, and where its
/// list files are. All paths are resolved at construction.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct GameSettings {
    id: GameId,
    game_path: PathBuf,
    master_file: String,
    plugins_directory: PathBuf,
    plugins_file_path: PathBuf,
    load_order_path: Option<PathBuf>,
    implicitly_active_plugins: Vec<String>,
}

const SKYRIM_IMPLICITLY_ACTIVE_PLUGINS: &[&str] = &["Skyrim.esm", "Update.esm"];

const SKYRIM_SE_IMPLICITLY_ACTIVE_PLUGINS: &[&str] = &[
    "Skyrim.esm",
    "Update.esm",
    "Dawnguard.esm",
    "HearthFires.esm",
    "Dragonborn.esm",
];

const FALLOUT4_IMPLICITLY_ACTIVE_PLUGINS: &[&str] = &[
    "Fallout4.esm",
    "DLCRobot.esm",
    "DLCworkshop01.esm",
    "DLCCoast.esm",
    "DLCworkshop02.esm",
    "DLCworkshop03.esm",
    "DLCNukaWorld.esm",
    "DLCUltraHighResolution.esm",
];

const PLUGINS_TXT: &str = "plugins.txt";

impl GameSettings {
    /// Create settings, looking up the game's local app data folder. The
    /// lookup is only possible on Windows; on other platforms this fails with
    /// [Error::NoLocalAppData] for every game that stores files there, and
    /// [GameSettings::with_local_path] must be used instead.
    #[cfg(windows)]
    pub fn new(game_id: GameId, game_path: &Path) -> Result<GameSettings, Error> {
        let local_path = match appdata_folder_name(game_id) {
            Some(folder_name) => dirs::data_local_dir()
                .ok_or(Error::NoLocalAppData)?
                .join(folder_name),
            None => PathBuf::new(),
        };

        GameSettings::with_local_path(game_id, game_path, &local_path)
    }

    #[cfg(not(windows))]
    pub fn new(game_id: GameId, game_path: &Path) -> Result<GameSettings, Error> {
        if appdata_folder_name(game_id).is_none() {
            // The game puts nothing in local app data, so no path is needed.
            GameSettings::with_local_path(game_id, game_path, Path::new(""))
        } else {
            Err(Error::NoLocalAppData)
        }
    }

    pub fn with_local_path(
        game_id: GameId,
        game_path: &Path,
        local_path: &Path,
    ) -> Result<GameSettings, Error> {
        let plugins_file_path = plugins_file_path(game_id, game_path, local_path)?;

        Ok(GameSettings {
            id: game_id,
            game_path: game_path.to_path_buf(),
            master_file: master_file(game_id).to_owned(),
            plugins_directory: plugins_directory(game_id, game_path),
            plugins_file_path,
            load_order_path: load_order_path(game_id, local_path),
            implicitly_active_plugins: implicitly_active_plugins(game_id)
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        })
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn load_order_method(&self) -> LoadOrderMethod {
        match self.id {
            GameId::Morrowind | GameId::Oblivion | GameId::Fallout3 | GameId::FalloutNV => {
                LoadOrderMethod::Timestamp
            }
            GameId::Skyrim => LoadOrderMethod::Textfile,
            GameId::Fallout4 | GameId::SkyrimSE => LoadOrderMethod::Asterisk,
        }
    }

    pub fn into_load_order(self) -> Box<dyn WritableLoadOrder + Send + Sync + 'static> {
        match self.load_order_method() {
            LoadOrderMethod::Timestamp => Box::new(TimestampBasedLoadOrder::new(self)),
            LoadOrderMethod::Textfile => Box::new(TextfileBasedLoadOrder::new(self)),
            LoadOrderMethod::Asterisk => Box::new(AsteriskBasedLoadOrder::new(self)),
        }
    }

    pub fn master_file(&self) -> &str {
        &self.master_file
    }

    /// Replace the game's master file. Only Timestamp-based games treat the
    /// master file as data: for the other methods it is structural (it must
    /// be the first load order entry) and cannot be changed.
    pub fn set_master_file(&mut self, master_file: String) -> Result<(), Error> {
        if self.load_order_method() == LoadOrderMethod::Timestamp {
            self.master_file = master_file;
            Ok(())
        } else {
            Err(Error::UnchangeableGameMaster(self.id))
        }
    }

    pub fn implicitly_active_plugins(&self) -> &[String] {
        &self.implicitly_active_plugins
    }

    pub fn is_implicitly_active(&self, plugin: &str) -> bool {
        self.implicitly_active_plugins()
            .iter()
            .any(|p| eq(p.as_str(), plugin))
    }

    pub fn plugins_directory(&self) -> PathBuf {
        self.plugins_directory.clone()
    }

    pub fn active_plugins_file(&self) -> &PathBuf {
        &self.plugins_file_path
    }

    /// `Some` only for Textfile-based games: no other method has a separate
    /// load order file.
    pub fn load_order_file(&self) -> Option<&PathBuf> {
        self.load_order_path.as_ref()
    }

    pub fn plugin_path(&self, plugin_name: &str) -> PathBuf {
        self.plugins_directory.join(plugin_name)
    }
}

fn master_file(game_id: GameId) -> &'static str {
    match game_id {
        GameId::Morrowind => "Morrowind.esm",
        GameId::Oblivion => "Oblivion.esm",
        GameId::Skyrim | GameId::SkyrimSE => "Skyrim.esm",
        GameId::Fallout3 => "Fallout3.esm",
        GameId::FalloutNV => "FalloutNV.esm",
        GameId::Fallout4 => "Fallout4.esm",
    }
}

// The name of the game's folder in %LOCALAPPDATA%. Morrowind stores nothing
// there.
fn appdata_folder_name(game_id: GameId) -> Option<&'static str> {
    match game_id {
        GameId::Morrowind => None,
        GameId::Oblivion => Some("Oblivion"),
        GameId::Skyrim => Some("Skyrim"),
        GameId::Fallout3 => Some("Fallout3"),
        GameId::FalloutNV => Some("FalloutNV"),
        GameId::Fallout4 => Some("Fallout4"),
        GameId::SkyrimSE => Some("Skyrim Special Edition"),
    }
}

fn plugins_directory(game_id: GameId, game_path: &Path) -> PathBuf {
    match game_id {
        GameId::Morrowind => game_path.join("Data Files"),
        _ => game_path.join("Data"),
    }
}

fn plugins_file_path(
    game_id: GameId,
    game_path: &Path,
    local_path: &Path,
) -> Result<PathBuf, Error> {
    match game_id {
        GameId::Morrowind => Ok(game_path.join("Morrowind.ini")),
        GameId::Oblivion => oblivion_plugins_file_path(game_path, local_path),
        _ => Ok(local_path.join(PLUGINS_TXT)),
    }
}

fn oblivion_plugins_file_path(game_path: &Path, local_path: &Path) -> Result<PathBuf, Error> {
    let ini_path = game_path.join("Oblivion.ini");

    let parent_path = if use_my_games_directory(&ini_path)? {
        local_path
    } else {
        game_path
    };

    Ok(parent_path.join(PLUGINS_TXT))
}

fn load_order_path(game_id: GameId, local_path: &Path) -> Option<PathBuf> {
    match game_id {
        GameId::Skyrim => Some(local_path.join("loadorder.txt")),
        _ => None,
    }
}

fn implicitly_active_plugins(game_id: GameId) -> &'static [&'static str] {
    match game_id {
        GameId::Skyrim => SKYRIM_IMPLICITLY_ACTIVE_PLUGINS,
        GameId::SkyrimSE => SKYRIM_SE_IMPLICITLY_ACTIVE_PLUGINS,
        GameId::Fallout4 => FALLOUT4_IMPLICITLY_ACTIVE_PLUGINS,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    fn game_with_generic_paths(game_id: GameId) -> GameSettings {
        GameSettings::with_local_path(game_id, Path::new("game"), Path::new("local")).unwrap()
    }

    #[test]
    fn id_should_be_the_id_the_settings_were_created_with() {
        let settings = game_with_generic_paths(GameId::Morrowind);

        assert_eq!(GameId::Morrowind, settings.id());
    }

    #[test]
    fn load_order_method_should_be_timestamp_for_tes3_tes4_fo3_and_fonv() {
        let timestamp_games = [
            GameId::Morrowind,
            GameId::Oblivion,
            GameId::Fallout3,
            GameId::FalloutNV,
        ];

        for game_id in timestamp_games {
            let settings = game_with_generic_paths(game_id);
            assert_eq!(LoadOrderMethod::Timestamp, settings.load_order_method());
        }
    }

    #[test]
    fn load_order_method_should_be_textfile_for_tes5() {
        let settings = game_with_generic_paths(GameId::Skyrim);

        assert_eq!(LoadOrderMethod::Textfile, settings.load_order_method());
    }

    #[test]
    fn load_order_method_should_be_asterisk_for_tes5se_and_fo4() {
        let settings = game_with_generic_paths(GameId::SkyrimSE);
        assert_eq!(LoadOrderMethod::Asterisk, settings.load_order_method());

        let settings = game_with_generic_paths(GameId::Fallout4);
        assert_eq!(LoadOrderMethod::Asterisk, settings.load_order_method());
    }

    #[test]
    fn master_file_should_be_mapped_from_game_id() {
        assert_eq!(
            "Morrowind.esm",
            game_with_generic_paths(GameId::Morrowind).master_file()
        );
        assert_eq!(
            "Oblivion.esm",
            game_with_generic_paths(GameId::Oblivion).master_file()
        );
        assert_eq!(
            "Skyrim.esm",
            game_with_generic_paths(GameId::Skyrim).master_file()
        );
        assert_eq!(
            "Fallout3.esm",
            game_with_generic_paths(GameId::Fallout3).master_file()
        );
        assert_eq!(
            "FalloutNV.esm",
            game_with_generic_paths(GameId::FalloutNV).master_file()
        );
        assert_eq!(
            "Fallout4.esm",
            game_with_generic_paths(GameId::Fallout4).master_file()
        );
        assert_eq!(
            "Skyrim.esm",
            game_with_generic_paths(GameId::SkyrimSE).master_file()
        );
    }

    #[test]
    fn set_master_file_should_replace_the_master_file_for_timestamp_games() {
        let mut settings = game_with_generic_paths(GameId::Oblivion);

        settings.set_master_file("Nehrim.esm".to_owned()).unwrap();

        assert_eq!("Nehrim.esm", settings.master_file());
    }

    #[test]
    fn set_master_file_should_error_for_textfile_and_asterisk_games() {
        let mut settings = game_with_generic_paths(GameId::Skyrim);
        assert!(settings.set_master_file("Enderal.esm".to_owned()).is_err());

        let mut settings = game_with_generic_paths(GameId::Fallout4);
        assert!(settings.set_master_file("Other.esm".to_owned()).is_err());
    }

    #[test]
    fn plugins_directory_should_be_data_files_for_morrowind_and_data_otherwise() {
        let settings = game_with_generic_paths(GameId::Morrowind);
        assert_eq!(
            Path::new("game").join("Data Files"),
            settings.plugins_directory()
        );

        let settings = game_with_generic_paths(GameId::Oblivion);
        assert_eq!(Path::new("game").join("Data"), settings.plugins_directory());
    }

    #[test]
    fn active_plugins_file_should_be_mapped_from_game_id() {
        let settings = game_with_generic_paths(GameId::Morrowind);
        assert_eq!(
            &Path::new("game").join("Morrowind.ini"),
            settings.active_plugins_file()
        );

        let settings = game_with_generic_paths(GameId::Oblivion);
        assert_eq!(
            &Path::new("local").join("plugins.txt"),
            settings.active_plugins_file()
        );

        let settings = game_with_generic_paths(GameId::Skyrim);
        assert_eq!(
            &Path::new("local").join("plugins.txt"),
            settings.active_plugins_file()
        );

        let settings = game_with_generic_paths(GameId::Fallout4);
        assert_eq!(
            &Path::new("local").join("plugins.txt"),
            settings.active_plugins_file()
        );
    }

    #[test]
    fn active_plugins_file_should_be_in_the_game_path_for_oblivion_if_the_ini_setting_is_0() {
        let tmp_dir = tempdir().unwrap();
        let game_path = tmp_dir.path();

        std::fs::write(
            game_path.join("Oblivion.ini"),
            "[General]\nbUseMyGamesDirectory=0\n",
        )
        .unwrap();

        let settings =
            GameSettings::with_local_path(GameId::Oblivion, game_path, Path::new("local")).unwrap();

        assert_eq!(
            &game_path.join("plugins.txt"),
            settings.active_plugins_file()
        );
    }

    #[test]
    fn load_order_file_should_only_exist_for_textfile_based_games() {
        let settings = game_with_generic_paths(GameId::Skyrim);
        assert_eq!(
            Some(&Path::new("local").join("loadorder.txt")),
            settings.load_order_file()
        );

        assert!(game_with_generic_paths(GameId::Morrowind)
            .load_order_file()
            .is_none());
        assert!(game_with_generic_paths(GameId::Oblivion)
            .load_order_file()
            .is_none());
        assert!(game_with_generic_paths(GameId::Fallout4)
            .load_order_file()
            .is_none());
    }

    #[test]
    fn implicitly_active_plugins_should_be_empty_for_timestamp_based_games() {
        assert!(game_with_generic_paths(GameId::Morrowind)
            .implicitly_active_plugins()
            .is_empty());
        assert!(game_with_generic_paths(GameId::Oblivion)
            .implicitly_active_plugins()
            .is_empty());
        assert!(game_with_generic_paths(GameId::Fallout3)
            .implicitly_active_plugins()
            .is_empty());
        assert!(game_with_generic_paths(GameId::FalloutNV)
            .implicitly_active_plugins()
            .is_empty());
    }

    #[test]
    fn implicitly_active_plugins_should_include_update_esm_for_skyrim() {
        let settings = game_with_generic_paths(GameId::Skyrim);

        assert_eq!(
            &["Skyrim.esm", "Update.esm"],
            settings.implicitly_active_plugins()
        );
    }

    #[test]
    fn implicitly_active_plugins_should_list_the_fallout4_dlc_in_declared_order() {
        let settings = game_with_generic_paths(GameId::Fallout4);
        let names = settings.implicitly_active_plugins();

        assert_eq!(8, names.len());
        assert_eq!("Fallout4.esm", names[0]);
        assert_eq!("DLCworkshop02.esm", names[4]);
    }

    #[test]
    fn implicitly_active_plugins_should_list_the_skyrim_se_dlc_in_declared_order() {
        let settings = game_with_generic_paths(GameId::SkyrimSE);

        assert_eq!(
            &[
                "Skyrim.esm",
                "Update.esm",
                "Dawnguard.esm",
                "HearthFires.esm",
                "Dragonborn.esm",
            ],
            settings.implicitly_active_plugins()
        );
    }

    #[test]
    fn is_implicitly_active_should_compare_case_insensitively() {
        let settings = game_with_generic_paths(GameId::Skyrim);

        assert!(settings.is_implicitly_active("update.esm"));
        assert!(!settings.is_implicitly_active("Blank.esm"));
    }

    #[test]
    #[cfg(not(windows))]
    fn new_should_error_for_games_that_need_a_local_path_on_linux() {
        assert!(GameSettings::new(GameId::Oblivion, Path::new("game")).is_err());
        assert!(GameSettings::new(GameId::Skyrim, Path::new("game")).is_err());
    }

    #[test]
    #[cfg(not(windows))]
    fn new_should_succeed_for_morrowind_on_linux() {
        let settings = GameSettings::new(GameId::Morrowind, Path::new("game")).unwrap();

        assert_eq!(
            &Path::new("game").join("Morrowind.ini"),
            settings.active_plugins_file()
        );
    }
}
