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

//! Test support. Plugin files are synthesised rather than copied from
//! pre-built fixtures: a plugin is valid to the header parser if it starts
//! with a well-formed header record, so tests write the smallest file that
//! satisfies that.

use std::fs::create_dir_all;
use std::path::Path;

use crate::enums::GameId;
use crate::game_settings::GameSettings;

pub fn game_settings(game_id: GameId, game_dir: &Path) -> GameSettings {
    let local_path = game_dir.join("local");
    create_dir_all(&local_path).unwrap();

    let settings = GameSettings::with_local_path(game_id, game_dir, &local_path).unwrap();
    create_dir_all(settings.plugins_directory()).unwrap();

    settings
}

pub fn create_plugin(settings: &GameSettings, filename: &str) {
    write_plugin_file(settings, filename, false, &[]);
}

pub fn create_master(settings: &GameSettings, filename: &str, masters: &[&str]) {
    write_plugin_file(settings, filename, true, masters);
}

pub fn create_plugin_with_masters(settings: &GameSettings, filename: &str, masters: &[&str]) {
    write_plugin_file(settings, filename, false, masters);
}

pub fn write_plugin_file(
    settings: &GameSettings,
    filename: &str,
    is_master: bool,
    masters: &[&str],
) {
    let path = settings.plugin_path(filename);
    create_dir_all(path.parent().unwrap()).unwrap();

    std::fs::write(path, plugin_file_bytes(settings.id(), is_master, masters)).unwrap();
}

pub fn plugin_file_bytes(game_id: GameId, is_master: bool, masters: &[&str]) -> Vec<u8> {
    match game_id {
        GameId::Morrowind => tes3_plugin_bytes(masters),
        _ => tes4_plugin_bytes(game_id, is_master, masters),
    }
}

// Morrowind's header record is TES3 with a 16-byte record header and 32-bit
// subrecord sizes. Its HEDR subrecord is 300 bytes: version, file type,
// author, description, record count. The master flag is taken from the file
// extension, not the header.
fn tes3_plugin_bytes(masters: &[&str]) -> Vec<u8> {
    let mut subrecords = Vec::new();

    let mut hedr = Vec::new();
    hedr.extend_from_slice(&1.2_f32.to_le_bytes());
    hedr.extend_from_slice(&0_u32.to_le_bytes());
    hedr.extend_from_slice(&[0; 32]);
    hedr.extend_from_slice(&[0; 256]);
    hedr.extend_from_slice(&0_u32.to_le_bytes());
    push_tes3_subrecord(&mut subrecords, b"HEDR", &hedr);

    for master in masters {
        let mut name = master.as_bytes().to_vec();
        name.push(0);
        push_tes3_subrecord(&mut subrecords, b"MAST", &name);
        push_tes3_subrecord(&mut subrecords, b"DATA", &0_u64.to_le_bytes());
    }

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"TES3");
    bytes.extend_from_slice(&u32::try_from(subrecords.len()).unwrap().to_le_bytes());
    bytes.extend_from_slice(&0_u32.to_le_bytes());
    bytes.extend_from_slice(&0_u32.to_le_bytes());
    bytes.extend_from_slice(&subrecords);

    bytes
}

// Later games use a TES4 header record: a 20-byte record header for Oblivion,
// 24 bytes from Fallout 3 onwards, with 16-bit subrecord sizes. Bit 0 of the
// record flags is the master flag.
fn tes4_plugin_bytes(game_id: GameId, is_master: bool, masters: &[&str]) -> Vec<u8> {
    let mut subrecords = Vec::new();

    let mut hedr = Vec::new();
    hedr.extend_from_slice(&1.0_f32.to_le_bytes());
    hedr.extend_from_slice(&0_u32.to_le_bytes());
    hedr.extend_from_slice(&0_u32.to_le_bytes());
    push_tes4_subrecord(&mut subrecords, b"HEDR", &hedr);

    for master in masters {
        let mut name = master.as_bytes().to_vec();
        name.push(0);
        push_tes4_subrecord(&mut subrecords, b"MAST", &name);
        push_tes4_subrecord(&mut subrecords, b"DATA", &0_u64.to_le_bytes());
    }

    let flags: u32 = if is_master { 1 } else { 0 };

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"TES4");
    bytes.extend_from_slice(&u32::try_from(subrecords.len()).unwrap().to_le_bytes());
    bytes.extend_from_slice(&flags.to_le_bytes());
    bytes.extend_from_slice(&0_u32.to_le_bytes());
    bytes.extend_from_slice(&0_u32.to_le_bytes());
    if game_id != GameId::Oblivion {
        bytes.extend_from_slice(&44_u16.to_le_bytes());
        bytes.extend_from_slice(&0_u16.to_le_bytes());
    }
    bytes.extend_from_slice(&subrecords);

    bytes
}

fn push_tes3_subrecord(buffer: &mut Vec<u8>, subrecord_type: &[u8; 4], data: &[u8]) {
    buffer.extend_from_slice(subrecord_type);
    buffer.extend_from_slice(&u32::try_from(data.len()).unwrap().to_le_bytes());
    buffer.extend_from_slice(data);
}

fn push_tes4_subrecord(buffer: &mut Vec<u8>, subrecord_type: &[u8; 4], data: &[u8]) {
    buffer.extend_from_slice(subrecord_type);
    buffer.extend_from_slice(&u16::try_from(data.len()).unwrap().to_le_bytes());
    buffer.extend_from_slice(data);
}

#[cfg(test)]
mod fixture_tests {
    use super::*;

    use esplugin::ParseOptions;
    use tempfile::tempdir;

    #[test]
    fn synthesised_tes4_plugins_should_parse_with_the_expected_master_flag() {
        let tmp_dir = tempdir().unwrap();
        let settings = game_settings(GameId::Oblivion, tmp_dir.path());

        create_master(&settings, "Blank.esm", &[]);
        create_plugin(&settings, "Blank.esp");

        let mut plugin = esplugin::Plugin::new(
            esplugin::GameId::Oblivion,
            &settings.plugin_path("Blank.esm"),
        );
        plugin.parse_file(ParseOptions::header_only()).unwrap();
        assert!(plugin.is_master_file());

        let mut plugin = esplugin::Plugin::new(
            esplugin::GameId::Oblivion,
            &settings.plugin_path("Blank.esp"),
        );
        plugin.parse_file(ParseOptions::header_only()).unwrap();
        assert!(!plugin.is_master_file());
    }

    #[test]
    fn synthesised_plugins_should_parse_for_every_supported_game() {
        let game_ids = [
            GameId::Morrowind,
            GameId::Oblivion,
            GameId::Skyrim,
            GameId::Fallout3,
            GameId::FalloutNV,
            GameId::Fallout4,
            GameId::SkyrimSE,
        ];

        for game_id in game_ids {
            let tmp_dir = tempdir().unwrap();
            let settings = game_settings(game_id, tmp_dir.path());

            create_plugin(&settings, "Blank.esp");

            assert!(
                esplugin::Plugin::is_valid(
                    game_id.to_esplugin_id(),
                    &settings.plugin_path("Blank.esp"),
                    ParseOptions::header_only(),
                ),
                "synthesised plugin for {game_id:?} did not parse"
            );
        }
    }

    #[test]
    fn synthesised_plugins_should_declare_their_masters() {
        let tmp_dir = tempdir().unwrap();
        let settings = game_settings(GameId::Skyrim, tmp_dir.path());

        create_master(&settings, "Blank.esm", &[]);
        create_plugin_with_masters(&settings, "Blank - Master Dependent.esp", &["Blank.esm"]);

        let mut plugin = esplugin::Plugin::new(
            esplugin::GameId::Skyrim,
            &settings.plugin_path("Blank - Master Dependent.esp"),
        );
        plugin.parse_file(ParseOptions::header_only()).unwrap();

        assert_eq!(vec!["Blank.esm".to_owned()], plugin.masters().unwrap());
    }
}
