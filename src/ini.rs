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

use crate::encoding::windows_1252_to_utf8;
use crate::error::Error;

/// The Morrowind.ini section holding the active plugin list. Unlike the rest
/// of the ini, its entries are order-sensitive, so they are line-scanned
/// rather than run through an ini parser.
const GAME_FILES_HEADER: &str = "[Game Files]";
const GAME_FILE_KEY_PREFIX: &str = "GameFile";

fn read_ini(ini_path: &Path) -> Result<ini::Ini, Error> {
    // Read the ini as Windows-1252 bytes and convert to UTF-8 before parsing,
    // as the ini crate expects the content to be valid UTF-8.
    let contents =
        std::fs::read(ini_path).map_err(|e| Error::IoError(ini_path.to_path_buf(), e))?;

    let contents = windows_1252_to_utf8(&contents)?;

    ini::Ini::load_from_str_opt(
        &contents,
        ini::ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ini::ParseOption::default()
        },
    )
    .map_err(|e| Error::IniParsingError {
        path: ini_path.to_path_buf(),
        line: e.line,
        column: e.col,
        message: e.msg.to_string(),
    })
}

pub fn use_my_games_directory(ini_path: &Path) -> Result<bool, Error> {
    if ini_path.exists() {
        // My Games is used if bUseMyGamesDirectory is not present or set to 1.
        read_ini(ini_path)
            .map(|ini| ini.get_from(Some("General"), "bUseMyGamesDirectory") != Some("0"))
    } else {
        Ok(true)
    }
}

/// The plugin names listed in the `[Game Files]` section, in file order.
pub fn read_game_files(ini_path: &Path) -> Result<Vec<String>, Error> {
    if !ini_path.exists() {
        return Ok(Vec::new());
    }

    let contents =
        std::fs::read(ini_path).map_err(|e| Error::IoError(ini_path.to_path_buf(), e))?;
    let contents = windows_1252_to_utf8(&contents)?;

    let mut in_game_files_section = false;
    let mut names = Vec::new();
    for line in contents.lines() {
        if line.starts_with('[') {
            in_game_files_section = line.trim_end() == GAME_FILES_HEADER;
            continue;
        }

        if in_game_files_section {
            if let Some(name) = game_file_entry(line) {
                names.push(name.to_owned());
            }
        }
    }

    Ok(names)
}

fn game_file_entry(line: &str) -> Option<&str> {
    let (key, value) = line.split_once('=')?;

    let prefix = key.get(..GAME_FILE_KEY_PREFIX.len())?;
    let digits = key.get(GAME_FILE_KEY_PREFIX.len()..)?;
    if !prefix.eq_ignore_ascii_case(GAME_FILE_KEY_PREFIX)
        || digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// The ini content that must be preserved when the active plugin list is
/// rewritten: everything up to and including the `[Game Files]` header line,
/// byte for byte. If the header is missing it is appended so that the
/// rewritten entries land in the right section.
pub fn read_game_files_prelude(ini_path: &Path) -> Result<Vec<u8>, Error> {
    let mut prelude = Vec::new();

    if ini_path.exists() {
        let contents =
            std::fs::read(ini_path).map_err(|e| Error::IoError(ini_path.to_path_buf(), e))?;

        for line in contents.split_inclusive(|&b| b == b'\n') {
            prelude.extend_from_slice(line);

            let trimmed = trim_line_ending(line);
            if trimmed == GAME_FILES_HEADER.as_bytes() {
                return Ok(prelude);
            }
        }
    }

    if !prelude.is_empty() && prelude.last() != Some(&b'\n') {
        prelude.push(b'\n');
    }
    prelude.extend_from_slice(GAME_FILES_HEADER.as_bytes());
    prelude.push(b'\n');

    Ok(prelude)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn use_my_games_directory_should_be_true_if_the_ini_path_does_not_exist() {
        assert!(use_my_games_directory(Path::new("does_not_exist")).unwrap());
    }

    #[test]
    fn use_my_games_directory_should_error_if_the_ini_is_invalid() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("ini.ini");

        std::fs::write(&ini_path, "[General\nbUseMyGamesDirectory=0").unwrap();

        assert!(use_my_games_directory(&ini_path).is_err());
    }

    #[test]
    fn use_my_games_directory_should_be_true_if_the_ini_setting_is_not_present() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("ini.ini");

        std::fs::write(&ini_path, "[General]\nSStartingCell=").unwrap();

        assert!(use_my_games_directory(&ini_path).unwrap());
    }

    #[test]
    fn use_my_games_directory_should_be_false_if_the_ini_setting_value_is_0() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("ini.ini");

        std::fs::write(&ini_path, "[General]\nbUseMyGamesDirectory=0\n").unwrap();

        assert!(!use_my_games_directory(&ini_path).unwrap());
    }

    #[test]
    fn use_my_games_directory_should_be_true_if_the_ini_setting_value_is_in_the_wrong_section() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("ini.ini");

        std::fs::write(&ini_path, "[Display]\nbUseMyGamesDirectory=0\n").unwrap();

        assert!(use_my_games_directory(&ini_path).unwrap());
    }

    #[test]
    fn use_my_games_directory_should_read_the_ini_as_windows_1252() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("ini.ini");

        std::fs::write(
            &ini_path,
            b"[General]\nSCharGenQuestID=\xe0\nbUseMyGamesDirectory=0\n",
        )
        .unwrap();

        assert!(!use_my_games_directory(&ini_path).unwrap());
    }

    #[test]
    fn read_game_files_should_return_an_empty_vec_if_the_ini_does_not_exist() {
        assert!(read_game_files(Path::new("missing.ini")).unwrap().is_empty());
    }

    #[test]
    fn read_game_files_should_return_entries_in_file_order() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("Morrowind.ini");

        std::fs::write(
            &ini_path,
            "isrealmorrowindini=false\n[Game Files]\nGameFile0=Morrowind.esm\nGameFile1=Blank.esp\n",
        )
        .unwrap();

        let names = read_game_files(&ini_path).unwrap();

        assert_eq!(vec!["Morrowind.esm", "Blank.esp"], names);
    }

    #[test]
    fn read_game_files_should_ignore_entries_outside_the_game_files_section() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("Morrowind.ini");

        std::fs::write(
            &ini_path,
            "GameFile0=Skipped.esp\n[Game Files]\nGameFile0=Blank.esp\n[General]\nGameFile1=Other.esp\n",
        )
        .unwrap();

        let names = read_game_files(&ini_path).unwrap();

        assert_eq!(vec!["Blank.esp"], names);
    }

    #[test]
    fn read_game_files_should_ignore_lines_that_are_not_game_file_entries() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("Morrowind.ini");

        std::fs::write(
            &ini_path,
            "[Game Files]\nGameFile0=Blank.esp\nGameFileX=Other.esp\nGameFile=Other.esp\nother=Other.esp\nGameFile1=\n",
        )
        .unwrap();

        let names = read_game_files(&ini_path).unwrap();

        assert_eq!(vec!["Blank.esp"], names);
    }

    #[test]
    fn read_game_files_should_match_the_key_prefix_case_insensitively() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("Morrowind.ini");

        std::fs::write(&ini_path, "[Game Files]\ngamefile0=Blank.esp\n").unwrap();

        let names = read_game_files(&ini_path).unwrap();

        assert_eq!(vec!["Blank.esp"], names);
    }

    #[test]
    fn read_game_files_should_decode_entries_from_windows_1252() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("Morrowind.ini");

        std::fs::write(&ini_path, b"[Game Files]\nGameFile0=Bl\xe0\xf1k.esp\n").unwrap();

        let names = read_game_files(&ini_path).unwrap();

        assert_eq!(vec!["Bl\u{e0}\u{f1}k.esp"], names);
    }

    #[test]
    fn read_game_files_prelude_should_preserve_content_up_to_and_including_the_header() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("Morrowind.ini");

        std::fs::write(
            &ini_path,
            "isrealmorrowindini=false\n[Game Files]\nGameFile0=Blank.esp\n",
        )
        .unwrap();

        let prelude = read_game_files_prelude(&ini_path).unwrap();

        assert_eq!(b"isrealmorrowindini=false\n[Game Files]\n".to_vec(), prelude);
    }

    #[test]
    fn read_game_files_prelude_should_preserve_crlf_line_endings() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("Morrowind.ini");

        std::fs::write(
            &ini_path,
            "isrealmorrowindini=false\r\n[Game Files]\r\nGameFile0=Blank.esp\r\n",
        )
        .unwrap();

        let prelude = read_game_files_prelude(&ini_path).unwrap();

        assert_eq!(
            b"isrealmorrowindini=false\r\n[Game Files]\r\n".to_vec(),
            prelude
        );
    }

    #[test]
    fn read_game_files_prelude_should_append_the_header_if_the_ini_does_not_exist() {
        let prelude = read_game_files_prelude(Path::new("missing.ini")).unwrap();

        assert_eq!(b"[Game Files]\n".to_vec(), prelude);
    }

    #[test]
    fn read_game_files_prelude_should_append_the_header_if_the_ini_lacks_one() {
        let tmp_dir = tempdir().unwrap();
        let ini_path = tmp_dir.path().join("Morrowind.ini");

        std::fs::write(&ini_path, "isrealmorrowindini=false").unwrap();

        let prelude = read_game_files_prelude(&ini_path).unwrap();

        assert_eq!(
            b"isrealmorrowindini=false\n[Game Files]\n".to_vec(),
            prelude
        );
    }
}
