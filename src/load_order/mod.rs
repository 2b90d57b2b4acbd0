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

mod asterisk_based;
mod mutable;
mod readable;
mod textfile_based;
mod timestamp_based;
mod writable;

pub use readable::ReadableLoadOrder;
pub use writable::WritableLoadOrder;

pub(crate) use asterisk_based::AsteriskBasedLoadOrder;
pub(crate) use mutable::MutableLoadOrder;
pub(crate) use textfile_based::TextfileBasedLoadOrder;
pub(crate) use timestamp_based::TimestampBasedLoadOrder;

use std::fs::create_dir_all;
use std::path::Path;

use crate::encoding::windows_1252_to_utf8;
use crate::error::Error;
use crate::plugin::Plugin;

fn find_first_non_master_position(plugins: &[Plugin]) -> Option<usize> {
    plugins.iter().position(|p| !p.is_master_file())
}

/// Read a line-delimited plugin name file, skipping blank lines and comment
/// lines that start with `#`. The mapper decides how each remaining line's
/// bytes become a name, and may discard lines by returning `Ok(None)`.
fn read_plugin_names<F>(file_path: &Path, line_mapper: F) -> Result<Vec<String>, Error>
where
    F: Fn(&[u8]) -> Result<Option<String>, Error>,
{
    if !file_path.exists() {
        return Ok(Vec::new());
    }

    let content =
        std::fs::read(file_path).map_err(|e| Error::IoError(file_path.to_path_buf(), e))?;

    let mut names = Vec::new();
    for line in content.split(|&byte| byte == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if line.is_empty() || line.starts_with(b"#") {
            continue;
        }

        if let Some(name) = line_mapper(line)? {
            names.push(name);
        }
    }

    Ok(names)
}

fn plugin_line_mapper(line: &[u8]) -> Result<Option<String>, Error> {
    windows_1252_to_utf8(line).map(Some)
}

/// Read a load order file, which unlike the active plugins file is UTF-8.
fn read_utf8_plugin_names(file_path: &Path) -> Result<Vec<String>, Error> {
    if !file_path.exists() {
        return Ok(Vec::new());
    }

    let content =
        std::fs::read(file_path).map_err(|e| Error::IoError(file_path.to_path_buf(), e))?;
    let content = String::from_utf8(content)?;

    Ok(content
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

fn create_parent_dirs(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            create_dir_all(parent).map_err(|e| Error::IoError(path.to_path_buf(), e))?;
        }
    }
    Ok(())
}
