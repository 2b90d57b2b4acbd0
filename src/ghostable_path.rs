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

use std::ffi::OsStr;
use std::fs::rename;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub const GHOST_FILE_EXTENSION: &str = "ghost";

/// A ghosted plugin is the same logical plugin as its unghosted form: the
/// `.ghost` suffix only hides the file from the game. These operations treat
/// the two physical paths as alternative states of one plugin.
pub trait GhostablePath {
    fn has_ghost_extension(&self) -> bool;

    fn as_ghosted_path(&self) -> Result<PathBuf, Error>;
    fn as_unghosted_path(&self) -> Result<PathBuf, Error>;

    /// Of the two possible states, the one that exists on disk. If both
    /// exist, the given form wins.
    fn resolve_path(&self) -> Result<PathBuf, Error>;

    /// Rename the file to drop any `.ghost` suffix.
    fn unghost(&self) -> Result<PathBuf, Error>;
}

impl GhostablePath for Path {
    fn has_ghost_extension(&self) -> bool {
        self.extension()
            .and_then(OsStr::to_str)
            .map(|x| x.eq_ignore_ascii_case(GHOST_FILE_EXTENSION))
            .unwrap_or(false)
    }

    fn as_ghosted_path(&self) -> Result<PathBuf, Error> {
        if self.has_ghost_extension() {
            Ok(self.to_path_buf())
        } else {
            self.file_name()
                .ok_or_else(|| Error::NoFilename(self.to_path_buf()))
                .map(|x| {
                    let mut filename = x.to_os_string();
                    filename.push(".");
                    filename.push(GHOST_FILE_EXTENSION);

                    self.with_file_name(filename)
                })
        }
    }

    fn as_unghosted_path(&self) -> Result<PathBuf, Error> {
        if !self.has_ghost_extension() {
            Ok(self.to_path_buf())
        } else {
            self.file_stem()
                .map(|x| self.with_file_name(x))
                .ok_or_else(|| Error::NoFilename(self.to_path_buf()))
        }
    }

    fn resolve_path(&self) -> Result<PathBuf, Error> {
        if self.exists() {
            Ok(self.to_path_buf())
        } else {
            let alt_path = if self.has_ghost_extension() {
                self.as_unghosted_path()?
            } else {
                self.as_ghosted_path()?
            };

            if alt_path.exists() {
                Ok(alt_path)
            } else {
                Err(Error::InvalidPath(self.to_path_buf()))
            }
        }
    }

    fn unghost(&self) -> Result<PathBuf, Error> {
        if !self.has_ghost_extension() {
            Ok(self.to_path_buf())
        } else {
            let new_path = self.as_unghosted_path()?;
            rename(self, &new_path).map_err(|e| Error::IoError(self.to_path_buf(), e))?;
            Ok(new_path)
        }
    }
}
