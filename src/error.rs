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

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;
use std::sync::PoisonError;
use std::time;

use crate::enums::GameId;

#[derive(Debug)]
pub enum Error {
    /// The given path does not resolve to anything on the filesystem.
    InvalidPath(PathBuf),
    IoError(PathBuf, io::Error),
    NoFilename(PathBuf),
    SystemTimeError(time::SystemTimeError),
    /// Text expected to be UTF-8 was not.
    NotUtf8(Vec<u8>),
    /// Bytes could not be decoded from Windows-1252.
    DecodeError(Vec<u8>),
    /// Text could not be represented in Windows-1252. This is a warning when
    /// returned by a save operation: all representable names were written.
    EncodeError(Cow<'static, str>),
    PluginParsingError(PathBuf),
    PluginNotFound(String),
    TooManyActivePlugins,
    DuplicatePlugin(String),
    NonMasterBeforeMaster,
    GameMasterMustLoadFirst(String),
    /// The game's master file is structural and cannot be replaced.
    UnchangeableGameMaster(GameId),
    InvalidPlugin(String),
    ImplicitlyActivePlugin(String),
    NoLocalAppData,
    IniParsingError {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    PoisonedLock,
}

impl From<time::SystemTimeError> for Error {
    fn from(error: time::SystemTimeError) -> Self {
        Error::SystemTimeError(error)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(error: FromUtf8Error) -> Self {
        Error::NotUtf8(error.into_bytes())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonedLock
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidPath(path) => write!(f, "The path {path:?} is invalid"),
            Error::IoError(path, error) => {
                write!(f, "I/O error involving the path {path:?}: {error}")
            }
            Error::NoFilename(path) => {
                write!(f, "The plugin path {path:?} has no filename part")
            }
            Error::SystemTimeError(error) => error.fmt(f),
            Error::NotUtf8(bytes) => {
                write!(f, "Expected a UTF-8 string, got bytes {bytes:02X?}")
            }
            Error::DecodeError(bytes) => write!(
                f,
                "The bytes {bytes:02X?} could not be decoded from Windows-1252"
            ),
            Error::EncodeError(string) => write!(
                f,
                "The string \"{string}\" could not be encoded in Windows-1252"
            ),
            Error::PluginParsingError(path) => {
                write!(
                    f,
                    "An error was encountered while parsing the plugin at {path:?}"
                )
            }
            Error::PluginNotFound(name) => {
                write!(f, "The plugin \"{name}\" is not in the load order")
            }
            Error::TooManyActivePlugins => {
                write!(f, "Maximum number of active plugins exceeded")
            }
            Error::DuplicatePlugin(name) => {
                write!(
                    f,
                    "The given plugin list contains more than one instance of \"{name}\""
                )
            }
            Error::NonMasterBeforeMaster => {
                write!(f, "Attempted to load a non-master plugin before a master")
            }
            Error::GameMasterMustLoadFirst(name) => {
                write!(f, "The game's master file \"{name}\" must load first")
            }
            Error::UnchangeableGameMaster(game_id) => {
                write!(f, "The master file of {game_id:?} cannot be changed")
            }
            Error::InvalidPlugin(name) => {
                write!(f, "The plugin file \"{name}\" is invalid")
            }
            Error::ImplicitlyActivePlugin(name) => {
                write!(
                    f,
                    "The implicitly active plugin \"{name}\" cannot be deactivated"
                )
            }
            Error::NoLocalAppData => {
                write!(f, "The game's local app data folder could not be detected")
            }
            Error::IniParsingError {
                path,
                line,
                column,
                message,
            } => write!(
                f,
                "Failed to parse ini file at {path:?}, error at line {line}, column {column}: {message}"
            ),
            Error::PoisonedLock => {
                write!(f, "The load order's lock has been poisoned")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::IoError(_, x) => Some(x),
            Error::SystemTimeError(x) => Some(x),
            _ => None,
        }
    }
}
