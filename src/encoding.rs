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

//! Windows-1252 conversion, used at the I/O boundary only: plugin names are
//! carried as UTF-8 everywhere else. Both directions are strict, failing on
//! input that has no representation rather than substituting characters.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;

use crate::error::Error;

pub fn windows_1252_to_utf8(bytes: &[u8]) -> Result<String, Error> {
    WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| Error::DecodeError(bytes.to_vec()))
}

pub fn utf8_to_windows_1252(string: &str) -> Result<Vec<u8>, Error> {
    let (bytes, _, had_unmappable_chars) = WINDOWS_1252.encode(string);

    if had_unmappable_chars {
        Err(Error::EncodeError(Cow::from(string.to_owned())))
    } else {
        Ok(bytes.into_owned())
    }
}
