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

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Tracks the last observed modification time of each path it is given, so
/// that re-reads can be skipped when nothing on disk has changed. Timestamps
/// are compared for inequality, not order, so external edits are still
/// detected if the system clock has gone backwards.
#[derive(Clone, Debug, Default)]
pub struct PathCache {
    modification_times: HashMap<PathBuf, SystemTime>,
}

impl PathCache {
    /// A path that does not exist is never modified. A path with no recorded
    /// observation is always modified.
    pub fn is_modified(&self, path: &Path) -> bool {
        match modification_time(path) {
            None => false,
            Some(modification_time) => self
                .modification_times
                .get(path)
                .map(|cached| *cached != modification_time)
                .unwrap_or(true),
        }
    }

    pub fn observe(&mut self, path: &Path) {
        if let Some(modification_time) = modification_time(path) {
            self.modification_times
                .insert(path.to_path_buf(), modification_time);
        }
    }

    pub fn clear(&mut self) {
        self.modification_times.clear();
    }
}

fn modification_time(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}
