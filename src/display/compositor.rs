/*
 *  display/compositor.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Compositor seam - turns a render decision into something on the panel
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use log::{debug, info, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::RenderDecision;

pub trait Compositor: Send {
    /// Returns true when the panel was actually refreshed
    fn present(&mut self, decision: &RenderDecision) -> bool;
}

/// Writes each decision as pretty JSON, a stand-in for the e-ink panel.
/// The file is only rewritten when its content would change, e-ink refreshes are slow.
pub struct SnapshotCompositor {
    path: PathBuf,
}

impl SnapshotCompositor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, body: &str) -> std::io::Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(body.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Compositor for SnapshotCompositor {
    fn present(&mut self, decision: &RenderDecision) -> bool {
        let body = match serde_json::to_string_pretty(decision) {
            Ok(s) => s,
            Err(e) => {
                warn!("Cannot serialise {} screen: {}", decision.name(), e);
                return false;
            }
        };

        if fs::read_to_string(&self.path).is_ok_and(|old| old == body) {
            debug!("No visual change");
            return false;
        }

        match self.write(&body) {
            Ok(()) => {
                info!("Display updated ({})", decision.name());
                true
            }
            Err(e) => {
                warn!("Failed to write {}: {}", self.path.display(), e);
                false
            }
        }
    }
}
