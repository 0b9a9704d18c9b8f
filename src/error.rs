/*
 *  error.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types for persistence, collaborators and input
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

use std::path::PathBuf;
use thiserror::Error;

/// Persistence failures. Never leave the store, they are logged at its boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("state JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
    #[error("state file {0} has no parent directory")]
    NoParent(PathBuf),
}

/// Media, calendar, weather and cue collaborators.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{0} unavailable")]
    Unavailable(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing data: {0}")]
    MissingData(String),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input device error: {0}")]
    Device(String),
}
