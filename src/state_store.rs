/*
 *  state_store.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  File-backed appliance run history. Shared by the render loop and the
 *  button listener, writes go through a temp file + rename under one lock.
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

//! Running flags are never cleared by a timer. Every read that wants a
//! current view reconciles against the clock and persists the result,
//! which is plenty for a panel refreshed every few seconds.

use chrono::{Duration, Local, NaiveDateTime};
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;

use crate::appliance::{baseline_state, settle_running, Appliance, ApplianceRecord, GlobalState};
use crate::constants::BASELINE_AGE_HOURS;
use crate::error::StoreError;

/// Serialises every write in the process, whichever store handle makes it.
static WRITE_LOCK: Mutex<()> = Mutex::new(());

fn write_guard() -> MutexGuard<'static, ()> {
    WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persisted state, or empty when the file is missing, corrupt or of the wrong shape.
    /// Readers never take the write lock, the rename guarantees a whole file.
    pub fn load(&self) -> GlobalState {
        match self.read_state() {
            Ok(state) => state,
            Err(e) => {
                warn!("Ignoring unreadable state file {}: {}", self.path.display(), e);
                GlobalState::new()
            }
        }
    }

    /// Atomically replace the state file. Failures are logged, never raised.
    pub fn save(&self, state: &GlobalState) {
        let _guard = write_guard();
        self.write_logged(state);
    }

    /// Seed a "recently idle" baseline if nothing has been persisted yet.
    /// Returns true when the file was created.
    pub fn initialize_if_absent(&self, now: NaiveDateTime) -> bool {
        let _guard = write_guard();
        if self.path.exists() {
            return false;
        }
        info!("No state file at {}, seeding appliance baseline", self.path.display());
        self.write_logged(&baseline_state(now, Duration::hours(BASELINE_AGE_HOURS)));
        true
    }

    /// Record the start of a run now.
    pub fn mark_started(&self, appliance: Appliance) -> GlobalState {
        self.mark_started_at(appliance, Local::now().naive_local())
    }

    pub fn mark_started_at(&self, appliance: Appliance, now: NaiveDateTime) -> GlobalState {
        let _guard = write_guard();
        let mut state = self.load();
        state.insert(appliance, ApplianceRecord::started(now));
        self.write_logged(&state);
        info!("Marked {} as started at {}", appliance, now);
        state
    }

    /// Name based variant for callers outside the typed catalogue.
    /// Unknown names are a logged no-op.
    pub fn mark_started_by_name(&self, name: &str, now: NaiveDateTime) -> Option<GlobalState> {
        match Appliance::from_name(name) {
            Some(appliance) => Some(self.mark_started_at(appliance, now)),
            None => {
                warn!("Unknown appliance '{}', nothing marked", name);
                None
            }
        }
    }

    /// Flip finished runs to idle and persist when anything changed.
    pub fn reconcile(&self, mut state: GlobalState, now: NaiveDateTime) -> GlobalState {
        if settle_running(&mut state, now) {
            self.save(&state);
        }
        state
    }

    /// load + reconcile as one critical section
    pub fn current_view(&self, now: NaiveDateTime) -> GlobalState {
        let _guard = write_guard();
        self.settled(now)
    }

    /// Current view, reseeded with the baseline when it came back empty.
    /// Check and reseed share the lock so a concurrent mark is never overwritten.
    pub fn reset_if_empty(&self, now: NaiveDateTime) -> GlobalState {
        let _guard = write_guard();
        let state = self.settled(now);
        if !state.is_empty() {
            return state;
        }
        info!("Appliance state empty - resetting to defaults");
        let state = baseline_state(now, Duration::hours(BASELINE_AGE_HOURS));
        self.write_logged(&state);
        state
    }

    /// Overwrite everything with idle appliances last run `age` ago.
    pub fn reset_to_baseline(&self, now: NaiveDateTime, age: Duration) -> GlobalState {
        let state = baseline_state(now, age);
        self.save(&state);
        state
    }

    /// Caller must hold the write lock.
    fn settled(&self, now: NaiveDateTime) -> GlobalState {
        let mut state = self.load();
        if settle_running(&mut state, now) {
            self.write_logged(&state);
        }
        state
    }

    fn read_state(&self) -> Result<GlobalState, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("State file {} not found", self.path.display());
                return Ok(GlobalState::new());
            }
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };

        if content.trim().is_empty() {
            warn!("Empty state file {}", self.path.display());
            return Ok(GlobalState::new());
        }

        let raw: Map<String, Value> = serde_json::from_str(&content)?;
        let mut state = GlobalState::new();
        for (key, value) in raw {
            match Appliance::from_name(&key) {
                Some(appliance) => {
                    let record: ApplianceRecord = serde_json::from_value(value)?;
                    state.insert(appliance, record);
                }
                None => debug!("Skipping unknown state key '{}'", key),
            }
        }
        Ok(state)
    }

    fn write_logged(&self, state: &GlobalState) {
        if let Err(e) = self.write_state(state) {
            error!("Failed to save appliance state: {}", e);
        }
    }

    /// Caller must hold the write lock.
    fn write_state(&self, state: &GlobalState) -> Result<(), StoreError> {
        let keyed: BTreeMap<&str, &ApplianceRecord> =
            state.iter().map(|(a, r)| (a.name(), r)).collect();
        let content = serde_json::to_string_pretty(&keyed)?;

        let parent = match self.path.parent() {
            Some(p) if p.as_os_str().is_empty() => Path::new("."),
            Some(p) => p,
            None => return Err(StoreError::NoParent(self.path.clone())),
        };
        let io_err = |source| StoreError::Io { path: parent.to_path_buf(), source };

        let mut temp_file = NamedTempFile::new_in(parent).map_err(io_err)?;
        temp_file.write_all(content.as_bytes()).map_err(io_err)?;
        temp_file.flush().map_err(io_err)?;
        temp_file
            .persist(&self.path)
            .map_err(|source| StoreError::Persist { path: self.path.clone(), source })?;
        Ok(())
    }
}
