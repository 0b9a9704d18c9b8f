/*
 *  appliance.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  The tracked appliances, their modeled run lengths and persisted records
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

use chrono::{Duration, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed set of appliances shown on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appliance {
    WashingMachine,
    Dryer,
    Dishwasher,
    Vacuum,
}

impl Appliance {
    pub const ALL: [Appliance; 4] = [
        Appliance::WashingMachine,
        Appliance::Dryer,
        Appliance::Dishwasher,
        Appliance::Vacuum,
    ];

    /// Stable key used in the state file and asset names
    pub fn name(self) -> &'static str {
        match self {
            Appliance::WashingMachine => "washing_machine",
            Appliance::Dryer => "dryer",
            Appliance::Dishwasher => "dishwasher",
            Appliance::Vacuum => "vacuum",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// How long a run is modeled to take
    pub fn run_duration(self) -> Duration {
        match self {
            Appliance::WashingMachine => Duration::minutes(57),
            Appliance::Dryer => Duration::hours(1) + Duration::minutes(46),
            Appliance::Dishwasher => Duration::hours(2),
            Appliance::Vacuum => Duration::hours(2),
        }
    }
}

impl fmt::Display for Appliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One persisted record. `is_running` is cached, trust it only after reconciling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplianceRecord {
    pub last_run: NaiveDateTime,
    pub is_running: bool,
}

impl ApplianceRecord {
    pub fn started(at: NaiveDateTime) -> Self {
        Self { last_run: at, is_running: true }
    }

    pub fn idle_since(at: NaiveDateTime) -> Self {
        Self { last_run: at, is_running: false }
    }
}

/// Whole-panel state, only known appliances ever appear as keys
pub type GlobalState = BTreeMap<Appliance, ApplianceRecord>;

/// Every appliance idle, last run `age` ago
pub fn baseline_state(now: NaiveDateTime, age: Duration) -> GlobalState {
    Appliance::ALL
        .into_iter()
        .map(|a| (a, ApplianceRecord::idle_since(now - age)))
        .collect()
}

/// Clears running flags whose modeled run has elapsed. Returns true if anything flipped.
pub fn settle_running(state: &mut GlobalState, now: NaiveDateTime) -> bool {
    let mut changed = false;
    for (appliance, record) in state.iter_mut() {
        if record.is_running && now - record.last_run >= appliance.run_duration() {
            debug!("{} finished its run (started {})", appliance, record.last_run);
            record.is_running = false;
            changed = true;
        }
    }
    changed
}

/// A slot in the panel's draw order, scenery sits between the appliances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Appliance(Appliance),
    Scenery(&'static str),
}

pub const LAYER_ORDER: [Layer; 9] = [
    Layer::Appliance(Appliance::WashingMachine),
    Layer::Appliance(Appliance::Vacuum),
    Layer::Scenery("building_1"),
    Layer::Scenery("building_2"),
    Layer::Appliance(Appliance::Dryer),
    Layer::Scenery("building_3"),
    Layer::Scenery("sign"),
    Layer::Appliance(Appliance::Dishwasher),
    Layer::Scenery("building_4"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_names_round_trip() {
        for a in Appliance::ALL {
            assert_eq!(Appliance::from_name(a.name()), Some(a));
        }
        assert_eq!(Appliance::from_name("toaster"), None);
    }

    #[test]
    fn test_dryer_runs_an_hour_forty_six() {
        assert_eq!(Appliance::Dryer.run_duration(), Duration::minutes(106));
    }

    #[test]
    fn test_settle_flips_only_finished_runs() {
        let mut state = GlobalState::new();
        state.insert(Appliance::WashingMachine, ApplianceRecord::started(at(10, 0)));
        state.insert(Appliance::Dishwasher, ApplianceRecord::started(at(10, 0)));

        // 57 minutes later the washer is done, the dishwasher is not
        assert!(settle_running(&mut state, at(10, 57)));
        assert!(!state[&Appliance::WashingMachine].is_running);
        assert!(state[&Appliance::Dishwasher].is_running);
        assert_eq!(state[&Appliance::WashingMachine].last_run, at(10, 0));

        assert!(!settle_running(&mut state, at(10, 57)));
    }

    #[test]
    fn test_baseline_covers_every_appliance() {
        let state = baseline_state(at(12, 0), Duration::hours(3));
        assert_eq!(state.len(), Appliance::ALL.len());
        assert!(state.values().all(|r| !r.is_running && r.last_run == at(9, 0)));
    }

    #[test]
    fn test_layer_order_holds_each_appliance_once() {
        for a in Appliance::ALL {
            let n = LAYER_ORDER.iter().filter(|l| **l == Layer::Appliance(a)).count();
            assert_eq!(n, 1);
        }
    }
}
