/*
 *  classifier.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Appliance display tiers - running, or how grubby things have become
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

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::appliance::{Appliance, ApplianceRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// within the modeled run length
    Active,
    /// flag still set past the modeled run length
    ActiveLong,
}

/// Idle decay, whole days since the last run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleTier {
    Tier1, // < 1 day
    Tier2, // 1..3 days
    Tier3, // 3..7 days
    Tier4, // 7+ days
}

impl IdleTier {
    pub fn from_days(days: i64) -> Self {
        if days >= 7 {
            IdleTier::Tier4
        } else if days >= 3 {
            IdleTier::Tier3
        } else if days >= 1 {
            IdleTier::Tier2
        } else {
            IdleTier::Tier1
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            IdleTier::Tier1 => 1,
            IdleTier::Tier2 => 2,
            IdleTier::Tier3 => 3,
            IdleTier::Tier4 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "tier")]
pub enum DisplayTier {
    Running(RunPhase),
    Idle(IdleTier),
}

impl DisplayTier {
    /// Asset variant drawn for this tier, `<appliance>_<n>.png`
    pub fn asset_index(self) -> u8 {
        match self {
            DisplayTier::Running(RunPhase::Active) => 2,
            DisplayTier::Running(RunPhase::ActiveLong) => 1,
            DisplayTier::Idle(IdleTier::Tier1) => 1,
            DisplayTier::Idle(IdleTier::Tier2) => 3,
            DisplayTier::Idle(IdleTier::Tier3) => 4,
            DisplayTier::Idle(IdleTier::Tier4) => 5,
        }
    }

    pub fn layer_name(self, appliance: Appliance) -> String {
        format!("{}_{}", appliance.name(), self.asset_index())
    }
}

/// Pure tier derivation. A stale running flag is tolerated, reconciling is the caller's job.
pub fn classify(appliance: Appliance, record: &ApplianceRecord, now: NaiveDateTime) -> DisplayTier {
    let elapsed = now - record.last_run;

    if record.is_running {
        return if elapsed < appliance.run_duration() {
            DisplayTier::Running(RunPhase::Active)
        } else {
            DisplayTier::Running(RunPhase::ActiveLong)
        };
    }

    DisplayTier::Idle(IdleTier::from_days(elapsed.num_days()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    fn idle(after: Duration) -> DisplayTier {
        classify(Appliance::Vacuum, &ApplianceRecord::idle_since(t0()), t0() + after)
    }

    #[test]
    fn test_idle_boundaries_round_up_to_next_tier() {
        assert_eq!(idle(Duration::hours(23)), DisplayTier::Idle(IdleTier::Tier1));
        assert_eq!(idle(Duration::days(1)), DisplayTier::Idle(IdleTier::Tier2));
        assert_eq!(idle(Duration::days(3) - Duration::seconds(1)), DisplayTier::Idle(IdleTier::Tier2));
        assert_eq!(idle(Duration::days(3)), DisplayTier::Idle(IdleTier::Tier3));
        assert_eq!(idle(Duration::days(7) - Duration::seconds(1)), DisplayTier::Idle(IdleTier::Tier3));
        assert_eq!(idle(Duration::days(7)), DisplayTier::Idle(IdleTier::Tier4));
        assert_eq!(idle(Duration::days(40)), DisplayTier::Idle(IdleTier::Tier4));
    }

    #[test]
    fn test_last_run_in_future_is_fresh() {
        assert_eq!(idle(Duration::hours(-5)), DisplayTier::Idle(IdleTier::Tier1));
    }

    #[test]
    fn test_idle_tier_never_regresses() {
        let mut last = 0;
        for hours in 0..(24 * 10) {
            let DisplayTier::Idle(tier) = idle(Duration::hours(hours)) else {
                panic!("idle record classified as running");
            };
            assert!(tier.rank() >= last, "tier dropped at {} hours", hours);
            last = tier.rank();
        }
        assert_eq!(last, 4);
    }

    #[test]
    fn test_running_splits_at_run_duration() {
        let record = ApplianceRecord::started(t0());
        let dryer = |m| classify(Appliance::Dryer, &record, t0() + Duration::minutes(m));

        assert_eq!(dryer(0), DisplayTier::Running(RunPhase::Active));
        assert_eq!(dryer(105), DisplayTier::Running(RunPhase::Active));
        assert_eq!(dryer(106), DisplayTier::Running(RunPhase::ActiveLong));
        assert_eq!(dryer(60 * 24 * 9), DisplayTier::Running(RunPhase::ActiveLong));
    }

    #[test]
    fn test_layer_names() {
        assert_eq!(DisplayTier::Running(RunPhase::Active).layer_name(Appliance::Dryer), "dryer_2");
        assert_eq!(
            DisplayTier::Idle(IdleTier::Tier4).layer_name(Appliance::WashingMachine),
            "washing_machine_5"
        );
    }
}
