/*
 *  constants.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
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

pub const DEFAULT_STATE_FILE: &str = "state.json";
pub const DEFAULT_SNAPSHOT_FILE: &str = "simulated_output.json";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;
pub const DEFAULT_VOLUME_STEP: u8 = 10;

pub const DEFAULT_CALENDAR_LOOKAHEAD_DAYS: u32 = 30;
pub const MAX_CALENDAR_LOOKAHEAD_DAYS: u32 = 366;
pub const DEFAULT_CALENDAR_CACHE_SECS: u64 = 300;
pub const DEFAULT_EVENT_KEYWORD: &str = "daniel";

/// BCM numbering, in label order A, B, C, D
pub const DEFAULT_GPIO_LINES: [u8; 4] = [5, 6, 25, 24];

/// Seeded state sits just outside "running", freshly clean
pub const BASELINE_AGE_HOURS: i64 = 3;

/// `--reset-state` leaves everything "a little unclean"
pub const RESET_AGE_DAYS: i64 = 2;

// calendar slice on the dashboard
pub const CALENDAR_MAX_LINES: usize = 5;
pub const CALENDAR_ALL_DAY: &str = "All Day";
pub const CALENDAR_OVERFLOW: &str = "more events...";

// weather forecast windows, in hourly slots
pub const WEATHER_MINMAX_SLOTS: usize = 24;
pub const WEATHER_FALLBACK_SLOTS: usize = 4;
pub const RAIN_GAUGE_SLOTS: usize = 6;
