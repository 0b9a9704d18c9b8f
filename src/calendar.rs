/*
 *  calendar.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Calendar collaborator, the dashboard's two day slice and the
 *  keyword event countdown
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

use chrono::{Days, NaiveDate};
use log::{debug, warn};
use mini_moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::constants::{CALENDAR_ALL_DAY, CALENDAR_MAX_LINES, CALENDAR_OVERFLOW};
use crate::error::CollaboratorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// `HH:MM` or "All Day"
    #[serde(rename = "time")]
    pub time_label: String,
    #[serde(rename = "summary")]
    pub title: String,
}

impl CalendarEntry {
    pub fn new(time_label: &str, title: &str) -> Self {
        Self { time_label: time_label.to_string(), title: title.to_string() }
    }

    fn is_all_day(&self) -> bool {
        self.time_label == CALENDAR_ALL_DAY
    }

    fn line(&self) -> String {
        format!("{} - {}", self.time_label, self.title)
    }
}

pub type CalendarEvents = BTreeMap<NaiveDate, Vec<CalendarEntry>>;

/// Anything that can list upcoming events. Authentication lives elsewhere.
pub trait CalendarSource: Send + Sync {
    /// Events from `today` through `today + days`
    fn upcoming(&self, today: NaiveDate, days: u32) -> Result<CalendarEvents, CollaboratorError>;
}

/// Days until the first event whose title contains `keyword` (case-insensitive),
/// 0 meaning today.
pub fn days_until(events: &CalendarEvents, keyword: &str, today: NaiveDate, horizon: u32) -> Option<i64> {
    let needle = keyword.to_lowercase();
    // past the last representable date there is nothing to find
    (0..u64::from(horizon))
        .map_while(|offset| today.checked_add_days(Days::new(offset)).map(|date| (offset, date)))
        .find(|(_, date)| {
            events
                .get(date)
                .is_some_and(|day| day.iter().any(|e| e.title.to_lowercase().contains(&needle)))
        })
        .map(|(offset, _)| offset as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayLabel {
    Today,
    Tomorrow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub label: DayLabel,
    pub lines: Vec<String>,
}

/// Today's and tomorrow's events as panel lines
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CalendarSlice {
    pub days: Vec<CalendarDay>,
    pub truncated: bool,
}

impl CalendarSlice {
    pub fn build(events: &CalendarEvents, today: NaiveDate) -> Self {
        let mut slice = CalendarSlice::default();
        let mut line_count = 0;

        for (offset, label) in [(0, DayLabel::Today), (1, DayLabel::Tomorrow)] {
            let Some(date) = today.checked_add_days(Days::new(offset)) else { break };
            let Some(entries) = events.get(&date) else { continue };

            let mut sorted: Vec<&CalendarEntry> = entries.iter().collect();
            sorted.sort_by(|a, b| {
                (!a.is_all_day(), &a.time_label).cmp(&(!b.is_all_day(), &b.time_label))
            });

            let mut day = CalendarDay { date, label, lines: Vec::new() };
            for entry in sorted {
                if line_count == CALENDAR_MAX_LINES - 1 {
                    day.lines.push(CALENDAR_OVERFLOW.to_string());
                    slice.truncated = true;
                    slice.days.push(day);
                    return slice;
                }
                day.lines.push(entry.line());
                line_count += 1;
            }
            slice.days.push(day);
        }
        slice
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|d| d.lines.is_empty())
    }
}

/// No calendar configured, every day is empty
#[derive(Debug, Default)]
pub struct NoCalendar;

impl CalendarSource for NoCalendar {
    fn upcoming(&self, _today: NaiveDate, _days: u32) -> Result<CalendarEvents, CollaboratorError> {
        Ok(CalendarEvents::new())
    }
}

/// Reads a calendar dump written by the sync job:
/// `{"2025-03-14": [{"time": "18:00", "summary": "..."}]}`
pub struct FileCalendar {
    path: PathBuf,
}

impl FileCalendar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CalendarSource for FileCalendar {
    fn upcoming(&self, today: NaiveDate, days: u32) -> Result<CalendarEvents, CollaboratorError> {
        let content = fs::read_to_string(&self.path)?;
        let raw: BTreeMap<String, Vec<CalendarEntry>> = serde_json::from_str(&content)?;
        let last = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);

        let mut events = CalendarEvents::new();
        for (key, entries) in raw {
            match NaiveDate::parse_from_str(&key, "%Y-%m-%d") {
                Ok(date) if date >= today && date <= last => {
                    events.insert(date, entries);
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping calendar date '{}': {}", key, e),
            }
        }
        Ok(events)
    }
}

/// Short lived cache in front of a calendar, a render cycle may ask several times
pub struct CachedCalendar {
    inner: Arc<dyn CalendarSource>,
    cache: Cache<(NaiveDate, u32), Arc<CalendarEvents>>,
}

impl CachedCalendar {
    pub fn new(inner: Arc<dyn CalendarSource>, ttl: std::time::Duration) -> Self {
        let cache = Cache::builder().max_capacity(8).time_to_live(ttl).build();
        Self { inner, cache }
    }
}

impl CalendarSource for CachedCalendar {
    fn upcoming(&self, today: NaiveDate, days: u32) -> Result<CalendarEvents, CollaboratorError> {
        let key = (today, days);
        if let Some(hit) = self.cache.get(&key) {
            return Ok((*hit).clone());
        }
        debug!("Calendar cache miss for {} (+{} days)", today, days);
        let events = self.inner.upcoming(today, days)?;
        self.cache.insert(key, Arc::new(events.clone()));
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_days_until_matches_case_insensitively() {
        let mut events = CalendarEvents::new();
        events.insert(day(16), vec![CalendarEntry::new("17:00", "Pick up DANIEL")]);

        assert_eq!(days_until(&events, "daniel", day(14), 30), Some(2));
        assert_eq!(days_until(&events, "daniel", day(16), 30), Some(0));
        assert_eq!(days_until(&events, "daniel", day(14), 2), None);
        assert_eq!(days_until(&events, "dentist", day(14), 30), None);
    }

    #[test]
    fn test_horizon_past_the_calendar_end_does_not_panic() {
        let near_end = NaiveDate::MAX.checked_sub_days(Days::new(2)).unwrap();
        let mut events = CalendarEvents::new();
        events.insert(near_end, vec![CalendarEntry::new("All Day", "Bins")]);

        assert_eq!(days_until(&events, "daniel", near_end, u32::MAX), None);
        assert_eq!(days_until(&events, "bins", near_end, u32::MAX), Some(0));
        assert_eq!(CalendarSlice::build(&events, NaiveDate::MAX), CalendarSlice::default());
    }

    #[test]
    fn test_slice_sorts_all_day_first_and_skips_later_days() {
        let mut events = CalendarEvents::new();
        events.insert(
            day(14),
            vec![
                CalendarEntry::new("18:00", "Dinner"),
                CalendarEntry::new("All Day", "Bin day"),
                CalendarEntry::new("09:30", "Standup"),
            ],
        );
        events.insert(day(20), vec![CalendarEntry::new("10:00", "Far away")]);

        let slice = CalendarSlice::build(&events, day(14));
        assert_eq!(slice.days.len(), 1);
        assert_eq!(slice.days[0].label, DayLabel::Today);
        assert_eq!(
            slice.days[0].lines,
            vec!["All Day - Bin day", "09:30 - Standup", "18:00 - Dinner"]
        );
        assert!(!slice.truncated);
    }

    #[test]
    fn test_slice_caps_lines_with_overflow_marker() {
        let mut events = CalendarEvents::new();
        events.insert(day(14), (0..3).map(|i| CalendarEntry::new(&format!("0{}:00", i), "a")).collect());
        events.insert(day(15), (0..3).map(|i| CalendarEntry::new(&format!("1{}:00", i), "b")).collect());

        let slice = CalendarSlice::build(&events, day(14));
        assert!(slice.truncated);
        assert_eq!(slice.days[0].lines.len(), 3);
        assert_eq!(slice.days[1].label, DayLabel::Tomorrow);
        assert_eq!(slice.days[1].lines, vec!["10:00 - b", CALENDAR_OVERFLOW]);
    }

    #[test]
    fn test_file_calendar_filters_window() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("calendar.json");
        fs::write(
            &file,
            r#"{"2025-03-13": [{"time": "All Day", "summary": "Past"}],
                "2025-03-14": [{"time": "19:00", "summary": "Daniel visit"}],
                "not-a-date": [],
                "2025-05-01": [{"time": "All Day", "summary": "Too far"}]}"#,
        )
        .unwrap();

        let events = FileCalendar::new(&file).upcoming(day(14), 30).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[&day(14)][0].title, "Daniel visit");

        let events = FileCalendar::new(&file).upcoming(day(14), u32::MAX).unwrap();
        assert_eq!(events.len(), 2);
    }

    struct Counting(AtomicUsize);

    impl CalendarSource for Counting {
        fn upcoming(&self, _today: NaiveDate, _days: u32) -> Result<CalendarEvents, CollaboratorError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(CalendarEvents::new())
        }
    }

    #[test]
    fn test_cached_calendar_fetches_once() {
        let inner = Arc::new(Counting(AtomicUsize::new(0)));
        let cached = CachedCalendar::new(inner.clone(), std::time::Duration::from_secs(60));

        cached.upcoming(day(14), 30).unwrap();
        cached.upcoming(day(14), 30).unwrap();
        assert_eq!(inner.0.load(Ordering::SeqCst), 1);

        cached.upcoming(day(15), 30).unwrap();
        assert_eq!(inner.0.load(Ordering::SeqCst), 2);
    }
}
