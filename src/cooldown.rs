/*
 *  cooldown.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Cooldown scenes - time of day windows that pre-empt the dashboard
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

use chrono::NaiveTime;
use log::{debug, info};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScene {
    Daniel,
    Evening,
    Night,
}

impl CooldownScene {
    pub fn name(self) -> &'static str {
        match self {
            CooldownScene::Daniel => "daniel",
            CooldownScene::Evening => "evening",
            CooldownScene::Night => "night",
        }
    }
}

impl fmt::Display for CooldownScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Time of day interval, start inclusive, end exclusive.
/// `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whole hours, `hours(23, 5)` is 23:00 to 05:00
    pub fn hours(start: u32, end: u32) -> Self {
        Self::new(
            NaiveTime::from_hms_opt(start, 0, 0).unwrap_or(NaiveTime::MIN),
            NaiveTime::from_hms_opt(end, 0, 0).unwrap_or(NaiveTime::MIN),
        )
    }

    pub fn contains(&self, now: NaiveTime) -> bool {
        if self.start < self.end {
            self.start <= now && now < self.end
        } else {
            now >= self.start || now < self.end
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CooldownWindow {
    scene: CooldownScene,
    window: TimeWindow,
    /// only shown on days with a matching calendar event
    needs_event: bool,
}

/// Ordered windows, the first match wins.
#[derive(Debug, Clone)]
pub struct CooldownSchedule {
    windows: Vec<CooldownWindow>,
}

impl Default for CooldownSchedule {
    fn default() -> Self {
        Self {
            windows: vec![
                CooldownWindow {
                    scene: CooldownScene::Daniel,
                    window: TimeWindow::hours(19, 20),
                    needs_event: true,
                },
                CooldownWindow {
                    scene: CooldownScene::Evening,
                    window: TimeWindow::hours(22, 23),
                    needs_event: false,
                },
                CooldownWindow {
                    scene: CooldownScene::Night,
                    window: TimeWindow::hours(23, 5),
                    needs_event: false,
                },
            ],
        }
    }
}

impl CooldownSchedule {
    pub fn evaluate(&self, now: NaiveTime, event_today: bool) -> Option<CooldownScene> {
        self.evaluate_with(now, || event_today)
    }

    /// Like `evaluate`, but the event lookup only runs when a gated window
    /// covers `now`, and at most once.
    pub fn evaluate_with<F>(&self, now: NaiveTime, event_today: F) -> Option<CooldownScene>
    where
        F: FnOnce() -> bool,
    {
        let mut probe = Some(event_today);
        let mut known: Option<bool> = None;

        for w in &self.windows {
            if !w.window.contains(now) {
                continue;
            }
            if w.needs_event {
                let today = *known.get_or_insert_with(|| probe.take().is_some_and(|f| f()));
                if !today {
                    debug!("{} window open but no event today", w.scene);
                    continue;
                }
            }
            return Some(w.scene);
        }
        None
    }
}

/// Remembers the scene on screen so entry side effects fire once per stay.
#[derive(Debug, Default)]
pub struct SceneTracker {
    last: Option<CooldownScene>,
}

impl SceneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `scene` was not already showing.
    pub fn on_scene_entered(&mut self, scene: CooldownScene) -> bool {
        if self.last == Some(scene) {
            return false;
        }
        info!("Entering {} scene", scene);
        self.last = Some(scene);
        true
    }

    pub fn on_scene_exited(&mut self) {
        if let Some(scene) = self.last.take() {
            info!("Leaving {} scene", scene);
        }
    }

    pub fn current(&self) -> Option<CooldownScene> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_window_wraps_midnight() {
        let night = TimeWindow::hours(23, 5);
        assert!(night.contains(hm(0, 30)));
        assert!(night.contains(hm(23, 0)));
        assert!(night.contains(hm(4, 59)));
        assert!(!night.contains(hm(5, 0)));
        assert!(!night.contains(hm(6, 0)));
    }

    #[test]
    fn test_plain_window_is_half_open() {
        let evening = TimeWindow::hours(22, 23);
        assert!(evening.contains(hm(22, 0)));
        assert!(!evening.contains(hm(23, 0)));
        assert!(!evening.contains(hm(21, 59)));
    }

    #[test]
    fn test_schedule_picks_scenes() {
        let schedule = CooldownSchedule::default();
        assert_eq!(schedule.evaluate(hm(19, 30), true), Some(CooldownScene::Daniel));
        assert_eq!(schedule.evaluate(hm(19, 30), false), None);
        assert_eq!(schedule.evaluate(hm(22, 15), false), Some(CooldownScene::Evening));
        assert_eq!(schedule.evaluate(hm(23, 0), false), Some(CooldownScene::Night));
        assert_eq!(schedule.evaluate(hm(2, 0), true), Some(CooldownScene::Night));
        assert_eq!(schedule.evaluate(hm(12, 0), true), None);
    }

    #[test]
    fn test_event_lookup_skipped_outside_gated_window() {
        let schedule = CooldownSchedule::default();
        let scene = schedule.evaluate_with(hm(22, 30), || panic!("calendar consulted"));
        assert_eq!(scene, Some(CooldownScene::Evening));
        assert_eq!(schedule.evaluate_with(hm(9, 0), || panic!("calendar consulted")), None);
    }

    #[test]
    fn test_tracker_fires_once_per_stay() {
        let mut tracker = SceneTracker::new();
        assert!(tracker.on_scene_entered(CooldownScene::Evening));
        assert!(!tracker.on_scene_entered(CooldownScene::Evening));
        assert!(!tracker.on_scene_entered(CooldownScene::Evening));

        // evening runs straight into night
        assert!(tracker.on_scene_entered(CooldownScene::Night));
        assert_eq!(tracker.current(), Some(CooldownScene::Night));

        tracker.on_scene_exited();
        assert_eq!(tracker.current(), None);
        assert!(tracker.on_scene_entered(CooldownScene::Night));
    }
}
