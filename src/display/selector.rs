/*
 *  display/selector.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Render selector - picks one screen per poll cycle:
 *  media overlay > cooldown scene > dashboard
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

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use std::sync::Arc;

use super::{Dashboard, RenderDecision};
use crate::calendar::{days_until, CalendarEvents, CalendarSlice, CalendarSource};
use crate::cooldown::{CooldownSchedule, SceneTracker};
use crate::cue::SceneCue;
use crate::error::CollaboratorError;
use crate::media::MediaPlayer;
use crate::state_store::StateStore;
use crate::weather::WeatherSource;

/// Everything outside the core the selector talks to, handed in at construction
#[derive(Clone)]
pub struct Collaborators {
    pub media: Arc<dyn MediaPlayer>,
    pub calendar: Arc<dyn CalendarSource>,
    pub weather: Arc<dyn WeatherSource>,
    pub cue: Arc<dyn SceneCue>,
}

pub struct RenderSelector {
    store: StateStore,
    services: Collaborators,
    schedule: CooldownSchedule,
    tracker: SceneTracker,
    event_keyword: String,
    lookahead_days: u32,
    last_screen: Option<&'static str>,
}

impl RenderSelector {
    pub fn new(store: StateStore, services: Collaborators, event_keyword: &str, lookahead_days: u32) -> Self {
        Self {
            store,
            services,
            schedule: CooldownSchedule::default(),
            tracker: SceneTracker::new(),
            event_keyword: event_keyword.to_string(),
            lookahead_days,
            last_screen: None,
        }
    }

    pub fn select(&mut self) -> RenderDecision {
        self.select_at(Local::now().naive_local())
    }

    /// First stage to claim the cycle wins, later stages never run.
    pub fn select_at(&mut self, now: NaiveDateTime) -> RenderDecision {
        let decision = self.cascade(now);
        if self.last_screen != Some(decision.name()) {
            info!("Showing {} screen", decision.name());
            self.last_screen = Some(decision.name());
        }
        decision
    }

    fn cascade(&mut self, now: NaiveDateTime) -> RenderDecision {
        if self.media_active() {
            self.tracker.on_scene_exited();
            return RenderDecision::MediaOverlay;
        }

        let scene = self
            .schedule
            .evaluate_with(now.time(), || self.event_today(now.date()));
        if let Some(scene) = scene {
            if self.tracker.on_scene_entered(scene) {
                self.services.cue.play(scene);
            }
            return RenderDecision::Cooldown { scene };
        }
        self.tracker.on_scene_exited();

        debug!("Building main dashboard");
        RenderDecision::Dashboard(self.dashboard(now))
    }

    fn media_active(&self) -> bool {
        self.services.media.session_active().unwrap_or_else(|e| {
            warn!("Media probe failed, treating as inactive: {}", e);
            false
        })
    }

    fn events(&self, today: NaiveDate) -> Option<CalendarEvents> {
        match self.services.calendar.upcoming(today, self.lookahead_days) {
            Ok(events) => Some(events),
            Err(e) => {
                warn!("Calendar unavailable: {}", e);
                None
            }
        }
    }

    fn event_today(&self, today: NaiveDate) -> bool {
        self.events(today)
            .and_then(|events| days_until(&events, &self.event_keyword, today, self.lookahead_days))
            == Some(0)
    }

    fn dashboard(&self, now: NaiveDateTime) -> Dashboard {
        let state = self.store.reset_if_empty(now);

        let today = now.date();
        let (calendar, countdown) = match self.events(today) {
            Some(events) => (
                Some(CalendarSlice::build(&events, today)),
                days_until(&events, &self.event_keyword, today, self.lookahead_days),
            ),
            None => (None, None),
        };

        let weather = match self.services.weather.current() {
            Ok(w) => Some(w),
            Err(CollaboratorError::Unavailable(what)) => {
                debug!("No {} source", what);
                None
            }
            Err(e) => {
                warn!("Weather unavailable: {}", e);
                None
            }
        };

        Dashboard::assemble(&state, now, calendar, weather, countdown)
    }
}
