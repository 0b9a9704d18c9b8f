/*
 *  display/mod.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Screen selection - what the panel should show this cycle
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

use serde::Serialize;

use crate::appliance::{Appliance, GlobalState, Layer, LAYER_ORDER};
use crate::calendar::CalendarSlice;
use crate::classifier::{classify, DisplayTier};
use crate::cooldown::CooldownScene;
use crate::weather::WeatherSlice;

pub mod compositor;
pub mod selector;

pub use compositor::{Compositor, SnapshotCompositor};
pub use selector::{Collaborators, RenderSelector};

/// One cycle's screen. Built fresh every poll, drawn by the compositor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum RenderDecision {
    /// the media player draws its own overlay
    MediaOverlay,
    Cooldown { scene: CooldownScene },
    Dashboard(Dashboard),
}

impl RenderDecision {
    pub fn name(&self) -> &'static str {
        match self {
            RenderDecision::MediaOverlay => "media",
            RenderDecision::Cooldown { .. } => "cooldown",
            RenderDecision::Dashboard(_) => "dashboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplianceView {
    pub appliance: Appliance,
    pub tier: DisplayTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// in draw order
    pub appliances: Vec<ApplianceView>,
    /// every asset layer, scenery included, bottom first
    pub layers: Vec<String>,
    pub calendar: Option<CalendarSlice>,
    pub weather: Option<WeatherSlice>,
    /// days until the next keyword event, 0 = today
    pub countdown: Option<i64>,
}

impl Dashboard {
    /// Classify every known record in draw order, appliances without a record are left out
    pub fn assemble(
        state: &GlobalState,
        now: chrono::NaiveDateTime,
        calendar: Option<CalendarSlice>,
        weather: Option<WeatherSlice>,
        countdown: Option<i64>,
    ) -> Self {
        let mut appliances = Vec::new();
        let mut layers = Vec::new();

        for layer in LAYER_ORDER {
            match layer {
                Layer::Scenery(name) => layers.push(name.to_string()),
                Layer::Appliance(appliance) => {
                    let Some(record) = state.get(&appliance) else { continue };
                    let tier = classify(appliance, record, now);
                    layers.push(tier.layer_name(appliance));
                    appliances.push(ApplianceView { appliance, tier });
                }
            }
        }

        Self { appliances, layers, calendar, weather, countdown }
    }

    pub fn tier_of(&self, appliance: Appliance) -> Option<DisplayTier> {
        self.appliances.iter().find(|v| v.appliance == appliance).map(|v| v.tier)
    }
}
