/*
 *  lib.rs
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

pub mod appliance;
pub mod calendar;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod cooldown;
pub mod cue;
pub mod dispatcher;
pub mod display;
pub mod error;
pub mod input;
pub mod media;
pub mod state_store;
pub mod weather;

pub use appliance::{Appliance, ApplianceRecord, GlobalState};
pub use display::{RenderDecision, RenderSelector};
pub use state_store::StateStore;
