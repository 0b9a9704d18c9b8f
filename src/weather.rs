/*
 *  weather.rs
 *
 *  InkyDash - chores at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather collaborator and the dashboard's weather slice, derived from
 *  a MET Norway "compact" location forecast document
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
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use crate::constants::{RAIN_GAUGE_SLOTS, WEATHER_FALLBACK_SLOTS, WEATHER_MINMAX_SLOTS};
use crate::error::CollaboratorError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSlice {
    pub temp: i32,
    pub temp_min: i32,
    pub temp_max: i32,
    pub symbol_code: String,
    pub icon: &'static str,
    pub rain_amount: f64,
    pub wind: i32,
    pub cloud: i32,
    /// 1 (dry) ..= 4 (very rainy) over the next few hours
    pub rain_gauge: u8,
}

pub trait WeatherSource: Send + Sync {
    fn current(&self) -> Result<WeatherSlice, CollaboratorError>;
}

/// Icon asset for a MET symbol code
pub fn icon_for_symbol(symbol: &str) -> &'static str {
    match symbol {
        "clearsky_day" => "clear_day",
        "clearsky_night" => "clear_night",
        "cloudy" | "fog" => "cloudy",
        "fair_day" | "fair_night" | "partlycloudy_day" | "partlycloudy_night" => "partly_cloudy",
        "heavyrain" | "heavyrainshowers_day" | "rain" | "rainshowers_day" => "rain",
        "heavyrainandthunder" | "thunderstorm" => "thunder",
        "heavysnow" | "heavysnowshowers_day" | "lightssnow" | "snow" | "snowshowers_day" => "snow",
        "lightrain" | "lightrainshowers_day" | "sleet" => "sleet",
        _ => "clear_day",
    }
}

/// Accumulated rain over the next slots mapped onto the 4 step gauge
pub fn rain_gauge_level(total_mm: f64) -> u8 {
    if total_mm >= 6.0 {
        4
    } else if total_mm >= 3.0 {
        3
    } else if total_mm > 0.0 {
        2
    } else {
        1
    }
}

fn timeseries(doc: &Value) -> Result<&Vec<Value>, CollaboratorError> {
    doc.pointer("/properties/timeseries")
        .and_then(Value::as_array)
        .filter(|slots| !slots.is_empty())
        .ok_or_else(|| CollaboratorError::MissingData("properties.timeseries".into()))
}

fn slot_f64(slot: &Value, pointer: &str) -> Option<f64> {
    slot.pointer(pointer).and_then(Value::as_f64)
}

fn rain_total(slots: &[Value]) -> f64 {
    slots
        .iter()
        .take(RAIN_GAUGE_SLOTS)
        .filter_map(|s| slot_f64(s, "/data/next_1_hours/details/precipitation_amount"))
        .sum()
}

impl WeatherSlice {
    pub fn from_forecast(doc: &Value) -> Result<Self, CollaboratorError> {
        let slots = timeseries(doc)?;
        let current = &slots[0];

        let temp = slot_f64(current, "/data/instant/details/air_temperature").unwrap_or(0.0);
        let symbol_code = current
            .pointer("/data/next_1_hours/summary/symbol_code")
            .and_then(Value::as_str)
            .unwrap_or("clearsky_day")
            .to_string();

        let (mut temp_min, mut temp_max) = (temp, temp);
        for t in slots
            .iter()
            .take(WEATHER_MINMAX_SLOTS)
            .filter_map(|s| slot_f64(s, "/data/instant/details/air_temperature"))
        {
            temp_min = temp_min.min(t);
            temp_max = temp_max.max(t);
        }

        // flat hourly series, try the six hour summaries instead
        if temp_min == temp_max {
            for slot in slots.iter().take(WEATHER_FALLBACK_SLOTS) {
                if let Some(t) = slot_f64(slot, "/data/next_6_hours/details/air_temperature_min") {
                    temp_min = t;
                }
                if let Some(t) = slot_f64(slot, "/data/next_6_hours/details/air_temperature_max") {
                    temp_max = t;
                }
                if temp_min != temp_max {
                    break;
                }
            }
        }

        Ok(Self {
            temp: temp.round() as i32,
            temp_min: temp_min.round() as i32,
            temp_max: temp_max.round() as i32,
            icon: icon_for_symbol(&symbol_code),
            symbol_code,
            rain_amount: slot_f64(current, "/data/next_1_hours/details/precipitation_amount")
                .unwrap_or(0.0),
            wind: slot_f64(current, "/data/instant/details/wind_speed").unwrap_or(0.0).round() as i32,
            cloud: slot_f64(current, "/data/instant/details/cloud_area_fraction")
                .unwrap_or(0.0)
                .round() as i32,
            rain_gauge: rain_gauge_level(rain_total(slots)),
        })
    }
}

#[derive(Debug, Default)]
pub struct NoWeather;

impl WeatherSource for NoWeather {
    fn current(&self) -> Result<WeatherSlice, CollaboratorError> {
        Err(CollaboratorError::Unavailable("weather"))
    }
}

/// Forecast document cached on disk by the fetcher
pub struct FileWeather {
    path: PathBuf,
}

impl FileWeather {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WeatherSource for FileWeather {
    fn current(&self) -> Result<WeatherSlice, CollaboratorError> {
        let content = fs::read_to_string(&self.path)?;
        let doc: Value = serde_json::from_str(&content)?;
        WeatherSlice::from_forecast(&doc)
    }
}
