//! Simulated site weather.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{RandomSource, round1, telemetry::daylight_factor};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    Cloudy,
    Night,
    #[serde(rename = "Cloudy Night")]
    CloudyNight,
}

impl WeatherCondition {
    pub fn is_night(self) -> bool {
        matches!(self, WeatherCondition::Night | WeatherCondition::CloudyNight)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::PartlyCloudy => "Partly Cloudy",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Night => "Night",
            WeatherCondition::CloudyNight => "Cloudy Night",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: String,
    pub temperature_c: f64,
    pub condition: WeatherCondition,
    pub irradiance_w_m2: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
}

/// Weather at `location` for `now`. The location only labels the snapshot;
/// the model depends on month and hour alone.
///
/// Draws: temperature noise, then (daylight) condition roll + irradiance
/// factor or (night) condition roll, then humidity and wind.
pub fn compute_weather(
    location: &str,
    now: NaiveDateTime,
    rng: &mut impl RandomSource,
) -> WeatherSnapshot {
    let hour = now.hour();
    let month = now.month();

    let base_temp = if (4..=9).contains(&month) { 25.0 } else { 15.0 };
    // Warming runs through 19:00 inclusive, one hour past the production window.
    let time_factor = if (6..=19).contains(&hour) {
        (hour as f64 - 6.0) / 13.0 * 10.0
    } else {
        0.0
    };
    let temperature_c = round1(base_temp + time_factor + rng.uniform(-3.0, 3.0));

    let factor = daylight_factor(hour);
    let (condition, irradiance_w_m2) = if factor > 0.0 {
        let base_irradiance = 1000.0 * factor;
        let roll = rng.unit();
        let (condition, lo, hi) = if roll < 0.6 {
            (WeatherCondition::Clear, 0.9, 1.0)
        } else if roll < 0.8 {
            (WeatherCondition::PartlyCloudy, 0.6, 0.8)
        } else {
            (WeatherCondition::Cloudy, 0.2, 0.5)
        };
        (condition, (base_irradiance * rng.uniform(lo, hi)).round())
    } else {
        let condition = if rng.unit() < 0.8 {
            WeatherCondition::Night
        } else {
            WeatherCondition::CloudyNight
        };
        (condition, 0.0)
    };

    let humidity_pct = rng.integer(30, 80) as u8;
    let wind_speed = round1(rng.uniform(0.0, 25.0));

    WeatherSnapshot {
        location: location.to_string(),
        temperature_c,
        condition,
        irradiance_w_m2,
        humidity_pct,
        wind_speed,
    }
}
