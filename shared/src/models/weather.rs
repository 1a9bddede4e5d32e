//! Weather data models

use serde::{Deserialize, Serialize};

use crate::types::GpsCoordinates;

/// A forecast snapshot at a point in time.
///
/// Fetched on demand from the forecast provider and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: GpsCoordinates,
    pub current_temperature: f64,
    pub current_humidity: f64,
    /// WMO weather interpretation code for current conditions
    pub weather_code: i32,
    /// Daily maxima, index 0 is today
    pub daily_max: Vec<f64>,
    /// Daily minima, index 0 is today
    pub daily_min: Vec<f64>,
    /// Daily WMO codes, index 0 is today
    pub daily_weather_codes: Vec<i32>,
}

/// Coarse grouping of WMO weather interpretation codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Showers,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 | 1 => WeatherCondition::Clear,
            2 | 3 => WeatherCondition::Cloudy,
            45 | 48 => WeatherCondition::Fog,
            51..=57 => WeatherCondition::Drizzle,
            61..=67 => WeatherCondition::Rain,
            71..=77 | 85 | 86 => WeatherCondition::Snow,
            80..=82 => WeatherCondition::Showers,
            95..=99 => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Unknown,
        }
    }

    /// Precipitation that matters for irrigation and spraying decisions
    pub fn is_wet(&self) -> bool {
        matches!(
            self,
            WeatherCondition::Drizzle | WeatherCondition::Rain | WeatherCondition::Showers
        )
    }

    pub fn is_severe(&self) -> bool {
        matches!(self, WeatherCondition::Thunderstorm)
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Fog => "Fog",
            WeatherCondition::Drizzle => "Drizzle",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Showers => "Rain showers",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::Unknown => "Unknown",
        }
    }
}
