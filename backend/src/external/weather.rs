//! Weather API client for fetching forecast data
//!
//! Integrates with the Open-Meteo forecast API (no API key required)

use reqwest::Client;
use serde::Deserialize;
use shared::{GpsCoordinates, WeatherSnapshot};

use crate::error::{AppError, AppResult};

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
}

/// Open-Meteo forecast response
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    #[serde(default)]
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    weather_code: i32,
}

#[derive(Debug, Default, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
}

impl WeatherClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch current conditions plus the daily forecast for a location
    pub async fn get_snapshot(&self, location: GpsCoordinates) -> AppResult<WeatherSnapshot> {
        let url = format!("{}/v1/forecast", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,weather_code".to_string(),
                ),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,weather_code".to_string(),
                ),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::WeatherError(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::WeatherError(format!("{} - {}", status, body)));
        }

        let data: ForecastResponse = response
            .json()
            .await
            .map_err(|e| AppError::WeatherError(format!("failed to parse response: {}", e)))?;

        Ok(convert_response(location, data))
    }
}

/// Days with missing values are dropped from each series
fn convert_response(location: GpsCoordinates, data: ForecastResponse) -> WeatherSnapshot {
    let daily = data.daily.unwrap_or_default();

    WeatherSnapshot {
        location,
        current_temperature: data.current.temperature_2m,
        current_humidity: data.current.relative_humidity_2m,
        weather_code: data.current.weather_code,
        daily_max: daily.temperature_2m_max.into_iter().flatten().collect(),
        daily_min: daily.temperature_2m_min.into_iter().flatten().collect(),
        daily_weather_codes: daily.weather_code.into_iter().flatten().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_open_meteo_payload() {
        let payload = serde_json::json!({
            "latitude": 9.08,
            "longitude": 8.67,
            "current": {
                "time": "2024-06-01T12:00",
                "temperature_2m": 31.4,
                "relative_humidity_2m": 58,
                "weather_code": 3
            },
            "daily": {
                "time": ["2024-06-01", "2024-06-02"],
                "temperature_2m_max": [33.1, null],
                "temperature_2m_min": [22.0, 21.5],
                "weather_code": [3, 95]
            }
        });
        let data: ForecastResponse = serde_json::from_value(payload).unwrap();
        let snapshot = convert_response(GpsCoordinates::new(9.082, 8.6753), data);

        assert_eq!(snapshot.weather_code, 3);
        assert!((snapshot.current_humidity - 58.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.daily_max, vec![33.1]);
        assert_eq!(snapshot.daily_weather_codes, vec![3, 95]);
    }

    #[test]
    fn test_missing_daily_block() {
        let payload = serde_json::json!({
            "current": {"temperature_2m": 25.0, "relative_humidity_2m": 70.0, "weather_code": 61}
        });
        let data: ForecastResponse = serde_json::from_value(payload).unwrap();
        let snapshot = convert_response(GpsCoordinates::new(0.0, 0.0), data);
        assert!(snapshot.daily_max.is_empty());
        assert!(snapshot.daily_weather_codes.is_empty());
    }
}
