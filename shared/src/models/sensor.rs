//! Sensor telemetry models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Latest field conditions as seen by the advisory engine.
///
/// Every measurement is optional: devices report partial payloads and the
/// engine skips rules whose input is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Air temperature in °C
    pub temperature: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
    /// Volumetric soil moisture in percent
    pub soil_moisture: Option<f64>,
    /// Light intensity in lux
    pub light_intensity: Option<f64>,
}

/// A stored sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub id: Uuid,
    pub farm_id: Uuid,
    #[serde(flatten)]
    pub reading: SensorReading,
    pub recorded_at: DateTime<Utc>,
}

/// Payload posted by field devices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorIngestPayload {
    pub farm_id: Uuid,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub light_intensity: Option<f64>,
    pub soil_moisture: Option<f64>,
}

impl SensorIngestPayload {
    pub fn reading(&self) -> SensorReading {
        SensorReading {
            temperature: self.temperature,
            humidity: self.humidity,
            soil_moisture: self.soil_moisture,
            light_intensity: self.light_intensity,
        }
    }
}
