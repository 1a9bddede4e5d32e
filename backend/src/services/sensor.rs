//! Sensor telemetry service

use chrono::{DateTime, Utc};
use shared::{validate_sensor_ranges, SensorIngestPayload, SensorReading, SensorRecord};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct SensorService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct SensorRow {
    id: Uuid,
    farm_id: Uuid,
    temperature: Option<f64>,
    humidity: Option<f64>,
    soil_moisture: Option<f64>,
    light_intensity: Option<f64>,
    recorded_at: DateTime<Utc>,
}

impl From<SensorRow> for SensorRecord {
    fn from(row: SensorRow) -> Self {
        SensorRecord {
            id: row.id,
            farm_id: row.farm_id,
            reading: SensorReading {
                temperature: row.temperature,
                humidity: row.humidity,
                soil_moisture: row.soil_moisture,
                light_intensity: row.light_intensity,
            },
            recorded_at: row.recorded_at,
        }
    }
}

impl SensorService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Store a device reading. The timestamp is assigned by the database.
    pub async fn ingest(&self, payload: &SensorIngestPayload) -> AppResult<SensorRecord> {
        validate_sensor_ranges(
            payload.temperature,
            payload.humidity,
            payload.soil_moisture,
            payload.light_intensity,
        )
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let row = sqlx::query_as::<_, SensorRow>(
            r#"
            INSERT INTO sensor_data (farm_id, temperature, humidity, soil_moisture, light_intensity)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM farms WHERE id = $1)
            RETURNING id, farm_id, temperature, humidity, soil_moisture, light_intensity, recorded_at
            "#,
        )
        .bind(payload.farm_id)
        .bind(payload.temperature)
        .bind(payload.humidity)
        .bind(payload.soil_moisture)
        .bind(payload.light_intensity)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Farm".to_string()))?;

        Ok(row.into())
    }

    pub async fn latest(&self, farm_id: Uuid) -> AppResult<Option<SensorRecord>> {
        let row = sqlx::query_as::<_, SensorRow>(
            r#"
            SELECT id, farm_id, temperature, humidity, soil_moisture, light_intensity, recorded_at
            FROM sensor_data
            WHERE farm_id = $1
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(farm_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(SensorRecord::from))
    }

    /// The last `limit` readings, oldest first
    pub async fn history(&self, farm_id: Uuid, limit: i64) -> AppResult<Vec<SensorRecord>> {
        let rows = sqlx::query_as::<_, SensorRow>(
            r#"
            SELECT id, farm_id, temperature, humidity, soil_moisture, light_intensity, recorded_at
            FROM sensor_data
            WHERE farm_id = $1
            ORDER BY recorded_at DESC
            LIMIT $2
            "#,
        )
        .bind(farm_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().rev().map(SensorRecord::from).collect())
    }
}
