//! Farm service
//!
//! Each farmer owns exactly one farm. It is created on first access.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{Farm, SensorRecord};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{AlertService, SensorService};

#[derive(Clone)]
pub struct FarmService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct FarmRow {
    id: Uuid,
    farmer_id: Uuid,
    farm_name: String,
    location: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<FarmRow> for Farm {
    fn from(row: FarmRow) -> Self {
        Farm {
            id: row.id,
            farmer_id: row.farmer_id,
            farm_name: row.farm_name,
            location: row.location,
            created_at: row.created_at,
        }
    }
}

/// Dashboard summary for one farm
#[derive(Debug, Serialize)]
pub struct FarmDashboard {
    pub farm: Farm,
    pub latest_reading: Option<SensorRecord>,
    pub critical_alerts: i64,
}

impl FarmService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_for_farmer(&self, farmer_id: Uuid) -> AppResult<Option<Farm>> {
        let row = sqlx::query_as::<_, FarmRow>(
            r#"
            SELECT id, farmer_id, farm_name, location, created_at
            FROM farms
            WHERE farmer_id = $1
            "#,
        )
        .bind(farmer_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Farm::from))
    }

    /// The farmer's farm; fails with a validation error if none exists yet
    pub async fn require_farm(&self, farmer_id: Uuid) -> AppResult<Farm> {
        self.find_for_farmer(farmer_id)
            .await?
            .ok_or(AppError::NoFarm)
    }

    /// The farmer's farm, creating a default one if needed
    pub async fn get_or_create(&self, farmer_id: Uuid) -> AppResult<Farm> {
        if let Some(farm) = self.find_for_farmer(farmer_id).await? {
            return Ok(farm);
        }

        sqlx::query(
            r#"
            INSERT INTO farms (farmer_id, farm_name, location)
            VALUES ($1, $2, $3)
            ON CONFLICT (farmer_id) DO NOTHING
            "#,
        )
        .bind(farmer_id)
        .bind(Farm::DEFAULT_NAME)
        .bind(Farm::DEFAULT_LOCATION)
        .execute(&self.db)
        .await?;

        tracing::info!(%farmer_id, "Created default farm");

        self.require_farm(farmer_id).await
    }

    pub async fn dashboard(&self, farmer_id: Uuid) -> AppResult<FarmDashboard> {
        let farm = self.get_or_create(farmer_id).await?;
        let latest_reading = SensorService::new(self.db.clone()).latest(farm.id).await?;
        let critical_alerts = AlertService::new(self.db.clone())
            .unread_critical_count(farm.id)
            .await?;

        Ok(FarmDashboard {
            farm,
            latest_reading,
            critical_alerts,
        })
    }
}
