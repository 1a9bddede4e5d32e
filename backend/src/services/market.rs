//! Community market price service

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{daily_price_trend, validate_crop_name, validate_price, CropTrend, MarketSubmission};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::MarketConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct MarketService {
    db: PgPool,
    trend_window_days: i64,
    advisory_sample_size: i64,
}

/// Input for a price submission
#[derive(Debug, Deserialize)]
pub struct SubmitPriceInput {
    pub crop_name: String,
    pub price_per_kg: Decimal,
}

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: Uuid,
    crop_name: String,
    price_per_kg: Decimal,
    submitted_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<SubmissionRow> for MarketSubmission {
    fn from(row: SubmissionRow) -> Self {
        MarketSubmission {
            id: row.id,
            crop_name: row.crop_name,
            price_per_kg: row.price_per_kg,
            submitted_by: row.submitted_by,
            created_at: row.created_at,
        }
    }
}

impl MarketService {
    pub fn new(db: PgPool, config: &MarketConfig) -> Self {
        Self {
            db,
            trend_window_days: config.trend_window_days,
            advisory_sample_size: config.advisory_sample_size,
        }
    }

    pub async fn submit(
        &self,
        input: SubmitPriceInput,
        submitted_by: Uuid,
    ) -> AppResult<MarketSubmission> {
        let crop_name = input.crop_name.trim();
        validate_crop_name(crop_name).map_err(|e| AppError::ValidationError(e.to_string()))?;
        validate_price(input.price_per_kg).map_err(|e| AppError::ValidationError(e.to_string()))?;

        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO market_price_submissions (crop_name, price_per_kg, submitted_by)
            VALUES ($1, $2, $3)
            RETURNING id, crop_name, price_per_kg, submitted_by, created_at
            "#,
        )
        .bind(crop_name)
        .bind(input.price_per_kg.round_dp(2))
        .bind(submitted_by)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(crop = crop_name, price = %row.price_per_kg, "Market price submitted");

        Ok(row.into())
    }

    /// Daily average trend for one crop over the configured window
    pub async fn trend(&self, crop_name: &str) -> AppResult<CropTrend> {
        validate_crop_name(crop_name).map_err(|e| AppError::ValidationError(e.to_string()))?;
        let since = Utc::now() - Duration::days(self.trend_window_days);

        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, crop_name, price_per_kg, submitted_by, created_at
            FROM market_price_submissions
            WHERE crop_name = $1 AND created_at >= $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(crop_name)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        let submissions: Vec<MarketSubmission> = rows.into_iter().map(Into::into).collect();

        Ok(CropTrend {
            crop_name: crop_name.to_string(),
            points: daily_price_trend(&submissions, crop_name, since),
        })
    }

    /// Most recent submissions across all crops, newest first
    pub async fn recent_sample(&self) -> AppResult<Vec<MarketSubmission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, crop_name, price_per_kg, submitted_by, created_at
            FROM market_price_submissions
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(self.advisory_sample_size)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
