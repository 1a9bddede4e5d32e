//! Farm alert service
//!
//! Alerts are written by the scan pipeline; afterwards only the read flag
//! changes.

use chrono::{DateTime, Utc};
use shared::{Alert, AlertSeverity, NewAlert};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct AlertService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct AlertRow {
    id: Uuid,
    farm_id: Uuid,
    alert_type: String,
    severity: String,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = AppError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Alert {
            id: row.id,
            farm_id: row.farm_id,
            alert_type: row.alert_type,
            severity: row.severity.parse().map_err(AppError::Internal)?,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

impl AlertService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, alert: NewAlert) -> AppResult<Alert> {
        let row = sqlx::query_as::<_, AlertRow>(
            r#"
            INSERT INTO alerts (farm_id, alert_type, severity, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, farm_id, alert_type, severity, message, is_read, created_at
            "#,
        )
        .bind(alert.farm_id)
        .bind(&alert.alert_type)
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Alerts for a farm, newest first
    pub async fn list(&self, farm_id: Uuid, limit: i64) -> AppResult<Vec<Alert>> {
        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT id, farm_id, alert_type, severity, message, is_read, created_at
            FROM alerts
            WHERE farm_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(farm_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Alert::try_from).collect()
    }

    pub async fn unread_count(&self, farm_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM alerts WHERE farm_id = $1 AND is_read = false",
        )
        .bind(farm_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Unread critical alerts, shown on the dashboard
    pub async fn unread_critical_count(&self, farm_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM alerts WHERE farm_id = $1 AND is_read = false AND severity = $2",
        )
        .bind(farm_id)
        .bind(AlertSeverity::Critical.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Mark alert as read
    pub async fn mark_as_read(&self, farm_id: Uuid, alert_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE alerts SET is_read = true WHERE id = $1 AND farm_id = $2")
            .bind(alert_id)
            .bind(farm_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Alert".to_string()));
        }

        Ok(())
    }
}
