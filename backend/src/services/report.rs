//! Analysis report persistence

use chrono::{DateTime, Utc};
use shared::{AnalysisReport, InfestationLevel, MediaType, ScanType};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ReportService {
    db: PgPool,
}

/// Report about to be written
#[derive(Debug, Clone)]
pub struct NewAnalysisReport {
    pub farm_id: Uuid,
    pub scan_type: ScanType,
    pub media_type: MediaType,
    pub image_url: String,
    pub analyzed_media: Option<String>,
    pub infestation_level: InfestationLevel,
    pub confidence_score: f64,
    pub pest_types: Vec<String>,
    pub bounding_boxes: serde_json::Value,
}

#[derive(Debug, FromRow)]
struct ReportRow {
    id: Uuid,
    farm_id: Uuid,
    scan_type: String,
    media_type: String,
    image_url: String,
    analyzed_media: Option<String>,
    infestation_level: String,
    confidence_score: f64,
    pest_types: Vec<String>,
    bounding_boxes: serde_json::Value,
    analyzed_at: DateTime<Utc>,
}

impl TryFrom<ReportRow> for AnalysisReport {
    type Error = AppError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(AnalysisReport {
            id: row.id,
            farm_id: row.farm_id,
            scan_type: row.scan_type.parse().map_err(AppError::Internal)?,
            media_type: MediaType::from_label(&row.media_type),
            image_url: row.image_url,
            analyzed_media: row.analyzed_media,
            infestation_level: row.infestation_level.parse().map_err(AppError::Internal)?,
            confidence_score: row.confidence_score,
            pest_types: row.pest_types,
            bounding_boxes: row.bounding_boxes,
            analyzed_at: row.analyzed_at,
        })
    }
}

const REPORT_COLUMNS: &str = "id, farm_id, scan_type, media_type, image_url, analyzed_media, \
     infestation_level, confidence_score, pest_types, bounding_boxes, analyzed_at";

impl ReportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn insert(&self, report: NewAnalysisReport) -> AppResult<AnalysisReport> {
        let query = format!(
            r#"
            INSERT INTO analysis_reports
                (farm_id, scan_type, media_type, image_url, analyzed_media,
                 infestation_level, confidence_score, pest_types, bounding_boxes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );

        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(report.farm_id)
            .bind(report.scan_type.as_str())
            .bind(report.media_type.as_str())
            .bind(&report.image_url)
            .bind(&report.analyzed_media)
            .bind(report.infestation_level.as_str())
            .bind(report.confidence_score)
            .bind(&report.pest_types)
            .bind(&report.bounding_boxes)
            .fetch_one(&self.db)
            .await?;

        row.try_into()
    }

    /// Most recent report for a farm
    pub async fn latest(&self, farm_id: Uuid) -> AppResult<Option<AnalysisReport>> {
        let query = format!(
            "SELECT {} FROM analysis_reports WHERE farm_id = $1 ORDER BY analyzed_at DESC LIMIT 1",
            REPORT_COLUMNS
        );
        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(farm_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(AnalysisReport::try_from).transpose()
    }

    /// Reports for a farm, newest first
    pub async fn list(&self, farm_id: Uuid, limit: i64) -> AppResult<Vec<AnalysisReport>> {
        let query = format!(
            "SELECT {} FROM analysis_reports WHERE farm_id = $1 ORDER BY analyzed_at DESC LIMIT $2",
            REPORT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ReportRow>(&query)
            .bind(farm_id)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(AnalysisReport::try_from).collect()
    }

    pub async fn get(&self, farm_id: Uuid, report_id: Uuid) -> AppResult<AnalysisReport> {
        let query = format!(
            "SELECT {} FROM analysis_reports WHERE id = $1 AND farm_id = $2",
            REPORT_COLUMNS
        );
        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(report_id)
            .bind(farm_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Analysis report".to_string()))?;

        row.try_into()
    }
}
