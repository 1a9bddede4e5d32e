//! Scan upload and pest detection handlers

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{BatchReport, Detection, InfestationLevel, MediaType, ScanType};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::{FarmService, PgScanRepository, ScanPipeline, UploadedFile};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectPestRequest {
    pub image_url: String,
    #[serde(default)]
    pub scan_type: ScanType,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectPestResponse {
    pub report_id: Uuid,
    pub detections: Vec<Detection>,
    pub detections_count: u32,
    pub infestation_level: InfestationLevel,
    pub confidence_score: f64,
    pub pest_types: Vec<String>,
    pub media_type: MediaType,
    pub analyzed_media: Option<String>,
}

fn scan_pipeline(state: &AppState) -> ScanPipeline {
    ScanPipeline::new(
        state.storage.clone(),
        state.detector.clone(),
        Arc::new(PgScanRepository::new(state.db.clone())),
    )
}

/// Run detection for media already in the scan bucket
pub async fn detect_pest(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<DetectPestRequest>,
) -> AppResult<Json<DetectPestResponse>> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;

    let outcome = scan_pipeline(&state)
        .analyze(farm.id, &body.image_url, body.scan_type)
        .await?;

    Ok(Json(DetectPestResponse {
        report_id: outcome.report.id,
        detections: outcome.detection.detections,
        detections_count: outcome.detection.detections_count,
        infestation_level: outcome.report.infestation_level,
        confidence_score: outcome.report.confidence_score,
        pest_types: outcome.report.pest_types,
        media_type: outcome.report.media_type,
        analyzed_media: outcome.report.analyzed_media,
    }))
}

/// Upload one or more `file` parts and analyze them in order.
///
/// Responds 200 when every item completed and 207 otherwise; the body lists
/// each item's outcome.
pub async fn upload_scans(
    State(state): State<AppState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<BatchReport>)> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;

    let mut files = Vec::new();
    let mut scan_type = ScanType::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(e.body_text()))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::ValidationError(e.body_text()))?;
                files.push(UploadedFile {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            Some("scan_type") => {
                let label = field
                    .text()
                    .await
                    .map_err(|e| AppError::ValidationError(e.body_text()))?;
                scan_type = label.trim().parse().map_err(AppError::ValidationError)?;
            }
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(AppError::ValidationError("No file selected".to_string()));
    }

    tracing::info!(farm_id = %farm.id, files = files.len(), %scan_type, "Processing scan batch");

    let report = scan_pipeline(&state)
        .process_batch(farm.id, files, scan_type, state.config.scan.batch_policy)
        .await;

    let status = if report.completed() == report.outcomes.len() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };

    Ok((status, Json(report)))
}
