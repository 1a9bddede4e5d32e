//! Analysis report handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::{AnalysisReport, Limit};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{FarmService, ReportService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportListQuery {
    pub limit: Option<i64>,
}

/// Analysis history, newest first
pub async fn list_reports(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ReportListQuery>,
) -> AppResult<Json<Vec<AnalysisReport>>> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;
    let reports = ReportService::new(state.db)
        .list(farm.id, Limit::clamp(query.limit, 50))
        .await?;
    Ok(Json(reports))
}

pub async fn get_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(report_id): Path<Uuid>,
) -> AppResult<Json<AnalysisReport>> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;
    let report = ReportService::new(state.db).get(farm.id, report_id).await?;
    Ok(Json(report))
}
