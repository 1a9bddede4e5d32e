//! Alert handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{Alert, Limit};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{AlertService, FarmService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AlertListQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

pub async fn list_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<AlertListQuery>,
) -> AppResult<Json<Vec<Alert>>> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;
    let alerts = AlertService::new(state.db)
        .list(farm.id, Limit::clamp(query.limit, 50))
        .await?;
    Ok(Json(alerts))
}

pub async fn get_unread_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;
    let unread = AlertService::new(state.db).unread_count(farm.id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

pub async fn mark_alert_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(alert_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;
    AlertService::new(state.db)
        .mark_as_read(farm.id, alert_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
