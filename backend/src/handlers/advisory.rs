//! Advisory handlers

use axum::{extract::State, Json};
use shared::AdvisoryStatus;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::advisory::Advisory;
use crate::services::{AdvisoryService, FarmService};
use crate::AppState;

/// Recommendations for the caller's farm, most urgent first
pub async fn get_advisory(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Advisory>> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;
    let service = AdvisoryService::new(state.db, state.weather, &state.config);
    Ok(Json(service.advisory(farm.id).await?))
}

/// Urgent recommendation count for the navigation badge
pub async fn get_advisory_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<AdvisoryStatus>> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;
    let service = AdvisoryService::new(state.db, state.weather, &state.config);
    Ok(Json(service.status(farm.id).await?))
}
