//! Farm handlers

use axum::{extract::State, Json};
use shared::Farm;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::farm::FarmDashboard;
use crate::services::FarmService;
use crate::AppState;

/// The caller's farm, created on first access
pub async fn get_farm(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Farm>> {
    let service = FarmService::new(state.db);
    let farm = service.get_or_create(current_user.0.user_id).await?;
    Ok(Json(farm))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<FarmDashboard>> {
    let service = FarmService::new(state.db);
    let dashboard = service.dashboard(current_user.0.user_id).await?;
    Ok(Json(dashboard))
}
