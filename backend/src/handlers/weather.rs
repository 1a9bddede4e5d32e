//! Weather handlers

use axum::{extract::State, Json};
use shared::WeatherSnapshot;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

/// Current conditions and daily forecast at the configured location
pub async fn get_weather(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<WeatherSnapshot>> {
    let snapshot = state.weather.current().await?;
    Ok(Json(snapshot))
}
