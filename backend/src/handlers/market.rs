//! Market price handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{CropTrend, MarketSubmission};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::market::SubmitPriceInput;
use crate::services::MarketService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub crop: String,
}

pub async fn submit_price(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SubmitPriceInput>,
) -> AppResult<(StatusCode, Json<MarketSubmission>)> {
    let service = MarketService::new(state.db, &state.config.market);
    let submission = service.submit(input, current_user.0.user_id).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// Daily average price for one crop
pub async fn get_price_trend(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<TrendQuery>,
) -> AppResult<Json<CropTrend>> {
    let service = MarketService::new(state.db, &state.config.market);
    let trend = service.trend(query.crop.trim()).await?;
    Ok(Json(trend))
}
