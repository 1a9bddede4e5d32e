//! Sensor telemetry handlers

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use shared::{Limit, SensorIngestPayload, SensorRecord};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{FarmService, SensorService};
use crate::AppState;

const DEFAULT_HISTORY: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub data: SensorRecord,
}

pub async fn get_latest_reading(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Option<SensorRecord>>> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;
    let reading = SensorService::new(state.db).latest(farm.id).await?;
    Ok(Json(reading))
}

/// Recent readings, oldest first
pub async fn get_reading_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<SensorRecord>>> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;
    let limit = Limit::clamp(query.limit, DEFAULT_HISTORY);
    let history = SensorService::new(state.db).history(farm.id, limit).await?;
    Ok(Json(history))
}

impl IngestResponse {
    fn accepted(record: SensorRecord) -> Json<Self> {
        Json(Self {
            success: true,
            data: record,
        })
    }
}

/// Device-facing ingestion endpoint. Answers 200 with `{success, data}`.
pub async fn ingest_reading(
    State(state): State<AppState>,
    Json(payload): Json<SensorIngestPayload>,
) -> AppResult<Json<IngestResponse>> {
    let record = SensorService::new(state.db).ingest(&payload).await?;
    let receivers = state.sensor_feed.publish(record.clone());
    tracing::debug!(farm_id = %record.farm_id, receivers, "Sensor reading ingested");

    Ok(IngestResponse::accepted(record))
}

/// Live readings for the caller's farm as server-sent events
pub async fn stream_readings(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let farm = FarmService::new(state.db.clone())
        .require_farm(current_user.0.user_id)
        .await?;
    let subscription = state.sensor_feed.subscribe(farm.id);
    tracing::debug!(
        farm_id = %farm.id,
        subscribers = state.sensor_feed.subscriber_count(),
        "Sensor stream opened"
    );

    let events = stream::unfold(subscription, |mut subscription| async move {
        let record = subscription.recv().await?;
        let event = match Event::default().event("reading").json_data(&record) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to encode sensor event");
                Event::default().event("error").data("encoding failed")
            }
        };
        Some((Ok(event), subscription))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
