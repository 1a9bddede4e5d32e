//! Route definitions for the CropGuard API

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    handlers,
    middleware::{auth_middleware, require_farmer},
    AppState,
};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Farmer-only routes
        .nest("/farm", farm_routes(&state))
        .nest("/sensors", sensor_routes(&state))
        .nest("/scans", scan_routes(&state))
        .nest("/detect-pest", detect_routes(&state))
        .nest("/reports", report_routes(&state))
        .nest("/alerts", alert_routes(&state))
        .nest("/advisory", advisory_routes(&state))
        // Routes open to every signed-in role
        .nest("/market", market_routes(&state))
        .nest("/weather", weather_routes(&state))
}

/// Require a valid bearer token
fn authenticated(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Require a valid bearer token belonging to a farmer
fn farmer_only(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    authenticated(router.route_layer(middleware::from_fn(require_farmer)), state)
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
}

fn farm_routes(state: &AppState) -> Router<AppState> {
    farmer_only(
        Router::new()
            .route("/", get(handlers::get_farm))
            .route("/dashboard", get(handlers::get_dashboard)),
        state,
    )
}

fn sensor_routes(state: &AppState) -> Router<AppState> {
    farmer_only(
        Router::new()
            .route("/latest", get(handlers::get_latest_reading))
            .route("/history", get(handlers::get_reading_history))
            .route("/stream", get(handlers::stream_readings)),
        state,
    )
    // Devices post readings without a user session
    .route("/ingest", post(handlers::ingest_reading))
}

fn scan_routes(state: &AppState) -> Router<AppState> {
    farmer_only(
        Router::new().route("/", post(handlers::upload_scans)),
        state,
    )
    .layer(DefaultBodyLimit::max(state.config.scan.max_upload_bytes))
}

fn detect_routes(state: &AppState) -> Router<AppState> {
    farmer_only(Router::new().route("/", post(handlers::detect_pest)), state)
}

fn report_routes(state: &AppState) -> Router<AppState> {
    farmer_only(
        Router::new()
            .route("/", get(handlers::list_reports))
            .route("/:report_id", get(handlers::get_report)),
        state,
    )
}

fn alert_routes(state: &AppState) -> Router<AppState> {
    farmer_only(
        Router::new()
            .route("/", get(handlers::list_alerts))
            .route("/unread-count", get(handlers::get_unread_count))
            .route("/:alert_id/read", post(handlers::mark_alert_read)),
        state,
    )
}

fn advisory_routes(state: &AppState) -> Router<AppState> {
    farmer_only(
        Router::new()
            .route("/", get(handlers::get_advisory))
            .route("/status", get(handlers::get_advisory_status)),
        state,
    )
}

fn market_routes(state: &AppState) -> Router<AppState> {
    authenticated(
        Router::new()
            .route("/submissions", post(handlers::submit_price))
            .route("/trends", get(handlers::get_price_trend)),
        state,
    )
}

fn weather_routes(state: &AppState) -> Router<AppState> {
    authenticated(Router::new().route("/", get(handlers::get_weather)), state)
}
