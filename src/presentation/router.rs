// Route table for the HTTP surface
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    bulk_water_level, health_check, proxy_cgwb, proxy_india_wris, station_water_level,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/indiawris/:endpoint", post(proxy_india_wris))
        .route("/api/station/water-level", post(station_water_level))
        .route("/api/stations/bulk-water-level", post(bulk_water_level))
        .route("/api/cgwb/*path", get(proxy_cgwb))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
