// HTTP request handlers
use crate::infrastructure::http_response::json_response;
use crate::presentation::app_state::AppState;
use crate::presentation::error::AppError;
use axum::{
    Json,
    body::Bytes,
    extract::{OriginalUri, Path, State, rejection::JsonRejection},
    http::{StatusCode, Uri},
    response::Response,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Mount point of the CGWB pass-through
pub const CGWB_PREFIX: &str = "/api/cgwb";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterLevelRequest {
    #[serde(default)]
    pub station_code: Option<String>,
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkWaterLevelRequest {
    #[serde(default)]
    pub station_codes: Vec<String>,
    pub days: Option<u32>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let now = state.clock.now();
    let uptime = (now - state.started_at).num_seconds().max(0);

    json_response(
        StatusCode::OK,
        json!({
            "status": "ok",
            "timestamp": now,
            "uptimeSeconds": uptime,
            "cacheStatus": state.cache.status().await,
            "upstream": {
                "indiaWris": state.proxy_service.wris_base_url(),
                "cgwb": state.proxy_service.cgwb_base_url(),
            },
        }),
    )
}

/// Forward a request body unchanged to a named India-WRIS endpoint
pub async fn proxy_india_wris(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let payload = parse_body(&body)?;
    let response = state.proxy_service.forward(&endpoint, &payload).await?;
    Ok(Json(response))
}

/// Pass a CGWB GET through, query string included
pub async fn proxy_cgwb(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Value>, AppError> {
    let response = state.proxy_service.cgwb(&cgwb_target(&uri)).await?;
    Ok(Json(response))
}

/// The request path below [`CGWB_PREFIX`] plus its query, still percent-encoded.
fn cgwb_target(uri: &Uri) -> String {
    let path = uri.path().strip_prefix(CGWB_PREFIX).unwrap_or(uri.path());
    match uri.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path.to_string(),
    }
}

/// Readings for one station plus derived analytics
pub async fn station_water_level(
    State(state): State<Arc<AppState>>,
    request: Result<Json<WaterLevelRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = request?;
    let station_code = request.station_code.unwrap_or_default();

    let result = state.station_service.water_level(&station_code, request.days).await?;

    if result.readings.is_empty() {
        return Ok(json_response(
            StatusCode::NOT_FOUND,
            json!({
                "statusCode": 404,
                "message": format!("No data found for station {}", result.station_code),
                "data": [],
                "analytics": null,
            }),
        ));
    }

    let mut body = json!({
        "statusCode": 200,
        "stationCode": result.station_code,
        "data": result.readings,
        "analytics": result.analytics,
    });
    if let Some(cached_at) = result.cached_at {
        body["cached"] = json!(true);
        body["cachedAt"] = json!(cached_at);
    }

    Ok(json_response(StatusCode::OK, body))
}

/// Readings for many stations, fetched in paced chunks
pub async fn bulk_water_level(
    State(state): State<Arc<AppState>>,
    request: Result<Json<BulkWaterLevelRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = request?;

    let bulk = state
        .station_service
        .bulk_water_level(&request.station_codes, request.days)
        .await?;

    Ok(json_response(
        StatusCode::OK,
        json!({
            "statusCode": 200,
            "results": bulk.results,
            "errors": bulk.errors,
        }),
    ))
}

/// An empty body forwards as `{}`; anything else must be JSON.
fn parse_body(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|e| AppError::bad_request(format!("request body is not valid JSON: {}", e)))
}
