// HTTP response utilities for the JSON envelopes mobile clients expect
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

/// Failure body: `{error, message, statusCode, data: []}`.
///
/// `data` is always an empty list so clients can treat a failed fetch like an
/// empty one and fall back to cached data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    pub data: Vec<Value>,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code: status.as_u16(),
            data: Vec::new(),
        }
    }
}

pub fn error_response(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Response {
    (status, Json(ErrorEnvelope::new(status, error, message))).into_response()
}

pub fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}
