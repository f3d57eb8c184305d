// Handler error type rendered as the failure envelope
use crate::application::error::{ServiceError, UpstreamError};
use crate::infrastructure::http_response::error_response;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid request",
            message: msg.into(),
        }
    }

    pub fn upstream(error: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error,
            message: msg.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = self.error, message = %self.message, "request failed");
        }
        error_response(self.status, self.error, self.message)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::InvalidRequest(msg) => AppError::bad_request(msg),
            ServiceError::Upstream(upstream) => {
                let label = match &upstream {
                    UpstreamError::Timeout(_) => "Upstream timeout",
                    UpstreamError::Http { .. } => "Upstream HTTP error",
                    UpstreamError::Transport(_) => "Upstream connection error",
                    UpstreamError::Decode(_) => "Upstream payload error",
                    UpstreamError::Unavailable { .. } => "Upstream unavailable",
                };
                AppError::upstream(label, upstream.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}
