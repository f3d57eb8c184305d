// Error taxonomy for upstream calls and service operations
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream responded with HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error("upstream returned an unreadable payload: {0}")]
    Decode(String),

    #[error("upstream unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },
}

impl UpstreamError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpstreamError::Timeout(_) | UpstreamError::Http { .. } | UpstreamError::Transport(_)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
