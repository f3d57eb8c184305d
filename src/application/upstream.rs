// Upstream client - transport seam plus retry policy
use crate::application::error::UpstreamError;
use crate::application::retry::{Attempted, RetryPolicy, call_with_policy};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A single attempt against an upstream government API.
///
/// Implementations enforce the per-attempt timeout; retries are layered on
/// top by [`UpstreamClient`].
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// POST a JSON body to `path` relative to the upstream base URL
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, UpstreamError>;

    /// GET `path` (which may carry a query string) relative to the base URL
    async fn get_json(&self, path: &str) -> Result<Value, UpstreamError>;

    /// Base URL, reported by the health endpoint
    fn base_url(&self) -> &str;
}

#[derive(Clone)]
pub struct UpstreamClient {
    transport: Arc<dyn UpstreamTransport>,
    policy: RetryPolicy,
}

impl UpstreamClient {
    pub fn new(transport: Arc<dyn UpstreamTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub async fn post(&self, path: &str, payload: &Value) -> Result<Attempted<Value>, UpstreamError> {
        tracing::debug!(path, "forwarding POST upstream");
        call_with_policy(&self.policy, |_| self.transport.post_json(path, payload)).await
    }

    pub async fn get(&self, path: &str) -> Result<Attempted<Value>, UpstreamError> {
        tracing::debug!(path, "forwarding GET upstream");
        call_with_policy(&self.policy, |_| self.transport.get_json(path)).await
    }
}
