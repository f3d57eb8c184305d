// Shared fakes for unit tests: a scripted upstream and a manual clock
use crate::application::clock::Clock;
use crate::application::error::UpstreamError;
use crate::application::upstream::UpstreamTransport;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// A fixed "now" used across tests: 2024-05-01 13:00:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(now) })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    /// `None` for GET requests
    pub body: Option<Value>,
    pub at: tokio::time::Instant,
}

type Handler = dyn Fn(&str, &Value) -> Result<Value, UpstreamError> + Send + Sync;

/// Upstream whose responses come from a closure, recording every call.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&str, &Value) -> Result<Value, UpstreamError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Fails the first `failures` calls with a 503, then always returns `response`.
    pub fn failing_first(failures: u32, response: Value) -> Arc<Self> {
        let seen = AtomicU32::new(0);
        Self::new(move |_, _| {
            if seen.fetch_add(1, Ordering::SeqCst) < failures {
                Err(UpstreamError::Http {
                    status: 503,
                    message: "service unavailable".into(),
                })
            } else {
                Ok(response.clone())
            }
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, path: &str, body: Option<&Value>) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_string(),
            body: body.cloned(),
            at: tokio::time::Instant::now(),
        });
        (self.handler)(path, body.unwrap_or(&Value::Null))
    }
}

#[async_trait]
impl UpstreamTransport for ScriptedTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, UpstreamError> {
        self.record(path, Some(body))
    }

    async fn get_json(&self, path: &str) -> Result<Value, UpstreamError> {
        self.record(path, None)
    }

    fn base_url(&self) -> &str {
        "http://upstream.test"
    }
}

/// An India-WRIS time-series payload with `count` readings at a constant
/// `depth`, one every 6 hours, the newest at `fixed_now()`.
pub fn time_series_payload(count: usize, depth: f64) -> Value {
    let records: Vec<Value> = (0..count)
        .map(|i| {
            let time = fixed_now() - Duration::hours(6 * i as i64);
            serde_json::json!({
                "dataTime": time.to_rfc3339(),
                "dataValue": depth,
                "unit": "m",
                "datatypeDescription": "Ground Water Level",
                "datatypeCode": "GWL"
            })
        })
        .collect();
    serde_json::json!({ "statusCode": 200, "data": records })
}
