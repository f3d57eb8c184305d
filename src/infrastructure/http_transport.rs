// reqwest-backed transport for the India-WRIS and CGWB APIs
use crate::application::error::UpstreamError;
use crate::application::upstream::UpstreamTransport;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, header};
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, UpstreamError> {
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        interpret_response(status, &body)
    }

    fn classify(&self, error: reqwest::Error) -> UpstreamError {
        if error.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, UpstreamError> {
        self.execute(self.client.post(self.url(path)).json(body)).await
    }

    async fn get_json(&self, path: &str) -> Result<Value, UpstreamError> {
        self.execute(self.client.get(self.url(path))).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Turn an upstream status and body into a payload or an error.
///
/// India-WRIS sometimes answers with a 5xx status while still returning
/// usable records, so any body carrying a non-empty `data` array is accepted
/// regardless of status.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<Value, UpstreamError> {
    let parsed = serde_json::from_str::<Value>(body);

    if status.is_success() {
        return parsed.map_err(|e| UpstreamError::Decode(e.to_string()));
    }

    if let Ok(payload) = parsed {
        if has_records(&payload) {
            tracing::warn!(status = status.as_u16(), "accepting non-2xx upstream response that carries data");
            return Ok(payload);
        }
    }

    Err(UpstreamError::Http {
        status: status.as_u16(),
        message: truncate(body.trim(), MAX_ERROR_BODY),
    })
}

fn has_records(payload: &Value) -> bool {
    payload
        .get("data")
        .and_then(Value::as_array)
        .is_some_and(|records| !records.is_empty())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_body_is_parsed() {
        let value = interpret_response(StatusCode::OK, r#"{"statusCode":200,"data":[]}"#).unwrap();
        assert_eq!(value, json!({ "statusCode": 200, "data": [] }));
    }

    #[test]
    fn test_success_with_unreadable_body_is_decode_error() {
        let err = interpret_response(StatusCode::OK, "<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn test_server_error_with_records_is_accepted() {
        // Deliberate leniency: the upstream mislabels successful responses.
        let body = r#"{"statusCode":500,"message":"partial","data":[{"dataValue":4.2}]}"#;
        let value = interpret_response(StatusCode::INTERNAL_SERVER_ERROR, body).unwrap();
        assert_eq!(value["data"][0]["dataValue"], 4.2);
    }

    #[test]
    fn test_server_error_without_records_is_http_error() {
        let err = interpret_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"statusCode":500,"data":[]}"#)
            .unwrap_err();
        match err {
            UpstreamError::Http { status, .. } => assert_eq!(status, 500),
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_body_is_truncated() {
        let body = "x".repeat(1000);
        match interpret_response(StatusCode::BAD_GATEWAY, &body).unwrap_err() {
            UpstreamError::Http { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message.len(), MAX_ERROR_BODY + 3);
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn test_url_joins_without_double_slashes() {
        let transport = HttpTransport::new("https://indiawris.gov.in/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            transport.url("/masterState/StateList"),
            "https://indiawris.gov.in/masterState/StateList"
        );
        assert_eq!(transport.base_url(), "https://indiawris.gov.in");
    }
}
