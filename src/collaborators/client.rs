use std::time::Duration;

use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::{debug, warn};

use crate::tools::{UpstreamError, UpstreamErrorKind};

/// HTTP client shared by every collaborator.
///
/// Sends JSON, reads the body as text and decodes it leniently: a 2xx body
/// that is not JSON comes back as a JSON string, an empty one as `null`.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("property-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, timeout })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub async fn post_json(&self, url: &str, body: &Value) -> Result<Value, UpstreamError> {
        debug!(url, "POST");
        self.send(self.http.post(url).json(body)).await
    }

    pub async fn put_json(&self, url: &str, body: &Value) -> Result<Value, UpstreamError> {
        debug!(url, "PUT");
        self.send(self.http.put(url).json(body)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, UpstreamError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            warn!("Collaborator answered HTTP {}", status);
            return Err(UpstreamError::status(status.as_u16(), text));
        }
        Ok(decode_body(text))
    }

    fn transport_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            return UpstreamError::timeout(self.timeout);
        }
        let kind = if err.is_decode() || err.is_body() {
            UpstreamErrorKind::Decode
        } else {
            UpstreamErrorKind::Network
        };
        warn!("Collaborator call failed: {}", err);
        UpstreamError::new(kind, err.to_string())
    }
}

fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(r#"{"ok": true}"#.to_string()), json!({"ok": true}));
        assert_eq!(decode_body("Property updated".to_string()), json!("Property updated"));
        assert_eq!(decode_body("  ".to_string()), Value::Null);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = UpstreamClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .post_json(&format!("http://{}/get_properties", addr), &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, UpstreamErrorKind::Network);
        assert!(err.status.is_none());
    }
}
