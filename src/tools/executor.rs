// Tool execution seam between the dispatcher and the collaborators

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Arguments handed to an executor, keyed by parameter name.
pub type JsonObject = serde_json::Map<String, Value>;

/// A bound collaborator capability.
///
/// The dispatcher only calls `execute` with arguments that already passed
/// schema validation, so implementations may index required parameters
/// directly through the `arg_*` helpers.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, args: &JsonObject) -> Result<Value, UpstreamError>;
}

/// Why a collaborator call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// Connection refused, DNS failure, reset, ...
    Network,
    /// The call exceeded its time budget.
    Timeout,
    /// The collaborator answered with a non-2xx status.
    Status,
    /// The response body could not be read.
    Decode,
    /// The collaborator has no credentials or endpoint configured.
    NotConfigured,
}

impl UpstreamErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Status => "status",
            Self::Decode => "decode",
            Self::NotConfigured => "not_configured",
        }
    }
}

/// Failure reported by a collaborator call.
#[derive(Debug, Clone)]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// Non-2xx response, carrying the upstream status and body text.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: UpstreamErrorKind::Status,
            status: Some(status),
            message: body.into(),
        }
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        Self::new(
            UpstreamErrorKind::Timeout,
            format!("collaborator did not answer within {}ms", after.as_millis()),
        )
    }

    pub fn not_configured(what: impl fmt::Display) -> Self {
        Self::new(
            UpstreamErrorKind::NotConfigured,
            format!("{} is not configured", what),
        )
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "upstream {} error (HTTP {}): {}",
                self.kind.as_str(),
                status,
                self.message
            ),
            None => write!(f, "upstream {} error: {}", self.kind.as_str(), self.message),
        }
    }
}

impl std::error::Error for UpstreamError {}

/// Fetch a string argument.
pub fn arg_str<'a>(args: &'a JsonObject, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

/// Fetch an integer argument.
pub fn arg_i64(args: &JsonObject, name: &str) -> Option<i64> {
    args.get(name).and_then(Value::as_i64)
}

/// Fetch a numeric argument as a float.
pub fn arg_f64(args: &JsonObject, name: &str) -> Option<f64> {
    args.get(name).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upstream_error_display() {
        let err = UpstreamError::status(502, "bad gateway");
        assert_eq!(err.to_string(), "upstream status error (HTTP 502): bad gateway");

        let err = UpstreamError::not_configured("trello");
        assert_eq!(err.kind, UpstreamErrorKind::NotConfigured);
        assert_eq!(err.to_string(), "upstream not_configured error: trello is not configured");
    }

    #[test]
    fn test_timeout_message_mentions_budget() {
        let err = UpstreamError::timeout(std::time::Duration::from_millis(250));
        assert_eq!(err.kind, UpstreamErrorKind::Timeout);
        assert!(err.message.contains("250ms"));
    }

    #[test]
    fn test_arg_helpers() {
        let args = json!({"id": 7, "rent_price": 1200.5, "reason": "renewal"});
        let args = args.as_object().unwrap();

        assert_eq!(arg_i64(args, "id"), Some(7));
        assert_eq!(arg_f64(args, "rent_price"), Some(1200.5));
        assert_eq!(arg_f64(args, "id"), Some(7.0));
        assert_eq!(arg_str(args, "reason"), Some("renewal"));
        assert_eq!(arg_str(args, "missing"), None);
    }
}
