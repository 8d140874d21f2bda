//! Request-level failures.
//!
//! Per-invocation problems (validation, upstream) are reported as data inside
//! the aggregated response. The errors here are the ones that abort a whole
//! request and surface as HTTP 500.

use std::fmt;

#[derive(Debug, Clone)]
pub enum AgentError {
    /// The planner could not produce a usable plan.
    Planning(String),

    /// A dispatch task panicked or was cancelled.
    Dispatch(String),

    /// Internal invariant violation.
    Internal(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planning(msg) => write!(f, "Planning error: {}", msg),
            Self::Dispatch(msg) => write!(f, "Dispatch error: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AgentError {}

/// Result type for request-level operations.
pub type AgentResult<T> = Result<T, AgentError>;

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AgentError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            Self::Dispatch(format!("invocation task panicked: {}", err))
        } else {
            Self::Dispatch(format!("invocation task was cancelled: {}", err))
        }
    }
}
