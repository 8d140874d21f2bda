//! Concurrent execution of invocations.
//!
//! Every invocation runs as its own task. Outcomes are collected by index, so
//! the output order always matches the input order whatever the completion
//! order was. Failures of a single invocation are data; only a task that
//! panics or is cancelled fails the whole run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::AgentResult;
use crate::intent::Invocation;
use crate::tools::{ToolRegistry, UpstreamError, ValidationError};
use crate::types::{Category, ToolName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Validation,
    Upstream,
}

/// Why one invocation produced no data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    /// Machine-readable code, e.g. `missing_parameter` or `timeout`.
    pub reason: &'static str,
    pub message: String,
    pub tool: ToolName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// HTTP status returned by the collaborator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Failure {
    pub fn validation(err: &ValidationError) -> Self {
        let param = match err {
            ValidationError::UnknownTool { .. } => None,
            ValidationError::MissingParameter { param, .. }
            | ValidationError::MalformedParameter { param, .. } => Some(param.clone()),
        };
        Self {
            kind: FailureKind::Validation,
            reason: err.reason(),
            message: err.to_string(),
            tool: err.tool().clone(),
            param,
            status: None,
        }
    }

    pub fn upstream(tool: ToolName, err: &UpstreamError) -> Self {
        Self {
            kind: FailureKind::Upstream,
            reason: err.kind.as_str(),
            message: err.message.clone(),
            tool,
            param: None,
            status: err.status,
        }
    }
}

/// Result of one invocation, tagged with the category it is reported under.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub tool: ToolName,
    pub category: Category,
    pub result: Result<Value, Failure>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Execute all invocations concurrently; one outcome per invocation, in
    /// input order.
    pub async fn run(&self, invocations: Vec<Invocation>) -> AgentResult<Vec<Outcome>> {
        let mut handles = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            let registry = self.registry.clone();
            let timeout = self.timeout;
            handles.push(tokio::spawn(async move {
                execute(&registry, invocation, timeout).await
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        let mut pending = handles.into_iter();
        while let Some(handle) = pending.next() {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    for rest in pending.by_ref() {
                        rest.abort();
                    }
                    return Err(err.into());
                }
            }
        }
        Ok(outcomes)
    }
}

async fn execute(registry: &ToolRegistry, invocation: Invocation, budget: Duration) -> Outcome {
    let Some(spec) = registry.lookup(invocation.tool.as_str()) else {
        let err = ValidationError::UnknownTool {
            tool: invocation.tool.clone(),
        };
        warn!("{}", err);
        return Outcome {
            tool: invocation.tool,
            category: Category::errors(),
            result: Err(Failure::validation(&err)),
        };
    };

    let args = match spec.validate(&invocation.args, &invocation.missing) {
        Ok(args) => args,
        Err(err) => {
            info!(tool = %spec.name, reason = err.reason(), "Invocation rejected: {}", err);
            return Outcome {
                tool: spec.name.clone(),
                category: spec.category.clone(),
                result: Err(Failure::validation(&err)),
            };
        }
    };

    info!(tool = %spec.name, "Invoking tool");
    let started = Instant::now();
    let result = match tokio::time::timeout(budget, spec.executor.execute(&args)).await {
        Ok(result) => result,
        Err(_) => Err(UpstreamError::timeout(budget)),
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let result = match result {
        Ok(data) => {
            debug!(tool = %spec.name, elapsed_ms, "Tool succeeded");
            Ok(data)
        }
        Err(err) => {
            warn!(tool = %spec.name, elapsed_ms, "Tool failed: {}", err);
            Err(Failure::upstream(spec.name.clone(), &err))
        }
    };

    Outcome {
        tool: spec.name.clone(),
        category: spec.category.clone(),
        result,
    }
}
