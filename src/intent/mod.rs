//! Intent parsing: from a free-text query to an ordered list of invocations.
//!
//! Recognition is pluggable through [`IntentRecognizer`]. Whatever the
//! strategy, invocations come out in the order their triggering text appears
//! in the query, and a query with several intents yields several invocations.

mod extract;
mod planner;
mod rules;
mod text;

pub use planner::{LlmPlanner, parse_plan, planner_prompt};
pub use rules::RuleRecognizer;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AgentResult;
use crate::tools::{JsonObject, ToolRegistry};
use crate::types::ToolName;

/// One resolved (tool, arguments) pair extracted from a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub tool: ToolName,
    pub args: JsonObject,
    /// Required parameters the recognizer could not fill.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl Invocation {
    pub fn new(tool: impl Into<ToolName>, args: JsonObject) -> Self {
        Self {
            tool: tool.into(),
            args,
            missing: Vec::new(),
        }
    }
}

/// Strategy that maps query text to invocations.
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    async fn recognize(&self, query: &str, registry: &ToolRegistry) -> AgentResult<Vec<Invocation>>;
}

/// Front door of intent recognition.
#[derive(Clone)]
pub struct IntentParser {
    recognizer: Arc<dyn IntentRecognizer>,
}

impl IntentParser {
    pub fn new(recognizer: Arc<dyn IntentRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Parser backed by the keyword/hint rules.
    pub fn rules() -> Self {
        Self::new(Arc::new(RuleRecognizer::new()))
    }

    pub fn recognizer_name(&self) -> &'static str {
        self.recognizer.name()
    }

    /// Map `query` to invocations. A blank query yields none.
    pub async fn parse(&self, query: &str, registry: &ToolRegistry) -> AgentResult<Vec<Invocation>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let invocations = self.recognizer.recognize(query, registry).await?;
        info!(
            recognizer = self.recognizer.name(),
            count = invocations.len(),
            "Parsed query into invocations"
        );
        Ok(invocations)
    }
}

impl Default for IntentParser {
    fn default() -> Self {
        Self::rules()
    }
}
