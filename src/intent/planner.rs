//! Language-model planner.
//!
//! Sends the tool catalogue and the query to an OpenAI-compatible
//! chat-completions endpoint and reads back a JSON plan of the form
//! `{"tasks": [{"action": "<tool>", "params": {...}}]}`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{IntentRecognizer, Invocation};
use crate::config::PlannerConfig;
use crate::error::{AgentError, AgentResult};
use crate::tools::{JsonObject, ToolRegistry};

#[derive(Debug, Deserialize)]
struct Plan {
    #[serde(default)]
    tasks: Vec<PlanTask>,
}

#[derive(Debug, Deserialize)]
struct PlanTask {
    action: String,
    #[serde(default)]
    params: Value,
}

pub struct LlmPlanner {
    http: reqwest::Client,
    config: PlannerConfig,
}

impl LlmPlanner {
    pub fn new(http: reqwest::Client, config: PlannerConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl IntentRecognizer for LlmPlanner {
    fn name(&self) -> &'static str {
        "planner"
    }

    async fn recognize(&self, query: &str, registry: &ToolRegistry) -> AgentResult<Vec<Invocation>> {
        let body = json!({
            "model": self.config.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": planner_prompt(registry)},
                {"role": "user", "content": query},
            ],
        });

        let mut request = self.http.post(self.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::Planning(format!("planner request failed: {}", e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AgentError::Planning(format!("planner response unreadable: {}", e)))?;
        if !status.is_success() {
            warn!("Planner returned HTTP {}", status);
            return Err(AgentError::Planning(format!(
                "planner returned HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| AgentError::Planning(format!("planner response is not JSON: {}", e)))?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Planning("planner response has no message content".to_string()))?;

        debug!(plan = content, "Planner produced plan");
        parse_plan(content, registry)
    }
}

/// System prompt describing the available tools and the plan format.
pub fn planner_prompt(registry: &ToolRegistry) -> String {
    let mut prompt = format!("You can call {} tools:\n", registry.len());
    for spec in registry.list() {
        prompt.push_str(&format!("  - {}: {}\n", spec.signature(), spec.description));
    }
    prompt.push_str(
        "\nRead the user's request and answer with a JSON plan, one task per request \
         in the order the requests appear:\n\
         {\"tasks\": [{\"action\": \"<tool name>\", \"params\": {<arguments>}}]}\n\
         Dates use YYYY-MM-DD. Answer with the JSON only.",
    );
    prompt
}

/// Turn a planner reply into invocations.
///
/// Tolerates a surrounding Markdown code fence. A string `params` is taken
/// as the `query` argument. Tasks carrying a `mode` directive their tool does
/// not declare are batching instructions and are skipped.
pub fn parse_plan(text: &str, registry: &ToolRegistry) -> AgentResult<Vec<Invocation>> {
    let body = strip_code_fence(text);
    let plan: Plan = serde_json::from_str(body)
        .map_err(|e| AgentError::Planning(format!("plan is not valid JSON: {}", e)))?;

    let mut invocations = Vec::with_capacity(plan.tasks.len());
    for task in plan.tasks {
        let spec = registry.lookup(&task.action);

        let args: JsonObject = match task.params {
            Value::Object(map) => map,
            Value::String(text) if spec.is_some_and(|t| t.find_param("query").is_some()) => {
                let mut map = JsonObject::new();
                map.insert("query".to_string(), Value::String(text));
                map
            }
            _ => JsonObject::new(),
        };

        if args.contains_key("mode") && spec.is_some_and(|t| t.find_param("mode").is_none()) {
            debug!(action = %task.action, "Skipping batching directive");
            continue;
        }

        let (tool, missing) = match spec {
            Some(spec) => (spec.name.clone(), spec.missing_required(&args)),
            None => (task.action.into(), Vec::new()),
        };
        invocations.push(Invocation {
            tool,
            args,
            missing,
        });
    }
    Ok(invocations)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
