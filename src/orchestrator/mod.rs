//! Core orchestrator: query in, aggregated response out.
//!
//! Wires the three stages together. The intent parser turns the query into
//! invocations, the dispatcher executes them concurrently, and the
//! aggregator groups the outcomes by category.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::aggregate::AggregatedResponse;
use crate::collaborators::{Collaborators, UpstreamClient};
use crate::config::AgentConfig;
use crate::dispatch::Dispatcher;
use crate::error::AgentResult;
use crate::intent::{IntentParser, Invocation, LlmPlanner};
use crate::tools::{ToolRegistry, builtin_registry};

pub struct Orchestrator {
    registry: Arc<ToolRegistry>,
    parser: IntentParser,
    dispatcher: Dispatcher,
}

impl Orchestrator {
    /// Build the registry, collaborators and parser from configuration.
    ///
    /// The language-model planner replaces the rule recognizer when it is
    /// configured with an endpoint and an API key.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let client = Arc::new(UpstreamClient::new(config.timeout())?);
        let collaborators = Collaborators::with_client(client.clone(), config);
        let registry = Arc::new(builtin_registry(&collaborators)?);

        let parser = match &config.planner {
            Some(planner) if planner.is_enabled() => {
                info!(url = %planner.url, model = %planner.model, "Using language-model planner");
                IntentParser::new(Arc::new(LlmPlanner::new(client.http().clone(), planner.clone())))
            }
            _ => IntentParser::rules(),
        };

        info!(
            tools = registry.len(),
            recognizer = parser.recognizer_name(),
            timeout_secs = config.timeout_secs,
            "Orchestrator ready"
        );
        Ok(Self::with_parts(registry, parser, config.timeout()))
    }

    pub fn with_parts(registry: Arc<ToolRegistry>, parser: IntentParser, timeout: Duration) -> Self {
        let dispatcher = Dispatcher::new(registry.clone(), timeout);
        Self {
            registry,
            parser,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn parser(&self) -> &IntentParser {
        &self.parser
    }

    /// Recognize the query's intents without executing anything.
    pub async fn plan(&self, query: &str) -> AgentResult<Vec<Invocation>> {
        self.parser.parse(query, &self.registry).await
    }

    /// Parse, dispatch and aggregate one query.
    pub async fn run(&self, query: &str) -> AgentResult<AggregatedResponse> {
        let invocations = self.plan(query).await?;
        if invocations.is_empty() {
            info!("No intent recognized");
            return Ok(AggregatedResponse::default());
        }

        let outcomes = self.dispatcher.run(invocations).await?;
        let response = AggregatedResponse::from_outcomes(outcomes);
        info!(
            categories = response.len(),
            entries = response.entry_count(),
            "Query completed"
        );
        Ok(response)
    }
}
