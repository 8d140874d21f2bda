// Core modules
mod config;
mod error;
mod types;

// Query pipeline
pub mod aggregate;
pub mod collaborators;
pub mod dispatch;
pub mod intent;
mod orchestrator;
pub mod tools;

pub mod api;


// Re-export key types
pub use aggregate::{AggregatedResponse, Entry};
pub use config::{AgentConfig, PlannerConfig, TrelloConfig};
pub use dispatch::{Dispatcher, Failure, FailureKind, Outcome};
pub use error::{AgentError, AgentResult};
pub use intent::{IntentParser, IntentRecognizer, Invocation, RuleRecognizer};
pub use orchestrator::Orchestrator;
pub use tools::{ToolRegistry, ToolSpec};
pub use types::{Category, ToolName};
