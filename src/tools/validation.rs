//! Errors raised when an invocation does not satisfy its tool's schema.
//!
//! These never reach the collaborator: the dispatcher turns them into
//! failure outcomes before any call is made.

use std::fmt;

use serde_json::Value;

use super::registry::ParamType;
use crate::types::ToolName;

#[derive(Debug, Clone)]
pub enum ValidationError {
    /// The tool is not in the registry.
    UnknownTool { tool: ToolName },

    /// A required parameter was not supplied.
    MissingParameter { tool: ToolName, param: String },

    /// A parameter was supplied with a value of the wrong type.
    MalformedParameter {
        tool: ToolName,
        param: String,
        expected: ParamType,
        found: Value,
    },
}

impl ValidationError {
    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownTool { .. } => "unknown_tool",
            Self::MissingParameter { .. } => "missing_parameter",
            Self::MalformedParameter { .. } => "malformed_parameter",
        }
    }

    pub fn tool(&self) -> &ToolName {
        match self {
            Self::UnknownTool { tool }
            | Self::MissingParameter { tool, .. }
            | Self::MalformedParameter { tool, .. } => tool,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool { tool } => write!(f, "Unknown tool: {}", tool),
            Self::MissingParameter { tool, param } => {
                write!(f, "Missing required parameter `{}` for {}", param, tool)
            }
            Self::MalformedParameter {
                tool,
                param,
                expected,
                found,
            } => write!(
                f,
                "Parameter `{}` for {} must be {}, got {}",
                param, tool, expected, found
            ),
        }
    }
}

impl std::error::Error for ValidationError {}
