//! NewType wrappers for strong typing throughout the agent.
//!
//! These types prevent accidental mixing of semantically different strings
//! (e.g., passing a response category where a tool name is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    /// Tool name as registered in the tool registry (e.g., "get_properties").
    ///
    /// This is the identifier users write in explicit hints
    /// (`update_property_price: ...`) and that planners emit as `action`.
    ToolName
);

newtype_string!(
    /// Response grouping key (e.g., "properties", "updates").
    ///
    /// Every tool declares the category its outcomes are aggregated under.
    Category
);

impl Category {
    /// Category used for invocations whose tool is not in the registry.
    pub fn errors() -> Self {
        Self::new("errors")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_name_creation() {
        let name = ToolName::new("get_properties");
        assert_eq!(name.as_str(), "get_properties");
        assert_eq!(name.to_string(), "get_properties");
    }

    #[test]
    fn test_tool_name_from_string() {
        let name: ToolName = "get_chart".into();
        assert_eq!(name.as_str(), "get_chart");

        let name: ToolName = String::from("create_property").into();
        assert_eq!(name.into_inner(), "create_property");
    }

    #[test]
    fn test_category_serde() {
        let category = Category::new("updates");
        let json = serde_json::to_string(&category).unwrap();
        assert_eq!(json, "\"updates\"");

        let parsed: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, category);
    }

    #[test]
    fn test_errors_category() {
        assert_eq!(Category::errors().as_str(), "errors");
    }

    #[test]
    fn test_borrow_lookup() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(ToolName::new("get_chart"), 1);
        assert_eq!(map.get("get_chart"), Some(&1));
    }
}
