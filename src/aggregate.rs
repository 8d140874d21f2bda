//! Grouping of outcomes into the caller-facing response.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::dispatch::{Failure, Outcome};
use crate::types::Category;

/// One reported outcome.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Entry {
    Ok { data: Value },
    Error { error: Failure },
}

impl From<Result<Value, Failure>> for Entry {
    fn from(result: Result<Value, Failure>) -> Self {
        match result {
            Ok(data) => Self::Ok { data },
            Err(error) => Self::Error { error },
        }
    }
}

/// Category → entries, with categories in order of first occurrence.
///
/// Serialises as a JSON object; only categories with at least one entry are
/// present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedResponse {
    groups: Vec<(Category, Vec<Entry>)>,
}

impl AggregatedResponse {
    pub fn from_outcomes(outcomes: Vec<Outcome>) -> Self {
        let mut response = Self::default();
        for outcome in outcomes {
            response.push(outcome.category, outcome.result.into());
        }
        response
    }

    fn push(&mut self, category: Category, entry: Entry) {
        match self.groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, entries)) => entries.push(entry),
            None => self.groups.push((category, vec![entry])),
        }
    }

    pub fn get(&self, category: &str) -> Option<&[Entry]> {
        self.groups
            .iter()
            .find(|(c, _)| c.as_str() == category)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.groups.iter().map(|(c, _)| c)
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of entries across all categories.
    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(|(_, entries)| entries.len()).sum()
    }
}

impl Serialize for AggregatedResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (category, entries) in &self.groups {
            map.serialize_entry(category.as_str(), entries)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::FailureKind;
    use crate::types::ToolName;
    use serde_json::json;

    fn ok(tool: &str, category: &str, data: Value) -> Outcome {
        Outcome {
            tool: ToolName::new(tool),
            category: Category::new(category),
            result: Ok(data),
        }
    }

    fn failed(tool: &str, category: &str) -> Outcome {
        Outcome {
            tool: ToolName::new(tool),
            category: Category::new(category),
            result: Err(Failure {
                kind: FailureKind::Validation,
                reason: "missing_parameter",
                message: "Missing required parameter `id` for update_property_price".to_string(),
                tool: ToolName::new(tool),
                param: Some("id".to_string()),
                status: None,
            }),
        }
    }

    #[test]
    fn test_groups_in_first_occurrence_order() {
        let response = AggregatedResponse::from_outcomes(vec![
            ok("get_properties", "properties", json!({"result": []})),
            failed("update_property_price", "updates"),
            ok("get_properties", "properties", json!({"result": [1]})),
        ]);

        assert_eq!(response.len(), 2);
        assert_eq!(response.entry_count(), 3);
        let categories: Vec<&str> = response.categories().map(Category::as_str).collect();
        assert_eq!(categories, vec!["properties", "updates"]);
        assert_eq!(response.get("properties").unwrap().len(), 2);

        let rendered = serde_json::to_string(&response).unwrap();
        assert!(rendered.find("\"properties\"").unwrap() < rendered.find("\"updates\"").unwrap());
    }

    #[test]
    fn test_entry_shapes() {
        let response = AggregatedResponse::from_outcomes(vec![
            ok("get_chart", "chart", json!({"chart": "bar"})),
            failed("update_property_price", "updates"),
        ]);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "chart": [{"status": "ok", "data": {"chart": "bar"}}],
                "updates": [{
                    "status": "error",
                    "error": {
                        "kind": "validation",
                        "reason": "missing_parameter",
                        "message": "Missing required parameter `id` for update_property_price",
                        "tool": "update_property_price",
                        "param": "id"
                    }
                }]
            })
        );
    }

    #[test]
    fn test_empty_response() {
        let response = AggregatedResponse::from_outcomes(Vec::new());
        assert!(response.is_empty());
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({}));
    }
}
