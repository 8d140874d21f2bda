//! Tool registry: the static catalogue of operations the agent can invoke.
//!
//! Each [`ToolSpec`] couples a parameter schema with the collaborator that
//! executes it and the response category its outcomes are grouped under.
//! The registry is built once at startup and shared read-only afterwards.

use std::fmt;
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Value, json};

use super::executor::{JsonObject, ToolExecutor};
use super::validation::ValidationError;
use crate::types::{Category, ToolName};

/// Date format accepted for `date` parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Semantic type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Float,
    Date,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Date => "date",
        }
    }

    /// Coerce free text into a JSON value of this type.
    ///
    /// Numbers accept thousands separators and a `k`/`m` suffix. Returns
    /// `None` when the text does not denote a value of this type.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match self {
            Self::String => Some(Value::String(raw.to_string())),
            Self::Integer => {
                let n = parse_number(raw)?;
                (n.fract() == 0.0 && n.abs() < i64::MAX as f64).then(|| json!(n as i64))
            }
            Self::Float => parse_number(raw).map(|n| json!(n)),
            Self::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .map(|d| Value::String(d.format(DATE_FORMAT).to_string())),
        }
    }

    /// Check that `value` conforms to this type, returning its normalised form.
    ///
    /// Integers given for float parameters become floats; a float with no
    /// fractional part is accepted as an integer.
    pub fn conform(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::String, Value::String(s)) => Some(Value::String(s.clone())),
            (Self::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Some(json!(i))
                } else {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| json!(f as i64))
                }
            }
            (Self::Float, Value::Number(n)) => n.as_f64().map(|f| json!(f)),
            (Self::Date, Value::String(s)) => Self::Date.coerce(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a human-written number such as `85,000`, `85k` or `1.2m`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let (digits, multiplier) = if let Some(d) = lower.strip_suffix('k') {
        (d, 1_000.0)
    } else if let Some(d) = lower.strip_suffix('m') {
        (d, 1_000_000.0)
    } else {
        (lower.as_str(), 1.0)
    };
    if digits.is_empty() || !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    digits
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| n * multiplier)
}

/// One named parameter of a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    pub fn optional(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }
}

/// A registered tool: schema, category, recognition hints and executor.
#[derive(Clone, Serialize)]
pub struct ToolSpec {
    pub name: ToolName,
    pub description: &'static str,
    pub category: Category,
    pub params: Vec<ParamSpec>,
    /// Phrases that point at this tool in free-form text.
    #[serde(skip)]
    pub keywords: Vec<&'static str>,
    /// Higher wins when a clause matches several tools.
    #[serde(skip)]
    pub precedence: u8,
    #[serde(skip)]
    pub executor: Arc<dyn ToolExecutor>,
}

impl fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl ToolSpec {
    pub fn new(
        name: &str,
        category: &str,
        description: &'static str,
        executor: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            name: ToolName::new(name),
            description,
            category: Category::new(category),
            params: Vec::new(),
            keywords: Vec::new(),
            precedence: 0,
            executor,
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn keywords(mut self, keywords: &[&'static str]) -> Self {
        self.keywords.extend_from_slice(keywords);
        self
    }

    pub fn precedence(mut self, precedence: u8) -> Self {
        self.precedence = precedence;
        self
    }

    /// Look up a parameter by name.
    pub fn find_param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Names of the required parameters absent from `args`.
    pub fn missing_required(&self, args: &JsonObject) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.required && args.get(p.name).is_none_or(Value::is_null))
            .map(|p| p.name.to_string())
            .collect()
    }

    /// Validate arguments against the schema and return the normalised set.
    ///
    /// `marked_missing` carries parameters the recognizer already knows it
    /// could not fill. Arguments the schema does not name are dropped.
    pub fn validate(
        &self,
        args: &JsonObject,
        marked_missing: &[String],
    ) -> Result<JsonObject, ValidationError> {
        if let Some(param) = marked_missing.first() {
            return Err(ValidationError::MissingParameter {
                tool: self.name.clone(),
                param: param.clone(),
            });
        }

        let mut normalised = JsonObject::new();
        for param in &self.params {
            match args.get(param.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    let value = param.ty.conform(value).ok_or_else(|| {
                        ValidationError::MalformedParameter {
                            tool: self.name.clone(),
                            param: param.name.to_string(),
                            expected: param.ty,
                            found: value.clone(),
                        }
                    })?;
                    normalised.insert(param.name.to_string(), value);
                }
                None if param.required => {
                    return Err(ValidationError::MissingParameter {
                        tool: self.name.clone(),
                        param: param.name.to_string(),
                    });
                }
                None => {}
            }
        }
        Ok(normalised)
    }

    /// JSON schema for this tool's arguments.
    pub fn input_schema(&self) -> JsonObject {
        let mut properties = serde_json::Map::new();
        for param in &self.params {
            let schema = match param.ty {
                ParamType::String => json!({"type": "string"}),
                ParamType::Integer => json!({"type": "integer"}),
                ParamType::Float => json!({"type": "number"}),
                ParamType::Date => json!({"type": "string", "format": "date"}),
            };
            properties.insert(param.name.to_string(), schema);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), json!(required));
        schema
    }

    /// One-line signature, e.g. `update_property_price(id: integer, ...)`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let marker = if p.required { "" } else { "?" };
                format!("{}{}: {}", p.name, marker, p.ty)
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// Registry of tools, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<ToolSpec>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Names are unique, compared case-insensitively.
    pub fn register(mut self, spec: ToolSpec) -> Result<Self> {
        if self.lookup(spec.name.as_str()).is_some() {
            bail!("Tool `{}` is registered twice", spec.name);
        }
        self.tools.push(Arc::new(spec));
        Ok(self)
    }

    /// Get a tool by name (case-insensitive).
    pub fn lookup(&self, name: &str) -> Option<&Arc<ToolSpec>> {
        let name = name.trim();
        self.tools
            .iter()
            .find(|t| t.name.as_str().eq_ignore_ascii_case(name))
    }

    /// All registered tools.
    pub fn list(&self) -> &[Arc<ToolSpec>] {
        &self.tools
    }

    /// List all registered tool names.
    pub fn list_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.to_string()).collect()
    }

    /// Return the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Return `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tools::executor::UpstreamError;
    use async_trait::async_trait;

    pub(crate) struct Echo;

    #[async_trait]
    impl ToolExecutor for Echo {
        async fn execute(&self, args: &JsonObject) -> Result<Value, UpstreamError> {
            Ok(Value::Object(args.clone()))
        }
    }

    fn price_tool() -> ToolSpec {
        ToolSpec::new("update_property_price", "updates", "Update rent", Arc::new(Echo))
            .param(ParamSpec::required("id", ParamType::Integer))
            .param(ParamSpec::required("rent_price", ParamType::Float))
            .param(ParamSpec::optional("reason", ParamType::String))
    }

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("85000"), Some(85000.0));
        assert_eq!(parse_number("85,000"), Some(85000.0));
        assert_eq!(parse_number("85k"), Some(85000.0));
        assert_eq!(parse_number("1.5M"), Some(1_500_000.0));
        assert_eq!(parse_number("12.75"), Some(12.75));
        assert_eq!(parse_number("market"), None);
        assert_eq!(parse_number("k"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_coerce_by_type() {
        assert_eq!(ParamType::Integer.coerce("123"), Some(json!(123)));
        assert_eq!(ParamType::Integer.coerce("12.5"), None);
        assert_eq!(ParamType::Float.coerce("85000"), Some(json!(85000.0)));
        assert_eq!(ParamType::Date.coerce("2024-02-29"), Some(json!("2024-02-29")));
        assert_eq!(ParamType::Date.coerce("2023-02-30"), None);
        assert_eq!(ParamType::String.coerce("  Marina "), Some(json!("Marina")));
        assert_eq!(ParamType::String.coerce("   "), None);
    }

    #[test]
    fn test_conform_normalises_numbers() {
        assert_eq!(ParamType::Float.conform(&json!(5)), Some(json!(5.0)));
        assert_eq!(ParamType::Integer.conform(&json!(5.0)), Some(json!(5)));
        assert_eq!(ParamType::Integer.conform(&json!(5.5)), None);
        assert_eq!(ParamType::Integer.conform(&json!("5")), None);
        assert_eq!(ParamType::String.conform(&json!(5)), None);
    }

    #[test]
    fn test_out_of_range_integer_is_malformed() {
        assert_eq!(ParamType::Integer.conform(&json!(1e20)), None);
        assert_eq!(ParamType::Integer.conform(&json!(-1e20)), None);

        let tool = price_tool();
        let args = json!({"id": 1e20, "rent_price": 100.0});
        let err = tool.validate(args.as_object().unwrap(), &[]).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedParameter { ref param, .. } if param == "id"));
    }

    #[test]
    fn test_validate_reports_missing_and_malformed() {
        let tool = price_tool();

        let args = json!({"rent_price": 100.0});
        let err = tool.validate(args.as_object().unwrap(), &[]).unwrap_err();
        assert!(matches!(err, ValidationError::MissingParameter { ref param, .. } if param == "id"));

        let args = json!({"id": "abc", "rent_price": 100.0});
        let err = tool.validate(args.as_object().unwrap(), &[]).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedParameter { ref param, .. } if param == "id"));

        let args = json!({"id": 1, "rent_price": 100.0});
        let err = tool
            .validate(args.as_object().unwrap(), &["reason".to_string()])
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingParameter { ref param, .. } if param == "reason"));
    }

    #[test]
    fn test_validate_normalises_and_drops_unknown() {
        let tool = price_tool();
        let args = json!({"id": 123, "rent_price": 85000, "extra": true});
        let valid = tool.validate(args.as_object().unwrap(), &[]).unwrap();
        assert_eq!(valid.get("rent_price"), Some(&json!(85000.0)));
        assert_eq!(valid.get("id"), Some(&json!(123)));
        assert!(!valid.contains_key("extra"));
        assert!(!valid.contains_key("reason"));
    }

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let registry = ToolRegistry::new().register(price_tool()).unwrap();
        assert!(registry.lookup("Update_Property_Price").is_some());
        assert!(registry.lookup("update_property_price").is_some());
        assert!(registry.lookup("get_chart").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let result = ToolRegistry::new()
            .register(price_tool())
            .unwrap()
            .register(price_tool());
        assert!(result.is_err());
    }

    #[test]
    fn test_input_schema_and_signature() {
        let tool = price_tool();
        let schema = tool.input_schema();
        assert_eq!(schema["required"], json!(["id", "rent_price"]));
        assert_eq!(schema["properties"]["rent_price"]["type"], json!("number"));
        assert_eq!(
            tool.signature(),
            "update_property_price(id: integer, rent_price: float, reason?: string)"
        );
    }

    #[test]
    fn test_missing_required() {
        let tool = price_tool();
        let args = json!({"id": 1, "rent_price": null});
        assert_eq!(
            tool.missing_required(args.as_object().unwrap()),
            vec!["rent_price".to_string()]
        );
    }
}
