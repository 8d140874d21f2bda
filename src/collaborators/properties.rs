// Property-record lookup and chart rendering collaborators

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::client::UpstreamClient;
use crate::tools::{JsonObject, ToolExecutor, UpstreamError, arg_i64, arg_str};

/// `POST {property_url} {"question": query}`.
pub struct PropertyRecords {
    client: Arc<UpstreamClient>,
    url: String,
}

impl PropertyRecords {
    pub fn new(client: Arc<UpstreamClient>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ToolExecutor for PropertyRecords {
    async fn execute(&self, args: &JsonObject) -> Result<Value, UpstreamError> {
        let query = arg_str(args, "query").unwrap_or_default();
        let mut data = self
            .client
            .post_json(&self.url, &json!({ "question": query }))
            .await?;

        if let Some(limit) = arg_i64(args, "limit").and_then(|n| usize::try_from(n).ok()) {
            truncate_records(&mut data, limit);
        }
        info!(
            area = ?arg_str(args, "area"),
            count = ?records(&data).map(Vec::len),
            "Fetched property records"
        );
        Ok(data)
    }
}

/// Two calls to the chart service: records for the question, then the
/// visualisation built from those records.
pub struct ChartBuilder {
    client: Arc<UpstreamClient>,
    url: String,
}

impl ChartBuilder {
    pub fn new(client: Arc<UpstreamClient>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ToolExecutor for ChartBuilder {
    async fn execute(&self, args: &JsonObject) -> Result<Value, UpstreamError> {
        let query = arg_str(args, "query").unwrap_or_default();

        let first = self
            .client
            .post_json(&self.url, &json!({ "question": query }))
            .await?;
        let records = first.get("result").cloned().unwrap_or_else(|| json!([]));

        let chart = self
            .client
            .post_json(&self.url, &json!({ "question": query, "data": records }))
            .await?;
        info!("Built chart");
        Ok(chart)
    }
}

/// The record list in a lookup response: a top-level array or `result`.
fn records(data: &Value) -> Option<&Vec<Value>> {
    match data {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("result").and_then(Value::as_array),
        _ => None,
    }
}

fn truncate_records(data: &mut Value, limit: usize) {
    let items = match data {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get_mut("result").and_then(Value::as_array_mut),
        _ => None,
    };
    if let Some(items) = items {
        items.truncate(limit);
    }
}
