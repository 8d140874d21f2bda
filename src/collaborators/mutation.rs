//! Property mutation service.
//!
//! One collaborator backs two tools: rent updates go to
//! `PUT {update_base}/{id}` and new properties to `POST {create_base}`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::client::UpstreamClient;
use crate::tools::{JsonObject, ParamType, ToolExecutor, UpstreamError, arg_f64, arg_i64, arg_str};

/// Fields of a new property, in the order the service documents them.
pub const CREATE_FIELDS: [(&str, ParamType); 11] = [
    ("address1", ParamType::String),
    ("area", ParamType::String),
    ("city", ParamType::String),
    ("purchaseDate", ParamType::Date),
    ("developer", ParamType::String),
    ("buyPrice", ParamType::Float),
    ("rentPrice", ParamType::Float),
    ("bedrooms", ParamType::Integer),
    ("bathrooms", ParamType::Integer),
    ("receptions", ParamType::Integer),
    ("size", ParamType::Float),
];

pub struct PropertyMutationService {
    client: Arc<UpstreamClient>,
    update_base: String,
    create_base: String,
}

impl PropertyMutationService {
    pub fn new(client: Arc<UpstreamClient>, update_base: &str, create_base: &str) -> Self {
        Self {
            client,
            update_base: update_base.trim_end_matches('/').to_string(),
            create_base: create_base.to_string(),
        }
    }

    pub async fn update_rent(&self, id: i64, rent_price: f64, reason: &str) -> Result<Value, UpstreamError> {
        let url = format!("{}/{}", self.update_base, id);
        let body = json!({
            "id": id,
            "rentPrice": rent_price,
            "reason": reason,
        });
        let updated = self.client.put_json(&url, &body).await?;
        info!(id, rent_price, "Updated property rent");
        Ok(updated)
    }

    pub async fn create(&self, fields: &JsonObject) -> Result<Value, UpstreamError> {
        let mut body = JsonObject::new();
        for (name, _) in CREATE_FIELDS {
            body.insert(name.to_string(), fields.get(name).cloned().unwrap_or(Value::Null));
        }
        let created = self.client.post_json(&self.create_base, &Value::Object(body)).await?;
        info!(address = ?arg_str(fields, "address1"), "Created property");
        Ok(created)
    }
}

/// `update_property_price` executor.
pub struct UpdateRent(pub Arc<PropertyMutationService>);

#[async_trait]
impl ToolExecutor for UpdateRent {
    async fn execute(&self, args: &JsonObject) -> Result<Value, UpstreamError> {
        let id = arg_i64(args, "id").unwrap_or_default();
        let rent_price = arg_f64(args, "rent_price").unwrap_or_default();
        let reason = arg_str(args, "reason").unwrap_or_default();
        self.0.update_rent(id, rent_price, reason).await
    }
}

/// `create_property` executor.
pub struct CreateProperty(pub Arc<PropertyMutationService>);

#[async_trait]
impl ToolExecutor for CreateProperty {
    async fn execute(&self, args: &JsonObject) -> Result<Value, UpstreamError> {
        self.0.create(args).await
    }
}
