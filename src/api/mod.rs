// REST API endpoints for the agent

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::aggregate::AggregatedResponse;
use crate::orchestrator::Orchestrator;

pub type AppState = Arc<Orchestrator>;

type ApiError = (StatusCode, Json<Value>);

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/run", post(run_query))
        .route("/tools", get(list_tools))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

async fn run_query(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AggregatedResponse>, ApiError> {
    let Json(payload) =
        payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    let query = payload
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "`query` must be a string"))?
        .to_string();

    let request_id = Uuid::new_v4();
    let span = info_span!("run", %request_id);
    async move {
        info!(query = %query, "Received query");
        state.run(&query).await.map(Json).map_err(|e| {
            error!("Query failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
    }
    .instrument(span)
    .await
}

/// Registered tools with their parameter schemas.
async fn list_tools(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let registry = state.registry();
    let tools: Vec<Value> = registry
        .list()
        .iter()
        .map(|spec| {
            json!({
                "name": spec.name,
                "description": spec.description,
                "category": spec.category,
                "params": spec.params,
                "inputSchema": spec.input_schema(),
            })
        })
        .collect();

    Ok(Json(json!({
        "tools": tools,
        "count": registry.len(),
    })))
}
