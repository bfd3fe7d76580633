//! HTTP handlers — discovery, invocation, prompt, health.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::types::{Error, Result};

/// GET /health
pub(crate) async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let graph = if state.registry.graph_connected() {
        "connected"
    } else {
        "unconfigured"
    };
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.registry.catalog().len(),
        "graph": graph,
        "started_at": state.started_at.to_rfc3339(),
    }))
}

/// GET /api/mcp/tools
pub(crate) async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    let tools: Vec<Value> = state
        .registry
        .catalog()
        .list_entries()
        .into_iter()
        .map(|entry| entry.descriptor())
        .collect();

    Json(json!({
        "count": tools.len(),
        "tools": tools,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PromptQuery {
    /// Comma-separated tool names to include.
    tools: Option<String>,
}

/// GET /api/mcp/tools/prompt
pub(crate) async fn tool_prompt(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PromptQuery>,
) -> Json<Value> {
    let allowed: Option<Vec<String>> = query.tools.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    });

    Json(json!({
        "prompt": state.registry.catalog().generate_prompt(allowed.as_deref()),
    }))
}

/// POST /api/mcp/execute
///
/// Body: `{ "tool_name": "...", "parameters": { ... } }`. Once dispatched the
/// response is `{ success: true, tool_name, result }`; `result` may itself be
/// a backend failure envelope.
pub(crate) async fn execute(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let tool_name = str_field(&body, "tool_name")?;
    let parameters = body
        .get("parameters")
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    let result = state.registry.dispatch(&tool_name, parameters).await?;

    Ok(Json(json!({
        "success": true,
        "tool_name": tool_name,
        "result": result,
    })))
}

fn str_field(body: &Value, key: &str) -> Result<String> {
    body.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::validation(format!("Missing required field: {}", key)))
}
