//! Tool actions — the static name → action table.
//!
//! Each action is a tagged variant describing which backend to call, the fixed
//! route (if any) and how caller parameters are forwarded. Dispatch is a
//! pattern match; nothing is captured at runtime.

use serde_json::{Map, Value};

/// What invoking a tool does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAction {
    /// REST GET. `{param}` placeholders come from parameters; the remaining
    /// parameters become the query string.
    RestGet { path: &'static str },
    /// REST POST. Same substitution; remaining parameters become the JSON body.
    RestPost { path: &'static str },
    /// Raw graph query taken from the named string parameter.
    GraphQuery { query_param: &'static str },
    /// Log search with `query` and `limit`.
    LogQuery,
    /// Metrics range query with `query` and optional `start`/`end`/`step`.
    MetricsRangeQuery,
}

impl ToolAction {
    /// Backend family label used in logs.
    pub fn backend(&self) -> &'static str {
        match self {
            ToolAction::RestGet { .. } | ToolAction::RestPost { .. } => "rest",
            ToolAction::GraphQuery { .. } => "graph",
            ToolAction::LogQuery => "logs",
            ToolAction::MetricsRangeQuery => "metrics",
        }
    }
}

/// Bindings for every built-in tool.
pub fn builtin_bindings() -> Vec<(&'static str, ToolAction)> {
    vec![
        ("search_resources", ToolAction::RestGet { path: "/api/v1/resources" }),
        ("get_resource", ToolAction::RestGet { path: "/api/v1/resources/{resource_id}" }),
        (
            "get_resource_relationships",
            ToolAction::RestGet { path: "/api/v1/resources/{resource_id}/relationships" },
        ),
        ("search_incidents", ToolAction::RestGet { path: "/api/v1/incidents" }),
        ("get_incident_by_id", ToolAction::RestGet { path: "/api/v1/incidents/{incident_id}" }),
        ("search_changelogs", ToolAction::RestGet { path: "/api/v1/changes" }),
        ("create_incident", ToolAction::RestPost { path: "/api/v1/incidents" }),
        (
            "add_incident_comment",
            ToolAction::RestPost { path: "/api/v1/incidents/{incident_id}/comments" },
        ),
        ("get_graph_nodes", ToolAction::GraphQuery { query_param: "query" }),
        ("query_logs", ToolAction::LogQuery),
        ("query_metrics", ToolAction::MetricsRangeQuery),
    ]
}

// =============================================================================
// Parameter forwarding
// =============================================================================

/// Substitute `{name}` placeholders in `template` from `params`, removing the
/// consumed entries. Values are percent-encoded as single path segments.
pub fn resolve_path(template: &str, params: &mut Map<String, Value>) -> Result<String, String> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let close = rest[open..]
            .find('}')
            .map(|i| open + i)
            .ok_or_else(|| format!("unterminated placeholder in route {template}"))?;
        let name = &rest[open + 1..close];

        let value = match params.remove(name) {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => return Err(format!("Missing path parameter: {name}")),
        };

        path.push_str(&rest[..open]);
        path.push_str(&urlencoding::encode(&value));
        rest = &rest[close + 1..];
    }
    path.push_str(rest);
    Ok(path)
}

/// Render parameters as query-string pairs. Scalars are stringified, nulls
/// skipped, arrays and objects sent as JSON text.
pub fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
                    value.to_string()
                }
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

/// Read an optional string parameter; non-string scalars are stringified.
pub fn string_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
