//! Tool registry — name-based dispatch over the catalog and its bindings.
//!
//! The registry is read-only after construction and is shared behind an
//! `Arc`; concurrent dispatches need no locking. Backend failures come back
//! as failure envelopes inside `Ok`; only caller mistakes are `Err`.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::bindings::{builtin_bindings, query_pairs, resolve_path, string_param, ToolAction};
use super::builtin::builtin_catalog;
use super::catalog::ToolCatalog;
use crate::backends::{is_failure, Backends, Failure, GraphConnection, RangeBounds};
use crate::types::{Config, Error, Result};

const DEFAULT_LOG_LIMIT: u64 = 100;

/// Dispatch table binding every catalog entry to one action.
#[derive(Debug)]
pub struct ToolRegistry {
    catalog: ToolCatalog,
    actions: HashMap<String, ToolAction>,
    backends: Backends,
}

impl ToolRegistry {
    /// Bind `catalog` to `bindings`. The two must name exactly the same tools.
    pub fn new(
        catalog: ToolCatalog,
        bindings: Vec<(&'static str, ToolAction)>,
        backends: Backends,
    ) -> Result<Self> {
        let mut actions = HashMap::with_capacity(bindings.len());
        for (name, action) in bindings {
            if actions.insert(name.to_string(), action).is_some() {
                return Err(Error::internal(format!("Tool bound twice: {name}")));
            }
        }

        let missing_action: Vec<String> = catalog
            .list_names()
            .into_iter()
            .filter(|name| !actions.contains_key(*name))
            .map(str::to_string)
            .collect();
        let mut missing_entry: Vec<String> = actions
            .keys()
            .filter(|name| !catalog.has_tool(name))
            .cloned()
            .collect();
        missing_entry.sort();

        if !missing_action.is_empty() || !missing_entry.is_empty() {
            return Err(Error::CatalogDrift {
                missing_action,
                missing_entry,
            });
        }

        Ok(Self {
            catalog,
            actions,
            backends,
        })
    }

    /// Built-in catalog and bindings over the given graph capability.
    pub fn builtin(config: &Config, graph: GraphConnection) -> Result<Self> {
        let backends = Backends::from_config(config, graph)?;
        Self::new(builtin_catalog()?, builtin_bindings(), backends)
    }

    /// Connect the graph driver (if configured) and build the built-in registry.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let graph = GraphConnection::from_config(config.graph.as_ref()).await;
        let registry = Self::builtin(config, graph)?;
        tracing::info!(
            tools = registry.catalog.len(),
            graph_connected = registry.graph_connected(),
            "tool registry ready"
        );
        Ok(registry)
    }

    /// Discovery view of every registered tool.
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn action(&self, tool_name: &str) -> Option<ToolAction> {
        self.actions.get(tool_name).copied()
    }

    pub fn graph_connected(&self) -> bool {
        self.backends.graph.is_connected()
    }

    /// Check `parameters` against the tool's schema and fill in defaults.
    pub fn prepare(&self, tool_name: &str, parameters: Value) -> Result<(ToolAction, Map<String, Value>)> {
        let action = self
            .action(tool_name)
            .ok_or_else(|| Error::unknown_tool(tool_name))?;

        let mut parameters = match parameters {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        let violations = self.catalog.validate_params(tool_name, &parameters)?;
        if !violations.is_empty() {
            return Err(Error::InvalidParameters {
                tool: tool_name.to_string(),
                violations,
            });
        }
        self.catalog.fill_defaults(tool_name, &mut parameters)?;

        match parameters {
            Value::Object(map) => Ok((action, map)),
            _ => Err(Error::validation("Parameters must be a JSON object")),
        }
    }

    /// Invoke `tool_name` with `parameters`.
    ///
    /// Unknown tools and schema violations fail before any backend is touched.
    pub async fn dispatch(&self, tool_name: &str, parameters: Value) -> Result<Value> {
        let invocation_id = Uuid::new_v4();
        tracing::info!(
            %invocation_id,
            tool = tool_name,
            parameters = %parameters,
            "tool invocation"
        );

        let (action, parameters) = match self.prepare(tool_name, parameters) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!(%invocation_id, tool = tool_name, error = %e, "tool invocation rejected");
                return Err(e);
            }
        };

        let span = tracing::info_span!("tool", %invocation_id, tool = tool_name, backend = action.backend());
        let started = Instant::now();
        let result = self.execute(action, parameters).instrument(span).await;

        tracing::info!(
            %invocation_id,
            tool = tool_name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            failed = is_failure(&result),
            "tool invocation completed"
        );
        Ok(result)
    }

    async fn execute(&self, action: ToolAction, mut params: Map<String, Value>) -> Value {
        match action {
            ToolAction::RestGet { path } => match resolve_path(path, &mut params) {
                Ok(path) => self.backends.rest.get(&path, &query_pairs(&params)).await,
                Err(message) => Failure::new(message).into_value(),
            },
            ToolAction::RestPost { path } => match resolve_path(path, &mut params) {
                Ok(path) => {
                    self.backends
                        .rest
                        .post(&path, &Value::Object(params))
                        .await
                }
                Err(message) => Failure::new(message).into_value(),
            },
            ToolAction::GraphQuery { query_param } => match string_param(&params, query_param) {
                Some(query) => self.backends.graph.run_query(&query).await,
                None => Failure::new(format!("Missing parameter: {query_param}")).into_value(),
            },
            ToolAction::LogQuery => match string_param(&params, "query") {
                Some(query) => {
                    let limit = params
                        .get("limit")
                        .and_then(Value::as_u64)
                        .unwrap_or(DEFAULT_LOG_LIMIT);
                    self.backends.logs.query(&query, limit).await
                }
                None => Failure::new("Missing parameter: query").into_value(),
            },
            ToolAction::MetricsRangeQuery => match string_param(&params, "query") {
                Some(query) => {
                    let bounds = RangeBounds {
                        start: string_param(&params, "start"),
                        end: string_param(&params, "end"),
                        step: string_param(&params, "step"),
                    };
                    self.backends.metrics.query_range(&query, &bounds).await
                }
                None => Failure::new("Missing parameter: query").into_value(),
            },
        }
    }

    /// Release long-lived backend handles. Called once at process shutdown.
    pub async fn shutdown(&self) {
        self.backends.graph.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::builtin_entries;
    use crate::tools::catalog::ToolEntry;
    use serde_json::json;
    use crate::observability::{capture::CapturedLogs, subscriber};
    use crate::types::LoggingConfig;

    fn registry() -> ToolRegistry {
        ToolRegistry::builtin(&Config::default(), GraphConnection::Unconfigured).unwrap()
    }

    #[test]
    fn test_builtin_catalog_and_bindings_agree() {
        let registry = registry();
        let mut catalog_names: Vec<&str> = registry.catalog().list_names();
        let mut bound_names: Vec<&str> = registry.actions.keys().map(String::as_str).collect();
        catalog_names.sort_unstable();
        bound_names.sort_unstable();
        assert_eq!(catalog_names, bound_names);
    }

    #[test]
    fn test_drift_is_rejected_both_ways() {
        let backends = || Backends::from_config(&Config::default(), GraphConnection::Unconfigured).unwrap();

        let mut catalog = builtin_catalog().unwrap();
        catalog
            .register(ToolEntry::new("orphan_tool", "declared only", vec![]))
            .unwrap();
        match ToolRegistry::new(catalog, builtin_bindings(), backends()) {
            Err(Error::CatalogDrift { missing_action, missing_entry }) => {
                assert_eq!(missing_action, vec!["orphan_tool".to_string()]);
                assert!(missing_entry.is_empty());
            }
            other => panic!("expected drift, got {other:?}"),
        }

        let mut bindings = builtin_bindings();
        bindings.push(("hidden_tool", ToolAction::LogQuery));
        match ToolRegistry::new(builtin_catalog().unwrap(), bindings, backends()) {
            Err(Error::CatalogDrift { missing_action, missing_entry }) => {
                assert!(missing_action.is_empty());
                assert_eq!(missing_entry, vec!["hidden_tool".to_string()]);
            }
            other => panic!("expected drift, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_binding_is_rejected() {
        let backends = Backends::from_config(&Config::default(), GraphConnection::Unconfigured).unwrap();
        let mut bindings = builtin_bindings();
        bindings.push(("query_logs", ToolAction::LogQuery));
        assert!(ToolRegistry::new(builtin_catalog().unwrap(), bindings, backends).is_err());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_client_error() {
        let err = registry()
            .dispatch("drop_all_tables", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTool(ref name) if name == "drop_all_tables"));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_schema_violations_are_reported_together() {
        let err = registry()
            .dispatch("search_incidents", json!({"severity": "apocalyptic", "limit": "ten"}))
            .await
            .unwrap_err();
        match err {
            Error::InvalidParameters { tool, violations } => {
                assert_eq!(tool, "search_incidents");
                assert_eq!(violations.len(), 2);
            }
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_negative_limit_is_a_violation() {
        let err = registry()
            .dispatch("query_logs", json!({"query": "error", "limit": -5}))
            .await
            .unwrap_err();
        match err {
            Error::InvalidParameters { tool, violations } => {
                assert_eq!(tool, "query_logs");
                assert_eq!(violations.len(), 1);
                assert!(violations[0].contains("limit"), "{violations:?}");
            }
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    fn test_prepare_fills_defaults_and_accepts_null() {
        let registry = registry();
        let (action, params) = registry.prepare("query_logs", json!({"query": "error"})).unwrap();
        assert_eq!(action, ToolAction::LogQuery);
        assert_eq!(params.get("limit"), Some(&json!(100)));

        let (_, params) = registry.prepare("search_changelogs", Value::Null).unwrap();
        assert_eq!(params.get("limit"), Some(&json!(20)));
    }

    #[tokio::test]
    async fn test_graph_tool_without_connection() {
        let result = registry()
            .dispatch("get_graph_nodes", json!({"query": "MATCH (n) RETURN n"}))
            .await
            .unwrap();
        assert_eq!(
            result,
            json!({"success": false, "error": "Neo4j driver not initialized"})
        );
    }

    #[tokio::test]
    async fn test_unconfigured_rest_backend_is_envelope() {
        let result = registry()
            .dispatch("get_incident_by_id", json!({"incident_id": "INC-1"}))
            .await
            .unwrap();
        assert!(is_failure(&result));
    }

    #[tokio::test]
    async fn test_invocation_is_logged() {
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(subscriber(
            &LoggingConfig::default(),
            logs.writer(),
            false,
        ));

        let _ = registry()
            .dispatch("query_metrics", json!({"query": "up"}))
            .await;

        let contents = logs.contents();
        assert!(contents.contains("tool invocation completed"));
        assert!(contents.contains("query_metrics"));
    }

    #[test]
    fn test_every_builtin_entry_has_a_backend() {
        let registry = registry();
        for entry in builtin_entries() {
            assert!(registry.action(&entry.name).is_some(), "{} unbound", entry.name);
        }
    }
}
