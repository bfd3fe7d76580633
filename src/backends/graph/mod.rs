//! Graph query adapter.
//!
//! Runs caller-supplied query text verbatim against the graph database. There
//! is no sanitization and no parameterization: anyone who can invoke a graph
//! tool has full read/write access to the graph.
//!
//! The driver handle is long-lived and shared; each call acquires one scoped
//! session and releases it exactly once, whether the query succeeds, fails in
//! the driver, or panics.

mod bolt;

pub use bolt::BoltDriver;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{json, Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::Failure;
use crate::types::GraphConfig;

/// Message reported when graph tools are invoked without a connection.
pub const DRIVER_NOT_INITIALIZED: &str = "Neo4j driver not initialized";

/// Field added to flattened nodes and relationships.
pub const LABELS_FIELD: &str = "_labels";

// =============================================================================
// Driver-level values
// =============================================================================

/// A value as produced by the graph driver, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    /// Driver integer representation.
    Integer(i64),
    Node {
        labels: Vec<String>,
        properties: BTreeMap<String, GraphValue>,
    },
    Relationship {
        rel_type: String,
        properties: BTreeMap<String, GraphValue>,
    },
    List(Vec<GraphValue>),
    Map(BTreeMap<String, GraphValue>),
    /// Anything else, already JSON.
    Plain(Value),
}

impl GraphValue {
    /// Convert to plain JSON.
    ///
    /// Integers become JSON numbers, nodes and relationships become their
    /// property map plus `_labels`, containers are converted recursively and
    /// everything else passes through.
    pub fn normalize(self) -> Value {
        match self {
            GraphValue::Integer(i) => Value::from(i),
            GraphValue::Node { labels, properties } => flatten_entity(labels, properties),
            GraphValue::Relationship {
                rel_type,
                properties,
            } => flatten_entity(vec![rel_type], properties),
            GraphValue::List(items) => {
                Value::Array(items.into_iter().map(GraphValue::normalize).collect())
            }
            GraphValue::Map(entries) => Value::Object(normalize_map(entries)),
            GraphValue::Plain(value) => value,
        }
    }
}

fn normalize_map(entries: BTreeMap<String, GraphValue>) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k, v.normalize()))
        .collect()
}

fn flatten_entity(labels: Vec<String>, properties: BTreeMap<String, GraphValue>) -> Value {
    let mut object = normalize_map(properties);
    object.insert(LABELS_FIELD.to_string(), json!(labels));
    Value::Object(object)
}

/// One result record: returned field name → value.
pub type GraphRecord = Vec<(String, GraphValue)>;

fn normalize_record(record: GraphRecord) -> Value {
    Value::Object(
        record
            .into_iter()
            .map(|(field, value)| (field, value.normalize()))
            .collect(),
    )
}

// =============================================================================
// Driver seam
// =============================================================================

/// Graph driver failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    #[error("{0}")]
    Driver(String),

    #[error("graph driver panicked: {0}")]
    Panicked(String),
}

/// Long-lived driver handle, shared across calls.
#[async_trait]
pub trait GraphDriver: Send + Sync {
    /// Acquire a short-lived session for a single call.
    async fn open_session(&self) -> Result<Box<dyn GraphSession>, GraphError>;

    /// Release the driver at process shutdown.
    async fn close(&self);
}

/// Session scoped to one call.
#[async_trait]
pub trait GraphSession: Send {
    async fn run(&mut self, query: &str) -> Result<Vec<GraphRecord>, GraphError>;

    /// Release the session. `succeeded` tells the driver whether the query
    /// completed, so it can commit or roll back.
    async fn close(self: Box<Self>, succeeded: bool);
}

/// Graph capability injected into the adapter.
#[derive(Clone)]
pub enum GraphConnection {
    Connected(Arc<dyn GraphDriver>),
    Unconfigured,
}

impl std::fmt::Debug for GraphConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphConnection::Connected(_) => f.write_str("GraphConnection::Connected"),
            GraphConnection::Unconfigured => f.write_str("GraphConnection::Unconfigured"),
        }
    }
}

impl GraphConnection {
    /// Establish the driver handle when graph settings are present.
    ///
    /// Never fails: a missing or unusable configuration leaves graph tools
    /// reporting unavailability while the rest of the gateway keeps working.
    pub async fn from_config(config: Option<&GraphConfig>) -> Self {
        let Some(config) = config else {
            tracing::info!("graph backend not configured; graph tools disabled");
            return GraphConnection::Unconfigured;
        };
        match BoltDriver::connect(config).await {
            Ok(driver) => {
                tracing::info!(uri = %config.uri, "graph driver initialized");
                GraphConnection::Connected(Arc::new(driver))
            }
            Err(e) => {
                tracing::error!(uri = %config.uri, error = %e, "graph driver initialization failed");
                GraphConnection::Unconfigured
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, GraphConnection::Connected(_))
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Graph adapter over an injected [`GraphConnection`].
#[derive(Debug)]
pub struct GraphBackend {
    connection: GraphConnection,
}

impl GraphBackend {
    pub fn new(connection: GraphConnection) -> Self {
        Self { connection }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Execute `query` and return `{success, data, count}` or a failure envelope.
    pub async fn run_query(&self, query: &str) -> Value {
        let driver = match &self.connection {
            GraphConnection::Connected(driver) => driver,
            GraphConnection::Unconfigured => {
                return Failure::new(DRIVER_NOT_INITIALIZED).into_value();
            }
        };

        let mut session = match AssertUnwindSafe(driver.open_session()).catch_unwind().await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "graph session acquisition failed");
                return Failure::new(e.to_string()).into_value();
            }
            Err(panic) => {
                let e = GraphError::Panicked(panic_message(panic));
                tracing::error!(error = %e, "graph session acquisition panicked");
                return Failure::new(e.to_string()).into_value();
            }
        };

        let outcome = match AssertUnwindSafe(session.run(query)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(GraphError::Panicked(panic_message(panic))),
        };

        let succeeded = outcome.is_ok();
        if AssertUnwindSafe(session.close(succeeded))
            .catch_unwind()
            .await
            .is_err()
        {
            tracing::error!("graph session release panicked");
        }

        match outcome {
            Ok(records) => {
                let count = records.len();
                let data: Vec<Value> = records.into_iter().map(normalize_record).collect();
                json!({
                    "success": true,
                    "data": data,
                    "count": count,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "graph query failed");
                Failure::new(e.to_string()).into_value()
            }
        }
    }

    /// Release the driver handle. Only called at shutdown.
    pub async fn close(&self) {
        if let GraphConnection::Connected(driver) = &self.connection {
            driver.close().await;
            tracing::info!("graph driver closed");
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Copy)]
    enum Behavior {
        Rows,
        DriverError,
        Panic,
    }

    #[derive(Debug, Default)]
    struct Counters {
        opened: AtomicUsize,
        closed: AtomicUsize,
        committed: AtomicUsize,
        driver_closed: AtomicUsize,
    }

    struct FakeDriver {
        behavior: Behavior,
        counters: Arc<Counters>,
        fail_open: bool,
    }

    struct FakeSession {
        behavior: Behavior,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl GraphDriver for FakeDriver {
        async fn open_session(&self) -> Result<Box<dyn GraphSession>, GraphError> {
            if self.fail_open {
                return Err(GraphError::Driver("connection refused".into()));
            }
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                behavior: self.behavior,
                counters: self.counters.clone(),
            }))
        }

        async fn close(&self) {
            self.counters.driver_closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl GraphSession for FakeSession {
        async fn run(&mut self, _query: &str) -> Result<Vec<GraphRecord>, GraphError> {
            match self.behavior {
                Behavior::Rows => Ok(vec![
                    vec![
                        (
                            "n".to_string(),
                            GraphValue::Node {
                                labels: vec!["Server".into()],
                                properties: BTreeMap::from([
                                    ("name".to_string(), GraphValue::Plain(json!("web-1"))),
                                    ("cpus".to_string(), GraphValue::Integer(8)),
                                ]),
                            },
                        ),
                        ("degree".to_string(), GraphValue::Integer(3)),
                    ],
                    vec![
                        (
                            "n".to_string(),
                            GraphValue::Relationship {
                                rel_type: "DEPENDS_ON".into(),
                                properties: BTreeMap::new(),
                            },
                        ),
                        ("degree".to_string(), GraphValue::Plain(Value::Null)),
                    ],
                ]),
                Behavior::DriverError => Err(GraphError::Driver("SyntaxError: bad query".into())),
                Behavior::Panic => panic!("driver bug"),
            }
        }

        async fn close(self: Box<Self>, succeeded: bool) {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            if succeeded {
                self.counters.committed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn backend(behavior: Behavior, fail_open: bool) -> (GraphBackend, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let driver = FakeDriver {
            behavior,
            counters: counters.clone(),
            fail_open,
        };
        (
            GraphBackend::new(GraphConnection::Connected(Arc::new(driver))),
            counters,
        )
    }

    #[tokio::test]
    async fn test_unconfigured_reports_failure() {
        let backend = GraphBackend::new(GraphConnection::Unconfigured);
        assert!(!backend.is_connected());
        assert_eq!(
            backend.run_query("MATCH (n) RETURN n").await,
            json!({"success": false, "error": DRIVER_NOT_INITIALIZED})
        );
    }

    #[tokio::test]
    async fn test_success_normalizes_and_releases_session_once() {
        let (backend, counters) = backend(Behavior::Rows, false);
        let result = backend.run_query("MATCH (n) RETURN n, degree").await;

        assert_eq!(
            result,
            json!({
                "success": true,
                "count": 2,
                "data": [
                    {"n": {"name": "web-1", "cpus": 8, "_labels": ["Server"]}, "degree": 3},
                    {"n": {"_labels": ["DEPENDS_ON"]}, "degree": null},
                ],
            })
        );
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
        assert_eq!(counters.committed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_driver_error_releases_session_once() {
        let (backend, counters) = backend(Behavior::DriverError, false);
        let result = backend.run_query("MATCH (").await;

        assert_eq!(
            result,
            json!({"success": false, "error": "SyntaxError: bad query"})
        );
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
        assert_eq!(counters.committed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panic_is_contained_and_session_released() {
        let (backend, counters) = backend(Behavior::Panic, false);
        let result = backend.run_query("RETURN 1").await;

        assert_eq!(result["success"], false);
        assert_eq!(result["error"], "graph driver panicked: driver bug");
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_failure_is_envelope() {
        let (backend, counters) = backend(Behavior::Rows, true);
        let result = backend.run_query("RETURN 1").await;

        assert_eq!(result, json!({"success": false, "error": "connection refused"}));
        assert_eq!(counters.closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_close_releases_driver() {
        let (backend, counters) = backend(Behavior::Rows, false);
        backend.close().await;
        assert_eq!(counters.driver_closed.load(Ordering::SeqCst), 1);

        GraphBackend::new(GraphConnection::Unconfigured).close().await;
    }

    #[test]
    fn test_normalize_nested_containers() {
        let value = GraphValue::List(vec![
            GraphValue::Integer(-1),
            GraphValue::Map(BTreeMap::from([(
                "owner".to_string(),
                GraphValue::Node {
                    labels: vec!["Team".into(), "Org".into()],
                    properties: BTreeMap::new(),
                },
            )])),
        ]);
        assert_eq!(
            value.normalize(),
            json!([-1, {"owner": {"_labels": ["Team", "Org"]}}])
        );
    }
}
