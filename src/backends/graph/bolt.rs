//! Bolt-protocol driver backed by `neo4rs`.
//!
//! A session is one explicit transaction: committed when the query completes,
//! rolled back otherwise. Dropping the pooled connection returns it to the pool.
//! Closing the driver drops the pool handle it owns; sessions opened after that
//! fail with a driver error.

use async_trait::async_trait;
use neo4rs::{query, BoltMap, BoltType, Graph, Txn};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{GraphDriver, GraphError, GraphRecord, GraphSession, GraphValue};
use crate::types::GraphConfig;

const DRIVER_CLOSED: &str = "graph driver closed";

/// Handle that can be taken out exactly once. Open sessions keep their own
/// clone of the handle until they are released.
#[derive(Debug)]
struct PoolSlot<T> {
    inner: RwLock<Option<T>>,
}

impl<T: Clone> PoolSlot<T> {
    fn new(handle: T) -> Self {
        Self {
            inner: RwLock::new(Some(handle)),
        }
    }

    async fn acquire(&self) -> Option<T> {
        self.inner.read().await.clone()
    }

    async fn release(&self) -> Option<T> {
        self.inner.write().await.take()
    }
}

/// Shared connection pool to the graph database.
pub struct BoltDriver {
    pool: PoolSlot<Graph>,
    uri: String,
}

impl std::fmt::Debug for BoltDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoltDriver").field("uri", &self.uri).finish()
    }
}

impl BoltDriver {
    /// Create the pool and probe it once. A failed probe is logged but not
    /// fatal: the pool reconnects on the next session.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let graph = Graph::new(
            config.uri.as_str(),
            config.username.as_str(),
            config.password.as_str(),
        )
        .await
        .map_err(driver_error)?;

        if let Err(e) = graph.run(query("RETURN 1")).await {
            tracing::warn!(uri = %config.uri, error = %e, "graph connectivity probe failed");
        }

        Ok(Self {
            pool: PoolSlot::new(graph),
            uri: config.uri.clone(),
        })
    }
}

#[async_trait]
impl GraphDriver for BoltDriver {
    async fn open_session(&self) -> Result<Box<dyn GraphSession>, GraphError> {
        let graph = self
            .pool
            .acquire()
            .await
            .ok_or_else(|| GraphError::Driver(DRIVER_CLOSED.into()))?;
        let txn = graph.start_txn().await.map_err(driver_error)?;
        Ok(Box::new(BoltSession { txn: Some(txn) }))
    }

    async fn close(&self) {
        match self.pool.release().await {
            Some(graph) => {
                drop(graph);
                tracing::info!(uri = %self.uri, "graph connection pool closed");
            }
            None => tracing::debug!(uri = %self.uri, "graph connection pool already closed"),
        }
    }
}

struct BoltSession {
    txn: Option<Txn>,
}

#[async_trait]
impl GraphSession for BoltSession {
    async fn run(&mut self, cypher: &str) -> Result<Vec<GraphRecord>, GraphError> {
        let txn = self
            .txn
            .as_mut()
            .ok_or_else(|| GraphError::Driver("graph session already released".into()))?;

        let mut stream = txn.execute(query(cypher)).await.map_err(driver_error)?;
        let mut records = Vec::new();
        while let Some(row) = stream.next(txn.handle()).await.map_err(driver_error)? {
            let fields: HashMap<String, BoltType> = row
                .to()
                .map_err(|e| GraphError::Driver(format!("record decoding failed: {e}")))?;
            records.push(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, from_bolt(value)))
                    .collect(),
            );
        }
        Ok(records)
    }

    async fn close(self: Box<Self>, succeeded: bool) {
        let Some(txn) = self.txn else {
            return;
        };
        let result = if succeeded {
            txn.commit().await
        } else {
            txn.rollback().await
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, succeeded, "graph session release failed");
        }
    }
}

fn driver_error(e: neo4rs::Error) -> GraphError {
    GraphError::Driver(e.to_string())
}

fn from_bolt(value: BoltType) -> GraphValue {
    match value {
        BoltType::Integer(i) => GraphValue::Integer(i.value),
        BoltType::Node(node) => GraphValue::Node {
            labels: node
                .labels
                .value
                .into_iter()
                .filter_map(|label| match label {
                    BoltType::String(s) => Some(s.value),
                    _ => None,
                })
                .collect(),
            properties: from_bolt_map(node.properties),
        },
        BoltType::Relation(rel) => GraphValue::Relationship {
            rel_type: rel.typ.value,
            properties: from_bolt_map(rel.properties),
        },
        BoltType::UnboundedRelation(rel) => GraphValue::Relationship {
            rel_type: rel.typ.value,
            properties: from_bolt_map(rel.properties),
        },
        BoltType::List(list) => GraphValue::List(list.value.into_iter().map(from_bolt).collect()),
        BoltType::Map(map) => GraphValue::Map(from_bolt_map(map)),
        BoltType::String(s) => GraphValue::Plain(Value::String(s.value)),
        BoltType::Boolean(b) => GraphValue::Plain(Value::Bool(b.value)),
        BoltType::Float(f) => GraphValue::Plain(
            serde_json::Number::from_f64(f.value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        ),
        BoltType::Null(_) => GraphValue::Plain(Value::Null),
        // Temporal, spatial, byte and path values pass through in debug form.
        other => GraphValue::Plain(Value::String(format!("{other:?}"))),
    }
}

fn from_bolt_map(map: BoltMap) -> BTreeMap<String, GraphValue> {
    map.value
        .into_iter()
        .map(|(key, value)| (key.value, from_bolt(value)))
        .collect()
}
