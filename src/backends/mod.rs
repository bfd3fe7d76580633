//! Backend adapters.
//!
//! Each adapter performs one kind of external call and normalizes its outcome.
//! Adapters never return `Err` and never let a panic escape: every failure is
//! a [`Failure`] envelope rendered as `{success: false, error, status?}`, so a
//! single failing tool call cannot take down the caller's wider workflow.

pub mod graph;
pub mod logs;
pub mod metrics;
pub mod rest;

pub use graph::{
    GraphBackend, GraphConnection, GraphDriver, GraphError, GraphRecord, GraphSession, GraphValue,
};
pub use logs::LogsBackend;
pub use metrics::{MetricsBackend, RangeBounds};
pub use rest::RestBackend;

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::types::{Config, Error, Result};

/// Uniform failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Failure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            status: None,
        }
    }

    pub fn with_status(error: impl Into<String>, status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(error)
        }
    }

    /// Failure for a transport-level error (connect, timeout, body read).
    pub fn transport(err: &reqwest::Error) -> Self {
        Self {
            success: false,
            error: transport_message(err),
            status: err.status().map(|s| s.as_u16()),
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({"success": false, "error": "failure envelope serialization"})
        })
    }
}

impl From<Failure> for Value {
    fn from(failure: Failure) -> Self {
        failure.into_value()
    }
}

/// True when `value` is a failure envelope produced by an adapter.
pub fn is_failure(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool) == Some(false) && value.get("error").is_some()
}

// reqwest's Display stops at the outermost layer; walk the source chain so
// "error sending request" also says why.
fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        return format!("request timed out: {err}");
    }
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Build the shared HTTP client used by one adapter.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("toolgate/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::internal(format!("HTTP client construction failed: {e}")))
}

/// Every backend the registry can dispatch to.
#[derive(Debug)]
pub struct Backends {
    pub rest: RestBackend,
    pub graph: GraphBackend,
    pub logs: LogsBackend,
    pub metrics: MetricsBackend,
}

impl Backends {
    /// Build HTTP adapters from `config`; the graph capability is injected
    /// because connecting is async and may legitimately be skipped.
    pub fn from_config(config: &Config, graph: GraphConnection) -> Result<Self> {
        let timeout = config.limits.request_timeout;
        Ok(Self {
            rest: RestBackend::new(config.rest.clone(), timeout)?,
            graph: GraphBackend::new(graph),
            logs: LogsBackend::new(config.observability_backends.logs_url.clone(), timeout)?,
            metrics: MetricsBackend::new(
                config.observability_backends.metrics_url.clone(),
                timeout,
            )?,
        })
    }
}
