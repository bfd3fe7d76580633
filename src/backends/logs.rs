//! Log query adapter (LogsQL over HTTP).
//!
//! The backend streams one JSON object per line. Malformed or partial lines
//! are dropped; the remaining entries keep their original order.

use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::{http_client, Failure};
use crate::types::Result;

const QUERY_PATH: &str = "/select/logsql/query";

#[derive(Debug)]
pub struct LogsBackend {
    client: Client,
    base_url: Option<String>,
}

impl LogsBackend {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url,
        })
    }

    /// Run `query` returning at most `limit` entries as `{success, logs, count?}`.
    pub async fn query(&self, query: &str, limit: u64) -> Value {
        let Some(base_url) = &self.base_url else {
            return Failure::new("Log backend URL not configured").into_value();
        };
        let url = format!("{base_url}{QUERY_PATH}");
        let limit = limit.to_string();

        let response = match self
            .client
            .get(&url)
            .query(&[("query", query), ("limit", limit.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%url, error = %e, "log backend transport failure");
                return Failure::transport(&e).into_value();
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Failure::transport(&e).into_value(),
        };

        if !status.is_success() {
            let message = if text.trim().is_empty() {
                format!("Log backend returned HTTP {}", status.as_u16())
            } else {
                text.trim().to_string()
            };
            return Failure::with_status(message, status.as_u16()).into_value();
        }

        normalize_body(&text)
    }
}

/// A body that is one JSON array passes through as `logs`; anything else is
/// treated as newline-delimited JSON, so a single-entry stream still yields a
/// one-element `logs` array with `count`.
pub fn normalize_body(text: &str) -> Value {
    if let Ok(document @ Value::Array(_)) = serde_json::from_str::<Value>(text) {
        return json!({ "success": true, "logs": document });
    }
    let logs = parse_lines(text);
    json!({
        "success": true,
        "count": logs.len(),
        "logs": logs,
    })
}

/// Parse newline-delimited JSON, silently skipping lines that do not parse.
pub fn parse_lines(text: &str) -> Vec<Value> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}
