//! Metrics range-query adapter (PromQL-compatible HTTP API).

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::{http_client, Failure};
use crate::types::Result;

const QUERY_RANGE_PATH: &str = "/api/v1/query_range";

/// Optional range bounds forwarded verbatim when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeBounds {
    pub start: Option<String>,
    pub end: Option<String>,
    pub step: Option<String>,
}

impl RangeBounds {
    fn query_pairs<'a>(&'a self, query: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut pairs = vec![("query", query)];
        for (key, value) in [("start", &self.start), ("end", &self.end), ("step", &self.step)] {
            if let Some(value) = value {
                pairs.push((key, value.as_str()));
            }
        }
        pairs
    }
}

#[derive(Debug)]
pub struct MetricsBackend {
    client: Client,
    base_url: Option<String>,
}

impl MetricsBackend {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url,
        })
    }

    /// Run a range query; the backend's JSON is returned unchanged on success.
    pub async fn query_range(&self, query: &str, bounds: &RangeBounds) -> Value {
        let Some(base_url) = &self.base_url else {
            return Failure::new("Metrics backend URL not configured").into_value();
        };
        let url = format!("{base_url}{QUERY_RANGE_PATH}");

        let response = match self
            .client
            .get(&url)
            .query(&bounds.query_pairs(query))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%url, error = %e, "metrics backend transport failure");
                return Failure::transport(&e).into_value();
            }
        };

        let status = response.status();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => return Failure::transport(&e).into_value(),
            Err(_) => Value::Null,
        };

        if !status.is_success() {
            // Prometheus-style errors carry {"status":"error","error":"..."}.
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Metrics backend returned HTTP {}", status.as_u16()));
            return Failure::with_status(message, status.as_u16()).into_value();
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_skip_absent_bounds() {
        let bounds = RangeBounds {
            start: Some("now-1h".into()),
            end: None,
            step: Some("1m".into()),
        };
        assert_eq!(
            bounds.query_pairs("up"),
            vec![("query", "up"), ("start", "now-1h"), ("step", "1m")]
        );
        assert_eq!(RangeBounds::default().query_pairs("up"), vec![("query", "up")]);
    }

    #[tokio::test]
    async fn test_unconfigured_url_is_failure() {
        let backend = MetricsBackend::new(None, Duration::from_secs(1)).unwrap();
        let result = backend.query_range("up", &RangeBounds::default()).await;
        assert_eq!(result["error"], "Metrics backend URL not configured");
    }
}
