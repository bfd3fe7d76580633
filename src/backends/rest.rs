//! Inventory/ticketing REST adapter.
//!
//! Responses below HTTP 500 are returned as-is, 4xx bodies included, so the
//! caller sees the backend's own client-error semantics. 5xx and transport
//! failures become failure envelopes.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::time::Duration;

use super::{http_client, Failure};
use crate::types::{Error, RestConfig, Result};

const API_KEY_HEADER: &str = "x-api-key";
const ORG_KEY_HEADER: &str = "x-org-key";
const ORG_ID_HEADER: &str = "x-org-id";

/// REST backend client. Path templates are resolved before they reach here.
#[derive(Debug)]
pub struct RestBackend {
    client: Client,
    base_url: Option<String>,
    headers: HeaderMap,
}

impl RestBackend {
    pub fn new(config: RestConfig, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, API_KEY_HEADER, &config.api_key)?;
        insert_header(&mut headers, ORG_KEY_HEADER, &config.org_key)?;
        if let Some(org_id) = &config.org_id {
            insert_header(&mut headers, ORG_ID_HEADER, org_id)?;
        }

        Ok(Self {
            client: http_client(timeout)?,
            base_url: config.base_url,
            headers,
        })
    }

    /// GET `path` with `query` as query-string pairs.
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Value {
        self.call(Method::GET, path, |req| req.query(query)).await
    }

    /// POST `path` with `body` as the JSON request body.
    pub async fn post(&self, path: &str, body: &Value) -> Value {
        self.call(Method::POST, path, |req| req.json(body)).await
    }

    async fn call<F>(&self, method: Method, path: &str, build: F) -> Value
    where
        F: FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    {
        let Some(base_url) = &self.base_url else {
            return Failure::new("REST backend URL not configured").into_value();
        };
        let url = format!("{}{}", base_url, path);

        tracing::debug!(%method, %url, "REST backend call");
        let request = build(
            self.client
                .request(method.clone(), &url)
                .headers(self.headers.clone()),
        );

        match request.send().await {
            Ok(response) => normalize_response(response).await,
            Err(e) => {
                tracing::warn!(%method, %url, error = %e, "REST backend transport failure");
                Failure::transport(&e).into_value()
            }
        }
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<()> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| Error::config(format!("{name} contains characters not allowed in a header")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

async fn normalize_response(response: Response) -> Value {
    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return Failure::transport(&e).into_value(),
    };
    let body = parse_body(text);

    if status.is_server_error() {
        let message = error_message(&body)
            .unwrap_or_else(|| format!("REST backend returned HTTP {}", status.as_u16()));
        tracing::warn!(status = status.as_u16(), %message, "REST backend server error");
        return Failure::with_status(message, status.as_u16()).into_value();
    }

    body
}

/// JSON when the body parses, the raw text otherwise.
fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// Human-readable message carried by a backend error body, if any.
fn error_message(body: &Value) -> Option<String> {
    let from_field = |key: &str| {
        body.get(key).and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(_) => v.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
    };
    from_field("message")
        .or_else(|| from_field("error"))
        .or_else(|| match body {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body_falls_back_to_text() {
        assert_eq!(parse_body(r#"{"a":1}"#.to_string()), json!({"a": 1}));
        assert_eq!(parse_body("gateway down".to_string()), json!("gateway down"));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(&json!({"message": "db offline"})).as_deref(),
            Some("db offline")
        );
        assert_eq!(
            error_message(&json!({"error": {"message": "nested"}})).as_deref(),
            Some("nested")
        );
        assert_eq!(error_message(&json!({"error": "flat"})).as_deref(), Some("flat"));
        assert_eq!(error_message(&json!(" upstream crashed\n")).as_deref(), Some("upstream crashed"));
        assert_eq!(error_message(&json!({"code": 7})), None);
    }

    #[test]
    fn test_rejects_invalid_header_values() {
        let config = RestConfig {
            base_url: Some("http://localhost".into()),
            api_key: "bad\nkey".into(),
            ..Default::default()
        };
        assert!(RestBackend::new(config, Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_base_url_is_failure() {
        let backend = RestBackend::new(RestConfig::default(), Duration::from_secs(1)).unwrap();
        let result = backend.get("/api/v1/incidents", &[]).await;
        assert_eq!(
            result,
            json!({"success": false, "error": "REST backend URL not configured"})
        );
    }
}
