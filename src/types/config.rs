//! Configuration structures.
//!
//! Configuration is loaded from environment variables once at startup and
//! passed by value into the registry and adapter constructors.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use super::errors::{Error, Result};

/// Global gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Inventory/ticketing REST backend.
    #[serde(default)]
    pub rest: RestConfig,

    /// Graph database connection. `None` disables graph tools only.
    #[serde(default)]
    pub graph: Option<GraphConfig>,

    /// Log and metrics query backends.
    #[serde(default)]
    pub observability_backends: QueryBackendsConfig,

    /// Outbound call limits.
    #[serde(default)]
    pub limits: CallLimits,

    /// Process log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address.
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3001".to_string(),
        }
    }
}

/// REST backend configuration.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct RestConfig {
    /// Base URL, e.g. `https://manifest.example.com`.
    pub base_url: Option<String>,
    pub api_key: String,
    pub org_key: String,
    /// Sent as an extra header only when set.
    pub org_id: Option<String>,
}

// Keeps credentials out of logs.
impl std::fmt::Debug for RestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("org_key", &redact(&self.org_key))
            .field("org_id", &self.org_id)
            .finish()
    }
}

/// Graph database connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

/// Log/metrics backend base URLs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryBackendsConfig {
    pub logs_url: Option<String>,
    pub metrics_url: Option<String>,
}

/// Per-call limits applied to every backend request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLimits {
    /// Upper bound for one backend call; exceeding it is a transport failure.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for CallLimits {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, e.g. `info,toolgate=debug`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            filter: "info".to_string(),
        }
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "***"
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Config::default();

        if let Some(addr) = get("TOOLGATE_LISTEN_ADDR") {
            config.server.listen_addr = addr;
        } else if let Some(port) = get("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| Error::config(format!("PORT must be a port number, got '{port}'")))?;
            config.server.listen_addr = format!("0.0.0.0:{port}");
        }

        config.rest = RestConfig {
            base_url: get("MANIFEST_API_URL").map(|u| u.trim_end_matches('/').to_string()),
            api_key: get("MANIFEST_API_KEY").unwrap_or_default(),
            org_key: get("MANIFEST_ORG_KEY").unwrap_or_default(),
            org_id: get("MANIFEST_ORG_ID"),
        };

        config.graph = match (get("NEO4J_URI"), get("NEO4J_USERNAME"), get("NEO4J_PASSWORD")) {
            (Some(uri), Some(username), Some(password)) => Some(GraphConfig {
                uri,
                username,
                password,
            }),
            (Some(_), _, _) => {
                return Err(Error::config(
                    "NEO4J_URI is set but NEO4J_USERNAME or NEO4J_PASSWORD is missing",
                ))
            }
            _ => None,
        };

        config.observability_backends = QueryBackendsConfig {
            logs_url: get("VICTORIA_LOGS_API_URL")
                .or_else(|| get("VICTORIA_LOGS_URL"))
                .map(|u| u.trim_end_matches('/').to_string()),
            metrics_url: get("VICTORIA_METRICS_URL").map(|u| u.trim_end_matches('/').to_string()),
        };

        if let Some(raw) = get("TOOLGATE_REQUEST_TIMEOUT") {
            let timeout = humantime::parse_duration(&raw).map_err(|e| {
                Error::config(format!("TOOLGATE_REQUEST_TIMEOUT '{raw}': {e}"))
            })?;
            if timeout.is_zero() {
                return Err(Error::config("TOOLGATE_REQUEST_TIMEOUT must be positive"));
            }
            config.limits.request_timeout = timeout;
        }

        if let Some(format) = get("TOOLGATE_LOG_FORMAT") {
            config.logging.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" | "text" | "plain" => LogFormat::Compact,
                _ => {
                    return Err(Error::config(format!(
                        "TOOLGATE_LOG_FORMAT must be 'json' or 'compact', got '{format}'"
                    )))
                }
            };
        }
        if let Some(filter) = get("RUST_LOG") {
            EnvFilter::try_new(&filter)
                .map_err(|e| Error::config(format!("RUST_LOG '{filter}': {e}")))?;
            config.logging.filter = filter;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_empty() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:3001");
        assert!(config.rest.base_url.is_none());
        assert!(config.graph.is_none());
        assert_eq!(config.limits.request_timeout, Duration::from_secs(30));
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_full_environment() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("MANIFEST_API_URL", "https://manifest.local/"),
            ("MANIFEST_API_KEY", "key"),
            ("MANIFEST_ORG_KEY", "org"),
            ("MANIFEST_ORG_ID", "42"),
            ("NEO4J_URI", "bolt://graph:7687"),
            ("NEO4J_USERNAME", "neo4j"),
            ("NEO4J_PASSWORD", "secret"),
            ("VICTORIA_LOGS_API_URL", "http://logs:9428/"),
            ("VICTORIA_METRICS_URL", "http://metrics:8428/"),
            ("TOOLGATE_REQUEST_TIMEOUT", "5s"),
            ("TOOLGATE_LOG_FORMAT", "JSON"),
            ("RUST_LOG", "info,toolgate=debug"),
        ]))
        .unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.rest.base_url.as_deref(), Some("https://manifest.local"));
        assert_eq!(config.rest.org_id.as_deref(), Some("42"));
        assert_eq!(config.graph.as_ref().unwrap().uri, "bolt://graph:7687");
        assert_eq!(
            config.observability_backends.metrics_url.as_deref(),
            Some("http://metrics:8428")
        );
        assert_eq!(
            config.observability_backends.logs_url.as_deref(),
            Some("http://logs:9428")
        );
        assert_eq!(config.limits.request_timeout, Duration::from_secs(5));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "info,toolgate=debug");
    }

    #[test]
    fn test_logs_url_alias() {
        let config = Config::from_lookup(lookup(&[("VICTORIA_LOGS_URL", "http://legacy:9428")])).unwrap();
        assert_eq!(
            config.observability_backends.logs_url.as_deref(),
            Some("http://legacy:9428")
        );

        let config = Config::from_lookup(lookup(&[
            ("VICTORIA_LOGS_API_URL", "http://primary:9428"),
            ("VICTORIA_LOGS_URL", "http://legacy:9428"),
        ]))
        .unwrap();
        assert_eq!(
            config.observability_backends.logs_url.as_deref(),
            Some("http://primary:9428")
        );
    }

    #[test]
    fn test_listen_addr_wins_over_port() {
        let config = Config::from_lookup(lookup(&[
            ("TOOLGATE_LISTEN_ADDR", "127.0.0.1:9000"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[("TOOLGATE_REQUEST_TIMEOUT", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[("TOOLGATE_REQUEST_TIMEOUT", "0s")])).is_err());
        assert!(Config::from_lookup(lookup(&[("NEO4J_URI", "bolt://x")])).is_err());
        assert!(Config::from_lookup(lookup(&[("TOOLGATE_LOG_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(lookup(&[
            ("MANIFEST_API_KEY", "topsecret"),
            ("NEO4J_URI", "bolt://x"),
            ("NEO4J_USERNAME", "neo4j"),
            ("NEO4J_PASSWORD", "hunter2"),
        ]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("topsecret"));
        assert!(!rendered.contains("hunter2"));
    }
}
