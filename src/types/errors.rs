//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation. Backend
//! failures are never represented here: adapters turn them into failure
//! envelopes. These variants cover client mistakes, startup problems and
//! internal faults.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the gateway.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request (map to HTTP 400).
    #[error("validation error: {0}")]
    Validation(String),

    /// Tool name is not registered (map to HTTP 400).
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Parameters violate the tool's declared schema (map to HTTP 400).
    #[error("invalid parameters for {tool}: {}", .violations.join("; "))]
    InvalidParameters {
        tool: String,
        violations: Vec<String>,
    },

    /// Catalog and action bindings disagree on the set of tool names.
    #[error(
        "catalog drift: without action [{}], without catalog entry [{}]",
        .missing_action.join(", "),
        .missing_entry.join(", ")
    )]
    CatalogDrift {
        missing_action: Vec<String>,
        missing_entry: Vec<String>,
    },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal errors (map to HTTP 500).
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by the caller rather than the gateway.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::UnknownTool(_) | Error::InvalidParameters { .. }
        )
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
