//! Core types for the gateway.
//!
//! - **Errors**: application error types with thiserror derives
//! - **Config**: configuration structures for the server and every backend

mod config;
mod errors;

pub use config::{
    CallLimits, Config, GraphConfig, LogFormat, LoggingConfig, QueryBackendsConfig, RestConfig,
    ServerConfig,
};
pub use errors::{Error, Result};
