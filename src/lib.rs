//! # Toolgate - Tool-Invocation Gateway
//!
//! Exposes a fixed catalog of named tools that an agent can discover and
//! invoke by name with structured parameters:
//! - Typed tool catalog with parameter validation and prompt generation
//! - Static name → action bindings checked against the catalog at startup
//! - Backend adapters for a REST inventory API, a graph database, and log
//!   and metrics query services
//! - Uniform `{success: false, error, status?}` envelope for backend failures
//!
//! ## Architecture
//!
//! ```text
//!   caller ─HTTP─▶ server ─▶ ToolRegistry::dispatch(name, params)
//!                                 │  validate + fill defaults
//!                                 ▼
//!                            ToolAction ─▶ RestBackend | GraphBackend
//!                                          LogsBackend | MetricsBackend
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod backends;
pub mod server;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use types::{Config, Error, Result};
