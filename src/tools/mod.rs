//! Tool infrastructure — catalog, bindings, dispatch.
//!
//! The catalog is the source of truth for discovery, the bindings for
//! execution. The registry joins them and refuses to start if they disagree.

pub mod bindings;
pub mod builtin;
pub mod catalog;
pub mod registry;

pub use bindings::ToolAction;
pub use builtin::builtin_catalog;
pub use catalog::{ParamDef, ParamType, ToolCatalog, ToolEntry};
pub use registry::ToolRegistry;
