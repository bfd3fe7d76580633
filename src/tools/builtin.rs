//! The fixed tool catalog.
//!
//! Every name declared here must have exactly one binding in
//! [`crate::tools::bindings::builtin_bindings`]; the registry refuses to start
//! otherwise.

use serde_json::json;

use super::catalog::{ParamDef, ParamType, ToolCatalog, ToolEntry};
use crate::types::Result;

const RESOURCE_TYPES: &[&str] = &[
    "server",
    "virtual_machine",
    "container",
    "database",
    "load_balancer",
    "network",
    "application",
];
const INCIDENT_STATUSES: &[&str] = &["open", "acknowledged", "resolved", "closed"];
const SEVERITIES: &[&str] = &["critical", "high", "medium", "low"];

/// Declarations for every built-in tool, in discovery order.
pub fn builtin_entries() -> Vec<ToolEntry> {
    vec![
        ToolEntry::new(
            "search_resources",
            "Search the infrastructure inventory (servers, VMs, databases, applications). \
             Use this first to find resource IDs from names or keywords.",
            vec![
                ParamDef::new(
                    "query",
                    ParamType::optional(ParamType::String),
                    "Name, hostname or keyword to match",
                ),
                ParamDef::new(
                    "resource_type",
                    ParamType::optional(ParamType::one_of(RESOURCE_TYPES)),
                    "Restrict results to one resource type",
                ),
                ParamDef::new("limit", ParamType::PositiveInt, "Maximum number of results")
                    .with_default(json!(20)),
            ],
        ),
        ToolEntry::new(
            "get_resource",
            "Fetch full details of one inventory resource by ID.",
            vec![ParamDef::new(
                "resource_id",
                ParamType::String,
                "Resource ID from search_resources",
            )],
        ),
        ToolEntry::new(
            "get_resource_relationships",
            "List upstream and downstream dependencies of a resource as recorded in the inventory.",
            vec![ParamDef::new("resource_id", ParamType::String, "Resource ID")],
        ),
        ToolEntry::new(
            "search_incidents",
            "Search incident tickets by keyword, status or severity. \
             Use this to find incident IDs and recent outages.",
            vec![
                ParamDef::new(
                    "query",
                    ParamType::optional(ParamType::String),
                    "Keyword matched against title and description",
                ),
                ParamDef::new(
                    "status",
                    ParamType::optional(ParamType::one_of(INCIDENT_STATUSES)),
                    "Incident status filter",
                ),
                ParamDef::new(
                    "severity",
                    ParamType::optional(ParamType::one_of(SEVERITIES)),
                    "Incident severity filter",
                ),
                ParamDef::new("limit", ParamType::PositiveInt, "Maximum number of results")
                    .with_default(json!(20)),
            ],
        ),
        ToolEntry::new(
            "get_incident_by_id",
            "Fetch one incident ticket, including timeline and affected resources.",
            vec![ParamDef::new(
                "incident_id",
                ParamType::String,
                "Incident ID from search_incidents",
            )],
        ),
        ToolEntry::new(
            "search_changelogs",
            "Search change records (deployments, configuration changes) to correlate with incidents.",
            vec![
                ParamDef::new(
                    "query",
                    ParamType::optional(ParamType::String),
                    "Keyword matched against the change summary",
                ),
                ParamDef::new(
                    "resource_id",
                    ParamType::optional(ParamType::String),
                    "Only changes touching this resource",
                ),
                ParamDef::new("limit", ParamType::PositiveInt, "Maximum number of results")
                    .with_default(json!(20)),
            ],
        ),
        ToolEntry::new(
            "create_incident",
            "Open a new incident ticket.",
            vec![
                ParamDef::new("title", ParamType::String, "Short incident title"),
                ParamDef::new(
                    "description",
                    ParamType::optional(ParamType::String),
                    "Detailed description",
                ),
                ParamDef::new("severity", ParamType::one_of(SEVERITIES), "Incident severity")
                    .with_default(json!("medium")),
                ParamDef::new(
                    "resource_id",
                    ParamType::optional(ParamType::String),
                    "Affected resource ID",
                ),
            ],
        ),
        ToolEntry::new(
            "add_incident_comment",
            "Append a comment to an existing incident ticket.",
            vec![
                ParamDef::new("incident_id", ParamType::String, "Incident ID"),
                ParamDef::new("body", ParamType::String, "Comment text"),
            ],
        ),
        ToolEntry::new(
            "get_graph_nodes",
            "Run a Cypher query against the dependency graph database. \
             The query runs unmodified with full read/write access.",
            vec![ParamDef::new(
                "query",
                ParamType::String,
                "Cypher query, e.g. MATCH (s:Service)-[:DEPENDS_ON]->(d) RETURN s, d LIMIT 25",
            )],
        ),
        ToolEntry::new(
            "query_logs",
            "Search application and system logs with a LogsQL query.",
            vec![
                ParamDef::new(
                    "query",
                    ParamType::String,
                    "LogsQL query, e.g. _time:15m error service:checkout",
                ),
                ParamDef::new("limit", ParamType::PositiveInt, "Maximum number of log entries")
                    .with_default(json!(100)),
            ],
        ),
        ToolEntry::new(
            "query_metrics",
            "Run a PromQL/MetricsQL range query over time-series metrics.",
            vec![
                ParamDef::new(
                    "query",
                    ParamType::String,
                    "PromQL expression, e.g. rate(http_requests_total[5m])",
                ),
                ParamDef::new(
                    "start",
                    ParamType::optional(ParamType::String),
                    "Range start (RFC3339, unix seconds or relative like -1h)",
                ),
                ParamDef::new(
                    "end",
                    ParamType::optional(ParamType::String),
                    "Range end (RFC3339, unix seconds or relative)",
                ),
                ParamDef::new(
                    "step",
                    ParamType::optional(ParamType::String),
                    "Resolution step, e.g. 1m",
                ),
            ],
        ),
    ]
}

/// Build the catalog from [`builtin_entries`].
pub fn builtin_catalog() -> Result<ToolCatalog> {
    let mut catalog = ToolCatalog::new();
    for entry in builtin_entries() {
        catalog.register(entry)?;
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_builds() {
        let catalog = builtin_catalog().unwrap();
        assert_eq!(catalog.len(), builtin_entries().len());
        assert_eq!(catalog.list_names()[0], "search_resources");
    }

    #[test]
    fn test_every_tool_is_described() {
        for entry in builtin_entries() {
            assert!(!entry.description.is_empty(), "{} lacks a description", entry.name);
            for param in &entry.parameters {
                assert!(
                    !param.description.is_empty(),
                    "{}.{} lacks a description",
                    entry.name,
                    param.name
                );
            }
        }
    }

    #[test]
    fn test_planner_tool_names_are_exposed() {
        let catalog = builtin_catalog().unwrap();
        for name in [
            "search_incidents",
            "search_resources",
            "get_incident_by_id",
            "search_changelogs",
            "get_graph_nodes",
            "query_logs",
        ] {
            assert!(catalog.has_tool(name), "{name} missing from catalog");
        }
    }

    #[test]
    fn test_defaults_satisfy_their_own_types() {
        for entry in builtin_entries() {
            for param in &entry.parameters {
                if let Some(default) = &param.default {
                    assert!(
                        param.param_type.validate(default).is_ok(),
                        "{}.{} default does not match its type",
                        entry.name,
                        param.name
                    );
                }
            }
        }
    }
}
