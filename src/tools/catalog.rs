//! Tool catalog — typed metadata, parameter validation, prompt generation.
//!
//! The catalog is the source of truth for discovery. It owns tool *metadata*
//! only; the action each tool triggers lives in [`crate::tools::bindings`].

use crate::types::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

// =============================================================================
// Parameter types
// =============================================================================

/// Parameter type for tool inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Int,
    /// Integer of at least 1, e.g. result limits.
    PositiveInt,
    Bool,
    Enum(Vec<String>),
    Optional(Box<ParamType>),
}

impl ParamType {
    /// Shorthand for an enumerated string parameter.
    pub fn one_of(values: &[&str]) -> Self {
        ParamType::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    /// Shorthand for an optional parameter of `inner` type.
    pub fn optional(inner: ParamType) -> Self {
        ParamType::Optional(Box::new(inner))
    }

    /// Validate a JSON value against this parameter type.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            ParamType::String => {
                if value.is_string() {
                    Ok(())
                } else {
                    Err(format!("expected string, got {}", value_type_name(value)))
                }
            }
            ParamType::Int => {
                if value.is_i64() || value.is_u64() {
                    Ok(())
                } else {
                    Err(format!("expected integer, got {}", value_type_name(value)))
                }
            }
            ParamType::PositiveInt => match value.as_i64() {
                Some(n) if n >= 1 => Ok(()),
                Some(n) => Err(format!("expected positive integer, got {n}")),
                None if value.is_u64() => Ok(()),
                None => Err(format!("expected integer, got {}", value_type_name(value))),
            },
            ParamType::Bool => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("expected boolean, got {}", value_type_name(value)))
                }
            }
            ParamType::Enum(variants) => match value.as_str() {
                Some(s) if variants.iter().any(|v| v == s) => Ok(()),
                Some(s) => Err(format!(
                    "invalid enum value '{}', expected one of: {}",
                    s,
                    variants.join(", ")
                )),
                None => Err(format!(
                    "expected string for enum, got {}",
                    value_type_name(value)
                )),
            },
            ParamType::Optional(inner) => {
                if value.is_null() {
                    Ok(())
                } else {
                    inner.validate(value)
                }
            }
        }
    }

    /// Human-readable type name for prompt generation.
    pub fn display_name(&self) -> String {
        match self {
            ParamType::String => "string".to_string(),
            ParamType::Int => "integer".to_string(),
            ParamType::PositiveInt => "positive integer".to_string(),
            ParamType::Bool => "boolean".to_string(),
            ParamType::Enum(variants) => format!("enum({})", variants.join("|")),
            ParamType::Optional(inner) => inner.display_name(),
        }
    }

    /// JSON-Schema fragment describing this type.
    fn schema_fragment(&self) -> Map<String, Value> {
        let mut schema = Map::new();
        match self {
            ParamType::String => {
                schema.insert("type".into(), json!("string"));
            }
            ParamType::Int => {
                schema.insert("type".into(), json!("integer"));
            }
            ParamType::PositiveInt => {
                schema.insert("type".into(), json!("integer"));
                schema.insert("minimum".into(), json!(1));
            }
            ParamType::Bool => {
                schema.insert("type".into(), json!("boolean"));
            }
            ParamType::Enum(variants) => {
                schema.insert("type".into(), json!("string"));
                schema.insert("enum".into(), json!(variants));
            }
            ParamType::Optional(inner) => return inner.schema_fragment(),
        }
        schema
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Parameter definition
// =============================================================================

/// A single parameter definition for a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamDef {
    pub fn new(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none() && !matches!(self.param_type, ParamType::Optional(_))
    }
}

// =============================================================================
// Tool entry
// =============================================================================

/// Complete tool metadata entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolEntry {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamDef>,
}

impl ToolEntry {
    pub fn new(name: &str, description: &str, parameters: Vec<ParamDef>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    /// JSON-Schema object describing the tool's parameters.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            let mut fragment = param.param_type.schema_fragment();
            fragment.insert("description".into(), json!(param.description));
            if let Some(default) = &param.default {
                fragment.insert("default".into(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(fragment));
            if param.is_required() {
                required.push(param.name.clone());
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Discovery view: `{name, description, inputSchema}`.
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }

    /// Render this tool as a prompt section.
    ///
    /// ```text
    /// ### tool_name
    /// Description: ...
    /// Allowed Parameters:
    ///   - param [type] (REQUIRED): description
    /// ```
    pub fn to_prompt_section(&self) -> String {
        let mut lines = vec![
            format!("### {}", self.name),
            format!("Description: {}", self.description),
        ];
        if self.parameters.is_empty() {
            lines.push("Parameters: None".to_string());
        } else {
            lines.push("Allowed Parameters:".to_string());
            for p in &self.parameters {
                let marker = if p.is_required() { " (REQUIRED)" } else { "" };
                lines.push(format!(
                    "  - {} [{}]{}: {}",
                    p.name,
                    p.param_type.display_name(),
                    marker,
                    p.description
                ));
            }
        }
        lines.join("\n")
    }
}

// =============================================================================
// Tool catalog
// =============================================================================

/// In-memory tool catalog, iterated in declaration order.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    entries: Vec<ToolEntry>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool entry. Names are unique; re-registration is rejected.
    pub fn register(&mut self, entry: ToolEntry) -> Result<()> {
        if entry.name.is_empty() {
            return Err(Error::validation("Tool name cannot be empty"));
        }
        if self.index.contains_key(&entry.name) {
            return Err(Error::validation(format!(
                "Tool already registered: {}",
                entry.name
            )));
        }
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Get a tool entry by name.
    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Check if a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// List all tool names, in declaration order.
    pub fn list_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// List all tool entries, in declaration order.
    pub fn list_entries(&self) -> Vec<&ToolEntry> {
        self.entries.iter().collect()
    }

    /// Validate parameters against a tool's parameter definitions.
    ///
    /// Returns a list of validation errors (empty = valid).
    pub fn validate_params(&self, name: &str, params: &Value) -> Result<Vec<String>> {
        let entry = self
            .get(name)
            .ok_or_else(|| Error::unknown_tool(name))?;

        let param_map = params
            .as_object()
            .ok_or_else(|| Error::validation("Parameters must be a JSON object"))?;

        let mut errors = Vec::new();

        for param_def in &entry.parameters {
            if param_def.is_required() && !param_map.contains_key(&param_def.name) {
                errors.push(format!("Missing required parameter: {}", param_def.name));
            }
        }

        let known_names: HashMap<&str, &ParamDef> = entry
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p))
            .collect();

        for (key, value) in param_map {
            if let Some(param_def) = known_names.get(key.as_str()) {
                if let Err(e) = param_def.param_type.validate(value) {
                    errors.push(format!("Parameter '{}': {}", key, e));
                }
            } else {
                errors.push(format!("Unknown parameter: {}", key));
            }
        }

        Ok(errors)
    }

    /// Fill in default values for missing optional parameters.
    pub fn fill_defaults(&self, name: &str, params: &mut Value) -> Result<()> {
        let entry = self
            .get(name)
            .ok_or_else(|| Error::unknown_tool(name))?;

        if let Some(map) = params.as_object_mut() {
            for param_def in &entry.parameters {
                if !map.contains_key(&param_def.name) {
                    if let Some(default) = &param_def.default {
                        map.insert(param_def.name.clone(), default.clone());
                    }
                }
            }
        }

        Ok(())
    }

    /// Generate formatted prompt text for LLM planners.
    ///
    /// If `allowed_tools` is Some, only include those tools.
    pub fn generate_prompt(&self, allowed_tools: Option<&[String]>) -> String {
        let entries: Vec<&ToolEntry> = match allowed_tools {
            Some(allowed) => allowed.iter().filter_map(|name| self.get(name)).collect(),
            None => self.list_entries(),
        };

        if entries.is_empty() {
            return "No tools available.".to_string();
        }

        let mut sections = Vec::with_capacity(entries.len() + 1);
        sections.push("AVAILABLE TOOLS AND PARAMETERS:".to_string());
        for entry in entries {
            sections.push(entry.to_prompt_section());
        }
        sections.join("\n\n")
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
