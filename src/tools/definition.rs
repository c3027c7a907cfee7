//! Tool definitions: typed parameter metadata, argument validation, and the
//! MCP `inputSchema` rendering.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// =============================================================================
// Parameter types
// =============================================================================

/// Parameter type for tool inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Enum(Vec<String>),
}

impl ParamType {
    /// Validate a JSON value against this parameter type.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            ParamType::String => {
                if value.is_string() {
                    Ok(())
                } else {
                    Err(format!("expected string, got {}", value_type_name(value)))
                }
            }
            ParamType::Enum(variants) => {
                let s = value.as_str().ok_or_else(|| {
                    format!("expected string for enum, got {}", value_type_name(value))
                })?;
                if variants.iter().any(|v| v.eq_ignore_ascii_case(s.trim())) {
                    Ok(())
                } else {
                    Err(format!(
                        "invalid enum value '{}', expected one of: {}",
                        s,
                        variants.join(", ")
                    ))
                }
            }
        }
    }

    /// JSON Schema fragment for this type.
    fn schema(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("type".to_string(), json!("string"));
        if let ParamType::Enum(variants) = self {
            map.insert("enum".to_string(), json!(variants));
        }
        map
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
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamDef {
    /// Required string parameter.
    pub fn required(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type: ParamType::String,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    /// Optional string parameter with a default.
    pub fn optional(name: &str, description: &str, default: Value) -> Self {
        Self {
            name: name.to_string(),
            param_type: ParamType::String,
            description: description.to_string(),
            required: false,
            default: Some(default),
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }
}

// =============================================================================
// Tool definition
// =============================================================================

/// Complete, immutable description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamDef>,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, parameters: Vec<ParamDef>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    /// JSON Schema object advertised as `inputSchema`.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = param.param_type.schema();
            prop.insert("description".to_string(), json!(param.description));
            if let Some(default) = &param.default {
                prop.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(prop));
            if param.required {
                required.push(param.name.clone());
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// MCP wire shape: `{name, description, inputSchema}`.
    pub fn to_mcp_value(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }

    /// Validate call arguments against the declared parameters.
    ///
    /// Returns a list of validation errors (empty = valid). Unknown keys are
    /// tolerated: older clients send `user_role` alongside `role`.
    pub fn validate_arguments(&self, args: &Map<String, Value>) -> Vec<String> {
        let mut errors = Vec::new();

        for param in &self.parameters {
            match args.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    errors.push(format!("Missing required parameter: {}", param.name));
                }
                Some(value) if !value.is_null() => {
                    if let Err(e) = param.param_type.validate(value) {
                        errors.push(format!("Parameter '{}': {}", param.name, e));
                    }
                }
                _ => {}
            }
        }

        errors
    }

    /// Fill in default values for missing optional parameters.
    pub fn fill_defaults(&self, args: &mut Map<String, Value>) {
        for param in &self.parameters {
            if !args.contains_key(&param.name) {
                if let Some(default) = &param.default {
                    args.insert(param.name.clone(), default.clone());
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
