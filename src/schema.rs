//! Compiled schema model and constraint interpreter.
//!
//! A schema file is compiled once, at load time, into a closed set of tagged
//! node kinds. The validator and the doc generator both read the same model,
//! so they cannot disagree on how a node's type or constraints are
//! interpreted. Constraints that don't apply to a node's declared type are
//! dropped during compilation.

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns true for JSON numbers with no fractional part.
pub(crate) fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
        }
        _ => false,
    }
}

/// Primitive JSON kinds a `type` declaration may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl Primitive {
    /// Parse a JSON Schema type name.
    ///
    /// Returns `None` for unknown names (caller should error).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Primitive::String),
            "number" => Some(Primitive::Number),
            "integer" => Some(Primitive::Integer),
            "boolean" => Some(Primitive::Boolean),
            "object" => Some(Primitive::Object),
            "array" => Some(Primitive::Array),
            "null" => Some(Primitive::Null),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Integer => "integer",
            Primitive::Boolean => "boolean",
            Primitive::Object => "object",
            Primitive::Array => "array",
            Primitive::Null => "null",
        }
    }

    /// Returns true if a JSON value is of this primitive kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Primitive::String => value.is_string(),
            Primitive::Number => value.is_number(),
            Primitive::Integer => is_integer(value),
            Primitive::Boolean => value.is_boolean(),
            Primitive::Object => value.is_object(),
            Primitive::Array => value.is_array(),
            Primitive::Null => value.is_null(),
        }
    }
}

/// A `pattern` constraint: the schema's regular expression text plus its
/// compiled form. Compilation failures are fatal at schema-load time.
#[derive(Debug, Clone)]
pub struct PatternConstraint {
    pub source: String,
    pub regex: Regex,
}

impl PartialEq for PatternConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Structural kind of a schema node, decided once at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Object {
        /// Property name to child schema, in schema-declared order.
        properties: Vec<(String, SchemaNode)>,
        /// Child property names that must be present.
        required: Vec<String>,
    },
    Array {
        items: Option<Box<SchemaNode>>,
    },
    String {
        pattern: Option<PatternConstraint>,
        min_length: Option<u64>,
        max_length: Option<u64>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Integer {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Boolean,
    Null,
    /// Closed set of allowed literal values. An `enum` declaration wins over
    /// any structural `type` on the same node.
    Enum { values: Vec<Value> },
    /// Union of primitive kinds (`"type": ["string", "null"]`).
    Union { members: Vec<Primitive> },
    /// No `type` declared: accepts any value.
    Any,
}

/// One compiled schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub description: Option<String>,
    pub kind: SchemaKind,
    pub examples: Vec<Value>,
    pub default: Option<Value>,
}

/// A single declared constraint.
///
/// `SchemaNode::constraints` emits these in canonical order so validation
/// reports and generated docs are deterministic across runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Enum(Vec<Value>),
    Pattern(PatternConstraint),
    MinLength(u64),
    MaxLength(u64),
    Minimum(f64),
    Maximum(f64),
}

impl SchemaNode {
    /// Compile a raw JSON schema document into the node model.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSchema` for non-object schema nodes,
    /// unknown type names, malformed `type` entries, and `pattern` values
    /// that are not valid regular expressions. These are configuration
    /// errors: reported once, before any record is checked.
    pub fn compile(raw: &Value) -> Result<Self, ConfigError> {
        compile_node(raw, "")
    }

    /// Declared type(s) for display; union members joined with `" | "`.
    pub fn type_label(&self) -> String {
        match &self.kind {
            SchemaKind::Object { .. } => "object".to_string(),
            SchemaKind::Array { .. } => "array".to_string(),
            SchemaKind::String { .. } => "string".to_string(),
            SchemaKind::Number { .. } => "number".to_string(),
            SchemaKind::Integer { .. } => "integer".to_string(),
            SchemaKind::Boolean => "boolean".to_string(),
            SchemaKind::Null => "null".to_string(),
            SchemaKind::Enum { .. } => "enum".to_string(),
            SchemaKind::Union { members } => members
                .iter()
                .map(|m| m.name())
                .collect::<Vec<_>>()
                .join(" | "),
            SchemaKind::Any => "any".to_string(),
        }
    }

    /// Child property names that must be present. Empty unless this is an
    /// object node declaring a `required` list.
    pub fn required_children(&self) -> &[String] {
        match &self.kind {
            SchemaKind::Object { required, .. } => required,
            _ => &[],
        }
    }

    /// Declared properties in schema order. Empty unless this is an object
    /// node.
    pub fn properties(&self) -> &[(String, SchemaNode)] {
        match &self.kind {
            SchemaKind::Object { properties, .. } => properties,
            _ => &[],
        }
    }

    /// Every declared constraint, in canonical order: enum, pattern,
    /// minLength, maxLength, minimum, maximum.
    pub fn constraints(&self) -> Vec<Constraint> {
        let mut out = Vec::new();
        match &self.kind {
            SchemaKind::Enum { values } => out.push(Constraint::Enum(values.clone())),
            SchemaKind::String {
                pattern,
                min_length,
                max_length,
            } => {
                if let Some(pattern) = pattern {
                    out.push(Constraint::Pattern(pattern.clone()));
                }
                if let Some(min) = min_length {
                    out.push(Constraint::MinLength(*min));
                }
                if let Some(max) = max_length {
                    out.push(Constraint::MaxLength(*max));
                }
            }
            SchemaKind::Number { minimum, maximum }
            | SchemaKind::Integer { minimum, maximum } => {
                if let Some(min) = minimum {
                    out.push(Constraint::Minimum(*min));
                }
                if let Some(max) = maximum {
                    out.push(Constraint::Maximum(*max));
                }
            }
            _ => {}
        }
        out
    }

    pub fn examples(&self) -> &[Value] {
        &self.examples
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

fn compile_node(raw: &Value, location: &str) -> Result<SchemaNode, ConfigError> {
    let obj = raw.as_object().ok_or_else(|| ConfigError::InvalidSchema {
        location: location.to_string(),
        message: format!("expected schema object, got {}", json_type_name(raw)),
    })?;

    let description = obj
        .get("description")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let examples = obj
        .get("examples")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let default = obj.get("default").cloned();

    let kind = compile_kind(obj, location)?;

    Ok(SchemaNode {
        description,
        kind,
        examples,
        default,
    })
}

fn compile_kind(obj: &Map<String, Value>, location: &str) -> Result<SchemaKind, ConfigError> {
    // An enum constrains the value exhaustively; structural constraints on
    // the same node have nothing left to check.
    if let Some(values) = obj.get("enum").and_then(|v| v.as_array()) {
        return Ok(SchemaKind::Enum {
            values: values.clone(),
        });
    }

    let declared = match obj.get("type") {
        None => return Ok(SchemaKind::Any),
        Some(Value::String(name)) => vec![parse_primitive(name, location)?],
        Some(Value::Array(names)) => {
            let mut members = Vec::with_capacity(names.len());
            for entry in names {
                let name = entry.as_str().ok_or_else(|| ConfigError::InvalidSchema {
                    location: format!("{location}/type"),
                    message: format!("expected type name string, got {}", json_type_name(entry)),
                })?;
                members.push(parse_primitive(name, location)?);
            }
            if members.is_empty() {
                return Err(ConfigError::InvalidSchema {
                    location: format!("{location}/type"),
                    message: "empty type union".to_string(),
                });
            }
            members
        }
        Some(other) => {
            return Err(ConfigError::InvalidSchema {
                location: format!("{location}/type"),
                message: format!("expected string or array, got {}", json_type_name(other)),
            });
        }
    };

    if declared.len() > 1 {
        return Ok(SchemaKind::Union { members: declared });
    }

    Ok(match declared[0] {
        Primitive::Object => {
            let mut properties = Vec::new();
            if let Some(props) = obj.get("properties").and_then(|v| v.as_object()) {
                for (name, child) in props {
                    let child_location = format!("{location}/properties/{name}");
                    properties.push((name.clone(), compile_node(child, &child_location)?));
                }
            }
            let required = obj
                .get("required")
                .and_then(|v| v.as_array())
                .map(|names| {
                    names
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            SchemaKind::Object {
                properties,
                required,
            }
        }
        Primitive::Array => {
            let items = match obj.get("items") {
                Some(child) => Some(Box::new(compile_node(
                    child,
                    &format!("{location}/items"),
                )?)),
                None => None,
            };
            SchemaKind::Array { items }
        }
        Primitive::String => SchemaKind::String {
            pattern: compile_pattern(obj, location)?,
            min_length: get_u64(obj, "minLength"),
            max_length: get_u64(obj, "maxLength"),
        },
        // Presence, not truthiness: a declared bound of 0 is a real bound.
        Primitive::Number => SchemaKind::Number {
            minimum: get_f64(obj, "minimum"),
            maximum: get_f64(obj, "maximum"),
        },
        Primitive::Integer => SchemaKind::Integer {
            minimum: get_f64(obj, "minimum"),
            maximum: get_f64(obj, "maximum"),
        },
        Primitive::Boolean => SchemaKind::Boolean,
        Primitive::Null => SchemaKind::Null,
    })
}

fn parse_primitive(name: &str, location: &str) -> Result<Primitive, ConfigError> {
    Primitive::parse(name).ok_or_else(|| ConfigError::InvalidSchema {
        location: format!("{location}/type"),
        message: format!("unknown type \"{name}\""),
    })
}

fn compile_pattern(
    obj: &Map<String, Value>,
    location: &str,
) -> Result<Option<PatternConstraint>, ConfigError> {
    let Some(source) = obj.get("pattern").and_then(|v| v.as_str()) else {
        return Ok(None);
    };
    let regex = Regex::new(source).map_err(|e| ConfigError::InvalidSchema {
        location: format!("{location}/pattern"),
        message: e.to_string(),
    })?;
    Ok(Some(PatternConstraint {
        source: source.to_string(),
        regex,
    }))
}

fn get_u64(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    obj.get(key).and_then(|v| v.as_u64())
}

fn get_f64(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(|v| v.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compile_object_with_nested_properties() {
        let schema = SchemaNode::compile(&json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "string" },
                "pricing": {
                    "type": "object",
                    "properties": {
                        "monthly_usd": { "type": "number" }
                    }
                }
            }
        }))
        .unwrap();

        assert_eq!(schema.required_children(), ["id".to_string()]);
        let props = schema.properties();
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].0, "id");
        assert_eq!(props[1].0, "pricing");
        assert_eq!(props[1].1.properties().len(), 1);
    }

    #[test]
    fn compile_preserves_property_order() {
        let schema = SchemaNode::compile(&json!({
            "type": "object",
            "properties": {
                "zebra": { "type": "string" },
                "alpha": { "type": "string" },
                "middle": { "type": "string" }
            }
        }))
        .unwrap();

        let names: Vec<_> = schema.properties().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["zebra", "alpha", "middle"]);
    }

    #[test]
    fn enum_wins_over_declared_type() {
        let schema = SchemaNode::compile(&json!({
            "type": "string",
            "enum": ["finance", "analytics", "other"]
        }))
        .unwrap();

        assert!(matches!(schema.kind, SchemaKind::Enum { .. }));
        assert_eq!(schema.type_label(), "enum");
    }

    #[test]
    fn union_type_label_joins_members() {
        let schema = SchemaNode::compile(&json!({ "type": ["string", "null"] })).unwrap();
        assert_eq!(schema.type_label(), "string | null");
        assert!(matches!(schema.kind, SchemaKind::Union { .. }));
    }

    #[test]
    fn missing_type_is_unconstrained() {
        let schema = SchemaNode::compile(&json!({ "description": "anything" })).unwrap();
        assert!(matches!(schema.kind, SchemaKind::Any));
        assert_eq!(schema.type_label(), "any");
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let result = SchemaNode::compile(&json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "pattern": "[unclosed" }
            }
        }));
        match result {
            Err(ConfigError::InvalidSchema { location, .. }) => {
                assert_eq!(location, "/properties/id/pattern");
            }
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_name_is_config_error() {
        let result = SchemaNode::compile(&json!({ "type": "text" }));
        assert!(matches!(result, Err(ConfigError::InvalidSchema { .. })));
    }

    #[test]
    fn non_object_schema_node_is_config_error() {
        let result = SchemaNode::compile(&json!("string"));
        assert!(matches!(result, Err(ConfigError::InvalidSchema { .. })));
    }

    #[test]
    fn zero_is_a_real_bound() {
        let schema = SchemaNode::compile(&json!({ "type": "number", "minimum": 0 })).unwrap();
        assert_eq!(schema.constraints(), vec![Constraint::Minimum(0.0)]);
    }

    #[test]
    fn constraints_in_canonical_order() {
        let schema = SchemaNode::compile(&json!({
            "type": "string",
            "maxLength": 64,
            "pattern": "^[a-z]+$",
            "minLength": 3
        }))
        .unwrap();

        let kinds: Vec<_> = schema
            .constraints()
            .into_iter()
            .map(|c| match c {
                Constraint::Pattern(_) => "pattern",
                Constraint::MinLength(_) => "minLength",
                Constraint::MaxLength(_) => "maxLength",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["pattern", "minLength", "maxLength"]);
    }

    #[test]
    fn inapplicable_constraints_are_dropped() {
        // A pattern on a number node is meaningless and never reaches the
        // validator or the doc generator.
        let schema =
            SchemaNode::compile(&json!({ "type": "number", "pattern": "^[a-z]+$" })).unwrap();
        assert!(schema.constraints().is_empty());
    }

    #[test]
    fn examples_and_default_round_trip() {
        let schema = SchemaNode::compile(&json!({
            "type": "string",
            "examples": ["market-pulse", "risk-radar"],
            "default": "other"
        }))
        .unwrap();

        assert_eq!(schema.examples().len(), 2);
        assert_eq!(schema.default_value(), Some(&json!("other")));
    }

    #[test]
    fn primitive_matches_integers() {
        assert!(Primitive::Integer.matches(&json!(3)));
        assert!(Primitive::Integer.matches(&json!(3.0)));
        assert!(!Primitive::Integer.matches(&json!(3.5)));
        assert!(Primitive::Number.matches(&json!(3.5)));
        assert!(!Primitive::Integer.matches(&json!("3")));
    }
}
