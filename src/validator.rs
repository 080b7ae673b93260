//! Record validation against a compiled schema.
//!
//! Validation is exhaustive: every violation in a record is collected in one
//! pass, never just the first. Batches isolate per-record failures and always
//! run to completion so the aggregate summary covers every source.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ConfigError;
use crate::loader::{collect_record_files, load_json};
use crate::schema::{json_type_name, Constraint, SchemaKind, SchemaNode};

/// The constraint class a field error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintKind {
    Parse,
    Required,
    Type,
    Enum,
    Pattern,
    MinLength,
    MaxLength,
    Minimum,
    Maximum,
    UnknownField,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Parse => "parse",
            ConstraintKind::Required => "required",
            ConstraintKind::Type => "type",
            ConstraintKind::Enum => "enum",
            ConstraintKind::Pattern => "pattern",
            ConstraintKind::MinLength => "minLength",
            ConstraintKind::MaxLength => "maxLength",
            ConstraintKind::Minimum => "minimum",
            ConstraintKind::Maximum => "maximum",
            ConstraintKind::UnknownField => "unknownField",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint-specific payload attached to a field error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    #[serde(rename_all = "camelCase")]
    AllowedValues { allowed_values: Vec<Value> },
    Pattern { pattern: String },
    Limit { limit: Value },
    Expected { expected: String, actual: String },
}

/// One constraint violation at a specific location in a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Slash-delimited path into the record, with positional segments for
    /// array elements (`capabilities/0/name`). Empty for the whole document.
    pub path: String,
    pub kind: ConstraintKind,
    /// Human-readable description.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Validation outcome for one record. Zero errors ⇔ valid.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

/// Options controlling validation policy.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// When true, record properties not declared in the schema are errors.
    /// Off by default: schemas define a permissive, additive contract.
    pub deny_unknown: bool,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set unknown-field rejection.
    pub fn deny_unknown(mut self, deny: bool) -> Self {
        self.deny_unknown = deny;
        self
    }
}

/// Validate a parsed record against a compiled schema.
///
/// Pure: walks the record in lock-step with the schema and collects every
/// violation. A value can fail several constraints and yields one error per
/// failed constraint.
pub fn validate(schema: &SchemaNode, record: &Value, options: &ValidateOptions) -> ValidationResult {
    let mut errors = Vec::new();
    check_node(schema, record, "", options, &mut errors);
    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}/{segment}")
    }
}

fn type_error(path: &str, expected: &str, value: &Value) -> FieldError {
    let actual = json_type_name(value);
    FieldError {
        path: path.to_string(),
        kind: ConstraintKind::Type,
        message: format!("expected {expected}, got {actual}"),
        details: Some(ErrorDetails::Expected {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
    }
}

fn check_node(
    node: &SchemaNode,
    value: &Value,
    path: &str,
    options: &ValidateOptions,
    errors: &mut Vec<FieldError>,
) {
    match &node.kind {
        SchemaKind::Object {
            properties,
            required,
        } => {
            let Some(map) = value.as_object() else {
                errors.push(type_error(path, "object", value));
                return;
            };
            // A missing required field never stops sibling or nested checks.
            for name in required {
                if !map.contains_key(name) {
                    errors.push(FieldError {
                        path: join_path(path, name),
                        kind: ConstraintKind::Required,
                        message: format!("missing required field \"{name}\""),
                        details: None,
                    });
                }
            }
            for (name, child) in properties {
                if let Some(present) = map.get(name) {
                    check_node(child, present, &join_path(path, name), options, errors);
                }
            }
            if options.deny_unknown {
                for key in map.keys() {
                    if !properties.iter().any(|(name, _)| name == key) {
                        errors.push(FieldError {
                            path: join_path(path, key),
                            kind: ConstraintKind::UnknownField,
                            message: format!("unknown field \"{key}\""),
                            details: None,
                        });
                    }
                }
            }
        }
        SchemaKind::Array { items } => {
            let Some(elements) = value.as_array() else {
                errors.push(type_error(path, "array", value));
                return;
            };
            if let Some(items) = items {
                for (index, element) in elements.iter().enumerate() {
                    let element_path = join_path(path, &index.to_string());
                    check_node(items, element, &element_path, options, errors);
                }
            }
        }
        SchemaKind::String { .. } => {
            if !value.is_string() {
                errors.push(type_error(path, "string", value));
                return;
            }
            apply_constraints(node, value, path, errors);
        }
        SchemaKind::Number { .. } => {
            if !value.is_number() {
                errors.push(type_error(path, "number", value));
                return;
            }
            apply_constraints(node, value, path, errors);
        }
        SchemaKind::Integer { .. } => {
            if !crate::schema::is_integer(value) {
                errors.push(type_error(path, "integer", value));
                return;
            }
            apply_constraints(node, value, path, errors);
        }
        SchemaKind::Boolean => {
            if !value.is_boolean() {
                errors.push(type_error(path, "boolean", value));
            }
        }
        SchemaKind::Null => {
            if !value.is_null() {
                errors.push(type_error(path, "null", value));
            }
        }
        SchemaKind::Enum { .. } => apply_constraints(node, value, path, errors),
        SchemaKind::Union { members } => {
            if !members.iter().any(|member| member.matches(value)) {
                let expected = members
                    .iter()
                    .map(|m| m.name())
                    .collect::<Vec<_>>()
                    .join(" | ");
                errors.push(type_error(path, &expected, value));
            }
        }
        SchemaKind::Any => {}
    }
}

/// Apply the node's declared constraints to a type-checked value, in
/// canonical order. Constraints that don't apply to the value's kind are
/// skipped.
fn apply_constraints(node: &SchemaNode, value: &Value, path: &str, errors: &mut Vec<FieldError>) {
    for constraint in node.constraints() {
        match constraint {
            Constraint::Enum(values) => {
                if !values.contains(value) {
                    errors.push(FieldError {
                        path: path.to_string(),
                        kind: ConstraintKind::Enum,
                        message: format!("{value} is not one of the allowed values"),
                        details: Some(ErrorDetails::AllowedValues {
                            allowed_values: values,
                        }),
                    });
                }
            }
            Constraint::Pattern(pattern) => {
                if let Some(s) = value.as_str() {
                    if !pattern.regex.is_match(s) {
                        errors.push(FieldError {
                            path: path.to_string(),
                            kind: ConstraintKind::Pattern,
                            message: format!("{value} does not match pattern {}", pattern.source),
                            details: Some(ErrorDetails::Pattern {
                                pattern: pattern.source.clone(),
                            }),
                        });
                    }
                }
            }
            Constraint::MinLength(min) => {
                if let Some(s) = value.as_str() {
                    let len = s.chars().count() as u64;
                    if len < min {
                        errors.push(FieldError {
                            path: path.to_string(),
                            kind: ConstraintKind::MinLength,
                            message: format!("length {len} is less than minimum length {min}"),
                            details: Some(ErrorDetails::Limit { limit: json!(min) }),
                        });
                    }
                }
            }
            Constraint::MaxLength(max) => {
                if let Some(s) = value.as_str() {
                    let len = s.chars().count() as u64;
                    if len > max {
                        errors.push(FieldError {
                            path: path.to_string(),
                            kind: ConstraintKind::MaxLength,
                            message: format!("length {len} exceeds maximum length {max}"),
                            details: Some(ErrorDetails::Limit { limit: json!(max) }),
                        });
                    }
                }
            }
            Constraint::Minimum(min) => {
                if let Some(n) = value.as_f64() {
                    if n < min {
                        errors.push(FieldError {
                            path: path.to_string(),
                            kind: ConstraintKind::Minimum,
                            message: format!("{n} is less than minimum {min}"),
                            details: Some(ErrorDetails::Limit { limit: json!(min) }),
                        });
                    }
                }
            }
            Constraint::Maximum(max) => {
                if let Some(n) = value.as_f64() {
                    if n > max {
                        errors.push(FieldError {
                            path: path.to_string(),
                            kind: ConstraintKind::Maximum,
                            message: format!("{n} exceeds maximum {max}"),
                            details: Some(ErrorDetails::Limit { limit: json!(max) }),
                        });
                    }
                }
            }
        }
    }
}

/// Pass/fail status of one record in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Passed,
    Failed,
}

/// Validation outcome for one named record source.
#[derive(Debug, Clone, Serialize)]
pub struct RecordResult {
    /// Human-readable label: the source file's base name.
    pub name: String,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl RecordResult {
    pub fn passed(&self) -> bool {
        self.status == RecordStatus::Passed
    }
}

/// Aggregate outcome of validating a batch of record files.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub records_checked: usize,
    pub passed: usize,
    pub failed: usize,
    /// Total field errors across all failed records.
    pub errors: usize,
    pub results: Vec<RecordResult>,
}

impl BatchReport {
    /// Returns true if every record passed.
    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }

    fn from_results(results: Vec<RecordResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        let errors = results.iter().map(|r| r.errors.len()).sum();
        BatchReport {
            records_checked: results.len(),
            passed,
            failed: results.len() - passed,
            errors,
            results,
        }
    }
}

/// Validate a single record file, isolating read and parse failures.
///
/// A record that cannot be read or parsed fails with one `parse` field error
/// at the document root; it never aborts a batch.
pub fn validate_file(schema: &SchemaNode, file: &Path, options: &ValidateOptions) -> RecordResult {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let record = match load_json(file) {
        Ok(value) => value,
        Err(e) => {
            return RecordResult {
                name,
                status: RecordStatus::Failed,
                errors: vec![FieldError {
                    path: String::new(),
                    kind: ConstraintKind::Parse,
                    message: e.to_string(),
                    details: None,
                }],
            };
        }
    };

    let result = validate(schema, &record, options);
    RecordResult {
        name,
        status: if result.valid {
            RecordStatus::Passed
        } else {
            RecordStatus::Failed
        },
        errors: result.errors,
    }
}

/// Validate every `.json` record in a directory against one schema.
///
/// The schema file is excluded by `exclude` file name. Every source is
/// processed regardless of earlier failures; the report covers the full set.
///
/// # Errors
///
/// Returns `ConfigError` only for the directory itself; per-record failures
/// land in the report.
pub fn validate_dir(
    schema: &SchemaNode,
    dir: &Path,
    exclude: Option<&OsStr>,
    options: &ValidateOptions,
) -> Result<BatchReport, ConfigError> {
    let files = collect_record_files(dir, exclude)?;
    let results = files
        .iter()
        .map(|file| validate_file(schema, file, options))
        .collect();
    Ok(BatchReport::from_results(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn compile(schema: Value) -> SchemaNode {
        SchemaNode::compile(&schema).unwrap()
    }

    fn opts() -> ValidateOptions {
        ValidateOptions::default()
    }

    #[test]
    fn conforming_record_is_valid() {
        let schema = compile(json!({
            "type": "object",
            "required": ["id", "category"],
            "properties": {
                "id": { "type": "string", "pattern": "^[a-z0-9]+(-[a-z0-9]+)*$" },
                "category": { "enum": ["finance", "analytics", "other"] }
            }
        }));
        let record = json!({ "id": "my-plugin", "category": "finance" });

        let result = validate(&schema, &record, &opts());
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn missing_required_field() {
        let schema = compile(json!({
            "type": "object",
            "required": ["id", "name"],
            "properties": {
                "id": { "type": "string" },
                "name": { "type": "string" }
            }
        }));

        let result = validate(&schema, &json!({ "id": "x" }), &opts());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ConstraintKind::Required);
        assert_eq!(result.errors[0].path, "name");
    }

    #[test]
    fn missing_required_does_not_stop_siblings() {
        let schema = compile(json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "string" },
                "priority": { "type": "integer" }
            }
        }));

        let result = validate(&schema, &json!({ "priority": "high" }), &opts());
        let kinds: Vec<_> = result.errors.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [ConstraintKind::Required, ConstraintKind::Type]);
    }

    #[test]
    fn pattern_failure_carries_pattern_text() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "pattern": "^[a-z0-9]+(-[a-z0-9]+)*$" }
            }
        }));

        let result = validate(&schema, &json!({ "id": "My_Plugin" }), &opts());
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.path, "id");
        assert_eq!(error.kind, ConstraintKind::Pattern);
        assert_eq!(
            error.details,
            Some(ErrorDetails::Pattern {
                pattern: "^[a-z0-9]+(-[a-z0-9]+)*$".to_string()
            })
        );
    }

    #[test]
    fn enum_failure_carries_allowed_values() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "category": { "enum": ["finance", "analytics", "other"] }
            }
        }));

        let result = validate(&schema, &json!({ "category": "sports" }), &opts());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ConstraintKind::Enum);
        assert_eq!(
            result.errors[0].details,
            Some(ErrorDetails::AllowedValues {
                allowed_values: vec![json!("finance"), json!("analytics"), json!("other")]
            })
        );
    }

    #[test]
    fn one_value_can_fail_multiple_constraints() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "minLength": 5, "pattern": "^[a-z]+$" }
            }
        }));

        // "AB" is both too short and not lowercase: two distinct errors, in
        // canonical order (pattern before minLength).
        let result = validate(&schema, &json!({ "id": "AB" }), &opts());
        let kinds: Vec<_> = result.errors.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [ConstraintKind::Pattern, ConstraintKind::MinLength]);
    }

    #[test]
    fn array_elements_get_positional_paths() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "capabilities": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["name"],
                        "properties": { "name": { "type": "string" } }
                    }
                }
            }
        }));

        let record = json!({ "capabilities": [ { "name": "feed" }, {} ] });
        let result = validate(&schema, &record, &opts());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "capabilities/1/name");
        assert_eq!(result.errors[0].kind, ConstraintKind::Required);
    }

    #[test]
    fn nested_object_paths() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "pricing": {
                    "type": "object",
                    "properties": {
                        "monthly_usd": { "type": "number", "minimum": 0 }
                    }
                }
            }
        }));

        let result = validate(&schema, &json!({ "pricing": { "monthly_usd": -5 } }), &opts());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "pricing/monthly_usd");
        assert_eq!(result.errors[0].kind, ConstraintKind::Minimum);
    }

    #[test]
    fn zero_minimum_is_enforced() {
        let schema = compile(json!({
            "type": "object",
            "properties": { "priority": { "type": "integer", "minimum": 0 } }
        }));

        let result = validate(&schema, &json!({ "priority": -1 }), &opts());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ConstraintKind::Minimum);

        let result = validate(&schema, &json!({ "priority": 0 }), &opts());
        assert!(result.valid);
    }

    #[test]
    fn unknown_fields_permitted_by_default() {
        let schema = compile(json!({
            "type": "object",
            "properties": { "id": { "type": "string" } }
        }));

        let record = json!({ "id": "x", "extra": true });
        assert!(validate(&schema, &record, &opts()).valid);

        let strict = ValidateOptions::new().deny_unknown(true);
        let result = validate(&schema, &record, &strict);
        assert!(!result.valid);
        assert_eq!(result.errors[0].kind, ConstraintKind::UnknownField);
        assert_eq!(result.errors[0].path, "extra");
    }

    #[test]
    fn union_accepts_any_member() {
        let schema = compile(json!({
            "type": "object",
            "properties": { "homepage": { "type": ["string", "null"] } }
        }));

        assert!(validate(&schema, &json!({ "homepage": "https://x.io" }), &opts()).valid);
        assert!(validate(&schema, &json!({ "homepage": null }), &opts()).valid);

        let result = validate(&schema, &json!({ "homepage": 7 }), &opts());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ConstraintKind::Type);
        assert!(result.errors[0].message.contains("string | null"));
    }

    #[test]
    fn type_mismatch_stops_descent_not_siblings() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "pricing": {
                    "type": "object",
                    "required": ["model"],
                    "properties": { "model": { "type": "string" } }
                },
                "name": { "type": "string" }
            }
        }));

        // pricing is the wrong type: one type error, no phantom "required"
        // errors underneath it, and name is still checked.
        let record = json!({ "pricing": "free", "name": 3 });
        let result = validate(&schema, &record, &opts());
        let kinds: Vec<_> = result.errors.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [ConstraintKind::Type, ConstraintKind::Type]);
    }

    #[test]
    fn field_error_serializes_camel_case() {
        let schema = compile(json!({
            "type": "object",
            "properties": {
                "category": { "enum": ["finance"] },
                "id": { "type": "string", "minLength": 3 }
            }
        }));

        let result = validate(&schema, &json!({ "category": "x", "id": "a" }), &opts());
        let serialized = serde_json::to_string(&result).unwrap();
        assert!(serialized.contains(r#""kind":"enum""#));
        assert!(serialized.contains(r#""allowedValues":["finance"]"#));
        assert!(serialized.contains(r#""kind":"minLength""#));
    }

    #[test]
    fn batch_isolates_unparsable_record() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"id": "alpha"}"#).unwrap();
        std::fs::write(dir.path().join("b.json"), "{ not json }").unwrap();
        std::fs::write(dir.path().join("c.json"), r#"{"id": "charlie"}"#).unwrap();

        let schema = compile(json!({
            "type": "object",
            "required": ["id"],
            "properties": { "id": { "type": "string" } }
        }));

        let report = validate_dir(&schema, dir.path(), None, &opts()).unwrap();
        assert_eq!(report.records_checked, 3);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.is_ok());

        let failed = &report.results[1];
        assert_eq!(failed.name, "b.json");
        assert_eq!(failed.errors.len(), 1);
        assert_eq!(failed.errors[0].kind, ConstraintKind::Parse);
        assert_eq!(failed.errors[0].path, "");
    }

    #[test]
    fn batch_excludes_schema_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("schema.json"),
            r#"{"type": "object", "required": ["id"]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("pack.json"), r#"{"id": "x"}"#).unwrap();

        let schema = compile(json!({
            "type": "object",
            "required": ["id"],
            "properties": { "id": { "type": "string" } }
        }));

        let report = validate_dir(
            &schema,
            dir.path(),
            Some(OsStr::new("schema.json")),
            &opts(),
        )
        .unwrap();
        assert_eq!(report.records_checked, 1);
        assert!(report.is_ok());
    }

    #[test]
    fn field_error_display() {
        let error = FieldError {
            path: "pricing/monthly_usd".into(),
            kind: ConstraintKind::Minimum,
            message: "-5 is less than minimum 0".into(),
            details: None,
        };
        assert_eq!(error.to_string(), "pricing/monthly_usd: -5 is less than minimum 0");

        let error = FieldError {
            path: String::new(),
            kind: ConstraintKind::Parse,
            message: "invalid JSON".into(),
            details: None,
        };
        assert_eq!(error.to_string(), "invalid JSON");
    }
}
