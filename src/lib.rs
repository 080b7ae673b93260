//! Intelligence pack schema tools.
//!
//! Schema-driven validation and markdown reference generation for
//! declarative content records: intelligence pack manifests and roadmap
//! documents.
//!
//! A JSON Schema (Draft-07-style conventions) is compiled once into a closed
//! set of tagged node kinds ([`SchemaKind`]). The validator and the doc
//! generator share that model, so both agree on how a node's type and
//! constraints are read. Validation is exhaustive per record and batches
//! isolate per-record failures; doc generation is deterministic apart from
//! an optional, isolated timestamp line.
//!
//! # Example
//!
//! ```
//! use pack_schema::{validate, SchemaNode, ValidateOptions};
//! use serde_json::json;
//!
//! let schema = SchemaNode::compile(&json!({
//!     "type": "object",
//!     "required": ["id"],
//!     "properties": {
//!         "id": { "type": "string", "pattern": "^[a-z0-9]+(-[a-z0-9]+)*$" }
//!     }
//! })).unwrap();
//!
//! let result = validate(&schema, &json!({ "id": "My_Pack" }), &ValidateOptions::default());
//! assert!(!result.valid);
//! assert_eq!(result.errors[0].path, "id");
//! ```

mod docgen;
mod error;
mod loader;
mod schema;
mod validator;

pub use docgen::{render, write_reference, DocOptions};
pub use error::{ConfigError, DocsError};
pub use loader::{collect_record_files, load_json, load_schema};
pub use schema::{
    json_type_name, Constraint, PatternConstraint, Primitive, SchemaKind, SchemaNode,
};
pub use validator::{
    validate, validate_dir, validate_file, BatchReport, ConstraintKind, ErrorDetails, FieldError,
    RecordResult, RecordStatus, ValidateOptions, ValidationResult,
};
