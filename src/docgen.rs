//! Markdown reference generation from a compiled schema.
//!
//! Rendering is a pure, single-pass transformation and never fails: an
//! imperfect schema (e.g. a `required` name with no matching property)
//! degrades to best-effort output instead of an error.

use std::path::Path;

use serde_json::Value;

use crate::error::DocsError;
use crate::schema::{Constraint, SchemaKind, SchemaNode};

/// Options for rendering a schema reference document.
#[derive(Debug, Clone)]
pub struct DocOptions {
    /// Document title (H1).
    pub title: String,
    /// Preformatted timestamp for the trailing "Last generated" line.
    /// Isolated to that single line so the rest of the output diffs stably;
    /// `None` omits the line entirely.
    pub generated_at: Option<String>,
}

impl DocOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            generated_at: None,
        }
    }

    /// Set the "Last generated" timestamp line.
    pub fn generated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.generated_at = Some(timestamp.into());
        self
    }
}

/// Render a schema into a markdown reference document.
///
/// Deterministic: the same schema and options produce byte-identical output.
/// Properties render in schema-declared order; nested objects get dotted
/// sub-sections one heading level deeper; array-of-object properties get an
/// "Item Properties" sub-section.
pub fn render(schema: &SchemaNode, options: &DocOptions) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", options.title));
    if let Some(description) = &schema.description {
        out.push_str(description);
        out.push_str("\n\n");
    }

    let required = schema.required_children();
    out.push_str("## Required Fields\n\n");
    if required.is_empty() {
        out.push_str("_None._\n\n");
    } else {
        for name in required {
            out.push_str(&format!("- `{name}`\n"));
        }
        out.push('\n');
    }

    out.push_str("## Field Reference\n\n");
    for (name, child) in schema.properties() {
        render_property(&mut out, name, child, required.contains(name), 3);
    }

    if let Some(timestamp) = &options.generated_at {
        out.push_str(&format!("---\n\nLast generated: {timestamp}\n"));
    }

    out
}

/// Render a schema reference to a file, creating parent directories.
///
/// # Errors
///
/// Returns `DocsError::WriteError` if the output cannot be written.
pub fn write_reference(
    schema: &SchemaNode,
    options: &DocOptions,
    output: &Path,
) -> Result<(), DocsError> {
    let markdown = render(schema, options);
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| DocsError::WriteError {
                path: output.to_path_buf(),
                source,
            })?;
        }
    }
    std::fs::write(output, markdown).map_err(|source| DocsError::WriteError {
        path: output.to_path_buf(),
        source,
    })
}

fn render_property(
    out: &mut String,
    dotted: &str,
    node: &SchemaNode,
    required: bool,
    level: usize,
) {
    // Markdown headings stop at six hashes.
    let depth = level.min(6);
    out.push_str(&"#".repeat(depth));
    out.push_str(&format!(" `{dotted}`\n\n"));

    out.push_str(&format!("- Type: `{}`\n", node.type_label()));
    out.push_str(&format!(
        "- Required: {}\n",
        if required { "yes" } else { "no" }
    ));
    out.push('\n');

    if let Some(description) = &node.description {
        out.push_str(description);
        out.push_str("\n\n");
    }

    let mut lines = Vec::new();
    for constraint in node.constraints() {
        match constraint {
            Constraint::Enum(values) => {
                let rendered: Vec<_> = values.iter().map(render_literal).collect();
                lines.push(format!("- Allowed values: {}", rendered.join(", ")));
            }
            Constraint::Pattern(pattern) => lines.push(format!("- Pattern: `{}`", pattern.source)),
            Constraint::MinLength(min) => lines.push(format!("- Minimum length: {min}")),
            Constraint::MaxLength(max) => lines.push(format!("- Maximum length: {max}")),
            Constraint::Minimum(min) => lines.push(format!("- Minimum: {min}")),
            Constraint::Maximum(max) => lines.push(format!("- Maximum: {max}")),
        }
    }
    if !node.examples().is_empty() {
        let rendered: Vec<_> = node.examples().iter().map(render_literal).collect();
        lines.push(format!("- Examples: {}", rendered.join(", ")));
    }
    if let Some(default) = node.default_value() {
        lines.push(format!("- Default: {}", render_literal(default)));
    }
    if !lines.is_empty() {
        for line in &lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }

    match &node.kind {
        SchemaKind::Object {
            properties,
            required,
        } if !properties.is_empty() => {
            for (name, child) in properties {
                let child_dotted = format!("{dotted}.{name}");
                render_property(out, &child_dotted, child, required.contains(name), depth + 1);
            }
        }
        SchemaKind::Array { items: Some(items) } => {
            if let SchemaKind::Object {
                properties,
                required,
            } = &items.kind
            {
                if !properties.is_empty() {
                    out.push_str(&"#".repeat((depth + 1).min(6)));
                    out.push_str(" Item Properties\n\n");
                    for (name, child) in properties {
                        let child_dotted = format!("{dotted}.{name}");
                        render_property(
                            out,
                            &child_dotted,
                            child,
                            required.contains(name),
                            (depth + 2).min(6),
                        );
                    }
                }
            }
        }
        _ => {}
    }
}

/// Strings render individually quoted; everything else as its literal JSON
/// form.
fn render_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("`\"{s}\"`"),
        other => format!("`{other}`"),
    }
}
