//! Template rendering and scan-point materialization.

use std::collections::BTreeMap;

use lhascan_core::{ErrorInfo, ScanError};
use serde_json::Value;

use crate::blocks::{placeholder_name, Block, LineValue};

/// Renders a literal value for a template line.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Renders the placeholder-bearing template for the given blocks.
///
/// Each block emits a `BLOCK <name>` header followed by one line
/// `<id> <value> #<name> <comment>` per parameter. Dynamic lines render the
/// placeholder `{%name%}`; lines without an `id` are logged and skipped, as
/// are argument lines (those travel with the runner invocation instead).
pub fn render_template(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        out.push_str("BLOCK ");
        out.push_str(&block.block);
        out.push('\n');
        for line in &block.lines {
            let id = match line.id {
                Some(id) => id,
                None => {
                    tracing::error!("no 'id' set for parameter in block {}", block.block);
                    continue;
                }
            };
            let rendered = match &line.value {
                LineValue::Constant { value } => value_text(value),
                LineValue::Argument { .. } => continue,
                _ => format!("{{%{}%}}", placeholder_name(&block.block, line, id)),
            };
            let name = line.parameter.as_deref().unwrap_or("");
            let comment = line.comment.as_deref().unwrap_or("");
            out.push_str(&format!("{id} {rendered} #{name} {comment}\n"));
        }
    }
    out
}

/// Replaces every `{%name%}` placeholder in the template with the scan
/// point's value for that name.
///
/// An unmatched placeholder is a template error; the template and the scan
/// point must always be regenerated from the same block definitions.
pub fn materialize(template: &str, point: &BTreeMap<String, f64>) -> Result<String, ScanError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{%") {
        let (head, tail) = rest.split_at(start);
        out.push_str(head);
        let end = tail.find("%}").ok_or_else(|| {
            ScanError::Template(
                ErrorInfo::new("unterminated-placeholder", "placeholder without closing token")
                    .with_context("near", tail.chars().take(24).collect::<String>()),
            )
        })?;
        let name = &tail[2..end];
        let value = point.get(name).ok_or_else(|| {
            ScanError::Template(
                ErrorInfo::new("unmatched-placeholder", "scan point carries no value for placeholder")
                    .with_context("parameter", name),
            )
        })?;
        out.push_str(&value.to_string());
        rest = &tail[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}
