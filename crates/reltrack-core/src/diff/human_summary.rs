//! Human-readable summary renderer for change-sets.

use serde_json::Value;

use crate::diff::model::ChangeSet;

/// Render a Markdown summary of `changes` for one entity of `class_name`.
///
/// The summary is intended for audit displays. It is informational only and
/// does not affect the structured change-set.
pub fn render_change_summary(class_name: &str, changes: &ChangeSet) -> String {
    let mut out = String::new();

    out.push_str(&format!("## Changes to {}\n\n", class_name));

    if changes.is_empty() {
        out.push_str("_No changes detected._\n");
        return out;
    }

    out.push_str("| Field | Before | After |\n|---|---|---|\n");
    for (name, change) in changes.iter() {
        out.push_str(&format!(
            "| `{}` | {} | {} |\n",
            name,
            cell(&change.old),
            cell(&change.new)
        ));
    }
    out.push('\n');
    out.push_str(&format!("_{} field(s) changed._\n", changes.len()));
    out
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "_none_".to_string(),
        Value::Array(items) if items.is_empty() => "_empty_".to_string(),
        other => format!("`{}`", other.to_string().replace('|', "\\|")),
    }
}
