use serde_json::{json, Value};

use crate::model::descriptor::IssueDescriptor;
use crate::tracker::FieldSet;

/// Build the fields sent to the tracker for one descriptor.
///
/// Precedence, lowest first: project, summary, description, labels, issue
/// type, size, then `overrides` in the order given. An override replaces
/// anything set before it.
pub fn build_fields(
    descriptor: &IssueDescriptor,
    project: &str,
    issue_type_default: &str,
    labels_to_add: &[String],
    size_field: &str,
    overrides: &[(String, String)],
) -> FieldSet {
    let mut fields = FieldSet::new();
    fields.set("project", json!({ "key": project }));
    fields.set("summary", json!(descriptor.summary));
    fields.set("description", json!(descriptor.description));

    let mut labels: Vec<&str> = Vec::new();
    for label in labels_to_add.iter().chain(&descriptor.labels) {
        if !labels.contains(&label.as_str()) {
            labels.push(label);
        }
    }
    fields.set("labels", json!(labels));

    let issuetype = descriptor.issuetype.as_deref().unwrap_or(issue_type_default);
    fields.set("issuetype", json!({ "name": issuetype }));

    if let Some(size) = descriptor.size {
        fields.set(size_field, json!(size));
    }

    for (name, value) in overrides {
        fields.set(name, override_value(value));
    }
    fields
}

/// Values that look like JSON objects or arrays are sent as such; everything
/// else is a plain string.
fn override_value(raw: &str) -> Value {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str(raw) {
            return value;
        }
    }
    Value::String(raw.to_string())
}

/// Split a `name=value` override.
pub fn parse_override(arg: &str) -> Option<(String, String)> {
    let (name, value) = arg.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}
