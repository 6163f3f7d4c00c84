pub mod jira;

#[cfg(test)]
pub mod fake;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separates project and number in a tracker key (`PROJ-123`).
pub const KEY_DELIMITER: char = '-';

/// Whether `name` is an already-qualified tracker key rather than a local row id.
pub fn is_remote_key(name: &str) -> bool {
    name.contains(KEY_DELIMITER)
}

/// A typed, directed link as seen from one of its endpoints.
///
/// Exactly one of `outward_key`/`inward_key` is set: the other end of the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLink {
    pub relationship: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outward_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inward_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssue {
    pub key: String,
    pub summary: String,
    #[serde(default)]
    pub links: Vec<IssueLink>,
}

/// Ordered issue fields. Setting a field that is already present replaces
/// its value in place, so later writers take precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<(String, Value)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(field) => field.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[cfg(test)]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn without(&self, name: &str) -> Self {
        Self {
            fields: self.fields.iter().filter(|(n, _)| n != name).cloned().collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self.fields.iter().cloned().collect();
        Value::Object(map)
    }
}

#[async_trait]
pub trait TrackerClient: Send + Sync {
    async fn fetch_issue(&self, key: &str) -> Result<RemoteIssue>;
    async fn create_issue(&self, fields: &FieldSet) -> Result<RemoteIssue>;
    async fn update_issue(&self, key: &str, fields: &FieldSet) -> Result<()>;
    async fn issue_links(&self, key: &str) -> Result<Vec<IssueLink>>;
    /// Create a `relationship` link from `inward_key` to `outward_key`.
    async fn create_link(&self, relationship: &str, inward_key: &str, outward_key: &str)
        -> Result<()>;
}
