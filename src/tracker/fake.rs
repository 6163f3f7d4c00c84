use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::{FieldSet, IssueLink, RemoteIssue, TrackerClient};

#[derive(Default)]
struct State {
    issues: BTreeMap<String, RemoteIssue>,
    fields: BTreeMap<String, Value>,
    next_number: u32,
    creates: usize,
    updates: Vec<String>,
    link_calls: usize,
}

/// In-memory tracker that records every call.
pub struct MemoryTracker {
    project: String,
    state: Mutex<State>,
    fail_create_after: Option<usize>,
}

impl MemoryTracker {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            state: Mutex::new(State {
                next_number: 1,
                ..State::default()
            }),
            fail_create_after: None,
        }
    }

    /// Fail every create once `n` issues have been created.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_create_after = Some(n);
        self
    }

    pub fn with_issue(self, key: &str, summary: &str) -> Self {
        self.state.lock().unwrap().issues.insert(
            key.to_string(),
            RemoteIssue {
                key: key.to_string(),
                summary: summary.to_string(),
                links: Vec::new(),
            },
        );
        self
    }

    pub fn issue(&self, key: &str) -> Option<RemoteIssue> {
        self.state.lock().unwrap().issues.get(key).cloned()
    }

    pub fn fields(&self, key: &str) -> Option<Value> {
        self.state.lock().unwrap().fields.get(key).cloned()
    }

    pub fn create_count(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn updated_keys(&self) -> Vec<String> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn link_calls(&self) -> usize {
        self.state.lock().unwrap().link_calls
    }

    /// Every link in the tracker as `(relationship, inward, outward)`.
    pub fn links(&self) -> Vec<(String, String, String)> {
        let state = self.state.lock().unwrap();
        let links = state
            .issues
            .values()
            .flat_map(|issue| {
                issue.links.iter().filter_map(move |link| {
                    link.outward_key.as_ref().map(|outward| {
                        (link.relationship.clone(), issue.key.clone(), outward.clone())
                    })
                })
            })
            .collect();
        links
    }
}

#[async_trait]
impl TrackerClient for MemoryTracker {
    async fn fetch_issue(&self, key: &str) -> Result<RemoteIssue> {
        self.issue(key)
            .ok_or_else(|| anyhow::anyhow!("Issue {key} does not exist"))
    }

    async fn create_issue(&self, fields: &FieldSet) -> Result<RemoteIssue> {
        let mut state = self.state.lock().unwrap();
        if self.fail_create_after.is_some_and(|n| state.creates >= n) {
            anyhow::bail!("Creating issue failed with 500 Internal Server Error");
        }
        let key = format!("{}-{}", self.project, state.next_number);
        state.next_number += 1;
        state.creates += 1;
        let issue = RemoteIssue {
            key: key.clone(),
            summary: fields
                .get("summary")
                .and_then(|s| s.as_str())
                .unwrap_or_default()
                .to_string(),
            links: Vec::new(),
        };
        state.issues.insert(key.clone(), issue.clone());
        state.fields.insert(key, fields.to_json());
        Ok(issue)
    }

    async fn update_issue(&self, key: &str, fields: &FieldSet) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.issues.contains_key(key) {
            anyhow::bail!("Issue {key} does not exist");
        }
        state.updates.push(key.to_string());
        state.fields.insert(key.to_string(), fields.to_json());
        Ok(())
    }

    async fn issue_links(&self, key: &str) -> Result<Vec<IssueLink>> {
        Ok(self.fetch_issue(key).await?.links)
    }

    async fn create_link(
        &self,
        relationship: &str,
        inward_key: &str,
        outward_key: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.issues.contains_key(inward_key) || !state.issues.contains_key(outward_key) {
            anyhow::bail!("Cannot link {inward_key} to {outward_key}");
        }
        state.link_calls += 1;
        if let Some(inward) = state.issues.get_mut(inward_key) {
            inward.links.push(IssueLink {
                relationship: relationship.to_string(),
                outward_key: Some(outward_key.to_string()),
                inward_key: None,
            });
        }
        if let Some(outward) = state.issues.get_mut(outward_key) {
            outward.links.push(IssueLink {
                relationship: relationship.to_string(),
                outward_key: None,
                inward_key: Some(inward_key.to_string()),
            });
        }
        Ok(())
    }
}
