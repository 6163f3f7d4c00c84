use async_trait::async_trait;

use super::{parse_size, required, resolve_by_name, RowReader};
use crate::error::MalformedRowError;
use crate::model::descriptor::{join_description, split_tokens, IssueDescriptor, JIRA_ID_FIELD};
use crate::model::row::Row;
use crate::sync::table::SyncTable;
use crate::tracker::{RemoteIssue, TrackerClient};

const LIST_SEPARATORS: &[char] = &[',', ' ', '\t', '\n'];

/// Story-style sheets: `id`, `summary`, `size`, with the description built
/// from `story` and `notes`.
pub struct AgileReader;

#[async_trait]
impl RowReader for AgileReader {
    fn interpret(&self, row: &Row) -> Result<IssueDescriptor, MalformedRowError> {
        let id = required(row, None, "id")?;
        let summary = required(row, Some(id), "summary")?;

        Ok(IssueDescriptor {
            id: id.to_string(),
            summary: summary.to_string(),
            description: join_description([row.get("story"), row.get("notes")]),
            size: parse_size(row, id, "size")?,
            labels: Vec::new(),
            issuetype: None,
            jira_id: row.get(JIRA_ID_FIELD).map(String::from),
            dependency_ids: split_tokens(row.get("dependencies"), &[',']),
        })
    }

    fn dependency_names(&self, descriptor: &IssueDescriptor) -> Vec<String> {
        descriptor.dependency_ids.clone()
    }

    async fn resolve_dependencies(
        &self,
        tracker: &dyn TrackerClient,
        descriptor: &IssueDescriptor,
        table: &SyncTable,
    ) -> Vec<RemoteIssue> {
        let names = self.dependency_names(descriptor);
        resolve_by_name(tracker, descriptor, &names, table).await
    }
}

/// Capitalized planning sheets with `Depends`, `Labels` and `Issuetype`
/// columns and a three-part description.
pub struct Agile2Reader;

#[async_trait]
impl RowReader for Agile2Reader {
    fn interpret(&self, row: &Row) -> Result<IssueDescriptor, MalformedRowError> {
        let id = required(row, None, "ID")?;
        let summary = required(row, Some(id), "Summary")?;

        Ok(IssueDescriptor {
            id: id.to_string(),
            summary: summary.to_string(),
            description: join_description([
                row.get("Story"),
                row.get("Acceptance Criteria"),
                row.get("Notes"),
            ]),
            size: parse_size(row, id, "Size")?,
            labels: split_tokens(row.get("Labels"), LIST_SEPARATORS),
            issuetype: row.get("Issuetype").map(String::from),
            jira_id: row.get(JIRA_ID_FIELD).map(String::from),
            dependency_ids: split_tokens(row.get("Depends"), LIST_SEPARATORS),
        })
    }

    fn dependency_names(&self, descriptor: &IssueDescriptor) -> Vec<String> {
        // Self-references are dropped.
        descriptor
            .dependency_ids
            .iter()
            .filter(|name| **name != descriptor.id)
            .cloned()
            .collect()
    }

    async fn resolve_dependencies(
        &self,
        tracker: &dyn TrackerClient,
        descriptor: &IssueDescriptor,
        table: &SyncTable,
    ) -> Vec<RemoteIssue> {
        let names = self.dependency_names(descriptor);
        resolve_by_name(tracker, descriptor, &names, table).await
    }
}
