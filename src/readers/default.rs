use async_trait::async_trait;

use super::{parse_size, required, resolve_by_name, RowReader};
use crate::error::MalformedRowError;
use crate::model::descriptor::{split_tokens, IssueDescriptor, JIRA_ID_FIELD};
use crate::model::row::Row;
use crate::sync::table::SyncTable;
use crate::tracker::{RemoteIssue, TrackerClient};

/// Lower-case `id`/`summary`/`description` columns, comma-separated lists.
pub struct DefaultReader;

#[async_trait]
impl RowReader for DefaultReader {
    fn interpret(&self, row: &Row) -> Result<IssueDescriptor, MalformedRowError> {
        let id = required(row, None, "id")?;
        let summary = required(row, Some(id), "summary")?;

        Ok(IssueDescriptor {
            id: id.to_string(),
            summary: summary.to_string(),
            description: row.get("description").unwrap_or_default().to_string(),
            size: parse_size(row, id, "size")?,
            labels: split_tokens(row.get("labels"), &[',']),
            issuetype: row.get("issuetype").map(String::from),
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
