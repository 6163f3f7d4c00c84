pub mod agile;
pub mod default;


use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::MalformedRowError;
use crate::model::descriptor::IssueDescriptor;
use crate::model::row::Row;
use crate::sync::table::SyncTable;
use crate::tracker::{is_remote_key, RemoteIssue, TrackerClient};

/// Turns spreadsheet rows into descriptors and knows how a descriptor's
/// dependencies are named and found.
#[async_trait]
pub trait RowReader: Send + Sync {
    fn interpret(&self, row: &Row) -> Result<IssueDescriptor, MalformedRowError>;

    /// Dependency tokens in source order: local ids or tracker keys.
    fn dependency_names(&self, descriptor: &IssueDescriptor) -> Vec<String>;

    async fn resolve_dependencies(
        &self,
        tracker: &dyn TrackerClient,
        descriptor: &IssueDescriptor,
        table: &SyncTable,
    ) -> Vec<RemoteIssue>;
}

type ReaderFactory = fn() -> Box<dyn RowReader>;

const READERS: &[(&str, ReaderFactory)] = &[
    ("default", default_reader),
    ("agile", agile_reader),
    ("agile2", agile2_reader),
];

fn default_reader() -> Box<dyn RowReader> {
    Box::new(default::DefaultReader)
}

fn agile_reader() -> Box<dyn RowReader> {
    Box::new(agile::AgileReader)
}

fn agile2_reader() -> Box<dyn RowReader> {
    Box::new(agile::Agile2Reader)
}

pub fn reader_names() -> Vec<&'static str> {
    READERS.iter().map(|(name, _)| *name).collect()
}

pub fn reader_by_name(name: &str) -> Option<Box<dyn RowReader>> {
    READERS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, factory)| factory())
}

/// Resolve dependency names for `descriptor`.
///
/// Names containing the key delimiter are fetched from the tracker; anything
/// else is a local id looked up in `table`. Names that resolve to nothing,
/// and the row's own id, are skipped.
pub async fn resolve_by_name(
    tracker: &dyn TrackerClient,
    descriptor: &IssueDescriptor,
    names: &[String],
    table: &SyncTable,
) -> Vec<RemoteIssue> {
    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        if *name == descriptor.id {
            debug!(id = %descriptor.id, "row depends on itself, skipping");
            continue;
        }
        if is_remote_key(name) {
            match tracker.fetch_issue(name).await {
                Ok(issue) => resolved.push(issue),
                Err(e) => warn!(
                    id = %descriptor.id,
                    dependency = %name,
                    "could not fetch dependency from tracker, skipping: {e:#}"
                ),
            }
            continue;
        }
        match table.get(name) {
            Some(entry) => match &entry.remote {
                Some(issue) => resolved.push(issue.clone()),
                None => debug!(
                    id = %descriptor.id,
                    dependency = %name,
                    "dependency has no tracker issue yet, skipping"
                ),
            },
            None => warn!(
                id = %descriptor.id,
                dependency = %name,
                "unknown dependency, skipping"
            ),
        }
    }
    resolved
}

/// Parse an optional numeric column.
pub(crate) fn parse_size(
    row: &Row,
    id: &str,
    column: &str,
) -> Result<Option<f64>, MalformedRowError> {
    let Some(value) = row.get(column) else {
        return Ok(None);
    };
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Some)
        .ok_or_else(|| MalformedRowError::InvalidNumber {
            id: id.to_string(),
            field: column.to_string(),
            value: value.to_string(),
        })
}

/// Fetch a required column, reporting `id` (when already known) on failure.
pub(crate) fn required<'a>(
    row: &'a Row,
    id: Option<&str>,
    column: &str,
) -> Result<&'a str, MalformedRowError> {
    row.get(column).ok_or_else(|| MalformedRowError::MissingField {
        id: id.map(String::from),
        field: column.to_string(),
    })
}
