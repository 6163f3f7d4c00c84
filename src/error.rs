use std::path::PathBuf;

use thiserror::Error;

/// A row that a reader could not turn into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRowError {
    #[error("{}missing required column `{field}`", row_prefix(.id))]
    MissingField { id: Option<String>, field: String },
    #[error("row {id}: column `{field}` is not a number: {value:?}")]
    InvalidNumber {
        id: String,
        field: String,
        value: String,
    },
}

fn row_prefix(id: &Option<String>) -> String {
    match id {
        Some(id) => format!("row {id}: "),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("line {line}: {source}")]
    MalformedRow {
        line: usize,
        #[source]
        source: MalformedRowError,
    },
    /// The tracker rejected or failed a call made on behalf of row `id`.
    #[error("row {id}: failed to {action}: {cause:#}")]
    Tracker {
        id: String,
        action: String,
        cause: anyhow::Error,
    },
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        SyncError::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn tracker(id: &str, action: impl Into<String>, cause: anyhow::Error) -> Self {
        SyncError::Tracker {
            id: id.to_string(),
            action: action.into(),
            cause,
        }
    }
}
