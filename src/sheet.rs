use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::SyncError;
use crate::model::descriptor::JIRA_ID_FIELD;
use crate::model::row::Row;

pub struct SheetRow {
    /// 1-based line in the file where the record starts.
    pub line: usize,
    pub row: Row,
}

/// A whole CSV file held in memory.
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl Sheet {
    pub fn read(path: &Path) -> Result<Self, SyncError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| SyncError::csv(path, e))?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| SyncError::csv(path, e))?
            .iter()
            .map(String::from)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| SyncError::csv(path, e))?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(rows.len() + 2);
            if record.len() > headers.len() {
                warn!(
                    line,
                    extra = record.len() - headers.len(),
                    "row has more cells than the header; extra cells are kept after the last column"
                );
            }
            rows.push(SheetRow {
                line,
                row: Row::from_record(headers.iter().map(String::as_str), record.iter()),
            });
        }
        Ok(Self { headers, rows })
    }

    /// Headers for the rewritten file: the originals, plus the key column
    /// when the file doesn't have one yet.
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers = self.headers.clone();
        if !headers.iter().any(|h| h == JIRA_ID_FIELD) {
            headers.push(JIRA_ID_FIELD.to_string());
        }
        headers
    }
}

/// Sibling of `path` that the rewrite goes to before it replaces `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_with_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.csv");
        std::fs::write(&path, "id,summary\n1,\"Multi\nline\"\n2,B\n").unwrap();

        let sheet = Sheet::read(&path).unwrap();
        assert_eq!(sheet.headers, vec!["id", "summary"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].line, 2);
        assert_eq!(sheet.rows[0].row.get("summary"), Some("Multi\nline"));
        assert_eq!(sheet.rows[1].line, 4);
    }

    #[test]
    fn short_rows_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.csv");
        std::fs::write(&path, "id,summary,size\n1,A\n").unwrap();

        let sheet = Sheet::read(&path).unwrap();
        assert_eq!(sheet.rows[0].row.get("size"), None);
    }

    #[test]
    fn long_rows_keep_their_extra_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.csv");
        std::fs::write(&path, "id,summary\n1,A,keep me\n").unwrap();

        let sheet = Sheet::read(&path).unwrap();
        let values: Vec<&str> = sheet.rows[0].row.values_for(&sheet.headers).collect();
        assert_eq!(values, vec!["1", "A", "keep me"]);
    }

    #[test]
    fn key_column_appended_once() {
        let sheet = Sheet {
            headers: vec!["id".into(), "summary".into()],
            rows: vec![],
        };
        assert_eq!(sheet.output_headers(), vec!["id", "summary", JIRA_ID_FIELD]);

        let sheet = Sheet {
            headers: vec![JIRA_ID_FIELD.into(), "id".into()],
            rows: vec![],
        };
        assert_eq!(sheet.output_headers(), vec![JIRA_ID_FIELD, "id"]);
    }

    #[test]
    fn temp_path_is_a_sibling() {
        let tmp = temp_path(Path::new("/work/plan/issues.csv"));
        assert_eq!(tmp, PathBuf::from("/work/plan/issues.csv.tmp"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Sheet::read(Path::new("/nonexistent/issues.csv")).err().unwrap();
        assert!(err.to_string().contains("/nonexistent/issues.csv"));
    }
}
