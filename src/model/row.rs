/// A raw spreadsheet row: column name to cell text, in header order.
///
/// Empty cells read as absent, the same as columns the file doesn't have.
/// Cells past the last header have no name; they are carried along untouched
/// and written back after the named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
    overflow: Vec<String>,
}

impl Row {
    pub fn from_record<'a>(
        headers: impl IntoIterator<Item = &'a str>,
        values: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut values = values.into_iter();
        let cells = headers
            .into_iter()
            .zip(values.by_ref())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        let overflow = values.map(String::from).collect();
        Self { cells, overflow }
    }

    /// Trimmed cell value, `None` when the column is missing or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| name == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column.to_string(), value)),
        }
    }

    /// Cell values laid out for `headers`, then any unnamed trailing cells.
    /// Columns this row lacks come out empty.
    pub fn values_for<'a>(&'a self, headers: &'a [String]) -> impl Iterator<Item = &'a str> {
        headers
            .iter()
            .map(move |h| {
                self.cells
                    .iter()
                    .find(|(name, _)| name == h)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("")
            })
            .chain(self.overflow.iter().map(String::as_str))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            overflow: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_read_as_absent() {
        let row: Row = [("id", "1"), ("summary", "   "), ("size", "")].into_iter().collect();
        assert_eq!(row.get("id"), Some("1"));
        assert_eq!(row.get("summary"), None);
        assert_eq!(row.get("size"), None);
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn set_replaces_or_appends() {
        let mut row: Row = [("id", "1")].into_iter().collect();
        row.set("id", "2");
        row.set("__jira_id__", "PROJ-1");
        assert_eq!(row.get("id"), Some("2"));
        assert_eq!(row.get("__jira_id__"), Some("PROJ-1"));
    }

    #[test]
    fn values_follow_header_order() {
        let row = Row::from_record(["b", "a"], ["2", "1"]);
        let headers = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let values: Vec<&str> = row.values_for(&headers).collect();
        assert_eq!(values, vec!["1", "2", ""]);
    }

    #[test]
    fn cells_past_the_headers_are_kept_at_the_end() {
        let mut row = Row::from_record(["id", "summary"], ["1", "A", "keep me", ""]);
        row.set("__jira_id__", "PROJ-1");
        let headers = vec!["id".to_string(), "summary".to_string(), "__jira_id__".to_string()];
        let values: Vec<&str> = row.values_for(&headers).collect();
        assert_eq!(values, vec!["1", "A", "PROJ-1", "keep me", ""]);
        assert_eq!(row.get("summary"), Some("A"));
    }
}
