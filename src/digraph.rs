use std::fmt::Write;

use thiserror::Error;

use crate::error::MalformedRowError;
use crate::model::descriptor::IssueDescriptor;
use crate::model::row::Row;
use crate::readers::RowReader;
use crate::tracker::is_remote_key;

const WRAP_WIDTH: usize = 20;

#[derive(Debug, Error)]
#[error("line {line}: {source}")]
pub struct RenderError {
    pub line: usize,
    #[source]
    pub source: MalformedRowError,
}

/// Render rows as a Graphviz digraph, one node per row and one edge from
/// each dependency to the row that depends on it.
///
/// `rows` pairs each row with its line number for error reporting.
pub fn render<'a>(
    rows: impl IntoIterator<Item = (usize, &'a Row)>,
    reader: &dyn RowReader,
) -> Result<String, RenderError> {
    let mut descriptors = Vec::new();
    for (line, row) in rows {
        let descriptor = reader
            .interpret(row)
            .map_err(|source| RenderError { line, source })?;
        descriptors.push(descriptor);
    }

    let mut out = String::from("digraph issues {\n");
    for descriptor in &descriptors {
        let _ = writeln!(out, "\t{}", node_statement(descriptor));
    }
    for descriptor in &descriptors {
        for name in reader.dependency_names(descriptor) {
            let _ = writeln!(
                out,
                "\t{} -> {}",
                node_ref(&name),
                node_ref(&descriptor.id)
            );
        }
    }
    out.push('}');
    out.push('\n');
    Ok(out)
}

fn node_statement(descriptor: &IssueDescriptor) -> String {
    let wrapped: Vec<String> = textwrap::wrap(&descriptor.summary, WRAP_WIDTH)
        .iter()
        .map(|line| escape_html(line))
        .collect();
    let mut label = format!(
        "<B>{}</B><BR/>{}",
        escape_html(&descriptor.id),
        wrapped.join("<BR/>")
    );
    let mut attrs = String::new();
    if let Some(size) = descriptor.size {
        let _ = write!(label, "<BR/><I>size {size}</I>");
        let _ = write!(attrs, ", width={:.2}", node_width(size));
    }
    format!("{}[label=<{label}>{attrs}]", node_ref(&descriptor.id))
}

/// Bigger estimates get wider boxes, within reason.
fn node_width(size: f64) -> f64 {
    (0.75 + size.max(0.0).sqrt() * 0.25).min(3.0)
}

/// Local ids become `id<name>`; tracker keys are quoted as-is.
fn node_ref(name: &str) -> String {
    if is_remote_key(name) {
        format!("\"{}\"", escape_dot(name))
    } else if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        format!("id{name}")
    } else {
        format!("\"id{}\"", escape_dot(name))
    }
}

/// Escape for a double-quoted DOT id.
fn escape_dot(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::agile::Agile2Reader;
    use crate::readers::default::DefaultReader;

    fn row(cells: &[(&str, &str)]) -> Row {
        cells.iter().copied().collect()
    }

    #[test]
    fn renders_nodes_then_edges() {
        let rows = [
            row(&[("id", "1"), ("summary", "Design the login page layout")]),
            row(&[("id", "2"), ("summary", "Build login"), ("dependencies", "1,PROJ-9")]),
        ];
        let dot = render(rows.iter().enumerate().map(|(i, r)| (i + 2, r)), &DefaultReader).unwrap();

        assert_eq!(
            dot,
            "digraph issues {\n\
             \tid1[label=<<B>1</B><BR/>Design the login<BR/>page layout>]\n\
             \tid2[label=<<B>2</B><BR/>Build login>]\n\
             \tid1 -> id2\n\
             \t\"PROJ-9\" -> id2\n\
             }\n"
        );
    }

    #[test]
    fn size_adds_annotation_and_width() {
        let rows = [row(&[("id", "1"), ("summary", "A"), ("size", "4")])];
        let dot = render(rows.iter().map(|r| (2, r)), &DefaultReader).unwrap();
        assert!(dot.contains("<I>size 4</I>"));
        assert!(dot.contains("width=1.25"));
    }

    #[test]
    fn summary_is_html_escaped() {
        let rows = [row(&[("id", "1"), ("summary", "Fix <b> & co")])];
        let dot = render(rows.iter().map(|r| (2, r)), &DefaultReader).unwrap();
        assert!(dot.contains("Fix &lt;b&gt; &amp; co"));
    }

    #[test]
    fn odd_local_ids_are_quoted() {
        assert_eq!(node_ref("42"), "id42");
        assert_eq!(node_ref("login page"), "\"idlogin page\"");
        assert_eq!(node_ref("PROJ-9"), "\"PROJ-9\"");
    }

    #[test]
    fn backslashes_and_quotes_in_ids_are_escaped() {
        assert_eq!(node_ref("a\\"), r#""ida\\""#);
        assert_eq!(node_ref("say \"hi\""), r#""idsay \"hi\"""#);
        assert_eq!(node_ref("PROJ-1\\"), r#""PROJ-1\\""#);
    }

    #[test]
    fn uses_reader_dependency_names() {
        let rows = [
            row(&[("ID", "A1"), ("Summary", "One"), ("Depends", "A1")]),
            row(&[("ID", "A2"), ("Summary", "Two"), ("Depends", "A1 A3")]),
        ];
        let dot = render(rows.iter().map(|r| (2, r)), &Agile2Reader).unwrap();
        assert!(!dot.contains("idA1 -> idA1"));
        assert!(dot.contains("idA1 -> idA2"));
        assert!(dot.contains("idA3 -> idA2"));
    }

    #[test]
    fn malformed_row_reports_line() {
        let rows = [row(&[("id", "1")])];
        let err = render(rows.iter().map(|r| (7, r)), &DefaultReader).unwrap_err();
        assert_eq!(err.line, 7);
        assert!(err.to_string().starts_with("line 7: row 1: missing required column `summary`"));
    }
}
