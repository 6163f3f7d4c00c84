use serde::{Deserialize, Serialize};

/// Column holding the Jira key a row was synchronized to.
pub const JIRA_ID_FIELD: &str = "__jira_id__";

/// Separator placed between the source columns that make up a description.
pub const DESCRIPTION_SEPARATOR: &str = "\n\n---\n\n";

/// One spreadsheet row, normalized by a reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDescriptor {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Overrides the command-level default issue type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuetype: Option<String>,
    /// Remote key from a previous run, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_id: Option<String>,
    #[serde(default)]
    pub dependency_ids: Vec<String>,
}

impl IssueDescriptor {
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            description: String::new(),
            size: None,
            labels: Vec::new(),
            issuetype: None,
            jira_id: None,
            dependency_ids: Vec::new(),
        }
    }
}

/// Join the non-empty parts with [`DESCRIPTION_SEPARATOR`].
pub fn join_description<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(DESCRIPTION_SEPARATOR)
}

/// Split a free-text list on the given separators, dropping empty tokens and
/// duplicates while keeping first-seen order.
pub fn split_tokens(text: Option<&str>, separators: &[char]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let Some(text) = text else {
        return tokens;
    };
    for token in text.split(|c: char| separators.contains(&c)) {
        let token = token.trim();
        if !token.is_empty() && !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}
