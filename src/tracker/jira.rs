use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::{FieldSet, IssueLink, RemoteIssue, TrackerClient};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct JiraClient {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl JiraClient {
    /// `url` may be a full server URL or a bare Atlassian Cloud domain.
    pub fn new(url: &str, username: &str, password: &str, verify: bool) -> Result<Self> {
        let creds = format!("{username}:{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url(url),
            auth_header: format!("Basic {encoded}"),
            client,
        })
    }

    fn issue_url(&self, key: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}",
            self.base_url,
            urlencoding::encode(key)
        )
    }
}

fn base_url(url: &str) -> String {
    if url.contains("://") {
        url.trim_end_matches('/').to_string()
    } else {
        format!("https://{url}.atlassian.net")
    }
}

async fn check_status(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    anyhow::bail!("{what} failed with {status}: {body}");
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    fields: IssueFields,
}

#[derive(Deserialize)]
struct IssueFields {
    summary: Option<String>,
    #[serde(default)]
    issuelinks: Vec<JiraLink>,
}

#[derive(Deserialize)]
struct JiraLink {
    #[serde(rename = "type")]
    link_type: LinkType,
    #[serde(rename = "outwardIssue")]
    outward_issue: Option<LinkedIssue>,
    #[serde(rename = "inwardIssue")]
    inward_issue: Option<LinkedIssue>,
}

#[derive(Deserialize)]
struct LinkType {
    name: String,
}

#[derive(Deserialize)]
struct LinkedIssue {
    key: String,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

impl From<JiraIssue> for RemoteIssue {
    fn from(issue: JiraIssue) -> Self {
        let links = issue
            .fields
            .issuelinks
            .into_iter()
            .map(|link| IssueLink {
                relationship: link.link_type.name,
                outward_key: link.outward_issue.map(|i| i.key),
                inward_key: link.inward_issue.map(|i| i.key),
            })
            .collect();
        RemoteIssue {
            key: issue.key,
            summary: issue.fields.summary.unwrap_or_default(),
            links,
        }
    }
}

#[async_trait]
impl TrackerClient for JiraClient {
    async fn fetch_issue(&self, key: &str) -> Result<RemoteIssue> {
        let url = format!("{}?fields=summary,issuelinks", self.issue_url(key));
        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Jira request for {key} failed"))?;
        let resp = check_status(resp, &format!("Fetching {key}")).await?;

        let issue: JiraIssue = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse Jira issue {key}"))?;
        Ok(issue.into())
    }

    async fn create_issue(&self, fields: &FieldSet) -> Result<RemoteIssue> {
        let body = json!({ "fields": fields.to_json() });
        let resp = self
            .client
            .post(format!("{}/rest/api/2/issue", self.base_url))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .context("Jira create request failed")?;
        let resp = check_status(resp, "Creating issue").await?;

        let created: CreatedIssue = resp.json().await.context("Failed to parse Jira response")?;
        let summary = fields
            .get("summary")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(RemoteIssue {
            key: created.key,
            summary,
            links: Vec::new(),
        })
    }

    async fn update_issue(&self, key: &str, fields: &FieldSet) -> Result<()> {
        let body = json!({ "fields": fields.to_json() });
        let resp = self
            .client
            .put(self.issue_url(key))
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Jira update request for {key} failed"))?;
        check_status(resp, &format!("Updating {key}")).await?;
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
        let body = json!({
            "type": { "name": relationship },
            "inwardIssue": { "key": inward_key },
            "outwardIssue": { "key": outward_key },
        });
        let resp = self
            .client
            .post(format!("{}/rest/api/2/issueLink", self.base_url))
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await
            .context("Jira link request failed")?;
        check_status(resp, &format!("Linking {inward_key} to {outward_key}")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_maps_to_atlassian_cloud() {
        assert_eq!(base_url("acme"), "https://acme.atlassian.net");
        assert_eq!(
            base_url("https://jira.example.com/"),
            "https://jira.example.com"
        );
    }

    #[test]
    fn issue_links_keep_their_direction() {
        let raw = r#"{
            "key": "PROJ-1",
            "fields": {
                "summary": "Login page",
                "issuelinks": [
                    {"type": {"name": "Blocks"}, "outwardIssue": {"key": "PROJ-2"}},
                    {"type": {"name": "Relates"}, "inwardIssue": {"key": "PROJ-7"}}
                ]
            }
        }"#;
        let issue: RemoteIssue = serde_json::from_str::<JiraIssue>(raw).unwrap().into();
        assert_eq!(issue.key, "PROJ-1");
        assert_eq!(issue.summary, "Login page");
        assert_eq!(issue.links.len(), 2);
        assert_eq!(issue.links[0].relationship, "Blocks");
        assert_eq!(issue.links[0].outward_key.as_deref(), Some("PROJ-2"));
        assert_eq!(issue.links[1].outward_key, None);
        assert_eq!(issue.links[1].inward_key.as_deref(), Some("PROJ-7"));
    }

    #[test]
    fn missing_issuelinks_is_empty() {
        let raw = r#"{"key": "PROJ-3", "fields": {}}"#;
        let issue: RemoteIssue = serde_json::from_str::<JiraIssue>(raw).unwrap().into();
        assert!(issue.links.is_empty());
        assert_eq!(issue.summary, "");
    }

    #[test]
    fn issue_url_encodes_key() {
        let client = JiraClient::new("acme", "me", "token", true).unwrap();
        assert_eq!(
            client.issue_url("PROJ 1"),
            "https://acme.atlassian.net/rest/api/2/issue/PROJ%201"
        );
    }
}
