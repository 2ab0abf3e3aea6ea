use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, IssueTrackerError, Result, ResultExt};

use super::{IssueSummary, IssueTracker, RequestSigner};

pub struct JiraClient {
    client: Client,
    base_url: String,
    signer: Box<dyn RequestSigner>,
}

impl JiraClient {
    pub fn new(base_url: &str, signer: Box<dyn RequestSigner>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .or_unknown("Failed to build Jira HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    fn issue_url(&self, key: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}?fields=summary,description",
            self.base_url,
            urlencoding::encode(key)
        )
    }
}

/// Map a non-success Jira status code to the typed taxonomy.
pub fn translate_status(status: u16, body: &str) -> AppError {
    match status {
        401 => IssueTrackerError::AuthenticationError.into(),
        403 => IssueTrackerError::AuthorizationError.into(),
        404 => IssueTrackerError::IssueNotFound.into(),
        _ => {
            tracing::error!(status, body, "Unexpected Jira response");
            AppError::unknown(format!("Jira returned {status}: {body}"))
        }
    }
}

// --- Response types ---

#[derive(Debug, Deserialize)]
struct IssueResponse {
    key: String,
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: Option<String>,
}

fn parse_issue(body: &str) -> Result<IssueSummary> {
    let issue: IssueResponse = serde_json::from_str(body)?;
    Ok(IssueSummary {
        key: issue.key,
        title: issue.fields.summary,
        description: issue.fields.description.unwrap_or_default(),
    })
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn fetch_issue(&self, key: &str) -> Result<IssueSummary> {
        let url = self.issue_url(key);
        let authorization = self.signer.authorization("GET", &url)?;

        let response = self
            .client
            .get(&url)
            .header("Authorization", authorization)
            .header("Accept", "application/json")
            .send()
            .await
            .or_unknown("Jira request failed")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(translate_status(status.as_u16(), &body));
        }

        let issue = parse_issue(&body)?;
        tracing::debug!(key = %issue.key, "Fetched Jira issue");
        Ok(issue)
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.base_url)
    }
}
