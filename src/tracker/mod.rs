pub mod jira;
pub mod signer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use jira::JiraClient;
pub use signer::{AccessTokenSigner, RequestSigner};

/// Read-only projection of a tracker issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub key: String,
    pub title: String,
    pub description: String,
}

#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch one issue by key. A single attempt; no retries.
    async fn fetch_issue(&self, key: &str) -> Result<IssueSummary>;

    /// Public link to an issue.
    fn browse_url(&self, key: &str) -> String;
}
