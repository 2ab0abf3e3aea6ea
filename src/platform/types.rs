use std::fmt;

use serde::{Deserialize, Serialize};

/// The account the code-host token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub login: String,
}

/// Permission level of the authenticated principal on a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    None,
    Read,
    Write,
    Admin,
}

impl Permission {
    /// Parse the `permission` field of GitHub's collaborator-permission response.
    pub fn from_api(value: &str) -> Self {
        match value {
            "admin" => Permission::Admin,
            "write" | "maintain" => Permission::Write,
            "read" | "triage" => Permission::Read,
            _ => Permission::None,
        }
    }

    pub fn can_write(self) -> bool {
        matches!(self, Permission::Write | Permission::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    pub permission: Permission,
}

impl RepositoryRef {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranch {
    pub name: String,
    pub commit_sha: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestStatus {
    Open,
    Closed,
    Merged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub status: PullRequestStatus,
    pub head_branch: String,
    pub base_branch: String,
}

impl PullRequest {
    pub fn is_open(&self) -> bool {
        self.status == PullRequestStatus::Open
    }
}

/// A pull request that has not been submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub title: String,
    pub body: String,
    pub head_branch: String,
    pub base_branch: String,
}
