//! Error taxonomy shared by every component.
//!
//! Each external system gets its own closed enumeration. They all fold into
//! [`AppError`], so a flow written with `?` aborts on the first failure no
//! matter which component produced it, and the orchestrator turns whatever
//! arrives into exactly one user-facing message.

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GitError {
    #[error("not a git repository")]
    NotARepository,
    #[error("remote branch not found")]
    RemoteBranchNotFound,
    #[error("bad credentials")]
    BadCredentials,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no write permission to repository")]
    NoWritePermission,
    #[error("pull request already exists")]
    PullRequestAlreadyExists,
    #[error("pull request not found")]
    PullRequestNotFound,
    #[error("HEAD is detached")]
    DetachedHead,
    #[error("diff is empty")]
    EmptyDiff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IssueTrackerError {
    #[error("issue not found")]
    IssueNotFound,
    #[error("authentication failed")]
    AuthenticationError,
    #[error("not authorized")]
    AuthorizationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("file not found")]
    FileNotFound,
    #[error("file cannot be read")]
    FileUnreadable,
    #[error("invalid content")]
    InvalidContent,
    #[error("{0}")]
    MissingSetting(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("patch finalization was not acknowledged")]
    FinalizeRejected,
    #[error("no aliases or variant/task selections given")]
    NothingSelected,
    #[error("patch preset not found")]
    PresetNotFound,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Issue tracker error: {0}")]
    IssueTracker(#[from] IssueTrackerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

const GENERIC_MESSAGE: &str = "An error occurred";

impl AppError {
    /// The single message shown to the user when a flow aborts.
    ///
    /// Kinds without a dedicated message fall back to a generic one.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Git(GitError::NotARepository) => "Project directory is not a Git repo",
            AppError::Git(GitError::BadCredentials) => "Bad GitHub credentials",
            AppError::Git(GitError::InvalidCredentials) => "Invalid GitHub credentials",
            AppError::Git(GitError::NoWritePermission) => {
                "Write permission to the remote repo is needed"
            }
            AppError::Git(GitError::RemoteBranchNotFound) => {
                "Error accessing remote branch, did you push your commits?"
            }
            AppError::Git(GitError::PullRequestAlreadyExists) => {
                "There's already an open pull request"
            }
            AppError::Git(GitError::DetachedHead) => "HEAD is detached, check out a branch first",
            AppError::Git(GitError::EmptyDiff) => "No changes found since the merge base",
            AppError::IssueTracker(IssueTrackerError::IssueNotFound) => {
                "Error fetching JIRA issue, invalid ticket number or issue with credentials?"
            }
            AppError::IssueTracker(
                IssueTrackerError::AuthenticationError | IssueTrackerError::AuthorizationError,
            ) => "Bad JIRA credentials",
            AppError::Config(ConfigError::FileNotFound) => "Config file does not exist",
            AppError::Config(ConfigError::FileUnreadable) => "Config file cannot be opened",
            AppError::Config(ConfigError::InvalidContent) => "Config file has invalid content",
            AppError::Config(ConfigError::MissingSetting(reason)) => *reason,
            AppError::Patch(PatchError::FinalizeRejected) => "Evergreen did not finalize the patch",
            AppError::Patch(PatchError::NothingSelected) => {
                "Select at least one alias or variant to schedule a patch"
            }
            AppError::Patch(PatchError::PresetNotFound) => "No patch preset with that name",
            _ => GENERIC_MESSAGE,
        }
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        AppError::Unknown(detail.into())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Unknown(format!("HTTP request failed: {e}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Unknown(format!("Unexpected response body: {e}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Unknown(format!("I/O error: {e}"))
    }
}

/// Collapse a foreign error into [`AppError::Unknown`], logging it.
pub trait ResultExt<T> {
    fn or_unknown(self, context: &str) -> Result<T>;
}

impl<T, E: Display> ResultExt<T> for std::result::Result<T, E> {
    fn or_unknown(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            tracing::error!(error = %e, "{context}");
            AppError::Unknown(format!("{context}: {e}"))
        })
    }
}
