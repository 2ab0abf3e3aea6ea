use crate::ci::types::PatchConfig;
use crate::platform::types::{PullRequest, PullRequestDraft, RepositoryRef};
use crate::state::PatchInfo;
use crate::tracker::IssueSummary;

/// Everything known once a pull request exists for the current branch.
///
/// The patch flow only accepts this, so it cannot run before a PR is known.
#[derive(Debug, Clone)]
pub struct PullRequestContext {
    pub repo: RepositoryRef,
    pub branch: String,
    pub issue: IssueSummary,
    pub pull_request: PullRequest,
    pub last_patch: Option<PatchInfo>,
}

/// Outcome of the create/resume pull request flow.
#[derive(Debug)]
pub enum PullRequestOutcome {
    /// A new pull request was opened.
    Created(PullRequestContext),
    /// An open pull request already existed; creation was skipped.
    Resumed(PullRequestContext),
    /// Dry run: the draft that would have been submitted.
    Drafted {
        repo: RepositoryRef,
        draft: PullRequestDraft,
    },
}

impl PullRequestOutcome {
    pub fn context(&self) -> Option<&PullRequestContext> {
        match self {
            PullRequestOutcome::Created(ctx) | PullRequestOutcome::Resumed(ctx) => Some(ctx),
            PullRequestOutcome::Drafted { .. } => None,
        }
    }

    pub fn into_context(self) -> Option<PullRequestContext> {
        match self {
            PullRequestOutcome::Created(ctx) | PullRequestOutcome::Resumed(ctx) => Some(ctx),
            PullRequestOutcome::Drafted { .. } => None,
        }
    }
}

/// Where the patch configuration comes from, on top of explicit selections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    #[default]
    Explicit,
    /// Merge a saved preset.
    Preset(String),
    /// Merge the configuration of the last patch on this branch.
    LastUsed,
}

#[derive(Debug, Clone)]
pub struct PatchRequest {
    pub config: PatchConfig,
    pub source: ConfigSource,
    /// Schedule the patch after configuring it.
    pub finalize: bool,
}

#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub patch_id: String,
    pub patch_url: String,
    pub base_commit: String,
    pub diff_stat: String,
    pub applied: PatchConfig,
    /// Version id returned by the last configure call, if any ran.
    pub version_id: Option<String>,
    pub finalized: bool,
}
