use std::path::Path;
use std::sync::Arc;

use crate::error::{AppError, GitError, Result};
use crate::platform::types::{PullRequest, PullRequestDraft, RepositoryRef};
use crate::platform::CodeHost;
use crate::state::{SessionState, SessionStore};
use crate::tracker::{IssueSummary, IssueTracker};
use crate::vcs::VersionControl;

use super::types::{PullRequestContext, PullRequestOutcome};
use super::WorkflowSettings;

/// Title and body of the pull request for `branch`.
///
/// The branch name doubles as the issue key.
pub fn build_draft(
    branch: &str,
    issue: &IssueSummary,
    issue_url: &str,
    trunk_branch: &str,
) -> PullRequestDraft {
    PullRequestDraft {
        title: format!("{branch}: {}", issue.title),
        body: format!("{issue_url}\n\n{}", issue.description),
        head_branch: branch.to_string(),
        base_branch: trunk_branch.to_string(),
    }
}

/// Opens a pull request for the checked-out branch, or resumes the one
/// that is already open.
pub struct PullRequestFlow {
    vcs: Arc<dyn VersionControl>,
    host: Arc<dyn CodeHost>,
    tracker: Arc<dyn IssueTracker>,
    sessions: Arc<dyn SessionStore>,
    settings: WorkflowSettings,
}

impl PullRequestFlow {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        host: Arc<dyn CodeHost>,
        tracker: Arc<dyn IssueTracker>,
        sessions: Arc<dyn SessionStore>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            vcs,
            host,
            tracker,
            sessions,
            settings,
        }
    }

    /// Run the flow in `dir`. With `dry_run` nothing is created or recorded.
    pub async fn run(&self, dir: &Path, dry_run: bool) -> Result<PullRequestOutcome> {
        let repo_path = self.vcs.repository_path(dir).await?;
        let principal = self.host.authenticate().await?;
        let repo = self.host.resolve_repository(&principal, &repo_path).await?;
        tracing::info!(repo = %repo, user = %principal.login, "Resolved repository");

        let branch = self.vcs.current_branch(dir).await?;
        self.host.resolve_remote_branch(&repo, &branch).await?;

        let issue = self.tracker.fetch_issue(&branch).await?;

        let repo_key = repo.full_name();
        let session = self.sessions.session(&repo_key, &branch).await?;
        let last_patch = session.as_ref().and_then(|s| s.last_patch.clone());
        let cached_number = session.as_ref().map(|s| s.pr_number);

        if let Some(pr) = self.open_pull_request(&repo, &branch, cached_number).await? {
            tracing::info!(number = pr.number, url = %pr.url, "Resuming open pull request");
            if !dry_run && cached_number != Some(pr.number) {
                let mut state = SessionState::new(pr.number);
                state.last_patch = last_patch.clone();
                self.sessions.save_session(&repo_key, &branch, state).await?;
            }
            return Ok(PullRequestOutcome::Resumed(PullRequestContext {
                repo,
                branch,
                issue,
                pull_request: pr,
                last_patch,
            }));
        }

        let draft = build_draft(
            &branch,
            &issue,
            &self.tracker.browse_url(&branch),
            &self.settings.trunk_branch,
        );

        if dry_run {
            return Ok(PullRequestOutcome::Drafted { repo, draft });
        }

        let pr = self.host.create_pull_request(&repo, &draft).await?;
        tracing::info!(number = pr.number, url = %pr.url, "Created pull request");

        let mut state = SessionState::new(pr.number);
        state.last_patch = last_patch.clone();
        self.sessions.save_session(&repo_key, &branch, state).await?;

        Ok(PullRequestOutcome::Created(PullRequestContext {
            repo,
            branch,
            issue,
            pull_request: pr,
            last_patch,
        }))
    }

    /// The open pull request for `branch`, preferring the cached number.
    async fn open_pull_request(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        cached_number: Option<u64>,
    ) -> Result<Option<PullRequest>> {
        if let Some(number) = cached_number {
            match self.host.get_pull_request(repo, number).await {
                Ok(pr) if pr.is_open() => return Ok(Some(pr)),
                Ok(pr) => {
                    tracing::info!(number, status = ?pr.status, "Cached pull request is no longer open");
                }
                Err(AppError::Git(GitError::PullRequestNotFound)) => {
                    tracing::warn!(number, "Cached pull request no longer exists");
                }
                Err(e) => return Err(e),
            }
        }

        self.host.find_open_pull_request(repo, branch).await
    }
}
