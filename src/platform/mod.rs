pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// The code host that owns the remote repository and its pull requests.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Validate the configured token and return who it belongs to.
    async fn authenticate(&self) -> Result<Principal>;

    /// Look up `owner/name` and the principal's permission on it.
    ///
    /// Fails with `NoWritePermission` unless the principal can push.
    async fn resolve_repository(
        &self,
        principal: &Principal,
        repo_path: &str,
    ) -> Result<RepositoryRef>;

    /// Confirm the branch exists upstream.
    async fn resolve_remote_branch(
        &self,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<RemoteBranch>;

    /// Find an open pull request whose head is `branch`. Absence is not an error.
    async fn find_open_pull_request(
        &self,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<Option<PullRequest>>;

    /// Fetch a pull request by number.
    async fn get_pull_request(&self, repo: &RepositoryRef, number: u64) -> Result<PullRequest>;

    /// Create a pull request from a draft.
    async fn create_pull_request(
        &self,
        repo: &RepositoryRef,
        draft: &PullRequestDraft,
    ) -> Result<PullRequest>;

    /// Post a comment on a pull request.
    async fn add_comment(&self, repo: &RepositoryRef, number: u64, body: &str) -> Result<()>;
}
