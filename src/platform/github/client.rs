use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Deserialize;

use crate::config::GitHubConfig;
use crate::error::{AppError, GitError, Result, ResultExt};
use crate::platform::types::*;
use crate::platform::CodeHost;

use super::errors::{translate_octocrab, Operation};
use super::mapper;

#[derive(Debug, Deserialize)]
struct PermissionResponse {
    permission: String,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    sha: String,
}

pub struct GitHubHost {
    client: Octocrab,
}

impl GitHubHost {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(config.token.clone());
        if let Some(base) = &config.api_base {
            builder = builder
                .base_uri(base.as_str())
                .or_unknown("Invalid GitHub API base URI")?;
        }

        let client = builder.build().or_unknown("Failed to build octocrab client")?;
        Ok(Self { client })
    }

    pub(crate) fn parse_repo(repo_path: &str) -> Result<(&str, &str)> {
        match repo_path.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok((owner, name)),
            _ => Err(AppError::unknown(format!("Invalid repo name: {repo_path}"))),
        }
    }
}

#[async_trait]
impl CodeHost for GitHubHost {
    async fn authenticate(&self) -> Result<Principal> {
        let user = self
            .client
            .current()
            .user()
            .await
            .map_err(|e| translate_octocrab(Operation::Authenticate, &e))?;

        tracing::debug!(login = %user.login, "Authenticated with GitHub");
        Ok(Principal { login: user.login })
    }

    async fn resolve_repository(
        &self,
        principal: &Principal,
        repo_path: &str,
    ) -> Result<RepositoryRef> {
        let (owner, name) = Self::parse_repo(repo_path)?;

        let url = format!(
            "/repos/{owner}/{name}/collaborators/{}/permission",
            principal.login
        );
        let response: PermissionResponse = self
            .client
            .get(&url, None::<&()>)
            .await
            .map_err(|e| translate_octocrab(Operation::ResolveRepository, &e))?;

        let permission = Permission::from_api(&response.permission);
        tracing::debug!(repo = repo_path, permission = ?permission, "Resolved repository");

        if !permission.can_write() {
            return Err(GitError::NoWritePermission.into());
        }

        Ok(RepositoryRef {
            owner: owner.to_string(),
            name: name.to_string(),
            permission,
        })
    }

    async fn resolve_remote_branch(
        &self,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<RemoteBranch> {
        let url = format!("/repos/{}/{}/branches/{branch}", repo.owner, repo.name);
        let response: BranchResponse = self
            .client
            .get(&url, None::<&()>)
            .await
            .map_err(|e| translate_octocrab(Operation::ResolveBranch, &e))?;

        Ok(RemoteBranch {
            name: response.name,
            commit_sha: response.commit.sha,
        })
    }

    async fn find_open_pull_request(
        &self,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<Option<PullRequest>> {
        let page = self
            .client
            .pulls(&repo.owner, &repo.name)
            .list()
            .state(octocrab::params::State::Open)
            .head(format!("{}:{branch}", repo.owner))
            .per_page(10)
            .send()
            .await
            .map_err(|e| translate_octocrab(Operation::FindPullRequest, &e))?;

        Ok(page
            .items
            .into_iter()
            .map(mapper::map_pull_request)
            .find(|pr| pr.head_branch == branch))
    }

    async fn get_pull_request(&self, repo: &RepositoryRef, number: u64) -> Result<PullRequest> {
        let pr = self
            .client
            .pulls(&repo.owner, &repo.name)
            .get(number)
            .await
            .map_err(|e| translate_octocrab(Operation::GetPullRequest, &e))?;

        Ok(mapper::map_pull_request(pr))
    }

    async fn create_pull_request(
        &self,
        repo: &RepositoryRef,
        draft: &PullRequestDraft,
    ) -> Result<PullRequest> {
        let created = self
            .client
            .pulls(&repo.owner, &repo.name)
            .create(&draft.title, &draft.head_branch, &draft.base_branch)
            .body(&draft.body)
            .send()
            .await
            .map_err(|e| translate_octocrab(Operation::CreatePullRequest, &e))?;

        Ok(mapper::map_pull_request(created))
    }

    async fn add_comment(&self, repo: &RepositoryRef, number: u64, body: &str) -> Result<()> {
        self.client
            .issues(&repo.owner, &repo.name)
            .create_comment(number, body)
            .await
            .map_err(|e| translate_octocrab(Operation::Comment, &e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo() {
        assert_eq!(GitHubHost::parse_repo("10gen/mms").unwrap(), ("10gen", "mms"));
        assert!(GitHubHost::parse_repo("mms").is_err());
        assert!(GitHubHost::parse_repo("/mms").is_err());
        assert!(GitHubHost::parse_repo("10gen/").is_err());
    }

    #[test]
    fn test_branch_response_shape() {
        let body = r#"{"name":"CLOUDP-100","commit":{"sha":"abc123","url":"x"},"protected":false}"#;
        let parsed: BranchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.name, "CLOUDP-100");
        assert_eq!(parsed.commit.sha, "abc123");
    }

    #[test]
    fn test_permission_response_shape() {
        let body = r#"{"permission":"write","user":{"login":"dev"}}"#;
        let parsed: PermissionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(Permission::from_api(&parsed.permission), Permission::Write);
    }
}
