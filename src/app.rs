use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::ci::{EvergreenClient, PatchHost};
use crate::config::AppConfig;
use crate::credentials::{EvergreenCredentials, JiraCredentials};
use crate::error::{ConfigError, Result};
use crate::platform::github::GitHubHost;
use crate::platform::CodeHost;
use crate::state::FileStore;
use crate::tracker::{AccessTokenSigner, IssueSummary, IssueTracker, JiraClient};
use crate::vcs::{GitVcs, VersionControl};
use crate::workflow::{PatchFlow, PullRequestFlow, WorkflowSettings};

/// Long-lived components built once per invocation from configuration.
///
/// Issue-tracker and CI clients are built on demand, so a command only
/// needs the credential files it actually uses.
pub struct AppState {
    pub config: AppConfig,
    pub vcs: Arc<dyn VersionControl>,
    pub host: Arc<dyn CodeHost>,
    pub store: Arc<FileStore>,
    pub settings: WorkflowSettings,
}

/// What `check` confirmed.
#[derive(Debug)]
pub struct CheckReport {
    pub login: String,
    pub issue: Option<IssueSummary>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        if let Err(reason) = config.validate() {
            tracing::error!(reason, "Invalid configuration");
            return Err(ConfigError::MissingSetting(reason).into());
        }

        let host = GitHubHost::new(&config.github)?;
        let store = FileStore::new(&config.state.path);
        let settings = WorkflowSettings::from_config(&config);

        Ok(Self {
            vcs: Arc::new(GitVcs::new()),
            host: Arc::new(host),
            store: Arc::new(store),
            settings,
            config,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.http.timeout_secs)
    }

    pub fn tracker(&self) -> Result<Arc<dyn IssueTracker>> {
        let credentials = JiraCredentials::load(&self.config.jira.credentials_path)?;
        let client = JiraClient::new(
            &self.config.jira.base_url,
            Box::new(AccessTokenSigner::new(&credentials)),
            self.timeout(),
        )?;
        Ok(Arc::new(client))
    }

    pub fn patch_host(&self) -> Result<Arc<dyn PatchHost>> {
        let credentials = EvergreenCredentials::load(&self.config.evergreen.credentials_path)?;
        let client = EvergreenClient::new(&self.config.evergreen, &credentials, self.timeout())?;
        Ok(Arc::new(client))
    }

    pub fn pull_request_flow(&self) -> Result<PullRequestFlow> {
        Ok(PullRequestFlow::new(
            self.vcs.clone(),
            self.host.clone(),
            self.tracker()?,
            self.store.clone(),
            self.settings.clone(),
        ))
    }

    pub fn patch_flow(&self) -> Result<PatchFlow> {
        Ok(PatchFlow::new(
            self.vcs.clone(),
            self.host.clone(),
            self.patch_host()?,
            self.store.clone(),
            self.store.clone(),
            self.settings.clone(),
        ))
    }

    /// Key presets are stored under: `owner/name` of the working copy's remote.
    pub async fn repo_key(&self, dir: &Path) -> Result<String> {
        self.vcs.repository_path(dir).await
    }

    /// Confirm credentials load and the services accept them.
    ///
    /// Jira is only checked when an issue key is given, since there is no
    /// credential check that does not read an issue.
    pub async fn check(&self, issue_key: Option<&str>) -> Result<CheckReport> {
        let tracker = self.tracker()?;
        EvergreenCredentials::load(&self.config.evergreen.credentials_path)?;

        let principal = self.host.authenticate().await?;
        tracing::info!(login = %principal.login, "GitHub token accepted");

        let issue = match issue_key {
            Some(key) => Some(tracker.fetch_issue(key).await?),
            None => None,
        };

        Ok(CheckReport {
            login: principal.login,
            issue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_new_rejects_missing_token() {
        let err = AppState::new(AppConfig::default()).err().unwrap();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::MissingSetting("GitHub token is required"))
        ));
        assert_eq!(err.user_message(), "GitHub token is required");
    }

    #[test]
    fn test_new_names_blank_trunk_branch() {
        let mut config = AppConfig::default();
        config.github.token = "ghp_test".to_string();
        config.workflow.trunk_branch = " ".to_string();

        let err = AppState::new(config).err().unwrap();
        assert_eq!(err.user_message(), "Trunk branch name is required");
    }

    #[tokio::test]
    async fn test_tracker_requires_credentials_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.github.token = "ghp_test".to_string();
        config.jira.credentials_path = tmp.path().join("missing.yaml");
        config.state.path = tmp.path().join("state.json");

        let app = AppState::new(config).unwrap();
        let err = app.tracker().err().unwrap();
        assert_eq!(err.user_message(), "Config file does not exist");
    }
}
