use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{AppError, ConfigError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub evergreen: EvergreenConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Deserialize, Clone, Default)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: String,
    /// Base URI for GitHub Enterprise; api.github.com when unset.
    #[serde(default)]
    pub api_base: Option<String>,
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JiraConfig {
    #[serde(default = "default_jira_base_url")]
    pub base_url: String,
    /// YAML file holding the `jira:` OAuth credentials.
    #[serde(default = "default_jira_credentials_path")]
    pub credentials_path: PathBuf,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: default_jira_base_url(),
            credentials_path: default_jira_credentials_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EvergreenConfig {
    #[serde(default = "default_evergreen_api_base")]
    pub api_base: String,
    #[serde(default = "default_evergreen_legacy_api_base")]
    pub legacy_api_base: String,
    #[serde(default = "default_evergreen_ui_base")]
    pub ui_base: String,
    /// YAML file holding `user` and `api_key`.
    #[serde(default = "default_evergreen_credentials_path")]
    pub credentials_path: PathBuf,
    /// Repository name -> Evergreen project identifier.
    #[serde(default = "default_evergreen_projects")]
    pub projects: HashMap<String, String>,
}

impl Default for EvergreenConfig {
    fn default() -> Self {
        Self {
            api_base: default_evergreen_api_base(),
            legacy_api_base: default_evergreen_legacy_api_base(),
            ui_base: default_evergreen_ui_base(),
            credentials_path: default_evergreen_credentials_path(),
            projects: default_evergreen_projects(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    /// Branch pull requests target and patches diff against.
    #[serde(default = "default_trunk_branch")]
    pub trunk_branch: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            trunk_branch: default_trunk_branch(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn home_path(relative: &str) -> PathBuf {
    home::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(relative)
}

fn default_jira_base_url() -> String {
    "https://jira.mongodb.org".to_string()
}

fn default_jira_credentials_path() -> PathBuf {
    home_path(".mdbutils/config.yaml")
}

fn default_evergreen_api_base() -> String {
    "https://evergreen.mongodb.com/api/rest/v2".to_string()
}

fn default_evergreen_legacy_api_base() -> String {
    "https://evergreen.mongodb.com/api".to_string()
}

fn default_evergreen_ui_base() -> String {
    "https://spruce.mongodb.com".to_string()
}

fn default_evergreen_credentials_path() -> PathBuf {
    home_path(".evergreen.yml")
}

fn default_evergreen_projects() -> HashMap<String, String> {
    HashMap::from([
        ("mms-automation".to_string(), "cloud-automation-master".to_string()),
        ("mms".to_string(), "mms".to_string()),
    ])
}

fn default_trunk_branch() -> String {
    "master".to_string()
}

fn default_state_path() -> PathBuf {
    home_path(".quickpr/state.json")
}

fn default_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            // Try default paths
            builder = builder.add_source(config::File::with_name("quickpr").required(false));
        }

        // Environment variable overrides with QUICKPR_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("QUICKPR")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(|e| {
            tracing::error!(error = %e, "Failed to read configuration");
            match e {
                config::ConfigError::NotFound(_) => AppError::Config(ConfigError::FileNotFound),
                config::ConfigError::Foreign(source) => AppError::Config(file_error(&*source)),
                _ => AppError::Config(ConfigError::InvalidContent),
            }
        })?;

        config.try_deserialize().map_err(|e| {
            tracing::error!(error = %e, "Invalid configuration");
            AppError::Config(ConfigError::InvalidContent)
        })
    }

    /// Validate settings that every flow depends on.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.github.token.trim().is_empty() {
            return Err("GitHub token is required");
        }
        if self.jira.credentials_path.as_os_str().is_empty() {
            return Err("JIRA config is required");
        }
        if self.evergreen.credentials_path.as_os_str().is_empty() {
            return Err("Evergreen config is required");
        }
        if self.workflow.trunk_branch.trim().is_empty() {
            return Err("Trunk branch name is required");
        }
        Ok(())
    }
}

/// A required file source reports its failure as a boxed io error.
fn file_error(source: &(dyn std::error::Error + Send + Sync + 'static)) -> ConfigError {
    match source.downcast_ref::<std::io::Error>() {
        Some(io) if io.kind() == std::io::ErrorKind::NotFound => ConfigError::FileNotFound,
        _ => ConfigError::FileUnreadable,
    }
}
