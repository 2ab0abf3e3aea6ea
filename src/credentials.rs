//! YAML credential files for Jira and Evergreen.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Read and parse a YAML file, mapping every failure onto [`ConfigError`].
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.is_file() {
        tracing::warn!(path = %path.display(), "Credentials file does not exist");
        return Err(ConfigError::FileNotFound.into());
    }

    let raw = std::fs::read_to_string(path).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Credentials file cannot be read");
        ConfigError::FileUnreadable
    })?;

    serde_yaml::from_str(&raw).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Credentials file has invalid content");
        ConfigError::InvalidContent.into()
    })
}

fn require_filled(values: &[&str]) -> Result<()> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ConfigError::InvalidContent.into());
    }
    Ok(())
}

#[derive(Deserialize)]
struct JiraFile {
    jira: JiraCredentials,
}

#[derive(Deserialize, Clone)]
pub struct JiraCredentials {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub access_token_secret: String,
    #[serde(default)]
    pub consumer_key: String,
    /// PEM-encoded RSA private key.
    #[serde(default)]
    pub key_cert: String,
}

// Manual Debug impl to avoid leaking secrets
impl std::fmt::Debug for JiraCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraCredentials")
            .field("access_token", &"[REDACTED]")
            .field("access_token_secret", &"[REDACTED]")
            .field("consumer_key", &self.consumer_key)
            .field("key_cert", &"[REDACTED]")
            .finish()
    }
}

impl JiraCredentials {
    pub fn load(path: &Path) -> Result<Self> {
        let file: JiraFile = load_yaml(path)?;
        let creds = file.jira;
        require_filled(&[
            creds.access_token.as_str(),
            creds.access_token_secret.as_str(),
            creds.consumer_key.as_str(),
            creds.key_cert.as_str(),
        ])?;
        Ok(creds)
    }
}

#[derive(Deserialize, Clone)]
pub struct EvergreenCredentials {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub api_key: String,
}

impl std::fmt::Debug for EvergreenCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvergreenCredentials")
            .field("user", &self.user)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl EvergreenCredentials {
    pub fn load(path: &Path) -> Result<Self> {
        let creds: EvergreenCredentials = load_yaml(path)?;
        require_filled(&[creds.user.as_str(), creds.api_key.as_str()])?;
        Ok(creds)
    }
}
