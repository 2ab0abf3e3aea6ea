//! Session and preset persistence.
//!
//! Sessions are keyed by (repository, branch), presets by repository. Stores
//! guarantee read-after-write and last-writer-wins; nothing more.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ci::types::PatchConfig;
use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchInfo {
    pub patch_id: String,
    pub config: PatchConfig,
}

/// What a previous run left behind for one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub pr_number: u64,
    #[serde(default)]
    pub last_patch: Option<PatchInfo>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(pr_number: u64) -> Self {
        Self {
            pr_number,
            last_patch: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_patch(mut self, patch: PatchInfo) -> Self {
        self.last_patch = Some(patch);
        self.updated_at = Utc::now();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchPreset {
    pub name: String,
    pub config: PatchConfig,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn session(&self, repo: &str, branch: &str) -> Result<Option<SessionState>>;
    async fn save_session(&self, repo: &str, branch: &str, state: SessionState) -> Result<()>;
}

#[async_trait]
pub trait PresetStore: Send + Sync {
    async fn presets(&self, repo: &str) -> Result<Vec<PatchPreset>>;

    async fn preset(&self, repo: &str, name: &str) -> Result<Option<PatchPreset>> {
        Ok(self
            .presets(repo)
            .await?
            .into_iter()
            .find(|p| p.name == name))
    }

    /// Insert or replace the preset with the same name.
    async fn save_preset(&self, repo: &str, preset: PatchPreset) -> Result<()>;

    /// Returns whether a preset was removed.
    async fn delete_preset(&self, repo: &str, name: &str) -> Result<bool>;
}

/// Everything a store persists, as one serializable document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default)]
    pub sessions: BTreeMap<String, BTreeMap<String, SessionState>>,
    #[serde(default)]
    pub presets: BTreeMap<String, Vec<PatchPreset>>,
}

impl StateDocument {
    pub fn session(&self, repo: &str, branch: &str) -> Option<&SessionState> {
        self.sessions.get(repo).and_then(|branches| branches.get(branch))
    }

    pub fn set_session(&mut self, repo: &str, branch: &str, state: SessionState) {
        self.sessions
            .entry(repo.to_string())
            .or_default()
            .insert(branch.to_string(), state);
    }

    pub fn presets(&self, repo: &str) -> Vec<PatchPreset> {
        self.presets.get(repo).cloned().unwrap_or_default()
    }

    pub fn save_preset(&mut self, repo: &str, preset: PatchPreset) {
        let presets = self.presets.entry(repo.to_string()).or_default();
        presets.retain(|p| p.name != preset.name);
        presets.push(preset);
    }

    pub fn delete_preset(&mut self, repo: &str, name: &str) -> bool {
        match self.presets.get_mut(repo) {
            Some(presets) => {
                let before = presets.len();
                presets.retain(|p| p.name != name);
                presets.len() != before
            }
            None => false,
        }
    }
}
