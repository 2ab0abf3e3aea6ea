use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Result, ResultExt};

use super::{PatchPreset, PresetStore, SessionState, SessionStore, StateDocument};

/// Keeps the whole state document in one JSON file.
///
/// Every write reloads the file, applies the change and replaces the file,
/// so concurrent runs degrade to last-writer-wins.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StateDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(StateDocument::default()),
            Ok(bytes) => serde_json::from_slice(&bytes).or_unknown("Corrupt state file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, document: &StateDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn update<T>(&self, apply: impl FnOnce(&mut StateDocument) -> T + Send) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let result = apply(&mut document);
        self.store(&document).await?;
        tracing::debug!(path = %self.path.display(), "Saved state");
        Ok(result)
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn session(&self, repo: &str, branch: &str) -> Result<Option<SessionState>> {
        Ok(self.load().await?.session(repo, branch).cloned())
    }

    async fn save_session(&self, repo: &str, branch: &str, state: SessionState) -> Result<()> {
        self.update(|doc| doc.set_session(repo, branch, state)).await
    }
}

#[async_trait]
impl PresetStore for FileStore {
    async fn presets(&self, repo: &str) -> Result<Vec<PatchPreset>> {
        Ok(self.load().await?.presets(repo))
    }

    async fn save_preset(&self, repo: &str, preset: PatchPreset) -> Result<()> {
        self.update(|doc| doc.save_preset(repo, preset)).await
    }

    async fn delete_preset(&self, repo: &str, name: &str) -> Result<bool> {
        self.update(|doc| doc.delete_preset(repo, name)).await
    }
}
