use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

use super::{PatchPreset, PresetStore, SessionState, SessionStore, StateDocument};

/// Process-local store; contents are lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    document: RwLock<StateDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn session(&self, repo: &str, branch: &str) -> Result<Option<SessionState>> {
        Ok(self.document.read().await.session(repo, branch).cloned())
    }

    async fn save_session(&self, repo: &str, branch: &str, state: SessionState) -> Result<()> {
        self.document.write().await.set_session(repo, branch, state);
        Ok(())
    }
}

#[async_trait]
impl PresetStore for MemoryStore {
    async fn presets(&self, repo: &str) -> Result<Vec<PatchPreset>> {
        Ok(self.document.read().await.presets(repo))
    }

    async fn save_preset(&self, repo: &str, preset: PatchPreset) -> Result<()> {
        self.document.write().await.save_preset(repo, preset);
        Ok(())
    }

    async fn delete_preset(&self, repo: &str, name: &str) -> Result<bool> {
        Ok(self.document.write().await.delete_preset(repo, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_after_write_and_last_writer_wins() {
        let store = MemoryStore::new();
        assert!(store.session("mms", "CLOUDP-1").await.unwrap().is_none());

        store
            .save_session("mms", "CLOUDP-1", SessionState::new(1))
            .await
            .unwrap();
        assert_eq!(
            store.session("mms", "CLOUDP-1").await.unwrap().unwrap().pr_number,
            1
        );

        store
            .save_session("mms", "CLOUDP-1", SessionState::new(2))
            .await
            .unwrap();
        assert_eq!(
            store.session("mms", "CLOUDP-1").await.unwrap().unwrap().pr_number,
            2
        );
    }
}
