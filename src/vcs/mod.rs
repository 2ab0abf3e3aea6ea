pub mod git;
pub mod remote;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

pub use git::{GitCli, GitVcs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffFormat {
    /// Full unified diff, suitable as a patch payload.
    Unified,
    /// `--stat` summary for display.
    Stat,
}

/// Read-only view of the local working copy.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// `owner/name` parsed from the first configured remote.
    async fn repository_path(&self, dir: &Path) -> Result<String>;

    /// The checked-out branch; fails when HEAD is detached.
    async fn current_branch(&self, dir: &Path) -> Result<String>;

    /// Nearest common ancestor of two refs.
    async fn merge_base(&self, dir: &Path, upstream_ref: &str, head_ref: &str) -> Result<String>;

    /// Diff of the working tree against `base`, with LF line endings.
    ///
    /// Returned as bytes: file content in a diff need not be UTF-8.
    async fn diff_since(&self, dir: &Path, base: &str, format: DiffFormat) -> Result<Vec<u8>>;

    /// The commit HEAD points to.
    async fn commit_hash(&self, dir: &Path) -> Result<String>;
}
