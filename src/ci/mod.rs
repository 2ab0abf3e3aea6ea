pub mod evergreen;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::VariantTasks;

pub use evergreen::EvergreenClient;

/// The CI service that runs patch builds.
#[async_trait]
pub trait PatchHost: Send + Sync {
    /// Upload a diff against `base_commit`; returns the patch id.
    ///
    /// The diff is an opaque byte payload.
    async fn create_patch(
        &self,
        project: &str,
        base_commit: &str,
        diff: &[u8],
    ) -> Result<String>;

    /// Most recent version of the project, used as the build graph for alias expansion.
    async fn latest_version(&self, project: &str) -> Result<String>;

    /// Variant/task pairs a named alias selects, dependencies included.
    async fn expand_alias(
        &self,
        project: &str,
        alias: &str,
        version_id: &str,
    ) -> Result<Vec<VariantTasks>>;

    /// Add variant/task selections to a patch; returns the resulting version id.
    ///
    /// Calls accumulate: each adds or overwrites variant entries.
    async fn configure(&self, patch_id: &str, selections: &[VariantTasks]) -> Result<String>;

    /// Schedule a configured patch.
    async fn finalize(&self, patch_id: &str) -> Result<()>;

    /// Where a human can look at the patch.
    fn patch_url(&self, patch_id: &str) -> String;
}
