use std::path::Path;
use std::sync::Arc;

use crate::ci::types::{PatchConfig, VariantTasks};
use crate::ci::PatchHost;
use crate::error::{PatchError, Result};
use crate::platform::CodeHost;
use crate::state::{PatchInfo, PresetStore, SessionState, SessionStore};
use crate::vcs::{DiffFormat, VersionControl};

use super::types::{ConfigSource, PatchOutcome, PatchRequest, PullRequestContext};
use super::WorkflowSettings;

/// Merge the explicit selections with a preset or the branch's last patch.
pub async fn resolve_patch_config(
    presets: &dyn PresetStore,
    repo_key: &str,
    explicit: PatchConfig,
    source: &ConfigSource,
    last_patch: Option<&PatchInfo>,
) -> Result<PatchConfig> {
    match source {
        ConfigSource::Explicit => Ok(explicit),
        ConfigSource::Preset(name) => {
            let preset = presets
                .preset(repo_key, name)
                .await?
                .ok_or(PatchError::PresetNotFound)?;
            Ok(explicit.merge(preset.config))
        }
        ConfigSource::LastUsed => match last_patch {
            Some(info) => Ok(explicit.merge(info.config.clone())),
            None => {
                tracing::warn!(repo = repo_key, "No previous patch recorded for this branch");
                Ok(explicit)
            }
        },
    }
}

/// Uploads the branch's changes as a CI patch and links it from the PR.
pub struct PatchFlow {
    vcs: Arc<dyn VersionControl>,
    host: Arc<dyn CodeHost>,
    ci: Arc<dyn PatchHost>,
    sessions: Arc<dyn SessionStore>,
    presets: Arc<dyn PresetStore>,
    settings: WorkflowSettings,
}

impl PatchFlow {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        host: Arc<dyn CodeHost>,
        ci: Arc<dyn PatchHost>,
        sessions: Arc<dyn SessionStore>,
        presets: Arc<dyn PresetStore>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            vcs,
            host,
            ci,
            sessions,
            presets,
            settings,
        }
    }

    pub async fn run(
        &self,
        dir: &Path,
        ctx: &PullRequestContext,
        request: PatchRequest,
    ) -> Result<PatchOutcome> {
        let repo_key = ctx.repo.full_name();
        let config = resolve_patch_config(
            self.presets.as_ref(),
            &repo_key,
            request.config,
            &request.source,
            ctx.last_patch.as_ref(),
        )
        .await?;

        if request.finalize && config.is_empty() {
            return Err(PatchError::NothingSelected.into());
        }

        let base_commit = self
            .vcs
            .merge_base(dir, &self.settings.upstream_ref(), "HEAD")
            .await?;
        let diff_stat = self.vcs.diff_since(dir, &base_commit, DiffFormat::Stat).await?;
        let diff_stat = String::from_utf8_lossy(&diff_stat).into_owned();
        let diff = self
            .vcs
            .diff_since(dir, &base_commit, DiffFormat::Unified)
            .await?;

        let project = self.settings.project_for(&ctx.repo.name);
        let patch_id = self.ci.create_patch(&project, &base_commit, &diff).await?;
        tracing::info!(patch_id = %patch_id, project = %project, base = %base_commit, "Created patch");

        let mut version_id = None;

        if !config.aliases.is_empty() {
            let graph_version = self.ci.latest_version(&project).await?;
            for alias in &config.aliases {
                let selections = self
                    .ci
                    .expand_alias(&project, alias, &graph_version)
                    .await?;
                if selections.is_empty() {
                    tracing::warn!(alias = %alias, "Alias selects no tasks, skipping");
                    continue;
                }
                version_id = Some(self.ci.configure(&patch_id, &selections).await?);
            }
        }

        if !config.tasks.is_empty() {
            let selections: Vec<VariantTasks> = config.tasks.iter().cloned().collect();
            version_id = Some(self.ci.configure(&patch_id, &selections).await?);
        }

        if request.finalize {
            // Every alias may have expanded to nothing
            if version_id.is_none() {
                return Err(PatchError::NothingSelected.into());
            }
            self.ci.finalize(&patch_id).await?;
            tracing::info!(patch_id = %patch_id, "Finalized patch");
        }

        let state = SessionState::new(ctx.pull_request.number).with_patch(PatchInfo {
            patch_id: patch_id.clone(),
            config: config.clone(),
        });
        self.sessions.save_session(&repo_key, &ctx.branch, state).await?;

        let patch_url = self.ci.patch_url(&patch_id);
        let commit = self.vcs.commit_hash(dir).await?;
        self.host
            .add_comment(
                &ctx.repo,
                ctx.pull_request.number,
                &format!("{commit}: {patch_url}"),
            )
            .await?;

        Ok(PatchOutcome {
            patch_id,
            patch_url,
            base_commit,
            diff_stat,
            applied: config,
            version_id,
            finalized: request.finalize,
        })
    }
}
