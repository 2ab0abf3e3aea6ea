//! The two user-facing flows.
//!
//! Both are straight-line async functions: every step is awaited in order
//! and `?` abandons the rest of the flow on the first error. Nothing is
//! retried or rolled back, so a patch created but not configured, or a PR
//! created but not commented on, stays visible if a later step fails.

pub mod patch;
pub mod pr;
pub mod types;

#[cfg(test)]
mod testing;

use std::collections::HashMap;

use crate::config::AppConfig;
use crate::error::AppError;

pub use patch::PatchFlow;
pub use pr::PullRequestFlow;
pub use types::*;

/// Settings both flows read.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub trunk_branch: String,
    /// Repository name -> CI project.
    pub projects: HashMap<String, String>,
}

impl WorkflowSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            trunk_branch: config.workflow.trunk_branch.clone(),
            projects: config.evergreen.projects.clone(),
        }
    }

    /// The upstream tracking ref of the trunk, which patches diff against.
    pub fn upstream_ref(&self) -> String {
        format!("{}@{{upstream}}", self.trunk_branch)
    }

    /// The CI project for a repository, falling back to the repository name.
    pub fn project_for(&self, repo_name: &str) -> String {
        self.projects
            .get(repo_name)
            .cloned()
            .unwrap_or_else(|| repo_name.to_string())
    }
}

/// Log a failed flow and pick the one message to show for it.
pub fn failure_message(flow: &str, err: &AppError) -> &'static str {
    tracing::error!(flow, error = %err, "Flow aborted");
    err.user_message()
}
