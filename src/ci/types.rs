use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// One build variant and the tasks to run on it. `"*"` selects every task.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariantTasks {
    #[serde(rename = "id")]
    pub variant: String,
    #[serde(default)]
    pub tasks: BTreeSet<String>,
}

impl VariantTasks {
    pub fn new<I, S>(variant: &str, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variant: variant.to_string(),
            tasks: tasks.into_iter().map(Into::into).collect(),
        }
    }
}

/// What a user asked a patch to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchConfig {
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(default)]
    pub tasks: BTreeSet<VariantTasks>,
}

impl PatchConfig {
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty() && self.tasks.is_empty()
    }

    /// Union of two configurations.
    pub fn merge(mut self, other: PatchConfig) -> Self {
        self.aliases.extend(other.aliases);
        self.tasks.extend(other.tasks);
        self
    }

    /// Build from a comma-separated alias list and a JSON selection array
    /// (`[{"id": "<variant>", "tasks": ["<task>", ...]}, ...]`).
    pub fn parse(aliases: &[String], tasks_json: Option<&str>) -> Result<Self> {
        let aliases = aliases
            .iter()
            .flat_map(|a| a.split(','))
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();

        let tasks = match tasks_json.map(str::trim) {
            Some(json) if !json.is_empty() => serde_json::from_str::<BTreeSet<VariantTasks>>(json)
                .map_err(|e| AppError::unknown(format!("Invalid variant/task selection: {e}")))?,
            _ => BTreeSet::new(),
        };

        Ok(Self { aliases, tasks })
    }
}
