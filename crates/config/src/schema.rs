//! Config schema types.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{duration::parse_ttl_or_default, expand::expand_tilde};

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArborConfig {
    /// Directory holding the main checkout of every project.
    pub projects_dir: PathBuf,
    /// Directory holding worktrees, laid out as `<project>/<branch>`.
    pub worktrees_dir: PathBuf,
    /// How long worktree validity checks stay cached (e.g. "5s", "500ms").
    pub cache_ttl: String,
    /// Whether discovered project directories must be valid git repositories.
    pub validate_git: bool,
}

impl Default for ArborConfig {
    fn default() -> Self {
        Self {
            projects_dir: PathBuf::from("~/Projects"),
            worktrees_dir: PathBuf::from("~/Worktrees"),
            cache_ttl: "5s".into(),
            validate_git: true,
        }
    }
}

impl ArborConfig {
    /// Cache TTL as a [`Duration`], defaulting to five seconds when the
    /// configured value is empty or unparsable.
    #[must_use]
    pub fn cache_ttl_duration(&self) -> Duration {
        parse_ttl_or_default(&self.cache_ttl)
    }

    /// Expand `~` in both directory settings.
    #[must_use]
    pub fn expanded(mut self) -> Self {
        self.projects_dir = expand_tilde(&self.projects_dir);
        self.worktrees_dir = expand_tilde(&self.worktrees_dir);
        self
    }
}
