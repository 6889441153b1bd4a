//! Git queries consumed by the resolver.

use std::path::{Path, PathBuf};

use {async_trait::async_trait, serde::Serialize};

use crate::error::Result;

/// One entry of `git worktree list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    /// Short branch name; `None` for detached or bare entries.
    pub branch: Option<String>,
    pub head: Option<String>,
    pub bare: bool,
    pub detached: bool,
}

/// A local branch or a remote-tracking branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    /// Branch name without `refs/heads/` or the remote prefix.
    pub name: String,
    /// Remote the branch tracks, `None` for local branches.
    pub remote: Option<String>,
}

impl BranchInfo {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote: None,
        }
    }

    pub fn remote(remote: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote: Some(remote.into()),
        }
    }
}

/// Read-only repository queries. Implementations may be slow or fail;
/// callers building completions treat every error as "no results".
#[async_trait]
pub trait GitProvider: Send + Sync {
    /// All worktrees of the repository at `repo`, the main checkout first.
    async fn list_worktrees(&self, repo: &Path) -> Result<Vec<WorktreeInfo>>;

    /// Local and remote-tracking branches of the repository at `repo`.
    async fn list_branches(&self, repo: &Path) -> Result<Vec<BranchInfo>>;

    /// `Ok(())` when `path` is a git repository.
    async fn validate_repository(&self, path: &Path) -> Result<()>;
}
