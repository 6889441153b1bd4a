use std::path::{Path, PathBuf};

use serde::Serialize;

/// Where a directory sits relative to the configured projects and worktrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    /// Inside a project's main checkout (a directory with a `.git/` dir).
    Project,
    /// Inside a linked worktree at `<worktrees_dir>/<project>/<branch>`.
    Worktree,
    /// Not inside any git checkout.
    OutsideGit,
    /// Never classified. The detector does not produce this.
    #[default]
    Unknown,
}

impl std::fmt::Display for ContextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Worktree => write!(f, "worktree"),
            Self::OutsideGit => write!(f, "outside-git"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classification of a directory, as produced by
/// [`ContextDetector::detect_context`](crate::ContextDetector::detect_context).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Context {
    #[serde(rename = "type")]
    pub context_type: ContextType,
    /// Root of the classified tree: the worktree root, the project root, or
    /// the normalized input path when outside git.
    pub path: PathBuf,
    pub project_name: Option<String>,
    pub branch_name: Option<String>,
    pub explanation: String,
}

impl Context {
    pub(crate) fn worktree(root: PathBuf, project: &str, branch: &str) -> Self {
        Self {
            context_type: ContextType::Worktree,
            explanation: format!("worktree of project '{project}' on branch '{branch}'"),
            path: root,
            project_name: Some(project.to_string()),
            branch_name: Some(branch.to_string()),
        }
    }

    pub(crate) fn main_checkout(root: PathBuf, name: String) -> Self {
        Self {
            context_type: ContextType::Project,
            explanation: format!("main checkout of project '{name}'"),
            path: root,
            project_name: Some(name),
            branch_name: None,
        }
    }

    pub(crate) fn outside_git(path: PathBuf) -> Self {
        Self {
            context_type: ContextType::OutsideGit,
            explanation: format!("{} is not inside a git checkout", path.display()),
            path,
            project_name: None,
            branch_name: None,
        }
    }

    /// Project name, or an empty string when there is none.
    #[must_use]
    pub fn project(&self) -> &str {
        self.project_name.as_deref().unwrap_or_default()
    }
}

/// The two configured base directories every resolved path must live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRoots {
    pub projects_dir: PathBuf,
    pub worktrees_dir: PathBuf,
}

impl WorkspaceRoots {
    /// Build roots, normalizing both directories when possible.
    pub fn new(projects_dir: impl AsRef<Path>, worktrees_dir: impl AsRef<Path>) -> Self {
        let normalize =
            |p: &Path| crate::paths::normalize_path(p).unwrap_or_else(|_| p.to_path_buf());
        Self {
            projects_dir: normalize(projects_dir.as_ref()),
            worktrees_dir: normalize(worktrees_dir.as_ref()),
        }
    }

    /// Main checkout directory of `project`.
    #[must_use]
    pub fn project_root(&self, project: &str) -> PathBuf {
        self.projects_dir.join(project)
    }

    /// Worktree directory for `project` on `branch`.
    #[must_use]
    pub fn worktree_root(&self, project: &str, branch: &str) -> PathBuf {
        self.worktrees_dir.join(project).join(branch)
    }
}
