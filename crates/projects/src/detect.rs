//! Classify a directory as project, worktree, or outside git.
//!
//! Classification order is fixed:
//! 1. Worktree: the path lies under `<worktrees_dir>/<project>/<branch>` and
//!    that root's `.git` is a *file* containing `gitdir:`.
//! 2. Project: the nearest ancestor holding a `.git` *directory*.
//! 3. Outside git.
//!
//! A worktree may sit inside a tree that also has a `.git` directory above
//! it, so the worktree check has to run first.

use std::{
    fs,
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tracing::debug;

use crate::{
    cache::ValidityCache,
    context::{Context, WorkspaceRoots},
    error::{Error, Result},
    paths::normalize_path,
};

/// Marker a linked worktree's `.git` file must contain.
const GITDIR_MARKER: &str = "gitdir:";

/// Filesystem check deciding whether a directory is a linked worktree root.
pub trait WorktreeProbe: Send + Sync {
    fn is_linked_worktree(&self, root: &Path) -> bool;
}

/// Reads `<root>/.git` and looks for the `gitdir:` marker.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWorktreeProbe;

impl WorktreeProbe for FsWorktreeProbe {
    fn is_linked_worktree(&self, root: &Path) -> bool {
        is_linked_worktree(root)
    }
}

/// Whether `root/.git` is a regular file mentioning `gitdir:`.
pub fn is_linked_worktree(root: &Path) -> bool {
    let git = root.join(".git");
    match fs::metadata(&git) {
        Ok(meta) if meta.is_file() => fs::read_to_string(&git)
            .map(|content| content.contains(GITDIR_MARKER))
            .unwrap_or(false),
        _ => false,
    }
}

/// Whether `dir/.git` is a directory, i.e. `dir` is a main checkout.
pub fn has_git_dir(dir: &Path) -> bool {
    fs::metadata(dir.join(".git")).is_ok_and(|meta| meta.is_dir())
}

/// Detects the [`Context`] of a directory, caching worktree validity.
pub struct ContextDetector {
    roots: WorkspaceRoots,
    cache: ValidityCache,
    probe: Arc<dyn WorktreeProbe>,
}

impl ContextDetector {
    pub fn new(roots: WorkspaceRoots, cache_ttl: Duration) -> Self {
        Self {
            roots,
            cache: ValidityCache::new(cache_ttl),
            probe: Arc::new(FsWorktreeProbe),
        }
    }

    /// Replace the filesystem probe used for worktree validation.
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn WorktreeProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn roots(&self) -> &WorkspaceRoots {
        &self.roots
    }

    /// Classify `dir`.
    ///
    /// Fails only when `dir` is empty, missing, or cannot be stat'ed.
    pub fn detect_context(&self, dir: &Path) -> Result<Context> {
        if dir.as_os_str().is_empty() {
            return Err(Error::context_detection(dir, "directory is empty"));
        }
        fs::metadata(dir).map_err(|e| Error::context_detection(dir, e.to_string()))?;
        let path = normalize_path(dir).map_err(|e| Error::context_detection(dir, e.to_string()))?;

        if let Some(ctx) = self.detect_worktree(&path) {
            debug!(path = %path.display(), root = %ctx.path.display(), "detected worktree");
            return Ok(ctx);
        }
        if let Some(ctx) = detect_project(&path) {
            debug!(path = %path.display(), root = %ctx.path.display(), "detected project");
            return Ok(ctx);
        }
        debug!(path = %path.display(), "outside git");
        Ok(Context::outside_git(path))
    }

    /// Forget cached validity for every worktree root under `repo_path`.
    ///
    /// Call after creating, removing, or pruning worktrees.
    pub fn invalidate_cache_for_repo(&self, repo_path: &Path) {
        self.cache.invalidate_under(repo_path);
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn detect_worktree(&self, path: &Path) -> Option<Context> {
        let relative = path.strip_prefix(&self.roots.worktrees_dir).ok()?;
        // A non-UTF-8 segment ends the match rather than shifting later ones up.
        let mut segments = relative.components().map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        });
        let project = segments.next().flatten()?;
        let branch = segments.next().flatten()?;

        let root = self.roots.worktree_root(project, branch);
        if !self.worktree_is_valid(&root) {
            return None;
        }
        Some(Context::worktree(root, project, branch))
    }

    fn worktree_is_valid(&self, root: &Path) -> bool {
        if let Some(valid) = self.cache.get(root) {
            debug!(root = %root.display(), valid, "worktree cache hit");
            return valid;
        }
        let valid = self.probe.is_linked_worktree(root);
        debug!(root = %root.display(), valid, "worktree cache miss");
        self.cache.insert(root.to_path_buf(), valid);
        valid
    }
}

/// Walk up from `path` to the first directory holding a `.git` directory.
fn detect_project(path: &Path) -> Option<Context> {
    let root: PathBuf = path.ancestors().find(|dir| has_git_dir(dir))?.to_path_buf();
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    Some(Context::main_checkout(root, name))
}
