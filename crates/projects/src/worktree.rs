use std::{
    path::{Path, PathBuf},
    process::Output,
    time::Duration,
};

use {
    async_trait::async_trait,
    tokio::process::Command,
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    git::{BranchInfo, GitProvider, WorktreeInfo},
};

// Shells out to `git` for listing worktrees and refs. Only read-only
// porcelain commands are used here.

/// Per-command timeout used by [`CliGitProvider::default`].
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`GitProvider`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct CliGitProvider {
    program: PathBuf,
    timeout: Duration,
}

impl Default for CliGitProvider {
    fn default() -> Self {
        Self::new(DEFAULT_GIT_TIMEOUT)
    }
}

impl CliGitProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: PathBuf::from("git"),
            timeout,
        }
    }

    /// Use a different `git` binary.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    async fn run(&self, operation: &'static str, dir: &Path, args: &[&str]) -> Result<Output> {
        debug!(operation, dir = %dir.display(), "running git");
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| Error::CommandTimeout {
                operation,
                timeout: self.timeout,
            })?
            .map_err(|e| Error::command_execution(operation, e))?;
        Ok(output)
    }

    async fn run_checked(
        &self,
        operation: &'static str,
        dir: &Path,
        args: &[&str],
    ) -> Result<String> {
        let output = self.run(operation, dir, args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(operation, dir = %dir.display(), stderr = %stderr.trim(), "git command failed");
            return Err(Error::command_failed(operation, stderr.trim()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl GitProvider for CliGitProvider {
    async fn list_worktrees(&self, repo: &Path) -> Result<Vec<WorktreeInfo>> {
        let stdout = self
            .run_checked("git worktree list", repo, &["worktree", "list", "--porcelain"])
            .await?;
        Ok(parse_worktree_porcelain(&stdout))
    }

    async fn list_branches(&self, repo: &Path) -> Result<Vec<BranchInfo>> {
        let stdout = self
            .run_checked("git for-each-ref", repo, &[
                "for-each-ref",
                "--format=%(refname)",
                "refs/heads",
                "refs/remotes",
            ])
            .await?;
        Ok(parse_ref_list(&stdout))
    }

    async fn validate_repository(&self, path: &Path) -> Result<()> {
        // `rev-parse` alone would accept any folder inside an enclosing repo.
        if !path.is_dir() || !path.join(".git").exists() {
            return Err(Error::NotGitRepository {
                path: path.to_path_buf(),
            });
        }
        let output = self
            .run("git rev-parse", path, &["rev-parse", "--git-dir"])
            .await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::NotGitRepository {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Parse `git worktree list --porcelain` output.
///
/// Records are separated by blank lines; the last one may lack a trailing
/// blank line.
pub fn parse_worktree_porcelain(output: &str) -> Vec<WorktreeInfo> {
    let mut worktrees = Vec::new();
    let mut current: Option<WorktreeInfo> = None;

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            worktrees.extend(current.take());
            current = Some(WorktreeInfo {
                path: PathBuf::from(path),
                ..Default::default()
            });
            continue;
        }
        let Some(entry) = current.as_mut() else {
            continue;
        };
        if line.is_empty() {
            worktrees.extend(current.take());
        } else if let Some(head) = line.strip_prefix("HEAD ") {
            entry.head = Some(head.to_string());
        } else if let Some(branch) = line.strip_prefix("branch ") {
            let short = branch.strip_prefix("refs/heads/").unwrap_or(branch);
            entry.branch = Some(short.to_string());
        } else if line == "bare" {
            entry.bare = true;
        } else if line == "detached" {
            entry.detached = true;
        }
    }
    worktrees.extend(current);
    worktrees
}

/// Parse `git for-each-ref --format=%(refname)` output over `refs/heads`
/// and `refs/remotes`. Symbolic `HEAD` refs are skipped.
pub fn parse_ref_list(output: &str) -> Vec<BranchInfo> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            if let Some(name) = line.strip_prefix("refs/heads/") {
                return (!name.is_empty()).then(|| BranchInfo::local(name));
            }
            let rest = line.strip_prefix("refs/remotes/")?;
            let (remote, name) = rest.split_once('/')?;
            if name.is_empty() || name == "HEAD" {
                return None;
            }
            Some(BranchInfo::remote(remote, name))
        })
        .collect()
}
