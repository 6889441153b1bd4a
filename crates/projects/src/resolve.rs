//! Turn short identifiers into workspace paths.
//!
//! | context     | `main`                 | `name`                       | `project/branch`            |
//! |-------------|------------------------|------------------------------|-----------------------------|
//! | project     | the project root       | `<worktrees>/<project>/name` | `<worktrees>/project/branch` |
//! | worktree    | `<projects>/<project>` | `<worktrees>/<project>/name` | `<worktrees>/project/branch` |
//! | outside git | `<projects>/main`      | `<projects>/name`            | `<worktrees>/project/branch` |
//!
//! Identifiers are screened for traversal before any join, and every joined
//! path must pass [`is_path_under`] for its base directory.

use std::{path::PathBuf, sync::Arc};

use tracing::{debug, warn};

use crate::{
    context::{Context, ContextType, WorkspaceRoots},
    error::{Error, Result},
    git::GitProvider,
    paths::{contains_path_traversal, is_path_under},
    types::{ResolutionResult, ResolutionType},
};

/// Identifier naming a project's main checkout.
pub const MAIN_IDENTIFIER: &str = "main";

/// Resolves identifiers against a detected [`Context`].
pub struct ContextResolver {
    pub(crate) roots: WorkspaceRoots,
    pub(crate) git: Arc<dyn GitProvider>,
    pub(crate) validate_git: bool,
}

/// A resolved path before its containment proof.
struct Candidate {
    path: PathBuf,
    kind: ResolutionType,
    project: String,
    branch: Option<String>,
    explanation: String,
}

impl ContextResolver {
    pub fn new(roots: WorkspaceRoots, git: Arc<dyn GitProvider>) -> Self {
        Self {
            roots,
            git,
            validate_git: true,
        }
    }

    /// Whether project discovery asks git to validate each candidate
    /// directory. Enabled by default.
    #[must_use]
    pub fn with_git_validation(mut self, enabled: bool) -> Self {
        self.validate_git = enabled;
        self
    }

    pub fn roots(&self) -> &WorkspaceRoots {
        &self.roots
    }

    /// Resolve `identifier` from `ctx`.
    ///
    /// Empty identifiers, traversal attempts and paths escaping the
    /// configured directories are errors. A malformed `project/branch`
    /// reference or an unclassified context yields an
    /// [`Invalid`](ResolutionType::Invalid) result instead.
    pub fn resolve_identifier(&self, ctx: &Context, identifier: &str) -> Result<ResolutionResult> {
        let id = identifier.trim();
        if id.is_empty() {
            return Err(Error::resolution(identifier, &ctx.path, "identifier is empty"));
        }
        if contains_path_traversal(id) {
            warn!(identifier, context = %ctx.path.display(), "rejected traversal in identifier");
            return Err(Error::resolution(
                identifier,
                &ctx.path,
                "path traversal detected in identifier",
            ));
        }

        let candidate = match ctx.context_type {
            ContextType::Unknown => {
                return Ok(ResolutionResult::invalid(format!(
                    "cannot resolve '{id}' from an unclassified context; expected one of: main, \
                     <branch>, <project>/<branch>"
                )));
            },
            _ if id.contains('/') => match self.cross_project(ctx, identifier, id)? {
                Some(candidate) => candidate,
                None => {
                    return Ok(ResolutionResult::invalid(format!(
                        "'{id}' is not a valid cross-project reference; expected <project>/<branch>"
                    )));
                },
            },
            ContextType::Project | ContextType::Worktree => {
                let Some(project) = ctx.project_name.as_deref() else {
                    return Ok(ResolutionResult::invalid(format!(
                        "{} context at {} has no project name",
                        ctx.context_type,
                        ctx.path.display()
                    )));
                };
                check_component(ctx, identifier, project, "project name")?;
                if id == MAIN_IDENTIFIER {
                    self.main_checkout(ctx, project)
                } else {
                    check_component(ctx, identifier, id, "branch name")?;
                    self.worktree(project, id)
                }
            },
            ContextType::OutsideGit => {
                check_component(ctx, identifier, id, "project name")?;
                Candidate {
                    path: self.roots.project_root(id),
                    kind: ResolutionType::Project,
                    project: id.to_string(),
                    branch: None,
                    explanation: format!("main checkout of project '{id}'"),
                }
            },
        };

        self.prove_contained(ctx, identifier, candidate)
    }

    fn main_checkout(&self, ctx: &Context, project: &str) -> Candidate {
        let path = match ctx.context_type {
            ContextType::Project => ctx.path.clone(),
            _ => self.roots.project_root(project),
        };
        Candidate {
            path,
            kind: ResolutionType::Project,
            project: project.to_string(),
            branch: None,
            explanation: format!("main checkout of project '{project}'"),
        }
    }

    fn worktree(&self, project: &str, branch: &str) -> Candidate {
        Candidate {
            path: self.roots.worktree_root(project, branch),
            kind: ResolutionType::Worktree,
            project: project.to_string(),
            branch: Some(branch.to_string()),
            explanation: format!("worktree of project '{project}' on branch '{branch}'"),
        }
    }

    /// `None` when `id` is not exactly two non-empty `/`-separated segments.
    fn cross_project(
        &self,
        ctx: &Context,
        identifier: &str,
        id: &str,
    ) -> Result<Option<Candidate>> {
        let segments: Vec<&str> = id.split('/').collect();
        let [project, branch] = segments.as_slice() else {
            return Ok(None);
        };
        if project.is_empty() || branch.is_empty() {
            return Ok(None);
        }
        check_component(ctx, identifier, project, "project name")?;
        check_component(ctx, identifier, branch, "branch name")?;
        Ok(Some(self.worktree(project, branch)))
    }

    fn prove_contained(
        &self,
        ctx: &Context,
        identifier: &str,
        candidate: Candidate,
    ) -> Result<ResolutionResult> {
        let path = &candidate.path;
        let contained = match candidate.kind {
            ResolutionType::Worktree => is_path_under(&self.roots.worktrees_dir, path)?,
            // A project-context main checkout is wherever the detector found it.
            _ if ctx.context_type == ContextType::Project && *path == ctx.path => {
                is_path_under(&self.roots.projects_dir, path)?
                    || is_path_under(&self.roots.worktrees_dir, path)?
            },
            _ => is_path_under(&self.roots.projects_dir, path)?,
        };
        if !contained {
            warn!(
                identifier,
                resolved = %candidate.path.display(),
                "resolved path escapes the configured directories"
            );
            return Err(Error::resolution(
                identifier,
                &ctx.path,
                format!(
                    "resolved path {} is outside the configured directories",
                    candidate.path.display()
                ),
            ));
        }

        let exists = candidate.path.exists();
        debug!(
            identifier,
            resolved = %candidate.path.display(),
            kind = %candidate.kind,
            exists,
            "resolved identifier"
        );
        Ok(ResolutionResult {
            resolved_path: candidate.path,
            resolution_type: candidate.kind,
            project_name: Some(candidate.project),
            branch_name: candidate.branch,
            explanation: candidate.explanation,
            exists,
        })
    }
}

/// Reject a single path component that could step outside its parent.
fn check_component(ctx: &Context, identifier: &str, component: &str, what: &str) -> Result<()> {
    let reason = if component.is_empty() {
        Some("is empty")
    } else if component == "." {
        Some("refers to the current directory")
    } else if contains_path_traversal(component) {
        Some("contains path traversal")
    } else if component.contains(['/', '\\', '\0']) {
        Some("contains a path separator")
    } else {
        None
    };
    match reason {
        Some(reason) => {
            warn!(identifier, component, what, reason, "rejected identifier component");
            Err(Error::resolution(
                identifier,
                &ctx.path,
                format!("{what} '{component}' {reason}"),
            ))
        },
        None => Ok(()),
    }
}
