//! Completion candidates for identifiers.
//!
//! Candidates come from independent sources. Each source returns a
//! [`Result`]; [`flatten`] is the single place where a failed source turns
//! into "no candidates", so completion never errors out of a shell.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    context::{Context, ContextType},
    error::Result,
    git::WorktreeInfo,
    paths::{contains_path_traversal, normalize_path},
    resolve::{ContextResolver, MAIN_IDENTIFIER},
    types::{ResolutionSuggestion, ResolutionType, SuggestionOptions},
};

/// Sources in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Source {
    Main,
    Worktrees,
    Branches,
    Projects,
    CrossProject,
}

impl Source {
    fn name(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Worktrees => "worktrees",
            Self::Branches => "branches",
            Self::Projects => "projects",
            Self::CrossProject => "cross-project",
        }
    }
}

/// Keep a source's candidates, or log its failure and contribute nothing.
fn flatten(
    source: Source,
    result: Result<Vec<ResolutionSuggestion>>,
) -> impl Iterator<Item = (Source, ResolutionSuggestion)> {
    let suggestions = result.unwrap_or_else(|e| {
        debug!(source = source.name(), error = %e, "suggestion source failed");
        Vec::new()
    });
    suggestions.into_iter().map(move |s| (source, s))
}

impl ContextResolver {
    /// Suggest identifiers starting with `partial` from `ctx`.
    ///
    /// Never fails: git errors only remove the affected source's
    /// candidates. Output is ordered by source (main, worktrees, branches,
    /// projects, cross-project) and then by text.
    pub async fn get_resolution_suggestions(
        &self,
        ctx: &Context,
        partial: &str,
        options: SuggestionOptions,
    ) -> Vec<ResolutionSuggestion> {
        if contains_path_traversal(partial) {
            debug!(partial, "no suggestions for traversal input");
            return Vec::new();
        }

        let mut out: Vec<(Source, ResolutionSuggestion)> = Vec::new();

        if let Some((project, branch_prefix)) = partial.split_once('/') {
            if ctx.context_type != ContextType::Unknown {
                out.extend(flatten(
                    Source::CrossProject,
                    self.cross_project_suggestions(project, branch_prefix, options)
                        .await,
                ));
            }
        } else {
            match ctx.context_type {
                ContextType::Project | ContextType::Worktree => {
                    if let Some(project) = ctx.project_name.as_deref() {
                        self.project_suggestions(ctx, project, partial, options, &mut out)
                            .await;
                    }
                },
                ContextType::OutsideGit => {
                    out.extend(flatten(
                        Source::Projects,
                        self.discover_projects(partial).await,
                    ));
                },
                ContextType::Unknown => {},
            }
        }

        out.sort_by(|(a, x), (b, y)| a.cmp(b).then_with(|| x.text.cmp(&y.text)));
        out.into_iter().map(|(_, s)| s).collect()
    }

    async fn project_suggestions(
        &self,
        ctx: &Context,
        project: &str,
        partial: &str,
        options: SuggestionOptions,
        out: &mut Vec<(Source, ResolutionSuggestion)>,
    ) {
        if !options.existing_only && MAIN_IDENTIFIER.starts_with(partial) {
            out.push((Source::Main, ResolutionSuggestion {
                text: MAIN_IDENTIFIER.to_string(),
                description: format!("main checkout of {project}"),
                suggestion_type: ResolutionType::Project,
                project_name: Some(project.to_string()),
                branch_name: None,
            }));
        }

        if contains_path_traversal(project) {
            return;
        }
        let repo = self.repository_for(ctx, project);
        let worktrees = self.git.list_worktrees(&repo).await;

        // Every branch checked out anywhere, the main checkout included.
        // `None` when the listing failed and checkouts are unknown.
        let checked_out: Option<BTreeSet<String>> = worktrees
            .as_ref()
            .ok()
            .map(|wts| wts.iter().filter_map(|wt| wt.branch.clone()).collect());

        out.extend(flatten(
            Source::Worktrees,
            worktrees.map(|wts| worktree_suggestions(&repo, project, &wts, "", partial, options)),
        ));

        if !options.existing_only {
            out.extend(flatten(
                Source::Branches,
                self.branch_suggestions(&repo, project, partial, checked_out.as_ref())
                    .await,
            ));
        }
    }

    /// Repository whose worktrees and branches describe `ctx`'s project.
    fn repository_for(&self, ctx: &Context, project: &str) -> PathBuf {
        match ctx.context_type {
            ContextType::Project => ctx.path.clone(),
            _ => self.roots.project_root(project),
        }
    }

    async fn branch_suggestions(
        &self,
        repo: &Path,
        project: &str,
        partial: &str,
        checked_out: Option<&BTreeSet<String>>,
    ) -> Result<Vec<ResolutionSuggestion>> {
        let branches = self.git.list_branches(repo).await?;
        let mut seen = BTreeSet::new();
        Ok(branches
            .into_iter()
            .filter(|b| b.name != "HEAD" && b.name != MAIN_IDENTIFIER)
            .filter(|b| b.name.starts_with(partial))
            .filter(|b| checked_out.is_none_or(|set| !set.contains(&b.name)))
            .filter(|b| seen.insert(b.name.clone()))
            .map(|b| {
                let origin = b
                    .remote
                    .as_deref()
                    .map(|r| format!(" from {r}"))
                    .unwrap_or_default();
                let description = if checked_out.is_some() {
                    format!("create worktree for {}{origin}", b.name)
                } else {
                    format!("branch {}{origin}", b.name)
                };
                ResolutionSuggestion {
                    description,
                    text: b.name.clone(),
                    suggestion_type: ResolutionType::Project,
                    project_name: Some(project.to_string()),
                    branch_name: Some(b.name),
                }
            })
            .collect())
    }

    /// Directories under the projects directory that look like projects.
    async fn discover_projects(&self, partial: &str) -> Result<Vec<ResolutionSuggestion>> {
        let mut entries = tokio::fs::read_dir(&self.roots.projects_dir).await?;
        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !name.starts_with(partial) {
                continue;
            }
            let path = entry.path();
            if !tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
                continue;
            }
            if self.validate_git
                && let Err(e) = self.git.validate_repository(&path).await
            {
                debug!(path = %path.display(), error = %e, "skipping non-repository");
                continue;
            }
            found.push(ResolutionSuggestion {
                description: format!("project at {}", path.display()),
                text: name.clone(),
                suggestion_type: ResolutionType::Project,
                project_name: Some(name),
                branch_name: None,
            });
        }
        Ok(found)
    }

    async fn cross_project_suggestions(
        &self,
        project: &str,
        branch_prefix: &str,
        options: SuggestionOptions,
    ) -> Result<Vec<ResolutionSuggestion>> {
        if project.is_empty() || project == "." || branch_prefix.contains('/') {
            return Ok(Vec::new());
        }
        let repo = self.roots.project_root(project);
        let worktrees = self.git.list_worktrees(&repo).await?;
        let prefix = format!("{project}/");
        Ok(worktree_suggestions(
            &repo,
            project,
            &worktrees,
            &prefix,
            branch_prefix,
            options,
        ))
    }
}

/// Worktree candidates, skipping the main checkout, bare and detached
/// entries. `prefix` is prepended to each branch name in the text.
fn worktree_suggestions(
    repo: &Path,
    project: &str,
    worktrees: &[WorktreeInfo],
    prefix: &str,
    partial: &str,
    options: SuggestionOptions,
) -> Vec<ResolutionSuggestion> {
    let repo = normalize_path(repo).unwrap_or_else(|_| repo.to_path_buf());
    worktrees
        .iter()
        .filter(|wt| !wt.bare && !wt.detached)
        .filter(|wt| normalize_path(&wt.path).ok().is_none_or(|p| p != repo))
        .filter_map(|wt| Some((wt, wt.branch.as_deref()?)))
        .filter(|(_, branch)| branch.starts_with(partial))
        .filter(|(wt, _)| !options.existing_only || wt.path.exists())
        .map(|(wt, branch)| ResolutionSuggestion {
            text: format!("{prefix}{branch}"),
            description: format!("worktree at {}", wt.path.display()),
            suggestion_type: ResolutionType::Worktree,
            project_name: Some(project.to_string()),
            branch_name: Some(branch.to_string()),
        })
        .collect()
}
