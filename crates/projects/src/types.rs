use std::path::PathBuf;

use serde::Serialize;

/// Identifier grammars accepted by the resolver, shown when input is rejected.
pub const IDENTIFIER_FORMATS: &[&str] = &[
    "main (the project's main checkout)",
    "<branch> (a worktree of the current project)",
    "<project> (a project, from outside git)",
    "<project>/<branch> (a worktree of any project)",
];

/// What a resolved identifier points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionType {
    Project,
    Worktree,
    /// The identifier was well formed enough to reject politely.
    Invalid,
}

impl std::fmt::Display for ResolutionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Worktree => write!(f, "worktree"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Outcome of resolving an identifier. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    /// Target path. Empty for `Invalid` results.
    pub resolved_path: PathBuf,
    #[serde(rename = "type")]
    pub resolution_type: ResolutionType,
    pub project_name: Option<String>,
    pub branch_name: Option<String>,
    pub explanation: String,
    /// Whether `resolved_path` currently exists on disk.
    pub exists: bool,
}

impl ResolutionResult {
    pub(crate) fn invalid(explanation: impl Into<String>) -> Self {
        Self {
            resolved_path: PathBuf::new(),
            resolution_type: ResolutionType::Invalid,
            project_name: None,
            branch_name: None,
            explanation: explanation.into(),
            exists: false,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.resolution_type != ResolutionType::Invalid
    }
}

/// A completion candidate. Lists may contain `main` next to worktree and
/// branch candidates; worktree and branch candidates never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionSuggestion {
    pub text: String,
    pub description: String,
    #[serde(rename = "type")]
    pub suggestion_type: ResolutionType,
    pub project_name: Option<String>,
    pub branch_name: Option<String>,
}

/// Knobs for [`ContextResolver::get_resolution_suggestions`](crate::ContextResolver::get_resolution_suggestions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuggestionOptions {
    /// Only suggest worktrees that exist on disk; drops `main` and branches
    /// without a worktree.
    pub existing_only: bool,
}
