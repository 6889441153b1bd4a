//! Context detection and identifier resolution for arbor workspaces.
//!
//! A workspace has a projects directory holding main checkouts and a
//! worktrees directory laid out as `<project>/<branch>`. The
//! [`ContextDetector`] classifies where a path sits in that layout, and the
//! [`ContextResolver`] turns short identifiers (`main`, a branch name,
//! `project/branch`) into paths proven to stay inside it.

pub mod cache;
pub mod complete;
pub mod context;
pub mod detect;
pub mod error;
pub mod git;
pub mod paths;
pub mod resolve;
pub mod types;
pub mod worktree;

pub use {
    cache::ValidityCache,
    context::{Context, ContextType, WorkspaceRoots},
    detect::{ContextDetector, FsWorktreeProbe, WorktreeProbe},
    error::{Error, Result},
    git::{BranchInfo, GitProvider, WorktreeInfo},
    paths::{clean_path, contains_path_traversal, is_path_under, normalize_path},
    resolve::{ContextResolver, MAIN_IDENTIFIER},
    types::{
        IDENTIFIER_FORMATS, ResolutionResult, ResolutionSuggestion, ResolutionType,
        SuggestionOptions,
    },
    worktree::{CliGitProvider, DEFAULT_GIT_TIMEOUT},
};
