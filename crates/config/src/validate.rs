//! Configuration validation.
//!
//! Checks the effective (already expanded) configuration for problems that
//! would make context detection or resolution misbehave.

use std::path::{Path, PathBuf};

use crate::{duration::parse_duration, schema::ArborConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "path", "layout", "missing", "duration", "effective"
    pub category: &'static str,
    /// Config key the diagnostic refers to, e.g. "projects_dir"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, category: &'static str, key: &str, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: key.to_string(),
            message,
        });
    }
}

/// Validate an effective configuration.
#[must_use]
pub fn validate(config: &ArborConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_directory(&mut result, "projects_dir", &config.projects_dir);
    check_directory(&mut result, "worktrees_dir", &config.worktrees_dir);

    let projects = &config.projects_dir;
    let worktrees = &config.worktrees_dir;
    if projects.is_absolute() && worktrees.is_absolute() {
        if projects == worktrees {
            result.push(
                Severity::Error,
                "layout",
                "worktrees_dir",
                "projects_dir and worktrees_dir must be different directories".into(),
            );
        } else if worktrees.starts_with(projects) || projects.starts_with(worktrees) {
            result.push(
                Severity::Warning,
                "layout",
                "worktrees_dir",
                format!(
                    "{} and {} are nested; worktrees may be mistaken for projects",
                    projects.display(),
                    worktrees.display()
                ),
            );
        }
    }

    if !config.cache_ttl.trim().is_empty()
        && let Err(e) = parse_duration(&config.cache_ttl)
    {
        result.push(
            Severity::Warning,
            "duration",
            "cache_ttl",
            format!("{e}; the default of 5s will be used"),
        );
    }

    result.push(
        Severity::Info,
        "effective",
        "cache_ttl",
        format!(
            "worktree checks are cached for {:?}",
            config.cache_ttl_duration()
        ),
    );
    if !config.validate_git {
        result.push(
            Severity::Info,
            "effective",
            "validate_git",
            "discovered projects are listed without checking for a git repository".into(),
        );
    }

    result
}

fn check_directory(result: &mut ValidationResult, key: &str, dir: &Path) {
    if dir.as_os_str().is_empty() {
        result.push(Severity::Error, "path", key, "must not be empty".into());
        return;
    }
    if !dir.is_absolute() {
        result.push(
            Severity::Error,
            "path",
            key,
            format!("{} is not an absolute path", dir.display()),
        );
        return;
    }
    if !dir.is_dir() {
        result.push(
            Severity::Warning,
            "missing",
            key,
            format!("{} does not exist", dir.display()),
        );
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(root: &Path) -> ArborConfig {
        let projects = root.join("Projects");
        let worktrees = root.join("Worktrees");
        std::fs::create_dir_all(&projects).unwrap();
        std::fs::create_dir_all(&worktrees).unwrap();
        ArborConfig {
            projects_dir: projects,
            worktrees_dir: worktrees,
            ..Default::default()
        }
    }

    #[test]
    fn valid_layout_has_only_info() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate(&config_in(dir.path()));
        assert!(
            result.diagnostics.iter().all(|d| d.severity == Severity::Info),
            "{:?}",
            result.diagnostics
        );
    }

    #[test]
    fn reports_effective_settings_as_info() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ArborConfig {
            cache_ttl: "750ms".into(),
            validate_git: false,
            ..config_in(dir.path())
        };
        let result = validate(&cfg);
        assert_eq!(result.count(Severity::Info), 2);

        let ttl = result
            .diagnostics
            .iter()
            .find(|d| d.path == "cache_ttl")
            .unwrap();
        assert_eq!(ttl.severity, Severity::Info);
        assert!(ttl.message.contains("750ms"), "{}", ttl.message);
        assert!(result.diagnostics.iter().any(|d| d.path == "validate_git"));
    }

    #[test]
    fn relative_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ArborConfig {
            projects_dir: "Projects".into(),
            ..config_in(dir.path())
        };
        let result = validate(&cfg);
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].path, "projects_dir");
    }

    #[test]
    fn identical_directories_are_error() {
        let dir = tempfile::tempdir().unwrap();
        let base = config_in(dir.path());
        let cfg = ArborConfig {
            worktrees_dir: base.projects_dir.clone(),
            ..base
        };
        let result = validate(&cfg);
        assert!(result.has_errors());
        assert!(result.diagnostics.iter().any(|d| d.category == "layout"));
    }

    #[test]
    fn nested_directories_warn() {
        let dir = tempfile::tempdir().unwrap();
        let base = config_in(dir.path());
        let nested = base.projects_dir.join(".worktrees");
        std::fs::create_dir_all(&nested).unwrap();
        let cfg = ArborConfig {
            worktrees_dir: nested,
            ..base
        };
        let result = validate(&cfg);
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn missing_directory_and_bad_ttl_warn() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ArborConfig {
            projects_dir: dir.path().join("nope"),
            worktrees_dir: dir.path().join("Worktrees"),
            cache_ttl: "soonish".into(),
            validate_git: true,
        };
        std::fs::create_dir_all(&cfg.worktrees_dir).unwrap();
        let result = validate(&cfg);
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 2);
    }
}
