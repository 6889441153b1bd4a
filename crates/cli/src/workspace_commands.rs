use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Result,
    arbor_config::ArborConfig,
    arbor_projects::{
        CliGitProvider, Context, ContextDetector, ContextResolver, Error, ResolutionSuggestion,
        SuggestionOptions, WorkspaceRoots,
    },
    tracing::debug,
};

/// Exit code for an identifier that parsed but could not name a target.
const EXIT_INVALID: i32 = 2;

struct Workspace {
    detector: ContextDetector,
    resolver: ContextResolver,
}

impl Workspace {
    fn new(config: &ArborConfig) -> Self {
        let roots = WorkspaceRoots::new(&config.projects_dir, &config.worktrees_dir);
        Self {
            detector: ContextDetector::new(roots.clone(), config.cache_ttl_duration()),
            resolver: ContextResolver::new(roots, Arc::new(CliGitProvider::default()))
                .with_git_validation(config.validate_git),
        }
    }

    fn detect(&self, from: Option<PathBuf>) -> Result<Context> {
        let dir = match from {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        Ok(self.detector.detect_context(&dir)?)
    }
}

pub fn handle_detect(config: &ArborConfig, path: Option<PathBuf>, json: bool) -> Result<()> {
    let ctx = Workspace::new(config).detect(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ctx)?);
    } else {
        for line in context_lines(&ctx) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn handle_resolve(
    config: &ArborConfig,
    identifier: &str,
    from: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let workspace = Workspace::new(config);
    let ctx = workspace.detect(from)?;

    let result = match workspace.resolver.resolve_identifier(&ctx, identifier) {
        Ok(result) => result,
        Err(e) => {
            for line in resolution_error_lines(&e) {
                eprintln!("{line}");
            }
            std::process::exit(1);
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    if !result.is_valid() {
        eprintln!("{}", result.explanation);
        std::process::exit(EXIT_INVALID);
    }
    if !json {
        println!("{}", result.resolved_path.display());
        if !result.exists {
            debug!(path = %result.resolved_path.display(), "resolved path does not exist yet");
        }
    }
    Ok(())
}

/// Prints nothing rather than failing when the context cannot be detected.
pub async fn handle_complete(
    config: &ArborConfig,
    partial: &str,
    existing: bool,
    from: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let workspace = Workspace::new(config);
    let ctx = match workspace.detect(from) {
        Ok(ctx) => ctx,
        Err(e) => {
            debug!(error = %e, "no completion context");
            Context::default()
        },
    };

    let suggestions = workspace
        .resolver
        .get_resolution_suggestions(&ctx, partial, SuggestionOptions {
            existing_only: existing,
        })
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
    } else {
        for s in &suggestions {
            println!("{}", suggestion_line(s));
        }
    }
    Ok(())
}

fn context_lines(ctx: &Context) -> Vec<String> {
    let mut lines = vec![
        format!("type:    {}", ctx.context_type),
        format!("path:    {}", ctx.path.display()),
    ];
    if let Some(ref project) = ctx.project_name {
        lines.push(format!("project: {project}"));
    }
    if let Some(ref branch) = ctx.branch_name {
        lines.push(format!("branch:  {branch}"));
    }
    lines.push(ctx.explanation.clone());
    lines
}

fn resolution_error_lines(err: &Error) -> Vec<String> {
    let mut lines = vec![format!("error: {err}")];
    let suggestions = err.suggestions();
    if !suggestions.is_empty() {
        lines.push("expected one of:".to_string());
        lines.extend(suggestions.iter().map(|s| format!("  {s}")));
    }
    lines
}

/// `text<TAB>description`, the format shell completion scripts split on.
fn suggestion_line(s: &ResolutionSuggestion) -> String {
    format!("{}\t{}", s.text, s.description)
}
