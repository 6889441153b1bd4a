mod config_commands;
mod workspace_commands;

use std::path::PathBuf;

use {
    arbor_config::ArborConfig,
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "arbor", version, about = "Jump between projects and their git worktrees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/arbor/).
    #[arg(long, global = true, env = "ARBOR_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Projects directory (overrides config value).
    #[arg(long, global = true)]
    projects_dir: Option<PathBuf>,

    /// Worktrees directory (overrides config value).
    #[arg(long, global = true)]
    worktrees_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether a directory is a project, a worktree, or outside git.
    Detect {
        /// Directory to classify (defaults to the current directory).
        path: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Print the directory an identifier points to.
    Resolve {
        /// `main`, a branch name, a project name, or `project/branch`.
        identifier: String,
        /// Resolve as if run from this directory.
        #[arg(long)]
        from: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// List completion candidates for a partial identifier.
    Complete {
        #[arg(default_value = "")]
        partial: String,
        /// Only suggest worktrees that exist on disk.
        #[arg(long)]
        existing: bool,
        #[arg(long)]
        from: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays parseable by shell wrappers.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Effective configuration: file and environment, then CLI flags.
fn effective_config(cli: &Cli) -> ArborConfig {
    let mut config = arbor_config::discover_and_load(cli.config_dir.as_deref());
    if let Some(ref dir) = cli.projects_dir {
        config.projects_dir = dir.clone();
    }
    if let Some(ref dir) = cli.worktrees_dir {
        config.worktrees_dir = dir.clone();
    }
    config.expanded()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = effective_config(&cli);
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        projects_dir = %config.projects_dir.display(),
        worktrees_dir = %config.worktrees_dir.display(),
        "arbor starting"
    );

    match cli.command {
        Commands::Detect { path, json } => {
            workspace_commands::handle_detect(&config, path, json)
        },
        Commands::Resolve {
            identifier,
            from,
            json,
        } => workspace_commands::handle_resolve(&config, &identifier, from, json),
        Commands::Complete {
            partial,
            existing,
            from,
            json,
        } => {
            workspace_commands::handle_complete(&config, &partial, existing, from, json).await
        },
        Commands::Config { action } => {
            config_commands::handle_config(action, &config, cli.config_dir.as_deref())
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_apply_after_subcommand() {
        let cli = Cli::try_parse_from([
            "arbor",
            "resolve",
            "acme/feature-x",
            "--projects-dir",
            "/p",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.projects_dir, Some(PathBuf::from("/p")));
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(
            cli.command,
            Commands::Resolve { ref identifier, .. } if identifier == "acme/feature-x"
        ));
    }

    #[test]
    fn complete_partial_defaults_to_empty() {
        let cli = Cli::try_parse_from(["arbor", "complete", "--existing"]).unwrap();
        match cli.command {
            Commands::Complete {
                partial, existing, ..
            } => {
                assert_eq!(partial, "");
                assert!(existing);
            },
            _ => panic!("expected complete"),
        }
    }

    #[test]
    fn flags_override_config_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "arbor",
            "detect",
            "--config-dir",
            dir.path().to_str().unwrap(),
            "--projects-dir",
            "/srv/projects",
            "--worktrees-dir",
            "/srv/worktrees",
        ])
        .unwrap();
        let config = effective_config(&cli);
        assert_eq!(config.projects_dir, PathBuf::from("/srv/projects"));
        assert_eq!(config.worktrees_dir, PathBuf::from("/srv/worktrees"));
    }
}
