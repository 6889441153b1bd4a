use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use arbor_config::{
    ArborConfig,
    validate::{self, Severity, ValidationResult},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Validate the effective configuration and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the config file in use, or where one would be read from.
    Path,
}

pub fn handle_config(
    action: ConfigAction,
    config: &ArborConfig,
    config_dir: Option<&Path>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", arbor_config::render_toml(config)?);
            Ok(())
        },
        ConfigAction::Check { verbose } => check(config, config_dir, verbose),
        ConfigAction::Path => {
            match arbor_config::find_config_file(config_dir) {
                Some(path) => println!("{}", path.display()),
                None => {
                    let dir = config_dir
                        .map(Path::to_path_buf)
                        .or_else(arbor_config::config_dir);
                    match dir {
                        Some(dir) => eprintln!(
                            "No config file found; would read {}",
                            dir.join("arbor.toml").display()
                        ),
                        None => eprintln!("No config file found and no config directory."),
                    }
                },
            }
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config: &ArborConfig, config_dir: Option<&Path>, verbose: bool) -> Result<()> {
    let mut result = validate::validate(config);
    result.config_path = arbor_config::find_config_file(config_dir);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let lines = diagnostic_lines(&result, verbose);
    for line in &lines {
        eprintln!("{line}");
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if !lines.is_empty() {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn diagnostic_lines(result: &ValidationResult, verbose: bool) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .map(|d| {
            let (color, label) = match d.severity {
                Severity::Error => (RED, "error"),
                Severity::Warning => (YELLOW, "warning"),
                Severity::Info => (CYAN, "info"),
            };
            if d.path.is_empty() {
                format!("  {BOLD}{color}{label}{RESET} {}", d.message)
            } else {
                format!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message)
            }
        })
        .collect()
}
