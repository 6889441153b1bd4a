use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    error::{Context, Error, Result},
    expand::substitute_env,
    schema::ArborConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["arbor.toml", "arbor.yaml", "arbor.yml", "arbor.json"];

const ENV_PROJECTS_DIR: &str = "ARBOR_PROJECTS_DIR";
const ENV_WORKTREES_DIR: &str = "ARBOR_WORKTREES_DIR";
const ENV_CACHE_TTL: &str = "ARBOR_CACHE_TTL";
const ENV_VALIDATE_GIT: &str = "ARBOR_VALIDATE_GIT";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<ArborConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./arbor.{toml,yaml,yml,json}` (directory-local)
/// 2. `<config_dir>/arbor.{toml,yaml,yml,json}` where `config_dir` is the
///    override if given, else the user-global config directory
///
/// Returns `ArborConfig::default()` if no file is found or the file fails to
/// parse. Environment overrides are applied in both cases, and `~` is expanded.
pub fn discover_and_load(config_dir_override: Option<&Path>) -> ArborConfig {
    let mut config = ArborConfig::default();
    if let Some(path) = find_config_file(config_dir_override) {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => config = cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    apply_env_overrides(config).expanded()
}

/// Find the first config file in standard locations.
pub fn find_config_file(config_dir_override: Option<&Path>) -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.is_file() {
            return Some(p);
        }
    }

    let dir = config_dir_override
        .map(Path::to_path_buf)
        .or_else(config_dir)?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Returns the user-global config directory (`~/.config/arbor/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "arbor").map(|d| d.config_dir().to_path_buf())
}

/// Apply `ARBOR_*` environment variables on top of `config`.
pub fn apply_env_overrides(config: ArborConfig) -> ArborConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

/// Apply overrides using a custom lookup, so tests never touch the process env.
pub fn apply_env_overrides_with(
    mut config: ArborConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ArborConfig {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(dir) = non_empty(ENV_PROJECTS_DIR) {
        config.projects_dir = PathBuf::from(dir);
    }
    if let Some(dir) = non_empty(ENV_WORKTREES_DIR) {
        config.worktrees_dir = PathBuf::from(dir);
    }
    if let Some(ttl) = non_empty(ENV_CACHE_TTL) {
        config.cache_ttl = ttl;
    }
    if let Some(raw) = non_empty(ENV_VALIDATE_GIT) {
        match parse_bool(&raw) {
            Some(flag) => config.validate_git = flag,
            None => warn!(var = ENV_VALIDATE_GIT, value = %raw, "ignoring unrecognised boolean"),
        }
    }
    config
}

/// Serialize the effective config as TOML, e.g. for `arbor config show`.
pub fn render_toml(config: &ArborConfig) -> Result<String> {
    toml::to_string_pretty(config).context("serialize config")
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<ArborConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("arbor.toml", "projects_dir = \"/srv/p\"\ncache_ttl = \"1s\"\n")]
    #[case("arbor.yaml", "projects_dir: /srv/p\ncache_ttl: 1s\n")]
    #[case("arbor.json", r#"{"projects_dir": "/srv/p", "cache_ttl": "1s"}"#)]
    fn loads_each_format(#[case] name: &str, #[case] body: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.projects_dir, PathBuf::from("/srv/p"));
        assert_eq!(cfg.cache_ttl, "1s");
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arbor.ini");
        std::fs::write(&path, "x").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("arbor.toml")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }

    #[test]
    fn finds_file_in_override_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("arbor.yml"), "validate_git: false\n").unwrap();
        let found = find_config_file(Some(dir.path())).unwrap();
        assert!(found.ends_with("arbor.yml"));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let lookup = |name: &str| match name {
            "ARBOR_PROJECTS_DIR" => Some("/env/p".to_string()),
            "ARBOR_WORKTREES_DIR" => Some("  ".to_string()),
            "ARBOR_CACHE_TTL" => Some("250ms".to_string()),
            "ARBOR_VALIDATE_GIT" => Some("off".to_string()),
            _ => None,
        };
        let cfg = apply_env_overrides_with(
            ArborConfig {
                worktrees_dir: "/file/w".into(),
                ..Default::default()
            },
            lookup,
        );
        assert_eq!(cfg.projects_dir, PathBuf::from("/env/p"));
        // Blank values do not clobber the file setting.
        assert_eq!(cfg.worktrees_dir, PathBuf::from("/file/w"));
        assert_eq!(cfg.cache_ttl, "250ms");
        assert!(!cfg.validate_git);
    }

    #[test]
    fn unrecognised_bool_keeps_previous_value() {
        let cfg =
            apply_env_overrides_with(ArborConfig::default(), |name| match name {
                "ARBOR_VALIDATE_GIT" => Some("maybe".to_string()),
                _ => None,
            });
        assert!(cfg.validate_git);
    }

    #[test]
    fn render_toml_round_trips_fields() {
        let cfg = ArborConfig {
            projects_dir: "/p".into(),
            ..Default::default()
        };
        let rendered = render_toml(&cfg).unwrap();
        assert!(rendered.contains("projects_dir = \"/p\""));
        assert!(rendered.contains("validate_git = true"));
    }
}
