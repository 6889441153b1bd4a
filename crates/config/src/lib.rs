//! Configuration loading, env substitution, overrides, and validation.
//!
//! Config files: `arbor.toml`, `arbor.yaml`, `arbor.yml`, or `arbor.json`.
//! Searched in `./` then the user config dir (`~/.config/arbor/` on Linux).
//!
//! Precedence: defaults, then the file, then `ARBOR_*` environment variables,
//! then whatever the caller applies on top (CLI flags).

pub mod duration;
pub mod error;
pub mod expand;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    duration::{DEFAULT_CACHE_TTL, parse_duration},
    error::{Error, Result},
    loader::{
        apply_env_overrides, apply_env_overrides_with, config_dir, discover_and_load,
        find_config_file, load_config, render_toml,
    },
    schema::ArborConfig,
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
