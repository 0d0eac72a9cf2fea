//! Configuration lookup and loading.
//!
//! The configuration file is chosen in this order:
//!
//! 1. `--config` flag (explicit path)
//! 2. `coro-lint.toml` or `.coro-lint.toml` in the analyzed directory or the
//!    nearest ancestor that has one
//! 3. `~/.coro-lint/config.toml`, or `$CORO_LINT_CONFIG_DIR/config.toml`
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use coro_lint_core::Config;

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config` flag.
    Explicit(PathBuf),
    /// Found next to the analyzed sources.
    Project(PathBuf),
    /// Loaded from the global config directory.
    Global(PathBuf),
    /// No config found; defaults will be used.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }
}

/// Project-level config file names, checked in order.
const PROJECT_CONFIG_NAMES: &[&str] = &["coro-lint.toml", ".coro-lint.toml"];

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Overrides the global config directory.
const CONFIG_DIR_ENV: &str = "CORO_LINT_CONFIG_DIR";

/// Finds the configuration for analyzing `target`.
#[must_use]
pub fn resolve(target: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(target, explicit, global_config_dir())
}

/// Loads the configuration `source` points at.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load(source: &ConfigSource) -> Result<Config> {
    let Some(path) = source.path() else {
        tracing::debug!("No configuration file, using defaults");
        return Ok(Config::default());
    };
    match source {
        ConfigSource::Global(_) => tracing::info!("Using global config: {}", path.display()),
        _ => tracing::debug!("Using config: {}", path.display()),
    }
    Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

fn resolve_inner(
    target: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    let start = if target.is_file() {
        target.parent().unwrap_or(target)
    } else {
        target
    };
    for dir in start.ancestors() {
        if let Some(found) = PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
        {
            tracing::debug!("Found project config: {}", found.display());
            return ConfigSource::Project(found);
        }
    }

    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|candidate| candidate.is_file())
        .map_or(ConfigSource::Default, ConfigSource::Global)
}

/// Global config directory: `$CORO_LINT_CONFIG_DIR`, else `~/.coro-lint/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".coro-lint"))
}
