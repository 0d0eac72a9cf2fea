//! Configuration types for coro-lint.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::symbol::Dependency;
use crate::types::Severity;

/// Top-level configuration for coro-lint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Lowest severity that makes `check` exit non-zero (default: error).
    #[serde(default)]
    pub fail_on: Option<Severity>,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Project facts the host cannot always infer.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Per-issue configurations, keyed by issue id.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Looks up the configuration for an issue id (case-insensitive).
    #[must_use]
    pub fn rule(&self, issue_id: &str) -> Option<&RuleConfig> {
        self.rules.get(issue_id).or_else(|| {
            self.rules
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(issue_id))
                .map(|(_, v)| v)
        })
    }

    /// Checks if an issue is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, issue_id: &str) -> bool {
        self.rule(issue_id)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for an issue.
    #[must_use]
    pub fn rule_severity(&self, issue_id: &str) -> Option<Severity> {
        self.rule(issue_id).and_then(|c| c.severity)
    }

    /// Severity threshold for a failing exit status.
    #[must_use]
    pub fn fail_threshold(&self) -> Severity {
        self.fail_on.unwrap_or(Severity::Error)
    }

    /// Dependencies declared in `[project]`.
    #[must_use]
    pub fn declared_dependencies(&self) -> Vec<Dependency> {
        self.project
            .dependencies
            .iter()
            .map(|d| Dependency::new(d.as_str()))
            .collect()
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root directory to analyze (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns to exclude from analysis.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: vec!["**/build/**".to_string(), "**/.gradle/**".to_string()],
            respect_gitignore: true,
        }
    }
}

/// Project facts: declared library coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Library coordinates visible to every file, e.g.
    /// `androidx.lifecycle:lifecycle-viewmodel-ktx:2.6.1`.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Also scan Gradle build files under the root for dependencies.
    #[serde(default = "default_true")]
    pub discover_gradle: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            dependencies: Vec::new(),
            discover_gradle: true,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

/// How a class qualifies as a lifecycle owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupertypePolicy {
    /// Only directly declared supertypes count.
    #[default]
    Direct,
    /// Any ancestor in the resolved supertype chain counts.
    Transitive,
}

/// Per-issue configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this issue is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this issue.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Issue-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl RuleConfig {
    /// Gets an option value as a specific type.
    #[must_use]
    pub fn get_option<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.options
            .get(key)
            .and_then(|v| v.clone().try_into().ok())
    }

    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Gets a string option with a default value.
    #[must_use]
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.options
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
    }

    /// Lifecycle-owner matching policy (`supertype_policy`, default direct).
    #[must_use]
    pub fn supertype_policy(&self) -> SupertypePolicy {
        self.get_option("supertype_policy").unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}
