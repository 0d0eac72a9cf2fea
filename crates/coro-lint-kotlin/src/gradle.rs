//! Discovers declared library coordinates from Gradle build files.
//!
//! Two sources are read:
//!
//! - `build.gradle` / `build.gradle.kts`: every quoted `group:name[:version]`
//!   string, e.g. `implementation("androidx.lifecycle:lifecycle-runtime-ktx:2.6.1")`
//! - `gradle/libs.versions.toml`: the `[libraries]` table of a version catalog

use std::path::{Path, PathBuf};

use coro_lint_core::Dependency;
use thiserror::Error;
use tracing::{debug, warn};

const BUILD_FILES: &[&str] = &["build.gradle", "build.gradle.kts"];
const CATALOG_FILE: &str = "libs.versions.toml";

/// Errors while scanning build files.
#[derive(Debug, Error)]
pub enum GradleError {
    /// A build file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failed.
    #[error("walk error: {0}")]
    Walk(#[from] ignore::Error),
}

/// Collects dependency coordinates declared anywhere under `root`.
///
/// The result is sorted and free of duplicates. A malformed version catalog
/// is logged and skipped.
///
/// # Errors
///
/// Returns an error if the walk fails or a build file cannot be read.
pub fn discover_gradle_dependencies(root: &Path) -> Result<Vec<Dependency>, GradleError> {
    let mut coordinates = Vec::new();
    for path in build_files(root)? {
        let content = std::fs::read_to_string(&path).map_err(|source| GradleError::Io {
            path: path.clone(),
            source,
        })?;
        let before = coordinates.len();
        if path.file_name().and_then(|n| n.to_str()) == Some(CATALOG_FILE) {
            match catalog_coordinates(&content) {
                Ok(found) => coordinates.extend(found),
                Err(e) => warn!("Skipping version catalog {}: {e}", path.display()),
            }
        } else {
            coordinates.extend(script_coordinates(&content));
        }
        debug!(
            "{}: {} coordinates",
            path.display(),
            coordinates.len() - before
        );
    }
    coordinates.sort();
    coordinates.dedup();
    Ok(coordinates.into_iter().map(Dependency::new).collect())
}

fn build_files(root: &Path) -> Result<Vec<PathBuf>, GradleError> {
    let mut files = Vec::new();
    for entry in ignore::WalkBuilder::new(root).hidden(true).build() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if BUILD_FILES.contains(&name) || name == CATALOG_FILE {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Quoted coordinate strings in a Groovy or Kotlin build script.
#[must_use]
pub fn script_coordinates(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = content;
    while let Some(open) = rest.find(['"', '\'']) {
        let quote = rest[open..].chars().next().unwrap_or('"');
        let body = &rest[open + 1..];
        let Some(close) = body.find(quote) else {
            break;
        };
        let literal = &body[..close];
        if is_coordinate(literal) {
            out.push(literal.to_string());
        }
        rest = &body[close + 1..];
    }
    out
}

/// `[libraries]` entries of a version catalog.
///
/// # Errors
///
/// Returns the TOML parse error for a malformed catalog.
pub fn catalog_coordinates(content: &str) -> Result<Vec<String>, toml::de::Error> {
    let catalog: toml::Table = toml::from_str(content)?;
    let Some(libraries) = catalog.get("libraries").and_then(toml::Value::as_table) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for library in libraries.values() {
        let coordinate = match library {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Table(t) => {
                let get = |key: &str| t.get(key).and_then(toml::Value::as_str);
                get("module").map(str::to_string).or_else(|| {
                    Some(format!("{}:{}", get("group")?, get("name")?))
                })
            }
            _ => None,
        };
        if let Some(coordinate) = coordinate.filter(|c| is_coordinate(c)) {
            out.push(coordinate);
        }
    }
    Ok(out)
}

fn is_coordinate(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return false;
    }
    let is_name = |p: &str| {
        !p.is_empty()
            && p.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    };
    is_name(parts[0])
        && is_name(parts[1])
        && parts
            .get(2)
            .map_or(true, |v| !v.is_empty() && !v.contains(char::is_whitespace))
}
