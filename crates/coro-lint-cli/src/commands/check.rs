//! Check command implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use coro_lint_core::{apply_fixes, Analyzer, Dependency, LintResult, Violation};
use coro_lint_kotlin::{discover_gradle_dependencies, KotlinFrontend};
use coro_lint_rules::{configured_detectors, detectors_by_id};

use crate::config_resolver::{self, ConfigSource};
use crate::OutputFormat;

/// Flags of the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule ids or names to run instead of the configured set.
    pub rules: Option<String>,
    /// Extra exclude patterns.
    pub exclude: Vec<String>,
    /// Write fixes back to the files.
    pub fix: bool,
    /// Read declared dependencies from Gradle build files.
    pub discover_gradle: bool,
}

/// Runs the check command. Returns true if violations at or above the
/// configured failure threshold remain.
pub fn run(path: &Path, options: &CheckOptions, source: &ConfigSource) -> Result<bool> {
    let config = config_resolver::load(source)?;
    let threshold = config.fail_threshold();

    let mut dependencies = Vec::new();
    if options.discover_gradle && config.project.discover_gradle {
        dependencies = gradle_dependencies(path)?;
    }

    let detectors = match &options.rules {
        Some(filter) => {
            let ids: Vec<&str> = filter
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            detectors_by_id(&ids, &config)
        }
        None => configured_detectors(&config),
    };
    if detectors.is_empty() {
        bail!("No rules selected. Run `coro-lint list-rules` to see available rules.");
    }

    let mut builder = Analyzer::builder()
        .root(path)
        .config(config)
        .frontend(KotlinFrontend::new())
        .dependencies(dependencies)
        .excludes(options.exclude.iter().cloned());
    for detector in detectors {
        builder = builder.detector_box(detector);
    }
    let analyzer = builder.build().context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {} with {} rules",
        path.display(),
        analyzer.detector_count()
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    super::output::print(&result, options.format, analyzer.root())?;

    let fixed = if options.fix {
        fix_files(analyzer.root(), &result)?
    } else {
        Vec::new()
    };

    Ok(result
        .violations
        .iter()
        .enumerate()
        .any(|(i, v)| v.severity >= threshold && !fixed.contains(&i)))
}

fn gradle_dependencies(path: &Path) -> Result<Vec<Dependency>> {
    let root = if path.is_file() {
        path.parent().unwrap_or(path)
    } else {
        path
    };
    let deps = discover_gradle_dependencies(root)
        .with_context(|| format!("Failed to read Gradle files under {}", root.display()))?;
    tracing::info!("Discovered {} Gradle dependencies", deps.len());
    Ok(deps)
}

/// Applies fixes file by file and returns the indices of fixed violations.
fn fix_files(root: &Path, result: &LintResult) -> Result<Vec<usize>> {
    let mut by_file: BTreeMap<PathBuf, Vec<(usize, &Violation)>> = BTreeMap::new();
    for (index, violation) in result.violations.iter().enumerate() {
        if violation.fix.is_some() {
            by_file
                .entry(source_path(root, &violation.location.file))
                .or_default()
                .push((index, violation));
        }
    }

    let mut fixed = Vec::new();
    for (file, violations) in by_file {
        let source = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let outcome = apply_fixes(&source, violations.iter().filter_map(|(_, v)| v.fix.as_ref()));

        for (at, error) in &outcome.skipped {
            let (_, violation) = violations[*at];
            tracing::warn!(
                "Skipped fix for {} at {}:{}: {error}",
                violation.code,
                file.display(),
                violation.location.line
            );
        }
        if outcome.applied.is_empty() {
            continue;
        }

        std::fs::write(&file, &outcome.text)
            .with_context(|| format!("Failed to write {}", file.display()))?;
        println!(
            "Fixed {} issue(s) in {}",
            outcome.applied.len(),
            file.display()
        );
        fixed.extend(outcome.applied.iter().map(|&at| violations[at].0));
    }
    Ok(fixed)
}

/// Violation paths are relative to the analyzed root, which may itself be a file.
fn source_path(root: &Path, relative: &Path) -> PathBuf {
    if relative.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}
