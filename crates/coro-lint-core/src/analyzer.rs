//! Core analyzer for orchestrating lint execution.

use crate::config::{Config, RuleConfig};
use crate::context::FileContext;
use crate::detector::{Detector, DetectorBox, ViolationCollector};
use crate::frontend::{Frontend, FrontendError};
use crate::symbol::Dependency;
use crate::types::{LintResult, Violation};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing a source file.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Directory walk error.
    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),

    /// No frontend was registered.
    #[error("No language frontend configured")]
    MissingFrontend,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    detectors: Vec<DetectorBox>,
    exclude_patterns: Vec<String>,
    config: Option<Config>,
    frontend: Option<Box<dyn Frontend>>,
    dependencies: Vec<Dependency>,
    fail_on_parse_error: bool,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a detector to the analyzer.
    #[must_use]
    pub fn detector<D: Detector + 'static>(mut self, detector: D) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    /// Adds a boxed detector to the analyzer.
    #[must_use]
    pub fn detector_box(mut self, detector: DetectorBox) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the language frontend used to parse files.
    #[must_use]
    pub fn frontend<F: Frontend + 'static>(mut self, frontend: F) -> Self {
        self.frontend = Some(Box::new(frontend));
        self
    }

    /// Adds dependencies visible to every analyzed file.
    #[must_use]
    pub fn dependencies<I>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = Dependency>,
    {
        self.dependencies.extend(deps);
        self
    }

    /// Sets whether to fail on parse errors (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = fail;
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if no frontend is set, the working directory cannot
    /// be read, or an exclude pattern is not a valid glob.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let frontend = self.frontend.ok_or(AnalyzerError::MissingFrontend)?;

        let root = self
            .root
            .or_else(|| self.config.as_ref().map(|c| c.analyzer.root.clone()))
            .unwrap_or_else(|| PathBuf::from("."));

        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let config = self.config.unwrap_or_default();

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        let excludes = exclude_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut dependencies = self.dependencies;
        dependencies.extend(config.declared_dependencies());

        Ok(Analyzer {
            root,
            detectors: self.detectors,
            excludes,
            config,
            frontend,
            dependencies,
            fail_on_parse_error: self.fail_on_parse_error,
        })
    }
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    detectors: Vec<DetectorBox>,
    excludes: Vec<glob::Pattern>,
    config: Config,
    frontend: Box<dyn Frontend>,
    dependencies: Vec<Dependency>,
    fail_on_parse_error: bool,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered detectors.
    #[must_use]
    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Dependencies visible to analyzed files.
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Gets the configuration for a specific issue.
    #[must_use]
    pub fn rule_config(&self, issue_id: &str) -> Option<&RuleConfig> {
        self.config.rule(issue_id)
    }

    /// Analyzes all files under the root and returns the results.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery fails, a file cannot be read, or
    /// a file fails to parse while `fail_on_parse_error` is set.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let mut result = LintResult::new();
        let files = self.discover_files()?;

        info!("Found {} files to analyze", files.len());

        for file_path in &files {
            debug!("Analyzing: {}", file_path.display());
            let content = std::fs::read_to_string(file_path)?;
            match self.analyze_source(file_path, &content) {
                Ok(violations) => {
                    result.violations.extend(violations);
                    result.files_checked += 1;
                }
                Err(AnalyzerError::Parse { path, message }) => {
                    warn!("Failed to parse {}: {}", path.display(), message);
                    if self.fail_on_parse_error {
                        return Err(AnalyzerError::Parse { path, message });
                    }
                }
                Err(e) => return Err(e),
            }
        }

        result.sort();

        info!(
            "Analysis complete: {} violations in {} files",
            result.violations.len(),
            result.files_checked
        );

        Ok(result)
    }

    /// Analyzes one in-memory compilation unit.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Parse`] if the frontend cannot parse `source`.
    pub fn analyze_source(&self, path: &Path, source: &str) -> Result<Vec<Violation>, AnalyzerError> {
        let unit = self
            .frontend
            .parse(source)
            .map_err(|e: FrontendError| AnalyzerError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let ctx = FileContext::new(
            path,
            &self.root,
            &unit.tree,
            unit.resolver.as_ref(),
            &self.dependencies,
        );

        let enabled: Vec<&dyn Detector> = self
            .detectors
            .iter()
            .map(|d| &**d)
            .filter(|d| {
                let enabled = self.config.is_rule_enabled(d.issue().id);
                if !enabled {
                    debug!("Skipping disabled detector: {}", d.issue().id);
                }
                enabled
            })
            .collect();

        let mut collector = ViolationCollector::new(&ctx);
        for node in unit.tree.preorder(unit.tree.root()) {
            let tag = unit.tree.kind(node).tag();
            for detector in &enabled {
                if !detector.applicable_kinds().contains(&tag) {
                    continue;
                }
                let id = detector.issue().id;
                collector.begin(node, self.config.rule_severity(id));
                detector.visit(&ctx, node, &mut collector);
            }
        }

        if collector.suppressed() > 0 {
            debug!(
                "{}: {} diagnostics suppressed",
                path.display(),
                collector.suppressed()
            );
        }

        Ok(collector.into_violations())
    }

    /// Discovers all source files the frontend handles.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let extensions = self.frontend.extensions();

        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(self.config.analyzer.respect_gitignore);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{e}"))
                .unwrap_or_default();

            if !extensions.contains(&ext.as_str()) {
                continue;
            }

            if self.should_exclude(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Checks if a path should be excluded.
    fn should_exclude(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.excludes
            .iter()
            .any(|pattern| pattern.matches_path(path) || pattern.matches_path(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DiagnosticSink;
    use crate::frontend::ParsedUnit;
    use crate::symbol::NullResolver;
    use crate::syntax::{KindTag, NodeId, Span, TreeBuilder};
    use crate::types::{Category, Issue, Severity};

    /// Lowers every alphanumeric word into an identifier node.
    struct WordFrontend;

    impl Frontend for WordFrontend {
        fn language_id(&self) -> &'static str {
            "words"
        }

        fn extensions(&self) -> &'static [&'static str] {
            &[".kt"]
        }

        fn parse(&self, source: &str) -> Result<ParsedUnit, FrontendError> {
            if source.contains("@@") {
                return Err(FrontendError::NoTree);
            }
            let mut b = TreeBuilder::new(source);
            let mut start = None;
            for (i, c) in source.char_indices().chain(std::iter::once((source.len(), ' '))) {
                match (c.is_alphanumeric(), start) {
                    (true, None) => start = Some(i),
                    (false, Some(s)) => {
                        b.ident(&source[s..i], Span::new(s, i));
                        start = None;
                    }
                    _ => {}
                }
            }
            Ok(ParsedUnit {
                tree: b.finish_with_root("file"),
                resolver: Box::new(NullResolver),
            })
        }
    }

    static NAMED_ISSUE: Issue = Issue {
        id: "NamedWord",
        name: "named-word",
        title: "Word `bad` found",
        explanation: "Reported on identifiers named `bad`.",
        category: Category {
            name: "Test",
            priority: 1,
        },
        priority: 1,
        severity: Severity::Warning,
    };

    struct BadWord;

    impl Detector for BadWord {
        fn issue(&self) -> &'static Issue {
            &NAMED_ISSUE
        }

        fn applicable_kinds(&self) -> &'static [KindTag] {
            &[KindTag::Identifier]
        }

        fn visit(&self, ctx: &FileContext<'_>, node: NodeId, sink: &mut dyn DiagnosticSink) {
            if ctx.tree.identifier_name(node) == Some("bad") {
                sink.report(self.issue(), ctx.tree.span(node), "bad word", None);
            }
        }
    }

    fn analyzer(config: Config) -> Analyzer {
        Analyzer::builder()
            .root(".")
            .frontend(WordFrontend)
            .detector(BadWord)
            .config(config)
            .build()
            .expect("Failed to build analyzer")
    }

    #[test]
    fn test_builder() {
        let analyzer = analyzer(Config::default());
        assert!(analyzer.root().exists());
        assert_eq!(analyzer.detector_count(), 1);
    }

    #[test]
    fn test_builder_requires_frontend() {
        let err = Analyzer::builder().root(".").build().err();
        assert!(matches!(err, Some(AnalyzerError::MissingFrontend)));
    }

    #[test]
    fn test_builder_rejects_bad_glob() {
        let err = Analyzer::builder()
            .frontend(WordFrontend)
            .exclude("[")
            .build()
            .err();
        assert!(matches!(err, Some(AnalyzerError::Glob(_))));
    }

    #[test]
    fn test_exclude_patterns() {
        let analyzer = Analyzer::builder()
            .root("/foo")
            .frontend(WordFrontend)
            .exclude("**/build/**")
            .exclude("generated/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.should_exclude(Path::new("/foo/app/build/tmp/A.kt")));
        assert!(analyzer.should_exclude(Path::new("/foo/generated/B.kt")));
        assert!(!analyzer.should_exclude(Path::new("/foo/src/main/C.kt")));
    }

    #[test]
    fn test_analyze_source_reports_and_locates() {
        let analyzer = analyzer(Config::default());
        let violations = analyzer
            .analyze_source(Path::new("A.kt"), "good\n  bad\n")
            .expect("analysis failed");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.line, 2);
        assert_eq!(violations[0].location.column, 3);
        assert_eq!(violations[0].severity, Severity::Warning);
    }

    #[test]
    fn test_analyze_source_honours_config() {
        let disabled = Config::parse("[rules.NamedWord]\nenabled = false\n").unwrap();
        let violations = analyzer(disabled)
            .analyze_source(Path::new("A.kt"), "bad")
            .unwrap();
        assert!(violations.is_empty());

        let escalated = Config::parse("[rules.NamedWord]\nseverity = \"error\"\n").unwrap();
        let violations = analyzer(escalated)
            .analyze_source(Path::new("A.kt"), "bad")
            .unwrap();
        assert_eq!(violations[0].severity, Severity::Error);
    }

    #[test]
    fn test_analyze_source_parse_error() {
        let err = analyzer(Config::default())
            .analyze_source(Path::new("A.kt"), "@@")
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Parse { .. }));
    }

    #[test]
    fn test_analyze_walks_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("A.kt"), "bad bad").unwrap();
        std::fs::write(dir.path().join("B.kt"), "@@").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "bad").unwrap();
        std::fs::create_dir(dir.path().join("build")).unwrap();
        std::fs::write(dir.path().join("build/C.kt"), "bad").unwrap();

        let analyzer = Analyzer::builder()
            .root(dir.path())
            .frontend(WordFrontend)
            .detector(BadWord)
            .exclude("build/**")
            .build()
            .unwrap();
        let result = analyzer.analyze().unwrap();
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.violations.len(), 2);
        assert!(result.violations[0].location.column < result.violations[1].location.column);
    }
}
