//! Integration test: Kotlin sources end-to-end via Analyzer.
//!
//! Uses the small Android project under `tests/fixtures/android/` to verify
//! that parsing, resolution, Gradle dependency discovery and both detectors
//! work together.

use std::path::PathBuf;

use coro_lint_core::{apply_fixes, Analyzer, Config, Violation};
use coro_lint_kotlin::{discover_gradle_dependencies, KotlinFrontend};
use coro_lint_rules::all_detectors;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/android")
}

fn analyzer(config: Config) -> Analyzer {
    let root = fixture_root();
    let deps = discover_gradle_dependencies(&root).expect("gradle files should be readable");
    let mut builder = Analyzer::builder()
        .root(&root)
        .config(config)
        .frontend(KotlinFrontend::new())
        .dependencies(deps);
    for detector in all_detectors() {
        builder = builder.detector_box(detector);
    }
    builder.build().expect("analyzer should build")
}

fn in_file<'a>(violations: &'a [Violation], name: &str) -> Vec<&'a Violation> {
    violations
        .iter()
        .filter(|v| v.location.file.ends_with(name))
        .collect()
}

#[test]
fn gradle_dependencies_are_discovered() {
    let deps = discover_gradle_dependencies(&fixture_root()).unwrap();
    assert!(deps
        .iter()
        .any(|d| d.matches("androidx.lifecycle:lifecycle-viewmodel-ktx")));
    assert!(!deps
        .iter()
        .any(|d| d.matches("androidx.lifecycle:lifecycle-runtime-ktx")));
}

#[test]
fn detects_all_coroutine_misuses() {
    let result = analyzer(Config::default()).analyze().unwrap();

    // 3 Kotlin sources plus the Gradle script.
    assert_eq!(result.files_checked, 4);
    assert_eq!(
        result.violations.len(),
        4,
        "got: {:#?}",
        result
            .violations
            .iter()
            .map(|v| format!("{} @ {}:{}", v.code, v.location.file.display(), v.location.line))
            .collect::<Vec<_>>()
    );

    let view_model = in_file(&result.violations, "MainViewModel.kt");
    let codes: Vec<&str> = view_model.iter().map(|v| v.code.as_str()).collect();
    assert_eq!(
        codes,
        vec!["GlobalScopeUsage", "JobInBuilderUsage", "JobInBuilderUsage"]
    );
    assert_eq!(view_model[0].location.line, 9);
    assert_eq!(view_model[1].location.line, 15);
    assert_eq!(view_model[2].location.line, 22);
    assert!(view_model.iter().all(|v| v.fix.is_some()));

    let worker = in_file(&result.violations, "Worker.kt");
    assert_eq!(worker.len(), 1);
    assert_eq!(worker[0].code, "JobInBuilderUsage");
    assert!(worker[0].fix.is_none());

    assert!(in_file(&result.violations, "Legacy.kt").is_empty());
}

#[test]
fn fixes_rewrite_view_model() {
    let result = analyzer(Config::default()).analyze().unwrap();
    let path = fixture_root().join("app/src/main/kotlin/app/MainViewModel.kt");
    let source = std::fs::read_to_string(&path).unwrap();

    let fixes = in_file(&result.violations, "MainViewModel.kt")
        .into_iter()
        .filter_map(|v| v.fix.as_ref());
    let outcome = apply_fixes(&source, fixes);

    assert_eq!(outcome.applied.len(), 3);
    assert!(outcome.skipped.is_empty());
    assert!(outcome.text.contains("viewModelScope.launch {\n            load()"));
    assert!(outcome.text.contains("viewModelScope.launch(Dispatchers.IO) {"));
    assert!(outcome.text.contains("withContext(coroutineContext) { release() }"));
    assert!(!outcome.text.contains("GlobalScope"));
}

#[test]
fn disabled_rule_is_skipped() {
    let config = Config::parse("[rules.JobInBuilderUsage]\nenabled = false\n").unwrap();
    let result = analyzer(config).analyze().unwrap();
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].code, "GlobalScopeUsage");
}

#[test]
fn missing_dependency_drops_global_scope_fix() {
    let root = fixture_root();
    let mut builder = Analyzer::builder()
        .root(&root)
        .frontend(KotlinFrontend::new());
    for detector in all_detectors() {
        builder = builder.detector_box(detector);
    }
    let result = builder.build().unwrap().analyze().unwrap();
    let global = result
        .violations
        .iter()
        .find(|v| v.code == "GlobalScopeUsage")
        .unwrap();
    assert!(global.fix.is_none());
}
