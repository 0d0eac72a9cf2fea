//! Detector registry.

use crate::{global_scope, job_in_builder, GlobalScopeUsage, JobInBuilderUsage};
use coro_lint_core::{Config, DetectorBox, Issue};

/// Returns every issue this crate can report, in registry order.
#[must_use]
pub fn issues() -> [&'static Issue; 2] {
    [&global_scope::ISSUE, &job_in_builder::ISSUE]
}

/// Returns all detectors with default settings.
#[must_use]
pub fn all_detectors() -> Vec<DetectorBox> {
    vec![
        Box::new(GlobalScopeUsage::new()),
        Box::new(JobInBuilderUsage::new()),
    ]
}

/// Returns all detectors configured from `config`.
#[must_use]
pub fn configured_detectors(config: &Config) -> Vec<DetectorBox> {
    vec![
        Box::new(GlobalScopeUsage::from_config(config)),
        Box::new(JobInBuilderUsage::from_config(config)),
    ]
}

/// Returns the configured detectors whose issue id or name is in `ids`
/// (case-insensitive). Unknown ids are ignored.
#[must_use]
pub fn detectors_by_id<S: AsRef<str>>(ids: &[S], config: &Config) -> Vec<DetectorBox> {
    configured_detectors(config)
        .into_iter()
        .filter(|d| {
            let issue = d.issue();
            ids.iter().any(|id| {
                let id = id.as_ref().trim();
                id.eq_ignore_ascii_case(issue.id) || id.eq_ignore_ascii_case(issue.name)
            })
        })
        .collect()
}
