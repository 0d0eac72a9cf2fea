//! # coro-lint-rules
//!
//! Coroutine misuse detectors for coro-lint.
//!
//! ## Available Detectors
//!
//! | Id | Name | Description |
//! |----|------|-------------|
//! | `GlobalScopeUsage` | `global-scope-usage` | Flags `GlobalScope` references, suggesting `viewModelScope`/`lifecycleScope` |
//! | `JobInBuilderUsage` | `job-in-builder-usage` | Flags `Job` arguments, `SupervisorJob()` in `viewModelScope` and builders under `NonCancellable` |
//!
//! ## Usage
//!
//! ```ignore
//! use coro_lint_core::Analyzer;
//! use coro_lint_rules::{GlobalScopeUsage, JobInBuilderUsage};
//!
//! let analyzer = Analyzer::builder()
//!     .root("./app/src")
//!     .frontend(KotlinFrontend::new())
//!     .detector(GlobalScopeUsage::new())
//!     .detector(JobInBuilderUsage::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classifier;
pub mod combinator;
mod global_scope;
mod job_in_builder;
mod presets;
pub mod traversal;

#[cfg(test)]
mod testing;

pub use global_scope::GlobalScopeUsage;
pub use job_in_builder::JobInBuilderUsage;
pub use presets::{all_detectors, configured_detectors, detectors_by_id, issues};

/// Re-export core types for convenience.
pub use coro_lint_core::{Detector, Severity, Violation};
