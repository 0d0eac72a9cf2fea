//! # coro-lint-core
//!
//! Core framework for coroutine-misuse linting over a host-agnostic syntax
//! tree.
//!
//! This crate provides the foundational traits and types for building
//! detectors. It includes:
//!
//! - [`SyntaxTree`] and [`TreeBuilder`] for the arena-owned syntax model
//! - [`Resolver`] and [`Symbol`] for name and type resolution
//! - [`Detector`] trait for per-node detectors reporting to a [`DiagnosticSink`]
//! - [`Fix`] and [`apply_fixes`] for source edits
//! - [`Analyzer`] for orchestrating lint execution
//! - [`Violation`] for representing lint findings
//!
//! ## Example
//!
//! ```ignore
//! use coro_lint_core::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./app/src")
//!     .frontend(KotlinFrontend::new())
//!     .detector(GlobalScopeUsage::new())
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
mod detector;
mod fix;
mod frontend;
mod symbol;
mod syntax;
mod types;

/// Utility modules for suppression handling.
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{AnalyzerConfig, Config, ConfigError, ProjectConfig, RuleConfig, SupertypePolicy};
pub use context::{line_col, FileContext};
pub use detector::{Detector, DetectorBox, DiagnosticSink, ViolationCollector};
pub use fix::{apply_fixes, Edit, Fix, FixError, FixOutcome};
pub use frontend::{Frontend, FrontendError, ParsedUnit};
pub use symbol::{Dependency, NullResolver, Resolver, Symbol, SymbolKind};
pub use syntax::{KindTag, NodeId, NodeKind, Span, SyntaxNode, SyntaxTree, TreeBuilder};
pub use types::{Category, Issue, LintResult, Location, Severity, Violation, ViolationDiagnostic};
pub use utils::allowance::AllowCheck;
