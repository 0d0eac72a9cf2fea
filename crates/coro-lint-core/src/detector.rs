//! Detector trait and the diagnostic reporting boundary.

use tracing::{debug, warn};

use crate::context::FileContext;
use crate::fix::Fix;
use crate::syntax::{KindTag, NodeId, Span};
use crate::types::{Issue, Severity, Violation};
use crate::utils::allowance::check_allow_with_reason;
use crate::utils::annotations::is_suppressed_by_annotation;

/// Sink that detectors report diagnostics to.
pub trait DiagnosticSink {
    /// Reports one diagnostic for `issue` at `span`, optionally with a fix.
    fn report(&mut self, issue: &'static Issue, span: Span, message: &str, fix: Option<Fix>);
}

/// A per-node detector over the host-agnostic syntax tree.
///
/// The analyzer walks each tree once in pre-order and calls [`Detector::visit`]
/// for every node whose kind is listed in [`Detector::applicable_kinds`].
/// Detectors keep no state between calls.
///
/// # Example
///
/// ```ignore
/// use coro_lint_core::{Detector, DiagnosticSink, FileContext, Issue, KindTag, NodeId};
///
/// pub struct NoRunBlocking;
///
/// impl Detector for NoRunBlocking {
///     fn issue(&self) -> &'static Issue { &ISSUE }
///     fn applicable_kinds(&self) -> &'static [KindTag] { &[KindTag::Call] }
///
///     fn visit(&self, ctx: &FileContext<'_>, node: NodeId, sink: &mut dyn DiagnosticSink) {
///         // inspect ctx.tree / ctx.resolve(node) and call sink.report(..)
///     }
/// }
/// ```
pub trait Detector: Send + Sync {
    /// Stable identity of the issue this detector reports.
    fn issue(&self) -> &'static Issue;

    /// Node kinds this detector wants to visit.
    fn applicable_kinds(&self) -> &'static [KindTag];

    /// Inspects `node` and reports zero or more diagnostics.
    fn visit(&self, ctx: &FileContext<'_>, node: NodeId, sink: &mut dyn DiagnosticSink);
}

/// Type alias for boxed Detector trait objects.
pub type DetectorBox = Box<dyn Detector>;

/// Collects reported diagnostics as [`Violation`]s for one file.
///
/// Applies inline `coro-lint: allow(..)` comments and `@Suppress` annotations,
/// and checks that every diagnostic lies within the node being visited.
pub struct ViolationCollector<'a> {
    ctx: &'a FileContext<'a>,
    trigger: Option<NodeId>,
    severity_override: Option<Severity>,
    violations: Vec<Violation>,
    suppressed: usize,
}

impl<'a> ViolationCollector<'a> {
    /// Creates an empty collector for `ctx`.
    #[must_use]
    pub fn new(ctx: &'a FileContext<'a>) -> Self {
        Self {
            ctx,
            trigger: None,
            severity_override: None,
            violations: Vec::new(),
            suppressed: 0,
        }
    }

    /// Marks `node` as the node about to be visited, with an optional
    /// severity override for the detector visiting it.
    pub fn begin(&mut self, node: NodeId, severity_override: Option<Severity>) {
        self.trigger = Some(node);
        self.severity_override = severity_override;
    }

    /// Number of diagnostics dropped by suppressions.
    #[must_use]
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    /// Consumes the collector and returns the violations in report order.
    #[must_use]
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    fn is_suppressed(&self, issue: &Issue, span: Span) -> bool {
        let (line, _) = self.ctx.line_col(span.start);
        if check_allow_with_reason(self.ctx.content(), line, issue.id).is_allowed() {
            return true;
        }
        self.trigger
            .is_some_and(|node| is_suppressed_by_annotation(self.ctx.tree, node, issue.id))
    }
}

impl DiagnosticSink for ViolationCollector<'_> {
    fn report(&mut self, issue: &'static Issue, span: Span, message: &str, fix: Option<Fix>) {
        if let Some(node) = self.trigger {
            let node_span = self.ctx.tree.span(node);
            if !node_span.contains(span) {
                warn!(
                    "{}: diagnostic {:?} escapes triggering node {:?}",
                    issue.id, span, node_span
                );
            }
        }

        if self.is_suppressed(issue, span) {
            debug!("{} suppressed at offset {}", issue.id, span.start);
            self.suppressed += 1;
            return;
        }

        let severity = self.severity_override.unwrap_or(issue.severity);
        let mut violation = Violation::new(
            issue.id,
            issue.name,
            severity,
            self.ctx.location(span),
            message,
        );
        if let Some(fix) = fix {
            violation = violation.with_fix(fix);
        }
        self.violations.push(violation);
    }
}
