//! Detector for `Job` and `NonCancellable` misuse at `launch`/`async` calls.
//!
//! # Rationale
//!
//! A `Job` passed into a builder replaces the parent job of the new
//! coroutine. The coroutine is no longer a child of its scope, so
//! cancellation and error propagation silently stop working.
//!
//! # Detected Patterns
//!
//! - `launch(NonCancellable) { launch { } }`: builders nested directly in
//!   the body of a builder that runs with `NonCancellable`
//! - `viewModelScope.launch(Dispatchers.IO + SupervisorJob())` inside a
//!   `ViewModel` subclass, or `lifecycleScope` inside a `Fragment`
//! - `launch(job)` where `job` is a `Job`
//!
//! The three checks run independently and their diagnostics accumulate.
//!
//! # Fixes
//!
//! - Nested builders under `NonCancellable` become `withContext` calls
//! - `SupervisorJob()` is removed from a `+` context chain
//!
//! # Configuration
//!
//! - `supertype_policy`: `direct` (default) or `transitive`

use coro_lint_core::{
    Category, Config, Detector, DiagnosticSink, FileContext, Fix, Issue, KindTag, NodeId,
    NodeKind, Severity, Span, SupertypePolicy,
};
use tracing::debug;

use crate::classifier::{class_is_owner, classify_node, is_job_type, SymbolClass};
use crate::combinator::CombinatorChain;
use crate::traversal::{
    argument_values, classified_nodes, context_argument, direct_nested_builders, is_builder_call,
};

/// Issue id for builder misuse.
pub const ID: &str = "JobInBuilderUsage";

/// Issue name for builder misuse.
pub const NAME: &str = "job-in-builder-usage";

/// Message for a `Job` handed to a builder.
pub const JOB_MESSAGE: &str = "Job instance should not be passed into coroutine builder.";

/// Message for a builder nested under `NonCancellable`.
pub const NON_CANCELLABLE_MESSAGE: &str = "NonCancellable instance usage inside coroutine \
                                           builder breaks exception handling for all \
                                           coroutines in the hierarchy.";

const REMOVE_SUPERVISOR_JOB: &str = "Remove SupervisorJob function call";
const REPLACE_WITH_CONTEXT: &str = "Replace launch/async call by withContext";
const WITH_CONTEXT: &str = "withContext";
const CURRENT_CONTEXT: &str = "coroutineContext";

/// Issue reported on builder calls misusing `Job` or `NonCancellable`.
pub static ISSUE: Issue = Issue {
    id: ID,
    name: NAME,
    title: JOB_MESSAGE,
    explanation: "Using Job instance inside coroutine builders has no effect, \
                  it can break expected error handling and coroutines cancellation.",
    category: Category {
        name: "Job in builder usage",
        priority: 2,
    },
    priority: 7,
    severity: Severity::Warning,
};

/// Flags `Job`-like arguments and `NonCancellable` children at builder calls.
#[derive(Debug, Clone, Default)]
pub struct JobInBuilderUsage {
    /// How enclosing classes are matched against lifecycle owners.
    pub supertype_policy: SupertypePolicy,
}

impl JobInBuilderUsage {
    /// Creates a new detector with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detector configured from `[rules.JobInBuilderUsage]`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        config
            .rule(ID)
            .map_or_else(Self::new, |rule| Self::new().supertype_policy(rule.supertype_policy()))
    }

    /// Sets the lifecycle-owner matching policy.
    #[must_use]
    pub fn supertype_policy(mut self, policy: SupertypePolicy) -> Self {
        self.supertype_policy = policy;
        self
    }

    /// Builders nested directly under a builder that runs `NonCancellable`.
    fn check_non_cancellable(
        &self,
        ctx: &FileContext<'_>,
        call: NodeId,
        sink: &mut dyn DiagnosticSink,
    ) {
        let references = classified_nodes(
            ctx,
            call,
            &[KindTag::Identifier, KindTag::Navigation],
            SymbolClass::NonCancellableRef,
        );
        if references.is_empty() {
            return;
        }
        for nested in direct_nested_builders(ctx, call) {
            let fix = with_context_fix(ctx, nested);
            sink.report(&ISSUE, ctx.tree.span(nested), NON_CANCELLABLE_MESSAGE, fix);
        }
    }

    /// `SupervisorJob()` in the context of a lifecycle-scoped builder such as
    /// `viewModelScope.launch` inside the matching owner class.
    fn check_supervisor_job(
        &self,
        ctx: &FileContext<'_>,
        call: NodeId,
        sink: &mut dyn DiagnosticSink,
    ) {
        let NodeKind::Call {
            receiver: Some(receiver),
            ..
        } = ctx.tree.kind(call)
        else {
            return;
        };
        let Some(context) = context_argument(ctx, call) else {
            return;
        };
        let supervisors = classified_nodes(
            ctx,
            context,
            &[KindTag::Call],
            SymbolClass::SupervisorJobConstructorCall,
        );
        if supervisors.is_empty() {
            return;
        }

        let SymbolClass::LifecycleScopedAccessor(owner) = classify_node(ctx, *receiver) else {
            return;
        };
        let in_owner = ctx
            .tree
            .enclosing_class(call)
            .is_some_and(|class| class_is_owner(ctx, class, owner, self.supertype_policy));
        if !in_owner {
            return;
        }

        for supervisor in supervisors {
            let fix = remove_operand_fix(ctx, context, supervisor);
            if fix.is_none() {
                debug!("{ID}: context is not a + chain, reporting without fix");
            }
            sink.report(&ISSUE, ctx.tree.span(supervisor), JOB_MESSAGE, fix);
        }
    }

    /// Every argument whose static type is a `Job`.
    fn check_job_arguments(
        &self,
        ctx: &FileContext<'_>,
        call: NodeId,
        sink: &mut dyn DiagnosticSink,
    ) {
        for value in argument_values(ctx, call) {
            match ctx.expression_type(value) {
                Some(ty) if is_job_type(&ty) => {
                    sink.report(&ISSUE, ctx.tree.span(value), JOB_MESSAGE, None);
                }
                Some(_) => {}
                None => debug!("{ID}: argument type unresolved at {:?}", ctx.tree.span(value)),
            }
        }
    }
}

impl Detector for JobInBuilderUsage {
    fn issue(&self) -> &'static Issue {
        &ISSUE
    }

    fn applicable_kinds(&self) -> &'static [KindTag] {
        &[KindTag::Call]
    }

    fn visit(&self, ctx: &FileContext<'_>, node: NodeId, sink: &mut dyn DiagnosticSink) {
        if !is_builder_call(ctx, node) {
            return;
        }
        self.check_non_cancellable(ctx, node, sink);
        self.check_supervisor_job(ctx, node, sink);
        self.check_job_arguments(ctx, node, sink);
    }
}

/// Rewrites `scope.launch(args) { .. }` into `withContext(context) { .. }`.
///
/// Only the context argument survives; `withContext` takes no `start`.
/// Without one the current `coroutineContext` is passed.
fn with_context_fix(ctx: &FileContext<'_>, call: NodeId) -> Option<Fix> {
    let NodeKind::Call {
        receiver,
        callee,
        args,
        lambda,
    } = ctx.tree.kind(call)
    else {
        return None;
    };
    let head = receiver.map_or(ctx.tree.span(*callee), |r| ctx.tree.span(r));
    let callee_end = ctx.tree.span(*callee).end;

    // Swallow the argument list between the callee and the lambda.
    let tail_end = lambda.map_or(ctx.tree.span(call).end, |l| ctx.tree.span(l).start);
    let gap = ctx.content().get(callee_end..tail_end)?;
    let trimmed = gap.trim();
    let end = if trimmed.is_empty() {
        callee_end
    } else if trimmed.starts_with('(') && trimmed.ends_with(')') {
        callee_end + gap.rfind(')')? + 1
    } else {
        debug!("{ID}: unexpected text before builder body, omitting fix");
        return None;
    };

    let context = context_argument(ctx, call).map_or(CURRENT_CONTEXT, |v| ctx.tree.text(v));
    if args.len() > 1 {
        debug!("{ID}: dropping non-context builder arguments in fix");
    }
    Some(Fix::replace(
        REPLACE_WITH_CONTEXT,
        Span::new(head.start, end),
        format!("{WITH_CONTEXT}({context})"),
    ))
}

/// Removes `operand` from the `+` chain forming the context argument.
fn remove_operand_fix(ctx: &FileContext<'_>, context: NodeId, operand: NodeId) -> Option<Fix> {
    let chain = CombinatorChain::from_node(ctx.tree, ctx.tree.strip_parens(context))?;
    let rest = chain.without(|n| ctx.tree.strip_parens(n) == operand)?;
    Some(Fix::replace(
        REMOVE_SUPERVISOR_JOB,
        chain.span(),
        rest.render(ctx.tree),
    ))
}
