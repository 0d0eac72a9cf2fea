//! Detector for `GlobalScope` references.
//!
//! # Rationale
//!
//! Coroutines started in `GlobalScope` are not bound to any lifecycle. They
//! keep running after the screen or view model that started them is gone,
//! holding resources and leaking memory.
//!
//! # Detected Patterns
//!
//! - Any reference to `GlobalScope`, e.g. `GlobalScope.launch { }`
//!
//! # Fixes
//!
//! Inside a `ViewModel` subclass with `lifecycle-viewmodel-ktx` on the
//! classpath the reference is replaced by `viewModelScope`; inside a
//! `Fragment` subclass with `lifecycle-runtime-ktx`, by `lifecycleScope`.
//!
//! # Configuration
//!
//! - `supertype_policy`: `direct` (default) or `transitive`
//!
//! # Suppression
//!
//! - `@Suppress("GlobalScopeUsage")` on the enclosing class
//! - `// coro-lint: allow(GlobalScopeUsage)` comment

use coro_lint_core::{
    Category, Config, Detector, DiagnosticSink, FileContext, Fix, Issue, KindTag, NodeId,
    Severity, SupertypePolicy,
};
use tracing::debug;

use crate::classifier::{class_is_owner, classify, LifecycleOwner, SymbolClass, GLOBAL_SCOPE_NAME};

/// Issue id for global-scope usage.
pub const ID: &str = "GlobalScopeUsage";

/// Issue name for global-scope usage.
pub const NAME: &str = "global-scope-usage";

/// Issue reported on every `GlobalScope` reference.
pub static ISSUE: Issue = Issue {
    id: ID,
    name: NAME,
    title: "GlobalScope should not use",
    explanation: "GlobalScope usage can lead to excessive resource usage and memory leaks. \
                  That is no recommended to use.",
    category: Category {
        name: "Coroutine scope usage",
        priority: 2,
    },
    priority: 1,
    severity: Severity::Warning,
};

/// Flags references to the process-wide `GlobalScope`.
#[derive(Debug, Clone, Default)]
pub struct GlobalScopeUsage {
    /// How enclosing classes are matched against lifecycle owners.
    pub supertype_policy: SupertypePolicy,
}

impl GlobalScopeUsage {
    /// Creates a new detector with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detector configured from `[rules.GlobalScopeUsage]`.
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

    /// Lifecycle-bound scope to use instead, if the enclosing class has one
    /// and its library is declared.
    fn replacement_scope(&self, ctx: &FileContext<'_>, node: NodeId) -> Option<LifecycleOwner> {
        let Some(class) = ctx.tree.enclosing_class(node) else {
            debug!("{ID}: no enclosing class, reporting without fix");
            return None;
        };
        LifecycleOwner::ALL.into_iter().find(|&owner| {
            class_is_owner(ctx, class, owner, self.supertype_policy)
                && ctx.has_dependency(owner.scope_artifact())
        })
    }
}

impl Detector for GlobalScopeUsage {
    fn issue(&self) -> &'static Issue {
        &ISSUE
    }

    fn applicable_kinds(&self) -> &'static [KindTag] {
        &[KindTag::Identifier]
    }

    fn visit(&self, ctx: &FileContext<'_>, node: NodeId, sink: &mut dyn DiagnosticSink) {
        if ctx.tree.identifier_name(node) != Some(GLOBAL_SCOPE_NAME) {
            return;
        }
        // A same-named declaration from elsewhere is not the coroutines object.
        if let Some(symbol) = ctx.resolve(node) {
            if classify(Some(&symbol)) != SymbolClass::GlobalScopeRef {
                debug!("{ID}: {} is not kotlinx GlobalScope", symbol.qualified_name);
                return;
            }
        }

        let span = ctx.tree.span(node);
        let fix = self.replacement_scope(ctx, node).map(|owner| {
            let accessor = owner.scope_accessor();
            Fix::replace(format!("Replace GlobalScope by {accessor}"), span, accessor)
        });
        sink.report(&ISSUE, span, ISSUE.title, fix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixed, fragment, object, run, view_model, MapResolver, Unit};
    use coro_lint_core::{Dependency, Symbol, SymbolKind, SyntaxTree};

    const VIEW_MODEL_KTX: &str = "androidx.lifecycle:lifecycle-viewmodel-ktx:2.6.1";
    const RUNTIME_KTX: &str = "androidx.lifecycle:lifecycle-runtime-ktx:2.6.1";

    fn class_with_global_scope(base: Option<Symbol>) -> (String, SyntaxTree, MapResolver) {
        let src = "class Screen : Base() {\n    fun f() = GlobalScope.launch { }\n}\n".to_string();
        let mut u = Unit::new(&src);
        let scope = u.ident("GlobalScope");
        let launch = u.ident("launch");
        let body = u.lambda(u.span("{ }"), vec![]);
        let call = u.call(
            u.span("GlobalScope.launch { }"),
            Some(scope),
            launch,
            vec![],
            Some(body),
        );
        let class = u.class("Screen", u.span(&src[..src.len() - 1]), vec![call]);
        u.resolve(scope, object("kotlinx.coroutines.GlobalScope"));
        let supertypes = base.into_iter().collect();
        u.resolve(
            class,
            Symbol::new("app.Screen", SymbolKind::Class).with_supertypes(supertypes),
        );
        let (tree, resolver) = u.finish();
        (src, tree, resolver)
    }

    #[test]
    fn test_view_model_with_dependency_gets_fix() {
        let (src, tree, resolver) = class_with_global_scope(Some(view_model()));
        let deps = [Dependency::new(VIEW_MODEL_KTX)];
        let violations = run(&GlobalScopeUsage::new(), &tree, &resolver, &deps);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "GlobalScope should not use");
        assert_eq!(violations[0].location.line, 2);
        assert!(fixed(&src, &violations[0]).contains("viewModelScope.launch { }"));
    }

    #[test]
    fn test_fragment_with_dependency_gets_lifecycle_scope() {
        let (src, tree, resolver) = class_with_global_scope(Some(fragment()));
        let deps = [Dependency::new(RUNTIME_KTX)];
        let violations = run(&GlobalScopeUsage::new(), &tree, &resolver, &deps);
        assert_eq!(violations.len(), 1);
        assert!(fixed(&src, &violations[0]).contains("lifecycleScope.launch { }"));
    }

    #[test]
    fn test_owner_without_dependency_reports_without_fix() {
        let (_, tree, resolver) = class_with_global_scope(Some(view_model()));
        let deps = [Dependency::new(RUNTIME_KTX)];
        let violations = run(&GlobalScopeUsage::new(), &tree, &resolver, &deps);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].fix.is_none());
    }

    #[test]
    fn test_plain_class_reports_without_fix() {
        let (_, tree, resolver) = class_with_global_scope(None);
        let deps = [Dependency::new(VIEW_MODEL_KTX), Dependency::new(RUNTIME_KTX)];
        let violations = run(&GlobalScopeUsage::new(), &tree, &resolver, &deps);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].fix.is_none());
    }

    #[test]
    fn test_indirect_owner_needs_transitive_policy() {
        let base = Symbol::new("app.BaseViewModel", SymbolKind::Class)
            .with_supertypes(vec![view_model()]);
        let (_, tree, resolver) = class_with_global_scope(Some(base));
        let deps = [Dependency::new(VIEW_MODEL_KTX)];

        let direct = run(&GlobalScopeUsage::new(), &tree, &resolver, &deps);
        assert!(direct[0].fix.is_none());

        let transitive = GlobalScopeUsage::new().supertype_policy(SupertypePolicy::Transitive);
        let violations = run(&transitive, &tree, &resolver, &deps);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].fix.is_some());
    }

    #[test]
    fn test_top_level_reference_still_reported() {
        let src = "val job = GlobalScope.async { 1 }\nval other = GlobalScope";
        let mut u = Unit::new(src);
        u.ident_nth("GlobalScope", 0);
        u.ident_nth("GlobalScope", 1);
        let (tree, resolver) = u.finish();
        let violations = run(&GlobalScopeUsage::new(), &tree, &resolver, &[]);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.fix.is_none()));
    }

    #[test]
    fn test_unrelated_same_name_is_ignored() {
        let src = "val s = GlobalScope";
        let mut u = Unit::new(src);
        let id = u.ident("GlobalScope");
        u.resolve(id, object("com.example.GlobalScope"));
        let (tree, resolver) = u.finish();
        assert!(run(&GlobalScopeUsage::new(), &tree, &resolver, &[]).is_empty());
    }

    #[test]
    fn test_from_config_reads_policy() {
        let config = Config::parse("[rules.GlobalScopeUsage]\nsupertype_policy = \"transitive\"\n")
            .unwrap();
        let detector = GlobalScopeUsage::from_config(&config);
        assert_eq!(detector.supertype_policy, SupertypePolicy::Transitive);
        assert_eq!(
            GlobalScopeUsage::from_config(&Config::default()).supertype_policy,
            SupertypePolicy::Direct
        );
    }
}
