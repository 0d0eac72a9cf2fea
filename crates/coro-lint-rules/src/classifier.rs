//! Symbol classification.
//!
//! Maps resolved symbols onto the closed set of declarations the detectors
//! care about. Every qualified-name literal used by the detectors lives in
//! this module; everything else switches on [`SymbolClass`].

use coro_lint_core::{FileContext, NodeId, SupertypePolicy, Symbol, SymbolKind};

/// Simple name of the process-wide scope as written in source.
pub const GLOBAL_SCOPE_NAME: &str = "GlobalScope";

const GLOBAL_SCOPE: &str = "kotlinx.coroutines.GlobalScope";
const JOB: &str = "kotlinx.coroutines.Job";
const SUPERVISOR_JOB: &str = "kotlinx.coroutines.SupervisorJob";
const NON_CANCELLABLE: &str = "kotlinx.coroutines.NonCancellable";
const LAUNCH: &str = "kotlinx.coroutines.launch";
const ASYNC: &str = "kotlinx.coroutines.async";

const VIEW_MODEL: &str = "androidx.lifecycle.ViewModel";
const VIEW_MODEL_SCOPE: &str = "androidx.lifecycle.viewModelScope";
const VIEW_MODEL_ARTIFACT: &str = "androidx.lifecycle:lifecycle-viewmodel-ktx";

const FRAGMENT: &str = "androidx.fragment.app.Fragment";
const LIFECYCLE_SCOPE: &str = "androidx.lifecycle.lifecycleScope";
const LIFECYCLE_ARTIFACT: &str = "androidx.lifecycle:lifecycle-runtime-ktx";

/// A class category whose instances own a lifecycle-bound scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleOwner {
    /// `androidx.lifecycle.ViewModel`
    ViewModel,
    /// `androidx.fragment.app.Fragment`
    Fragment,
}

impl LifecycleOwner {
    /// Owners in the order fixes prefer them.
    pub const ALL: [Self; 2] = [Self::ViewModel, Self::Fragment];

    /// Qualified name of the owner base class.
    #[must_use]
    pub fn class_name(self) -> &'static str {
        match self {
            Self::ViewModel => VIEW_MODEL,
            Self::Fragment => FRAGMENT,
        }
    }

    /// Name of the scope accessor available inside the owner.
    #[must_use]
    pub fn scope_accessor(self) -> &'static str {
        self.accessor_name()
            .rsplit('.')
            .next()
            .unwrap_or_else(|| self.accessor_name())
    }

    /// Library coordinate (`group:artifact`) that provides the accessor.
    #[must_use]
    pub fn scope_artifact(self) -> &'static str {
        match self {
            Self::ViewModel => VIEW_MODEL_ARTIFACT,
            Self::Fragment => LIFECYCLE_ARTIFACT,
        }
    }

    fn accessor_name(self) -> &'static str {
        match self {
            Self::ViewModel => VIEW_MODEL_SCOPE,
            Self::Fragment => LIFECYCLE_SCOPE,
        }
    }
}

/// A structured-concurrency builder function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builder {
    /// `launch`
    Launch,
    /// `async`
    Async,
}

/// Domain classification of a resolved symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolClass {
    /// The `GlobalScope` object.
    GlobalScopeRef,
    /// The `Job()` factory function.
    JobConstructorCall,
    /// The `SupervisorJob()` factory function.
    SupervisorJobConstructorCall,
    /// The `NonCancellable` context object.
    NonCancellableRef,
    /// A builder function.
    CoroutineBuilder(Builder),
    /// A lifecycle-owner base class.
    LifecycleOwnerClass(LifecycleOwner),
    /// A lifecycle-bound scope accessor.
    LifecycleScopedAccessor(LifecycleOwner),
    /// Anything else, including unresolved nodes.
    Unrelated,
}

/// Classifies a symbol by exact qualified name.
#[must_use]
pub fn classify(symbol: Option<&Symbol>) -> SymbolClass {
    let Some(symbol) = symbol else {
        return SymbolClass::Unrelated;
    };
    let is_function = symbol.kind == SymbolKind::Function;
    match symbol.qualified_name.as_str() {
        GLOBAL_SCOPE if !is_function => SymbolClass::GlobalScopeRef,
        JOB if is_function => SymbolClass::JobConstructorCall,
        SUPERVISOR_JOB if is_function => SymbolClass::SupervisorJobConstructorCall,
        NON_CANCELLABLE if !is_function => SymbolClass::NonCancellableRef,
        LAUNCH if is_function => SymbolClass::CoroutineBuilder(Builder::Launch),
        ASYNC if is_function => SymbolClass::CoroutineBuilder(Builder::Async),
        VIEW_MODEL if symbol.is_type() => {
            SymbolClass::LifecycleOwnerClass(LifecycleOwner::ViewModel)
        }
        FRAGMENT if symbol.is_type() => SymbolClass::LifecycleOwnerClass(LifecycleOwner::Fragment),
        VIEW_MODEL_SCOPE if !symbol.is_type() => {
            SymbolClass::LifecycleScopedAccessor(LifecycleOwner::ViewModel)
        }
        LIFECYCLE_SCOPE if !symbol.is_type() => {
            SymbolClass::LifecycleScopedAccessor(LifecycleOwner::Fragment)
        }
        _ => SymbolClass::Unrelated,
    }
}

/// Resolves `node` and classifies the result.
#[must_use]
pub fn classify_node(ctx: &FileContext<'_>, node: NodeId) -> SymbolClass {
    classify(ctx.resolve(node).as_ref())
}

/// Returns true if `ty` is assignable to `Job`.
#[must_use]
pub fn is_job_type(ty: &Symbol) -> bool {
    ty.is_type() && ty.is_subtype_of(JOB)
}

/// Returns true if the class declaration `class` qualifies as `owner` under
/// `policy`.
#[must_use]
pub fn class_is_owner(
    ctx: &FileContext<'_>,
    class: NodeId,
    owner: LifecycleOwner,
    policy: SupertypePolicy,
) -> bool {
    ctx.supertypes(class).iter().any(|supertype| match policy {
        SupertypePolicy::Direct => {
            classify(Some(supertype)) == SymbolClass::LifecycleOwnerClass(owner)
        }
        SupertypePolicy::Transitive => supertype.is_subtype_of(owner.class_name()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(qn: &str) -> Symbol {
        Symbol::new(qn, SymbolKind::Function)
    }

    #[test]
    fn test_unresolved_is_unrelated() {
        assert_eq!(classify(None), SymbolClass::Unrelated);
    }

    #[test]
    fn test_classify_coroutines_symbols() {
        assert_eq!(
            classify(Some(&Symbol::new(GLOBAL_SCOPE, SymbolKind::Object))),
            SymbolClass::GlobalScopeRef
        );
        assert_eq!(
            classify(Some(&function(SUPERVISOR_JOB))),
            SymbolClass::SupervisorJobConstructorCall
        );
        assert_eq!(classify(Some(&function(JOB))), SymbolClass::JobConstructorCall);
        assert_eq!(
            classify(Some(&Symbol::new(NON_CANCELLABLE, SymbolKind::Object))),
            SymbolClass::NonCancellableRef
        );
        assert_eq!(
            classify(Some(&function(ASYNC))),
            SymbolClass::CoroutineBuilder(Builder::Async)
        );
    }

    #[test]
    fn test_job_interface_is_not_a_constructor() {
        let job = Symbol::new(JOB, SymbolKind::Interface);
        assert_eq!(classify(Some(&job)), SymbolClass::Unrelated);
        assert!(is_job_type(&job));
    }

    #[test]
    fn test_classify_lifecycle_symbols() {
        assert_eq!(
            classify(Some(&Symbol::new(VIEW_MODEL, SymbolKind::Class))),
            SymbolClass::LifecycleOwnerClass(LifecycleOwner::ViewModel)
        );
        assert_eq!(
            classify(Some(&Symbol::new(LIFECYCLE_SCOPE, SymbolKind::Property))),
            SymbolClass::LifecycleScopedAccessor(LifecycleOwner::Fragment)
        );
    }

    #[test]
    fn test_same_simple_name_elsewhere_is_unrelated() {
        let own = Symbol::new("com.example.GlobalScope", SymbolKind::Object);
        assert_eq!(classify(Some(&own)), SymbolClass::Unrelated);
    }

    #[test]
    fn test_owner_accessors() {
        assert_eq!(LifecycleOwner::ViewModel.scope_accessor(), "viewModelScope");
        assert_eq!(LifecycleOwner::Fragment.scope_accessor(), "lifecycleScope");
        assert!(LifecycleOwner::Fragment
            .scope_artifact()
            .ends_with("lifecycle-runtime-ktx"));
    }

    #[test]
    fn test_completable_job_is_job_type() {
        let completable = Symbol::new("kotlinx.coroutines.CompletableJob", SymbolKind::Interface)
            .with_supertypes(vec![Symbol::new(JOB, SymbolKind::Interface)]);
        assert!(is_job_type(&completable));
        assert!(!is_job_type(&Symbol::new(
            "kotlin.coroutines.CoroutineContext",
            SymbolKind::Interface
        )));
    }
}
