//! Library declarations the resolver knows without a classpath.
//!
//! Covers the parts of kotlinx.coroutines, androidx.lifecycle and
//! androidx.fragment that coroutine-scope analysis needs. `NonCancellable`
//! is deliberately listed as a plain context element, not as a `Job`.

use coro_lint_core::{Symbol, SymbolKind};

/// A declaration from a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownSymbol {
    /// Fully qualified name.
    pub qualified_name: &'static str,
    /// Declaration kind.
    pub kind: SymbolKind,
    /// Direct supertypes of a type declaration.
    pub supertypes: &'static [&'static str],
    /// Return type of a function or type of a property.
    pub value_type: Option<&'static str>,
}

const fn ty(
    qualified_name: &'static str,
    kind: SymbolKind,
    supertypes: &'static [&'static str],
) -> KnownSymbol {
    KnownSymbol {
        qualified_name,
        kind,
        supertypes,
        value_type: None,
    }
}

const fn value(
    qualified_name: &'static str,
    kind: SymbolKind,
    value_type: Option<&'static str>,
) -> KnownSymbol {
    KnownSymbol {
        qualified_name,
        kind,
        supertypes: &[],
        value_type,
    }
}

const CONTEXT: &str = "kotlin.coroutines.CoroutineContext";
const ELEMENT: &str = "kotlin.coroutines.CoroutineContext.Element";
const SCOPE: &str = "kotlinx.coroutines.CoroutineScope";
const JOB: &str = "kotlinx.coroutines.Job";
const COMPLETABLE_JOB: &str = "kotlinx.coroutines.CompletableJob";
const DISPATCHER: &str = "kotlinx.coroutines.CoroutineDispatcher";
const LIFECYCLE_OWNER: &str = "androidx.lifecycle.LifecycleOwner";

static KNOWN: &[KnownSymbol] = &[
    ty(CONTEXT, SymbolKind::Interface, &[]),
    ty(ELEMENT, SymbolKind::Interface, &[CONTEXT]),
    ty(
        "kotlin.coroutines.AbstractCoroutineContextElement",
        SymbolKind::Class,
        &[ELEMENT],
    ),
    ty(SCOPE, SymbolKind::Interface, &[]),
    ty("kotlinx.coroutines.GlobalScope", SymbolKind::Object, &[SCOPE]),
    ty(JOB, SymbolKind::Interface, &[ELEMENT]),
    ty(COMPLETABLE_JOB, SymbolKind::Interface, &[JOB]),
    ty("kotlinx.coroutines.Deferred", SymbolKind::Interface, &[JOB]),
    value(JOB, SymbolKind::Function, Some(COMPLETABLE_JOB)),
    value(
        "kotlinx.coroutines.SupervisorJob",
        SymbolKind::Function,
        Some(COMPLETABLE_JOB),
    ),
    ty(
        "kotlinx.coroutines.NonCancellable",
        SymbolKind::Object,
        &["kotlin.coroutines.AbstractCoroutineContextElement"],
    ),
    value("kotlinx.coroutines.launch", SymbolKind::Function, Some(JOB)),
    value(
        "kotlinx.coroutines.async",
        SymbolKind::Function,
        Some("kotlinx.coroutines.Deferred"),
    ),
    value("kotlinx.coroutines.withContext", SymbolKind::Function, None),
    value("kotlinx.coroutines.delay", SymbolKind::Function, None),
    value("kotlinx.coroutines.coroutineScope", SymbolKind::Function, None),
    value("kotlinx.coroutines.supervisorScope", SymbolKind::Function, None),
    value("kotlinx.coroutines.runBlocking", SymbolKind::Function, None),
    ty(DISPATCHER, SymbolKind::Class, &[ELEMENT]),
    ty("kotlinx.coroutines.Dispatchers", SymbolKind::Object, &[]),
    value("kotlinx.coroutines.Dispatchers.IO", SymbolKind::Property, Some(DISPATCHER)),
    value("kotlinx.coroutines.Dispatchers.Main", SymbolKind::Property, Some(DISPATCHER)),
    value(
        "kotlinx.coroutines.Dispatchers.Default",
        SymbolKind::Property,
        Some(DISPATCHER),
    ),
    value(
        "kotlinx.coroutines.Dispatchers.Unconfined",
        SymbolKind::Property,
        Some(DISPATCHER),
    ),
    ty(
        "kotlinx.coroutines.CoroutineExceptionHandler",
        SymbolKind::Interface,
        &[ELEMENT],
    ),
    value(
        "kotlinx.coroutines.CoroutineExceptionHandler",
        SymbolKind::Function,
        Some("kotlinx.coroutines.CoroutineExceptionHandler"),
    ),
    ty("kotlinx.coroutines.CoroutineName", SymbolKind::Class, &[ELEMENT]),
    ty(LIFECYCLE_OWNER, SymbolKind::Interface, &[]),
    ty("androidx.lifecycle.ViewModel", SymbolKind::Class, &[]),
    value(
        "androidx.lifecycle.viewModelScope",
        SymbolKind::Property,
        Some(SCOPE),
    ),
    ty(
        "androidx.lifecycle.LifecycleCoroutineScope",
        SymbolKind::Class,
        &[SCOPE],
    ),
    value(
        "androidx.lifecycle.lifecycleScope",
        SymbolKind::Property,
        Some("androidx.lifecycle.LifecycleCoroutineScope"),
    ),
    ty(
        "androidx.fragment.app.Fragment",
        SymbolKind::Class,
        &[LIFECYCLE_OWNER],
    ),
    ty(
        "androidx.appcompat.app.AppCompatActivity",
        SymbolKind::Class,
        &[LIFECYCLE_OWNER],
    ),
];

/// Returns the table of known declarations.
#[must_use]
pub fn known_symbols() -> &'static [KnownSymbol] {
    KNOWN
}

/// Declarations named `qualified_name`, in table order.
pub fn lookup(qualified_name: &str) -> impl Iterator<Item = &'static KnownSymbol> + '_ {
    KNOWN
        .iter()
        .filter(move |k| k.qualified_name == qualified_name)
}

/// Known type declaration named `qualified_name`.
#[must_use]
pub fn lookup_type(qualified_name: &str) -> Option<&'static KnownSymbol> {
    lookup(qualified_name).find(|k| is_type_kind(k.kind))
}

fn is_type_kind(kind: SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::Class | SymbolKind::Interface | SymbolKind::Object
    )
}

impl KnownSymbol {
    /// Converts to a [`Symbol`], filling in supertypes from the table.
    #[must_use]
    pub fn to_symbol(&self) -> Symbol {
        let supertypes = self
            .supertypes
            .iter()
            .map(|qn| {
                lookup_type(qn).map_or_else(
                    || Symbol::new(*qn, SymbolKind::Interface),
                    KnownSymbol::to_symbol,
                )
            })
            .collect();
        Symbol::new(self.qualified_name, self.kind).with_supertypes(supertypes)
    }

    /// Type symbol of the value this declaration produces.
    #[must_use]
    pub fn value_symbol(&self) -> Option<Symbol> {
        if self.kind == SymbolKind::Object {
            return Some(self.to_symbol());
        }
        let qn = self.value_type?;
        Some(lookup_type(qn).map_or_else(
            || Symbol::new(qn, SymbolKind::Class),
            KnownSymbol::to_symbol,
        ))
    }
}
