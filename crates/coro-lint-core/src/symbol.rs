//! Resolved symbols and the resolver boundary.
//!
//! The host frontend owns name resolution. Detectors only ask it questions
//! through [`Resolver`], and treat every `None` as "condition not met".

use serde::{Deserialize, Serialize};

use crate::syntax::{NodeId, SyntaxTree};

/// Declaration kind of a [`Symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// `class Foo`
    Class,
    /// `interface Foo`
    Interface,
    /// `object Foo`
    Object,
    /// `fun foo()`
    Function,
    /// Top-level or member property, including extension properties.
    Property,
    /// Local variable or parameter.
    Variable,
}

/// A resolved declaration reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Fully qualified name, e.g. `kotlinx.coroutines.GlobalScope`.
    pub qualified_name: String,
    /// Declaration kind.
    pub kind: SymbolKind,
    /// Owning package.
    pub package: String,
    /// Directly declared supertypes (types only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<Symbol>,
}

impl Symbol {
    /// Creates a symbol; the package is everything before the last dot.
    #[must_use]
    pub fn new(qualified_name: impl Into<String>, kind: SymbolKind) -> Self {
        let qualified_name = qualified_name.into();
        let package = qualified_name
            .rsplit_once('.')
            .map(|(pkg, _)| pkg.to_string())
            .unwrap_or_default();
        Self {
            qualified_name,
            kind,
            package,
            supertypes: Vec::new(),
        }
    }

    /// Sets the directly declared supertypes.
    #[must_use]
    pub fn with_supertypes(mut self, supertypes: Vec<Symbol>) -> Self {
        self.supertypes = supertypes;
        self
    }

    /// Overrides the owning package (member declarations).
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Last segment of the qualified name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map_or(self.qualified_name.as_str(), |(_, name)| name)
    }

    /// Returns true for classes, interfaces and objects.
    #[must_use]
    pub fn is_type(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::Object
        )
    }

    /// Non-strict subtype test: true if this is `qualified_name` or any
    /// transitive supertype is.
    #[must_use]
    pub fn is_subtype_of(&self, qualified_name: &str) -> bool {
        self.qualified_name == qualified_name
            || self
                .supertypes
                .iter()
                .any(|s| s.is_subtype_of(qualified_name))
    }
}

/// A declared external library coordinate, e.g.
/// `androidx.lifecycle:lifecycle-viewmodel-ktx:2.6.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dependency {
    /// Raw coordinate string.
    pub coordinate: String,
}

impl Dependency {
    /// Creates a dependency from a coordinate string.
    #[must_use]
    pub fn new(coordinate: impl Into<String>) -> Self {
        Self {
            coordinate: coordinate.into(),
        }
    }

    /// Returns true if the coordinate mentions `artifact` (`group:name`).
    #[must_use]
    pub fn matches(&self, artifact: &str) -> bool {
        self.coordinate.contains(artifact)
    }
}

impl From<&str> for Dependency {
    fn from(coordinate: &str) -> Self {
        Self::new(coordinate)
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.coordinate)
    }
}

/// Name and type resolution supplied by the host.
///
/// Implementations must be read-only: detectors may call them any number of
/// times, from several threads analysing different files.
pub trait Resolver: Send + Sync {
    /// Resolves an identifier, call or declaration node to its declaration.
    /// Returns `None` when unresolved or ambiguous.
    fn resolve(&self, tree: &SyntaxTree, node: NodeId) -> Option<Symbol>;

    /// Directly declared supertypes of a class declaration node.
    fn supertypes(&self, tree: &SyntaxTree, class: NodeId) -> Vec<Symbol> {
        self.resolve(tree, class)
            .map(|s| s.supertypes)
            .unwrap_or_default()
    }

    /// Static type of an expression, as a type symbol with supertypes filled in.
    fn expression_type(&self, tree: &SyntaxTree, node: NodeId) -> Option<Symbol>;
}

/// Resolver that never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl Resolver for NullResolver {
    fn resolve(&self, _tree: &SyntaxTree, _node: NodeId) -> Option<Symbol> {
        None
    }

    fn expression_type(&self, _tree: &SyntaxTree, _node: NodeId) -> Option<Symbol> {
        None
    }
}
