//! Context types for detector execution.

use std::path::{Path, PathBuf};

use crate::symbol::{Dependency, Resolver, Symbol};
use crate::syntax::{NodeId, Span, SyntaxTree};
use crate::types::Location;

/// Context provided to detectors for one compilation unit.
///
/// Bundles the parsed tree with the host collaborators that answer questions
/// about it. Everything here is shared, read-only state.
#[derive(Clone)]
pub struct FileContext<'a> {
    /// Absolute path to the file.
    pub path: &'a Path,
    /// Path relative to the project root.
    pub relative_path: PathBuf,
    /// Parsed syntax tree.
    pub tree: &'a SyntaxTree,
    /// Host resolver for this unit.
    pub resolver: &'a dyn Resolver,
    /// Library coordinates visible to this unit.
    pub dependencies: &'a [Dependency],
}

impl std::fmt::Debug for FileContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileContext")
            .field("path", &self.path)
            .field("relative_path", &self.relative_path)
            .field("nodes", &self.tree.len())
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl<'a> FileContext<'a> {
    /// Creates a new file context.
    #[must_use]
    pub fn new(
        path: &'a Path,
        root: &Path,
        tree: &'a SyntaxTree,
        resolver: &'a dyn Resolver,
        dependencies: &'a [Dependency],
    ) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf);
        Self {
            path,
            relative_path,
            tree,
            resolver,
            dependencies,
        }
    }

    /// File contents.
    #[must_use]
    pub fn content(&self) -> &'a str {
        self.tree.source()
    }

    /// Resolves `node` through the host resolver.
    #[must_use]
    pub fn resolve(&self, node: NodeId) -> Option<Symbol> {
        self.resolver.resolve(self.tree, node)
    }

    /// Static type of the expression `node`.
    #[must_use]
    pub fn expression_type(&self, node: NodeId) -> Option<Symbol> {
        self.resolver.expression_type(self.tree, node)
    }

    /// Directly declared supertypes of the class declaration `class`.
    #[must_use]
    pub fn supertypes(&self, class: NodeId) -> Vec<Symbol> {
        self.resolver.supertypes(self.tree, class)
    }

    /// Returns true if any declared dependency mentions `artifact`.
    #[must_use]
    pub fn has_dependency(&self, artifact: &str) -> bool {
        self.dependencies.iter().any(|d| d.matches(artifact))
    }

    /// 1-indexed line and column of a byte offset.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        line_col(self.content(), offset)
    }

    /// Location of `span` in this file.
    #[must_use]
    pub fn location(&self, span: Span) -> Location {
        let (line, column) = self.line_col(span.start);
        Location::new(self.relative_path.clone(), line, column).with_span(span.start, span.len())
    }
}

/// 1-indexed line and byte column of `offset` within `content`.
///
/// Offsets past the end are clamped to the end of the text.
#[must_use]
pub fn line_col(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = content.as_bytes().get(..offset).unwrap_or_default();
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    (line, offset - line_start + 1)
}
