//! Language frontends: source text in, syntax tree and resolver out.
//!
//! `Frontend` is the extension point for adding new languages. The analyzer
//! hands it raw source and gets back a [`ParsedUnit`] holding the
//! host-agnostic tree plus a resolver bound to that tree.

use thiserror::Error;

use crate::symbol::Resolver;
use crate::syntax::SyntaxTree;

/// Errors produced while parsing a compilation unit.
#[derive(Debug, Error)]
pub enum FrontendError {
    /// The underlying parser could not be configured.
    #[error("failed to load {language} grammar: {message}")]
    Language {
        /// Language id.
        language: &'static str,
        /// Parser error detail.
        message: String,
    },

    /// The parser gave up without producing a tree.
    #[error("parser produced no tree")]
    NoTree,
}

/// A parsed compilation unit.
pub struct ParsedUnit {
    /// Host-agnostic syntax tree.
    pub tree: SyntaxTree,
    /// Resolver for names in `tree`.
    pub resolver: Box<dyn Resolver>,
}

impl std::fmt::Debug for ParsedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedUnit")
            .field("nodes", &self.tree.len())
            .finish_non_exhaustive()
    }
}

/// Parses source files of one language.
pub trait Frontend: Send + Sync {
    /// Language identifier (e.g., `"kotlin"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this frontend handles (e.g., `&[".kt", ".kts"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Parses `source` into a tree and resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be parsed at all. Syntax errors
    /// that still yield a tree are not errors.
    fn parse(&self, source: &str) -> Result<ParsedUnit, FrontendError>;
}
