//! Text-edit fixes attached to diagnostics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::syntax::Span;

/// Replace the bytes in `span` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Range of the original source to replace.
    pub span: Span,
    /// Replacement text.
    pub replacement: String,
}

impl Edit {
    /// Creates an edit.
    #[must_use]
    pub fn new(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }
}

/// Errors when validating or applying a [`Fix`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixError {
    /// An edit reaches past the end of the source.
    #[error("edit {start}..{end} is outside the source ({len} bytes)")]
    OutOfBounds {
        /// Edit start.
        start: usize,
        /// Edit end.
        end: usize,
        /// Source length.
        len: usize,
    },

    /// An edit boundary splits a UTF-8 character.
    #[error("edit {start}..{end} does not fall on character boundaries")]
    NotCharBoundary {
        /// Edit start.
        start: usize,
        /// Edit end.
        end: usize,
    },

    /// Two edits touch the same bytes or insert at the same position.
    #[error("edits at {first:?} and {second:?} overlap")]
    Overlap {
        /// Earlier edit span.
        first: Span,
        /// Later edit span.
        second: Span,
    },
}

/// A named, ordered list of non-overlapping edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    /// Human-readable name, e.g. "Replace with viewModelScope".
    pub name: String,
    /// Edits against the original source.
    pub edits: Vec<Edit>,
}

impl Fix {
    /// Creates a fix with no edits.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            edits: Vec::new(),
        }
    }

    /// Creates a single-edit fix.
    #[must_use]
    pub fn replace(name: impl Into<String>, span: Span, replacement: impl Into<String>) -> Self {
        Self::new(name).with_edit(Edit::new(span, replacement))
    }

    /// Appends an edit.
    #[must_use]
    pub fn with_edit(mut self, edit: Edit) -> Self {
        self.edits.push(edit);
        self
    }

    /// Smallest span covering every edit.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        self.edits.iter().map(|e| e.span).reduce(Span::cover)
    }

    /// Checks the edits against `source`.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range, non-boundary or overlapping edit.
    pub fn validate(&self, source: &str) -> Result<(), FixError> {
        for edit in &self.edits {
            check_bounds(edit.span, source)?;
        }
        check_disjoint(&sorted_spans(&self.edits))
    }

    /// Applies all edits to `source` at once.
    ///
    /// # Errors
    ///
    /// Returns an error without applying anything if validation fails.
    pub fn apply(&self, source: &str) -> Result<String, FixError> {
        self.validate(source)?;
        Ok(splice(source, &self.edits))
    }
}

fn check_bounds(span: Span, source: &str) -> Result<(), FixError> {
    if span.start > span.end || span.end > source.len() {
        return Err(FixError::OutOfBounds {
            start: span.start,
            end: span.end,
            len: source.len(),
        });
    }
    if !source.is_char_boundary(span.start) || !source.is_char_boundary(span.end) {
        return Err(FixError::NotCharBoundary {
            start: span.start,
            end: span.end,
        });
    }
    Ok(())
}

fn sorted_spans(edits: &[Edit]) -> Vec<Span> {
    let mut spans: Vec<Span> = edits.iter().map(|e| e.span).collect();
    spans.sort_by_key(|s| (s.start, s.end));
    spans
}

fn conflicts(a: Span, b: Span) -> bool {
    a.overlaps(b) || a.start == b.start
}

fn check_disjoint(sorted: &[Span]) -> Result<(), FixError> {
    for pair in sorted.windows(2) {
        if conflicts(pair[0], pair[1]) {
            return Err(FixError::Overlap {
                first: pair[0],
                second: pair[1],
            });
        }
    }
    Ok(())
}

fn splice(source: &str, edits: &[Edit]) -> String {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by_key(|e| (e.span.start, e.span.end));

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in ordered {
        out.push_str(&source[cursor..edit.span.start]);
        out.push_str(&edit.replacement);
        cursor = edit.span.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Result of applying a batch of fixes to one source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    /// Source with all accepted fixes applied.
    pub text: String,
    /// Indices (into the input order) of fixes that were applied.
    pub applied: Vec<usize>,
    /// Indices of fixes that were skipped, with the reason.
    pub skipped: Vec<(usize, FixError)>,
}

/// Applies as many fixes as possible, in order.
///
/// A fix is skipped as a whole if it is invalid on its own or if any of its
/// edits conflicts with an edit of an already accepted fix.
#[must_use]
pub fn apply_fixes<'a, I>(source: &str, fixes: I) -> FixOutcome
where
    I: IntoIterator<Item = &'a Fix>,
{
    let mut accepted: Vec<Edit> = Vec::new();
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for (index, fix) in fixes.into_iter().enumerate() {
        if let Err(e) = fix.validate(source) {
            skipped.push((index, e));
            continue;
        }
        let clash = fix.edits.iter().find_map(|edit| {
            accepted
                .iter()
                .find(|prior| conflicts(prior.span, edit.span))
                .map(|prior| FixError::Overlap {
                    first: prior.span,
                    second: edit.span,
                })
        });
        match clash {
            Some(e) => skipped.push((index, e)),
            None => {
                accepted.extend(fix.edits.iter().cloned());
                applied.push(index);
            }
        }
    }

    FixOutcome {
        text: splice(source, &accepted),
        applied,
        skipped,
    }
}
