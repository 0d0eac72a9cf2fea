//! Kotlin `@Suppress` annotation handling.

use crate::syntax::{NodeId, NodeKind, SyntaxTree};

/// Annotation names that suppress lint issues by id.
const SUPPRESS_ANNOTATIONS: &[&str] = &["@Suppress(", "@SuppressLint(", "@file:Suppress("];

/// Returns true if `header` (declaration text before its body) carries a
/// suppress annotation naming `issue_id` or `all`.
#[must_use]
pub fn has_suppress_annotation(header: &str, issue_id: &str) -> bool {
    SUPPRESS_ANNOTATIONS.iter().any(|marker| {
        header.match_indices(marker).any(|(at, m)| {
            let args = &header[at + m.len()..];
            let args = args.find(')').map_or(args, |end| &args[..end]);
            args.split(',')
                .map(|a| a.trim().trim_matches('"'))
                .any(|a| a.eq_ignore_ascii_case(issue_id) || a == "all")
        })
    })
}

/// Returns true if any declaration enclosing `node`, or the file header,
/// suppresses `issue_id`.
#[must_use]
pub fn is_suppressed_by_annotation(tree: &SyntaxTree, node: NodeId, issue_id: &str) -> bool {
    let in_class = tree
        .ancestors(node)
        .filter(|&n| matches!(tree.kind(n), NodeKind::ClassDecl { .. }))
        .any(|class| has_suppress_annotation(declaration_header(tree.text(class)), issue_id));
    in_class || file_suppresses(tree.source(), issue_id)
}

fn declaration_header(text: &str) -> &str {
    text.find('{').map_or(text, |body| &text[..body])
}

fn file_suppresses(source: &str, issue_id: &str) -> bool {
    source
        .lines()
        .map(str::trim_start)
        .take_while(|l| !l.starts_with("package ") && !l.starts_with("import "))
        .filter(|l| l.starts_with("@file:"))
        .any(|l| has_suppress_annotation(l, issue_id))
}
