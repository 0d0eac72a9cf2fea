//! Coroutine context expressions built with the `+` combinator.
//!
//! `Dispatchers.IO + SupervisorJob() + handler` parses as a left-nested tree
//! of binary nodes. [`CombinatorChain`] flattens that tree into its operand
//! list so operands can be removed structurally and the rest re-serialized.

use coro_lint_core::{NodeId, NodeKind, Span, SyntaxTree};

/// Context combine operator.
pub const PLUS: &str = "+";

/// Operands of a same-operator binary expression, in source order.
///
/// A parenthesized group counts as a single operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinatorChain {
    op: String,
    span: Span,
    operands: Vec<NodeId>,
}

impl CombinatorChain {
    /// Builds the `+` chain rooted at `node`.
    ///
    /// Returns `None` unless `node` is a `+` binary expression.
    #[must_use]
    pub fn from_node(tree: &SyntaxTree, node: NodeId) -> Option<Self> {
        Self::with_operator(tree, node, PLUS)
    }

    /// Builds the chain of `op` rooted at `node`.
    #[must_use]
    pub fn with_operator(tree: &SyntaxTree, node: NodeId, op: &str) -> Option<Self> {
        match tree.kind(node) {
            NodeKind::Binary { op: found, .. } if found == op => {}
            _ => return None,
        }
        let mut operands = Vec::new();
        flatten(tree, node, op, &mut operands);
        Some(Self {
            op: op.to_string(),
            span: tree.span(node),
            operands,
        })
    }

    /// Operator joining the operands.
    #[must_use]
    pub fn op(&self) -> &str {
        &self.op
    }

    /// Span of the whole chain expression.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Operand nodes in source order.
    #[must_use]
    pub fn operands(&self) -> &[NodeId] {
        &self.operands
    }

    /// Returns the chain without operands matching `remove`.
    ///
    /// Returns `None` when nothing matched or nothing would remain.
    #[must_use]
    pub fn without<F>(&self, remove: F) -> Option<Self>
    where
        F: Fn(NodeId) -> bool,
    {
        let operands: Vec<NodeId> = self
            .operands
            .iter()
            .copied()
            .filter(|&n| !remove(n))
            .collect();
        if operands.is_empty() || operands.len() == self.operands.len() {
            return None;
        }
        Some(Self {
            op: self.op.clone(),
            span: self.span,
            operands,
        })
    }

    /// Serializes the operands joined by ` op `.
    #[must_use]
    pub fn render(&self, tree: &SyntaxTree) -> String {
        let separator = format!(" {} ", self.op);
        self.operands
            .iter()
            .map(|&n| tree.text(n).trim())
            .collect::<Vec<_>>()
            .join(&separator)
    }
}

fn flatten(tree: &SyntaxTree, node: NodeId, op: &str, out: &mut Vec<NodeId>) {
    match tree.kind(node) {
        NodeKind::Binary { op: found, lhs, rhs } if found == op => {
            flatten(tree, *lhs, op, out);
            flatten(tree, *rhs, op, out);
        }
        _ => out.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coro_lint_core::TreeBuilder;

    fn span_of(src: &str, needle: &str) -> Span {
        let start = src.find(needle).unwrap();
        Span::new(start, start + needle.len())
    }

    /// `Dispatchers.IO + SupervisorJob() + (a + b)`
    fn sample() -> (SyntaxTree, NodeId, NodeId, NodeId) {
        let src = "Dispatchers.IO + SupervisorJob() + (a + b)";
        let mut b = TreeBuilder::new(src);
        let io = b.add(
            NodeKind::Other { kind: "nav".into() },
            span_of(src, "Dispatchers.IO"),
            vec![],
        );
        let sj_callee = b.ident("SupervisorJob", span_of(src, "SupervisorJob"));
        let sj = b.add(
            NodeKind::Call {
                receiver: None,
                callee: sj_callee,
                args: vec![],
                lambda: None,
            },
            span_of(src, "SupervisorJob()"),
            vec![],
        );
        let first = b.add(
            NodeKind::Binary {
                op: PLUS.into(),
                lhs: io,
                rhs: sj,
            },
            span_of(src, "Dispatchers.IO + SupervisorJob()"),
            vec![],
        );
        let a = b.ident("a", span_of(src, "a +"));
        let bb = b.ident("b", span_of(src, "b)"));
        let inner = b.add(
            NodeKind::Binary {
                op: PLUS.into(),
                lhs: a,
                rhs: bb,
            },
            span_of(src, "a + b"),
            vec![],
        );
        let group = b.add(
            NodeKind::Parenthesized { inner },
            span_of(src, "(a + b)"),
            vec![],
        );
        let root = b.add(
            NodeKind::Binary {
                op: PLUS.into(),
                lhs: first,
                rhs: group,
            },
            Span::new(0, src.len()),
            vec![],
        );
        (b.finish(root), root, sj, group)
    }

    #[test]
    fn test_flattens_left_nested_chain() {
        let (tree, root, sj, group) = sample();
        let chain = CombinatorChain::from_node(&tree, root).unwrap();
        assert_eq!(chain.operands().len(), 3);
        assert_eq!(chain.operands()[1], sj);
        assert_eq!(chain.operands()[2], group);
        assert_eq!(chain.span(), Span::new(0, tree.source().len()));
    }

    #[test]
    fn test_remove_middle_operand() {
        let (tree, root, sj, _) = sample();
        let chain = CombinatorChain::from_node(&tree, root).unwrap();
        let rest = chain.without(|n| n == sj).unwrap();
        assert_eq!(rest.render(&tree), "Dispatchers.IO + (a + b)");
    }

    #[test]
    fn test_nothing_removed_or_nothing_left() {
        let (tree, root, _, _) = sample();
        let chain = CombinatorChain::from_node(&tree, root).unwrap();
        assert!(chain.without(|_| false).is_none());
        assert!(chain.without(|_| true).is_none());
    }

    #[test]
    fn test_not_a_chain() {
        let (tree, _, sj, _) = sample();
        assert!(CombinatorChain::from_node(&tree, sj).is_none());
    }
}
