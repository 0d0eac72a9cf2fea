//! Traversal passes over a builder call.
//!
//! Each pass walks one subtree and returns the matching nodes; callers
//! combine the results. Passes never descend into the body of a nested
//! builder call, so deeper nesting is left to that builder's own visit.

use coro_lint_core::{FileContext, KindTag, NodeId, NodeKind};

use crate::classifier::{classify_node, SymbolClass};

/// Returns true if `node` is a call to `launch` or `async`.
#[must_use]
pub fn is_builder_call(ctx: &FileContext<'_>, node: NodeId) -> bool {
    matches!(ctx.tree.kind(node), NodeKind::Call { .. })
        && matches!(classify_node(ctx, node), SymbolClass::CoroutineBuilder(_))
}

/// Nodes of the given kinds under `root` classified as `class`, skipping
/// nested builder calls.
#[must_use]
pub fn classified_nodes(
    ctx: &FileContext<'_>,
    root: NodeId,
    kinds: &[KindTag],
    class: SymbolClass,
) -> Vec<NodeId> {
    ctx.tree
        .preorder_pruned(root, |n| is_builder_call(ctx, n))
        .filter(|&n| kinds.contains(&ctx.tree.kind(n).tag()))
        .filter(|&n| classify_node(ctx, n) == class)
        .collect()
}

/// Builder calls directly nested in the trailing lambda of `call`.
///
/// A builder inside another nested builder's body is not direct.
#[must_use]
pub fn direct_nested_builders(ctx: &FileContext<'_>, call: NodeId) -> Vec<NodeId> {
    let NodeKind::Call {
        lambda: Some(body), ..
    } = ctx.tree.kind(call)
    else {
        return Vec::new();
    };
    let body = *body;
    ctx.tree
        .preorder_pruned(body, |n| is_builder_call(ctx, n))
        .filter(|&n| n != body && is_builder_call(ctx, n))
        .collect()
}

/// Context argument of a builder call: the argument named `context`, else
/// the first positional argument.
#[must_use]
pub fn context_argument(ctx: &FileContext<'_>, call: NodeId) -> Option<NodeId> {
    let NodeKind::Call { args, .. } = ctx.tree.kind(call) else {
        return None;
    };
    let named = |arg: &NodeId| {
        matches!(ctx.tree.kind(*arg), NodeKind::Argument { name: Some(name), .. } if name == "context")
    };
    let positional = |arg: &NodeId| {
        matches!(ctx.tree.kind(*arg), NodeKind::Argument { name: None, .. })
    };
    args.iter()
        .find(|a| named(*a))
        .or_else(|| args.first().filter(|a| positional(*a)))
        .map(|&arg| ctx.tree.argument_value(arg))
}

/// Value expressions of every argument passed to `call`.
#[must_use]
pub fn argument_values(ctx: &FileContext<'_>, call: NodeId) -> Vec<NodeId> {
    match ctx.tree.kind(call) {
        NodeKind::Call { args, .. } => args.iter().map(|&a| ctx.tree.argument_value(a)).collect(),
        _ => Vec::new(),
    }
}
