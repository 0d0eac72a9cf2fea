//! Host-agnostic syntax model.
//!
//! A [`SyntaxTree`] is an arena of [`SyntaxNode`]s built once per compilation
//! unit by a frontend and then only read. Detectors address nodes by
//! [`NodeId`] and never mutate the tree.

use serde::{Deserialize, Serialize};

/// Byte range in the source text, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl Span {
    /// Creates a span. `start` must not exceed `end`.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} after end {end}");
        Self { start, end }
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        self.end - self.start
    }

    /// Returns true for a zero-width span.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Returns true if `other` lies entirely within this span.
    #[must_use]
    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true if the two spans share at least one byte.
    #[must_use]
    pub fn overlaps(self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Smallest span covering both.
    #[must_use]
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Structural kind of a node.
///
/// Node references inside a kind always point at children of the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A simple name reference, e.g. `GlobalScope`.
    Identifier {
        /// Referenced name as written.
        name: String,
    },
    /// Member access that is not a call, e.g. `Dispatchers.IO`.
    Navigation {
        /// Expression left of the dot.
        receiver: NodeId,
        /// Selected member identifier.
        selector: NodeId,
    },
    /// A call, e.g. `scope.launch(ctx) { ... }`.
    Call {
        /// Explicit receiver, if the call is qualified.
        receiver: Option<NodeId>,
        /// Identifier naming the called function.
        callee: NodeId,
        /// Value arguments in source order ([`NodeKind::Argument`] nodes).
        args: Vec<NodeId>,
        /// Trailing lambda, if any.
        lambda: Option<NodeId>,
    },
    /// A lambda literal or block body.
    Lambda,
    /// A binary expression such as `a + b`.
    Binary {
        /// Operator token text.
        op: String,
        /// Left operand.
        lhs: NodeId,
        /// Right operand.
        rhs: NodeId,
    },
    /// `( inner )`.
    Parenthesized {
        /// Wrapped expression.
        inner: NodeId,
    },
    /// A class or object declaration.
    ClassDecl {
        /// Declared simple name.
        name: String,
    },
    /// A value argument, optionally named (`context = ...`).
    Argument {
        /// Parameter name for named arguments.
        name: Option<String>,
        /// Argument expression.
        value: NodeId,
    },
    /// Any other construct; only its children matter to detectors.
    Other {
        /// Frontend-specific kind name, kept for debugging.
        kind: String,
    },
}

/// Field-less mirror of [`NodeKind`], used for detector dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindTag {
    /// [`NodeKind::Identifier`]
    Identifier,
    /// [`NodeKind::Navigation`]
    Navigation,
    /// [`NodeKind::Call`]
    Call,
    /// [`NodeKind::Lambda`]
    Lambda,
    /// [`NodeKind::Binary`]
    Binary,
    /// [`NodeKind::Parenthesized`]
    Parenthesized,
    /// [`NodeKind::ClassDecl`]
    ClassDecl,
    /// [`NodeKind::Argument`]
    Argument,
    /// [`NodeKind::Other`]
    Other,
}

impl NodeKind {
    /// Returns the dispatch tag for this kind.
    #[must_use]
    pub fn tag(&self) -> KindTag {
        match self {
            Self::Identifier { .. } => KindTag::Identifier,
            Self::Navigation { .. } => KindTag::Navigation,
            Self::Call { .. } => KindTag::Call,
            Self::Lambda => KindTag::Lambda,
            Self::Binary { .. } => KindTag::Binary,
            Self::Parenthesized { .. } => KindTag::Parenthesized,
            Self::ClassDecl { .. } => KindTag::ClassDecl,
            Self::Argument { .. } => KindTag::Argument,
            Self::Other { .. } => KindTag::Other,
        }
    }

    fn structural_children(&self) -> Vec<NodeId> {
        match self {
            Self::Navigation { receiver, selector } => vec![*receiver, *selector],
            Self::Call {
                receiver,
                callee,
                args,
                lambda,
            } => receiver
                .iter()
                .copied()
                .chain(std::iter::once(*callee))
                .chain(args.iter().copied())
                .chain(lambda.iter().copied())
                .collect(),
            Self::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Self::Parenthesized { inner } => vec![*inner],
            Self::Argument { value, .. } => vec![*value],
            Self::Identifier { .. } | Self::Lambda | Self::ClassDecl { .. } | Self::Other { .. } => {
                Vec::new()
            }
        }
    }
}

/// A node in the parsed source.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    /// Structural kind.
    pub kind: NodeKind,
    /// Source range covered by the node.
    pub span: Span,
    /// Enclosing node, `None` for the root.
    pub parent: Option<NodeId>,
    /// Children in source order.
    pub children: Vec<NodeId>,
}

/// An immutable syntax tree for one compilation unit.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<SyntaxNode>,
    root: NodeId,
}

impl SyntaxTree {
    /// Full source text of the unit.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes besides an empty root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was produced by a different tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.0]
    }

    /// Kind of `id`.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Span of `id`.
    #[must_use]
    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    /// Source text covered by `id`.
    #[must_use]
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.span(id);
        self.source.get(span.start..span.end).unwrap_or("")
    }

    /// Parent of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children of `id` in source order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Strict ancestors of `id`, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Innermost class or object declaration enclosing `id`.
    #[must_use]
    pub fn enclosing_class(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&n| matches!(self.kind(n), NodeKind::ClassDecl { .. }))
    }

    /// Identifier name of `id`, if it is an identifier.
    #[must_use]
    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Unwraps an [`NodeKind::Argument`] to its value expression.
    #[must_use]
    pub fn argument_value(&self, id: NodeId) -> NodeId {
        match self.kind(id) {
            NodeKind::Argument { value, .. } => *value,
            _ => id,
        }
    }

    /// Strips any number of enclosing parentheses.
    #[must_use]
    pub fn strip_parens(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Parenthesized { inner } = self.kind(id) {
            id = *inner;
        }
        id
    }

    /// Depth-first pre-order walk of the subtree rooted at `id`, including `id`.
    pub fn preorder(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.preorder_pruned(id, |_| false)
    }

    /// Pre-order walk that yields, but does not descend into, nodes for which
    /// `prune` returns true. The starting node is always descended into.
    pub fn preorder_pruned<'a, F>(&'a self, id: NodeId, prune: F) -> impl Iterator<Item = NodeId> + 'a
    where
        F: Fn(NodeId) -> bool + 'a,
    {
        Preorder {
            tree: self,
            start: id,
            stack: vec![id],
            prune,
        }
    }
}

struct Preorder<'a, F> {
    tree: &'a SyntaxTree,
    start: NodeId,
    stack: Vec<NodeId>,
    prune: F,
}

impl<F> Iterator for Preorder<'_, F>
where
    F: Fn(NodeId) -> bool,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if id == self.start || !(self.prune)(id) {
            self.stack
                .extend(self.tree.children(id).iter().rev().copied());
        }
        Some(id)
    }
}

/// Incremental, bottom-up constructor for a [`SyntaxTree`].
///
/// Children must be added before their parent. Node references carried by a
/// [`NodeKind`] are attached as children automatically.
#[derive(Debug)]
pub struct TreeBuilder {
    source: String,
    nodes: Vec<SyntaxNode>,
}

impl TreeBuilder {
    /// Starts a tree over `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            nodes: Vec::new(),
        }
    }

    /// Source text the tree is being built over.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Span of an already added node.
    #[must_use]
    pub fn span_of(&self, id: NodeId) -> Span {
        self.nodes[id.0].span
    }

    /// Adds a node with the given extra `children` and returns its id.
    pub fn add(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut all = kind.structural_children();
        for child in children {
            if !all.contains(&child) {
                all.push(child);
            }
        }
        all.sort_by_key(|c| (self.nodes[c.0].span.start, c.0));
        for child in &all {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes.push(SyntaxNode {
            kind,
            span,
            parent: None,
            children: all,
        });
        id
    }

    /// Adds an identifier node.
    pub fn ident(&mut self, name: impl Into<String>, span: Span) -> NodeId {
        self.add(NodeKind::Identifier { name: name.into() }, span, Vec::new())
    }

    /// Finishes the tree with `root` as its root node.
    #[must_use]
    pub fn finish(mut self, root: NodeId) -> SyntaxTree {
        if let Some(node) = self.nodes.get_mut(root.0) {
            node.parent = None;
        }
        SyntaxTree {
            source: self.source,
            nodes: self.nodes,
            root,
        }
    }

    /// Finishes the tree under a synthetic root spanning the whole source and
    /// adopting every node that has no parent yet.
    #[must_use]
    pub fn finish_with_root(mut self, kind: impl Into<String>) -> SyntaxTree {
        let orphans: Vec<NodeId> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| NodeId(i))
            .collect();
        let span = Span::new(0, self.source.len());
        let root = self.add(NodeKind::Other { kind: kind.into() }, span, orphans);
        self.finish(root)
    }
}
