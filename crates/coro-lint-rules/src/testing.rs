//! Hand-built syntax trees for detector tests.

use std::collections::HashMap;
use std::path::Path;

use coro_lint_core::{
    Dependency, Detector, FileContext, NodeId, NodeKind, Resolver, Span, Symbol, SymbolKind,
    SyntaxTree, TreeBuilder, Violation, ViolationCollector,
};

/// Resolver answering from fixed node tables.
#[derive(Debug, Default)]
pub struct MapResolver {
    resolved: HashMap<NodeId, Symbol>,
    types: HashMap<NodeId, Symbol>,
}

impl Resolver for MapResolver {
    fn resolve(&self, _tree: &SyntaxTree, node: NodeId) -> Option<Symbol> {
        self.resolved.get(&node).cloned()
    }

    fn expression_type(&self, _tree: &SyntaxTree, node: NodeId) -> Option<Symbol> {
        self.types.get(&node).cloned()
    }
}

/// Builds a tree over `src`, locating nodes by substring.
pub struct Unit {
    builder: TreeBuilder,
    resolver: MapResolver,
}

impl Unit {
    pub fn new(src: &str) -> Self {
        Self {
            builder: TreeBuilder::new(src),
            resolver: MapResolver::default(),
        }
    }

    /// Span of the `nth` (0-based) occurrence of `needle`.
    pub fn span_nth(&self, needle: &str, nth: usize) -> Span {
        let start = self
            .builder
            .source()
            .match_indices(needle)
            .nth(nth)
            .map(|(i, _)| i)
            .unwrap_or_else(|| panic!("`{needle}` #{nth} not in source"));
        Span::new(start, start + needle.len())
    }

    pub fn span(&self, needle: &str) -> Span {
        self.span_nth(needle, 0)
    }

    pub fn ident_nth(&mut self, name: &str, nth: usize) -> NodeId {
        let span = self.span_nth(name, nth);
        self.builder.ident(name, span)
    }

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.ident_nth(name, 0)
    }

    /// Call spanning `text`; every value is wrapped in an argument node.
    pub fn call(
        &mut self,
        text: Span,
        receiver: Option<NodeId>,
        callee: NodeId,
        values: Vec<NodeId>,
        lambda: Option<NodeId>,
    ) -> NodeId {
        let args = values.into_iter().map(|v| self.arg(None, v)).collect();
        self.call_with_args(text, receiver, callee, args, lambda)
    }

    /// Call spanning `text` with prebuilt argument nodes.
    pub fn call_with_args(
        &mut self,
        text: Span,
        receiver: Option<NodeId>,
        callee: NodeId,
        args: Vec<NodeId>,
        lambda: Option<NodeId>,
    ) -> NodeId {
        self.builder.add(
            NodeKind::Call {
                receiver,
                callee,
                args,
                lambda,
            },
            text,
            vec![],
        )
    }

    pub fn arg(&mut self, name: Option<&str>, value: NodeId) -> NodeId {
        let span = self.builder_span(value);
        self.builder.add(
            NodeKind::Argument {
                name: name.map(str::to_string),
                value,
            },
            span,
            vec![],
        )
    }

    pub fn lambda(&mut self, text: Span, children: Vec<NodeId>) -> NodeId {
        self.builder.add(NodeKind::Lambda, text, children)
    }

    pub fn plus(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        let span = self.builder_span(lhs).cover(self.builder_span(rhs));
        self.builder.add(
            NodeKind::Binary {
                op: "+".into(),
                lhs,
                rhs,
            },
            span,
            vec![],
        )
    }

    pub fn parens(&mut self, text: Span, inner: NodeId) -> NodeId {
        self.builder
            .add(NodeKind::Parenthesized { inner }, text, vec![])
    }

    pub fn navigation(&mut self, receiver: NodeId, selector: NodeId) -> NodeId {
        let span = self.builder_span(receiver).cover(self.builder_span(selector));
        self.builder
            .add(NodeKind::Navigation { receiver, selector }, span, vec![])
    }

    pub fn class(&mut self, name: &str, text: Span, children: Vec<NodeId>) -> NodeId {
        self.builder
            .add(NodeKind::ClassDecl { name: name.into() }, text, children)
    }

    pub fn resolve(&mut self, node: NodeId, symbol: Symbol) {
        self.resolver.resolved.insert(node, symbol);
    }

    pub fn typed(&mut self, node: NodeId, ty: Symbol) {
        self.resolver.types.insert(node, ty);
    }

    pub fn finish(self) -> (SyntaxTree, MapResolver) {
        (self.builder.finish_with_root("file"), self.resolver)
    }

    fn builder_span(&self, node: NodeId) -> Span {
        self.builder.span_of(node)
    }
}

/// Runs one detector over every applicable node, in pre-order.
pub fn run(
    detector: &dyn Detector,
    tree: &SyntaxTree,
    resolver: &MapResolver,
    deps: &[Dependency],
) -> Vec<Violation> {
    let ctx = FileContext::new(Path::new("Test.kt"), Path::new(""), tree, resolver, deps);
    let mut collector = ViolationCollector::new(&ctx);
    for node in tree.preorder(tree.root()) {
        if detector.applicable_kinds().contains(&tree.kind(node).tag()) {
            collector.begin(node, None);
            detector.visit(&ctx, node, &mut collector);
        }
    }
    collector.into_violations()
}

/// Source text after applying the fix of `violation`.
pub fn fixed(src: &str, violation: &Violation) -> String {
    violation
        .fix
        .as_ref()
        .expect("violation has no fix")
        .apply(src)
        .expect("fix does not apply")
}

pub fn function(qn: &str) -> Symbol {
    Symbol::new(qn, SymbolKind::Function)
}

pub fn class(qn: &str) -> Symbol {
    Symbol::new(qn, SymbolKind::Class)
}

pub fn object(qn: &str) -> Symbol {
    Symbol::new(qn, SymbolKind::Object)
}

pub fn job_type() -> Symbol {
    Symbol::new("kotlinx.coroutines.Job", SymbolKind::Interface)
}

pub fn completable_job_type() -> Symbol {
    Symbol::new("kotlinx.coroutines.CompletableJob", SymbolKind::Interface)
        .with_supertypes(vec![job_type()])
}

pub fn view_model() -> Symbol {
    class("androidx.lifecycle.ViewModel")
}

pub fn fragment() -> Symbol {
    class("androidx.fragment.app.Fragment")
}

pub fn launch() -> Symbol {
    function("kotlinx.coroutines.launch")
}
