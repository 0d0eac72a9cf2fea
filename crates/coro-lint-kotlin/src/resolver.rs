//! Import-based name and type resolution for one Kotlin file.
//!
//! There is no classpath: names resolve through explicit imports, the file's
//! own declarations, star imports and the table in [`crate::known`], in that
//! order. Anything else stays unresolved.

use coro_lint_core::{NodeId, NodeKind, Resolver, Symbol, SymbolKind, SyntaxTree};

use crate::facts::{ClassFacts, FileFacts, VariableFacts};
use crate::known;

/// Bound on nested lookups (supertype chains, `val a = b` chains).
const MAX_DEPTH: usize = 8;

const COROUTINE_CONTEXT: &str = "kotlin.coroutines.CoroutineContext";

/// Position a name is used in, which decides between same-named declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Want {
    Callable,
    Value,
    Type,
}

/// [`Resolver`] backed by the facts of one lowered file.
#[derive(Debug, Clone, Default)]
pub struct KotlinResolver {
    facts: FileFacts,
}

impl KotlinResolver {
    /// Creates a resolver for a file.
    #[must_use]
    pub fn new(facts: FileFacts) -> Self {
        Self { facts }
    }

    /// Declaration facts of the file.
    #[must_use]
    pub fn facts(&self) -> &FileFacts {
        &self.facts
    }

    fn resolve_name(&self, name: &str, want: Want, depth: usize) -> Option<Symbol> {
        if depth > MAX_DEPTH {
            return None;
        }
        if let Some(import) = self
            .facts
            .imports
            .iter()
            .find(|i| i.visible_name() == Some(name))
        {
            return Some(
                self.lookup_qualified(&import.path, want, depth)
                    .unwrap_or_else(|| guess(&import.path, want)),
            );
        }
        if let Some(class) = self.facts.class_named(name) {
            return Some(self.local_class(class, depth));
        }
        if want == Want::Callable && self.facts.functions.contains_key(name) {
            return Some(Symbol::new(self.facts.qualify(name), SymbolKind::Function));
        }
        self.facts
            .imports
            .iter()
            .filter(|i| i.star)
            .find_map(|i| self.lookup_qualified(&format!("{}.{name}", i.path), want, depth))
    }

    fn lookup_qualified(&self, qualified_name: &str, want: Want, depth: usize) -> Option<Symbol> {
        let found = match want {
            Want::Callable => known::lookup(qualified_name)
                .find(|k| k.kind == SymbolKind::Function)
                .or_else(|| known::lookup_type(qualified_name)),
            Want::Value => known::lookup(qualified_name).find(|k| k.kind != SymbolKind::Function),
            Want::Type => known::lookup_type(qualified_name),
        };
        if let Some(known) = found {
            return Some(known.to_symbol());
        }
        self.facts
            .classes
            .values()
            .find(|c| self.facts.qualify(&c.name) == qualified_name)
            .map(|c| self.local_class(c, depth))
    }

    fn local_class(&self, class: &ClassFacts, depth: usize) -> Symbol {
        let kind = if class.is_object {
            SymbolKind::Object
        } else {
            SymbolKind::Class
        };
        let supertypes = class
            .supertypes
            .iter()
            .map(|s| {
                self.resolve_type(s, depth + 1)
                    .unwrap_or_else(|| guess(s, Want::Type))
            })
            .collect();
        Symbol::new(self.facts.qualify(&class.name), kind).with_supertypes(supertypes)
    }

    fn resolve_type(&self, name: &str, depth: usize) -> Option<Symbol> {
        if depth > MAX_DEPTH {
            return None;
        }
        if name.contains('.') {
            self.lookup_qualified(name, Want::Type, depth)
        } else {
            self.resolve_name(name, Want::Type, depth)
        }
    }

    fn resolve_call(&self, tree: &SyntaxTree, call: NodeId, depth: usize) -> Option<Symbol> {
        let NodeKind::Call {
            receiver, callee, ..
        } = tree.kind(call)
        else {
            return None;
        };
        let name = tree.identifier_name(*callee)?;
        if let Some(path) = receiver.and_then(|r| dotted_path(tree, r)) {
            let qualified = format!("{path}.{name}");
            if let Some(symbol) = self.lookup_qualified(&qualified, Want::Callable, depth) {
                return Some(symbol);
            }
        }
        self.resolve_name(name, Want::Callable, depth)
    }

    fn resolve_navigation(&self, tree: &SyntaxTree, nav: NodeId, depth: usize) -> Option<Symbol> {
        if depth > MAX_DEPTH {
            return None;
        }
        let NodeKind::Navigation { receiver, selector } = tree.kind(nav) else {
            return None;
        };
        let name = tree.identifier_name(*selector)?;
        if let Some(path) = dotted_path(tree, nav) {
            if let Some(symbol) = self.lookup_qualified(&path, Want::Value, depth) {
                return Some(symbol);
            }
        }
        let owner = match tree.kind(*receiver) {
            NodeKind::Identifier { name } => self.resolve_name(name, Want::Value, depth + 1),
            NodeKind::Navigation { .. } => self.resolve_navigation(tree, *receiver, depth + 1),
            _ => None,
        }?;
        if !owner.is_type() {
            return None;
        }
        self.lookup_qualified(&format!("{}.{name}", owner.qualified_name), Want::Value, depth)
    }

    fn type_of(&self, tree: &SyntaxTree, node: NodeId, depth: usize) -> Option<Symbol> {
        if depth > MAX_DEPTH {
            return None;
        }
        let node = tree.strip_parens(tree.argument_value(node));
        match tree.kind(node) {
            NodeKind::Identifier { name } => {
                if let Some(var) = self.facts.variable_at(name, tree.span(node).start) {
                    return self.variable_type(tree, var, depth);
                }
                let symbol = self.resolve_name(name, Want::Value, depth)?;
                self.value_type(&symbol, depth)
            }
            NodeKind::Call { .. } => {
                let symbol = self.resolve_call(tree, node, depth)?;
                self.value_type(&symbol, depth)
            }
            NodeKind::Navigation { selector, .. } => {
                if let Some(symbol) = self.resolve_navigation(tree, node, depth) {
                    return self.value_type(&symbol, depth);
                }
                let name = tree.identifier_name(*selector)?;
                let var = self.facts.variable_at(name, tree.span(node).start)?;
                self.variable_type(tree, var, depth)
            }
            NodeKind::Binary { op, .. } if op == "+" => {
                known::lookup_type(COROUTINE_CONTEXT).map(known::KnownSymbol::to_symbol)
            }
            _ => None,
        }
    }

    fn variable_type(&self, tree: &SyntaxTree, var: &VariableFacts, depth: usize) -> Option<Symbol> {
        if let Some(declared) = &var.declared_type {
            return self.resolve_type(declared, depth + 1);
        }
        self.type_of(tree, var.initializer?, depth + 1)
    }

    /// Type of the value a resolved declaration evaluates to.
    fn value_type(&self, symbol: &Symbol, depth: usize) -> Option<Symbol> {
        if symbol.is_type() {
            return Some(symbol.clone());
        }
        if let Some(known) = known::lookup(&symbol.qualified_name).find(|k| k.kind == symbol.kind) {
            return known.value_symbol();
        }
        if symbol.kind == SymbolKind::Function {
            let name = symbol.simple_name();
            if symbol.qualified_name == self.facts.qualify(name) {
                let declared = self.facts.functions.get(name)?.as_deref()?;
                return self.resolve_type(declared, depth + 1);
            }
        }
        None
    }
}

impl Resolver for KotlinResolver {
    fn resolve(&self, tree: &SyntaxTree, node: NodeId) -> Option<Symbol> {
        match tree.kind(node) {
            NodeKind::Identifier { name } => {
                let parent = tree.parent(node);
                match parent.map(|p| (p, tree.kind(p))) {
                    Some((p, NodeKind::Navigation { selector, .. })) if *selector == node => {
                        self.resolve_navigation(tree, p, 0)
                    }
                    Some((p, NodeKind::Call { callee, .. })) if *callee == node => {
                        self.resolve_call(tree, p, 0)
                    }
                    _ => self.resolve_name(name, Want::Value, 0),
                }
            }
            NodeKind::Call { .. } => self.resolve_call(tree, node, 0),
            NodeKind::Navigation { .. } => self.resolve_navigation(tree, node, 0),
            NodeKind::ClassDecl { .. } => self
                .facts
                .classes
                .get(&node)
                .map(|class| self.local_class(class, 0)),
            _ => None,
        }
    }

    fn expression_type(&self, tree: &SyntaxTree, node: NodeId) -> Option<Symbol> {
        self.type_of(tree, node, 0)
    }
}

/// `a.b.c` for a chain of plain identifiers.
fn dotted_path(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    match tree.kind(node) {
        NodeKind::Identifier { name } => Some(name.clone()),
        NodeKind::Navigation { receiver, selector } => {
            let head = dotted_path(tree, *receiver)?;
            let tail = tree.identifier_name(*selector)?;
            Some(format!("{head}.{tail}"))
        }
        _ => None,
    }
}

/// Best guess for an imported name missing from the known table.
fn guess(qualified_name: &str, want: Want) -> Symbol {
    let simple = qualified_name
        .rsplit('.')
        .next()
        .unwrap_or(qualified_name);
    let upper = simple.chars().next().is_some_and(char::is_uppercase);
    let kind = match (want, upper) {
        (Want::Type, _) | (Want::Callable, true) => SymbolKind::Class,
        (Want::Callable, false) => SymbolKind::Function,
        (Want::Value, true) => SymbolKind::Object,
        (Want::Value, false) => SymbolKind::Property,
    };
    Symbol::new(qualified_name, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KotlinFrontend;
    use coro_lint_core::KindTag;

    const JOB: &str = "kotlinx.coroutines.Job";

    fn parse(src: &str) -> (SyntaxTree, KotlinResolver) {
        let (tree, facts) = KotlinFrontend::new().lower(src).unwrap();
        (tree, KotlinResolver::new(facts))
    }

    /// Innermost node of `tag` whose text is exactly `text`.
    fn find(tree: &SyntaxTree, tag: KindTag, text: &str) -> NodeId {
        tree.preorder(tree.root())
            .filter(|&n| tree.kind(n).tag() == tag && tree.text(n) == text)
            .last()
            .unwrap_or_else(|| panic!("no {tag:?} `{text}`"))
    }

    #[test]
    fn explicit_import_resolves_global_scope() {
        let (tree, r) = parse(
            "import kotlinx.coroutines.GlobalScope\nfun f() {\n    GlobalScope.launch { }\n}\n",
        );
        let id = find(&tree, KindTag::Identifier, "GlobalScope");
        let symbol = r.resolve(&tree, id).unwrap();
        assert_eq!(symbol.qualified_name, "kotlinx.coroutines.GlobalScope");
        assert_eq!(symbol.kind, SymbolKind::Object);
    }

    #[test]
    fn unimported_name_stays_unresolved() {
        let (tree, r) = parse("fun f() {\n    GlobalScope.launch { }\n}\n");
        let id = find(&tree, KindTag::Identifier, "GlobalScope");
        assert!(r.resolve(&tree, id).is_none());
    }

    #[test]
    fn star_import_resolves_builder_call() {
        let (tree, r) = parse("import kotlinx.coroutines.*\nfun f() {\n    scope.launch { }\n}\n");
        let call = find(&tree, KindTag::Call, "scope.launch { }");
        let symbol = r.resolve(&tree, call).unwrap();
        assert_eq!(symbol.qualified_name, "kotlinx.coroutines.launch");
        assert_eq!(symbol.kind, SymbolKind::Function);
    }

    #[test]
    fn alias_import_resolves() {
        let (tree, r) = parse(
            "import kotlinx.coroutines.NonCancellable as NC\nfun f() {\n    launch(NC) { }\n}\n",
        );
        let id = find(&tree, KindTag::Identifier, "NC");
        let symbol = r.resolve(&tree, id).unwrap();
        assert_eq!(symbol.qualified_name, "kotlinx.coroutines.NonCancellable");
    }

    #[test]
    fn fully_qualified_reference_resolves() {
        let (tree, r) = parse("fun f() {\n    launch(kotlinx.coroutines.NonCancellable) { }\n}\n");
        let nav = find(&tree, KindTag::Navigation, "kotlinx.coroutines.NonCancellable");
        let symbol = r.resolve(&tree, nav).unwrap();
        assert_eq!(symbol.qualified_name, "kotlinx.coroutines.NonCancellable");
    }

    #[test]
    fn job_constructors_have_job_type() {
        let (tree, r) = parse(
            "import kotlinx.coroutines.*\nfun f() {\n    launch(SupervisorJob()) { }\n    launch(Job()) { }\n}\n",
        );
        for text in ["SupervisorJob()", "Job()"] {
            let call = find(&tree, KindTag::Call, text);
            let ty = r.expression_type(&tree, call).unwrap();
            assert!(ty.is_subtype_of(JOB), "{text}");
        }
        let call = find(&tree, KindTag::Call, "Job()");
        assert_eq!(r.resolve(&tree, call).unwrap().kind, SymbolKind::Function);
    }

    #[test]
    fn variables_carry_declared_and_inferred_types() {
        let (tree, r) = parse(
            "import kotlinx.coroutines.*\n\
             class Worker(private val parent: Job) {\n    \
                 val child = SupervisorJob()\n    \
                 fun f(name: String) {\n        \
                     launch(parent) { }\n        \
                     launch(child) { }\n        \
                     launch(name) { }\n    \
                 }\n\
             }\n",
        );
        for name in ["parent", "child"] {
            let id = find(&tree, KindTag::Identifier, name);
            let ty = r.expression_type(&tree, id).unwrap();
            assert!(ty.is_subtype_of(JOB), "{name}");
        }
        let id = find(&tree, KindTag::Identifier, "name");
        assert!(r.expression_type(&tree, id).is_none());
    }

    #[test]
    fn dispatcher_and_non_cancellable_are_not_jobs() {
        let (tree, r) = parse(
            "import kotlinx.coroutines.*\nfun f() {\n    launch(Dispatchers.IO) { }\n    launch(NonCancellable) { }\n}\n",
        );
        let io = find(&tree, KindTag::Navigation, "Dispatchers.IO");
        let ty = r.expression_type(&tree, io).unwrap();
        assert_eq!(ty.qualified_name, "kotlinx.coroutines.CoroutineDispatcher");
        assert!(!ty.is_subtype_of(JOB));

        let nc = find(&tree, KindTag::Identifier, "NonCancellable");
        let ty = r.expression_type(&tree, nc).unwrap();
        assert!(!ty.is_subtype_of(JOB));
    }

    #[test]
    fn local_function_return_type() {
        let (tree, r) = parse(
            "import kotlinx.coroutines.Job\nfun parent(): Job = TODO()\nfun f() {\n    launch(parent()) { }\n}\n",
        );
        let call = find(&tree, KindTag::Call, "parent()");
        let ty = r.expression_type(&tree, call).unwrap();
        assert_eq!(ty.qualified_name, JOB);
    }

    #[test]
    fn class_supertypes_follow_local_bases() {
        let (tree, r) = parse(
            "package app\nimport androidx.lifecycle.ViewModel\n\
             open class BaseViewModel : ViewModel()\n\
             class MainViewModel : BaseViewModel() {\n}\n",
        );
        let classes: Vec<_> = tree
            .preorder(tree.root())
            .filter(|&n| tree.kind(n).tag() == KindTag::ClassDecl)
            .collect();
        assert_eq!(classes.len(), 2);

        let base = r.resolve(&tree, classes[0]).unwrap();
        assert_eq!(base.qualified_name, "app.BaseViewModel");
        let direct: Vec<_> = r
            .supertypes(&tree, classes[0])
            .into_iter()
            .map(|s| s.qualified_name)
            .collect();
        assert_eq!(direct, vec!["androidx.lifecycle.ViewModel"]);

        let main = r.resolve(&tree, classes[1]).unwrap();
        assert_eq!(main.supertypes[0].qualified_name, "app.BaseViewModel");
        assert!(main.is_subtype_of("androidx.lifecycle.ViewModel"));
    }

    #[test]
    fn cyclic_supertypes_terminate() {
        let (tree, r) = parse("class A : B()\nclass B : A()\n");
        let class = tree
            .preorder(tree.root())
            .find(|&n| tree.kind(n).tag() == KindTag::ClassDecl)
            .unwrap();
        assert!(r.resolve(&tree, class).is_some());
    }

    #[test]
    fn plus_expression_is_a_coroutine_context() {
        let (tree, r) = parse(
            "import kotlinx.coroutines.*\nfun f() {\n    launch(Job() + Dispatchers.IO) { }\n}\n",
        );
        let plus = find(&tree, KindTag::Binary, "Job() + Dispatchers.IO");
        let ty = r.expression_type(&tree, plus).unwrap();
        assert_eq!(ty.qualified_name, COROUTINE_CONTEXT);
    }
}
