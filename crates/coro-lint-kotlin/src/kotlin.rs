//! Kotlin frontend using Tree-sitter.
//!
//! Lowers the concrete Tree-sitter tree into the host-agnostic
//! [`SyntaxTree`]. Only the constructs detectors care about get a dedicated
//! node kind; every other wrapper is transparent and contributes just its
//! lowered children. Declarations seen on the way are recorded as
//! [`FileFacts`] for the [`KotlinResolver`].

use coro_lint_core::{
    Frontend, FrontendError, NodeId, NodeKind, ParsedUnit, Span, SyntaxTree, TreeBuilder,
};
use tracing::trace;
use tree_sitter::{Language, Node, Parser};

use crate::facts::{normalize_type, ClassFacts, FileFacts, ImportInfo, PackageInfo, VariableFacts};
use crate::resolver::KotlinResolver;

const IDENTIFIER_KINDS: &[&str] = &["identifier", "simple_identifier", "type_identifier"];

/// Type references never contain expressions detectors look at.
const TYPE_KINDS: &[&str] = &[
    "user_type",
    "nullable_type",
    "non_nullable_type",
    "function_type",
    "parenthesized_type",
    "type_arguments",
    "type_parameters",
    "type_constraints",
    "type_reference",
    "receiver_type",
];

/// Binary operators lowered to [`NodeKind::Binary`]; others stay opaque.
const COMBINATOR_OPS: &[&str] = &["+"];

const COMMENT_KINDS: &[&str] = &["line_comment", "block_comment", "multiline_comment", "comment"];

fn is_identifier(node: &Node<'_>) -> bool {
    IDENTIFIER_KINDS.contains(&node.kind())
}

fn span(node: &Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn first_descendant<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find_map(|child| {
        if child.kind() == kind {
            Some(child)
        } else {
            first_descendant(&child, kind)
        }
    })
}

/// Parses Kotlin source (`.kt`, `.kts`).
pub struct KotlinFrontend {
    language: Language,
}

impl KotlinFrontend {
    /// Creates a new Kotlin frontend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_kotlin_ng::LANGUAGE.into(),
        }
    }

    /// Parses and lowers `source`, returning the tree and declaration facts.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar cannot be loaded or the parser gives up.
    pub fn lower(&self, source: &str) -> Result<(SyntaxTree, FileFacts), FrontendError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| FrontendError::Language {
                language: "kotlin",
                message: e.to_string(),
            })?;
        let tree = parser.parse(source, None).ok_or(FrontendError::NoTree)?;
        Ok(Lowering::new(source).run(tree.root_node()))
    }
}

impl Default for KotlinFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KotlinFrontend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KotlinFrontend").finish_non_exhaustive()
    }
}

impl Frontend for KotlinFrontend {
    fn language_id(&self) -> &'static str {
        "kotlin"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".kt", ".kts"]
    }

    fn parse(&self, source: &str) -> Result<ParsedUnit, FrontendError> {
        let (tree, facts) = self.lower(source)?;
        Ok(ParsedUnit {
            tree,
            resolver: Box::new(KotlinResolver::new(facts)),
        })
    }
}

struct Lowering<'s> {
    src: &'s str,
    builder: TreeBuilder,
    facts: FileFacts,
    scopes: Vec<Span>,
}

impl<'s> Lowering<'s> {
    fn new(src: &'s str) -> Self {
        Self {
            src,
            builder: TreeBuilder::new(src),
            facts: FileFacts::default(),
            scopes: vec![Span::new(0, src.len())],
        }
    }

    fn run(mut self, root: Node<'_>) -> (SyntaxTree, FileFacts) {
        self.lower_children(&root);
        let tree = self.builder.finish_with_root(root.kind());
        trace!("lowered {} nodes", tree.len());
        (tree, self.facts)
    }

    fn text(&self, node: &Node<'_>) -> &'s str {
        self.src.get(node.start_byte()..node.end_byte()).unwrap_or("")
    }

    fn scope(&self) -> Span {
        self.scopes
            .last()
            .copied()
            .unwrap_or_else(|| Span::new(0, self.src.len()))
    }

    /// Lowers `node`, returning zero or more nodes standing in for it.
    fn lower(&mut self, node: &Node<'_>) -> Vec<NodeId> {
        let kind = node.kind();
        if is_identifier(node) {
            return vec![self.ident(node)];
        }
        if TYPE_KINDS.contains(&kind) || COMMENT_KINDS.contains(&kind) {
            return Vec::new();
        }
        match kind {
            "package_header" => {
                self.facts.package = self.package(node);
                Vec::new()
            }
            "import" | "import_header" => {
                let line = node.start_position().row + 1;
                if let Some(import) = ImportInfo::parse(self.text(node), line) {
                    self.facts.imports.push(import);
                }
                Vec::new()
            }
            "call_expression" => match self.lower_call(node) {
                Some(id) => vec![id],
                None => self.lower_children(node),
            },
            "navigation_expression" => match self.lower_navigation(node) {
                Some(id) => vec![id],
                None => self.lower_children(node),
            },
            "binary_expression" | "additive_expression" => match self.lower_binary(node) {
                Some(id) => vec![id],
                None => self.lower_children(node),
            },
            "parenthesized_expression" => match named_children(node).first() {
                Some(inner) => {
                    let inner = self.lower_expr(inner);
                    vec![self
                        .builder
                        .add(NodeKind::Parenthesized { inner }, span(node), Vec::new())]
                }
                None => Vec::new(),
            },
            "lambda_literal" | "annotated_lambda" => vec![self.lower_lambda(node)],
            "class_declaration" | "object_declaration" => vec![self.lower_class(node)],
            "function_declaration" => self.lower_function(node),
            "property_declaration" => self.lower_property(node),
            "parameter" | "class_parameter" => self.lower_parameter(node),
            _ => self.lower_children(node),
        }
    }

    fn lower_children(&mut self, node: &Node<'_>) -> Vec<NodeId> {
        named_children(node)
            .iter()
            .flat_map(|child| self.lower(child))
            .collect()
    }

    /// Lowers an expression into exactly one node.
    fn lower_expr(&mut self, node: &Node<'_>) -> NodeId {
        let ids = self.lower(node);
        match ids.as_slice() {
            [id] if self.builder.span_of(*id) == span(node) => *id,
            _ => self.builder.add(
                NodeKind::Other {
                    kind: node.kind().to_string(),
                },
                span(node),
                ids,
            ),
        }
    }

    fn ident(&mut self, node: &Node<'_>) -> NodeId {
        let name = self.text(node);
        self.builder.ident(name, span(node))
    }

    fn package(&self, node: &Node<'_>) -> Option<PackageInfo> {
        let path = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "qualified_identifier" || c.kind() == "identifier")
            .map(|c| {
                self.text(&c)
                    .chars()
                    .filter(|ch| !ch.is_whitespace())
                    .collect::<String>()
            })?;
        Some(PackageInfo {
            line: node.start_position().row + 1,
            path,
        })
    }

    fn lower_call(&mut self, node: &Node<'_>) -> Option<NodeId> {
        let (callee_node, args_node, lambda_node) = call_parts(node)?;

        let (receiver, callee) = if is_identifier(&callee_node) {
            (None, self.ident(&callee_node))
        } else if callee_node.kind() == "navigation_expression" {
            let (receiver, selector) = split_navigation(&callee_node)?;
            let receiver = self.lower_expr(&receiver);
            (Some(receiver), self.ident(&selector))
        } else {
            return None;
        };

        let args = match args_node {
            Some(args) => self.lower_arguments(&args),
            None => Vec::new(),
        };
        let lambda = lambda_node.map(|l| self.lower_lambda(&l));
        Some(self.builder.add(
            NodeKind::Call {
                receiver,
                callee,
                args,
                lambda,
            },
            span(node),
            Vec::new(),
        ))
    }

    fn lower_arguments(&mut self, node: &Node<'_>) -> Vec<NodeId> {
        named_children(node)
            .iter()
            .filter(|c| c.kind() == "value_argument")
            .filter_map(|arg| self.lower_argument(arg))
            .collect()
    }

    fn lower_argument(&mut self, node: &Node<'_>) -> Option<NodeId> {
        let named = named_children(node);
        let value = named.last()?;
        let is_named = children(node).iter().any(|c| c.kind() == "=");
        let name = if is_named {
            named
                .iter()
                .find(|c| is_identifier(c))
                .map(|c| self.text(c).to_string())
        } else {
            None
        };
        let value = self.lower_expr(value);
        Some(
            self.builder
                .add(NodeKind::Argument { name, value }, span(node), Vec::new()),
        )
    }

    fn lower_navigation(&mut self, node: &Node<'_>) -> Option<NodeId> {
        let (receiver, selector) = split_navigation(node)?;
        let receiver = self.lower_expr(&receiver);
        let selector = self.ident(&selector);
        Some(self.builder.add(
            NodeKind::Navigation { receiver, selector },
            span(node),
            Vec::new(),
        ))
    }

    fn lower_binary(&mut self, node: &Node<'_>) -> Option<NodeId> {
        let op = children(node)
            .iter()
            .find(|c| !c.is_named())
            .map(|c| self.text(c).trim().to_string())?;
        if !COMBINATOR_OPS.contains(&op.as_str()) {
            return None;
        }
        let (lhs, rhs) = match (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) {
            (Some(lhs), Some(rhs)) => (lhs, rhs),
            _ => {
                let named: Vec<_> = named_children(node)
                    .into_iter()
                    .filter(|c| !COMMENT_KINDS.contains(&c.kind()))
                    .collect();
                let [lhs, rhs] = named.as_slice() else {
                    return None;
                };
                (*lhs, *rhs)
            }
        };
        let lhs = self.lower_expr(&lhs);
        let rhs = self.lower_expr(&rhs);
        Some(
            self.builder
                .add(NodeKind::Binary { op, lhs, rhs }, span(node), Vec::new()),
        )
    }

    fn lower_lambda(&mut self, node: &Node<'_>) -> NodeId {
        if node.kind() == "annotated_lambda" {
            if let Some(literal) = first_descendant(node, "lambda_literal") {
                return self.lower_lambda(&literal);
            }
        }
        self.scopes.push(span(node));
        let children = self.lower_children(node);
        self.scopes.pop();
        self.builder.add(NodeKind::Lambda, span(node), children)
    }

    fn lower_class(&mut self, node: &Node<'_>) -> NodeId {
        let named = named_children(node);
        let name_node = named.iter().find(|c| is_identifier(c));
        let name = name_node.map_or_else(|| "<anonymous>".to_string(), |n| self.text(n).to_string());
        let supertypes = self.supertypes(node);

        self.scopes.push(span(node));
        let mut children = Vec::new();
        for child in &named {
            if Some(child) == name_node
                || matches!(
                    child.kind(),
                    "delegation_specifiers" | "delegation_specifier"
                )
            {
                continue;
            }
            children.extend(self.lower(child));
        }
        self.scopes.pop();

        let id = self
            .builder
            .add(NodeKind::ClassDecl { name: name.clone() }, span(node), children);
        self.facts.classes.insert(
            id,
            ClassFacts {
                name,
                is_object: node.kind() == "object_declaration",
                supertypes,
            },
        );
        id
    }

    fn supertypes(&self, node: &Node<'_>) -> Vec<String> {
        let mut out = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "delegation_specifiers" => out.extend(
                    named_children(&child)
                        .iter()
                        .filter(|c| c.kind().contains("delegation_specifier"))
                        .map(|c| self.supertype(c)),
                ),
                "delegation_specifier" => out.push(self.supertype(&child)),
                _ => {}
            }
        }
        out.retain(|s| !s.is_empty());
        out
    }

    fn supertype(&self, node: &Node<'_>) -> String {
        let text = first_descendant(node, "user_type")
            .map_or_else(|| self.text(node), |ty| self.text(&ty));
        normalize_type(text.split_whitespace().next().unwrap_or(""))
    }

    fn lower_function(&mut self, node: &Node<'_>) -> Vec<NodeId> {
        let all = children(node);
        let name_node = all.iter().find(|c| is_identifier(c)).copied();
        let params_at = all
            .iter()
            .position(|c| c.kind() == "function_value_parameters");
        let return_type = params_at.and_then(|at| {
            let rest = &all[at + 1..];
            let colon = rest.iter().position(|c| c.kind() == ":")?;
            rest[colon + 1..]
                .iter()
                .find(|c| c.is_named())
                .map(|c| normalize_type(self.text(c)))
        });
        if let Some(name) = name_node {
            self.facts
                .functions
                .insert(self.text(&name).to_string(), return_type);
        }

        self.scopes.push(span(node));
        let mut out = Vec::new();
        for child in all.iter().filter(|c| c.is_named()) {
            if Some(*child) != name_node {
                out.extend(self.lower(child));
            }
        }
        self.scopes.pop();
        out
    }

    /// Name and declared type of a `name: Type` declaration.
    fn declaration(&self, node: &Node<'_>) -> (Option<String>, Option<String>) {
        let all = children(node);
        let name = all
            .iter()
            .find(|c| is_identifier(c))
            .map(|c| self.text(c).to_string());
        let declared = all
            .iter()
            .position(|c| c.kind() == ":")
            .and_then(|colon| all[colon + 1..].iter().find(|c| c.is_named()))
            .map(|ty| normalize_type(self.text(ty)));
        (name, declared)
    }

    fn lower_property(&mut self, node: &Node<'_>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut name = None;
        let mut declared = None;
        let mut initializer = None;
        let mut after_eq = false;
        for child in children(node) {
            match child.kind() {
                "variable_declaration" => (name, declared) = self.declaration(&child),
                "=" => after_eq = true,
                _ if after_eq && child.is_named() && initializer.is_none() => {
                    let id = self.lower_expr(&child);
                    initializer = Some(id);
                    out.push(id);
                }
                _ if child.is_named() => out.extend(self.lower(&child)),
                _ => {}
            }
        }
        if let Some(name) = name {
            self.facts.variables.push(VariableFacts {
                name,
                declared_type: declared,
                initializer,
                scope: self.scope(),
            });
        }
        out
    }

    fn lower_parameter(&mut self, node: &Node<'_>) -> Vec<NodeId> {
        let (name, declared) = self.declaration(node);
        let named = named_children(node);
        let name_node = named.iter().find(|c| is_identifier(c)).copied();
        let mut out = Vec::new();
        for child in &named {
            if Some(*child) != name_node {
                out.extend(self.lower(child));
            }
        }
        if let Some(name) = name {
            self.facts.variables.push(VariableFacts {
                name,
                declared_type: declared,
                initializer: None,
                scope: self.scope(),
            });
        }
        out
    }
}

/// Callee, value arguments and trailing lambda of a call expression.
///
/// `f(x) { }` parses as a call wrapping the inner call `f(x)` plus the lambda;
/// both levels are merged into one call.
fn call_parts<'t>(node: &Node<'t>) -> Option<(Node<'t>, Option<Node<'t>>, Option<Node<'t>>)> {
    let mut parts = Vec::new();
    for child in named_children(node) {
        if child.kind() == "call_suffix" {
            parts.extend(named_children(&child));
        } else if !COMMENT_KINDS.contains(&child.kind()) {
            parts.push(child);
        }
    }
    let (head, rest) = parts.split_first()?;
    let args = rest.iter().find(|c| c.kind() == "value_arguments").copied();
    let lambda = rest
        .iter()
        .find(|c| matches!(c.kind(), "annotated_lambda" | "lambda_literal"))
        .copied();

    if head.kind() == "call_expression" && args.is_none() && lambda.is_some() {
        return match call_parts(head)? {
            (callee, inner_args, None) => Some((callee, inner_args, lambda)),
            _ => None,
        };
    }
    Some((*head, args, lambda))
}

/// Splits `a.b` into its receiver expression and selector identifier.
fn split_navigation<'t>(node: &Node<'t>) -> Option<(Node<'t>, Node<'t>)> {
    let named = named_children(node);
    let [receiver, .., last] = named.as_slice() else {
        return None;
    };
    let selector = if last.kind() == "navigation_suffix" {
        named_children(last).into_iter().find(is_identifier)?
    } else if is_identifier(last) {
        *last
    } else {
        return None;
    };
    Some((*receiver, selector))
}
