//! Per-file declaration facts gathered while lowering.
//!
//! The resolver answers every query from these facts plus the table of known
//! library declarations; it never goes back to the Tree-sitter tree.

use std::collections::HashMap;

use coro_lint_core::{NodeId, Span};

/// Package declaration extracted from source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Line number (1-indexed).
    pub line: usize,
    /// Fully qualified package path (e.g., `com.example.app`).
    pub path: String,
}

/// A single import directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    /// Line number (1-indexed).
    pub line: usize,
    /// Imported path without the trailing `.*` (e.g., `kotlinx.coroutines.launch`).
    pub path: String,
    /// `import a.b.C as D` alias.
    pub alias: Option<String>,
    /// `import a.b.*`
    pub star: bool,
}

impl ImportInfo {
    /// Parses the text of an import directive.
    #[must_use]
    pub fn parse(text: &str, line: usize) -> Option<Self> {
        let body = text
            .trim()
            .strip_prefix("import")?
            .trim()
            .trim_end_matches(';')
            .trim();
        let (path, alias) = match body.split_once(" as ") {
            Some((path, alias)) => (path.trim(), Some(alias.trim().to_string())),
            None => (body, None),
        };
        let path: String = path.chars().filter(|c| !c.is_whitespace()).collect();
        let (path, star) = match path.strip_suffix(".*") {
            Some(pkg) => (pkg.to_string(), true),
            None => (path, false),
        };
        if path.is_empty() {
            return None;
        }
        Some(Self {
            line,
            path,
            alias,
            star,
        })
    }

    /// Name the import makes visible, unless it is a star import.
    #[must_use]
    pub fn visible_name(&self) -> Option<&str> {
        if self.star {
            return None;
        }
        self.alias
            .as_deref()
            .or_else(|| self.path.rsplit('.').next())
    }
}

/// A class, interface or object declared in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFacts {
    /// Declared simple name.
    pub name: String,
    /// `object Foo`
    pub is_object: bool,
    /// Supertype references as written, normalized by [`normalize_type`].
    pub supertypes: Vec<String>,
}

/// A property, local variable or parameter declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableFacts {
    /// Declared name.
    pub name: String,
    /// Declared type, normalized by [`normalize_type`].
    pub declared_type: Option<String>,
    /// Initializer expression, for `val x = ...` without a type.
    pub initializer: Option<NodeId>,
    /// Span of the innermost function, lambda, class or file declaring it.
    pub scope: Span,
}

/// Everything the resolver knows about one file.
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    /// Package declaration, if present.
    pub package: Option<PackageInfo>,
    /// Import directives in source order.
    pub imports: Vec<ImportInfo>,
    /// Class declarations keyed by their lowered node.
    pub classes: HashMap<NodeId, ClassFacts>,
    /// Function name to declared return type.
    pub functions: HashMap<String, Option<String>>,
    /// Variable declarations in source order.
    pub variables: Vec<VariableFacts>,
}

impl FileFacts {
    /// Package path, empty for the default package.
    #[must_use]
    pub fn package_path(&self) -> &str {
        self.package.as_ref().map_or("", |p| p.path.as_str())
    }

    /// Qualifies a name declared in this file.
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        match self.package_path() {
            "" => name.to_string(),
            pkg => format!("{pkg}.{name}"),
        }
    }

    /// Class declared in this file under `name`.
    #[must_use]
    pub fn class_named(&self, name: &str) -> Option<&ClassFacts> {
        self.classes.values().find(|c| c.name == name)
    }

    /// Innermost declaration of `name` visible at `offset`.
    #[must_use]
    pub fn variable_at(&self, name: &str, offset: usize) -> Option<&VariableFacts> {
        self.variables
            .iter()
            .filter(|v| v.name == name && v.scope.start <= offset && offset <= v.scope.end)
            .min_by_key(|v| v.scope.len())
    }
}

/// Strips nullability, type arguments and whitespace from a type reference.
#[must_use]
pub fn normalize_type(text: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            '(' if depth == 0 => break,
            c if depth == 0 && !c.is_whitespace() && c != '?' && c != '!' => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_import() {
        let imp = ImportInfo::parse("import kotlinx.coroutines.launch", 3).unwrap();
        assert_eq!(imp.path, "kotlinx.coroutines.launch");
        assert_eq!(imp.visible_name(), Some("launch"));
        assert!(!imp.star);
        assert_eq!(imp.line, 3);
    }

    #[test]
    fn parses_star_and_alias_imports() {
        let star = ImportInfo::parse("import kotlinx.coroutines.*", 1).unwrap();
        assert!(star.star);
        assert_eq!(star.path, "kotlinx.coroutines");
        assert_eq!(star.visible_name(), None);

        let alias = ImportInfo::parse("import kotlinx.coroutines.GlobalScope as GS;", 2).unwrap();
        assert_eq!(alias.path, "kotlinx.coroutines.GlobalScope");
        assert_eq!(alias.visible_name(), Some("GS"));
    }

    #[test]
    fn rejects_non_imports() {
        assert!(ImportInfo::parse("package a.b", 1).is_none());
        assert!(ImportInfo::parse("import ", 1).is_none());
    }

    #[test]
    fn normalizes_types() {
        assert_eq!(normalize_type("Job?"), "Job");
        assert_eq!(normalize_type("List<Job>"), "List");
        assert_eq!(normalize_type("kotlinx.coroutines.Job"), "kotlinx.coroutines.Job");
        assert_eq!(normalize_type("ViewModel()"), "ViewModel");
    }

    #[test]
    fn innermost_variable_wins() {
        let facts = FileFacts {
            variables: vec![
                VariableFacts {
                    name: "job".into(),
                    declared_type: Some("Job".into()),
                    initializer: None,
                    scope: Span::new(0, 100),
                },
                VariableFacts {
                    name: "job".into(),
                    declared_type: Some("String".into()),
                    initializer: None,
                    scope: Span::new(10, 20),
                },
            ],
            ..FileFacts::default()
        };
        let inner = facts.variable_at("job", 15).unwrap();
        assert_eq!(inner.declared_type.as_deref(), Some("String"));
        let outer = facts.variable_at("job", 50).unwrap();
        assert_eq!(outer.declared_type.as_deref(), Some("Job"));
        assert!(facts.variable_at("job", 200).is_none());
    }

    #[test]
    fn qualifies_with_package() {
        let mut facts = FileFacts::default();
        assert_eq!(facts.qualify("Vm"), "Vm");
        facts.package = Some(PackageInfo {
            line: 1,
            path: "app".into(),
        });
        assert_eq!(facts.qualify("Vm"), "app.Vm");
    }
}
