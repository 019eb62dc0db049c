use std::fmt;

use crate::ast::{LiteralKind, Node};

/// The outcome of a semantic pass: diagnostics in traversal order followed
/// by the unused-symbol warnings, plus the populated symbol table.
pub struct Analysis {
    pub diagnostics: Vec<Diagnostic>,
    pub symbols: SymbolTable,
}

/// Walks the parse tree once, depth-first, building the symbol table and
/// accumulating diagnostics. Never fails; partial trees produced by parser
/// recovery are simply checked as far as they go.
pub fn check(root: &Node) -> Analysis {
    let mut checker = Checker::new();
    checker.visit_stmt(root);
    checker.finish()
}

/// A declared name and what the pass has observed about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: Box<str>,
    pub ty: Box<str>,
    /// The label of the scope the declaration appeared in, e.g.
    /// `global.b1`. Distinct labels let an inner declaration shadow an
    /// outer one without colliding in the table.
    pub scope: Box<str>,
    pub initialized: bool,
    pub used: bool,
}

/// Symbols in declaration order, keyed by (scope label, name).
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn get(&self, name: &str, scope: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|s| &*s.name == name && &*s.scope == scope)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn position(&self, name: &str, scope: &str) -> Option<usize> {
        self.symbols
            .iter()
            .position(|s| &*s.name == name && &*s.scope == scope)
    }
}

struct Checker {
    table: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    /// Stack of active scope labels, outermost first.
    scopes: Vec<Box<str>>,
    /// Counter for generated block-scope labels, one sequence per run.
    blocks: u32,
}

const GLOBAL_SCOPE: &str = "global";

impl Checker {
    fn new() -> Checker {
        Checker {
            table: SymbolTable::default(),
            diagnostics: Vec::new(),
            scopes: vec![GLOBAL_SCOPE.into()],
            blocks: 0,
        }
    }

    fn finish(mut self) -> Analysis {
        // Unused-symbol warnings come after every traversal-ordered
        // diagnostic, in declaration order.
        for symbol in &self.table.symbols {
            if !symbol.used {
                self.diagnostics.push(Diagnostic::NeverUsed {
                    name: symbol.name.clone(),
                });
            }
        }
        Analysis {
            diagnostics: self.diagnostics,
            symbols: self.table,
        }
    }

    fn visit_stmt(&mut self, node: &Node) {
        match node {
            Node::Program(body) => {
                for stmt in body {
                    self.visit_stmt(stmt);
                }
            }
            Node::Block(body) => self.visit_scope(body),
            Node::Declaration { ty, declarators } => {
                for declarator in declarators {
                    let inferred = declarator
                        .initializer
                        .as_ref()
                        .and_then(|init| self.visit_expr(init));
                    self.declare(&declarator.name, ty, declarator.initializer.is_some());
                    if let Some(found) = inferred {
                        self.validate_types(&declarator.name, ty, &found);
                    }
                }
            }
            Node::Assignment { target, value } => {
                let resolved = self.resolve(target);
                if resolved.is_none() {
                    self.undeclared(target);
                }
                // The right-hand side is checked before the target is
                // marked initialized, so `x = x + 1` on an uninitialized
                // `x` still warns.
                let inferred = value.as_deref().and_then(|value| self.visit_expr(value));
                if let Some(i) = resolved {
                    self.table.symbols[i].initialized = true;
                    let declared = self.table.symbols[i].ty.clone();
                    if let Some(found) = inferred {
                        self.validate_types(target, &declared, &found);
                    }
                }
            }
            Node::If {
                condition,
                then_block,
                else_block,
            } => {
                self.visit_expr(condition);
                self.visit_scope(then_block);
                if let Some(else_block) = else_block {
                    self.visit_scope(else_block);
                }
            }
            Node::While { condition, body } => {
                self.visit_expr(condition);
                self.visit_scope(body);
            }
            Node::Return(value) => {
                if let Some(value) = value {
                    self.visit_expr(value);
                }
            }
            Node::Binary { .. } | Node::Unary { .. } | Node::Identifier(_) | Node::Literal { .. } => {
                self.visit_expr(node);
            }
        }
    }

    /// Visits an expression subtree, marking identifier uses, and returns
    /// the inferred type when one is known.
    fn visit_expr(&mut self, node: &Node) -> Option<Box<str>> {
        match node {
            Node::Identifier(name) => match self.resolve(name) {
                Some(i) => {
                    let symbol = &mut self.table.symbols[i];
                    symbol.used = true;
                    if !symbol.initialized {
                        let name = symbol.name.clone();
                        self.diagnostics
                            .push(Diagnostic::UsedBeforeInitialization { name });
                    }
                    Some(self.table.symbols[i].ty.clone())
                }
                None => {
                    self.undeclared(name);
                    None
                }
            },
            Node::Literal { kind, text } => Some(infer_literal(*kind, text).into()),
            Node::Binary { lhs, rhs, .. } => {
                let left = self.visit_expr(lhs);
                let right = self.visit_expr(rhs);
                left.or(right)
            }
            Node::Unary { operand, .. } => self.visit_expr(operand),
            _ => {
                self.visit_stmt(node);
                None
            }
        }
    }

    /// Visits a statement list inside a freshly-labeled nested scope.
    fn visit_scope(&mut self, body: &[Node]) {
        self.blocks += 1;
        let label = format!("{}.b{}", self.current_scope(), self.blocks);
        self.scopes.push(label.into());
        for stmt in body {
            self.visit_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn current_scope(&self) -> &str {
        self.scopes.last().map_or(GLOBAL_SCOPE, |s| s)
    }

    /// Inserts a symbol into the current scope. Re-declaring a name in the
    /// same scope is an error; the first entry is kept.
    fn declare(&mut self, name: &str, ty: &str, initialized: bool) {
        let scope = self.current_scope().to_owned();
        if self.table.position(name, &scope).is_some() {
            self.diagnostics.push(Diagnostic::Redeclaration {
                name: name.into(),
                scope: scope.into(),
            });
            return;
        }
        self.table.symbols.push(Symbol {
            name: name.into(),
            ty: ty.into(),
            scope: scope.into(),
            initialized,
            used: false,
        });
    }

    /// Resolves a name against the active scope chain, innermost first.
    fn resolve(&self, name: &str) -> Option<usize> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| self.table.position(name, scope))
    }

    fn undeclared(&mut self, name: &str) {
        let suggestion = self.suggest(name);
        self.diagnostics.push(Diagnostic::UndeclaredIdentifier {
            name: name.into(),
            suggestion,
        });
    }

    /// Picks the closest similarly-spelled declared name, if any is within
    /// an edit distance of two.
    fn suggest(&self, name: &str) -> Option<Box<str>> {
        self.table
            .symbols
            .iter()
            .map(|s| (edit_distance(name, &s.name), &s.name))
            .filter(|&(d, _)| d <= 2)
            .min_by_key(|&(d, _)| d)
            .map(|(_, candidate)| candidate.clone())
    }

    fn validate_types(&mut self, name: &str, declared: &str, found: &str) {
        if !compatible(declared, found) {
            self.diagnostics.push(Diagnostic::TypeMismatch {
                name: name.into(),
                declared: declared.into(),
                found: found.into(),
            });
        }
    }
}

fn infer_literal(kind: LiteralKind, text: &str) -> &'static str {
    match kind {
        LiteralKind::Number if text.contains(['.', 'e', 'E']) => "float",
        LiteralKind::Number => "int",
        LiteralKind::String => "string",
    }
}

/// The source language is untyped-ish: all numeric types are mutually
/// assignable, anything else must match exactly.
fn compatible(declared: &str, found: &str) -> bool {
    const NUMERIC: &[&str] = &["int", "float", "double", "char"];
    declared == found || (NUMERIC.contains(&declared) && NUMERIC.contains(&found))
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitute.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A structured semantic diagnostic. Severity and the optional suggestion
/// derive from the kind; [`fmt::Display`] renders the message, leaving any
/// further presentation to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UndeclaredIdentifier {
        name: Box<str>,
        suggestion: Option<Box<str>>,
    },
    UsedBeforeInitialization {
        name: Box<str>,
    },
    Redeclaration {
        name: Box<str>,
        scope: Box<str>,
    },
    TypeMismatch {
        name: Box<str>,
        declared: Box<str>,
        found: Box<str>,
    },
    NeverUsed {
        name: Box<str>,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::UndeclaredIdentifier { .. } | Diagnostic::Redeclaration { .. } => {
                Severity::Error
            }
            Diagnostic::UsedBeforeInitialization { .. }
            | Diagnostic::TypeMismatch { .. }
            | Diagnostic::NeverUsed { .. } => Severity::Warning,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Diagnostic::UndeclaredIdentifier { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Diagnostic::*;
        match self {
            UndeclaredIdentifier { name, .. } => {
                write!(f, "use of undeclared identifier '{name}'")
            }
            UsedBeforeInitialization { name } => {
                write!(f, "'{name}' is used before initialization")
            }
            Redeclaration { name, scope } => {
                write!(f, "'{name}' is already declared in scope '{scope}'")
            }
            TypeMismatch {
                name,
                declared,
                found,
            } => {
                write!(f, "'{name}' is declared as '{declared}' but assigned '{found}'")
            }
            NeverUsed { name } => write!(f, "'{name}' is declared but never used"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer, parser};
    use pretty_assertions::assert_eq;

    fn analyze(src: &str) -> Analysis {
        let tokens = lexer::tokenize(src);
        let parse = parser::parse(&tokens);
        assert!(parse.errors.is_empty(), "unexpected syntax errors");
        check(&parse.root)
    }

    fn messages(analysis: &Analysis) -> Vec<String> {
        analysis
            .diagnostics
            .iter()
            .map(|d| format!("{}: {d}", d.severity()))
            .collect()
    }

    #[test]
    fn symbol_lifecycle_use_before_initialization() {
        let analysis = analyze("int x; int y = x + 1;");
        assert_eq!(
            messages(&analysis),
            [
                "warning: 'x' is used before initialization",
                "warning: 'y' is declared but never used",
            ]
        );

        let x = analysis.symbols.get("x", "global").unwrap();
        assert!(x.used);
        assert!(!x.initialized);
        let y = analysis.symbols.get("y", "global").unwrap();
        assert!(y.initialized);
        assert!(!y.used);
    }

    #[test]
    fn undeclared_identifier_with_suggestion() {
        let analysis = analyze("int count = 0; cont = count + 1;");
        assert_eq!(
            messages(&analysis),
            ["error: use of undeclared identifier 'cont'"]
        );
        assert_eq!(analysis.diagnostics[0].suggestion(), Some("count"));
    }

    #[test]
    fn undeclared_identifier_without_similar_name() {
        let analysis = analyze("int count = 0; zzz = count;");
        let [diagnostic] = &analysis.diagnostics[..] else {
            panic!("expected a single diagnostic");
        };
        assert_eq!(diagnostic.severity(), Severity::Error);
        assert_eq!(diagnostic.suggestion(), None);
    }

    #[test]
    fn shadowing_in_nested_scope_keeps_both_entries() {
        let analysis = analyze("int x = 1; if (x) { float x = 2; x = x + 1; }");
        let outer = analysis.symbols.get("x", "global").unwrap();
        let inner = analysis.symbols.get("x", "global.b1").unwrap();
        assert_eq!(&*outer.ty, "int");
        assert_eq!(&*inner.ty, "float");
        // The condition marked the outer x; the inner assignment hit the
        // shadowing entry only.
        assert!(outer.used);
        assert!(inner.used);
    }

    #[test]
    fn redeclaration_in_same_scope_is_an_error() {
        let analysis = analyze("int x = 1; float x = 2; x = x;");
        assert_eq!(
            messages(&analysis)[0],
            "error: 'x' is already declared in scope 'global'"
        );
        // The first entry wins.
        assert_eq!(&*analysis.symbols.get("x", "global").unwrap().ty, "int");
        assert_eq!(analysis.symbols.len(), 1);
    }

    #[test]
    fn type_mismatch_is_a_warning_not_an_error() {
        let analysis = analyze("int x = 1; x = \"text\"; x = x;");
        assert_eq!(
            messages(&analysis),
            ["warning: 'x' is declared as 'int' but assigned 'string'"]
        );
    }

    #[test]
    fn numeric_types_are_mutually_assignable() {
        let analysis = analyze("int x = 1.5; float y = x; y = y;");
        assert_eq!(messages(&analysis), Vec::<String>::new());
    }

    #[test]
    fn assignment_rhs_checked_before_target_is_marked() {
        let analysis = analyze("int x; x = x + 1; x = x;");
        assert_eq!(
            messages(&analysis),
            ["warning: 'x' is used before initialization"]
        );
    }

    #[test]
    fn outer_symbol_visible_inside_nested_scope() {
        let analysis = analyze("int x = 1; while (x) { x = x - 1; }");
        assert_eq!(messages(&analysis), Vec::<String>::new());
        assert!(analysis.symbols.get("x", "global").unwrap().used);
        assert_eq!(analysis.symbols.len(), 1);
    }

    #[test]
    fn traversal_diagnostics_precede_unused_warnings() {
        let analysis = analyze("int unused; y = 1;");
        assert_eq!(
            messages(&analysis),
            [
                "error: use of undeclared identifier 'y'",
                "warning: 'unused' is declared but never used",
            ]
        );
    }

    #[test]
    fn literal_type_inference() {
        assert_eq!(infer_literal(LiteralKind::Number, "42"), "int");
        assert_eq!(infer_literal(LiteralKind::Number, "4.2"), "float");
        assert_eq!(infer_literal(LiteralKind::Number, "1e9"), "float");
        assert_eq!(infer_literal(LiteralKind::String, "\"s\""), "string");
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("count", "count"), 0);
        assert_eq!(edit_distance("cont", "count"), 1);
        assert_eq!(edit_distance("cnt", "count"), 2);
        assert_eq!(edit_distance("zzz", "count"), 5);
    }
}
