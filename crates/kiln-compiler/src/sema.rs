//! Semantic analysis.
//!
//! `analyze` produces an [`Analysis`] snapshot for a submission: the
//! cross-file function table, the local bindings with their visibility
//! ranges, and every diagnostic found. It never fails: syntactically
//! broken files contribute whatever the parser could recover, which is
//! exactly what the interactive path needs while a buffer is invalid
//! mid-edit.

use crate::builtins;
use kiln_core::{Diagnostic, LineIndex, Span, Submission};
use kiln_parser::ast::{Block, Expr, FnDecl, Module, Stmt};
use std::collections::HashMap;

/// A function symbol in the snapshot.
#[derive(Debug, Clone)]
pub struct FunctionSym {
    /// The function name.
    pub name: String,
    /// Parameter names.
    pub params: Vec<String>,
    /// The file declaring it.
    pub file: String,
    /// Span of the name token.
    pub name_span: Span,
    /// Span of the whole declaration.
    pub span: Span,
}

impl FunctionSym {
    /// The signature shown in hover and completion detail.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("fn {}({})", self.name, self.params.join(", "))
    }
}

/// A local binding (parameter or `let`) with its visibility range.
#[derive(Debug, Clone)]
pub struct LocalSym {
    /// The binding name.
    pub name: String,
    /// The file it appears in.
    pub file: String,
    /// Span of the declaring identifier.
    pub decl_span: Span,
    /// Byte range in which the binding is in scope.
    pub visible: Span,
}

/// An analyzed source file. Kept so executable-mode emission can reuse
/// the ASTs the snapshot was derived from.
#[derive(Debug)]
pub(crate) struct ParsedFile {
    pub name: String,
    pub module: Module,
    pub index: LineIndex,
}

/// The semantic snapshot of a submission.
///
/// Immutable once produced; diagnostics, completions, and hover are all
/// derived from it.
#[derive(Debug)]
pub struct Analysis {
    /// Every diagnostic, in file order.
    pub diagnostics: Vec<Diagnostic>,
    /// The cross-file function table, in declaration order.
    pub functions: Vec<FunctionSym>,
    /// Local bindings with visibility ranges, for completion and hover.
    pub locals: Vec<LocalSym>,
    pub(crate) files: Vec<ParsedFile>,
}

impl Analysis {
    /// Whether any diagnostic has Error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Look up a function symbol by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionSym> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Local bindings visible at a byte offset in a file.
    pub fn locals_in_scope<'a>(
        &'a self,
        file: &'a str,
        offset: usize,
    ) -> impl Iterator<Item = &'a LocalSym> + 'a {
        self.locals
            .iter()
            .filter(move |l| l.file == file && l.visible.contains(offset))
    }
}

/// Analyze a submission into a semantic snapshot.
pub fn analyze(submission: &Submission) -> Analysis {
    let mut diagnostics = Vec::new();
    let mut files = Vec::new();

    for file in &submission.files {
        let result = kiln_parser::parse(&file.text);
        let index = LineIndex::new(&file.text);
        for error in &result.errors {
            diagnostics.push(Diagnostic::error(
                &file.name,
                index.range(error.span),
                error.message(),
            ));
        }
        files.push(ParsedFile {
            name: file.name.clone(),
            module: result.module,
            index,
        });
    }

    // First pass: the cross-file function table.
    let mut functions: Vec<FunctionSym> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for file in &files {
        for decl in &file.module.functions {
            let name = &decl.name.name;
            if builtins::lookup(name).is_some() {
                diagnostics.push(Diagnostic::error(
                    &file.name,
                    file.index.range(decl.name.span),
                    format!("cannot redefine builtin `{name}`"),
                ));
                continue;
            }
            if by_name.contains_key(name) {
                diagnostics.push(Diagnostic::error(
                    &file.name,
                    file.index.range(decl.name.span),
                    format!("function `{name}` is defined more than once"),
                ));
                continue;
            }
            by_name.insert(name.clone(), functions.len());
            functions.push(FunctionSym {
                name: name.clone(),
                params: decl.params.iter().map(|p| p.name.clone()).collect(),
                file: file.name.clone(),
                name_span: decl.name.span,
                span: decl.span,
            });
        }
    }

    // Second pass: check bodies.
    let mut locals = Vec::new();
    for file in &files {
        for decl in &file.module.functions {
            let mut checker = Checker {
                file: &file.name,
                index: &file.index,
                by_name: &by_name,
                functions: &functions,
                diagnostics: &mut diagnostics,
                locals: &mut locals,
                scopes: Vec::new(),
                block_ends: Vec::new(),
            };
            checker.check_fn(decl);
        }
    }

    tracing::debug!(
        files = files.len(),
        functions = functions.len(),
        diagnostics = diagnostics.len(),
        "analysis complete"
    );

    Analysis {
        diagnostics,
        functions,
        locals,
        files,
    }
}

struct LocalEntry {
    name: String,
    decl_span: Span,
    used: bool,
    from_let: bool,
}

struct Checker<'a> {
    file: &'a str,
    index: &'a LineIndex,
    by_name: &'a HashMap<String, usize>,
    functions: &'a [FunctionSym],
    diagnostics: &'a mut Vec<Diagnostic>,
    locals: &'a mut Vec<LocalSym>,
    scopes: Vec<Vec<LocalEntry>>,
    block_ends: Vec<usize>,
}

impl Checker<'_> {
    fn check_fn(&mut self, decl: &FnDecl) {
        self.scopes.push(Vec::new());
        self.block_ends.push(decl.body.span.end);
        for param in &decl.params {
            self.declare(&param.name, param.span, false);
        }
        for stmt in &decl.body.stmts {
            self.check_stmt(stmt);
        }
        self.block_ends.pop();
        self.pop_scope();
    }

    fn check_block(&mut self, block: &Block) {
        self.scopes.push(Vec::new());
        self.block_ends.push(block.span.end);
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.block_ends.pop();
        self.pop_scope();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { name, value, .. } => {
                self.check_expr(value);
                self.declare(&name.name, name.span, true);
            }
            Stmt::Assign { name, value, .. } => {
                self.check_expr(value);
                if !self.mark_used(&name.name) {
                    self.error(
                        name.span,
                        format!("cannot assign to undeclared variable `{}`", name.name),
                    );
                }
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_expr(cond);
                self.check_block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_block(else_branch);
                }
            }
            Stmt::While { cond, body, .. } => {
                self.check_expr(cond);
                self.check_block(body);
            }
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.check_expr(value);
                }
            }
            Stmt::Expr(expr) => self.check_expr(expr),
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Int { .. } | Expr::Str { .. } | Expr::Bool { .. } => {}
            Expr::Var { name } => {
                if !self.mark_used(&name.name) {
                    if self.by_name.contains_key(&name.name)
                        || builtins::lookup(&name.name).is_some()
                    {
                        self.error(
                            name.span,
                            format!("`{}` is a function; call it with `(...)`", name.name),
                        );
                    } else {
                        self.error(name.span, format!("unknown variable `{}`", name.name));
                    }
                }
            }
            Expr::Unary { operand, .. } => self.check_expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.check_expr(lhs);
                self.check_expr(rhs);
            }
            Expr::Call { callee, args, .. } => {
                for arg in args {
                    self.check_expr(arg);
                }
                self.check_call(callee.name.as_str(), callee.span, args.len());
            }
        }
    }

    fn check_call(&mut self, name: &str, span: Span, argc: usize) {
        if let Some(&idx) = self.by_name.get(name) {
            let arity = self.functions[idx].params.len();
            if argc != arity {
                self.error(
                    span,
                    format!(
                        "function `{name}` takes {arity} argument(s), but {argc} were supplied"
                    ),
                );
            }
        } else if let Some((_, builtin)) = builtins::lookup(name) {
            if argc != builtin.arity {
                self.error(
                    span,
                    format!(
                        "builtin `{name}` takes {} argument(s), but {argc} were supplied",
                        builtin.arity
                    ),
                );
            }
        } else if self.resolve(name) {
            self.error(span, format!("`{name}` is a variable, not a function"));
        } else {
            self.error(span, format!("unknown function `{name}`"));
        }
    }

    fn declare(&mut self, name: &str, span: Span, from_let: bool) {
        let block_end = *self.block_ends.last().expect("inside a block");
        self.locals.push(LocalSym {
            name: name.to_string(),
            file: self.file.to_string(),
            decl_span: span,
            visible: Span::new(span.start, block_end),
        });
        self.scopes
            .last_mut()
            .expect("inside a scope")
            .push(LocalEntry {
                name: name.to_string(),
                decl_span: span,
                used: false,
                from_let,
            });
    }

    /// Mark a binding as used. Returns false when no binding resolves.
    fn mark_used(&mut self, name: &str) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(entry) = scope.iter_mut().rev().find(|e| e.name == name) {
                entry.used = true;
                return true;
            }
        }
        false
    }

    fn resolve(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .rev()
            .any(|scope| scope.iter().any(|e| e.name == name))
    }

    fn pop_scope(&mut self) {
        let scope = self.scopes.pop().expect("inside a scope");
        for entry in scope {
            if entry.from_let && !entry.used && !entry.name.starts_with('_') {
                self.diagnostics.push(Diagnostic::warning(
                    self.file,
                    self.index.range(entry.decl_span),
                    format!("unused variable `{}`", entry.name),
                ));
            }
        }
    }

    fn error(&mut self, span: Span, message: String) {
        self.diagnostics
            .push(Diagnostic::error(self.file, self.index.range(span), message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::Severity;

    fn analyze_one(text: &str) -> Analysis {
        analyze(&Submission::single("main.kiln", text))
    }

    #[test]
    fn test_clean_program_has_no_diagnostics() {
        let analysis = analyze_one(
            "fn add(a, b) { return a + b; }\nfn main() { println(add(1, 2)); }",
        );
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        assert_eq!(analysis.functions.len(), 2);
    }

    #[test]
    fn test_unknown_variable() {
        let analysis = analyze_one("fn main() { println(x); }");
        assert!(analysis.has_errors());
        assert!(analysis.diagnostics[0].message.contains("unknown variable `x`"));
    }

    #[test]
    fn test_unknown_function() {
        let analysis = analyze_one("fn main() { frobnicate(); }");
        assert!(analysis
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unknown function `frobnicate`")));
    }

    #[test]
    fn test_arity_mismatch() {
        let analysis = analyze_one("fn f(a) { return a; }\nfn main() { f(1, 2); }");
        assert!(analysis
            .diagnostics
            .iter()
            .any(|d| d.message.contains("takes 1 argument(s), but 2 were supplied")));
    }

    #[test]
    fn test_duplicate_function() {
        let analysis = analyze_one("fn f() { }\nfn f() { }");
        assert!(analysis
            .diagnostics
            .iter()
            .any(|d| d.message.contains("defined more than once")));
    }

    #[test]
    fn test_cannot_redefine_builtin() {
        let analysis = analyze_one("fn println(x) { }");
        assert!(analysis
            .diagnostics
            .iter()
            .any(|d| d.message.contains("cannot redefine builtin")));
    }

    #[test]
    fn test_unused_variable_is_warning_only() {
        let analysis = analyze_one("fn main() { let x = 1; }");
        assert!(!analysis.has_errors());
        assert!(analysis
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning && d.message.contains("unused variable `x`")));
    }

    #[test]
    fn test_underscore_suppresses_unused_warning() {
        let analysis = analyze_one("fn main() { let _x = 1; }");
        assert!(analysis.diagnostics.is_empty());
    }

    #[test]
    fn test_block_scoping() {
        let analysis = analyze_one("fn main() { if true { let x = 1; println(x); } println(x); }");
        assert!(analysis
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unknown variable `x`")));
    }

    #[test]
    fn test_cross_file_calls_resolve() {
        let submission = Submission::new(vec![
            kiln_core::SourceFile::new("lib.kiln", "fn helper() { return 7; }"),
            kiln_core::SourceFile::new("main.kiln", "fn main() { println(helper()); }"),
        ]);
        let analysis = analyze(&submission);
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    }

    #[test]
    fn test_broken_syntax_still_produces_snapshot() {
        let analysis = analyze_one("fn main() { let = ; }");
        assert!(analysis.has_errors());
        assert_eq!(analysis.functions.len(), 1);
    }

    #[test]
    fn test_locals_in_scope() {
        let text = "fn main() { let count = 1; println(count); }";
        let analysis = analyze_one(text);
        let offset = text.find("println").unwrap();
        let names: Vec<_> = analysis
            .locals_in_scope("main.kiln", offset)
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["count"]);
    }

    #[test]
    fn test_assign_to_undeclared() {
        let analysis = analyze_one("fn main() { x = 1; }");
        assert!(analysis
            .diagnostics
            .iter()
            .any(|d| d.message.contains("cannot assign to undeclared variable `x`")));
    }
}
