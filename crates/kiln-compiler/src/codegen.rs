//! Lowering from checked ASTs to stack-machine bytecode.

use crate::bytecode::{Artifact, Function, Op};
use crate::builtins;
use crate::sema::Analysis;
use crate::vm::Value;
use kiln_core::{Diagnostic, Pos, Range};
use kiln_parser::ast::{BinaryOp, Block, Expr, FnDecl, Stmt, UnaryOp};
use std::collections::HashMap;

/// Lower an error-free analysis into a runnable artifact.
///
/// The only checks left at this stage are the entry-point rules: a
/// zero-parameter `main` must exist. Everything name- and arity-shaped
/// was already rejected during analysis.
pub(crate) fn emit(analysis: &Analysis) -> Result<Artifact, Vec<Diagnostic>> {
    let entry = match analysis.function("main") {
        None => {
            let file = analysis
                .files
                .first()
                .map_or_else(|| "<input>".to_string(), |f| f.name.clone());
            return Err(vec![Diagnostic::error(
                file,
                Range::new(Pos::new(0, 0), Pos::new(0, 0)),
                "no entry point: define `fn main()`",
            )]);
        }
        Some(sym) if !sym.params.is_empty() => {
            let range = analysis
                .files
                .iter()
                .find(|f| f.name == sym.file)
                .map_or_else(
                    || Range::new(Pos::new(0, 0), Pos::new(0, 0)),
                    |f| f.index.range(sym.name_span),
                );
            return Err(vec![Diagnostic::error(
                &sym.file,
                range,
                "`main` must not take parameters",
            )]);
        }
        Some(sym) => analysis
            .functions
            .iter()
            .position(|f| f.name == sym.name)
            .unwrap_or(0),
    };

    let by_name: HashMap<&str, usize> = analysis
        .functions
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.as_str(), i))
        .collect();

    let mut functions = Vec::with_capacity(analysis.functions.len());
    for file in &analysis.files {
        for decl in &file.module.functions {
            // Declarations dropped from the table (duplicates, builtin
            // clashes) never reach codegen: analysis flagged them as
            // errors and `compile` gates on those.
            if by_name.get(decl.name.name.as_str())
                != Some(&functions.len())
            {
                continue;
            }
            functions.push(Emitter::new(&by_name).emit_fn(decl));
        }
    }

    tracing::debug!(functions = functions.len(), entry, "emitted artifact");
    Ok(Artifact { functions, entry })
}

struct Emitter<'a> {
    by_name: &'a HashMap<&'a str, usize>,
    code: Vec<Op>,
    /// Lexical scopes mapping names to local slots.
    scopes: Vec<Vec<(String, u16)>>,
    n_locals: usize,
}

impl<'a> Emitter<'a> {
    fn new(by_name: &'a HashMap<&'a str, usize>) -> Self {
        Self {
            by_name,
            code: Vec::new(),
            scopes: Vec::new(),
            n_locals: 0,
        }
    }

    fn emit_fn(mut self, decl: &FnDecl) -> Function {
        self.scopes.push(Vec::new());
        for param in &decl.params {
            self.declare(&param.name);
        }
        for stmt in &decl.body.stmts {
            self.emit_stmt(stmt);
        }
        self.scopes.pop();
        // Falling off the end returns unit.
        self.code.push(Op::Const(Value::Unit));
        self.code.push(Op::Ret);
        Function {
            name: decl.name.name.clone(),
            arity: decl.params.len(),
            n_locals: self.n_locals,
            code: self.code,
        }
    }

    fn emit_block(&mut self, block: &Block) {
        self.scopes.push(Vec::new());
        for stmt in &block.stmts {
            self.emit_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { name, value, .. } => {
                self.emit_expr(value);
                let slot = self.declare(&name.name);
                self.code.push(Op::StoreLocal(slot));
            }
            Stmt::Assign { name, value, .. } => {
                self.emit_expr(value);
                let slot = self.resolve(&name.name);
                self.code.push(Op::StoreLocal(slot));
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.emit_expr(cond);
                let to_else = self.emit_jump(Op::JumpIfFalse(0));
                self.emit_block(then_branch);
                match else_branch {
                    Some(else_branch) => {
                        let to_end = self.emit_jump(Op::Jump(0));
                        self.patch(to_else);
                        self.emit_block(else_branch);
                        self.patch(to_end);
                    }
                    None => self.patch(to_else),
                }
            }
            Stmt::While { cond, body, .. } => {
                let top = self.code.len();
                self.emit_expr(cond);
                let to_end = self.emit_jump(Op::JumpIfFalse(0));
                self.emit_block(body);
                self.code.push(Op::Jump(top));
                self.patch(to_end);
            }
            Stmt::Return { value, .. } => {
                match value {
                    Some(value) => self.emit_expr(value),
                    None => self.code.push(Op::Const(Value::Unit)),
                }
                self.code.push(Op::Ret);
            }
            Stmt::Expr(expr) => {
                self.emit_expr(expr);
                self.code.push(Op::Pop);
            }
        }
    }

    fn emit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Int { value, .. } => self.code.push(Op::Const(Value::Int(*value))),
            Expr::Str { value, .. } => self.code.push(Op::Const(Value::Str(value.clone()))),
            Expr::Bool { value, .. } => self.code.push(Op::Const(Value::Bool(*value))),
            Expr::Var { name } => {
                let slot = self.resolve(&name.name);
                self.code.push(Op::LoadLocal(slot));
            }
            Expr::Unary { op, operand, .. } => {
                self.emit_expr(operand);
                self.code.push(match op {
                    UnaryOp::Neg => Op::Neg,
                    UnaryOp::Not => Op::Not,
                });
            }
            Expr::Binary { op, lhs, rhs, .. } => match op {
                BinaryOp::And => {
                    self.emit_expr(lhs);
                    let short = self.emit_jump(Op::JumpIfFalse(0));
                    self.emit_expr(rhs);
                    let end = self.emit_jump(Op::Jump(0));
                    self.patch(short);
                    self.code.push(Op::Const(Value::Bool(false)));
                    self.patch(end);
                }
                BinaryOp::Or => {
                    self.emit_expr(lhs);
                    let short = self.emit_jump(Op::JumpIfTrue(0));
                    self.emit_expr(rhs);
                    let end = self.emit_jump(Op::Jump(0));
                    self.patch(short);
                    self.code.push(Op::Const(Value::Bool(true)));
                    self.patch(end);
                }
                _ => {
                    self.emit_expr(lhs);
                    self.emit_expr(rhs);
                    self.code.push(match op {
                        BinaryOp::Add => Op::Add,
                        BinaryOp::Sub => Op::Sub,
                        BinaryOp::Mul => Op::Mul,
                        BinaryOp::Div => Op::Div,
                        BinaryOp::Rem => Op::Rem,
                        BinaryOp::Eq => Op::Eq,
                        BinaryOp::Ne => Op::Ne,
                        BinaryOp::Lt => Op::Lt,
                        BinaryOp::Le => Op::Le,
                        BinaryOp::Gt => Op::Gt,
                        BinaryOp::Ge => Op::Ge,
                        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
                    });
                }
            },
            Expr::Call { callee, args, .. } => {
                for arg in args {
                    self.emit_expr(arg);
                }
                let argc = args.len() as u8;
                if let Some(&func) = self.by_name.get(callee.name.as_str()) {
                    self.code.push(Op::Call { func, argc });
                } else if let Some((builtin, _)) = builtins::lookup(&callee.name) {
                    self.code.push(Op::CallBuiltin { builtin, argc });
                } else {
                    unreachable!("call target resolved during analysis");
                }
            }
        }
    }

    fn declare(&mut self, name: &str) -> u16 {
        let slot = self.n_locals as u16;
        self.n_locals += 1;
        self.scopes
            .last_mut()
            .expect("inside a scope")
            .push((name.to_string(), slot));
        slot
    }

    fn resolve(&self, name: &str) -> u16 {
        for scope in self.scopes.iter().rev() {
            if let Some((_, slot)) = scope.iter().rev().find(|(n, _)| n == name) {
                return *slot;
            }
        }
        unreachable!("local resolved during analysis")
    }

    /// Emit a jump with a placeholder target; [`Self::patch`] fills it.
    fn emit_jump(&mut self, op: Op) -> usize {
        self.code.push(op);
        self.code.len() - 1
    }

    fn patch(&mut self, at: usize) {
        let target = self.code.len();
        match &mut self.code[at] {
            Op::Jump(t) | Op::JumpIfFalse(t) | Op::JumpIfTrue(t) => *t = target,
            other => unreachable!("patched a non-jump op {other:?}"),
        }
    }
}
