//! In-memory bytecode artifacts.
//!
//! An [`Artifact`] is the output of a successful executable-mode
//! compilation: every function lowered to stack-machine code plus the
//! index of the entry point. Artifacts live entirely in memory, are
//! owned by the call that produced them, and are never cached or
//! written to storage.

use crate::vm::Value;

/// A single stack-machine instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Push a constant.
    Const(Value),
    /// Push the value of a local slot.
    LoadLocal(u16),
    /// Pop into a local slot.
    StoreLocal(u16),
    /// Discard the top of the stack.
    Pop,
    /// Pop two ints (or two strings for `+`), push the result.
    Add,
    /// Pop two ints, push the difference.
    Sub,
    /// Pop two ints, push the product.
    Mul,
    /// Pop two ints, push the quotient.
    Div,
    /// Pop two ints, push the remainder.
    Rem,
    /// Negate the top int.
    Neg,
    /// Logical-not the top bool.
    Not,
    /// Pop two values, push whether they are equal.
    Eq,
    /// Pop two values, push whether they differ.
    Ne,
    /// Pop two ints, push `lhs < rhs`.
    Lt,
    /// Pop two ints, push `lhs <= rhs`.
    Le,
    /// Pop two ints, push `lhs > rhs`.
    Gt,
    /// Pop two ints, push `lhs >= rhs`.
    Ge,
    /// Unconditional jump to an instruction index.
    Jump(usize),
    /// Pop a bool; jump when it is false.
    JumpIfFalse(usize),
    /// Pop a bool; jump when it is true.
    JumpIfTrue(usize),
    /// Call a user function; its arguments are the top `argc` values.
    Call {
        /// Index into [`Artifact::functions`].
        func: usize,
        /// Number of arguments on the stack.
        argc: u8,
    },
    /// Call a builtin from the fixed reference set.
    CallBuiltin {
        /// Index into the builtin table.
        builtin: usize,
        /// Number of arguments on the stack.
        argc: u8,
    },
    /// Return the top of the stack to the caller.
    Ret,
}

/// A compiled function.
#[derive(Debug, Clone)]
pub struct Function {
    /// The source-level function name.
    pub name: String,
    /// Number of parameters.
    pub arity: usize,
    /// Total number of local slots, parameters included.
    pub n_locals: usize,
    /// The instruction stream.
    pub code: Vec<Op>,
}

/// A runnable compilation artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// All compiled functions.
    pub functions: Vec<Function>,
    /// Index of the entry point in [`Self::functions`].
    pub entry: usize,
}

impl Artifact {
    /// The entry-point function.
    #[must_use]
    pub fn entry_fn(&self) -> &Function {
        &self.functions[self.entry]
    }
}
