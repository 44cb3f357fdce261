//! The execution sandbox: a stack-machine VM with per-run I/O.
//!
//! Every run gets its own [`RunIo`] carrying the stdin text and the
//! captured stdout buffer, so concurrent runs share no process-global
//! stream state and cannot observe each other's input or output. All
//! runtime failures are trapped and surfaced as [`Fault`] values;
//! nothing executed here can panic the host.

use crate::builtins;
use crate::bytecode::{Artifact, Op};
use std::fmt;
use thiserror::Error;

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// The unit value, produced by functions without a `return`.
    Unit,
    /// A 64-bit integer.
    Int(i64),
    /// A boolean.
    Bool(bool),
    /// A string.
    Str(String),
}

impl Value {
    /// The type name used in fault messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Str(_) => "str",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "()"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

/// A trapped runtime fault.
///
/// Faults are data, not failures of the calling protocol: the sandbox
/// converts every one of them into a result the caller can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// Division or remainder by zero.
    #[error("attempted to divide by zero")]
    DivisionByZero,
    /// Arithmetic overflowed the 64-bit integer range.
    #[error("integer overflow")]
    Overflow,
    /// An operator was applied to incompatible operand types.
    #[error("cannot apply `{op}` to {lhs} and {rhs}")]
    TypeMismatch {
        /// The operator.
        op: &'static str,
        /// Left operand type.
        lhs: &'static str,
        /// Right operand type.
        rhs: &'static str,
    },
    /// A unary operator was applied to the wrong type.
    #[error("cannot apply `{op}` to {operand}")]
    UnaryTypeMismatch {
        /// The operator.
        op: &'static str,
        /// Operand type.
        operand: &'static str,
    },
    /// An `if` or `while` condition did not evaluate to a bool.
    #[error("condition must be a bool, found {0}")]
    Condition(&'static str),
    /// A builtin received an argument of the wrong type.
    #[error("{builtin}: expected {expected}, found {found}")]
    BuiltinType {
        /// The builtin name.
        builtin: &'static str,
        /// The expected type.
        expected: &'static str,
        /// The type actually passed.
        found: &'static str,
    },
    /// `int()` could not parse its argument.
    #[error("cannot convert `{0}` to an integer")]
    IntParse(String),
    /// `read_line()` was called with no input left.
    #[error("no more input")]
    EndOfInput,
    /// The call stack exceeded the configured depth limit.
    #[error("call stack overflow")]
    StackOverflow,
    /// The run consumed its entire execution budget.
    #[error("execution budget exhausted")]
    OutOfFuel,
}

/// Per-run I/O context: the stdin text to serve and the captured
/// stdout. One `RunIo` belongs to exactly one run.
#[derive(Debug, Default)]
pub struct RunIo {
    input: String,
    cursor: usize,
    output: String,
}

impl RunIo {
    /// Create an I/O context serving the given stdin text.
    pub fn new(stdin: impl Into<String>) -> Self {
        Self {
            input: stdin.into(),
            cursor: 0,
            output: String::new(),
        }
    }

    /// Read one line from the stdin text, consuming the terminating
    /// newline without returning it.
    pub fn read_line(&mut self) -> Result<String, Fault> {
        if self.cursor >= self.input.len() {
            return Err(Fault::EndOfInput);
        }
        let rest = &self.input[self.cursor..];
        match rest.find('\n') {
            Some(idx) => {
                self.cursor += idx + 1;
                Ok(rest[..idx].trim_end_matches('\r').to_string())
            }
            None => {
                self.cursor = self.input.len();
                Ok(rest.to_string())
            }
        }
    }

    /// Append text to the captured output.
    pub fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// The output captured so far.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Consume the context, yielding the captured output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }
}

/// Resource limits for one run.
///
/// Execution of untrusted code is otherwise unbounded, so every run
/// carries a budget. Callers may lift individual limits explicitly.
#[derive(Debug, Clone)]
pub struct RunLimits {
    /// Instruction budget; `None` disables the check.
    pub fuel: Option<u64>,
    /// Maximum call-stack depth.
    pub max_call_depth: usize,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            fuel: Some(25_000_000),
            max_call_depth: 128,
        }
    }
}

struct Frame {
    func: usize,
    ip: usize,
    base: usize,
}

/// Execute an artifact's entry point against the given I/O context.
///
/// Returns `Ok(())` when the program ran to completion; the captured
/// output stays in `io`. Every runtime failure is trapped and returned
/// as a [`Fault`].
pub fn run(artifact: &Artifact, io: &mut RunIo, limits: &RunLimits) -> Result<(), Fault> {
    let mut stack: Vec<Value> = Vec::with_capacity(64);
    let mut frames: Vec<Frame> = Vec::with_capacity(8);

    let entry = artifact.entry_fn();
    debug_assert_eq!(entry.arity, 0, "entry point takes no arguments");
    stack.resize(entry.n_locals, Value::Unit);
    frames.push(Frame {
        func: artifact.entry,
        ip: 0,
        base: 0,
    });

    let mut fuel = limits.fuel;
    let builtin_table = builtins::builtins();

    while let Some(frame) = frames.last_mut() {
        if let Some(remaining) = fuel.as_mut() {
            if *remaining == 0 {
                return Err(Fault::OutOfFuel);
            }
            *remaining -= 1;
        }

        let code = &artifact.functions[frame.func].code;
        let op = &code[frame.ip];
        frame.ip += 1;

        match op {
            Op::Const(value) => stack.push(value.clone()),
            Op::LoadLocal(slot) => {
                let value = stack[frame.base + *slot as usize].clone();
                stack.push(value);
            }
            Op::StoreLocal(slot) => {
                let value = stack.pop().expect("stack underflow");
                stack[frame.base + *slot as usize] = value;
            }
            Op::Pop => {
                stack.pop().expect("stack underflow");
            }
            Op::Add => {
                let rhs = stack.pop().expect("stack underflow");
                let lhs = stack.pop().expect("stack underflow");
                let result = match (lhs, rhs) {
                    (Value::Int(a), Value::Int(b)) => {
                        Value::Int(a.checked_add(b).ok_or(Fault::Overflow)?)
                    }
                    (Value::Str(a), Value::Str(b)) => Value::Str(a + &b),
                    (lhs, rhs) => {
                        return Err(Fault::TypeMismatch {
                            op: "+",
                            lhs: lhs.type_name(),
                            rhs: rhs.type_name(),
                        })
                    }
                };
                stack.push(result);
            }
            Op::Sub => arith(&mut stack, "-", |a, b| a.checked_sub(b))?,
            Op::Mul => arith(&mut stack, "*", |a, b| a.checked_mul(b))?,
            Op::Div => {
                let (a, b) = int_operands(&mut stack, "/")?;
                if b == 0 {
                    return Err(Fault::DivisionByZero);
                }
                stack.push(Value::Int(a.checked_div(b).ok_or(Fault::Overflow)?));
            }
            Op::Rem => {
                let (a, b) = int_operands(&mut stack, "%")?;
                if b == 0 {
                    return Err(Fault::DivisionByZero);
                }
                stack.push(Value::Int(a.checked_rem(b).ok_or(Fault::Overflow)?));
            }
            Op::Neg => {
                let operand = stack.pop().expect("stack underflow");
                match operand {
                    Value::Int(v) => stack.push(Value::Int(v.checked_neg().ok_or(Fault::Overflow)?)),
                    other => {
                        return Err(Fault::UnaryTypeMismatch {
                            op: "-",
                            operand: other.type_name(),
                        })
                    }
                }
            }
            Op::Not => {
                let operand = stack.pop().expect("stack underflow");
                match operand {
                    Value::Bool(v) => stack.push(Value::Bool(!v)),
                    other => {
                        return Err(Fault::UnaryTypeMismatch {
                            op: "!",
                            operand: other.type_name(),
                        })
                    }
                }
            }
            Op::Eq => {
                let rhs = stack.pop().expect("stack underflow");
                let lhs = stack.pop().expect("stack underflow");
                stack.push(Value::Bool(lhs == rhs));
            }
            Op::Ne => {
                let rhs = stack.pop().expect("stack underflow");
                let lhs = stack.pop().expect("stack underflow");
                stack.push(Value::Bool(lhs != rhs));
            }
            Op::Lt => compare(&mut stack, "<", |a, b| a < b)?,
            Op::Le => compare(&mut stack, "<=", |a, b| a <= b)?,
            Op::Gt => compare(&mut stack, ">", |a, b| a > b)?,
            Op::Ge => compare(&mut stack, ">=", |a, b| a >= b)?,
            Op::Jump(target) => frame.ip = *target,
            Op::JumpIfFalse(target) => {
                let target = *target;
                match stack.pop().expect("stack underflow") {
                    Value::Bool(false) => frame.ip = target,
                    Value::Bool(true) => {}
                    other => return Err(Fault::Condition(other.type_name())),
                }
            }
            Op::JumpIfTrue(target) => {
                let target = *target;
                match stack.pop().expect("stack underflow") {
                    Value::Bool(true) => frame.ip = target,
                    Value::Bool(false) => {}
                    other => return Err(Fault::Condition(other.type_name())),
                }
            }
            Op::Call { func, argc } => {
                if frames.len() >= limits.max_call_depth {
                    return Err(Fault::StackOverflow);
                }
                let func = *func;
                let argc = *argc as usize;
                let callee = &artifact.functions[func];
                let base = stack.len() - argc;
                stack.resize(base + callee.n_locals, Value::Unit);
                frames.push(Frame { func, ip: 0, base });
            }
            Op::CallBuiltin { builtin, argc } => {
                let argc = *argc as usize;
                let args = stack.split_off(stack.len() - argc);
                let result = (builtin_table[*builtin].run)(args, io)?;
                stack.push(result);
            }
            Op::Ret => {
                let result = stack.pop().expect("stack underflow");
                let frame = frames.pop().expect("frame underflow");
                stack.truncate(frame.base);
                stack.push(result);
            }
        }
    }

    Ok(())
}

fn arith(
    stack: &mut Vec<Value>,
    op: &'static str,
    apply: fn(i64, i64) -> Option<i64>,
) -> Result<(), Fault> {
    let (a, b) = int_operands(stack, op)?;
    stack.push(Value::Int(apply(a, b).ok_or(Fault::Overflow)?));
    Ok(())
}

fn compare(
    stack: &mut Vec<Value>,
    op: &'static str,
    apply: fn(i64, i64) -> bool,
) -> Result<(), Fault> {
    let (a, b) = int_operands(stack, op)?;
    stack.push(Value::Bool(apply(a, b)));
    Ok(())
}

fn int_operands(stack: &mut Vec<Value>, op: &'static str) -> Result<(i64, i64), Fault> {
    let rhs = stack.pop().expect("stack underflow");
    let lhs = stack.pop().expect("stack underflow");
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok((a, b)),
        (lhs, rhs) => Err(Fault::TypeMismatch {
            op,
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }),
    }
}
