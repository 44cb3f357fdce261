//! The fixed reference set: builtins linked into every compiled and
//! analyzed unit.
//!
//! The table is process-wide, lazily initialized exactly once, and
//! read-only after that, so concurrent compilations and runs share it
//! freely without locking.

use crate::vm::{Fault, RunIo, Value};
use std::sync::LazyLock;

/// A builtin function.
pub struct Builtin {
    /// The callable name.
    pub name: &'static str,
    /// Number of arguments.
    pub arity: usize,
    /// Signature string shown in completion detail and hover.
    pub signature: &'static str,
    /// Markdown documentation.
    pub doc: &'static str,
    /// The implementation.
    pub run: fn(Vec<Value>, &mut RunIo) -> Result<Value, Fault>,
}

static BUILTINS: LazyLock<Vec<Builtin>> = LazyLock::new(|| {
    vec![
        Builtin {
            name: "print",
            arity: 1,
            signature: "fn print(value)",
            doc: "Writes `value` to the output without a trailing newline.",
            run: |args, io| {
                io.write(&args[0].to_string());
                Ok(Value::Unit)
            },
        },
        Builtin {
            name: "println",
            arity: 1,
            signature: "fn println(value)",
            doc: "Writes `value` to the output followed by a newline.",
            run: |args, io| {
                io.write(&args[0].to_string());
                io.write("\n");
                Ok(Value::Unit)
            },
        },
        Builtin {
            name: "read_line",
            arity: 0,
            signature: "fn read_line() -> str",
            doc: "Reads one line from the input, without the newline. \
                  Faults when no input is left.",
            run: |_args, io| io.read_line().map(Value::Str),
        },
        Builtin {
            name: "len",
            arity: 1,
            signature: "fn len(s: str) -> int",
            doc: "Returns the length of a string in bytes.",
            run: |mut args, _io| match args.remove(0) {
                Value::Str(s) => Ok(Value::Int(s.len() as i64)),
                other => Err(Fault::BuiltinType {
                    builtin: "len",
                    expected: "str",
                    found: other.type_name(),
                }),
            },
        },
        Builtin {
            name: "int",
            arity: 1,
            signature: "fn int(s: str) -> int",
            doc: "Parses a string as a 64-bit integer. \
                  Faults when the string is not a valid integer.",
            run: |mut args, _io| match args.remove(0) {
                Value::Int(v) => Ok(Value::Int(v)),
                Value::Str(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| Fault::IntParse(s)),
                other => Err(Fault::BuiltinType {
                    builtin: "int",
                    expected: "str",
                    found: other.type_name(),
                }),
            },
        },
        Builtin {
            name: "str",
            arity: 1,
            signature: "fn str(value) -> str",
            doc: "Converts any value to its string representation.",
            run: |args, _io| Ok(Value::Str(args[0].to_string())),
        },
    ]
});

/// The builtin table, initialized on first use.
pub fn builtins() -> &'static [Builtin] {
    &BUILTINS
}

/// Look up a builtin by name, returning its table index.
pub fn lookup(name: &str) -> Option<(usize, &'static Builtin)> {
    builtins()
        .iter()
        .enumerate()
        .find(|(_, b)| b.name == name)
}
