//! Integration tests for the compile/execute pipeline.
//!
//! Tests cover the compile gate, execution with captured I/O, runtime
//! faults, execution limits, and multi-file submissions.

use kiln_compiler::{analyze, compile, run, Fault, RunIo, RunLimits};
use kiln_core::{Severity, SourceFile, Submission};

// ============================================================================
// Helper Functions
// ============================================================================

fn run_ok(submission: &Submission) -> String {
    let artifact = compile(submission).expect("compiles");
    let mut io = RunIo::new(submission.stdin.clone().unwrap_or_default());
    run(&artifact, &mut io, &RunLimits::default()).expect("runs");
    io.into_output()
}

fn run_fault(source: &str) -> Fault {
    let submission = Submission::single("main.kiln", source);
    let artifact = compile(&submission).expect("compiles");
    let mut io = RunIo::new("");
    run(&artifact, &mut io, &RunLimits::default()).expect_err("faults")
}

// ============================================================================
// Compile Gate
// ============================================================================

#[test]
fn test_syntax_error_fails_compilation() {
    let errors = compile(&Submission::single("main.kiln", "fn main( {")).unwrap_err();
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|d| d.severity == Severity::Error));
}

#[test]
fn test_semantic_error_fails_compilation() {
    let errors =
        compile(&Submission::single("main.kiln", "fn main() { println(x); }")).unwrap_err();
    assert!(errors.iter().any(|d| d.message.contains("unknown variable `x`")));
}

#[test]
fn test_warnings_alone_do_not_fail_compilation() {
    let submission = Submission::single("main.kiln", "fn main() { let unused = 1; }");
    let analysis = analyze(&submission);
    assert!(analysis
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning));
    assert!(compile(&submission).is_ok());
}

#[test]
fn test_diagnostics_render_one_based_positions() {
    let errors =
        compile(&Submission::single("main.kiln", "fn main() {\n    println(x);\n}")).unwrap_err();
    let rendered = errors[0].to_string();
    assert!(
        rendered.starts_with("main.kiln(2,"),
        "unexpected rendering: {rendered}"
    );
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_hello_world() {
    let submission = Submission::single("main.kiln", r#"fn main() { println("hello"); }"#);
    assert_eq!(run_ok(&submission), "hello\n");
}

#[test]
fn test_read_line_echo() {
    let source = r#"
fn main() {
    println("What is your name?");
    let name = read_line();
    println("Hello, " + name + "!");
}
"#;
    let submission = Submission::single("main.kiln", source).with_stdin("Ada\n");
    assert_eq!(run_ok(&submission), "What is your name?\nHello, Ada!\n");
}

#[test]
fn test_arithmetic_over_stdin() {
    let source = r#"
fn main() {
    let n = int(read_line());
    println(str(n * n));
}
"#;
    let submission = Submission::single("main.kiln", source).with_stdin("5\n");
    assert_eq!(run_ok(&submission), "25\n");
}

#[test]
fn test_loop_and_conditionals() {
    let source = r#"
fn main() {
    let i = 1;
    while i <= 5 {
        if i % 2 == 0 {
            println(str(i) + " even");
        } else {
            println(str(i) + " odd");
        }
        i = i + 1;
    }
}
"#;
    let output = run_ok(&Submission::single("main.kiln", source));
    assert_eq!(output, "1 odd\n2 even\n3 odd\n4 even\n5 odd\n");
}

#[test]
fn test_recursion() {
    let source = r#"
fn fib(n) {
    if n < 2 {
        return n;
    }
    return fib(n - 1) + fib(n - 2);
}

fn main() {
    println(fib(10));
}
"#;
    assert_eq!(run_ok(&Submission::single("main.kiln", source)), "55\n");
}

#[test]
fn test_multi_file_cross_calls() {
    let submission = Submission::new(vec![
        SourceFile::new(
            "util.kiln",
            "fn double(n) { return n * 2; }",
        ),
        SourceFile::new(
            "main.kiln",
            "fn main() { println(double(21)); }",
        ),
    ]);
    assert_eq!(run_ok(&submission), "42\n");
}

#[test]
fn test_no_main_across_files_is_an_error() {
    let submission = Submission::new(vec![
        SourceFile::new("a.kiln", "fn a() { }"),
        SourceFile::new("b.kiln", "fn b() { }"),
    ]);
    let errors = compile(&submission).unwrap_err();
    assert!(errors[0].message.contains("no entry point"));
}

// ============================================================================
// Faults and Limits
// ============================================================================

#[test]
fn test_division_by_zero_faults() {
    let fault = run_fault("fn main() { let x = 1 / 0; println(x); }");
    assert_eq!(fault, Fault::DivisionByZero);
    assert_eq!(fault.to_string(), "attempted to divide by zero");
}

#[test]
fn test_read_past_end_of_input_faults() {
    let fault = run_fault("fn main() { let line = read_line(); println(line); }");
    assert_eq!(fault, Fault::EndOfInput);
}

#[test]
fn test_infinite_loop_runs_out_of_fuel() {
    let artifact =
        compile(&Submission::single("main.kiln", "fn main() { while true { } }")).expect("compiles");
    let mut io = RunIo::new("");
    let limits = RunLimits {
        fuel: Some(10_000),
        ..RunLimits::default()
    };
    let fault = run(&artifact, &mut io, &limits).expect_err("faults");
    assert_eq!(fault, Fault::OutOfFuel);
}

#[test]
fn test_unbounded_recursion_overflows_the_call_stack() {
    let fault = run_fault("fn loop_forever() { loop_forever(); }\nfn main() { loop_forever(); }");
    assert_eq!(fault, Fault::StackOverflow);
}

#[test]
fn test_output_before_fault_is_preserved() {
    let submission =
        Submission::single("main.kiln", r#"fn main() { println("before"); let x = 1 / 0; println(x); }"#);
    let artifact = compile(&submission).expect("compiles");
    let mut io = RunIo::new("");
    assert!(run(&artifact, &mut io, &RunLimits::default()).is_err());
    assert_eq!(io.output(), "before\n");
}

// ============================================================================
// Isolation
// ============================================================================

#[test]
fn test_concurrent_runs_do_not_share_io() {
    let source = r#"
fn main() {
    let tag = read_line();
    let i = 0;
    while i < 100 {
        println(tag);
        i = i + 1;
    }
}
"#;
    let artifact = compile(&Submission::single("main.kiln", source)).expect("compiles");

    let handles: Vec<_> = ["alpha", "beta"]
        .into_iter()
        .map(|tag| {
            let artifact = artifact.clone();
            std::thread::spawn(move || {
                let mut io = RunIo::new(format!("{tag}\n"));
                run(&artifact, &mut io, &RunLimits::default()).expect("runs");
                (tag, io.into_output())
            })
        })
        .collect();

    for handle in handles {
        let (tag, output) = handle.join().expect("thread completes");
        let expected = format!("{tag}\n").repeat(100);
        assert_eq!(output, expected, "run `{tag}` saw foreign output");
    }
}
