//! Unit tests for the interpreter.

use bumpalo::Bump;
use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;
use crate::diagnostics::{Catalog, CollectSink, Diagnostic, Severity};
use crate::prelude;

/// What one run produced.
struct Outcome {
    result: Result<String, RunError>,
    output: String,
    diagnostics: Vec<Diagnostic>,
}

impl Outcome {
    fn value(&self) -> &str {
        match &self.result {
            Ok(value) => value,
            Err(e) => panic!("run failed with {}: {e}", e.kind_name()),
        }
    }

    fn error(&self) -> &'static str {
        match &self.result {
            Ok(value) => panic!("run succeeded with {value}"),
            Err(e) => e.kind_name(),
        }
    }

    fn codes(&self) -> Vec<&'static str> {
        self.diagnostics.iter().map(|d| d.code()).collect()
    }
}

struct Runner {
    catalog: Catalog,
}

impl Runner {
    fn new() -> Self {
        Self {
            catalog: Catalog::default(),
        }
    }

    fn severity(mut self, kind: DiagnosticKind, severity: Severity) -> Self {
        self.catalog.set_severity(kind, severity);
        self
    }

    fn run(&self, source: &str) -> Outcome {
        let arena = Bump::new();
        let sink = CollectSink::default();
        let mut diagnostics = Diagnostics::new(self.catalog.clone()).with_sink(sink.clone());
        let program = prelude::parse_with_prelude(&arena, source, &mut diagnostics)
            .expect("parsing failed");

        let mut output = Vec::new();
        let result = {
            let mut interpreter = Interpreter::new(&mut diagnostics, &mut output);
            interpreter.run(&program).map(|value| value.to_string())
        };
        Outcome {
            result,
            output: String::from_utf8(output).expect("output is UTF-8"),
            diagnostics: sink.take(),
        }
    }
}

fn run(source: &str) -> Outcome {
    Runner::new().run(source)
}

#[test]
fn test_literals_and_operators() {
    assert_eq!(run("1 + 2 * 3").value(), "7");
    assert_eq!(run("7 - 10").value(), "-3");
    assert_eq!(run("1 < 2 && 2 < 1").value(), "false");
    assert_eq!(run("[1, 2] == [1, 2]").value(), "true");
    assert_eq!(run("\"hi\"").value(), "\"hi\"");
    assert_eq!(run("()").value(), "void");
}

#[test]
fn test_operators_continue_across_lines() {
    let outcome = run(indoc! {"
        1 +
        2
    "});
    assert_eq!(outcome.value(), "3");
}

#[test]
fn test_big_integers() {
    assert_eq!(
        run("99999999999999999999 * 99999999999999999999").value(),
        "9999999999999999999800000000000000000001"
    );
}

#[test]
fn test_declarations_and_blocks() {
    let outcome = run(indoc! {"
        var a = 1
        { var a = 2; a = 3 }
        a
    "});
    assert_eq!(outcome.value(), "1");
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn test_uninitialised_declaration_is_void() {
    assert_eq!(run("var a\na").value(), "void");
}

#[test]
fn test_duplicate_declaration_is_fatal() {
    assert_eq!(run("var a = 1\nvar a = 2").error(), "DuplicateDeclaration");
}

#[test]
fn test_implicit_variable_yields_placeholder() {
    let outcome = run("missing");
    assert_eq!(outcome.value(), "<error: missing>");
    assert_eq!(outcome.codes(), ["E001"]);
    assert_eq!(outcome.diagnostics[0].message, "implicit variable missing");
}

#[test]
fn test_diagnostics_are_bound_to_their_node() {
    let arena = Bump::new();
    let sink = CollectSink::default();
    let mut diagnostics = Diagnostics::default().with_sink(sink.clone());
    let program = crate::parser::parse(&arena, "var f = fn a => a\nf(1, 2)\nmissing", &mut diagnostics)
        .expect("parsing failed");
    let mut output = Vec::new();
    Interpreter::new(&mut diagnostics, &mut output)
        .run(&program)
        .expect("run failed");

    let reported = sink.take();
    let codes: Vec<&str> = reported.iter().map(|d| d.code()).collect();
    assert_eq!(codes, ["E004", "E001"]);
    assert_eq!(reported[0].nodes, [program.items[1].id]);
    assert_eq!(reported[1].nodes, [program.items[2].id]);
}

#[test]
fn test_assignment_to_undeclared_name_declares_it() {
    let outcome = run("z = 3\nz");
    assert_eq!(outcome.value(), "3");
    assert_eq!(outcome.codes(), ["E001"]);
}

#[test]
fn test_placeholders_flow_through_operators() {
    let outcome = run("missing + 1");
    assert_eq!(outcome.value(), "<error: missing>");
    assert_eq!(outcome.codes(), ["E001"]);
}

#[test]
fn test_unbound_operator_still_evaluates_operands() {
    let outcome = run("print(1) % print(2)");
    assert_eq!(outcome.output, "1\n2\n");
    assert_eq!(outcome.codes(), ["E001"]);
    assert_eq!(outcome.diagnostics[0].message, "implicit variable %");
    assert!(outcome.value().starts_with("<error: "));
}

#[test]
fn test_no_effect_hint() {
    let outcome = run("1; 2");
    assert_eq!(outcome.value(), "2");
    assert_eq!(outcome.codes(), ["E002"]);
    assert_eq!(outcome.diagnostics[0].severity, Severity::Hint);
}

#[test]
fn test_error_severity_aborts() {
    let outcome = Runner::new()
        .severity(DiagnosticKind::ImplicitVariable, Severity::Error)
        .run("print(1)\nmissing\nprint(2)");
    assert_eq!(outcome.error(), "Aborted");
    assert_eq!(outcome.output, "1\n");
    assert_eq!(outcome.codes(), ["E002", "E001"]);
}

#[test]
fn test_suppressed_diagnostics_are_not_reported() {
    let outcome = Runner::new()
        .severity(DiagnosticKind::ImplicitVariable, Severity::None)
        .run("missing");
    assert_eq!(outcome.value(), "<error: missing>");
    assert!(outcome.diagnostics.is_empty());
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_record_assignment_copies() {
    let outcome = run(indoc! {"
        var Point = struct { var x = 0; var y = 0 }
        var r = new Point
        var s = r
        s.x = 5
        [r.x, s.x]
    "});
    assert_eq!(outcome.value(), "[0, 5]");
}

#[test]
fn test_nested_record_assignment_copies() {
    let outcome = run(indoc! {"
        var Inner = struct { var v = 1 }
        var Outer = struct { var inner = new Inner }
        var r = new Outer
        var s = r
        s.inner.v = 2
        [r.inner.v, s.inner.v]
    "});
    assert_eq!(outcome.value(), "[1, 2]");
}

#[test]
fn test_methods_update_their_own_instance() {
    let outcome = run(indoc! {"
        var Counter = struct {
            var n = 0
            var bump = fn { n = n + 1 }
        }
        var a = new Counter
        var b = a
        a.bump()
        a.bump()
        b.bump()
        [a.n, b.n]
    "});
    assert_eq!(outcome.value(), "[2, 1]");
}

#[test]
fn test_constructor_protocol() {
    let outcome = run(indoc! {"
        var T = struct {
            var x = 0
            var constructor = fn v { x = v }
        }
        var t = new T(5)
        t.x
    "});
    assert_eq!(outcome.value(), "5");
}

#[test]
fn test_new_with_trailing_member() {
    let outcome = run(indoc! {"
        var T = struct {
            var x = 0
            var constructor = fn v { x = v * 2 }
        }
        new T(21).x
    "});
    assert_eq!(outcome.value(), "42");
}

#[test]
fn test_constructor_must_be_a_function() {
    let outcome = run(indoc! {"
        var T = struct { var constructor = 1 }
        new T(1)
    "});
    assert_eq!(outcome.error(), "ConstructorNotFunction");
}

#[test]
fn test_records_do_not_close_over_locals() {
    let outcome = run(indoc! {"
        var make = fn {
            var local = 1
            new struct { var seen = local }
        }
        make()
    "});
    assert_eq!(outcome.value(), "new { seen = <error: local> }");
    assert_eq!(outcome.codes(), ["E001"]);
}

#[test]
fn test_import_merges_members() {
    let outcome = run(indoc! {"
        var Base = struct { var a = 1 }
        var base = new Base
        var Derived = struct { import base; var b = 2 }
        var d = new Derived
        d.a + d.b
    "});
    assert_eq!(outcome.value(), "3");
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn test_import_misuse_is_reported() {
    let outcome = run(indoc! {"
        var Base = struct { var a = 1 }
        import Base
    "});
    assert_eq!(outcome.codes(), ["E006"]);

    let outcome = run(indoc! {"
        var Base = struct { var a = 1 }
        var D = struct { import Base }
        new D
    "});
    assert_eq!(outcome.codes(), ["E008"]);

    let outcome = run(indoc! {"
        var n = 1
        var D = struct { import n }
        new D
    "});
    assert_eq!(outcome.codes(), ["E007"]);
}

#[test]
fn test_member_access_errors() {
    assert_eq!(run("var n = 1\nn.x").error(), "NotARecord");
    assert_eq!(
        run("var T = struct { var x = 0 }\nT.x").error(),
        "UninstantiatedRecord"
    );
    assert_eq!(run("new 1").error(), "NotATemplate");
    assert_eq!(run("1(2)").error(), "NotCallable");
}

#[test]
fn test_invalid_struct_item_is_fatal_at_construction() {
    let outcome = run("var S = struct { 1 }\nnew S");
    assert_eq!(outcome.error(), "InvalidStructItem");
    assert_eq!(outcome.codes(), ["P003"]);
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_closures_capture_by_reference() {
    crate::test_utils::init_test_logging();
    let outcome = run(indoc! {"
        var make = fn {
            var count = 0
            fn { count = count + 1; count }
        }
        var counter = make()
        counter()
        counter()
    "});
    assert_eq!(outcome.value(), "2");
}

#[test]
fn test_closure_sees_later_mutation() {
    let outcome = run(indoc! {"
        var x = 1
        var get = fn => x
        x = 2
        get()
    "});
    assert_eq!(outcome.value(), "2");
}

#[test]
fn test_not_enough_arguments() {
    let outcome = run(indoc! {"
        var f = fn a, b => a
        f(1)
    "});
    assert_eq!(outcome.value(), "1");
    assert_eq!(outcome.codes(), ["E003"]);
    assert_eq!(
        outcome.diagnostics[0].message,
        "not enough arguments in call f(1): missing parameter b"
    );
}

#[test]
fn test_too_many_arguments() {
    let outcome = run(indoc! {"
        var f = fn a => a
        f(1, 2)
    "});
    assert_eq!(outcome.value(), "1");
    assert_eq!(outcome.codes(), ["E004"]);
}

#[test]
fn test_defaults_see_earlier_parameters() {
    let outcome = run(indoc! {"
        var f = fn a, b = a + 1 => b
        [f(1), f(1, 5)]
    "});
    assert_eq!(outcome.value(), "[2, 5]");
}

#[test]
fn test_extension_receiver() {
    let outcome = run(indoc! {"
        var double = fn @receiver n => n * 2
        [21.double(), double(4)]
    "});
    assert_eq!(outcome.value(), "[42, 8]");
}

#[test]
fn test_return_leaves_function() {
    let outcome = run(indoc! {"
        var clamp = fn x {
            if x < 0 { return 0 }
            x
        }
        [clamp(-3), clamp(4)]
    "});
    assert_eq!(outcome.value(), "[0, 4]");
}

#[test]
fn test_top_level_return_ends_program() {
    let outcome = run("print(1)\nreturn 5\nprint(2)");
    assert_eq!(outcome.value(), "5");
    assert_eq!(outcome.output, "1\n");
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_conditionals() {
    assert_eq!(run("if 1 < 2 then 10 else 20").value(), "10");
    assert_eq!(run("if false { 1 }").value(), "void");

    let outcome = run("if 1 { 2 } else { 3 }");
    assert_eq!(outcome.value(), "3");
    assert_eq!(outcome.codes(), ["E005"]);
}

#[test]
fn test_repeat_with_guards() {
    let outcome = run(indoc! {"
        var i = 0
        var total = 0
        repeat {
            i = i + 1
            continue if i == 2
            total = total + i
            break if i == 4
        }
        total
    "});
    assert_eq!(outcome.value(), "8");
}

#[test]
fn test_foreach() {
    let outcome = run(indoc! {"
        var sum = 0
        foreach x in [1, 2, 3] { sum = sum + x }
        sum
    "});
    assert_eq!(outcome.value(), "6");

    let outcome = run("foreach x in 5 { x }");
    assert_eq!(outcome.value(), "void");
    assert_eq!(outcome.codes(), ["E012"]);
}

#[test]
fn test_break_outside_loop() {
    assert_eq!(run("var f = fn { break }\nf()").error(), "BreakOutsideLoop");
    assert_eq!(run("continue").error(), "ContinueOutsideLoop");
}

#[test]
fn test_try_catch_finally() {
    let outcome = run(indoc! {"
        var log = 0
        var r = try { throw 7 } catch e { e + 1 } finally { log = 1 }
        [r, log]
    "});
    assert_eq!(outcome.value(), "[8, 1]");
}

#[test]
fn test_throw_unwinds_scopes() {
    let outcome = run(indoc! {"
        var x = 1
        var fail = fn { var x = 100; throw x }
        try { var x = 2; fail() } catch e { x + e }
    "});
    assert_eq!(outcome.value(), "101");
}

#[test]
fn test_finally_runs_on_uncaught_throw() {
    let outcome = run("try { throw 1 } finally { print(2) }");
    assert_eq!(outcome.error(), "UncaughtThrow");
    assert_eq!(outcome.output, "2\n");
}

#[test]
fn test_assume_and_assert() {
    let outcome = run("assume 1 == 2\n3");
    assert_eq!(outcome.value(), "3");
    assert_eq!(outcome.codes(), ["E011"]);

    let outcome = run("assert 1 == 2\n3");
    assert_eq!(outcome.error(), "Aborted");
    assert_eq!(outcome.codes(), ["E010"]);

    assert!(run("assert 1 == 1").diagnostics.is_empty());
}

#[test]
fn test_goto_is_reported() {
    let outcome = run("label top\ngoto top\n1");
    assert_eq!(outcome.value(), "1");
    assert_eq!(outcome.codes(), ["E009", "E009"]);
}

// ============================================================================
// Builtins through the prelude
// ============================================================================

#[test]
fn test_prelude_functions() {
    assert_eq!(run("increment(41)").value(), "42");
    assert_eq!(run("identity('x')").value(), "'x'");
    assert_eq!(run("first([3, 4])").value(), "3");
    assert_eq!(run("rest([3, 4])").value(), "[4]");
    assert_eq!(run("add([1, 2], 2)").value(), "[1, 2]");
    assert_eq!(run("length(\"abc\")").value(), "3");
    assert_eq!(run("or(false, true)").value(), "true");
}

#[test]
fn test_print_writes_lines() {
    let outcome = run("print(\"hi\")\nprint([1, 2])");
    assert_eq!(outcome.value(), "void");
    assert_eq!(outcome.output, "\"hi\"\n[1, 2]\n");
}

#[test]
fn test_env_lists_record_members() {
    let outcome = run(indoc! {"
        var P = struct { var x = 1; var y = 2 }
        var p = new P
        __env(p)
    "});
    assert_eq!(outcome.value(), "void");
    assert!(outcome.output.starts_with("x = 1\ny = 2\n"));
    assert!(outcome.output.contains("\nidentity = fn x => x\n"));
}

#[test]
fn test_builtin_errors() {
    assert_eq!(run("__nope(1)").error(), "UnknownBuiltin");
    assert_eq!(run("__plus(true, 1)").error(), "BuiltinArgument");
    assert_eq!(run("at([1], 3)").error(), "IndexOutOfBounds");
}
