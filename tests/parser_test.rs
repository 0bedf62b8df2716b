//! Parsing and rendering through the public engine.

use indoc::indoc;
use pretty_assertions::assert_eq;
use tarn::{Bump, Catalog, Engine, EngineOptions};

fn render(source: &str, braced_output: bool) -> String {
    let engine = Engine::new(
        EngineOptions {
            prelude: false,
            braced_output,
            ..EngineOptions::default()
        },
        Catalog::default(),
    );
    let arena = Bump::new();
    let mut diagnostics = engine.diagnostics();
    let program = engine
        .parse(&arena, source, &mut diagnostics)
        .unwrap_or_else(|e| panic!("parsing failed: {source}\n{e}"));
    engine.render(&program)
}

#[test]
fn braced_rendering_disambiguates_precedence() {
    let cases = [
        ("1 + 2 * 3", "(1 + (2 * 3))"),
        ("a * b + c", "((a * b) + c)"),
        ("a * b * c + d * e * f + g", "((((a * b) * c) + ((d * e) * f)) + g)"),
        ("a : Int = 1 + 2", "(a : Int = (1 + 2))"),
        ("a = b = c", "(a = (b = c))"),
    ];
    for (source, expected) in cases {
        assert_eq!(render(source, true), expected, "rendering {source:?}");
    }
}

#[test]
fn spacing_does_not_change_the_tree() {
    assert_eq!(render("a*b+c", true), render("a  *  b\n  + c", true));
}

#[test]
fn whitespace_only_programs_are_empty() {
    assert_eq!(render(" 123  456 ", false), "123\n456");
    assert_eq!(render("", false), "");
    assert_eq!(render(" \n\t ", false), "");
}

#[test]
fn rendering_is_stable() {
    let source = indoc! {"
        var Point = struct { var x = 0; var y = 0 }
        var f = fn a, b = 2 => a * (b + 1)
        if f(1) < 10 { print(1) } else { print(2) }
        foreach i in [1, 2] { break if i }
    "};
    let once = render(source, false);
    assert_eq!(render(&once, false), once);
}

#[test]
fn prelude_is_rendered_in_front_of_the_program() {
    let engine = Engine::new(EngineOptions::default(), Catalog::default());
    let arena = Bump::new();
    let mut diagnostics = engine.diagnostics();
    let program = engine.parse(&arena, "1", &mut diagnostics).unwrap();
    let rendered = engine.render(&program);

    assert!(rendered.starts_with("var identity = fn x => x\n"));
    assert!(rendered.ends_with("\n1"));
}
