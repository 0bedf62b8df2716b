//! Shared harness for the end-to-end tests.
//!
//! Each test runs one program through the public [`tarn::Engine`] with the
//! prelude enabled and compares the rendered final value, the printed output
//! and the codes of the diagnostics raised.

use tarn::{Bump, Catalog, CollectSink, DiagnosticKind, Engine, EngineOptions, Severity};

pub struct Outcome {
    /// Rendered final value, or the kind name of the fatal error.
    pub value: Result<String, &'static str>,
    pub output: String,
    pub codes: Vec<&'static str>,
}

pub fn run(source: &str) -> Outcome {
    run_with(source, &[])
}

pub fn run_with(source: &str, severities: &[(DiagnosticKind, Severity)]) -> Outcome {
    let mut catalog = Catalog::default();
    for (kind, severity) in severities {
        catalog.set_severity(*kind, *severity);
    }
    let engine = Engine::new(EngineOptions::default(), catalog);
    let arena = Bump::new();
    let sink = CollectSink::default();
    let mut diagnostics = engine.diagnostics().with_sink(sink.clone());
    let mut output = Vec::new();
    let value = engine
        .run_with_output(&arena, source, &mut diagnostics, &mut output)
        .map(|value| engine.render_value(&value))
        .map_err(|e| e.kind_name());
    Outcome {
        value,
        output: String::from_utf8(output).expect("output is UTF-8"),
        codes: sink.take().iter().map(|d| d.code()).collect(),
    }
}

/// Declares a test running `input` and checking its outcome.
///
/// `value` is the rendered final value; `error` the kind name of a fatal
/// error. `output` and `codes` are checked only when given.
macro_rules! test_case {
    (
        $name:ident,
        input: $input:expr,
        value: $value:expr
        $(, output: $output:expr)?
        $(, codes: $codes:expr)?
        $(,)?
    ) => {
        #[test]
        fn $name() {
            let outcome = $crate::cases::run($input);
            pretty_assertions::assert_eq!(outcome.value.as_deref(), Ok($value), "value of {:?}", $input);
            $(pretty_assertions::assert_eq!(outcome.output, $output);)?
            $(
                let expected: &[&str] = &$codes;
                pretty_assertions::assert_eq!(outcome.codes.as_slice(), expected);
            )?
        }
    };
    (
        $name:ident,
        input: $input:expr,
        error: $error:expr
        $(, output: $output:expr)?
        $(, codes: $codes:expr)?
        $(,)?
    ) => {
        #[test]
        fn $name() {
            let outcome = $crate::cases::run($input);
            pretty_assertions::assert_eq!(outcome.value, Err($error), "error of {:?}", $input);
            $(pretty_assertions::assert_eq!(outcome.output, $output);)?
            $(
                let expected: &[&str] = &$codes;
                pretty_assertions::assert_eq!(outcome.codes.as_slice(), expected);
            )?
        }
    };
}
