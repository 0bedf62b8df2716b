//! Error rendering using ariadne
//!
//! Diagnostics carry a line number only, so each report underlines the whole
//! offending line of the source.

use std::io::Write;
use std::ops::Range;

use ariadne::{ColorGenerator, Config, IndexType, Label, Report, ReportKind, Source};
use tarn_core::api::Error;
use tarn_core::diagnostics::{Diagnostic, Severity, Sink};
use tarn_core::interpreter::RunError;
use tarn_core::parser::ParseError;

/// Render a diagnostic with a snippet of `source`.
///
/// # Example
/// ```no_run
/// use tarn::{Diagnostic, DiagnosticKind, Severity, render_diagnostic};
///
/// let diagnostic = Diagnostic {
///     kind: DiagnosticKind::ImplicitVariable,
///     severity: Severity::Warning,
///     line: 1,
///     nodes: Vec::new(),
///     message: "implicit variable x".to_string(),
/// };
/// render_diagnostic("x + 1", "main.tarn", &diagnostic, &mut std::io::stderr(), true).unwrap();
/// ```
pub fn render_diagnostic(
    source: &str,
    name: &str,
    diagnostic: &Diagnostic,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::None | Severity::Hint | Severity::Suggestion => ReportKind::Advice,
    };
    let span = line_span(source, diagnostic.line);

    Report::build(kind, (name, span.clone()))
        .with_config(
            Config::default()
                .with_color(use_color)
                .with_index_type(IndexType::Byte),
        )
        .with_code(diagnostic.code())
        .with_message(&diagnostic.message)
        .with_label(
            Label::new((name, span))
                .with_message(format!("{} reported here", diagnostic.severity))
                .with_color(colors.next()),
        )
        .finish()
        .write((name, Source::from(source)), &mut *writer)
}

/// Render a fatal error.
///
/// Aborts and parse errors point into `source`; evaluation errors have no
/// location and are printed as `error[Kind]: message`.
pub fn render_error(
    source: &str,
    name: &str,
    error: &Error,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error {
        Error::Parse(ParseError::Aborted(aborted)) | Error::Run(RunError::Aborted(aborted)) => {
            render_diagnostic(source, name, &aborted.0, writer, use_color)
        }
        Error::Parse(ParseError::DeclarationExpected { line, .. }) => {
            let span = line_span(source, *line);
            Report::build(ReportKind::Error, (name, span.clone()))
                .with_config(
                    Config::default()
                        .with_color(use_color)
                        .with_index_type(IndexType::Byte),
                )
                .with_message(error.to_string())
                .with_label(Label::new((name, span)).with_message(error.kind_name()))
                .finish()
                .write((name, Source::from(source)), &mut *writer)
        }
        _ => writeln!(writer, "error[{}]: {}", error.kind_name(), error),
    }
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(source: &str, name: &str, error: &Error) -> String {
    let mut buf = Vec::new();
    render_error(source, name, error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// A diagnostics sink that renders every report to stderr with ariadne.
pub struct AriadneSink {
    name: String,
    source: String,
    use_color: bool,
}

impl AriadneSink {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            use_color: true,
        }
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }
}

impl Sink for AriadneSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        let mut stderr = std::io::stderr();
        if render_diagnostic(&self.source, &self.name, diagnostic, &mut stderr, self.use_color)
            .is_err()
        {
            tracing::warn!(code = diagnostic.code(), "failed to render diagnostic");
        }
    }
}

/// Byte range of the 1-based `line` of `source`, without its line break.
///
/// Lines past the end map to an empty range at the end of the source.
fn line_span(source: &str, line: u32) -> Range<usize> {
    let mut start = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line as usize {
            let end = start + text.trim_end_matches(['\r', '\n']).len();
            return start..end;
        }
        start += text.len();
    }
    source.len()..source.len()
}
