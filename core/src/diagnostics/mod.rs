//! Classified, severity-controlled reports about parsing and evaluation.
//!
//! Callers emit a [`DiagnosticKind`] together with the source line, the ids of
//! the AST nodes it is bound to, and the things it talks about (usually nodes
//! or values, anything `Display`). The engine looks up the kind's template and severity in its [`Catalog`],
//! renders a [`Diagnostic`], and hands it to the installed [`Sink`].
//!
//! Below `Error` severity emission always succeeds and the caller keeps going
//! with a placeholder. At `Error` severity [`Diagnostics::emit`] returns
//! [`Aborted`], which unwinds the whole run; the diagnostic has already been
//! reported by then, so the entry point must not print it again.

mod catalog;
mod kind;

pub use catalog::{Catalog, ConfigError};
pub use kind::{DiagnosticKind, Severity};

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::ast::NodeId;

/// Default number of characters of each rendered argument kept in a message.
pub const DEFAULT_PREVIEW_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub line: u32,
    /// The AST nodes the diagnostic is about. Empty for problems found at
    /// the cursor before any node exists, such as an unterminated comment.
    pub nodes: Vec<NodeId>,
    pub message: String,
}

impl Diagnostic {
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (line {}): {} [{}]",
            self.severity,
            self.line,
            self.message,
            self.code()
        )
    }
}

/// A diagnostic at `Error` severity stopped the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("run aborted by {0}")]
pub struct Aborted(pub Diagnostic);

/// Destination for reported diagnostics.
pub trait Sink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Logs diagnostics through `tracing`. This is the default sink.
#[derive(Debug, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn report(&mut self, d: &Diagnostic) {
        match d.severity {
            Severity::Error => tracing::error!(code = d.code(), line = d.line, "{}", d.message),
            Severity::Warning => tracing::warn!(code = d.code(), line = d.line, "{}", d.message),
            _ => tracing::info!(code = d.code(), line = d.line, "{}", d.message),
        }
    }
}

/// Prints `severity (line N): message [code]` to stderr.
#[derive(Debug, Default)]
pub struct StderrSink;

impl Sink for StderrSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        eprintln!("{}", diagnostic);
    }
}

/// Collects diagnostics into a buffer shared with the caller.
#[derive(Debug, Default, Clone)]
pub struct CollectSink(pub Rc<RefCell<Vec<Diagnostic>>>);

impl CollectSink {
    pub fn take(&self) -> Vec<Diagnostic> {
        core::mem::take(&mut *self.0.borrow_mut())
    }
}

impl Sink for CollectSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.0.borrow_mut().push(diagnostic.clone());
    }
}

/// The emission side of the diagnostics engine.
pub struct Diagnostics {
    catalog: Catalog,
    preview_len: usize,
    sink: Box<dyn Sink>,
    emitted: Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(Catalog::default())
    }
}

impl Diagnostics {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            preview_len: DEFAULT_PREVIEW_LEN,
            sink: Box::new(TracingSink),
            emitted: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Every diagnostic reported so far, in emission order.
    pub fn emitted(&self) -> &[Diagnostic] {
        &self.emitted
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.emitted.iter().filter(|d| d.kind == kind).count()
    }

    /// Reports `kind` at `line`, substituting `args` into the template.
    pub fn emit(
        &mut self,
        kind: DiagnosticKind,
        line: u32,
        args: &[&dyn fmt::Display],
    ) -> Result<(), Aborted> {
        self.emit_at(kind, line, &[], args)
    }

    /// Like [`Diagnostics::emit`], binding the report to `nodes`.
    pub fn emit_at(
        &mut self,
        kind: DiagnosticKind,
        line: u32,
        nodes: &[NodeId],
        args: &[&dyn fmt::Display],
    ) -> Result<(), Aborted> {
        let severity = self.catalog.severity(kind);
        if severity == Severity::None {
            return Ok(());
        }

        let rendered: Vec<String> = args
            .iter()
            .map(|arg| preview(&arg.to_string(), self.preview_len))
            .collect();
        let diagnostic = Diagnostic {
            kind,
            severity,
            line,
            nodes: nodes.to_vec(),
            message: substitute(self.catalog.template(kind), &rendered),
        };

        self.sink.report(&diagnostic);
        self.emitted.push(diagnostic.clone());

        if severity == Severity::Error {
            Err(Aborted(diagnostic))
        } else {
            Ok(())
        }
    }
}

/// Flattens `text` onto one line and cuts it to `max` characters.
fn preview(text: &str, max: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max {
        flat
    } else {
        let mut cut: String = flat.chars().take(max).collect();
        cut.push_str("...");
        cut
    }
}

/// Replaces `{N}` with `args[N]`. Placeholders without an argument are kept.
fn substitute(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            Some((args.get(index)?, close))
        });
        match replaced {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_substitute() {
        let args = ["x".to_string(), "y".to_string()];
        assert_eq!(substitute("{0} and {1}", &args), "x and y");
        assert_eq!(substitute("{1}{0}{1}", &args), "yxy");
        assert_eq!(substitute("{2} {name}", &args), "{2} {name}");
        assert_eq!(substitute("no braces", &args), "no braces");
    }

    #[test]
    fn test_preview_truncates_and_flattens() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("a\nb", 10), "a b");
        assert_eq!(preview("abcdefghijkl", 5), "abcde...");
    }

    #[test]
    fn test_emit_records_and_forwards() {
        let sink = CollectSink::default();
        let mut diagnostics = Diagnostics::default().with_sink(sink.clone());

        diagnostics
            .emit(DiagnosticKind::ImplicitVariable, 3, &[&"count"])
            .unwrap();

        let reported = sink.take();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].message, "implicit variable count");
        assert_eq!(reported[0].line, 3);
        assert_eq!(reported[0].severity, Severity::Warning);
        assert!(reported[0].nodes.is_empty());
        assert_eq!(diagnostics.emitted(), &reported[..]);
        assert_eq!(
            reported[0].to_string(),
            "warning (line 3): implicit variable count [E001]"
        );
    }

    #[test]
    fn test_emit_at_binds_nodes() {
        let mut diagnostics = Diagnostics::default();
        diagnostics
            .emit_at(
                DiagnosticKind::TooManyArguments,
                2,
                &[NodeId(7)],
                &[&"f(1, 2)", &1],
            )
            .unwrap();
        let reported = &diagnostics.emitted()[0];
        assert_eq!(reported.nodes, [NodeId(7)]);
        assert_eq!(reported.line, 2);
    }

    #[test]
    fn test_error_severity_aborts() {
        let mut catalog = Catalog::default();
        catalog.set_severity(DiagnosticKind::NoEffect, Severity::Error);
        let mut diagnostics = Diagnostics::new(catalog);

        let err = diagnostics
            .emit(DiagnosticKind::NoEffect, 1, &[&42])
            .unwrap_err();
        assert_eq!(err.0.message, "expression 42 has no effect");
        assert_eq!(diagnostics.count(DiagnosticKind::NoEffect), 1);
    }

    #[test]
    fn test_none_severity_suppresses() {
        let mut catalog = Catalog::default();
        catalog.set_severity(DiagnosticKind::NoEffect, Severity::None);
        let sink = CollectSink::default();
        let mut diagnostics = Diagnostics::new(catalog).with_sink(sink.clone());

        diagnostics.emit(DiagnosticKind::NoEffect, 1, &[&1]).unwrap();
        assert!(sink.take().is_empty());
        assert!(diagnostics.emitted().is_empty());
    }

    #[test]
    fn test_preview_length_applies_to_arguments() {
        let mut diagnostics = Diagnostics::default().with_preview_len(4);
        diagnostics
            .emit(DiagnosticKind::ImplicitVariable, 1, &[&"abcdefgh"])
            .unwrap();
        assert_eq!(diagnostics.emitted()[0].message, "implicit variable abcd...");
    }
}
