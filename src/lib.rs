//! Tarn - a small dynamically typed scripting language
//!
//! # Overview
//!
//! Tarn programs are sequences of expressions evaluated in order. Every
//! operator is an ordinary function binding (the prelude binds `+` to a
//! closure over the `__plus` builtin), records are environments created from
//! `struct` templates, and control flow includes loops, `try`/`catch` and
//! `throw`.
//!
//! Misuse that a script can survive (an undeclared name, a wrong number of
//! arguments) is reported as a diagnostic with a configurable severity and
//! evaluation continues with a placeholder value.
//!
//! # Quick Start
//!
//! ```no_run
//! use tarn::{Bump, Catalog, Engine, EngineOptions};
//!
//! let engine = Engine::new(EngineOptions::default(), Catalog::default());
//! let arena = Bump::new();
//! let mut diagnostics = engine.diagnostics();
//!
//! let source = "var square = fn x => x * x\nsquare(7)";
//! let value = engine.run(&arena, source, &mut diagnostics).unwrap();
//! assert_eq!(engine.render_value(&value), "49");
//! ```
//!
//! # Diagnostics
//!
//! Diagnostics go to a [`Sink`]. The default sink logs through `tracing`;
//! [`AriadneSink`] renders each report against the program source.

mod error_renderer;

pub use bumpalo::Bump;
pub use error_renderer::{
    AriadneSink, render_diagnostic, render_error, render_error_to_string_no_color,
};
pub use tarn_core::api::{Engine, EngineOptions, Error};
pub use tarn_core::diagnostics::{
    Catalog, CollectSink, ConfigError, Diagnostic, DiagnosticKind, Diagnostics, Severity, Sink,
};
pub use tarn_core::interpreter::{RunError, Value};
pub use tarn_core::parser::ParseError;
pub use tarn_core::passes::{Resolution, Type, TypeTable, infer, resolve};

// Re-export the building blocks for tools that drive the stages directly.
pub use tarn_core::{ast, environment, interpreter, parser, passes, prelude, printer};
