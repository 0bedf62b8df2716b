//! The Tarn engine.

use std::io::{self, Write};

use bumpalo::Bump;

use super::{EngineOptions, Error};
use crate::ast::Program;
use crate::diagnostics::{Catalog, Diagnostics};
use crate::interpreter::{Interpreter, Value};
use crate::parser::Parser;
use crate::prelude;
use crate::printer::Printer;

/// Parses and runs Tarn programs with a fixed configuration.
///
/// The engine owns no arena: each call borrows one from the caller, and
/// every node and value produced lives as long as that arena.
///
/// # Example
///
/// ```ignore
/// use tarn_core::api::{Engine, EngineOptions};
/// use tarn_core::diagnostics::Catalog;
/// use bumpalo::Bump;
///
/// let engine = Engine::new(EngineOptions::default(), Catalog::default());
/// let arena = Bump::new();
/// let mut diagnostics = engine.diagnostics();
///
/// let program = engine.parse(&arena, "var x = 1 x", &mut diagnostics).unwrap();
/// println!("{}", engine.render(&program));
/// ```
pub struct Engine {
    options: EngineOptions,
    catalog: Catalog,
}

impl Engine {
    pub fn new(options: EngineOptions, catalog: Catalog) -> Self {
        Self { options, catalog }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// A diagnostics engine using this engine's catalog, reporting through
    /// `tracing`. Replace the sink with [`Diagnostics::with_sink`].
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(self.catalog.clone()).with_preview_len(self.options.preview_len)
    }

    /// Parses `source`, after the prelude when it is enabled.
    pub fn parse<'a>(
        &self,
        arena: &'a Bump,
        source: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Program<'a>, Error> {
        let program = if self.options.prelude {
            prelude::parse_with_prelude(arena, source, diagnostics)?
        } else {
            Parser::new(arena, source, diagnostics).parse_program()?
        };
        tracing::debug!(
            items = program.items.len(),
            prelude = self.options.prelude,
            "parsed program"
        );
        Ok(program)
    }

    /// Parses and evaluates `source`, writing printed output to stdout.
    pub fn run<'a>(
        &self,
        arena: &'a Bump,
        source: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value<'a>, Error> {
        let stdout = io::stdout();
        let mut output = stdout.lock();
        let value = self.run_with_output(arena, source, diagnostics, &mut output)?;
        output.flush().map_err(crate::interpreter::RunError::from)?;
        Ok(value)
    }

    /// Parses and evaluates `source`, writing printed output to `output`.
    pub fn run_with_output<'a>(
        &self,
        arena: &'a Bump,
        source: &str,
        diagnostics: &mut Diagnostics,
        output: &mut dyn Write,
    ) -> Result<Value<'a>, Error> {
        let program = self.parse(arena, source, diagnostics)?;
        self.run_program(&program, diagnostics, output)
    }

    /// Evaluates a program returned by [`Engine::parse`].
    pub fn run_program<'a>(
        &self,
        program: &Program<'a>,
        diagnostics: &mut Diagnostics,
        output: &mut dyn Write,
    ) -> Result<Value<'a>, Error> {
        let mut interpreter =
            Interpreter::new(diagnostics, output).with_printer(self.printer());
        Ok(interpreter.run(program)?)
    }

    /// Renders `program` back to source text.
    pub fn render(&self, program: &Program<'_>) -> String {
        self.printer().program(program)
    }

    pub fn render_value(&self, value: &Value<'_>) -> String {
        self.printer().value(value)
    }

    fn printer(&self) -> Printer {
        Printer::new(self.options.braced_output)
    }
}
