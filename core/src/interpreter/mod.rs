//! Tree-walking interpreter for Tarn programs.
//!
//! The [`Interpreter`] evaluates a parsed [`Program`] against a chain of
//! [`Environment`]s and produces a [`Value`].
//!
//! ## Design
//!
//! - **Two error tiers**: expected misuse (undeclared names, arity mismatches,
//!   non-boolean conditions) is reported through the diagnostics engine and
//!   evaluation continues with a placeholder value. Structural impossibilities
//!   (calling an integer, member access on a non-record) are [`RunError`]s and
//!   end the run.
//! - **Scopes are restored on every exit**: the current environment is swapped
//!   in and out by one helper, so errors and `break`/`return`/`throw` unwinding
//!   never leave a callee's scope installed.
//! - **Records are environments**: `new` creates a frame parented to the global
//!   scope and evaluates the struct's members into it. Assigning an instance
//!   copies it.
//!
//! ## Example
//!
//! ```ignore
//! let arena = Bump::new();
//! let mut diagnostics = Diagnostics::default();
//! let program = parser::parse(&arena, "var x = 2 x", &mut diagnostics)?;
//! let mut output = Vec::new();
//! let mut interpreter = Interpreter::new(&mut diagnostics, &mut output);
//! assert_eq!(interpreter.run(&program)?, Value::int(2));
//! ```

pub mod builtins;
mod error;
mod eval;
mod value;

#[cfg(test)]
mod eval_test;

pub use error::RunError;
pub use value::{Closure, Instance, Pending, Placeholder, Value};

pub(crate) use error::{Control, Flow};

use std::io::Write;

use crate::ast::{Expr, Program};
use crate::diagnostics::{Aborted, DiagnosticKind, Diagnostics};
use crate::environment::Environment;
use crate::printer::Printer;

pub struct Interpreter<'a, 'r> {
    global: Environment<'a>,
    env: Environment<'a>,
    diagnostics: &'r mut Diagnostics,
    output: &'r mut dyn Write,
    printer: Printer,
}

impl<'a, 'r> Interpreter<'a, 'r> {
    /// An interpreter with an empty global environment.
    pub fn new(diagnostics: &'r mut Diagnostics, output: &'r mut dyn Write) -> Self {
        Self::with_global(Environment::new(), diagnostics, output)
    }

    pub fn with_global(
        global: Environment<'a>,
        diagnostics: &'r mut Diagnostics,
        output: &'r mut dyn Write,
    ) -> Self {
        Self {
            env: global.clone(),
            global,
            diagnostics,
            output,
            printer: Printer::default(),
        }
    }

    /// Sets how `__print` renders values.
    pub fn with_printer(mut self, printer: Printer) -> Self {
        self.printer = printer;
        self
    }

    pub fn global(&self) -> &Environment<'a> {
        &self.global
    }

    /// Evaluates the items of `program` directly in the global environment.
    ///
    /// The result is the value of the last item, or of a top-level `return`.
    pub fn run(&mut self, program: &Program<'a>) -> Result<Value<'a>, RunError> {
        tracing::debug!(items = program.items.len(), "evaluating program");
        self.env = self.global.clone();
        let result = self.eval_items(program.items).or_else(Control::settle);
        self.env = self.global.clone();
        result
    }

    /// Runs `f` with `env` as the current environment, then restores the
    /// previous one whatever `f` returned.
    fn with_env<T>(&mut self, env: Environment<'a>, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = core::mem::replace(&mut self.env, env);
        let result = f(self);
        self.env = saved;
        result
    }

    /// Reports `kind` against `node`.
    fn emit(
        &mut self,
        kind: DiagnosticKind,
        node: &Expr<'a>,
        args: &[&dyn core::fmt::Display],
    ) -> Result<(), Aborted> {
        self.diagnostics.emit_at(kind, node.line, &[node.id], args)
    }

    fn write_line(&mut self, text: &str) -> Result<(), RunError> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }
}
