//! Front end and tree-walking interpreter for the Tarn scripting language.
//!
//! The pipeline is [`parser`] (source to arena-allocated [`ast`]), optionally
//! the analysis [`passes`], then the [`interpreter`]. Misuse found along the
//! way is reported through [`diagnostics`]; the [`api`] module wires the
//! stages together.

pub mod api;
pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod interpreter;
pub mod parser;
pub mod passes;
pub mod prelude;
pub mod printer;
pub mod scope_stack;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_closures() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
