//! Public API for running Tarn programs.
//!
//! The [`Engine`] bundles the configuration a run needs (options and the
//! diagnostic catalog) and drives the pipeline: parse the prelude and the
//! program into one arena, then evaluate them in a shared global scope.
//!
//! # Example
//!
//! ```ignore
//! use tarn_core::api::{Engine, EngineOptions};
//! use tarn_core::diagnostics::Catalog;
//! use bumpalo::Bump;
//!
//! let engine = Engine::new(EngineOptions::default(), Catalog::default());
//! let arena = Bump::new();
//! let mut diagnostics = engine.diagnostics();
//! let mut output = Vec::new();
//! let value = engine
//!     .run_with_output(&arena, "print(1 + 2)\n40 + 2", &mut diagnostics, &mut output)
//!     .unwrap();
//! assert_eq!(engine.render_value(&value), "42");
//! assert_eq!(output, b"3\n");
//! ```

pub mod engine;
pub mod error;
pub mod options;

pub use engine::Engine;
pub use error::Error;
pub use options::EngineOptions;
