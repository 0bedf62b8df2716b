//! Public error type for the Tarn API.
//!
//! Each stage keeps its own error type; they are wrapped here at the API
//! boundary so callers handle one enum.

use thiserror::Error;

use crate::diagnostics::ConfigError;
use crate::interpreter::RunError;
use crate::parser::ParseError;

#[derive(Debug, Error)]
pub enum Error {
    /// The program could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Evaluation hit a fatal error.
    #[error(transparent)]
    Run(#[from] RunError),

    /// A message or severity table could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the run stopped on a diagnostic configured as an error.
    ///
    /// That diagnostic has already gone to the sink, so callers should not
    /// report it again.
    pub fn is_aborted(&self) -> bool {
        matches!(
            self,
            Error::Parse(ParseError::Aborted(_)) | Error::Run(RunError::Aborted(_))
        )
    }

    /// Stable name of the failure, such as `NotARecord`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Parse(e) => e.kind_name(),
            Error::Run(e) => e.kind_name(),
            Error::Config(ConfigError::MalformedLine { .. }) => "MalformedLine",
            Error::Config(ConfigError::UnknownCode { .. }) => "UnknownCode",
            Error::Config(ConfigError::UnknownSeverity { .. }) => "UnknownSeverity",
        }
    }
}
