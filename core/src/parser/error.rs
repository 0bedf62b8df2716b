use thiserror::Error;

use crate::diagnostics::Aborted;

/// Failures that stop parsing.
///
/// Most malformed input is reported as a diagnostic and replaced by an
/// `Error` node instead; only these end the parse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A `var` target or parameter is neither a name nor `name = value`.
    #[error("line {line}: declaration or identifier expected, found {found}")]
    DeclarationExpected { line: u32, found: String },

    #[error(transparent)]
    Aborted(#[from] Aborted),
}

impl ParseError {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParseError::DeclarationExpected { .. } => "DeclarationExpected",
            ParseError::Aborted(_) => "Aborted",
        }
    }
}
