//! Fatal evaluation failures and non-local control flow.
//!
//! A [`RunError`] means the program cannot sensibly continue: a member access
//! on something that is not a record, a call of something that is not a
//! function, a duplicate declaration. These always end the run. Expected
//! misuse is reported as a diagnostic instead and does not appear here.

use thiserror::Error;

use super::Value;
use crate::diagnostics::Aborted;
use crate::environment::EnvError;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("member access on {0}, which is not a record instance")]
    NotARecord(String),

    #[error("member access on {0}, a struct that has not been instantiated")]
    UninstantiatedRecord(String),

    #[error("expected identifier after '.', found {0}")]
    ExpectedIdentifier(String),

    #[error("{0} is not callable")]
    NotCallable(String),

    #[error("new requires a struct or a struct call, found {0}")]
    NotATemplate(String),

    #[error("struct can contain only variables, found {0}")]
    StructMemberNotVariable(String),

    #[error("invalid struct item {0}")]
    InvalidStructItem(String),

    #[error("constructor of {0} is not a function")]
    ConstructorNotFunction(String),

    #[error("cannot assign to {0}")]
    InvalidAssignmentTarget(String),

    #[error("invalid integer literal {0}")]
    InvalidLiteral(String),

    #[error("unknown builtin __{0}")]
    UnknownBuiltin(String),

    #[error("__{name}: {message}")]
    BuiltinArgument { name: String, message: String },

    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: String, len: usize },

    #[error(transparent)]
    Environment(#[from] EnvError),

    #[error("break outside of a loop")]
    BreakOutsideLoop,

    #[error("continue outside of a loop")]
    ContinueOutsideLoop,

    #[error("uncaught throw of {0}")]
    UncaughtThrow(String),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error(transparent)]
    Aborted(#[from] Aborted),
}

impl RunError {
    /// Stable name of the failure, printed by the entry point.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RunError::NotARecord(_) => "NotARecord",
            RunError::UninstantiatedRecord(_) => "UninstantiatedRecord",
            RunError::ExpectedIdentifier(_) => "ExpectedIdentifier",
            RunError::NotCallable(_) => "NotCallable",
            RunError::NotATemplate(_) => "NotATemplate",
            RunError::StructMemberNotVariable(_) => "StructMemberNotVariable",
            RunError::InvalidStructItem(_) => "InvalidStructItem",
            RunError::ConstructorNotFunction(_) => "ConstructorNotFunction",
            RunError::InvalidAssignmentTarget(_) => "InvalidAssignmentTarget",
            RunError::InvalidLiteral(_) => "InvalidLiteral",
            RunError::UnknownBuiltin(_) => "UnknownBuiltin",
            RunError::BuiltinArgument { .. } => "BuiltinArgument",
            RunError::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            RunError::Environment(EnvError::DuplicateDeclaration(_)) => "DuplicateDeclaration",
            RunError::Environment(EnvError::UndeclaredVariable(_)) => "UndeclaredVariable",
            RunError::BreakOutsideLoop => "BreakOutsideLoop",
            RunError::ContinueOutsideLoop => "ContinueOutsideLoop",
            RunError::UncaughtThrow(_) => "UncaughtThrow",
            RunError::Output(_) => "Output",
            RunError::Aborted(_) => "Aborted",
        }
    }

    pub(crate) fn builtin(name: &str, message: impl Into<String>) -> Self {
        RunError::BuiltinArgument {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Why evaluation of a node stopped early.
///
/// Besides fatal errors this carries the structured exits: each is caught by
/// the construct it targets (a loop, a function call, a `try`) and becomes a
/// [`RunError`] only if it escapes the whole program.
#[derive(Debug)]
pub(crate) enum Control<'a> {
    Error(RunError),
    Break,
    Continue,
    Return(Value<'a>),
    Throw(Value<'a>),
}

impl<'a> Control<'a> {
    /// Resolves an exit that reached the top of the program.
    pub(crate) fn settle(self) -> Result<Value<'a>, RunError> {
        match self {
            Control::Return(value) => Ok(value),
            Control::Error(e) => Err(e),
            Control::Break => Err(RunError::BreakOutsideLoop),
            Control::Continue => Err(RunError::ContinueOutsideLoop),
            Control::Throw(value) => Err(RunError::UncaughtThrow(value.to_string())),
        }
    }
}

impl From<RunError> for Control<'_> {
    fn from(error: RunError) -> Self {
        Control::Error(error)
    }
}

impl From<EnvError> for Control<'_> {
    fn from(error: EnvError) -> Self {
        Control::Error(error.into())
    }
}

impl From<Aborted> for Control<'_> {
    fn from(error: Aborted) -> Self {
        Control::Error(error.into())
    }
}

impl From<std::io::Error> for Control<'_> {
    fn from(error: std::io::Error) -> Self {
        Control::Error(error.into())
    }
}

pub(crate) type Flow<'a> = Result<Value<'a>, Control<'a>>;
