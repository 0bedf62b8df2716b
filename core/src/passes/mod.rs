//! Read-only analysis passes over a parsed program.
//!
//! Neither pass is on the run path. Each walks the tree with the same
//! lexical scoping the interpreter uses and writes its findings into a side
//! table keyed by [`NodeId`]; the tree itself is never modified, so the
//! passes can run in any order, or not at all.

pub mod infer;
pub mod resolve;

pub use infer::{Type, TypeTable, infer};
pub use resolve::{Resolution, resolve};

use bumpalo::Bump;
use thiserror::Error;

use crate::ast::{FunctionDef, NodeId};
use crate::diagnostics::Aborted;
use crate::scope_stack::{BindError, BlockScope, DuplicateError, ParamScope, PopError, ScopeStack};

#[derive(Debug, Error)]
pub enum PassError {
    #[error("function declares parameter twice: {0}")]
    DuplicateParameter(#[from] DuplicateError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Pop(#[from] PopError),

    #[error(transparent)]
    Aborted(#[from] Aborted),
}

/// Name to declaring node, following the interpreter's scoping.
pub(crate) struct Scopes<'a> {
    arena: &'a Bump,
    stack: ScopeStack<'a, NodeId>,
}

impl<'a> Scopes<'a> {
    pub(crate) fn new(arena: &'a Bump) -> Self {
        let mut stack = ScopeStack::new();
        stack.push(BlockScope::default());
        Self { arena, stack }
    }

    pub(crate) fn enter_block(&mut self) {
        self.stack.push(BlockScope::default());
    }

    /// Opens the parameter scope of `def`. Parameters become visible as they
    /// are bound with [`Scopes::declare`].
    pub(crate) fn enter_params(&mut self, def: &FunctionDef<'a>) -> Result<(), PassError> {
        let names: Vec<&'a str> = def
            .params
            .iter()
            .chain(def.receiver)
            .map(|param| param.name())
            .collect();
        self.stack.push(ParamScope::new(self.arena, &names)?);
        Ok(())
    }

    pub(crate) fn exit(&mut self) -> Result<(), PassError> {
        Ok(self.stack.pop()?)
    }

    /// Binds `name` in the innermost scope. A name already bound there is
    /// left pointing at its first declaration.
    pub(crate) fn declare(&mut self, name: &'a str, node: NodeId) -> Result<(), PassError> {
        match self.stack.bind_in_current(name, node) {
            Ok(()) | Err(BindError::AlreadyBound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<NodeId> {
        self.stack.lookup(name)
    }
}
