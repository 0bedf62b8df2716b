//! Lexical scope stack used by the analysis passes.
//!
//! The passes mirror the interpreter's scoping without running anything, so
//! they need the same two kinds of scope:
//! - **Block scopes**: grow one declaration at a time, in source order
//!   (program, blocks, struct bodies).
//! - **Parameter scopes**: all names known up front, bound left to right so
//!   that a default value sees the parameters before it:
//! ```tarn
//! fn a, b = a + 1 => b  // `b`'s default can see `a`
//! ```

use bumpalo::Bump;
use hashbrown::HashMap;
use thiserror::Error;

/// A scope that can be pushed onto a [`ScopeStack`].
pub trait Scope<'a, T> {
    /// Returns the value bound to `name`, if any.
    fn lookup(&self, name: &str) -> Option<&T>;

    /// Binds `name` in this scope.
    fn bind(&mut self, name: &'a str, value: T) -> Result<(), BindError>;
}

/// A scope filled by declarations as they are encountered.
pub struct BlockScope<'a, T> {
    bindings: HashMap<&'a str, T>,
}

impl<T> Default for BlockScope<'_, T> {
    fn default() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }
}

impl<'a, T> Scope<'a, T> for BlockScope<'a, T> {
    fn lookup(&self, name: &str) -> Option<&T> {
        self.bindings.get(name)
    }

    fn bind(&mut self, name: &'a str, value: T) -> Result<(), BindError> {
        if self.bindings.contains_key(name) {
            return Err(BindError::AlreadyBound(name.to_string()));
        }
        self.bindings.insert(name, value);
        Ok(())
    }
}

/// Parameter slots of one function, filled left to right.
pub struct ParamScope<'a, T> {
    // Sorted by name; `None` until the parameter is bound.
    slots: &'a mut [(&'a str, Option<T>)],
}

impl<'a, T> ParamScope<'a, T> {
    /// Allocates one empty slot per parameter name.
    pub fn new(arena: &'a Bump, names: &[&'a str]) -> Result<Self, DuplicateError> {
        let mut names = names.to_vec();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(DuplicateError(pair[0].to_string()));
        }
        let slots = arena.alloc_slice_fill_iter(names.into_iter().map(|name| (name, None)));
        Ok(Self { slots })
    }

    fn slot(&self, name: &str) -> Option<usize> {
        self.slots.binary_search_by_key(&name, |(slot, _)| *slot).ok()
    }
}

impl<'a, T> Scope<'a, T> for ParamScope<'a, T> {
    fn lookup(&self, name: &str) -> Option<&T> {
        self.slot(name).and_then(|index| self.slots[index].1.as_ref())
    }

    fn bind(&mut self, name: &'a str, value: T) -> Result<(), BindError> {
        let index = self
            .slot(name)
            .ok_or_else(|| BindError::NotAParameter(name.to_string()))?;
        let slot = &mut self.slots[index].1;
        if slot.is_some() {
            return Err(BindError::AlreadyBound(name.to_string()));
        }
        *slot = Some(value);
        Ok(())
    }
}

/// Scopes searched from innermost to outermost.
pub struct ScopeStack<'a, T> {
    scopes: Vec<Box<dyn Scope<'a, T> + 'a>>,
}

impl<'a, T: Copy + 'a> ScopeStack<'a, T> {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn push<S: Scope<'a, T> + 'a>(&mut self, scope: S) {
        self.scopes.push(Box::new(scope));
    }

    pub fn pop(&mut self) -> Result<(), PopError> {
        self.scopes.pop().ok_or(PopError::EmptyStack)?;
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Looks `name` up from the innermost scope outwards.
    pub fn lookup(&self, name: &str) -> Option<T> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.lookup(name))
            .copied()
    }

    /// Binds `name` in the innermost scope.
    pub fn bind_in_current(&mut self, name: &'a str, value: T) -> Result<(), BindError> {
        self.scopes
            .last_mut()
            .ok_or(BindError::NoScope)?
            .bind(name, value)
    }
}

impl<'a, T: Copy + 'a> Default for ScopeStack<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("no open scope")]
    NoScope,
    #[error("{0} is already bound in this scope")]
    AlreadyBound(String),
    #[error("{0} is not a parameter of this function")]
    NotAParameter(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopError {
    #[error("scope closed more often than opened")]
    EmptyStack,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DuplicateError(pub String);
