//! Chained symbol tables.
//!
//! An [`Environment`] is a shared handle to one frame: an ordered set of name →
//! value bindings, the environments imported into it, and an optional parent.
//! Blocks, function calls and record instances each create their own frame;
//! closures and instances keep the frame they were created in alive by holding
//! a handle to it.
//!
//! Lookup walks outward, frame by frame: the frame's own bindings first, then
//! its imports in import order, then its parent. There is no depth limit.

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use thiserror::Error;

use crate::interpreter::Value;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("'{0}' is already declared in this scope")]
    DuplicateDeclaration(String),

    #[error("'{0}' is not declared")]
    UndeclaredVariable(String),
}

#[derive(Default)]
struct Frame<'a> {
    slots: HashMap<&'a str, usize>,
    entries: Vec<(&'a str, Value<'a>)>,
    imports: Vec<Environment<'a>>,
    parent: Option<Environment<'a>>,
}

impl<'a> Frame<'a> {
    fn get(&self, name: &str) -> Option<&Value<'a>> {
        self.slots.get(name).map(|&slot| &self.entries[slot].1)
    }
}

#[derive(Clone, Default)]
pub struct Environment<'a>(Rc<RefCell<Frame<'a>>>);

impl<'a> Environment<'a> {
    /// A parentless frame, used for the global scope.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(parent: &Environment<'a>) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            parent: Some(parent.clone()),
            ..Frame::default()
        })))
    }

    pub fn parent(&self) -> Option<Environment<'a>> {
        self.0.borrow().parent.clone()
    }

    /// Whether both handles refer to the same frame.
    pub fn ptr_eq(&self, other: &Environment<'a>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Adds `name` to this frame.
    pub fn declare(&self, name: &'a str, value: Value<'a>) -> Result<(), EnvError> {
        let mut frame = self.0.borrow_mut();
        if frame.slots.contains_key(name) {
            return Err(EnvError::DuplicateDeclaration(name.to_string()));
        }
        tracing::trace!(name, "declare");
        let slot = frame.entries.len();
        frame.entries.push((name, value));
        frame.slots.insert(name, slot);
        Ok(())
    }

    /// Whether `name` is declared in this frame itself.
    pub fn declares(&self, name: &str) -> bool {
        self.0.borrow().slots.contains_key(name)
    }

    /// Rebinds `name` in the nearest frame that declares it.
    pub fn set_value(&self, name: &str, value: Value<'a>) -> Result<(), EnvError> {
        let owner = self
            .owner_of(name)
            .ok_or_else(|| EnvError::UndeclaredVariable(name.to_string()))?;
        let mut frame = owner.0.borrow_mut();
        let slot = frame.slots[name];
        frame.entries[slot].1 = value;
        Ok(())
    }

    pub fn get_value(&self, name: &str) -> Result<Value<'a>, EnvError> {
        self.get_value_or_null(name)
            .ok_or_else(|| EnvError::UndeclaredVariable(name.to_string()))
    }

    pub fn get_value_or_null(&self, name: &str) -> Option<Value<'a>> {
        let owner = self.owner_of(name)?;
        let frame = owner.0.borrow();
        frame.get(name).cloned()
    }

    /// Makes the bindings of `other` visible from this frame.
    pub fn import(&self, other: &Environment<'a>) {
        if self.ptr_eq(other) {
            return;
        }
        self.0.borrow_mut().imports.push(other.clone());
    }

    pub fn imports(&self) -> Vec<Environment<'a>> {
        self.0.borrow().imports.clone()
    }

    /// Looks `name` up in this frame and its imports, ignoring the parent.
    ///
    /// Record members are read this way so that `r.print` never finds a
    /// global.
    pub fn get_member(&self, name: &str) -> Result<Value<'a>, EnvError> {
        let owner = self
            .member_owner(name)
            .ok_or_else(|| EnvError::UndeclaredVariable(name.to_string()))?;
        let frame = owner.0.borrow();
        frame
            .get(name)
            .cloned()
            .ok_or_else(|| EnvError::UndeclaredVariable(name.to_string()))
    }

    /// Rebinds a member found by [`Environment::get_member`] rules.
    pub fn set_member(&self, name: &str, value: Value<'a>) -> Result<(), EnvError> {
        let owner = self
            .member_owner(name)
            .ok_or_else(|| EnvError::UndeclaredVariable(name.to_string()))?;
        let mut frame = owner.0.borrow_mut();
        let slot = frame.slots[name];
        frame.entries[slot].1 = value;
        Ok(())
    }

    /// This frame's own bindings in declaration order.
    pub fn bindings(&self) -> Vec<(&'a str, Value<'a>)> {
        self.0.borrow().entries.clone()
    }

    /// A parentless copy holding every visible binding, nearest first wins.
    pub fn flatten(&self) -> Environment<'a> {
        let flat = Environment::new();
        let mut pending = vec![self.clone()];
        let mut visited: Vec<Environment<'a>> = Vec::new();
        while let Some(env) = pending.pop() {
            if visited.iter().any(|seen| seen.ptr_eq(&env)) {
                continue;
            }
            let frame = env.0.borrow();
            for (name, value) in &frame.entries {
                if !flat.declares(name) {
                    // Cannot fail: the name was just checked.
                    let _ = flat.declare(name, value.clone());
                }
            }
            // Pushed in reverse so imports are visited before the parent.
            pending.extend(frame.parent.iter().cloned());
            pending.extend(frame.imports.iter().rev().cloned());
            drop(frame);
            visited.push(env);
        }
        flat
    }

    /// Finds the frame that declares `name`, following the lookup order.
    fn owner_of(&self, name: &str) -> Option<Environment<'a>> {
        let mut current = Some(self.clone());
        while let Some(env) = current {
            if env.declares(name) {
                return Some(env);
            }
            let frame = env.0.borrow();
            if let Some(owner) = frame.imports.iter().find_map(|import| import.owner_of(name)) {
                return Some(owner);
            }
            current = frame.parent.clone();
        }
        None
    }

    fn member_owner(&self, name: &str) -> Option<Environment<'a>> {
        if self.declares(name) {
            return Some(self.clone());
        }
        let frame = self.0.borrow();
        frame
            .imports
            .iter()
            .find_map(|import| import.member_owner(name))
    }
}

impl fmt::Debug for Environment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.0.borrow();
        f.debug_struct("Environment")
            .field("names", &frame.entries.iter().map(|(n, _)| *n).collect::<Vec<_>>())
            .field("imports", &frame.imports.len())
            .field("has_parent", &frame.parent.is_some())
            .finish()
    }
}
