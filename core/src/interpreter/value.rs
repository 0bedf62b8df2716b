use std::rc::Rc;

use num_bigint::BigInt;

use crate::ast::{Expr, FunctionDef, StructDef};
use crate::environment::Environment;

/// Result of evaluating an expression.
///
/// Scalars and arrays are compared structurally. Functions, templates,
/// instances and placeholders compare by identity.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Void,
    Int(BigInt),
    Bool(bool),
    Char(char),
    /// An evaluated array. Array literals only exist in the AST.
    Array(Rc<[Value<'a>]>),
    Function(Closure<'a>),
    /// An uninstantiated `struct`.
    Template(&'a StructDef<'a>),
    Instance(Instance<'a>),
    /// A call whose callee was a record, kept unevaluated for `new`.
    Pending(Rc<Pending<'a>>),
    /// Stands in for a result that could not be computed.
    Error(Rc<Placeholder<'a>>),
}

/// A function literal bound to the environment it was evaluated in.
#[derive(Debug, Clone)]
pub struct Closure<'a> {
    pub def: &'a FunctionDef<'a>,
    pub env: Environment<'a>,
}

/// A record instance: its template plus the frame holding its members.
#[derive(Debug, Clone)]
pub struct Instance<'a> {
    pub template: &'a StructDef<'a>,
    pub env: Environment<'a>,
}

#[derive(Debug)]
pub struct Pending<'a> {
    pub callee: Value<'a>,
    /// The `Apply` node.
    pub call: &'a Expr<'a>,
    /// Its arguments, still unevaluated.
    pub args: &'a [&'a Expr<'a>],
}

#[derive(Debug)]
pub struct Placeholder<'a> {
    /// The node whose evaluation failed.
    pub node: &'a Expr<'a>,
}

impl<'a> Value<'a> {
    pub fn int(n: impl Into<BigInt>) -> Self {
        Value::Int(n.into())
    }

    pub fn array(items: Vec<Value<'a>>) -> Self {
        Value::Array(Rc::from(items))
    }

    pub fn string(text: &str) -> Self {
        Value::Array(text.chars().map(Value::Char).collect())
    }

    pub fn placeholder(node: &'a Expr<'a>) -> Self {
        Value::Error(Rc::new(Placeholder { node }))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance<'a>> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Text of a non-empty array made only of characters.
    pub fn as_string(&self) -> Option<String> {
        let Value::Array(items) = self else {
            return None;
        };
        if items.is_empty() {
            return None;
        }
        items
            .iter()
            .map(|item| match item {
                Value::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Int(_) => "integer",
            Value::Bool(_) => "boolean",
            Value::Char(_) => "character",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Template(_) => "struct",
            Value::Instance(_) => "record instance",
            Value::Pending(_) => "pending call",
            Value::Error(_) => "error",
        }
    }
}

impl<'a> Instance<'a> {
    /// Copies this instance and every instance nested in its members,
    /// including the members it imported.
    ///
    /// Member functions that closed over a copied frame are rebound to the
    /// copy, so methods of the copy update the copy.
    pub fn deep_copy(&self) -> Instance<'a> {
        Instance {
            template: self.template,
            env: copy_frame(&self.env),
        }
    }
}

fn copy_frame<'a>(frame: &Environment<'a>) -> Environment<'a> {
    let copy = match frame.parent() {
        Some(parent) => Environment::child(&parent),
        None => Environment::new(),
    };
    // Each instance owns its import frames, so they are copied too.
    for imported in frame.imports() {
        copy.import(&copy_frame(&imported));
    }
    for (name, value) in frame.bindings() {
        let copied = match value {
            Value::Instance(nested) => Value::Instance(nested.deep_copy()),
            Value::Function(closure) if closure.env.ptr_eq(frame) => Value::Function(Closure {
                def: closure.def,
                env: copy.clone(),
            }),
            other => other,
        };
        // Names come from a frame, so they are unique.
        let _ = copy.declare(name, copied);
    }
    copy
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => {
                core::ptr::eq(a.def, b.def) && a.env.ptr_eq(&b.env)
            }
            (Value::Template(a), Value::Template(b)) => core::ptr::eq(*a, *b),
            (Value::Instance(a), Value::Instance(b)) => a.env.ptr_eq(&b.env),
            (Value::Pending(a), Value::Pending(b)) => Rc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        assert_eq!(Value::int(3), Value::int(3));
        assert_ne!(Value::int(3), Value::Bool(true));
        assert_eq!(Value::string("ab"), Value::array(vec![Value::Char('a'), Value::Char('b')]));
    }

    #[test]
    fn test_as_string() {
        assert_eq!(Value::string("hi").as_string().as_deref(), Some("hi"));
        assert_eq!(Value::array(vec![]).as_string(), None);
        assert_eq!(Value::array(vec![Value::int(1)]).as_string(), None);
    }

    #[test]
    fn test_deep_copy_detaches_nested_instances() {
        let template = &StructDef { items: &[] };
        let global = Environment::new();

        let inner = Instance {
            template,
            env: Environment::child(&global),
        };
        inner.env.declare("x", Value::int(1)).unwrap();
        let outer = Instance {
            template,
            env: Environment::child(&global),
        };
        outer
            .env
            .declare("inner", Value::Instance(inner.clone()))
            .unwrap();

        let copy = outer.deep_copy();
        let Value::Instance(copied_inner) = copy.env.get_value("inner").unwrap() else {
            panic!("expected an instance");
        };
        copied_inner.env.set_value("x", Value::int(2)).unwrap();

        assert_eq!(inner.env.get_value("x").unwrap(), Value::int(1));
        assert_eq!(copied_inner.env.get_value("x").unwrap(), Value::int(2));
        assert!(copy.env.parent().unwrap().ptr_eq(&global));
    }

    #[test]
    fn test_deep_copy_detaches_import_frames() {
        let template = &StructDef { items: &[] };
        let global = Environment::new();

        let mixin = Environment::child(&global);
        mixin.declare("y", Value::int(1)).unwrap();
        let record = Instance {
            template,
            env: Environment::child(&global),
        };
        record.env.import(&mixin);

        let copy = record.deep_copy();
        copy.env.set_member("y", Value::int(5)).unwrap();

        assert_eq!(record.env.get_member("y").unwrap(), Value::int(1));
        assert_eq!(copy.env.get_member("y").unwrap(), Value::int(5));
        assert!(!copy.env.imports()[0].ptr_eq(&mixin));
    }
}
