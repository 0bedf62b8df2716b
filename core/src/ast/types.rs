use super::Ident;

/// Built-in named types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimpleType {
    Void,
    Any,
    Bool,
    Int,
    Char,
}

impl SimpleType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Void" => Some(SimpleType::Void),
            "Any" => Some(SimpleType::Any),
            "Bool" => Some(SimpleType::Bool),
            "Int" => Some(SimpleType::Int),
            "Char" => Some(SimpleType::Char),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SimpleType::Void => "Void",
            SimpleType::Any => "Any",
            SimpleType::Bool => "Bool",
            SimpleType::Int => "Int",
            SimpleType::Char => "Char",
        }
    }
}

/// Type annotation as written in the source.
#[derive(Debug, Clone, Copy)]
pub enum TypeExpr<'a> {
    Simple(SimpleType),
    /// `[T]`
    Array(&'a TypeExpr<'a>),
    /// `(A | B | C)`
    Sum(&'a [TypeExpr<'a>]),
    /// `A -> B`; a `Void` parameter stands for no parameters.
    Function {
        params: &'a [TypeExpr<'a>],
        ret: &'a TypeExpr<'a>,
    },
    /// A type identifier naming a struct declaration.
    Class(Ident<'a>),
    /// Annotation that could not be understood.
    Error,
}
