//! Best-effort static types for a parsed program.
//!
//! Tarn is dynamically typed; this pass only looks for conflicts it can prove
//! from annotations, literals and builtin signatures. Anything it cannot
//! follow becomes [`Type::Any`], which is compatible with everything, so the
//! pass never reports a program the interpreter would accept on every path.

use std::fmt;

use bumpalo::Bump;
use hashbrown::HashMap;

use super::{PassError, Scopes};
use crate::ast::{Declaration, Expr, ExprKind, FunctionDef, NodeId, Program, Sequence, SimpleType, TypeExpr};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::interpreter::builtins;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Void,
    Any,
    Bool,
    Int,
    Char,
    Array(Box<Type>),
    /// One of several alternatives; never nested, never a single alternative.
    Sum(Vec<Type>),
    Function {
        params: Vec<Type>,
        ret: Box<Type>,
    },
    /// A struct literal, keyed by its node.
    Template(NodeId),
    /// An instance of the struct bound at `decl`.
    Class { decl: Option<NodeId>, name: String },
}

impl Type {
    /// Whether a value of type `other` may be stored where `self` is expected.
    pub fn accepts(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Any, _) | (_, Type::Any) => true,
            (_, Type::Sum(alternatives)) => alternatives.iter().all(|alt| self.accepts(alt)),
            (Type::Sum(alternatives), _) => alternatives.iter().any(|alt| alt.accepts(other)),
            (Type::Array(expected), Type::Array(found)) => expected.accepts(found),
            (
                Type::Function { params, ret },
                Type::Function {
                    params: found_params,
                    ret: found_ret,
                },
            ) => {
                params.len() == found_params.len()
                    && params.iter().zip(found_params).all(|(a, b)| b.accepts(a))
                    && ret.accepts(found_ret)
            }
            (Type::Class { decl: Some(a), .. }, Type::Class { decl: Some(b), .. }) => a == b,
            (Type::Class { name: a, .. }, Type::Class { name: b, .. }) => a == b,
            _ => self == other,
        }
    }

    /// The smallest type covering both `self` and `other`.
    pub fn union(self, other: Type) -> Type {
        if self == other {
            return self;
        }
        if self == Type::Any || other == Type::Any {
            return Type::Any;
        }
        let mut alternatives: Vec<Type> = Vec::new();
        for ty in [self, other] {
            let flattened = match ty {
                Type::Sum(inner) => inner,
                ty => vec![ty],
            };
            for alt in flattened {
                if !alternatives.contains(&alt) {
                    alternatives.push(alt);
                }
            }
        }
        match alternatives.len() {
            1 => alternatives.swap_remove(0),
            _ => Type::Sum(alternatives),
        }
    }

    fn may_be_bool(&self) -> bool {
        match self {
            Type::Any | Type::Bool => true,
            Type::Sum(alternatives) => alternatives.iter().any(Type::may_be_bool),
            _ => false,
        }
    }

    fn result(&self) -> Type {
        match self {
            Type::Function { ret, .. } => (**ret).clone(),
            _ => Type::Any,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("Void"),
            Type::Any => f.write_str("Any"),
            Type::Bool => f.write_str("Bool"),
            Type::Int => f.write_str("Int"),
            Type::Char => f.write_str("Char"),
            Type::Array(element) => write!(f, "[{element}]"),
            Type::Sum(alternatives) => {
                f.write_str("(")?;
                for (index, alt) in alternatives.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{alt}")?;
                }
                f.write_str(")")
            }
            Type::Function { params, ret } => {
                if params.is_empty() {
                    f.write_str("Void")?;
                }
                for (index, param) in params.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, " -> {ret}")
            }
            Type::Template(_) => f.write_str("struct"),
            Type::Class { name, .. } => f.write_str(name),
        }
    }
}

/// Types computed by [`infer`], keyed by node.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: HashMap<NodeId, Type>,
}

impl TypeTable {
    pub fn get(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Infers a type for every node of `program`.
pub fn infer<'a>(
    arena: &'a Bump,
    program: &Program<'a>,
    diagnostics: &mut Diagnostics,
) -> Result<TypeTable, PassError> {
    let mut inferer = Inferer {
        scopes: Scopes::new(arena),
        bindings: HashMap::new(),
        table: TypeTable::default(),
        diagnostics,
    };
    for item in program.items {
        inferer.expr(item)?;
    }
    tracing::debug!(typed = inferer.table.len(), "inferred types");
    Ok(inferer.table)
}

struct Inferer<'a, 'd> {
    scopes: Scopes<'a>,
    /// Type of the binding introduced at each declaring node.
    bindings: HashMap<NodeId, Type>,
    table: TypeTable,
    diagnostics: &'d mut Diagnostics,
}

impl<'a> Inferer<'a, '_> {
    fn expr(&mut self, expr: &'a Expr<'a>) -> Result<Type, PassError> {
        let ty = self.kind(expr)?;
        self.table.types.insert(expr.id, ty.clone());
        Ok(ty)
    }

    fn kind(&mut self, expr: &'a Expr<'a>) -> Result<Type, PassError> {
        let ty = match expr.kind {
            ExprKind::Int(_) => Type::Int,
            ExprKind::Bool(_) => Type::Bool,
            ExprKind::Char(_) => Type::Char,
            ExprKind::Void | ExprKind::Goto(_) | ExprKind::Label(_) => Type::Void,
            ExprKind::Error => Type::Any,
            ExprKind::Ident(ident) => self.binding(ident.name),
            ExprKind::Binary { op, left, right } => match op.name {
                "." => {
                    self.expr(left)?;
                    Type::Any
                }
                ":" => self.expr(left)?,
                _ => {
                    self.expr(left)?;
                    self.expr(right)?;
                    self.binding(op.name).result()
                }
            },
            ExprKind::Assign { target, value } => {
                let actual = self.expr(value)?;
                match target.kind {
                    ExprKind::Declaration(decl) => {
                        let ty = self.bind(target, decl, Some(value), Some(actual.clone()))?;
                        self.table.types.insert(target.id, ty);
                    }
                    ExprKind::Ident(ident) if self.scopes.lookup(ident.name).is_none() => {
                        self.scopes.declare(ident.name, expr.id)?;
                        self.bindings.insert(expr.id, actual.clone());
                    }
                    _ => {
                        self.expr(target)?;
                    }
                }
                actual
            }
            ExprKind::Declaration(decl) => {
                let actual = match decl.init {
                    Some(init) if matches!(init.kind, ExprKind::Function(_)) => {
                        // Visible inside its own body, as `Any` until known.
                        self.scopes.declare(decl.name.name, expr.id)?;
                        Some(self.expr(init)?)
                    }
                    Some(init) => Some(self.expr(init)?),
                    None => None,
                };
                self.bind(expr, decl, decl.init, actual)?
            }
            ExprKind::Array(items) => {
                let mut element: Option<Type> = None;
                for item in items {
                    let ty = self.expr(item)?;
                    element = Some(match element {
                        Some(element) => element.union(ty),
                        None => ty,
                    });
                }
                Type::Array(Box::new(element.unwrap_or(Type::Any)))
            }
            ExprKind::Function(def) => self.function(def)?,
            ExprKind::Struct(def) => {
                self.scopes.enter_block();
                for item in def.items {
                    self.expr(item)?;
                }
                self.scopes.exit()?;
                Type::Template(expr.id)
            }
            ExprKind::New(inner) => {
                self.expr(inner)?;
                let template = match inner.kind {
                    ExprKind::Apply { callee, .. } => callee.as_ident(),
                    _ => inner.as_ident(),
                };
                match template {
                    Some(ident) => Type::Class {
                        decl: self.scopes.lookup(ident.name),
                        name: ident.name.to_string(),
                    },
                    None => Type::Any,
                }
            }
            ExprKind::Import(inner) => {
                self.expr(inner)?;
                Type::Void
            }
            ExprKind::If {
                test,
                then,
                otherwise,
            } => {
                let test_ty = self.expr(test)?;
                if !test_ty.may_be_bool() {
                    self.diagnostics.emit_at(
                        DiagnosticKind::NonBooleanTest,
                        test.line,
                        &[test.id],
                        &[test, &test_ty],
                    )?;
                }
                let then_ty = self.sequence(then)?;
                let else_ty = match otherwise {
                    Some(otherwise) => self.sequence(otherwise)?,
                    None => Type::Void,
                };
                then_ty.union(else_ty)
            }
            ExprKind::Apply { callee, args } => {
                let builtin = callee.as_ident().and_then(|ident| ident.builtin_name());
                let callee_ty = match builtin {
                    Some(_) => None,
                    None => Some(self.expr(callee)?),
                };
                for arg in args {
                    self.expr(arg)?;
                }
                match (builtin, callee_ty) {
                    (Some(name), _) => builtins::signature(name)
                        .map_or(Type::Any, |builtin| self.convert(&builtin.ret)),
                    (None, Some(callee_ty)) => callee_ty.result(),
                    (None, None) => Type::Any,
                }
            }
            ExprKind::Break(inner) | ExprKind::Continue(inner) | ExprKind::Return(inner) => {
                if let Some(inner) = inner {
                    self.expr(inner)?;
                }
                Type::Void
            }
            ExprKind::Throw(inner) | ExprKind::Assume(inner) | ExprKind::Assert(inner) => {
                self.expr(inner)?;
                Type::Void
            }
            ExprKind::Repeat(body) => {
                self.sequence(body)?;
                Type::Any
            }
            ExprKind::Sequence(body) => self.sequence(body)?,
            ExprKind::ForEach {
                binding,
                iterable,
                body,
            } => {
                let element = match self.expr(iterable)? {
                    Type::Array(element) => *element,
                    _ => Type::Any,
                };
                self.scopes.enter_block();
                self.scopes.declare(binding.name, expr.id)?;
                self.bindings.insert(expr.id, element);
                self.sequence(body)?;
                self.scopes.exit()?;
                Type::Any
            }
            ExprKind::Try {
                body,
                catch,
                finally,
            } => {
                let mut ty = self.sequence(body)?;
                if let Some(catch) = catch {
                    self.scopes.enter_block();
                    if let Some(binding) = catch.binding {
                        self.scopes.declare(binding.name, expr.id)?;
                        self.bindings.insert(expr.id, Type::Any);
                    }
                    ty = ty.union(self.sequence(catch.body)?);
                    self.scopes.exit()?;
                }
                if let Some(finally) = finally {
                    self.sequence(finally)?;
                }
                ty
            }
        };
        Ok(ty)
    }

    /// Type of the last item, in a fresh block scope.
    fn sequence(&mut self, body: &'a Sequence<'a>) -> Result<Type, PassError> {
        self.scopes.enter_block();
        let mut ty = Type::Void;
        for item in body.items {
            ty = self.expr(item)?;
        }
        self.scopes.exit()?;
        Ok(ty)
    }

    fn function(&mut self, def: &'a FunctionDef<'a>) -> Result<Type, PassError> {
        self.scopes.enter_params(def)?;
        let mut params = Vec::with_capacity(def.params.len());
        for param in def.params.iter().chain(def.receiver) {
            if let Some(default) = param.default() {
                self.expr(default)?;
            }
            let ty = param.decl.ty.map_or(Type::Any, |ty| self.convert(ty));
            self.scopes.declare(param.name(), param.id)?;
            self.bindings.insert(param.id, ty.clone());
            params.push(ty);
        }
        // The receiver is bound like a parameter but is not part of the
        // call signature.
        params.truncate(def.params.len());
        let ret = self.sequence(def.body)?;
        self.scopes.exit()?;
        Ok(Type::Function {
            params,
            ret: Box::new(ret),
        })
    }

    /// Binds a declaration, checking the initializer against the annotation.
    fn bind(
        &mut self,
        node: &'a Expr<'a>,
        decl: &Declaration<'a>,
        init: Option<&'a Expr<'a>>,
        actual: Option<Type>,
    ) -> Result<Type, PassError> {
        let declared = decl.ty.map(|ty| self.convert(ty));
        let ty = match (declared, actual) {
            (Some(declared), Some(actual)) => {
                if !declared.accepts(&actual) {
                    let nodes: Vec<NodeId> =
                        std::iter::once(node.id).chain(init.map(|init| init.id)).collect();
                    self.diagnostics.emit_at(
                        DiagnosticKind::TypeMismatch,
                        node.line,
                        &nodes,
                        &[&decl.name.name, &declared, &actual],
                    )?;
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(actual)) => actual,
            (None, None) => Type::Void,
        };
        self.scopes.declare(decl.name.name, node.id)?;
        self.bindings.insert(node.id, ty.clone());
        Ok(ty)
    }

    fn binding(&self, name: &str) -> Type {
        self.scopes
            .lookup(name)
            .and_then(|decl| self.bindings.get(&decl))
            .cloned()
            .unwrap_or(Type::Any)
    }

    fn convert(&self, ty: &TypeExpr<'_>) -> Type {
        match ty {
            TypeExpr::Simple(simple) => match simple {
                SimpleType::Void => Type::Void,
                SimpleType::Any => Type::Any,
                SimpleType::Bool => Type::Bool,
                SimpleType::Int => Type::Int,
                SimpleType::Char => Type::Char,
            },
            TypeExpr::Array(element) => Type::Array(Box::new(self.convert(element))),
            TypeExpr::Sum(alternatives) => alternatives
                .iter()
                .map(|alt| self.convert(alt))
                .reduce(Type::union)
                .unwrap_or(Type::Any),
            TypeExpr::Function { params, ret } => {
                let params = match params {
                    [TypeExpr::Simple(SimpleType::Void)] => Vec::new(),
                    params => params.iter().map(|param| self.convert(param)).collect(),
                };
                Type::Function {
                    params,
                    ret: Box::new(self.convert(ret)),
                }
            }
            TypeExpr::Class(ident) => Type::Class {
                decl: self.scopes.lookup(ident.name),
                name: ident.name.to_string(),
            },
            TypeExpr::Error => Type::Any,
        }
    }
}
