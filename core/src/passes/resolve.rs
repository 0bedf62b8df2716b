//! Name resolution: links every identifier to the node that declares it.
//!
//! Declaring nodes are `var`/bare declarations, function parameters, the
//! `foreach` node for its loop variable, the `try` node for its catch
//! binding, and assignments that implicitly declare a name. Operators are
//! resolved too: the operator application's node is linked to the
//! declaration of the function bound to the operator.
//!
//! Member names after `.` are not resolved since they depend on the run-time
//! record. A name used but never declared is reported as R001.

use bumpalo::Bump;
use hashbrown::HashMap;

use super::{PassError, Scopes};
use crate::ast::{Declaration, Expr, ExprKind, FunctionDef, Ident, IdentCategory, NodeId, Program, Sequence};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Side table produced by [`resolve`].
#[derive(Debug, Default)]
pub struct Resolution {
    declarations: HashMap<NodeId, NodeId>,
    references: HashMap<NodeId, Vec<NodeId>>,
}

impl Resolution {
    /// The node declaring the name used at `node`.
    pub fn declaration_of(&self, node: NodeId) -> Option<NodeId> {
        self.declarations.get(&node).copied()
    }

    /// Every node referring to the binding declared at `declaration`, in
    /// source order.
    pub fn references_to(&self, declaration: NodeId) -> &[NodeId] {
        self.references
            .get(&declaration)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of resolved uses.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    fn link(&mut self, node: NodeId, declaration: NodeId) {
        self.declarations.insert(node, declaration);
        self.references.entry(declaration).or_default().push(node);
    }
}

/// Resolves every name in `program`.
pub fn resolve<'a>(
    arena: &'a Bump,
    program: &Program<'a>,
    diagnostics: &mut Diagnostics,
) -> Result<Resolution, PassError> {
    let mut resolver = Resolver {
        scopes: Scopes::new(arena),
        resolution: Resolution::default(),
        diagnostics,
    };
    for item in program.items {
        resolver.expr(item)?;
    }
    tracing::debug!(resolved = resolver.resolution.len(), "resolved program");
    Ok(resolver.resolution)
}

struct Resolver<'a, 'd> {
    scopes: Scopes<'a>,
    resolution: Resolution,
    diagnostics: &'d mut Diagnostics,
}

impl<'a> Resolver<'a, '_> {
    fn expr(&mut self, expr: &'a Expr<'a>) -> Result<(), PassError> {
        match expr.kind {
            ExprKind::Int(_)
            | ExprKind::Bool(_)
            | ExprKind::Char(_)
            | ExprKind::Void
            | ExprKind::Goto(_)
            | ExprKind::Label(_)
            | ExprKind::Error => Ok(()),
            ExprKind::Ident(ident) => self.use_name(expr, ident),
            ExprKind::Binary { op, left, right } => match op.name {
                "." => self.expr(left),
                ":" => self.expr(left),
                _ => {
                    self.use_name(expr, op)?;
                    self.expr(left)?;
                    self.expr(right)
                }
            },
            ExprKind::Assign { target, value } => {
                self.expr(value)?;
                match target.kind {
                    ExprKind::Ident(ident) if self.scopes.lookup(ident.name).is_none() => {
                        // Assigning an undeclared name declares it at run time.
                        self.report(target, ident)?;
                        self.scopes.declare(ident.name, expr.id)
                    }
                    ExprKind::Declaration(decl) => self.declare(target, decl),
                    _ => self.expr(target),
                }
            }
            ExprKind::Declaration(decl) => self.declaration(expr, decl),
            ExprKind::Array(items) => self.all(items),
            ExprKind::Function(def) => self.function(def),
            ExprKind::Struct(def) => {
                self.scopes.enter_block();
                self.all(def.items)?;
                self.scopes.exit()
            }
            ExprKind::New(inner) | ExprKind::Import(inner) => self.expr(inner),
            ExprKind::If {
                test,
                then,
                otherwise,
            } => {
                self.expr(test)?;
                self.sequence(then)?;
                match otherwise {
                    Some(otherwise) => self.sequence(otherwise),
                    None => Ok(()),
                }
            }
            ExprKind::Apply { callee, args } => {
                let is_builtin = callee
                    .as_ident()
                    .is_some_and(|ident| ident.builtin_name().is_some());
                if !is_builtin {
                    self.expr(callee)?;
                }
                self.all(args)
            }
            ExprKind::Break(inner) | ExprKind::Continue(inner) | ExprKind::Return(inner) => {
                match inner {
                    Some(inner) => self.expr(inner),
                    None => Ok(()),
                }
            }
            ExprKind::Throw(inner) | ExprKind::Assume(inner) | ExprKind::Assert(inner) => {
                self.expr(inner)
            }
            ExprKind::Repeat(body) | ExprKind::Sequence(body) => self.sequence(body),
            ExprKind::ForEach {
                binding,
                iterable,
                body,
            } => {
                self.expr(iterable)?;
                self.scopes.enter_block();
                self.scopes.declare(binding.name, expr.id)?;
                self.sequence(body)?;
                self.scopes.exit()
            }
            ExprKind::Try {
                body,
                catch,
                finally,
            } => {
                self.sequence(body)?;
                if let Some(catch) = catch {
                    self.scopes.enter_block();
                    if let Some(binding) = catch.binding {
                        self.scopes.declare(binding.name, expr.id)?;
                    }
                    self.sequence(catch.body)?;
                    self.scopes.exit()?;
                }
                match finally {
                    Some(finally) => self.sequence(finally),
                    None => Ok(()),
                }
            }
        }
    }

    fn all(&mut self, items: &'a [&'a Expr<'a>]) -> Result<(), PassError> {
        items.iter().try_for_each(|item| self.expr(item))
    }

    fn sequence(&mut self, body: &'a Sequence<'a>) -> Result<(), PassError> {
        self.scopes.enter_block();
        self.all(body.items)?;
        self.scopes.exit()
    }

    /// The initializer is resolved before the name is bound, except for
    /// function literals, which may call themselves.
    fn declaration(&mut self, node: &'a Expr<'a>, decl: &'a Declaration<'a>) -> Result<(), PassError> {
        match decl.init {
            Some(init) if matches!(init.kind, ExprKind::Function(_)) => {
                self.scopes.declare(decl.name.name, node.id)?;
                self.expr(init)
            }
            Some(init) => {
                self.expr(init)?;
                self.scopes.declare(decl.name.name, node.id)
            }
            None => self.scopes.declare(decl.name.name, node.id),
        }
    }

    fn declare(&mut self, node: &'a Expr<'a>, decl: &'a Declaration<'a>) -> Result<(), PassError> {
        self.scopes.declare(decl.name.name, node.id)
    }

    fn function(&mut self, def: &'a FunctionDef<'a>) -> Result<(), PassError> {
        self.scopes.enter_params(def)?;
        for param in def.params.iter().chain(def.receiver) {
            if let Some(default) = param.default() {
                self.expr(default)?;
            }
            self.scopes.declare(param.name(), param.id)?;
        }
        self.sequence(def.body)?;
        self.scopes.exit()
    }

    fn use_name(&mut self, node: &'a Expr<'a>, ident: Ident<'a>) -> Result<(), PassError> {
        if ident.category == IdentCategory::Attribute || ident.builtin_name().is_some() {
            return Ok(());
        }
        match self.scopes.lookup(ident.name) {
            Some(declaration) => {
                self.resolution.link(node.id, declaration);
                Ok(())
            }
            None => self.report(node, ident),
        }
    }

    fn report(&mut self, node: &'a Expr<'a>, ident: Ident<'a>) -> Result<(), PassError> {
        self.diagnostics
            .emit_at(DiagnosticKind::UnresolvedIdentifier, node.line, &[node.id], &[&ident.name])?;
        Ok(())
    }
}
