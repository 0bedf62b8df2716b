//! Binary operators, assignment forms and type annotations.

use super::operators::{self, Assoc};
use super::{PResult, ParseError, Parser};
use crate::ast::{Declaration, Expr, ExprKind, Ident, IdentCategory, SimpleType, TypeExpr};
use crate::diagnostics::DiagnosticKind;

impl<'a, 'd> Parser<'a, 'd> {
    pub(super) fn parse_expr(&mut self) -> PResult<&'a Expr<'a>> {
        self.parse_binary(0)
    }

    /// Precedence climbing: folds every operator binding at least as tightly
    /// as `min_prec` into the term parsed first.
    pub(super) fn parse_binary(&mut self, min_prec: u8) -> PResult<&'a Expr<'a>> {
        let mut left = self.parse_postfix()?;
        loop {
            self.skip_trivia()?;
            // An operator starting a line begins a new item.
            if self.newline_skipped {
                break;
            }
            let Some(op) = self.peek_operator() else {
                break;
            };
            let known = operators::lookup(op);
            let info = known.unwrap_or(operators::UNKNOWN);
            if info.prec < min_prec {
                break;
            }
            let line = self.line;
            self.advance(op.len());
            if known.is_none() {
                self.emit(DiagnosticKind::UnknownOperator, line, &[&op])?;
            }

            if op == "." {
                let member = self.parse_member_name()?;
                let access = self.binary(op, left, member);
                left = self.parse_calls(access)?;
                continue;
            }

            let next_min = match info.assoc {
                Assoc::Left => info.prec + 1,
                Assoc::Right => info.prec,
            };
            let right = self.parse_binary(next_min)?;
            left = self.combine(op, left, right)?;
        }
        Ok(left)
    }

    /// The right side of `.`, which must be a bare identifier.
    fn parse_member_name(&mut self) -> PResult<&'a Expr<'a>> {
        self.skip_trivia()?;
        let line = self.line;
        if let Some(word) = self.peek_word() {
            self.advance(word.len());
            return Ok(self.node(line, ExprKind::Ident(Ident::new(word))));
        }
        if self.can_start_term() {
            let term = self.parse_primary()?;
            self.emit_for(DiagnosticKind::ExpectedIdentifier, line, term.id, &[term])?;
        } else {
            let found = self.found();
            self.emit(DiagnosticKind::ExpectedIdentifier, line, &[&found])?;
        }
        Ok(self.error_node(line))
    }

    fn binary(&mut self, op: &'a str, left: &'a Expr<'a>, right: &'a Expr<'a>) -> &'a Expr<'a> {
        self.node(
            left.line,
            ExprKind::Binary {
                op: Ident::new(op),
                left,
                right,
            },
        )
    }

    fn combine(
        &mut self,
        op: &'a str,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    ) -> PResult<&'a Expr<'a>> {
        let line = left.line;
        if op == "=" {
            return Ok(self.node(
                line,
                ExprKind::Assign {
                    target: left,
                    value: right,
                },
            ));
        }
        if let Some(base) = operators::compound_base(op) {
            let value = self.binary(base, left, right);
            return Ok(self.node(
                line,
                ExprKind::Assign {
                    target: left,
                    value,
                },
            ));
        }
        if op == ":" {
            if let Some(name) = left.as_ident() {
                let ty = self.type_expr(right)?;
                let decl = self.arena.alloc(Declaration {
                    name,
                    ty: Some(self.arena.alloc(ty)),
                    init: None,
                    mutable: false,
                });
                let node = self.node(line, ExprKind::Declaration(decl));
                return Ok(self.with_attributes(node, left.attributes));
            }
        }
        Ok(self.binary(op, left, right))
    }

    /// Reads an expression as a type annotation.
    pub(super) fn type_expr(&mut self, expr: &'a Expr<'a>) -> PResult<TypeExpr<'a>> {
        let arena = self.arena;
        let ty = match expr.kind {
            ExprKind::Ident(ident) if ident.category == IdentCategory::Type => {
                match SimpleType::from_name(ident.name) {
                    Some(simple) => TypeExpr::Simple(simple),
                    None => TypeExpr::Class(ident),
                }
            }
            ExprKind::Void => TypeExpr::Simple(SimpleType::Void),
            ExprKind::Array(&[element]) => TypeExpr::Array(arena.alloc(self.type_expr(element)?)),
            ExprKind::Binary { op, .. } if op.name == "|" => {
                let mut alternatives = Vec::new();
                self.sum_alternatives(expr, &mut alternatives)?;
                TypeExpr::Sum(arena.alloc_slice_copy(&alternatives))
            }
            ExprKind::Binary { op, left, right } if op.name == "->" => {
                let param = self.type_expr(left)?;
                let ret = self.type_expr(right)?;
                TypeExpr::Function {
                    params: arena.alloc_slice_copy(&[param]),
                    ret: arena.alloc(ret),
                }
            }
            _ => {
                self.emit_for(DiagnosticKind::ExpectedType, expr.line, expr.id, &[expr])?;
                TypeExpr::Error
            }
        };
        Ok(ty)
    }

    fn sum_alternatives(
        &mut self,
        expr: &'a Expr<'a>,
        out: &mut Vec<TypeExpr<'a>>,
    ) -> PResult<()> {
        match expr.kind {
            ExprKind::Binary { op, left, right } if op.name == "|" => {
                self.sum_alternatives(left, out)?;
                self.sum_alternatives(right, out)
            }
            _ => {
                out.push(self.type_expr(expr)?);
                Ok(())
            }
        }
    }
}

/// Turns a parsed `var` target or parameter into a declaration.
///
/// `x` and `x : T` declare without a value, `x = e` and `x : T = e` with one.
pub(super) fn declaration<'a>(expr: &'a Expr<'a>, mutable: bool) -> PResult<Declaration<'a>> {
    let found = || ParseError::DeclarationExpected {
        line: expr.line,
        found: expr.to_string(),
    };
    match expr.kind {
        ExprKind::Ident(name) => Ok(Declaration {
            name,
            ty: None,
            init: None,
            mutable,
        }),
        ExprKind::Declaration(decl) => Ok(Declaration { mutable, ..*decl }),
        ExprKind::Assign { target, value } => match target.kind {
            ExprKind::Ident(name) => Ok(Declaration {
                name,
                ty: None,
                init: Some(value),
                mutable,
            }),
            ExprKind::Declaration(decl) => Ok(Declaration {
                init: Some(value),
                mutable,
                ..*decl
            }),
            _ => Err(found()),
        },
        _ => Err(found()),
    }
}
