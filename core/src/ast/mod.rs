//! Syntax tree produced by the parser.
//!
//! Nodes are allocated in a `bumpalo` arena and refer to their children through
//! `&'a` references and slices, so a parsed program is a tree of plain `Copy`
//! references that lives exactly as long as its arena.
//!
//! The tree is immutable after parsing. Information computed by later passes
//! (name resolution, inferred types) is kept in side tables keyed by
//! [`NodeId`], never written back into the nodes.

mod ident;
mod types;

pub use ident::{Ident, IdentCategory};
pub use types::{SimpleType, TypeExpr};

/// Identity of a node within one parse session.
///
/// Ids are handed out in creation order. The prelude and the user program are
/// parsed into the same id space so side tables never see collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A parsed program: the ordered top-level items.
#[derive(Debug, Clone, Copy)]
pub struct Program<'a> {
    pub items: &'a [&'a Expr<'a>],
    /// First id not used by this program.
    pub next_id: u32,
}

#[derive(Debug)]
pub struct Expr<'a> {
    pub id: NodeId,
    /// Source line of the first character of the node (1-based).
    pub line: u32,
    /// `@name` annotations written in front of the node.
    pub attributes: &'a [Ident<'a>],
    pub kind: ExprKind<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum ExprKind<'a> {
    /// Integer literal, kept as canonical decimal digits with an optional
    /// leading `-`.
    Int(&'a str),
    Bool(bool),
    Char(char),
    Void,
    Ident(Ident<'a>),
    /// Operator application, including member access (`.`) and type
    /// ascriptions (`:`) that did not become declarations.
    Binary {
        op: Ident<'a>,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },
    Assign {
        target: &'a Expr<'a>,
        value: &'a Expr<'a>,
    },
    Declaration(&'a Declaration<'a>),
    /// Array literal. Evaluation produces a `Value::Array`; the literal itself
    /// is never marked as evaluated.
    Array(&'a [&'a Expr<'a>]),
    Function(&'a FunctionDef<'a>),
    Struct(&'a StructDef<'a>),
    New(&'a Expr<'a>),
    If {
        test: &'a Expr<'a>,
        then: &'a Sequence<'a>,
        otherwise: Option<&'a Sequence<'a>>,
    },
    Apply {
        callee: &'a Expr<'a>,
        args: &'a [&'a Expr<'a>],
    },
    Import(&'a Expr<'a>),
    Goto(Ident<'a>),
    Label(Ident<'a>),
    Break(Option<&'a Expr<'a>>),
    Continue(Option<&'a Expr<'a>>),
    Return(Option<&'a Expr<'a>>),
    Repeat(&'a Sequence<'a>),
    ForEach {
        binding: Ident<'a>,
        iterable: &'a Expr<'a>,
        body: &'a Sequence<'a>,
    },
    Throw(&'a Expr<'a>),
    Try {
        body: &'a Sequence<'a>,
        catch: Option<Catch<'a>>,
        finally: Option<&'a Sequence<'a>>,
    },
    Assume(&'a Expr<'a>),
    Assert(&'a Expr<'a>),
    Sequence(&'a Sequence<'a>),
    /// Placeholder for input the parser could not make sense of.
    Error,
}

#[derive(Debug, Clone, Copy)]
pub struct Declaration<'a> {
    pub name: Ident<'a>,
    pub ty: Option<&'a TypeExpr<'a>>,
    pub init: Option<&'a Expr<'a>>,
    /// Declared with `var`.
    pub mutable: bool,
}

#[derive(Debug)]
pub struct Param<'a> {
    pub id: NodeId,
    pub line: u32,
    pub attributes: &'a [Ident<'a>],
    pub decl: Declaration<'a>,
}

impl<'a> Param<'a> {
    pub fn name(&self) -> &'a str {
        self.decl.name.name
    }

    pub fn default(&self) -> Option<&'a Expr<'a>> {
        self.decl.init
    }
}

#[derive(Debug)]
pub struct FunctionDef<'a> {
    pub params: &'a [Param<'a>],
    pub body: &'a Sequence<'a>,
    /// Number of leading parameters without a default value.
    pub mandatory: usize,
    /// Extension receiver, bound to the value left of `.` in `v.f(...)`.
    pub receiver: Option<&'a Param<'a>>,
    /// Written as `fn x => expr` rather than with a braced body.
    pub arrow: bool,
}

#[derive(Debug)]
pub struct StructDef<'a> {
    pub items: &'a [&'a Expr<'a>],
}

#[derive(Debug)]
pub struct Sequence<'a> {
    pub items: &'a [&'a Expr<'a>],
}

#[derive(Debug, Clone, Copy)]
pub struct Catch<'a> {
    pub binding: Option<Ident<'a>>,
    pub body: &'a Sequence<'a>,
}

impl<'a> Expr<'a> {
    pub fn as_ident(&self) -> Option<Ident<'a>> {
        match self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// Splits a member access `base.member` into its parts.
    pub fn as_member_access(&self) -> Option<(&'a Expr<'a>, &'a Expr<'a>)> {
        match self.kind {
            ExprKind::Binary { op, left, right } if op.name == "." => Some((left, right)),
            _ => None,
        }
    }

    /// Whether evaluating this node for its value alone can have no effect.
    pub fn is_pure_value(&self) -> bool {
        match self.kind {
            ExprKind::Int(_)
            | ExprKind::Bool(_)
            | ExprKind::Char(_)
            | ExprKind::Void
            | ExprKind::Ident(_)
            | ExprKind::Function(_)
            | ExprKind::Struct(_) => true,
            ExprKind::Array(items) => items.iter().all(|item| item.is_pure_value()),
            _ => false,
        }
    }

    /// Direct sub-expressions in source order.
    ///
    /// Parameters, struct members and sequence items are included; type
    /// expressions are not.
    pub fn children(&self) -> Vec<&'a Expr<'a>> {
        let mut out = Vec::new();
        match &self.kind {
            ExprKind::Int(_)
            | ExprKind::Bool(_)
            | ExprKind::Char(_)
            | ExprKind::Void
            | ExprKind::Ident(_)
            | ExprKind::Goto(_)
            | ExprKind::Label(_)
            | ExprKind::Error => {}
            ExprKind::Binary { left, right, .. } => out.extend([*left, *right]),
            ExprKind::Assign { target, value } => out.extend([*target, *value]),
            ExprKind::Declaration(decl) => out.extend(decl.init),
            ExprKind::Array(items) => out.extend(items.iter().copied()),
            ExprKind::Function(def) => {
                out.extend(def.params.iter().filter_map(|p| p.default()));
                out.extend(def.receiver.and_then(|p| p.default()));
                out.extend(def.body.items.iter().copied());
            }
            ExprKind::Struct(def) => out.extend(def.items.iter().copied()),
            ExprKind::New(inner)
            | ExprKind::Import(inner)
            | ExprKind::Throw(inner)
            | ExprKind::Assume(inner)
            | ExprKind::Assert(inner) => out.push(*inner),
            ExprKind::If {
                test,
                then,
                otherwise,
            } => {
                out.push(*test);
                out.extend(then.items.iter().copied());
                if let Some(otherwise) = otherwise {
                    out.extend(otherwise.items.iter().copied());
                }
            }
            ExprKind::Apply { callee, args } => {
                out.push(*callee);
                out.extend(args.iter().copied());
            }
            ExprKind::Break(guard) | ExprKind::Continue(guard) | ExprKind::Return(guard) => {
                out.extend(*guard)
            }
            ExprKind::Repeat(body) | ExprKind::Sequence(body) => {
                out.extend(body.items.iter().copied())
            }
            ExprKind::ForEach { iterable, body, .. } => {
                out.push(*iterable);
                out.extend(body.items.iter().copied());
            }
            ExprKind::Try {
                body,
                catch,
                finally,
            } => {
                out.extend(body.items.iter().copied());
                if let Some(catch) = catch {
                    out.extend(catch.body.items.iter().copied());
                }
                if let Some(finally) = finally {
                    out.extend(finally.items.iter().copied());
                }
            }
        }
        out
    }
}

impl<'a> Sequence<'a> {
    pub const EMPTY: Sequence<'static> = Sequence { items: &[] };

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    fn node<'a>(arena: &'a Bump, id: u32, kind: ExprKind<'a>) -> &'a Expr<'a> {
        arena.alloc(Expr {
            id: NodeId(id),
            line: 1,
            attributes: &[],
            kind,
        })
    }

    #[test]
    fn test_member_access_split() {
        let arena = Bump::new();
        let left = node(&arena, 0, ExprKind::Ident(Ident::new("a")));
        let right = node(&arena, 1, ExprKind::Ident(Ident::new("b")));
        let access = node(
            &arena,
            2,
            ExprKind::Binary {
                op: Ident::new("."),
                left,
                right,
            },
        );
        let (base, member) = access.as_member_access().unwrap();
        assert_eq!(base.id, NodeId(0));
        assert_eq!(member.as_ident().unwrap().name, "b");
    }

    #[test]
    fn test_pure_values() {
        let arena = Bump::new();
        let one = node(&arena, 0, ExprKind::Int("1"));
        let items = arena.alloc_slice_copy(&[one]);
        assert!(node(&arena, 1, ExprKind::Array(items)).is_pure_value());
        let call = node(&arena, 2, ExprKind::Apply { callee: one, args: &[] });
        assert!(!call.is_pure_value());
    }

    #[test]
    fn test_children_of_if() {
        let arena = Bump::new();
        let test = node(&arena, 0, ExprKind::Bool(true));
        let a = node(&arena, 1, ExprKind::Int("1"));
        let b = node(&arena, 2, ExprKind::Int("2"));
        let then = arena.alloc(Sequence {
            items: arena.alloc_slice_copy(&[a]),
        });
        let otherwise = arena.alloc(Sequence {
            items: arena.alloc_slice_copy(&[b]),
        });
        let cond = node(
            &arena,
            3,
            ExprKind::If {
                test,
                then,
                otherwise: Some(otherwise),
            },
        );
        let ids: Vec<u32> = cond.children().iter().map(|c| c.id.0).collect();
        assert_eq!(ids, [0, 1, 2]);
    }
}
