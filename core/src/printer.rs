//! Renders syntax trees and values back to source-like text.
//!
//! The same renderer serves diagnostics (each argument is a node or a value),
//! the final result of a run, and precedence tests: in braced mode every binary
//! application and assignment is parenthesised, so `1 + 2 * 3` renders as
//! `(1 + (2 * 3))`.

use core::fmt::{self, Write};

use crate::ast::{Declaration, Expr, ExprKind, FunctionDef, Param, Program, Sequence, TypeExpr};
use crate::interpreter::Value;
use crate::parser::operators::{self, Assoc, OpInfo, PREC_ASCRIPTION, PREC_ASSIGN};

#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    pub braced: bool,
}

/// Binding strength of a node that never needs parentheses.
const ATOM: OpInfo = OpInfo {
    prec: u8::MAX,
    assoc: Assoc::Left,
};

impl Printer {
    pub fn new(braced: bool) -> Self {
        Self { braced }
    }

    pub fn braced() -> Self {
        Self { braced: true }
    }

    /// One top-level item per line.
    pub fn program(&self, program: &Program<'_>) -> String {
        program
            .items
            .iter()
            .map(|item| self.expr(item))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn expr(&self, expr: &Expr<'_>) -> String {
        let mut out = String::new();
        self.write_expr(&mut out, expr);
        out
    }

    pub fn value(&self, value: &Value<'_>) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value);
        out
    }

    pub fn type_expr(&self, ty: &TypeExpr<'_>) -> String {
        let mut out = String::new();
        write_type(&mut out, ty);
        out
    }

    fn write_expr(&self, out: &mut String, expr: &Expr<'_>) {
        for attribute in expr.attributes {
            out.push_str(attribute.name);
            out.push(' ');
        }
        match expr.kind {
            ExprKind::Int(digits) => out.push_str(digits),
            ExprKind::Bool(b) => out.push_str(if b { "true" } else { "false" }),
            ExprKind::Char(c) => write_char_literal(out, c),
            ExprKind::Void => out.push_str("void"),
            ExprKind::Ident(ident) => out.push_str(ident.name),
            ExprKind::Binary { op, left, right } => {
                let info = operators::lookup(op.name).unwrap_or(operators::UNKNOWN);
                self.open(out);
                self.write_operand(out, left, info, Side::Left);
                if op.name == "." {
                    out.push('.');
                } else {
                    let _ = write!(out, " {} ", op.name);
                }
                self.write_operand(out, right, info, Side::Right);
                self.close(out);
            }
            ExprKind::Assign { target, value } => {
                let info = binding_strength(expr);
                self.open(out);
                self.write_operand(out, target, info, Side::Left);
                out.push_str(" = ");
                self.write_operand(out, value, info, Side::Right);
                self.close(out);
            }
            ExprKind::Declaration(decl) => self.write_declaration(out, decl),
            ExprKind::Array(items) => {
                let text: Option<String> = items
                    .iter()
                    .map(|item| match item.kind {
                        ExprKind::Char(c) => Some(c),
                        _ => None,
                    })
                    .collect();
                match text {
                    Some(text) if !items.is_empty() => write_string_literal(out, &text),
                    _ => {
                        out.push('[');
                        self.write_list(out, items);
                        out.push(']');
                    }
                }
            }
            ExprKind::Function(def) => self.write_function(out, def),
            ExprKind::Struct(def) => {
                out.push_str("struct ");
                self.write_block(out, def.items);
            }
            ExprKind::New(inner) => {
                out.push_str("new ");
                self.write_expr(out, inner);
            }
            ExprKind::If {
                test,
                then,
                otherwise,
            } => {
                out.push_str("if ");
                self.write_expr(out, test);
                out.push(' ');
                self.write_block(out, then.items);
                if let Some(otherwise) = otherwise {
                    out.push_str(" else ");
                    self.write_block(out, otherwise.items);
                }
            }
            ExprKind::Apply { callee, args } => {
                let needs_parens = match callee.kind {
                    ExprKind::Binary { op, .. } => op.name != ".",
                    ExprKind::Assign { .. }
                    | ExprKind::Declaration(_)
                    | ExprKind::Function(_)
                    | ExprKind::New(_) => true,
                    _ => false,
                };
                if needs_parens && !self.braced_binary(callee) {
                    out.push('(');
                    self.write_expr(out, callee);
                    out.push(')');
                } else {
                    self.write_expr(out, callee);
                }
                out.push('(');
                self.write_list(out, args);
                out.push(')');
            }
            ExprKind::Import(inner) => self.write_keyword(out, "import", Some(inner)),
            ExprKind::Goto(name) => {
                let _ = write!(out, "goto {}", name.name);
            }
            ExprKind::Label(name) => {
                let _ = write!(out, "label {}", name.name);
            }
            ExprKind::Break(guard) => self.write_guarded(out, "break", guard),
            ExprKind::Continue(guard) => self.write_guarded(out, "continue", guard),
            ExprKind::Return(value) => self.write_keyword(out, "return", value),
            ExprKind::Repeat(body) => {
                out.push_str("repeat ");
                self.write_block(out, body.items);
            }
            ExprKind::ForEach {
                binding,
                iterable,
                body,
            } => {
                let _ = write!(out, "foreach {} in ", binding.name);
                self.write_expr(out, iterable);
                out.push(' ');
                self.write_block(out, body.items);
            }
            ExprKind::Throw(inner) => self.write_keyword(out, "throw", Some(inner)),
            ExprKind::Try {
                body,
                catch,
                finally,
            } => {
                out.push_str("try ");
                self.write_block(out, body.items);
                if let Some(catch) = catch {
                    out.push_str(" catch ");
                    if let Some(binding) = catch.binding {
                        out.push_str(binding.name);
                        out.push(' ');
                    }
                    self.write_block(out, catch.body.items);
                }
                if let Some(finally) = finally {
                    out.push_str(" finally ");
                    self.write_block(out, finally.items);
                }
            }
            ExprKind::Assume(inner) => self.write_keyword(out, "assume", Some(inner)),
            ExprKind::Assert(inner) => self.write_keyword(out, "assert", Some(inner)),
            ExprKind::Sequence(body) => self.write_block(out, body.items),
            ExprKind::Error => out.push_str("<error>"),
        }
    }

    fn braced_binary(&self, expr: &Expr<'_>) -> bool {
        self.braced && matches!(expr.kind, ExprKind::Binary { .. } | ExprKind::Assign { .. })
    }

    fn open(&self, out: &mut String) {
        if self.braced {
            out.push('(');
        }
    }

    fn close(&self, out: &mut String) {
        if self.braced {
            out.push(')');
        }
    }

    /// Writes an operand, adding parentheses if the parent would otherwise
    /// capture part of it.
    fn write_operand(&self, out: &mut String, child: &Expr<'_>, parent: OpInfo, side: Side) {
        let own = binding_strength(child);
        let needs_parens = !self.braced
            && (own.prec < parent.prec
                || (own.prec == parent.prec
                    && match side {
                        Side::Left => parent.assoc == Assoc::Right,
                        Side::Right => parent.assoc == Assoc::Left,
                    }));
        if needs_parens {
            out.push('(');
            self.write_expr(out, child);
            out.push(')');
        } else {
            self.write_expr(out, child);
        }
    }

    fn write_declaration(&self, out: &mut String, decl: &Declaration<'_>) {
        if decl.mutable {
            out.push_str("var ");
        }
        out.push_str(decl.name.name);
        if let Some(ty) = decl.ty {
            out.push_str(" : ");
            write_type(out, ty);
        }
        if let Some(init) = decl.init {
            out.push_str(" = ");
            self.write_expr(out, init);
        }
    }

    fn write_param(&self, out: &mut String, param: &Param<'_>) {
        for attribute in param.attributes {
            out.push_str(attribute.name);
            out.push(' ');
        }
        self.write_declaration(out, &param.decl);
    }

    fn write_function(&self, out: &mut String, def: &FunctionDef<'_>) {
        out.push_str("fn");
        let params = def.params.iter().chain(def.receiver);
        for (index, param) in params.enumerate() {
            out.push_str(if index == 0 { " " } else { ", " });
            self.write_param(out, param);
        }
        match def.body.items {
            [item] if def.arrow => {
                out.push_str(" => ");
                self.write_expr(out, item);
            }
            items => {
                out.push(' ');
                self.write_block(out, items);
            }
        }
    }

    fn write_block(&self, out: &mut String, items: &[&Expr<'_>]) {
        if items.is_empty() {
            out.push_str("{ }");
            return;
        }
        out.push_str("{ ");
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                out.push_str("; ");
            }
            self.write_expr(out, item);
        }
        out.push_str(" }");
    }

    fn write_list(&self, out: &mut String, items: &[&Expr<'_>]) {
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            self.write_expr(out, item);
        }
    }

    fn write_keyword(&self, out: &mut String, keyword: &str, operand: Option<&Expr<'_>>) {
        out.push_str(keyword);
        if let Some(operand) = operand {
            out.push(' ');
            self.write_expr(out, operand);
        }
    }

    fn write_guarded(&self, out: &mut String, keyword: &str, guard: Option<&Expr<'_>>) {
        out.push_str(keyword);
        if let Some(guard) = guard {
            out.push_str(" if ");
            self.write_expr(out, guard);
        }
    }

    fn write_value(&self, out: &mut String, value: &Value<'_>) {
        match value {
            Value::Void => out.push_str("void"),
            Value::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Char(c) => write_char_literal(out, *c),
            Value::Array(items) => match value.as_string() {
                Some(text) => write_string_literal(out, &text),
                None => {
                    out.push('[');
                    for (index, item) in items.iter().enumerate() {
                        if index > 0 {
                            out.push_str(", ");
                        }
                        self.write_value(out, item);
                    }
                    out.push(']');
                }
            },
            Value::Function(closure) => self.write_function(out, closure.def),
            Value::Template(def) => {
                out.push_str("struct ");
                self.write_block(out, def.items);
            }
            Value::Instance(instance) => {
                out.push_str("new {");
                for (index, (name, member)) in instance.env.bindings().iter().enumerate() {
                    out.push_str(if index == 0 { " " } else { ", " });
                    let _ = write!(out, "{name} = ");
                    self.write_value(out, member);
                }
                out.push_str(" }");
            }
            Value::Pending(pending) => self.write_expr(out, pending.call),
            Value::Error(placeholder) => {
                out.push_str("<error: ");
                self.write_expr(out, placeholder.node);
                out.push('>');
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// How tightly a node holds together when it appears as an operand.
fn binding_strength(expr: &Expr<'_>) -> OpInfo {
    match expr.kind {
        ExprKind::Binary { op, .. } => operators::lookup(op.name).unwrap_or(operators::UNKNOWN),
        ExprKind::Assign { .. } => OpInfo {
            prec: PREC_ASSIGN,
            assoc: Assoc::Right,
        },
        ExprKind::Declaration(decl) if decl.init.is_some() || decl.mutable => OpInfo {
            prec: PREC_ASSIGN,
            assoc: Assoc::Right,
        },
        ExprKind::Declaration(decl) if decl.ty.is_some() => OpInfo {
            prec: PREC_ASCRIPTION,
            assoc: Assoc::Right,
        },
        // Keyword forms swallow everything to their right.
        ExprKind::Function(_)
        | ExprKind::New(_)
        | ExprKind::Import(_)
        | ExprKind::Return(Some(_))
        | ExprKind::Throw(_)
        | ExprKind::Assume(_)
        | ExprKind::Assert(_) => operators::UNKNOWN,
        _ => ATOM,
    }
}

fn write_type(out: &mut String, ty: &TypeExpr<'_>) {
    match ty {
        TypeExpr::Simple(simple) => out.push_str(simple.name()),
        TypeExpr::Array(element) => {
            out.push('[');
            write_type(out, element);
            out.push(']');
        }
        TypeExpr::Sum(alternatives) => {
            out.push('(');
            for (index, alternative) in alternatives.iter().enumerate() {
                if index > 0 {
                    out.push_str(" | ");
                }
                write_type(out, alternative);
            }
            out.push(')');
        }
        TypeExpr::Function { params, ret } => {
            for (index, param) in params.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_type(out, param);
            }
            out.push_str(" -> ");
            write_type(out, ret);
        }
        TypeExpr::Class(name) => out.push_str(name.name),
        TypeExpr::Error => out.push_str("<error>"),
    }
}

fn escape(c: char, quote: char) -> Option<&'static str> {
    match c {
        '\n' => Some("\\n"),
        '\t' => Some("\\t"),
        '\r' => Some("\\r"),
        '\0' => Some("\\0"),
        '\\' => Some("\\\\"),
        '\'' if quote == '\'' => Some("\\'"),
        '"' if quote == '"' => Some("\\\""),
        _ => None,
    }
}

fn write_char_literal(out: &mut String, c: char) {
    out.push('\'');
    match escape(c, '\'') {
        Some(escaped) => out.push_str(escaped),
        None => out.push(c),
    }
    out.push('\'');
}

fn write_string_literal(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match escape(c, '"') {
            Some(escaped) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out.push('"');
}

impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Printer::default().expr(self))
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Printer::default().value(self))
    }
}

impl fmt::Display for TypeExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Printer::default().type_expr(self))
    }
}

impl fmt::Display for Sequence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        Printer::default().write_block(&mut out, self.items);
        f.write_str(&out)
    }
}
