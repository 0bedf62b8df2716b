//! Terms: literals, keyword forms, blocks, and postfix calls.

use super::expressions::declaration;
use super::operators::PREC_DOT;
use super::{PResult, Parser, is_word_char};
use crate::ast::{
    Catch, Declaration, Expr, ExprKind, FunctionDef, Ident, Param, Sequence, StructDef,
};
use crate::diagnostics::DiagnosticKind;

const RECEIVER: &str = "@receiver";

impl<'a, 'd> Parser<'a, 'd> {
    /// A term with its attributes, followed by any calls applied to it.
    pub(super) fn parse_postfix(&mut self) -> PResult<&'a Expr<'a>> {
        self.skip_trivia()?;
        let line = self.line;
        let attributes = self.parse_attributes()?;
        let term = if attributes.is_empty() {
            self.parse_primary()?
        } else if self.can_start_term() {
            let term = self.parse_primary()?;
            self.with_attributes(term, attributes)
        } else {
            let names: Vec<&str> = attributes.iter().map(|a| a.name).collect();
            self.emit(DiagnosticKind::DanglingAttribute, line, &[&names.join(" ")])?;
            let placeholder = self.error_node(line);
            return Ok(self.with_attributes(placeholder, attributes));
        };
        self.parse_calls(term)
    }

    fn parse_attributes(&mut self) -> PResult<&'a [Ident<'a>]> {
        let mut attributes = Vec::new();
        while self.peek() == Some('@') {
            let rest = self.rest();
            let end = rest[1..]
                .find(|c: char| !is_word_char(c))
                .map_or(rest.len(), |i| i + 1);
            self.advance(end);
            attributes.push(Ident::new(&rest[..end]));
            self.skip_trivia()?;
        }
        Ok(self.arena.alloc_slice_copy(&attributes))
    }

    /// Folds `(args)` that follow on the same line into applications.
    pub(super) fn parse_calls(&mut self, mut callee: &'a Expr<'a>) -> PResult<&'a Expr<'a>> {
        loop {
            self.skip_trivia()?;
            if self.newline_skipped || self.peek() != Some('(') {
                return Ok(callee);
            }
            self.bump();
            let args = self.parse_list(')')?;
            callee = self.node(callee.line, ExprKind::Apply { callee, args });
        }
    }

    /// Comma-separated expressions up to `close`; the opener is consumed.
    fn parse_list(&mut self, close: char) -> PResult<&'a [&'a Expr<'a>]> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat(close) {
                break;
            }
            if self.peek().is_none() {
                self.expected(&format!("'{close}'"))?;
                break;
            }
            items.push(self.parse_expr()?);
            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                break;
            }
            self.expected(&format!("',' or '{close}'"))?;
            break;
        }
        Ok(self.arena.alloc_slice_copy(&items))
    }

    pub(super) fn parse_primary(&mut self) -> PResult<&'a Expr<'a>> {
        self.skip_trivia()?;
        let line = self.line;
        let Some(c) = self.peek() else {
            self.expected("expression")?;
            return Ok(self.error_node(line));
        };
        match c {
            '0'..='9' => Ok(self.parse_int(line)),
            '-' if self.peek_nth(1).is_some_and(|d| d.is_ascii_digit()) => Ok(self.parse_int(line)),
            '\'' => self.parse_char(line),
            '"' => self.parse_string(line),
            '{' => {
                let body = self.parse_block()?;
                Ok(self.node(line, ExprKind::Sequence(body)))
            }
            '[' => {
                self.bump();
                let items = self.parse_list(']')?;
                Ok(self.node(line, ExprKind::Array(items)))
            }
            '(' => self.parse_paren(line),
            c if super::is_word_start(c) => self.parse_word(line),
            c => {
                self.bump();
                self.emit(DiagnosticKind::UnexpectedCharacter, line, &[&c])?;
                Ok(self.error_node(line))
            }
        }
    }

    fn parse_int(&mut self, line: u32) -> &'a Expr<'a> {
        let negative = self.eat('-');
        let rest = self.rest();
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        self.advance(end);
        let digits = rest[..end].trim_start_matches('0');
        let text = match (negative, digits.is_empty()) {
            (_, true) => "0",
            (false, false) => digits,
            (true, false) => self.arena.alloc_str(&format!("-{digits}")),
        };
        self.node(line, ExprKind::Int(text))
    }

    fn parse_char(&mut self, line: u32) -> PResult<&'a Expr<'a>> {
        let start = self.pos;
        self.bump();
        let mut closed = false;
        let value = match self.bump() {
            Some('\\') => self.bump().and_then(unescape),
            Some('\'') => {
                closed = true;
                None
            }
            Some('\n') | None => None,
            Some(c) => Some(c),
        };
        if !closed && self.peek() == Some('\'') {
            self.bump();
            closed = true;
        }
        if let (Some(c), true) = (value, closed) {
            return Ok(self.node(line, ExprKind::Char(c)));
        }
        if !closed {
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                self.bump();
                if c == '\'' {
                    break;
                }
            }
        }
        let raw = &self.src[start..self.pos];
        self.emit(DiagnosticKind::InvalidCharLiteral, line, &[&raw])?;
        Ok(self.error_node(line))
    }

    /// A string literal, lowered to an array of characters.
    fn parse_string(&mut self, line: u32) -> PResult<&'a Expr<'a>> {
        self.bump();
        let mut chars = Vec::new();
        let terminated = loop {
            match self.peek() {
                None | Some('\n') => break false,
                Some('"') => {
                    self.bump();
                    break true;
                }
                Some('\\') => {
                    self.bump();
                    if let Some(c) = self.peek().filter(|c| *c != '\n') {
                        self.bump();
                        chars.push(unescape(c).unwrap_or(c));
                    }
                }
                Some(c) => {
                    self.bump();
                    chars.push(c);
                }
            }
        };
        if !terminated {
            let text: String = chars.iter().collect();
            self.emit(DiagnosticKind::UnterminatedString, line, &[&text])?;
        }
        let items: Vec<&'a Expr<'a>> = chars
            .into_iter()
            .map(|c| self.node(line, ExprKind::Char(c)))
            .collect();
        Ok(self.node(line, ExprKind::Array(self.arena.alloc_slice_copy(&items))))
    }

    fn parse_paren(&mut self, line: u32) -> PResult<&'a Expr<'a>> {
        self.bump();
        self.skip_trivia()?;
        if self.eat(')') {
            return Ok(self.node(line, ExprKind::Void));
        }
        let inner = self.parse_expr()?;
        self.skip_trivia()?;
        if !self.eat(')') {
            self.expected("')'")?;
        }
        Ok(inner)
    }

    /// `{ items }`; items are separated by whitespace or `;`.
    fn parse_block(&mut self) -> PResult<&'a Sequence<'a>> {
        self.skip_trivia()?;
        if !self.eat('{') {
            self.expected("'{'")?;
            return Ok(self.sequence(&[]));
        }
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('}') => {
                    self.bump();
                    break;
                }
                None => {
                    self.expected("'}'")?;
                    break;
                }
                Some(';') => {
                    self.bump();
                }
                Some(_) => items.push(self.parse_expr()?),
            }
        }
        Ok(self.sequence(&items))
    }

    /// A braced block, or a single expression standing for one.
    fn parse_branch(&mut self) -> PResult<&'a Sequence<'a>> {
        self.skip_trivia()?;
        if self.peek() == Some('{') {
            self.parse_block()
        } else {
            let item = self.parse_expr()?;
            Ok(self.sequence(&[item]))
        }
    }

    fn parse_word(&mut self, line: u32) -> PResult<&'a Expr<'a>> {
        let Some(word) = self.peek_word() else {
            return Ok(self.error_node(line));
        };
        self.advance(word.len());
        let kind = match word {
            "true" => ExprKind::Bool(true),
            "false" => ExprKind::Bool(false),
            "void" => ExprKind::Void,
            "fn" => return self.parse_function(line),
            "var" => return self.parse_var(line),
            "new" => ExprKind::New(self.parse_binary(PREC_DOT)?),
            "struct" => {
                let body = self.parse_block()?;
                for item in body.items {
                    let valid = match item.kind {
                        ExprKind::Declaration(decl) => decl.mutable,
                        ExprKind::Import(_) => true,
                        _ => false,
                    };
                    if !valid {
                        self.emit_for(DiagnosticKind::InvalidStructMember, item.line, item.id, &[*item])?;
                    }
                }
                ExprKind::Struct(self.arena.alloc(StructDef { items: body.items }))
            }
            "if" => return self.parse_if(line),
            "import" => ExprKind::Import(self.parse_binary(PREC_DOT)?),
            "goto" => ExprKind::Goto(self.expect_name()?),
            "label" => ExprKind::Label(self.expect_name()?),
            "break" => ExprKind::Break(self.parse_guard()?),
            "continue" => ExprKind::Continue(self.parse_guard()?),
            "return" => {
                self.skip_trivia()?;
                if !self.newline_skipped && self.can_start_term() {
                    ExprKind::Return(Some(self.parse_expr()?))
                } else {
                    ExprKind::Return(None)
                }
            }
            "repeat" => ExprKind::Repeat(self.parse_block()?),
            "foreach" => {
                let binding = self.expect_name()?;
                self.skip_trivia()?;
                if !self.eat_keyword("in") {
                    self.expected("'in'")?;
                }
                let iterable = self.parse_expr()?;
                let body = self.parse_block()?;
                ExprKind::ForEach {
                    binding,
                    iterable,
                    body,
                }
            }
            "throw" => ExprKind::Throw(self.parse_expr()?),
            "assume" => ExprKind::Assume(self.parse_expr()?),
            "assert" => ExprKind::Assert(self.parse_expr()?),
            "try" => self.parse_try()?,
            "then" | "else" | "in" | "catch" | "finally" => {
                self.emit(
                    DiagnosticKind::ExpectedToken,
                    line,
                    &[&"expression", &format!("'{word}'")],
                )?;
                ExprKind::Error
            }
            _ => ExprKind::Ident(Ident::new(word)),
        };
        Ok(self.node(line, kind))
    }

    fn expect_name(&mut self) -> PResult<Ident<'a>> {
        self.skip_trivia()?;
        match self.peek_word() {
            Some(word) => {
                self.advance(word.len());
                Ok(Ident::new(word))
            }
            None => {
                self.expected("identifier")?;
                Ok(Ident::new("_"))
            }
        }
    }

    /// The optional `if cond` after `break` and `continue`, on the same line.
    fn parse_guard(&mut self) -> PResult<Option<&'a Expr<'a>>> {
        self.skip_trivia()?;
        if !self.newline_skipped && self.eat_keyword("if") {
            Ok(Some(self.parse_expr()?))
        } else {
            Ok(None)
        }
    }

    fn parse_if(&mut self, line: u32) -> PResult<&'a Expr<'a>> {
        let test = self.parse_expr()?;
        self.skip_trivia()?;
        let then = if self.eat_keyword("then") {
            self.parse_branch()?
        } else {
            self.parse_block()?
        };
        self.skip_trivia()?;
        let otherwise = if self.eat_keyword("else") {
            Some(self.parse_branch()?)
        } else {
            None
        };
        Ok(self.node(
            line,
            ExprKind::If {
                test,
                then,
                otherwise,
            },
        ))
    }

    fn parse_try(&mut self) -> PResult<ExprKind<'a>> {
        let body = self.parse_block()?;
        self.skip_trivia()?;
        let catch = if self.eat_keyword("catch") {
            self.skip_trivia()?;
            let binding = match self.peek_word() {
                Some(_) => Some(self.expect_name()?),
                None => None,
            };
            Some(Catch {
                binding,
                body: self.parse_block()?,
            })
        } else {
            None
        };
        self.skip_trivia()?;
        let finally = if self.eat_keyword("finally") {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(ExprKind::Try {
            body,
            catch,
            finally,
        })
    }

    fn parse_var(&mut self, line: u32) -> PResult<&'a Expr<'a>> {
        self.skip_trivia()?;
        let decl = match self.peek_operator() {
            // An operator binding such as `var + = fn a, b => __plus(a, b)`.
            Some(op) => {
                self.advance(op.len());
                self.skip_trivia()?;
                let init = if self.peek_operator() == Some("=") {
                    self.advance(1);
                    Some(self.parse_binary(super::operators::PREC_ASSIGN)?)
                } else {
                    None
                };
                Declaration {
                    name: Ident::new(op),
                    ty: None,
                    init,
                    mutable: true,
                }
            }
            None => {
                let target = self.parse_expr()?;
                declaration(target, true)?
            }
        };
        Ok(self.node(line, ExprKind::Declaration(self.arena.alloc(decl))))
    }

    fn parse_function(&mut self, line: u32) -> PResult<&'a Expr<'a>> {
        let mut params = Vec::new();
        let mut has_body = true;
        loop {
            self.skip_trivia()?;
            if self.at("=>") || self.peek() == Some('{') {
                break;
            }
            if self.peek().is_none() {
                self.expected("'{' or '=>'")?;
                has_body = false;
                break;
            }
            let param_line = self.line;
            let attributes = self.parse_attributes()?;
            let expr = self.parse_expr()?;
            params.push(Param {
                id: self.fresh_id(),
                line: param_line,
                attributes,
                decl: declaration(expr, false)?,
            });
            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            if !(self.at("=>") || self.peek() == Some('{')) {
                self.expected("',', '{' or '=>'")?;
                has_body = false;
            }
            break;
        }

        let (body, arrow) = if !has_body {
            (self.sequence(&[]), false)
        } else if self.at("=>") {
            self.advance(2);
            let item = self.parse_expr()?;
            (self.sequence(&[item]), true)
        } else {
            (self.parse_block()?, false)
        };

        let receiver = self.take_receiver(&mut params)?;
        let mandatory = params.iter().take_while(|p| p.default().is_none()).count();
        for param in &params[mandatory..] {
            if param.default().is_none() {
                self.emit_for(DiagnosticKind::MissingDefault, param.line, param.id, &[&param.name()])?;
            }
        }

        let def = self.arena.alloc(FunctionDef {
            params: self.arena.alloc_slice_fill_iter(params),
            body,
            mandatory,
            receiver,
            arrow,
        });
        Ok(self.node(line, ExprKind::Function(def)))
    }

    /// Removes a trailing `@receiver` parameter. Receivers elsewhere stay
    /// ordinary parameters and are reported.
    fn take_receiver(&mut self, params: &mut Vec<Param<'a>>) -> PResult<Option<&'a Param<'a>>> {
        let is_receiver = |p: &Param<'_>| p.attributes.iter().any(|a| a.name == RECEIVER);
        let last = params.len().saturating_sub(1);
        for (index, param) in params.iter().enumerate() {
            if index != last && is_receiver(param) {
                self.diagnostics.emit_at(
                    DiagnosticKind::MisplacedReceiver,
                    param.line,
                    &[param.id],
                    &[&param.name()],
                )?;
            }
        }
        match params.last() {
            Some(param) if is_receiver(param) => {
                let receiver = params.pop().map(|p| &*self.arena.alloc(p));
                Ok(receiver)
            }
            _ => Ok(None),
        }
    }
}

fn unescape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '0' => Some('\0'),
        '\\' | '\'' | '"' => Some(c),
        _ => None,
    }
}
