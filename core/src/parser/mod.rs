//! Character-level parser for Tarn source.
//!
//! There is no separate tokenizer: the [`Parser`] walks the source text with a
//! byte cursor, skipping whitespace and comments on demand, and builds the
//! arena-allocated AST with recursive descent for terms and precedence
//! climbing for binary operators (see [`operators`]).
//!
//! Malformed input is reported through the [`Diagnostics`] engine and replaced
//! by an `Error` node so that parsing can continue. Only a diagnostic at
//! `Error` severity or a malformed declaration stops the parse.
//!
//! ```ignore
//! let arena = Bump::new();
//! let mut diagnostics = Diagnostics::default();
//! let program = parse(&arena, "var x = 1 + 2", &mut diagnostics)?;
//! assert_eq!(program.items.len(), 1);
//! ```

mod error;
mod expressions;
pub mod operators;
mod primaries;



pub use error::ParseError;

use bumpalo::Bump;

use crate::ast::{Expr, ExprKind, Ident, NodeId, Program, Sequence};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Parses a whole program, numbering nodes from zero.
pub fn parse<'a>(
    arena: &'a Bump,
    source: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Program<'a>, ParseError> {
    Parser::new(arena, source, diagnostics).parse_program()
}

pub struct Parser<'a, 'd> {
    arena: &'a Bump,
    src: &'a str,
    pos: usize,
    line: u32,
    /// Whether the trivia skipped since the last token contained a newline.
    newline_skipped: bool,
    next_id: u32,
    comment_reported: bool,
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd> Parser<'a, 'd> {
    pub fn new(arena: &'a Bump, source: &str, diagnostics: &'d mut Diagnostics) -> Self {
        Self::with_first_id(arena, source, diagnostics, 0)
    }

    /// A parser whose node ids start at `first_id`, so several sources can be
    /// parsed into one id space.
    pub fn with_first_id(
        arena: &'a Bump,
        source: &str,
        diagnostics: &'d mut Diagnostics,
        first_id: u32,
    ) -> Self {
        Self {
            arena,
            src: arena.alloc_str(source),
            pos: 0,
            line: 1,
            newline_skipped: false,
            next_id: first_id,
            comment_reported: false,
            diagnostics,
        }
    }

    pub fn parse_program(mut self) -> Result<Program<'a>, ParseError> {
        tracing::debug!(bytes = self.src.len(), first_id = self.next_id, "parsing program");
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => break,
                Some(';') => {
                    self.bump();
                }
                Some(_) => items.push(self.parse_expr()?),
            }
        }
        tracing::debug!(items = items.len(), lines = self.line, "parsed program");
        Ok(Program {
            items: self.arena.alloc_slice_copy(&items),
            next_id: self.next_id,
        })
    }

    // Cursor

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn at(&self, text: &str) -> bool {
        self.rest().starts_with(text)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        self.newline_skipped = false;
        Some(c)
    }

    /// Moves past `len` bytes that contain no line break.
    fn advance(&mut self, len: usize) {
        self.pos += len;
        self.newline_skipped = false;
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Skips whitespace, `--` line comments and `/* */` block comments.
    ///
    /// Calling it again without consuming anything is a no-op.
    fn skip_trivia(&mut self) -> PResult<()> {
        loop {
            let rest = self.rest();
            if let Some(c) = rest.chars().next().filter(|c| c.is_whitespace()) {
                self.pos += c.len_utf8();
                if c == '\n' {
                    self.line += 1;
                    self.newline_skipped = true;
                }
            } else if rest.starts_with("--") {
                self.pos += rest.find('\n').unwrap_or(rest.len());
            } else if rest.starts_with("/*") {
                let start_line = self.line;
                match rest[2..].find("*/") {
                    Some(close) => {
                        let comment = &rest[..close + 4];
                        self.count_lines(comment);
                        self.pos += comment.len();
                    }
                    None => {
                        self.count_lines(rest);
                        self.pos = self.src.len();
                        if !self.comment_reported {
                            self.comment_reported = true;
                            self.emit(DiagnosticKind::UnterminatedComment, start_line, &[])?;
                        }
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    fn count_lines(&mut self, text: &str) {
        let newlines = text.matches('\n').count() as u32;
        if newlines > 0 {
            self.line += newlines;
            self.newline_skipped = true;
        }
    }

    fn peek_word(&self) -> Option<&'a str> {
        let rest = self.rest();
        if !rest.starts_with(is_word_start) {
            return None;
        }
        let end = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
        Some(&rest[..end])
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_word() == Some(keyword) {
            self.advance(keyword.len());
            true
        } else {
            false
        }
    }

    /// The operator at the cursor, read with maximal munch. `=>` ends a
    /// parameter list and is never an operator.
    fn peek_operator(&self) -> Option<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !operators::is_operator_char(c))
            .unwrap_or(rest.len());
        let op = &rest[..end];
        if op.is_empty() || op.starts_with("=>") {
            None
        } else {
            Some(op)
        }
    }

    /// Whether the next character can begin a term.
    fn can_start_term(&self) -> bool {
        match self.peek() {
            None => false,
            Some(c) => !matches!(c, ')' | ']' | '}' | ',' | ';'),
        }
    }

    fn found(&self) -> String {
        match self.peek() {
            None => "end of input".to_string(),
            Some(c) => format!("'{c}'"),
        }
    }

    // Node construction

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn node(&mut self, line: u32, kind: ExprKind<'a>) -> &'a Expr<'a> {
        let id = self.fresh_id();
        self.arena.alloc(Expr {
            id,
            line,
            attributes: &[],
            kind,
        })
    }

    fn error_node(&mut self, line: u32) -> &'a Expr<'a> {
        self.node(line, ExprKind::Error)
    }

    fn with_attributes(&self, node: &'a Expr<'a>, attributes: &'a [Ident<'a>]) -> &'a Expr<'a> {
        self.arena.alloc(Expr {
            id: node.id,
            line: node.line,
            attributes,
            kind: node.kind,
        })
    }

    fn sequence(&self, items: &[&'a Expr<'a>]) -> &'a Sequence<'a> {
        self.arena.alloc(Sequence {
            items: self.arena.alloc_slice_copy(items),
        })
    }

    fn emit(
        &mut self,
        kind: DiagnosticKind,
        line: u32,
        args: &[&dyn core::fmt::Display],
    ) -> PResult<()> {
        self.diagnostics.emit(kind, line, args)?;
        Ok(())
    }

    /// Reports `kind` against the node `id`.
    fn emit_for(
        &mut self,
        kind: DiagnosticKind,
        line: u32,
        id: NodeId,
        args: &[&dyn core::fmt::Display],
    ) -> PResult<()> {
        self.diagnostics.emit_at(kind, line, &[id], args)?;
        Ok(())
    }

    /// Reports that `what` was expected at the cursor.
    fn expected(&mut self, what: &str) -> PResult<()> {
        let found = self.found();
        let line = self.line;
        self.emit(DiagnosticKind::ExpectedToken, line, &[&what, &found])
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
