//! Library bindings written in Tarn itself.
//!
//! The prelude is parsed into the same arena and id space as the user program
//! and its items are placed in front of the program's, so both run in one
//! global environment. Operators are ordinary bindings here: `1 + 2` applies
//! whatever `+` is bound to.

use bumpalo::Bump;

use crate::ast::Program;
use crate::diagnostics::Diagnostics;
use crate::parser::{ParseError, Parser};

pub const SOURCE: &str = r#"-- Tarn prelude
var identity = fn x => x

var + = fn a, b => __plus(a, b)
var - = fn a, b => __minus(a, b)
var * = fn a, b => __multiply(a, b)
var == = fn a, b => __equals(a, b)
var < = fn a, b => __less(a, b)
var increment = fn x => x + 1

var and = fn a, b => __and(a, b)
var or = fn a, b => __or(a, b)
var && = fn a, b => __and(a, b)
var || = fn a, b => __or(a, b)

var first = fn array => __at(array, 0)
var rest = fn array => __rest(array)
var at = fn array, index => __at(array, index)
var add = fn array, item => __add(array, item)
var length = fn array => __length(array)

var env = fn target => __env(target)
var print = fn value => __print(value)
"#;

/// Parses the prelude with node ids starting at zero.
///
/// The user program should then be parsed starting at the returned
/// program's `next_id`.
pub fn parse<'a>(arena: &'a Bump, diagnostics: &mut Diagnostics) -> Result<Program<'a>, ParseError> {
    Parser::new(arena, SOURCE, diagnostics).parse_program()
}

/// Parses `source` after the prelude and returns one program holding both.
pub fn parse_with_prelude<'a>(
    arena: &'a Bump,
    source: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Program<'a>, ParseError> {
    let prelude = parse(arena, diagnostics)?;
    let program = Parser::with_first_id(arena, source, diagnostics, prelude.next_id).parse_program()?;
    Ok(prepend(arena, prelude, program))
}

/// Places the items of `prelude` in front of those of `program`.
pub fn prepend<'a>(arena: &'a Bump, prelude: Program<'a>, program: Program<'a>) -> Program<'a> {
    let mut items = Vec::with_capacity(prelude.items.len() + program.items.len());
    items.extend_from_slice(prelude.items);
    items.extend_from_slice(program.items);
    Program {
        items: arena.alloc_slice_copy(&items),
        next_id: program.next_id.max(prelude.next_id),
    }
}
