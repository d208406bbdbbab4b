//! A small ES5 parser producing the [ast] tree, with JSDoc comments attached
//! to the nodes they annotate.

pub mod error;
mod jsdoc;
pub mod lexer;
mod parser;
pub mod token;

pub use error::{Error, PResult, SyntaxError};
pub use jsdoc::{parse_inline_type, parse_jsdoc};
pub use parser::Parser;

use ast::{Ast, JsWord, NodeId};

/// Parses `src` as a script appended to `ast`'s root.
pub fn parse_script(ast: &mut Ast, source_name: &str, src: &str) -> PResult<NodeId> {
    Parser::new(ast, JsWord::from(source_name), src, false).parse_script()
}

/// Parses `src` as an externs script. Every node is marked as coming from
/// externs.
pub fn parse_externs(ast: &mut Ast, source_name: &str, src: &str) -> PResult<NodeId> {
    Parser::new(ast, JsWord::from(source_name), src, true).parse_script()
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests;
