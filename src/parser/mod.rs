//! Parser module
//!
//! Turns the token stream into a single [`Function`](crate::ast::Function)
//! by recursive descent, one token of lookahead and no backtracking:
//!
//! ```text
//! Function   := "block" identifier "(" ")" Statement*
//! Statement  := VarDecl | Assign | PrintStmt
//! VarDecl    := "var" identifier "=" number
//! Assign     := identifier "=" number
//! PrintStmt  := "print" "(" identifier ")"
//! ```
//!
//! Line breaks separate statements and are skipped between them. What
//! happens to any other token that cannot start a statement is decided by
//! [`StrayTokenPolicy`].

mod parser_impl;
mod stmt_parser;

pub use parser_impl::Parser;

use crate::ast::Function;
use crate::error::ParserError;
use crate::lexer::Token;

pub type ParseError = ParserError;
pub type ParseResult<T> = Result<T, ParseError>;

/// Handling of a token that cannot start a statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrayTokenPolicy {
    /// Drop the token and continue with the next one
    #[default]
    Skip,
    /// Fail with [`ParserError::UnexpectedStatement`]
    Reject,
}

/// Parse a complete token stream with the default (lenient) policy.
pub fn parse(tokens: Vec<Token>) -> ParseResult<Function> {
    Parser::new(tokens).parse()
}
