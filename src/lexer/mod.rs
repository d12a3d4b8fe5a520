//! Lexical analysis module for the Octa language.
//!
//! This module turns source text into a flat stream of tokens: the three
//! keywords, identifiers, unsigned numbers, `=`, `(`, `)` and line breaks.
//! Spaces, tabs and carriage returns are skipped. Any other character is a
//! fatal [`LexerError`](crate::error::LexerError).

#[allow(clippy::module_inception)]
mod lexer;
mod token;

pub use lexer::{format_tokens, tokenize, Lexer};
pub use token::{Position, Token, TokenKind};
