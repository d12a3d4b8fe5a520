//! Token definitions

use crate::ast::Span;
use logos::Logos;
use serde::Serialize;
use std::fmt;

/// Kinds of tokens in the Octa language
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[logos(skip r"[ \t\r]+")] // Skip whitespace (except newlines)
pub enum TokenKind {
    // Keywords
    #[token("var")]
    Var,
    #[token("print")]
    Print,
    #[token("block")]
    Block,

    // Identifiers (keywords win on an exact match)
    #[regex(r"[A-Za-z][A-Za-z0-9]*", priority = 1)]
    Identifier,

    // Unsigned decimal literal; range is checked by the parser
    #[regex(r"[0-9]+")]
    Number,

    #[token("=")]
    Assign,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,

    #[token("\n")]
    Newline,

    // Produced by the lexer once the input is exhausted
    EndOfInput,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Var => write!(f, "`var`"),
            TokenKind::Print => write!(f, "`print`"),
            TokenKind::Block => write!(f, "`block`"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::Assign => write!(f, "`=`"),
            TokenKind::LeftParen => write!(f, "`(`"),
            TokenKind::RightParen => write!(f, "`)`"),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// Line/column position for error reporting (both 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new() -> Self {
        Position { line: 1, column: 1 }
    }

    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A token with its matched text and location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            position,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier | TokenKind::Number => write!(f, "{}({})", self.kind, self.text),
            _ => write!(f, "{}", self.kind),
        }
    }
}
