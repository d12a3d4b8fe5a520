//! Unified error handling module
//!
//! Every stage has its own error enum; [`OctaError`] wraps them so the
//! pipeline can propagate with `?`, and renders them as codespan
//! diagnostics for the driver.

use crate::ast::Span;
use crate::lexer::TokenKind;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::path::PathBuf;
use thiserror::Error;

/// Compiler-wide error type
#[derive(Error, Debug, Clone)]
pub enum OctaError {
    #[error("lexical error: {0}")]
    Lexer(#[from] LexerError),

    #[error("parse error: {0}")]
    Parser(#[from] ParserError),

    #[error("codegen error: {0}")]
    Codegen(#[from] CodegenError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("link error: {0}")]
    Link(#[from] LinkError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("usage error: {0}")]
    Usage(String),

    /// Batch summary once every input has been attempted
    #[error("{failed} of {total} input file(s) failed to compile")]
    Failed { failed: usize, total: usize },

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    #[error("unrecognized character '{character}' at byte offset {offset}")]
    UnrecognizedCharacter { character: char, offset: usize },
}

impl LexerError {
    pub fn span(&self) -> Span {
        match self {
            LexerError::UnrecognizedCharacter { character, offset } => {
                Span::new(*offset, offset + character.len_utf8())
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("expected {expected}, found {found} at byte offset {}", .span.start)]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        span: Span,
    },

    #[error("{found} cannot start a statement (byte offset {})", .span.start)]
    UnexpectedStatement { found: TokenKind, span: Span },

    #[error("number literal {literal} does not fit in a 32-bit signed integer")]
    InvalidNumber { literal: String, span: Span },
}

impl ParserError {
    pub fn span(&self) -> Span {
        match self {
            ParserError::UnexpectedToken { span, .. }
            | ParserError::UnexpectedStatement { span, .. }
            | ParserError::InvalidNumber { span, .. } => *span,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("undeclared variable: {name}")]
    UndeclaredVariable { name: String, span: Span },

    #[error("duplicate declaration: {name}")]
    DuplicateDeclaration { name: String, span: Span },

    #[error("only integer literals are supported in this position")]
    UnsupportedExpression { span: Span },

    /// Failure inside the IR builder itself
    #[error("IR builder failure: {message}")]
    Builder { message: String },
}

impl CodegenError {
    pub fn span(&self) -> Option<Span> {
        match self {
            CodegenError::UndeclaredVariable { span, .. }
            | CodegenError::DuplicateDeclaration { span, .. }
            | CodegenError::UnsupportedExpression { span } => Some(*span),
            CodegenError::Builder { .. } => None,
        }
    }
}

impl From<inkwell::builder::BuilderError> for CodegenError {
    fn from(e: inkwell::builder::BuilderError) -> Self {
        CodegenError::Builder {
            message: format!("LLVM builder error: {:?}", e),
        }
    }
}

/// Failures while lowering a finished module to an artifact
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    #[error("target initialization failed: {message}")]
    TargetInit { message: String },

    #[error("module verification failed: {message}")]
    Verification { message: String },

    #[error("failed to write {}: {}", .path.display(), .message)]
    Emit { path: PathBuf, message: String },
}

/// Failures of the external linker step
#[derive(Error, Debug, Clone)]
pub enum LinkError {
    #[error("could not run `{tool}`: {message}")]
    ToolUnavailable { tool: String, message: String },

    #[error("`{tool}` exited with {status}\n{stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("cannot write {}: {}", .path.display(), .message)]
    Scratch { path: PathBuf, message: String },

    #[error("`{name}` cannot be used as the entry symbol: {reason}")]
    InvalidEntry { name: String, reason: String },
}

impl From<std::io::Error> for OctaError {
    fn from(e: std::io::Error) -> Self {
        OctaError::Io(e.to_string())
    }
}

impl OctaError {
    /// Source location the error points at, if any.
    pub fn span(&self) -> Option<Span> {
        match self {
            OctaError::Lexer(e) => Some(e.span()),
            OctaError::Parser(e) => Some(e.span()),
            OctaError::Codegen(e) => e.span(),
            _ => None,
        }
    }

    /// Convert into a codespan-reporting diagnostic for the given file.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        let hint = match self {
            OctaError::Lexer(_) => "unrecognized character",
            OctaError::Parser(ParserError::UnexpectedToken { expected, .. }) => {
                if *expected == TokenKind::Identifier {
                    "expected a name here"
                } else {
                    "unexpected token"
                }
            }
            OctaError::Parser(ParserError::UnexpectedStatement { .. }) => "not a statement",
            OctaError::Parser(ParserError::InvalidNumber { .. }) => "out of range",
            OctaError::Codegen(CodegenError::UndeclaredVariable { .. }) => {
                "declare it first with `var`"
            }
            OctaError::Codegen(CodegenError::DuplicateDeclaration { .. }) => "already declared",
            OctaError::Codegen(CodegenError::UnsupportedExpression { .. }) => {
                "expected an integer literal"
            }
            _ => "",
        };

        let labels = self
            .span()
            .map(|span| Label::primary(file_id, span.start..span.end).with_message(hint))
            .into_iter()
            .collect();

        Diagnostic::error()
            .with_message(self.to_string())
            .with_labels(labels)
    }
}

/// Result type alias
pub type OctaResult<T> = Result<T, OctaError>;
