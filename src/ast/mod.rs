//! Abstract Syntax Tree (AST) definitions for the Octa language.
//!
//! A compilation unit is exactly one [`Function`] introduced by `block`.
//! The tree is produced by the parser and only read afterwards.

mod printer;

use serde::{Deserialize, Serialize};

/// Span information for source location tracking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// Root node: the single block of a source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub body: Vec<Statement>,
    pub span: Span,
}

impl Function {
    pub fn new(name: impl Into<String>, body: Vec<Statement>) -> Self {
        Self {
            name: name.into(),
            body,
            span: Span::dummy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    VarDecl(VarDecl),
    Assign(Assign),
    Print(Print),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::VarDecl(decl) => decl.span,
            Statement::Assign(assign) => assign.span,
            Statement::Print(print) => print.span,
        }
    }
}

/// `var name = initializer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub initializer: Expression,
    pub span: Span,
}

/// `name = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assign {
    pub name: String,
    pub value: Expression,
    pub span: Span,
}

/// `print(target)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Print {
    pub target: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Number(NumberLiteral),
    Variable(VariableRef),
}

impl Expression {
    pub fn number(value: i32) -> Self {
        Expression::Number(NumberLiteral {
            value,
            span: Span::dummy(),
        })
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(VariableRef {
            name: name.into(),
            span: Span::dummy(),
        })
    }

    pub fn span(&self) -> Span {
        match self {
            Expression::Number(lit) => lit.span,
            Expression::Variable(var) => var.span,
        }
    }
}

/// Integer literal; the language has a single signed 32-bit integer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub value: i32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRef {
    pub name: String,
    pub span: Span,
}
