//! Canonical source rendering of the AST.
//!
//! The output of `Function`'s `Display` parses back into the same tree
//! (spans aside) for every tree the parser can produce.

use super::{Assign, Expression, Function, Print, Statement, VarDecl};
use std::fmt;

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "block {}()", self.name)?;
        for stmt in &self.body {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::VarDecl(VarDecl {
                name, initializer, ..
            }) => write!(f, "var {} = {}", name, initializer),
            Statement::Assign(Assign { name, value, .. }) => write!(f, "{} = {}", name, value),
            Statement::Print(Print { target, .. }) => write!(f, "print({})", target),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(lit) => write!(f, "{}", lit.value),
            Expression::Variable(var) => write!(f, "{}", var.name),
        }
    }
}
