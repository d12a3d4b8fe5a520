//! Statement parsing

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::TokenKind;

use super::{ParseResult, Parser, StrayTokenPolicy};

impl Parser {
    /// Parse one statement.
    ///
    /// Returns `Ok(None)` when a stray token was skipped under
    /// [`StrayTokenPolicy::Skip`].
    pub(super) fn parse_statement(&mut self) -> ParseResult<Option<Statement>> {
        match self.current_kind() {
            TokenKind::Var => Ok(Some(Statement::VarDecl(self.parse_var_decl()?))),
            TokenKind::Identifier => Ok(Some(Statement::Assign(self.parse_assign()?))),
            TokenKind::Print => Ok(Some(Statement::Print(self.parse_print()?))),
            found => match self.stray_tokens {
                StrayTokenPolicy::Skip => {
                    let token = self.advance();
                    log::debug!(
                        "skipping stray {} at {} (byte offset {})",
                        token,
                        token.position,
                        token.span.start
                    );
                    Ok(None)
                }
                StrayTokenPolicy::Reject => Err(ParserError::UnexpectedStatement {
                    found,
                    span: self.current_span(),
                }),
            },
        }
    }

    /// `var name = number`
    fn parse_var_decl(&mut self) -> ParseResult<VarDecl> {
        let start = self.current_span().start;
        self.expect(TokenKind::Var)?;
        let name = self.expect(TokenKind::Identifier)?.text;
        self.expect(TokenKind::Assign)?;
        let initializer = Expression::Number(self.parse_number()?);

        Ok(VarDecl {
            name,
            initializer,
            span: self.span_from(start),
        })
    }

    /// `name = number`
    fn parse_assign(&mut self) -> ParseResult<Assign> {
        let start = self.current_span().start;
        let name = self.expect(TokenKind::Identifier)?.text;
        self.expect(TokenKind::Assign)?;
        let value = Expression::Number(self.parse_number()?);

        Ok(Assign {
            name,
            value,
            span: self.span_from(start),
        })
    }

    /// `print(name)`
    fn parse_print(&mut self) -> ParseResult<Print> {
        let start = self.current_span().start;
        self.expect(TokenKind::Print)?;
        self.expect(TokenKind::LeftParen)?;
        let name = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::RightParen)?;

        Ok(Print {
            target: Expression::Variable(VariableRef {
                name: name.text,
                span: name.span,
            }),
            span: self.span_from(start),
        })
    }

    /// Number literal; values beyond `i32::MAX` are rejected, not wrapped
    fn parse_number(&mut self) -> ParseResult<NumberLiteral> {
        let token = self.expect(TokenKind::Number)?;
        match token.text.parse::<i32>() {
            Ok(value) => Ok(NumberLiteral {
                value,
                span: token.span,
            }),
            Err(_) => Err(ParserError::InvalidNumber {
                literal: token.text,
                span: token.span,
            }),
        }
    }
}
