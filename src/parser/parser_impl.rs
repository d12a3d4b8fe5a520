//! Parser state and token utilities

use crate::ast::{Function, Span};
use crate::error::ParserError;
use crate::lexer::{Position, Token, TokenKind};

use super::{ParseResult, StrayTokenPolicy};

/// Octa parser
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) stray_tokens: StrayTokenPolicy,
}

impl Parser {
    /// Create a parser over `tokens`.
    ///
    /// A stream that does not end with an end-of-input token gets one
    /// appended, so the parser always has a terminator to stop at.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|t| t.is(TokenKind::EndOfInput)) {
            let (end, position) = tokens
                .last()
                .map(|t| (t.span.end, t.position))
                .unwrap_or((0, Position::new()));
            tokens.push(Token::new(
                TokenKind::EndOfInput,
                "",
                Span::new(end, end),
                position,
            ));
        }
        Self {
            tokens,
            current: 0,
            stray_tokens: StrayTokenPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StrayTokenPolicy) -> Self {
        self.stray_tokens = policy;
        self
    }

    /// Parse the whole stream into the block it defines
    pub fn parse(&mut self) -> ParseResult<Function> {
        self.skip_newlines();
        let start = self.current_span().start;

        self.expect(TokenKind::Block)?;
        let name = self.expect(TokenKind::Identifier)?.text;
        self.expect(TokenKind::LeftParen)?;
        self.expect(TokenKind::RightParen)?;
        log::debug!("parsing block `{}`", name);

        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            if self.is_at_end() {
                break;
            }
            if let Some(stmt) = self.parse_statement()? {
                body.push(stmt);
            }
        }

        Ok(Function {
            name,
            body,
            span: self.span_from(start),
        })
    }

    // ==================== utilities ====================

    /// The token under the cursor; never past the terminator
    pub(super) fn current_token(&self) -> &Token {
        &self.tokens[self.current]
    }

    pub(super) fn current_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    pub(super) fn current_span(&self) -> Span {
        self.current_token().span
    }

    /// Span from `start` to the end of the last consumed token
    pub(super) fn span_from(&self, start: usize) -> Span {
        let end = if self.current > 0 {
            self.tokens[self.current - 1].span.end
        } else {
            start
        };
        Span::new(start, end.max(start))
    }

    /// Consume the current token and return it
    pub(super) fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current_kind() == TokenKind::EndOfInput
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    pub(super) fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Consume a token of the given kind or fail without consuming
    pub(super) fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParserError::UnexpectedToken {
                expected: kind,
                found: self.current_kind(),
                span: self.current_span(),
            })
        }
    }
}
