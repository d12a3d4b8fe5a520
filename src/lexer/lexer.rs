//! The lexer proper: a logos scanner with position tracking and a
//! terminal end-of-input token.

use logos::Logos;

use super::token::{Position, Token, TokenKind};
use crate::ast::Span;
use crate::error::LexerError;

/// Octa lexer
///
/// Yields every token in source order, then exactly one
/// [`TokenKind::EndOfInput`]. Scanning stops at the first unrecognized
/// character.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    input: &'a str,
    position: Position,
    last_end: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(input),
            input,
            position: Position::new(),
            last_end: 0,
            finished: false,
        }
    }

    /// Scan the next token.
    ///
    /// Once the input is exhausted every further call returns an
    /// end-of-input token located at the end of the source.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        match self.inner.next() {
            Some(Ok(kind)) => {
                let span = self.inner.span();
                let position = self.track(span.start, span.end);
                Ok(Token::new(kind, self.inner.slice(), span.into(), position))
            }
            Some(Err(_)) => {
                let offset = self.inner.span().start;
                let character = self.input[offset..].chars().next().unwrap_or('\u{FFFD}');
                Err(LexerError::UnrecognizedCharacter { character, offset })
            }
            None => {
                let end = self.input.len();
                let position = self.track(end, end);
                Ok(Token::new(
                    TokenKind::EndOfInput,
                    "",
                    Span::new(end, end),
                    position,
                ))
            }
        }
    }

    /// Collect every token including the terminal end-of-input token.
    pub fn collect_tokens(self) -> Result<Vec<Token>, LexerError> {
        self.collect()
    }

    /// Advance the line/column counter over skipped text and the token
    /// itself, returning the position of the token start.
    fn track(&mut self, start: usize, end: usize) -> Position {
        if start > self.last_end {
            for ch in self.input[self.last_end..start].chars() {
                self.position.advance(ch);
            }
        }
        let position = self.position;
        for ch in self.input[start..end].chars() {
            self.position.advance(ch);
        }
        self.last_end = end;
        position
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(token) if token.is(TokenKind::EndOfInput) => self.finished = true,
            Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

/// Tokenize a complete source text.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexerError> {
    Lexer::new(input).collect_tokens()
}

/// Render a token stream one token per line, for `--dump-tokens`.
pub fn format_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{:4}: {} @ {} {:?}", i, t, t.position, t.span.start..t.span.end))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .expect("input should tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_basic_tokenization() {
        assert_eq!(
            kinds("var x = 42"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_token_text() {
        let tokens = tokenize("print(total)").unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["print", "(", "total", ")", ""]);
    }

    #[test]
    fn test_end_of_input_is_yielded_once() {
        let mut lexer = Lexer::new("a");
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::Identifier);
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::EndOfInput);
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_next_token_after_exhaustion() {
        let mut lexer = Lexer::new("");
        let first = lexer.next_token().unwrap();
        let second = lexer.next_token().unwrap();
        assert_eq!(first.kind, TokenKind::EndOfInput);
        assert_eq!(first, second);
    }

    #[test]
    fn test_position_tracking() {
        let tokens = tokenize("block f()\n  var a = 1").unwrap();
        assert_eq!(tokens[0].position, Position { line: 1, column: 1 });
        assert_eq!(tokens[1].position, Position { line: 1, column: 7 });
        // `var` follows the newline and two spaces
        assert_eq!(tokens[5].kind, TokenKind::Var);
        assert_eq!(tokens[5].position, Position { line: 2, column: 3 });
    }

    #[test]
    fn test_error_stops_the_iterator() {
        let mut lexer = Lexer::new("a # b");
        assert!(lexer.next().unwrap().is_ok());
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_format_tokens() {
        let tokens = tokenize("x").unwrap();
        let dump = format_tokens(&tokens);
        assert!(dump.contains("identifier(x)"));
        assert!(dump.contains("end of input"));
    }
}
