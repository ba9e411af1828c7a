//! Token stream wrapper for the hand-written parser.

use logos::Span;

use super::ParseError;
use crate::lexer::{Spanned, Token};

/// Token stream with lookahead and position tracking.
pub struct TokenStream<'t, 'src> {
    tokens: &'t [Spanned<Token<'src>>],
    pos: usize,
    /// Byte offset of the end of the source, for end-of-input spans
    end: usize,
}

impl<'t, 'src> TokenStream<'t, 'src> {
    /// Create a new token stream over a source of `source_len` bytes.
    pub fn new(tokens: &'t [Spanned<Token<'src>>], source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end: source_len,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&'t Token<'src>> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&'t Spanned<Token<'src>>> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if we've reached the end of the token stream.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Whether the current token starts a directive
    pub fn at_directive(&self) -> bool {
        self.peek().is_some_and(Token::is_directive_keyword)
    }

    /// Span of the current token, or an empty span at end of input.
    pub fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map_or(self.end..self.end, |t| t.span.clone())
    }

    /// Consume the current token if `accept` maps it to a value.
    ///
    /// Otherwise leaves the stream where it is and reports what was
    /// `expected`.
    pub fn expect_with<T>(
        &mut self,
        expected: &str,
        accept: impl FnOnce(&'t Token<'src>) -> Option<T>,
    ) -> Result<(T, Span), ParseError> {
        let span = self.current_span();
        match self.peek().and_then(accept) {
            Some(value) => {
                self.advance();
                Ok((value, span))
            }
            None => Err(ParseError::expected(expected, self.peek(), span)),
        }
    }

    /// Synchronize to the next directive keyword for error recovery.
    ///
    /// Skips tokens until we find a directive keyword or EOF.
    pub fn synchronize(&mut self) {
        while !self.at_end() && !self.at_directive() {
            self.advance();
        }
    }
}
