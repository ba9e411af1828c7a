//! Parse error types.

use std::fmt;

use logos::Span;

use crate::lexer::Token;

/// Parse error with source location and context.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Kind of parse error
    pub kind: ParseErrorKind,
    /// Byte range in the source where the error occurred
    pub span: Span,
    /// Human-readable error message
    pub message: String,
}

/// Category of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unexpected token (found X, expected Y)
    UnexpectedToken,
    /// Unexpected end of input
    UnexpectedEof,
    /// Literal out of range or unknown option
    InvalidSyntax,
    /// `add_command` names a type that cannot be grouped
    UnknownCommandType,
}

impl ParseError {
    /// Create an "expected X" error, `expected` describing what was wanted.
    pub fn expected(expected: &str, found: Option<&Token<'_>>, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("expected {expected}, found {token}"),
            None => format!("expected {expected}, found end of input"),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(found: Option<&Token<'_>>, context: &str, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("unexpected {token} {context}"),
            None => format!("unexpected end of input {context}"),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// Create an "invalid syntax" error.
    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::InvalidSyntax,
            span,
            message: message.into(),
        }
    }

    pub fn unknown_command_type(name: &str, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::UnknownCommandType,
            span,
            message: format!("command type '{name}' cannot be used in a command group"),
        }
    }

    /// 1-based line and column of the error start in `source`
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let offset = self.span.start.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let col = before
            .rfind('\n')
            .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
            + 1;
        (line, col)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {:?}", self.message, self.span)
    }
}

impl std::error::Error for ParseError {}
