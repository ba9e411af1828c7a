//! Hand-written parser for the text control format.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead
//! - `error`: ParseError
//! - `directive`: Directive parsers (keyword-dispatched)
//!
//! Every directive is `<keyword> <time> <group> <fields…>`. The number of
//! placeholder names following `add_command` is the arity the
//! [`TypeRegistry`] reports for the command type, so the registry is needed
//! while parsing.

mod directive;
mod error;
mod stream;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

use cadence_runtime::{Directive, TypeRegistry};

use crate::lexer::{LexError, Spanned, Token, lex};

/// Directives read from a control program, plus the ones that could not be
#[derive(Debug, Default)]
pub struct ParsedProgram {
    /// Directives in source order
    pub directives: Vec<Directive>,
    pub errors: Vec<ParseError>,
}

impl ParsedProgram {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse directives from a token stream.
///
/// # Parameters
/// - `tokens`: Lexed control program.
/// - `source_len`: Length of the source in bytes, for end-of-input spans.
/// - `types`: Command types usable in `add_command`.
pub fn parse_tokens(
    tokens: &[Spanned<Token<'_>>],
    source_len: usize,
    types: &dyn TypeRegistry,
) -> ParsedProgram {
    let mut stream = TokenStream::new(tokens, source_len);
    directive::parse_directives(&mut stream, types)
}

/// Lex and parse a control program.
///
/// # Errors
/// Fails only if the source contains characters that form no token;
/// malformed directives are collected in [`ParsedProgram::errors`].
pub fn parse(source: &str, types: &dyn TypeRegistry) -> Result<ParsedProgram, LexError> {
    let tokens = lex(source)?;
    Ok(parse_tokens(&tokens, source.len(), types))
}
