//! Cadence control input
//!
//! Reads control programs into [`Directive`](cadence_runtime::Directive)s,
//! either from the line-oriented text format (lexed with logos, parsed by
//! hand) or from the structured YAML encoding.

pub mod lexer;
pub mod parser;
pub mod structured;

pub use lexer::{LexError, Spanned, Token, lex};
pub use parser::{ParseError, ParseErrorKind, ParsedProgram, parse, parse_tokens};
pub use structured::{EntryError, StructuredError, StructuredProgram, parse_structured, to_structured};
