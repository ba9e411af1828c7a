//! Lexer for cadence control programs
//!
//! Uses Logos for tokenization. Whitespace and `#` / `//` line comments are
//! skipped, so a directive may span several lines.

use std::fmt;

use logos::{Logos, Span};

/// Token type for control programs
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'src> {
    // === Directive keywords ===
    #[token("create_group")]
    CreateGroup,
    #[token("add_command")]
    AddCommand,
    #[token("bind_constant")]
    BindConstant,
    #[token("bind_sequence")]
    BindSequence,
    #[token("bind_argument")]
    BindArgument,
    #[token("bind_lattice2d")]
    BindLattice2d,
    #[token("bind_lattice3d")]
    BindLattice3d,
    #[token("toggle_command")]
    ToggleCommand,
    #[token("toggle_all")]
    ToggleAll,
    #[token("enable_command")]
    EnableCommand,
    #[token("disable_command")]
    DisableCommand,
    #[token("enable_all")]
    EnableAll,
    #[token("disable_all")]
    DisableAll,
    #[token("execute_sequence")]
    ExecuteSequence,

    // === Literals ===
    /// Integer literal (may have sign)
    #[regex(r"-?[0-9]+", |lex| lex.slice())]
    Integer(&'src str),

    /// Float literal (scientific notation supported)
    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"-?[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice())]
    Float(&'src str),

    /// String literal, quotes stripped, escapes kept
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| {
        let s = lex.slice();
        &s[1..s.len()-1]
    })]
    String(&'src str),

    // === Identifiers ===
    /// Group, command type, placeholder or packing name
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),
}

impl Token<'_> {
    /// Whether this token starts a directive
    pub fn is_directive_keyword(&self) -> bool {
        !matches!(
            self,
            Token::Integer(_) | Token::Float(_) | Token::String(_) | Token::Ident(_)
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::CreateGroup => f.write_str("`create_group`"),
            Token::AddCommand => f.write_str("`add_command`"),
            Token::BindConstant => f.write_str("`bind_constant`"),
            Token::BindSequence => f.write_str("`bind_sequence`"),
            Token::BindArgument => f.write_str("`bind_argument`"),
            Token::BindLattice2d => f.write_str("`bind_lattice2d`"),
            Token::BindLattice3d => f.write_str("`bind_lattice3d`"),
            Token::ToggleCommand => f.write_str("`toggle_command`"),
            Token::ToggleAll => f.write_str("`toggle_all`"),
            Token::EnableCommand => f.write_str("`enable_command`"),
            Token::DisableCommand => f.write_str("`disable_command`"),
            Token::EnableAll => f.write_str("`enable_all`"),
            Token::DisableAll => f.write_str("`disable_all`"),
            Token::ExecuteSequence => f.write_str("`execute_sequence`"),
            Token::Integer(s) => write!(f, "integer `{s}`"),
            Token::Float(s) => write!(f, "number `{s}`"),
            Token::String(s) => write!(f, "string \"{s}\""),
            Token::Ident(s) => write!(f, "identifier `{s}`"),
        }
    }
}

/// A token with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub token: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(token: T, span: Span) -> Self {
        Self { token, span }
    }
}

/// Tokenize source code into a vector of spanned tokens
pub fn lex(source: &str) -> Result<Vec<Spanned<Token<'_>>>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(Spanned::new(token, lexer.span())),
            Err(()) => {
                return Err(LexError {
                    span: lexer.span(),
                    slice: lexer.slice().to_string(),
                });
            }
        }
    }

    Ok(tokens)
}

/// Error during lexing
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub slice: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected character(s) '{}' at {:?}",
            self.slice, self.span
        )
    }
}

impl std::error::Error for LexError {}
