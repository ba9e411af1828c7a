//! Directive parsers (keyword-dispatched).

use cadence_runtime::{
    ArgumentValue, AxisTarget, Directive, DirectiveKind, GroupName, LatticeBinding, Packing,
    PlaceholderName, SimTime, TypeRegistry,
};
use tracing::trace;

use super::{ParseError, ParsedProgram, TokenStream};
use crate::lexer::Token;

/// Parse every directive in the stream.
///
/// A malformed directive is reported and skipped; parsing resumes at the
/// next directive keyword.
pub fn parse_directives(stream: &mut TokenStream<'_, '_>, types: &dyn TypeRegistry) -> ParsedProgram {
    let mut program = ParsedProgram::default();

    while !stream.at_end() {
        match parse_directive(stream, types) {
            Ok(directive) if stream.at_end() || stream.at_directive() => {
                trace!(directive = %directive, "parsed directive");
                program.directives.push(directive);
            }
            Ok(directive) => {
                program.errors.push(ParseError::unexpected_token(
                    stream.peek(),
                    &format!("after `{directive}`"),
                    stream.current_span(),
                ));
                stream.synchronize();
            }
            Err(err) => {
                program.errors.push(err);
                stream.synchronize();
            }
        }
    }

    program
}

fn parse_directive(stream: &mut TokenStream<'_, '_>, types: &dyn TypeRegistry) -> Result<Directive, ParseError> {
    let keyword = match stream.peek() {
        Some(token) if token.is_directive_keyword() => token,
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "at start of directive",
                stream.current_span(),
            ));
        }
    };
    stream.advance();

    let at = parse_time(stream)?;
    let group = parse_group(stream)?;

    let kind = match keyword {
        Token::CreateGroup => DirectiveKind::CreateGroup { group },
        Token::AddCommand => {
            let (command_type, span) = parse_ident(stream, "command type")?;
            let arity = types
                .arity(command_type)
                .ok_or_else(|| ParseError::unknown_command_type(command_type, span))?;
            let placeholders = (0..arity)
                .map(|_| parse_placeholder(stream))
                .collect::<Result<Vec<_>, _>>()?;
            DirectiveKind::AddCommand {
                group,
                command_type: command_type.to_string(),
                placeholders,
            }
        }
        Token::BindConstant => DirectiveKind::BindConstant {
            group,
            command: parse_integer(stream, "command index")?,
            placeholder: parse_placeholder(stream)?,
            value: parse_value(stream)?,
        },
        Token::BindSequence => DirectiveKind::BindSequence {
            group,
            command: parse_integer(stream, "command index")?,
            placeholder: parse_placeholder(stream)?,
            initial: parse_number(stream, "initial value")?,
            increment: parse_number(stream, "increment")?,
        },
        Token::BindArgument => DirectiveKind::BindArgument {
            group,
            command: parse_integer(stream, "command index")?,
            placeholder: parse_placeholder(stream)?,
            source_command: parse_integer(stream, "source command index")?,
            source_placeholder: parse_placeholder(stream)?,
        },
        Token::BindLattice2d => DirectiveKind::BindLattice2d(parse_lattice(stream, group, 2)?),
        Token::BindLattice3d => DirectiveKind::BindLattice3d(parse_lattice(stream, group, 3)?),
        Token::ToggleCommand => DirectiveKind::ToggleCommand {
            group,
            command: parse_integer(stream, "command index")?,
        },
        Token::ToggleAll => DirectiveKind::ToggleAll { group },
        Token::EnableCommand => DirectiveKind::EnableCommand {
            group,
            command: parse_integer(stream, "command index")?,
        },
        Token::DisableCommand => DirectiveKind::DisableCommand {
            group,
            command: parse_integer(stream, "command index")?,
        },
        Token::EnableAll => DirectiveKind::EnableAll { group },
        Token::DisableAll => DirectiveKind::DisableAll { group },
        Token::ExecuteSequence => DirectiveKind::ExecuteSequence {
            group,
            total: parse_integer(stream, "repetition count")?,
            period: parse_integer(stream, "period")?,
        },
        Token::Integer(_) | Token::Float(_) | Token::String(_) | Token::Ident(_) => {
            return Err(ParseError::unexpected_token(
                Some(keyword),
                "at start of directive",
                stream.current_span(),
            ));
        }
    };

    Ok(Directive::new(at, kind))
}

/// Targets, then dimensions, then origin, then lengths, then optional packing.
fn parse_lattice(stream: &mut TokenStream<'_, '_>, group: GroupName, rank: usize) -> Result<LatticeBinding, ParseError> {
    let targets = (0..rank)
        .map(|_| {
            Ok::<_, ParseError>(AxisTarget {
                command: parse_integer(stream, "command index")?,
                placeholder: parse_placeholder(stream)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let dims = (0..rank)
        .map(|_| parse_integer(stream, "lattice dimension"))
        .collect::<Result<Vec<_>, _>>()?;
    let origin = (0..rank)
        .map(|_| parse_real(stream, "lattice origin"))
        .collect::<Result<Vec<_>, _>>()?;
    let lengths = (0..rank)
        .map(|_| parse_real(stream, "lattice length"))
        .collect::<Result<Vec<_>, _>>()?;

    let packing = match stream.peek() {
        Some(Token::Ident(name)) => {
            let span = stream.current_span();
            let packing = Packing::from_name(name).ok_or_else(|| {
                ParseError::invalid_syntax(
                    format!("unknown lattice packing '{name}', expected rectangular or triangular"),
                    span,
                )
            })?;
            stream.advance();
            packing
        }
        _ => Packing::default(),
    };

    Ok(LatticeBinding {
        group,
        targets,
        dims,
        origin,
        lengths,
        packing,
    })
}

fn parse_time(stream: &mut TokenStream<'_, '_>) -> Result<SimTime, ParseError> {
    let (literal, span) = stream.expect_with("simulation time", |t| match t {
        Token::Integer(s) => Some(*s),
        _ => None,
    })?;
    literal.parse().map_err(|_| {
        ParseError::invalid_syntax(
            format!("simulation time must be a non-negative integer, got {literal}"),
            span,
        )
    })
}

fn parse_ident<'src>(
    stream: &mut TokenStream<'_, 'src>,
    what: &str,
) -> Result<(&'src str, logos::Span), ParseError> {
    stream.expect_with(what, |t| match t {
        Token::Ident(s) => Some(*s),
        _ => None,
    })
}

fn parse_group(stream: &mut TokenStream<'_, '_>) -> Result<GroupName, ParseError> {
    parse_ident(stream, "group name").map(|(name, _)| GroupName::from(name))
}

fn parse_placeholder(stream: &mut TokenStream<'_, '_>) -> Result<PlaceholderName, ParseError> {
    parse_ident(stream, "placeholder name").map(|(name, _)| PlaceholderName::from(name))
}

fn parse_integer(stream: &mut TokenStream<'_, '_>, what: &str) -> Result<i64, ParseError> {
    let (literal, span) = stream.expect_with(what, |t| match t {
        Token::Integer(s) => Some(*s),
        _ => None,
    })?;
    integer_literal(literal, span)
}

fn integer_literal(literal: &str, span: logos::Span) -> Result<i64, ParseError> {
    literal
        .parse()
        .map_err(|_| ParseError::invalid_syntax(format!("integer {literal} is out of range"), span))
}

fn real_literal(literal: &str, span: logos::Span) -> Result<f64, ParseError> {
    literal
        .parse()
        .map_err(|_| ParseError::invalid_syntax(format!("invalid number {literal}"), span))
}

/// Integer or real literal, keeping which one it was
fn parse_number(stream: &mut TokenStream<'_, '_>, what: &str) -> Result<ArgumentValue, ParseError> {
    let (token, span) = stream.expect_with(what, |t| match t {
        Token::Integer(_) | Token::Float(_) => Some(t),
        _ => None,
    })?;
    match token {
        Token::Integer(s) => integer_literal(s, span).map(ArgumentValue::Integer),
        Token::Float(s) => real_literal(s, span).map(ArgumentValue::Real),
        other => Err(ParseError::expected(what, Some(other), span)),
    }
}

fn parse_real(stream: &mut TokenStream<'_, '_>, what: &str) -> Result<f64, ParseError> {
    let (literal, span) = stream.expect_with(what, |t| match t {
        Token::Integer(s) | Token::Float(s) => Some(*s),
        _ => None,
    })?;
    real_literal(literal, span)
}

/// Any argument value: integer, real or string
fn parse_value(stream: &mut TokenStream<'_, '_>) -> Result<ArgumentValue, ParseError> {
    if let Some(Token::String(raw)) = stream.peek() {
        stream.advance();
        return Ok(ArgumentValue::Text(unescape(raw)));
    }
    parse_number(stream, "value")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
