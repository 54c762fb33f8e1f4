//! Markup reader built from nom parser combinators.
//!
//! Only the subset program-call documents use is understood: an optional
//! prolog, comments, processing instructions, a `DOCTYPE` without internal
//! subset, and nested elements with quoted attributes. Character data other
//! than whitespace is rejected.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_till, take_until, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{cut, recognize, value},
    error::{ContextError, ErrorKind, ParseError, context},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
};
use pcml_core::ElementDecl;

use crate::error::MarkupError;

type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

/// Parser error remembering where it happened and what was expected there.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxError<'a> {
    input: &'a str,
    kind: ErrorKind,
    expected: Option<String>,
}

impl<'a> SyntaxError<'a> {
    fn expected(input: &'a str, what: impl Into<String>) -> Self {
        Self {
            input,
            kind: ErrorKind::Verify,
            expected: Some(what.into()),
        }
    }

    fn into_markup(self, source: &str) -> MarkupError {
        let offset = (self.input.as_ptr() as usize)
            .checked_sub(source.as_ptr() as usize)
            .filter(|offset| *offset <= source.len())
            .unwrap_or(source.len());
        let consumed = &source[..offset];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map_or(0, |p| p + 1);
        let column = consumed[line_start..].chars().count() + 1;
        let message = match self.expected {
            Some(what) => format!("expected {what}"),
            None => format!("unexpected input ({})", self.kind.description()),
        };
        MarkupError::Syntax {
            line,
            column,
            message,
        }
    }
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self {
            input,
            kind,
            expected: None,
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a> ContextError<&'a str> for SyntaxError<'a> {
    fn add_context(_input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        if other.expected.is_none() {
            other.expected = Some(ctx.to_string());
        }
        other
    }
}

/// Parse a whole document into its root declaration.
pub fn parse_declaration(text: &str) -> Result<ElementDecl, MarkupError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    match document(text) {
        Ok((_, root)) => Ok(root),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(e.into_markup(text)),
        Err(nom::Err::Incomplete(_)) => {
            Err(SyntaxError::expected(&text[text.len()..], "more input").into_markup(text))
        }
    }
}

fn document(input: &str) -> PResult<'_, ElementDecl> {
    let (input, _) = many0(misc)(input)?;
    let (input, root) = context("root element", element)(input)?;
    let (input, _) = many0(misc)(input)?;
    if !input.is_empty() {
        return Err(nom::Err::Failure(SyntaxError::expected(
            input,
            "end of document",
        )));
    }
    Ok((input, root))
}

/// Whitespace, comments, processing instructions and doctype declarations.
fn misc(input: &str) -> PResult<'_, ()> {
    alt((
        value((), multispace1),
        comment,
        processing_instruction,
        doctype,
    ))(input)
}

fn comment(input: &str) -> PResult<'_, ()> {
    value(
        (),
        tuple((tag("<!--"), cut(context("`-->`", take_until("-->"))), tag("-->"))),
    )(input)
}

fn processing_instruction(input: &str) -> PResult<'_, ()> {
    value(
        (),
        tuple((tag("<?"), cut(context("`?>`", take_until("?>"))), tag("?>"))),
    )(input)
}

fn doctype(input: &str) -> PResult<'_, ()> {
    value(
        (),
        tuple((
            tag("<!DOCTYPE"),
            cut(context("`>`", take_till(|c| c == '>' || c == '['))),
            cut(context("`>` (internal subsets are not supported)", char('>'))),
        )),
    )(input)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
}

fn name(input: &str) -> PResult<'_, &str> {
    recognize(pair(take_while1(is_name_start), take_while(is_name_char)))(input)
}

fn quoted(input: &str) -> PResult<'_, &str> {
    alt((
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        delimited(char('\''), take_till(|c| c == '\''), char('\'')),
    ))(input)
}

fn attribute(input: &str) -> PResult<'_, (String, String)> {
    let (rest, (key, _, _, _)) = tuple((name, multispace0, char('='), multispace0))(input)?;
    let (rest, raw) = cut(context("quoted attribute value", quoted))(rest)?;
    let text = unescape(raw).map_err(|what| {
        nom::Err::Failure(SyntaxError::expected(raw, what))
    })?;
    Ok((rest, (key.to_string(), text)))
}

fn element(input: &str) -> PResult<'_, ElementDecl> {
    let (input, tag_name) = preceded(char('<'), name)(input)?;
    let (mut input, pairs) = many0(preceded(multispace1, attribute))(input)?;

    let mut decl = ElementDecl::new(tag_name);
    for (key, text) in pairs {
        if decl.get(&key).is_some() {
            return Err(nom::Err::Failure(SyntaxError::expected(
                input,
                format!("a single `{key}` attribute on <{tag_name}>"),
            )));
        }
        decl.attributes.push((key, text));
    }

    (input, _) = multispace0(input)?;
    if let Ok((rest, _)) = tag::<_, _, SyntaxError<'_>>("/>")(input) {
        return Ok((rest, decl));
    }
    let (input, _) = cut(context("`>` or `/>`", char('>')))(input)?;
    let (input, children) = content(input)?;
    decl.children = children;

    let (input, _) = tag("</")(input)?;
    let (after_name, closing) = cut(context("closing tag name", name))(input)?;
    if closing != tag_name {
        return Err(nom::Err::Failure(SyntaxError::expected(
            input,
            format!("`</{tag_name}>`"),
        )));
    }
    let (input, _) = multispace0(after_name)?;
    let (input, _) = cut(context("`>`", char('>')))(input)?;
    Ok((input, decl))
}

/// Child elements up to (not including) the closing tag.
fn content(mut input: &str) -> PResult<'_, Vec<ElementDecl>> {
    let mut children = Vec::new();
    loop {
        (input, _) = many0(alt((value((), multispace1), comment, processing_instruction)))(input)?;
        if input.starts_with("</") {
            return Ok((input, children));
        }
        if input.starts_with('<') {
            let (rest, child) = cut(element)(input)?;
            children.push(child);
            input = rest;
            continue;
        }
        let what = if input.is_empty() {
            "closing tag"
        } else {
            "element (character data is not supported)"
        };
        return Err(nom::Err::Failure(SyntaxError::expected(input, what)));
    }
}

/// Replace entity and character references in an attribute value.
fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let end = after
            .find(';')
            .ok_or_else(|| "`;` after entity reference".to_string())?;
        let entity = &after[..end];
        let ch = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => char_reference(entity)
                .ok_or_else(|| format!("known entity instead of `&{entity};`"))?,
        };
        out.push(ch);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn char_reference(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse().ok()?
    };
    char::from_u32(code)
}
