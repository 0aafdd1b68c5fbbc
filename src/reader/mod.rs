// ABOUTME: Streaming reader (C2) — nom combinators over source text, producing trees of C1 values

use crate::error::ReaderError;
use crate::value::{keyword, PList, PMap, PSet, PVector, Symbol, Value};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace1, one_of},
    combinator::{map, opt, peek, recognize, value as nom_value},
    multi::many0,
    IResult, Parser,
};
use std::rc::Rc;

/// Reads every top-level form in `input`, in source order.
pub fn read_str(input: &str) -> Result<Vec<Value>, ReaderError> {
    let mut forms = Vec::new();
    let mut remaining = input;
    loop {
        let (rest, _) = ws_and_comments(remaining).map_err(|e| to_reader_error(input, e))?;
        if rest.is_empty() {
            break;
        }
        let (rest, form) = read_one_form(rest).map_err(|e| to_reader_error(input, e))?;
        remaining = rest;
        if let Some(v) = form {
            forms.push(v);
        }
    }
    Ok(forms)
}

/// Reads exactly one top-level form, returning the unconsumed remainder.
pub fn read_one(input: &str) -> Result<(Value, &str), ReaderError> {
    let (rest, _) = ws_and_comments(input).map_err(|e| to_reader_error(input, e))?;
    let (rest, form) = read_one_form(rest).map_err(|e| to_reader_error(input, e))?;
    match form {
        Some(v) => Ok((v, rest)),
        None => Err(ReaderError::new(input.len() - rest.len(), "nothing to read (form was elided)")),
    }
}

/// Accepts UTF-16 source text, re-encoding it to an owned `String` first so
/// byte offsets in any resulting error are reported against what the core
/// parser actually saw.
pub fn read_utf16(input: &[u16]) -> Result<Vec<Value>, ReaderError> {
    let text = String::from_utf16(input).map_err(|e| ReaderError::new(0, format!("invalid UTF-16: {e}")))?;
    read_str(&text)
}

type PResult<'a, T> = IResult<&'a str, T>;

fn to_reader_error(original: &str, e: nom::Err<nom::error::Error<&str>>) -> ReaderError {
    match e {
        nom::Err::Error(err) | nom::Err::Failure(err) => {
            let offset = original.len() - err.input.len();
            ReaderError::new(offset, format!("unexpected input near byte {offset}"))
        }
        nom::Err::Incomplete(_) => ReaderError::new(original.len(), "unexpected end of input"),
    }
}

fn ws_and_comments(input: &str) -> PResult<'_, ()> {
    let (input, _) = many0(alt((
        nom_value((), multispace1),
        nom_value((), char(',')),
        line_comment,
    )))
    .parse(input)?;
    Ok((input, ()))
}

fn line_comment(input: &str) -> PResult<'_, ()> {
    let (input, _) = char(';')(input)?;
    let (input, _) = take_while(|c| c != '\n')(input)?;
    Ok((input, ()))
}

/// Reads one form, returning `None` when it was elided via `#_`.
fn read_one_form(input: &str) -> PResult<'_, Option<Value>> {
    alt((elision, map(form, Some))).parse(input)
}

fn elision(input: &str) -> PResult<'_, Option<Value>> {
    let (input, _) = tag("#_")(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, _) = form(input)?;
    Ok((input, None))
}

fn form(input: &str) -> PResult<'_, Value> {
    alt((
        metadata,
        quote,
        syntax_quote,
        unquote_splicing,
        unquote,
        deref,
        regex_literal,
        char_literal,
        string_literal,
        list,
        vector,
        set,
        map_literal,
        number,
        keyword_literal,
        symbol_or_literal,
    ))
    .parse(input)
}

/// Reads the single form a reader macro (`'`, `` ` ``, `~`, `~@`, `@`, `^`)
/// applies to, transparently skipping any leading `#_` elisions.
fn sub_form(mut input: &str) -> PResult<'_, Value> {
    loop {
        let (rest, _) = ws_and_comments(input)?;
        match read_one_form(rest)? {
            (rest, Some(v)) => return Ok((rest, v)),
            (rest, None) => input = rest,
        }
    }
}

fn metadata(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('^')(input)?;
    let (input, _meta) = sub_form(input)?;
    let (input, _) = ws_and_comments(input)?;
    sub_form(input)
}

fn quote(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('\'')(input)?;
    let (input, expr) = sub_form(input)?;
    Ok((input, wrap("quote", expr)))
}

fn syntax_quote(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('`')(input)?;
    let (input, expr) = sub_form(input)?;
    Ok((input, wrap("syntax-quote", expr)))
}

fn unquote_splicing(input: &str) -> PResult<'_, Value> {
    let (input, _) = tag("~@")(input)?;
    let (input, expr) = sub_form(input)?;
    Ok((input, wrap("unquote-splicing", expr)))
}

fn unquote(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('~')(input)?;
    let (input, expr) = sub_form(input)?;
    Ok((input, wrap("unquote", expr)))
}

fn deref(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('@')(input)?;
    let (input, expr) = sub_form(input)?;
    Ok((input, wrap("deref", expr)))
}

fn wrap(head: &str, expr: Value) -> Value {
    Value::List(PList::from_vec(vec![Value::symbol(head), expr]))
}

fn regex_literal(input: &str) -> PResult<'_, Value> {
    let (input, _) = tag("#\"")(input)?;
    let (input, content) = take_while(|c| c != '"')(input)?;
    let (input, _) = char('"')(input)?;
    let re = regex::Regex::new(content)
        .map_err(|_| nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Verify)))?;
    Ok((input, Value::Regex(Rc::new(re))))
}

fn char_literal(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('\\')(input)?;
    alt((
        nom_value(Value::Char('\n'), tag("newline")),
        nom_value(Value::Char(' '), tag("space")),
        nom_value(Value::Char('\t'), tag("tab")),
        nom_value(Value::Char('\\'), tag("\\")),
        map(nom::character::complete::anychar, Value::Char),
    ))
    .parse(input)
}

fn string_literal(input: &str) -> PResult<'_, Value> {
    let (input, _) = char('"')(input)?;
    let mut out = String::new();
    let mut rest = input;
    loop {
        let Some(c) = rest.chars().next() else {
            return Err(nom::Err::Error(nom::error::Error::new(rest, nom::error::ErrorKind::Eof)));
        };
        if c == '"' {
            rest = &rest[1..];
            break;
        }
        if c == '\\' {
            let after_backslash = &rest[1..];
            let Some(esc) = after_backslash.chars().next() else {
                return Err(nom::Err::Error(nom::error::Error::new(rest, nom::error::ErrorKind::Eof)));
            };
            match esc {
                'n' => {
                    out.push('\n');
                    rest = &after_backslash[1..];
                }
                't' => {
                    out.push('\t');
                    rest = &after_backslash[1..];
                }
                'r' => {
                    out.push('\r');
                    rest = &after_backslash[1..];
                }
                '\\' => {
                    out.push('\\');
                    rest = &after_backslash[1..];
                }
                '"' => {
                    out.push('"');
                    rest = &after_backslash[1..];
                }
                'u' => {
                    let hex_start = &after_backslash[1..];
                    if hex_start.len() < 4 {
                        return Err(nom::Err::Error(nom::error::Error::new(rest, nom::error::ErrorKind::Eof)));
                    }
                    let (hex, tail) = hex_start.split_at(4);
                    let code = u32::from_str_radix(hex, 16)
                        .map_err(|_| nom::Err::Error(nom::error::Error::new(rest, nom::error::ErrorKind::Verify)))?;
                    let ch = char::from_u32(code)
                        .ok_or_else(|| nom::Err::Error(nom::error::Error::new(rest, nom::error::ErrorKind::Verify)))?;
                    out.push(ch);
                    rest = tail;
                }
                _ => return Err(nom::Err::Error(nom::error::Error::new(rest, nom::error::ErrorKind::Verify))),
            }
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    Ok((rest, Value::string(out)))
}

fn delimited_forms<'a>(open: char, close: char) -> impl FnMut(&'a str) -> PResult<'a, Vec<Value>> {
    move |input: &str| {
        let (input, _) = char(open)(input)?;
        let mut items = Vec::new();
        let mut rest = input;
        loop {
            let (r, _) = ws_and_comments(rest)?;
            if let Ok((r2, _)) = char::<_, nom::error::Error<_>>(close)(r) {
                return Ok((r2, items));
            }
            let (r2, item) = read_one_form(r)?;
            if let Some(v) = item {
                items.push(v);
            }
            rest = r2;
        }
    }
}

fn list(input: &str) -> PResult<'_, Value> {
    map(delimited_forms('(', ')'), |items| Value::List(PList::from_vec(items))).parse(input)
}

fn vector(input: &str) -> PResult<'_, Value> {
    map(delimited_forms('[', ']'), |items| Value::Vector(PVector::from_vec(items))).parse(input)
}

fn set(input: &str) -> PResult<'_, Value> {
    let (input, _) = tag("#{")(input)?;
    let (input, items) = delimited_forms_after('}')(input)?;
    Ok((input, Value::Set(items.into_iter().collect::<PSet>())))
}

fn map_literal(input: &str) -> PResult<'_, Value> {
    let (input, items) = delimited_forms('{', '}')(input)?;
    if items.len() % 2 != 0 {
        return Err(nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Verify)));
    }
    let mut m = PMap::new();
    for pair in items.chunks(2) {
        m = m.assoc(pair[0].clone(), pair[1].clone());
    }
    Ok((input, Value::Map(m)))
}

/// Like `delimited_forms`, but the opening delimiter (e.g. `#{`) was already consumed.
fn delimited_forms_after<'a>(close: char) -> impl FnMut(&'a str) -> PResult<'a, Vec<Value>> {
    move |input: &str| {
        let mut items = Vec::new();
        let mut rest = input;
        loop {
            let (r, _) = ws_and_comments(rest)?;
            if let Ok((r2, _)) = char::<_, nom::error::Error<_>>(close)(r) {
                return Ok((r2, items));
            }
            let (r2, item) = read_one_form(r)?;
            if let Some(v) = item {
                items.push(v);
            }
            rest = r2;
        }
    }
}

fn number(input: &str) -> PResult<'_, Value> {
    let (rest, text) = recognize((
        opt(char('-')),
        alt((
            recognize((digit1, opt((char('.'), digit1, opt(exponent))), opt(exponent))),
            recognize((char('.'), digit1)),
        )),
    ))
    .parse(input)?;

    // Disallow a bare sign or a symbol that merely starts with a digit-like char.
    if text.is_empty() || text == "-" {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)));
    }

    if text.contains('.') || text.contains('e') || text.contains('E') {
        let n: f64 = text
            .parse()
            .map_err(|_| nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Float)))?;
        Ok((rest, Value::Float(n)))
    } else {
        match text.parse::<i64>() {
            Ok(n) => Ok((rest, Value::Int(n))),
            Err(_) => Err(nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Digit))),
        }
    }
}

fn exponent(input: &str) -> PResult<'_, &str> {
    recognize((one_of("eE"), opt(one_of("+-")), digit1)).parse(input)
}

const SYMBOL_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+-*/%<>=!?._'&";

fn symbol_text(input: &str) -> PResult<'_, &str> {
    if let Some(rest) = input.strip_prefix('/') {
        // The lone `/` is the symbol named `/`; a longer symbol starting with
        // `/` is not otherwise valid, so only consume the single character.
        return Ok((rest, &input[..1]));
    }
    recognize((
        one_of(SYMBOL_CHARS),
        take_while(|c: char| SYMBOL_CHARS.contains(c) || c == '/'),
    ))
    .parse(input)
}

fn keyword_literal(input: &str) -> PResult<'_, Value> {
    let (input, _) = char(':')(input)?;
    let (input, _double) = opt(peek(char(':'))).parse(input)?;
    let (input, _) = opt(char(':')).parse(input)?;
    let (input, text) = symbol_text(input)?;
    let kw = match text.split_once('/') {
        Some((ns, name)) => keyword::intern(Some(ns), name),
        None => keyword::intern(None, text),
    };
    Ok((input, Value::Keyword(kw)))
}

fn symbol_or_literal(input: &str) -> PResult<'_, Value> {
    let (input, text) = symbol_text(input)?;
    Ok((
        input,
        match text {
            "nil" => Value::Nil,
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => match text.split_once('/') {
                Some((ns, name)) if !ns.is_empty() && !name.is_empty() => {
                    Value::Symbol(Symbol::namespaced(ns, name))
                }
                _ => Value::symbol(text),
            },
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_atoms() {
        assert_eq!(read_str("42").unwrap(), vec![Value::Int(42)]);
        assert_eq!(read_str("-3.5").unwrap(), vec![Value::Float(-3.5)]);
        assert_eq!(read_str("nil true false").unwrap(), vec![Value::Nil, Value::Bool(true), Value::Bool(false)]);
        assert_eq!(read_str("\"hi\\nthere\"").unwrap(), vec![Value::string("hi\nthere")]);
    }

    #[test]
    fn reads_collections() {
        assert_eq!(
            read_str("(1 2 3)").unwrap(),
            vec![Value::List(PList::from_vec(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))]
        );
        assert_eq!(
            read_str("[1 2]").unwrap(),
            vec![Value::Vector(PVector::from_vec(vec![Value::Int(1), Value::Int(2)]))]
        );
        let forms = read_str("#{1 2}").unwrap();
        assert_eq!(forms.len(), 1);
        assert!(matches!(forms[0], Value::Set(_)));
    }

    #[test]
    fn map_with_odd_entries_is_an_error() {
        assert!(read_str("{:a 1 :b}").is_err());
    }

    #[test]
    fn reader_macros_desugar() {
        assert_eq!(
            read_str("'x").unwrap(),
            vec![Value::List(PList::from_vec(vec![Value::symbol("quote"), Value::symbol("x")]))]
        );
        assert_eq!(
            read_str("~@xs").unwrap(),
            vec![Value::List(PList::from_vec(vec![
                Value::symbol("unquote-splicing"),
                Value::symbol("xs")
            ]))]
        );
    }

    #[test]
    fn metadata_is_read_and_discarded() {
        assert_eq!(read_str("^:private x").unwrap(), vec![Value::symbol("x")]);
    }

    #[test]
    fn elision_skips_the_next_form() {
        assert_eq!(read_str("(1 #_2 3)").unwrap(), vec![Value::List(PList::from_vec(vec![Value::Int(1), Value::Int(3)]))]);
    }

    #[test]
    fn namespaced_keyword() {
        let forms = read_str(":a.b/c").unwrap();
        let Value::Keyword(k) = &forms[0] else { panic!() };
        assert_eq!(k.namespace(), Some("a.b"));
        assert_eq!(k.name(), "c");
    }

    #[test]
    fn unterminated_string_is_a_reader_error() {
        assert!(read_str("\"abc").is_err());
    }

    #[test]
    fn round_trip_through_display() {
        let forms = read_str("(1 2.5 \"s\" :k foo [1 2] {:a 1})").unwrap();
        let printed = forms[0].to_string();
        let reread = read_str(&printed).unwrap();
        assert_eq!(forms, reread);
    }
}
