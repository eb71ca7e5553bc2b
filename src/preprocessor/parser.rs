//! Parser combinators for preprocessor directives using nom
//!
//! Input is one logical directive line with comments and line continuations already
//! folded into spaces, normalized to start with `#` immediately followed by the name.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_until, take_while},
    character::complete::{alpha1, alphanumeric1, char, space0, space1},
    combinator::{eof, map, peek, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, tuple},
};

/// Represents a preprocessor directive
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// #define NAME VALUE
    Define { name: String, value: String },

    /// #define NAME(params) body
    DefineMacro {
        name: String,
        params: Vec<String>,
        body: String,
    },

    /// #undef NAME
    Undef { name: String },

    /// #ifdef NAME
    IfDef { name: String },

    /// #ifndef NAME
    IfNDef { name: String },

    /// #if EXPR
    If { expr: String },

    /// #elif EXPR
    ElIf { expr: String },

    /// #else
    Else,

    /// #endif
    EndIf,

    /// #include "path" or #include <path>
    Include { path: String },

    /// #error message
    Error { message: String },

    /// #pragma once
    PragmaOnce,

    /// #version, #extension, #line and other pragmas, left for the GLSL compiler
    PassThrough { text: String },

    /// A lone `#`
    Null,
}

/// Parse an identifier (alphanumeric + underscore, starting with letter or underscore)
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// Parse whitespace (spaces and tabs only, not newlines)
fn ws(input: &str) -> IResult<&str, &str> {
    take_while(|c| c == ' ' || c == '\t')(input)
}

/// Parse until end of line
fn until_eol(input: &str) -> IResult<&str, &str> {
    take_while(|c| c != '\n' && c != '\r')(input)
}

/// Trailing whitespace then end of input
fn end_of_line(input: &str) -> IResult<&str, &str> {
    let (input, _) = ws(input)?;
    eof(input)
}

/// Parse a simple #define directive
fn parse_define_simple(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("#define")(input)?;
    let (input, _) = space1(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = alt((space1, eof))(input)?;
    let (input, value) = until_eol(input)?;

    Ok((
        input,
        Directive::Define {
            name: name.to_string(),
            value: value.trim().to_string(),
        },
    ))
}

/// Parse macro parameters like (a, b, c)
fn parse_macro_params(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        pair(char('('), space0),
        separated_list0(
            delimited(space0, char(','), space0),
            map(identifier, |s| s.to_string()),
        ),
        pair(space0, char(')')),
    )(input)
}

/// Parse a macro #define directive; the `(` must follow the name immediately
fn parse_define_macro(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("#define")(input)?;
    let (input, _) = space1(input)?;
    let (input, name) = identifier(input)?;
    let (input, params) = parse_macro_params(input)?;
    let (input, _) = ws(input)?;
    let (input, body) = until_eol(input)?;

    Ok((
        input,
        Directive::DefineMacro {
            name: name.to_string(),
            params,
            body: body.trim().to_string(),
        },
    ))
}

/// Parse #define (either simple or macro)
fn parse_define(input: &str) -> IResult<&str, Directive> {
    alt((parse_define_macro, parse_define_simple))(input)
}

fn parse_name_directive<'a>(input: &'a str, keyword: &str) -> IResult<&'a str, &'a str> {
    let (input, _) = tag(keyword)(input)?;
    let (input, _) = space1(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = end_of_line(input)?;
    Ok((input, name))
}

/// Parse #undef directive
fn parse_undef(input: &str) -> IResult<&str, Directive> {
    let (input, name) = parse_name_directive(input, "#undef")?;
    Ok((input, Directive::Undef { name: name.to_string() }))
}

/// Parse #ifdef directive
fn parse_ifdef(input: &str) -> IResult<&str, Directive> {
    let (input, name) = parse_name_directive(input, "#ifdef")?;
    Ok((input, Directive::IfDef { name: name.to_string() }))
}

/// Parse #ifndef directive
fn parse_ifndef(input: &str) -> IResult<&str, Directive> {
    let (input, name) = parse_name_directive(input, "#ifndef")?;
    Ok((input, Directive::IfNDef { name: name.to_string() }))
}

/// Expression text after `#if` / `#elif`, which may start right at a parenthesis
fn condition_text<'a>(input: &'a str, keyword: &str) -> IResult<&'a str, String> {
    let (input, _) = tag(keyword)(input)?;
    let (input, _) = alt((space1, peek(tag("(")), peek(tag("!"))))(input)?;
    let (input, expr) = until_eol(input)?;
    Ok((input, expr.trim().to_string()))
}

/// Parse #if directive
fn parse_if(input: &str) -> IResult<&str, Directive> {
    let (input, expr) = condition_text(input, "#if")?;
    Ok((input, Directive::If { expr }))
}

/// Parse #elif directive
fn parse_elif(input: &str) -> IResult<&str, Directive> {
    let (input, expr) = condition_text(input, "#elif")?;
    Ok((input, Directive::ElIf { expr }))
}

/// Parse #else directive
fn parse_else(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("#else")(input)?;
    let (input, _) = end_of_line(input)?;
    Ok((input, Directive::Else))
}

/// Parse #endif directive
fn parse_endif(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("#endif")(input)?;
    let (input, _) = end_of_line(input)?;
    Ok((input, Directive::EndIf))
}

/// Parse #include directive with quoted path
fn parse_include_quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_until("\""), char('"'))(input)
}

/// Parse #include directive with angle brackets
fn parse_include_angled(input: &str) -> IResult<&str, &str> {
    delimited(char('<'), take_until(">"), char('>'))(input)
}

/// Parse #include directive
fn parse_include(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("#include")(input)?;
    let (input, _) = space0(input)?;
    let (input, path) = alt((parse_include_quoted, parse_include_angled))(input)?;
    let (input, _) = end_of_line(input)?;

    Ok((
        input,
        Directive::Include {
            path: path.to_string(),
        },
    ))
}

/// Parse #error directive
fn parse_error(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("#error")(input)?;
    let (input, _) = alt((space1, eof))(input)?;
    let (input, message) = until_eol(input)?;

    Ok((
        input,
        Directive::Error {
            message: message.trim().to_string(),
        },
    ))
}

/// Parse #pragma once
fn parse_pragma_once(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tuple((tag("#pragma"), space1, tag("once")))(input)?;
    let (input, _) = end_of_line(input)?;
    Ok((input, Directive::PragmaOnce))
}

/// Directives owned by the GLSL compiler, kept verbatim
fn parse_pass_through(input: &str) -> IResult<&str, Directive> {
    let (rest, text) = recognize(pair(
        preceded(
            char('#'),
            alt((tag("version"), tag("extension"), tag("pragma"), tag("line"))),
        ),
        alt((recognize(pair(space1, until_eol)), eof)),
    ))(input)?;

    Ok((
        rest,
        Directive::PassThrough {
            text: text.trim_end().to_string(),
        },
    ))
}

/// Parse a lone `#`
fn parse_null(input: &str) -> IResult<&str, Directive> {
    let (input, _) = char('#')(input)?;
    let (input, _) = end_of_line(input)?;
    Ok((input, Directive::Null))
}

/// Parse any preprocessor directive
pub fn parse_directive(input: &str) -> IResult<&str, Directive> {
    alt((
        parse_include,
        parse_define,
        parse_undef,
        parse_ifdef,
        parse_ifndef,
        parse_if,
        parse_elif,
        parse_else,
        parse_endif,
        parse_error,
        parse_pragma_once,
        parse_pass_through,
        parse_null,
    ))(input)
}

/// The word following `#`, used for diagnostics and for scanning skipped regions
pub fn directive_name(input: &str) -> &str {
    let rest = input.trim_start_matches('#').trim_start();
    match identifier(rest) {
        Ok((_, name)) => name,
        Err(_) => "",
    }
}
