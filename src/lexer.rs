//! Grammar lexer: turns a grammar source string into a sequence of
//! [`GrammarToken`]s via one combined, case-insensitive alternation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::element::Kind;
use crate::error::{Error, Span};
use crate::flags::{Flag, FlagSet};
use crate::token::{GrammarToken, Shape};

const NAME: &str = "[A-Za-z0-9_-]+";
const FLAG_CHARS: &str = "[!qusi]*";

static COMBINED: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r#"(?ix)
        def\s+(?P<def_name>{NAME})\s*\{{
        |(?P<usage_name>{NAME})\s*\(\s*\)
        |sep\s*\{{
        |(?P<sigil>[*+?])?\(\s*(?P<scoped_name>{NAME})\s*:
        |\?\(
        |<\s*(?P<named_name>{NAME})\s*:
        |\{{
        |(?P<any_flags>{FLAG_CHARS})\.
        |(?P<regex_flags>{FLAG_CHARS})~(?P<regex_body>(?:\\.|[^~\\])*)~
        |(?P<sflags>{FLAG_CHARS})'(?P<sbody>(?:\\.|[^'\\])*)'
        |(?P<dflags>{FLAG_CHARS})"(?P<dbody>(?:\\.|[^"\\])*)"
        |\$
        |>
        |\)
        |\}}
        |\#[^\n]*
        |(?P<unknown>\S+)
        "#
    );
    Regex::new(&pattern).expect("combined grammar lexer pattern is a compile-time constant")
});

fn parse_flags(raw: &str) -> FlagSet {
    raw.chars().filter_map(Flag::from_char).collect()
}

/// Removes a single backslash immediately preceding `delim` inside
/// `body`; every other character (including other backslashes) is
/// left untouched.
fn unescape(body: &str, delim: char) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&delim) {
            out.push(delim);
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

fn check_valid_flags(kind: Kind, flags: &FlagSet, span: Span, grammar: &str) -> Result<(), Error> {
    let valid = kind.valid_flags();
    let invalid: FlagSet = flags.difference(&valid).copied().collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidGrammarTokenFlags {
            kind: kind.human_readable_name().to_string(),
            invalid_flags: crate::flags::render(&invalid),
            valid_flags: crate::flags::render(&valid),
            span,
            grammar: grammar.to_string(),
        })
    }
}

/// Lexes a full grammar source string into its token sequence.
pub fn lex(grammar: &str) -> Result<Vec<GrammarToken>, Error> {
    let mut tokens = Vec::new();

    for caps in COMBINED.captures_iter(grammar) {
        let whole = caps.get(0).expect("capture 0 is always present on a match");
        let span = Span::new(whole.start(), whole.end());
        let text = whole.as_str();

        if caps.name("unknown").is_some() {
            return Err(Error::UnknownGrammarToken {
                text: text.to_string(),
                span,
                grammar: grammar.to_string(),
            });
        }

        if text.trim_start().starts_with('#') {
            continue;
        }

        if let Some(m) = caps.name("def_name") {
            tokens.push(GrammarToken::new(
                text,
                FlagSet::new(),
                span,
                Shape::SubGrammarDefOpen { name: m.as_str().to_string() },
            ));
            continue;
        }

        if let Some(m) = caps.name("usage_name") {
            tokens.push(GrammarToken::new(
                text,
                FlagSet::new(),
                span,
                Shape::SubGrammarUsage { name: m.as_str().to_string() },
            ));
            continue;
        }

        if text.trim_start().starts_with("sep") {
            tokens.push(GrammarToken::new(text, FlagSet::new(), span, Shape::DelimiterOpen));
            continue;
        }

        if let Some(m) = caps.name("scoped_name") {
            let sigil = caps.name("sigil").and_then(|s| s.as_str().chars().next());
            tokens.push(GrammarToken::new(
                text,
                FlagSet::new(),
                span,
                Shape::ScopedOpen { sigil, name: m.as_str().to_string() },
            ));
            continue;
        }

        if text == "?(" {
            tokens.push(GrammarToken::new(text, FlagSet::new(), span, Shape::UnnamedZeroOrOneOpen));
            continue;
        }

        if let Some(m) = caps.name("named_name") {
            tokens.push(GrammarToken::new(
                text,
                FlagSet::new(),
                span,
                Shape::NamedElementOpen { name: m.as_str().to_string() },
            ));
            continue;
        }

        if text == "{" {
            tokens.push(GrammarToken::new(text, FlagSet::new(), span, Shape::SetOpen));
            continue;
        }

        if let Some(flags_m) = caps.name("any_flags") {
            let flags = parse_flags(flags_m.as_str());
            check_valid_flags(Kind::AnyString, &flags, span, grammar)?;
            tokens.push(GrammarToken::new(".", flags, span, Shape::AnyString));
            continue;
        }

        if let Some(flags_m) = caps.name("regex_flags") {
            let flags = parse_flags(flags_m.as_str());
            check_valid_flags(Kind::RegexString, &flags, span, grammar)?;
            let raw_body = caps.name("regex_body").map(|m| m.as_str()).unwrap_or_default();
            let body = unescape(raw_body, '~');
            tokens.push(GrammarToken::new(
                format!("~{body}~"),
                flags,
                span,
                Shape::RegexString { body },
            ));
            continue;
        }

        if let Some(flags_m) = caps.name("sflags") {
            let flags = parse_flags(flags_m.as_str());
            check_valid_flags(Kind::StringLiteral, &flags, span, grammar)?;
            let raw_body = caps.name("sbody").map(|m| m.as_str()).unwrap_or_default();
            let body = unescape(raw_body, '\'');
            tokens.push(GrammarToken::new(
                format!("'{body}'"),
                flags,
                span,
                Shape::StringLiteral { quote: '\'', body },
            ));
            continue;
        }

        if let Some(flags_m) = caps.name("dflags") {
            let flags = parse_flags(flags_m.as_str());
            check_valid_flags(Kind::StringLiteral, &flags, span, grammar)?;
            let raw_body = caps.name("dbody").map(|m| m.as_str()).unwrap_or_default();
            let body = unescape(raw_body, '"');
            tokens.push(GrammarToken::new(
                format!("\"{body}\""),
                flags,
                span,
                Shape::StringLiteral { quote: '"', body },
            ));
            continue;
        }

        match text {
            "$" => tokens.push(GrammarToken::new(text, FlagSet::new(), span, Shape::Newline)),
            ">" => tokens.push(GrammarToken::new(text, FlagSet::new(), span, Shape::CloseAngle)),
            ")" => tokens.push(GrammarToken::new(text, FlagSet::new(), span, Shape::CloseParen)),
            "}" => tokens.push(GrammarToken::new(text, FlagSet::new(), span, Shape::CloseBrace)),
            _ => unreachable!("combined lexer pattern matched an unhandled branch: {text:?}"),
        }
    }

    Ok(tokens)
}
