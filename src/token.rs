//! Grammar tokens: the intermediate representation produced by the
//! lexer and consumed by the element factory and parser.

use crate::error::Span;
use crate::flags::FlagSet;

/// The lexical shape of a grammar token, determined once by the lexer
/// so the parser and element factory don't each re-derive it from
/// `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// `def NAME {`
    SubGrammarDefOpen { name: String },
    /// `NAME()`
    SubGrammarUsage { name: String },
    /// `sep {`
    DelimiterOpen,
    /// `(name:`, `*(name:`, `+(name:`, `?(name:`. `sigil` is the
    /// optional repetition character before `(`.
    ScopedOpen { sigil: Option<char>, name: String },
    /// `?(` with no name.
    UnnamedZeroOrOneOpen,
    /// `<name:`
    NamedElementOpen { name: String },
    /// `{`
    SetOpen,
    AnyString,
    Newline,
    /// `'…'` / `"…"`, body already unescaped.
    StringLiteral { quote: char, body: String },
    /// `~…~`, body already unescaped.
    RegexString { body: String },
    CloseAngle,
    CloseParen,
    CloseBrace,
}

/// One lexeme of the grammar DSL, after escapes have been resolved and
/// flags split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarToken {
    /// Canonicalised token text (escapes resolved, flags stripped).
    pub text: String,
    /// Flags explicitly attached to this token, if any.
    pub flags: FlagSet,
    /// Byte-offset span of the whole token (flags included) in the
    /// grammar source.
    pub span: Span,
    /// What kind of grammar construct this token denotes.
    pub shape: Shape,
}

impl GrammarToken {
    pub fn new(text: impl Into<String>, flags: FlagSet, span: Span, shape: Shape) -> Self {
        Self { text: text.into(), flags, span, shape }
    }
}
