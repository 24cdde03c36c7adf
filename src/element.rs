//! The compiled grammar tree: every node the parser can produce, and
//! the flag/name bookkeeping each node carries.

use std::collections::HashMap;

use regex::Regex;

use crate::error::Span;
use crate::flags::{self, Flag, FlagSet};

/// Fields common to every element, regardless of kind.
#[derive(Debug, Clone)]
pub struct ElementMeta {
    /// The original grammar slice this element was built from.
    pub token_text: String,
    /// Flags as declared in the grammar source.
    pub grammar_flags: FlagSet,
    /// Flags after default resolution (§4.2).
    pub effective_flags: FlagSet,
    /// Location in the grammar source.
    pub span: Span,
}

impl ElementMeta {
    pub fn new(token_text: impl Into<String>, grammar_flags: FlagSet, effective_flags: FlagSet, span: Span) -> Self {
        Self { token_text: token_text.into(), grammar_flags, effective_flags, span }
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.effective_flags.contains(&flag)
    }
}

impl PartialEq for ElementMeta {
    fn eq(&self, other: &Self) -> bool {
        self.token_text == other.token_text
            && self.grammar_flags == other.grammar_flags
            && self.effective_flags == other.effective_flags
    }
}

/// A `*(…)`/`+(…)` node, which additionally carries an optional
/// iterator delimiter.
#[derive(Debug, Clone)]
pub struct RepeatElement {
    pub meta: ElementMeta,
    pub name: String,
    pub children: Vec<Element>,
    pub delimiter: Option<Box<Element>>,
}

impl PartialEq for RepeatElement {
    fn eq(&self, other: &Self) -> bool {
        self.meta == other.meta && self.name == other.name && self.children == other.children && self.delimiter == other.delimiter
    }
}

/// A node of the compiled grammar tree.
///
/// `SubGrammarDefinition` and `SubGrammarUsage` only ever exist while
/// the parser is still consuming tokens; neither survives into the
/// tree returned to a caller (definitions are filed away by name,
/// usages are replaced by inlined copies of the definition's children).
#[derive(Debug, Clone)]
pub enum Element {
    AnyString(ElementMeta),
    Newline(ElementMeta),
    StringLiteral { meta: ElementMeta, literal: String },
    RegexString { meta: ElementMeta, pattern: String, regex: Regex },
    Grammar { meta: ElementMeta, name: Option<String>, children: Vec<Element> },
    NamedElement { meta: ElementMeta, name: String, child: Option<Box<Element>> },
    ZeroOrOne { meta: ElementMeta, name: Option<String>, children: Vec<Element> },
    ZeroOrMore(RepeatElement),
    OneOrMore(RepeatElement),
    OneOfSet { meta: ElementMeta, children: Vec<Element> },
    IteratorDelimiter { meta: ElementMeta, children: Vec<Element> },
    SubGrammarDefinition {
        meta: ElementMeta,
        name: String,
        children: Vec<Element>,
        sub_grammars: HashMap<String, Element>,
    },
    SubGrammarUsage { meta: ElementMeta, name: String },
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        use Element::*;
        match (self, other) {
            (AnyString(a), AnyString(b)) | (Newline(a), Newline(b)) => a == b,
            (StringLiteral { meta: m1, literal: l1 }, StringLiteral { meta: m2, literal: l2 }) => m1 == m2 && l1 == l2,
            (RegexString { meta: m1, pattern: p1, .. }, RegexString { meta: m2, pattern: p2, .. }) => m1 == m2 && p1 == p2,
            (Grammar { meta: m1, name: n1, children: c1 }, Grammar { meta: m2, name: n2, children: c2 }) => m1 == m2 && n1 == n2 && c1 == c2,
            (NamedElement { meta: m1, name: n1, child: c1 }, NamedElement { meta: m2, name: n2, child: c2 }) => m1 == m2 && n1 == n2 && c1 == c2,
            (ZeroOrOne { meta: m1, name: n1, children: c1 }, ZeroOrOne { meta: m2, name: n2, children: c2 }) => m1 == m2 && n1 == n2 && c1 == c2,
            (ZeroOrMore(a), ZeroOrMore(b)) | (OneOrMore(a), OneOrMore(b)) => a == b,
            (OneOfSet { meta: m1, children: c1 }, OneOfSet { meta: m2, children: c2 }) => m1 == m2 && c1 == c2,
            (IteratorDelimiter { meta: m1, children: c1 }, IteratorDelimiter { meta: m2, children: c2 }) => m1 == m2 && c1 == c2,
            _ => false,
        }
    }
}

/// Kinds of element, independent of the data each carries. Used for
/// flag validation, bracket matching, and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    AnyString,
    Newline,
    StringLiteral,
    RegexString,
    Grammar,
    NamedElement,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
    OneOfSet,
    IteratorDelimiter,
    SubGrammarDefinition,
    SubGrammarUsage,
}

impl Kind {
    /// The flags this kind of element may legally carry.
    pub fn valid_flags(self) -> FlagSet {
        use Flag::*;
        let set = |fs: &[Flag]| fs.iter().copied().collect();
        match self {
            Kind::AnyString => set(&[Quoted, Unquoted]),
            Kind::StringLiteral | Kind::RegexString => set(&[CaseSensitive, CaseInsensitive, Quoted, Unquoted, Not]),
            Kind::Newline
            | Kind::Grammar
            | Kind::NamedElement
            | Kind::ZeroOrOne
            | Kind::ZeroOrMore
            | Kind::OneOrMore
            | Kind::OneOfSet
            | Kind::IteratorDelimiter
            | Kind::SubGrammarDefinition
            | Kind::SubGrammarUsage => FlagSet::new(),
        }
    }

    pub fn human_readable_name(self) -> &'static str {
        match self {
            Kind::AnyString => "Any String .",
            Kind::Newline => "Newline $",
            Kind::StringLiteral => "String Literal",
            Kind::RegexString => "Regular Expression",
            Kind::Grammar => "Named Section (name: ...)",
            Kind::NamedElement => "Named Token <name: ...>",
            Kind::ZeroOrOne => "Zero Or One ?(...)",
            Kind::ZeroOrMore => "Zero Or More *(...)",
            Kind::OneOrMore => "One Or More +(...)",
            Kind::OneOfSet => "One Of Set { ... }",
            Kind::IteratorDelimiter => "Iterator Delimiter sep { ... }",
            Kind::SubGrammarDefinition => "Sub Grammar Definition def name { ... }",
            Kind::SubGrammarUsage => "Sub Grammar Usage name()",
        }
    }
}

impl Element {
    pub fn kind(&self) -> Kind {
        match self {
            Element::AnyString(_) => Kind::AnyString,
            Element::Newline(_) => Kind::Newline,
            Element::StringLiteral { .. } => Kind::StringLiteral,
            Element::RegexString { .. } => Kind::RegexString,
            Element::Grammar { .. } => Kind::Grammar,
            Element::NamedElement { .. } => Kind::NamedElement,
            Element::ZeroOrOne { .. } => Kind::ZeroOrOne,
            Element::ZeroOrMore(_) => Kind::ZeroOrMore,
            Element::OneOrMore(_) => Kind::OneOrMore,
            Element::OneOfSet { .. } => Kind::OneOfSet,
            Element::IteratorDelimiter { .. } => Kind::IteratorDelimiter,
            Element::SubGrammarDefinition { .. } => Kind::SubGrammarDefinition,
            Element::SubGrammarUsage { .. } => Kind::SubGrammarUsage,
        }
    }

    pub fn meta(&self) -> &ElementMeta {
        match self {
            Element::AnyString(m) | Element::Newline(m) => m,
            Element::StringLiteral { meta, .. }
            | Element::RegexString { meta, .. }
            | Element::Grammar { meta, .. }
            | Element::NamedElement { meta, .. }
            | Element::ZeroOrOne { meta, .. }
            | Element::OneOfSet { meta, .. }
            | Element::IteratorDelimiter { meta, .. }
            | Element::SubGrammarDefinition { meta, .. }
            | Element::SubGrammarUsage { meta, .. } => meta,
            Element::ZeroOrMore(r) | Element::OneOrMore(r) => &r.meta,
        }
    }

    pub fn span(&self) -> Span {
        self.meta().span
    }

    /// True for variants that consume exactly zero or one input token
    /// directly (the only kinds a `NamedElement` may contain).
    pub fn is_singular(&self) -> bool {
        matches!(
            self,
            Element::AnyString(_) | Element::Newline(_) | Element::StringLiteral { .. } | Element::RegexString { .. }
        )
    }

    /// A short description used in stack traces and error messages.
    pub fn human_readable_name(&self) -> String {
        match self {
            Element::StringLiteral { literal, .. } => format!("String Literal {literal}"),
            Element::RegexString { pattern, .. } => format!("Regular Expression {pattern}"),
            Element::Grammar { name, .. } => match name {
                Some(name) => format!("Named Section ({name}: ...)"),
                None => "Root Grammar".to_string(),
            },
            Element::NamedElement { name, .. } => format!("Named Token <{name}: ...>"),
            Element::ZeroOrOne { name, .. } => match name {
                Some(name) => format!("Zero Or One ?({name}: ...)"),
                None => "Zero Or One ?(...)".to_string(),
            },
            Element::ZeroOrMore(r) => format!("Zero Or More *({}: ...)", r.name),
            Element::OneOrMore(r) => format!("One Or More +({}: ...)", r.name),
            Element::SubGrammarDefinition { name, .. } => format!("Sub Grammar Definition def {name} {{ ... }}"),
            Element::SubGrammarUsage { name, .. } => format!("Sub Grammar Usage {name}()"),
            _ => self.kind().human_readable_name().to_string(),
        }
    }
}

/// Resolves a token's declared flags against `defaults` and this
/// kind's `valid_flags`, returning the effective flag set.
///
/// Callers must separately validate that `grammar_flags` contains no
/// flag outside `valid_flags` and no two flags from the same
/// mutually-exclusive group (see `crate::flags::conflicting`).
pub fn effective_flags(kind: Kind, grammar_flags: &FlagSet, defaults: &FlagSet) -> FlagSet {
    flags::resolve_effective(grammar_flags, defaults, &kind.valid_flags())
}
