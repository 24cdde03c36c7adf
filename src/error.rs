//! Error types for Tokex.
//!
//! This module defines every error kind the grammar compiler can raise,
//! plus the caret-snippet and element-tree rendering that turns a raw
//! error into something a grammar author can act on.
//!
//! The match engine itself never raises: a failed match is reported
//! through the boolean channel in [`crate::matcher`], not through this
//! type. Only grammar compilation (lexing + parsing) can fail.

use thiserror::Error;

/// A byte-offset span into the grammar source, with the line/column of
/// its start for human-readable error output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Starting byte offset (inclusive).
    pub start: usize,
    /// Ending byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One frame of the element stack or sub-grammar stack at the time an
/// error was raised, used only for rendering.
#[derive(Debug, Clone)]
pub struct StackFrame {
    /// Human-readable name of the element kind (e.g. `"ZeroOrMore xs"`).
    pub label: String,
    /// Nesting depth, for indentation.
    pub depth: usize,
}

/// Every error the grammar compiler (lexer + parser) can raise.
///
/// All variants carry enough context (grammar source, span, and the
/// element/sub-grammar stacks at the time of failure) to render a
/// caret-annotated snippet and a tree view via [`Error::render`].
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The lexer's fallback alternative matched a run of non-whitespace
    /// text that didn't fit any recognised grammar token shape.
    #[error("encountered unknown grammar token: {text}")]
    UnknownGrammarToken {
        /// The offending source text.
        text: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
    },

    /// A flag was attached to a token kind that doesn't accept it.
    #[error("invalid flag(s) given to {kind}: {invalid_flags}; valid flags are: {valid_flags}")]
    InvalidGrammarTokenFlags {
        /// Human-readable name of the element kind the flags were attached to.
        kind: String,
        /// The offending flag characters, joined for display.
        invalid_flags: String,
        /// The flags this kind actually accepts, joined for display.
        valid_flags: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
    },

    /// Two flags from the same mutually-exclusive group (`{s,i}` or
    /// `{q,u}`) were both given explicitly.
    #[error("mutually exclusive flags given to {kind}: {flags}")]
    MutuallyExclusiveGrammarTokenFlags {
        /// Human-readable name of the element kind.
        kind: String,
        /// The conflicting flag characters, joined for display.
        flags: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
        /// Element stack at the point of failure.
        element_stack: Vec<StackFrame>,
    },

    /// A `~pattern~` body failed to compile as a regular expression.
    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidRegex {
        /// The regex source text that failed to compile.
        pattern: String,
        /// The underlying compile error, rendered to a string.
        reason: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
    },

    /// `sep { ... }` was attached to an element that isn't a
    /// `ZeroOrMore`/`OneOrMore`.
    #[error("cannot add an iterator delimiter to {kind}")]
    InvalidDelimiter {
        /// Human-readable name of the element the delimiter was attached to.
        kind: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
        /// Element stack at the point of failure.
        element_stack: Vec<StackFrame>,
    },

    /// A second `sep { ... }` was given to an element that already has one.
    #[error("multiple iterator delimiters defined for {kind}")]
    DuplicateDelimiter {
        /// Human-readable name of the element the delimiter was attached to.
        kind: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
        /// Element stack at the point of failure.
        element_stack: Vec<StackFrame>,
    },

    /// A closing bracket/paren/brace was seen with no matching opener
    /// left on the element stack.
    #[error("extra closing token given: {token}")]
    ExtraClosingBrackets {
        /// The offending closing token text.
        token: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
    },

    /// Tokens ran out while the element stack still had unclosed scopes.
    #[error("extra opening token given; {token} was never closed")]
    ExtraOpeningBrackets {
        /// The text of the still-open element.
        token: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
        /// Element stack at the point of failure.
        element_stack: Vec<StackFrame>,
    },

    /// A closing token was seen, but it doesn't match the kind of
    /// scope currently open.
    #[error("mismatched brackets; got {token}, expected a closer for {expected}")]
    MismatchedBrackets {
        /// The offending closing token text.
        token: String,
        /// Human-readable name of the scope that was actually open.
        expected: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
        /// Element stack at the point of failure.
        element_stack: Vec<StackFrame>,
    },

    /// A `<name: ...>` was given more than one singular child, or a
    /// non-singular child.
    #[error("named element {name:?} can only contain one singular element")]
    NamedElementContents {
        /// Name of the offending `NamedElement`.
        name: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
        /// Element stack at the point of failure.
        element_stack: Vec<StackFrame>,
    },

    /// `def name { ... }` was used with `allow_sub_grammar_definitions = false`.
    #[error("cannot define sub grammar {name:?}: sub grammar definitions are disabled")]
    SubGrammarsDisabled {
        /// Name of the sub grammar that was being defined.
        name: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
    },

    /// `def name { ... }` appeared nested inside something other than
    /// the root grammar or another sub grammar definition.
    #[error("sub grammar {name:?} can only be defined at the root or inside another sub grammar")]
    SubGrammarScope {
        /// Name of the sub grammar that was being defined.
        name: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
        /// Element stack at the point of failure.
        element_stack: Vec<StackFrame>,
    },

    /// `name()` referenced a sub grammar that was never defined in any
    /// enclosing scope.
    #[error("sub grammar {name:?} does not exist")]
    UndefinedSubGrammar {
        /// Name of the sub grammar that was referenced.
        name: String,
        /// Location in the grammar source.
        span: Span,
        /// The full grammar source, for caret rendering.
        grammar: String,
        /// Sub grammar stack at the point of failure.
        sub_grammar_stack: Vec<StackFrame>,
    },
}

impl Error {
    fn grammar_and_span(&self) -> Option<(&str, Span)> {
        use Error::*;
        match self {
            UnknownGrammarToken { grammar, span, .. }
            | InvalidGrammarTokenFlags { grammar, span, .. }
            | MutuallyExclusiveGrammarTokenFlags { grammar, span, .. }
            | InvalidRegex { grammar, span, .. }
            | InvalidDelimiter { grammar, span, .. }
            | DuplicateDelimiter { grammar, span, .. }
            | ExtraClosingBrackets { grammar, span, .. }
            | ExtraOpeningBrackets { grammar, span, .. }
            | MismatchedBrackets { grammar, span, .. }
            | NamedElementContents { grammar, span, .. }
            | SubGrammarsDisabled { grammar, span, .. }
            | SubGrammarScope { grammar, span, .. }
            | UndefinedSubGrammar { grammar, span, .. } => Some((grammar.as_str(), *span)),
        }
    }

    fn element_stack(&self) -> &[StackFrame] {
        use Error::*;
        match self {
            MutuallyExclusiveGrammarTokenFlags { element_stack, .. }
            | InvalidDelimiter { element_stack, .. }
            | DuplicateDelimiter { element_stack, .. }
            | ExtraOpeningBrackets { element_stack, .. }
            | MismatchedBrackets { element_stack, .. }
            | NamedElementContents { element_stack, .. }
            | SubGrammarScope { element_stack, .. } => element_stack,
            UndefinedSubGrammar {
                sub_grammar_stack, ..
            } => sub_grammar_stack,
            _ => &[],
        }
    }

    /// Renders this error as a message line, a `Line L Column C`
    /// caret-annotated snippet, and (when available) an indented
    /// listing of the element/sub-grammar stack at the time of failure.
    pub fn render(&self) -> String {
        let mut out = self.to_string();

        if let Some((grammar, span)) = self.grammar_and_span() {
            if let Some(snippet) = render_snippet(grammar, span) {
                out.push('\n');
                out.push_str(&snippet);
            }
        }

        let stack = self.element_stack();
        if !stack.is_empty() {
            out.push_str("\nElement stack at the time of error:\n");
            out.push_str(&render_stack(stack));
        }

        out
    }
}

/// Renders a `Line L Column C` header followed by up to 50 characters
/// of grammar source on either side of `span`, with a caret line
/// underneath pointing at the offending range.
fn render_snippet(grammar: &str, span: Span) -> Option<String> {
    if span.end > grammar.len() || span.start > span.end {
        return None;
    }

    let start_of_line = grammar[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let end_of_line = grammar[span.end..]
        .find('\n')
        .map_or(grammar.len(), |i| span.end + i);

    let snippet_start = start_of_line.max(span.start.saturating_sub(50));
    let snippet_end = end_of_line.min(span.end + 50);
    let snippet = &grammar[snippet_start..snippet_end];

    let line_num = grammar[..span.start].matches('\n').count() + 1;
    let col_num = span.start - snippet_start;
    let caret_len = (span.end - span.start).max(1);

    let caret_line: String = " ".repeat(col_num) + &"^".repeat(caret_len);

    Some(format!(
        "Line {line_num} Column {col_num}:\n{snippet}\n{caret_line}"
    ))
}

fn render_stack(stack: &[StackFrame]) -> String {
    stack
        .iter()
        .map(|frame| format!("{}{}", "  ".repeat(frame.depth), frame.label))
        .collect::<Vec<_>>()
        .join("\n")
}

