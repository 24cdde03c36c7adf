//! Grammar parser: consumes the lexed token stream and builds the
//! root `Grammar` element, maintaining the element stack and the
//! parallel sub-grammar scope stack described for the match engine.

use std::collections::HashMap;

use regex::RegexBuilder;

use crate::element::{effective_flags, Element, ElementMeta, Kind};
use crate::error::{Error, Span, StackFrame};
use crate::flags::{self, FlagSet};
use crate::token::{GrammarToken, Shape};

/// A still-open element, being accumulated as tokens are consumed.
enum Frame {
    Grammar { meta: ElementMeta, name: Option<String>, children: Vec<Element> },
    NamedElement { meta: ElementMeta, name: String, child: Option<Element> },
    ZeroOrOne { meta: ElementMeta, name: Option<String>, children: Vec<Element> },
    ZeroOrMore { meta: ElementMeta, name: String, children: Vec<Element>, delimiter: Option<Element> },
    OneOrMore { meta: ElementMeta, name: String, children: Vec<Element>, delimiter: Option<Element> },
    OneOfSet { meta: ElementMeta, children: Vec<Element> },
    IteratorDelimiter { meta: ElementMeta, children: Vec<Element> },
    SubGrammarDefinition { meta: ElementMeta, name: String, children: Vec<Element> },
}

impl Frame {
    fn kind(&self) -> Kind {
        match self {
            Frame::Grammar { .. } => Kind::Grammar,
            Frame::NamedElement { .. } => Kind::NamedElement,
            Frame::ZeroOrOne { .. } => Kind::ZeroOrOne,
            Frame::ZeroOrMore { .. } => Kind::ZeroOrMore,
            Frame::OneOrMore { .. } => Kind::OneOrMore,
            Frame::OneOfSet { .. } => Kind::OneOfSet,
            Frame::IteratorDelimiter { .. } => Kind::IteratorDelimiter,
            Frame::SubGrammarDefinition { .. } => Kind::SubGrammarDefinition,
        }
    }

    fn human_readable_name(&self) -> String {
        match self {
            Frame::Grammar { name: Some(name), .. } => format!("Named Section ({name}: ...)"),
            Frame::Grammar { name: None, .. } => "Root Grammar".to_string(),
            Frame::NamedElement { name, .. } => format!("Named Token <{name}: ...>"),
            Frame::ZeroOrOne { name: Some(name), .. } => format!("Zero Or One ?({name}: ...)"),
            Frame::ZeroOrOne { name: None, .. } => "Zero Or One ?(...)".to_string(),
            Frame::ZeroOrMore { name, .. } => format!("Zero Or More *({name}: ...)"),
            Frame::OneOrMore { name, .. } => format!("One Or More +({name}: ...)"),
            Frame::SubGrammarDefinition { name, .. } => format!("Sub Grammar Definition def {name} {{ ... }}"),
            Frame::OneOfSet { .. } | Frame::IteratorDelimiter { .. } => self.kind().human_readable_name().to_string(),
        }
    }

    /// Attaches `child` to this frame, enforcing the named-element
    /// single-singular-child invariant. On violation, returns the
    /// named element's name so the caller can raise
    /// `NamedElementContents` with a stack trace captured before the
    /// mutable borrow of the frame began.
    fn add_child(&mut self, child: Element) -> Result<(), String> {
        match self {
            Frame::NamedElement { name, child: slot, .. } => {
                if slot.is_some() || !child.is_singular() {
                    return Err(name.clone());
                }
                *slot = Some(child);
                Ok(())
            }
            Frame::Grammar { children, .. }
            | Frame::ZeroOrOne { children, .. }
            | Frame::ZeroOrMore { children, .. }
            | Frame::OneOrMore { children, .. }
            | Frame::OneOfSet { children, .. }
            | Frame::IteratorDelimiter { children, .. }
            | Frame::SubGrammarDefinition { children, .. } => {
                children.push(child);
                Ok(())
            }
        }
    }

    fn finish(self, sub_grammars: HashMap<String, Element>) -> Element {
        match self {
            Frame::Grammar { meta, name, children } => Element::Grammar { meta, name, children },
            Frame::NamedElement { meta, name, child } => Element::NamedElement { meta, name, child: child.map(Box::new) },
            Frame::ZeroOrOne { meta, name, children } => Element::ZeroOrOne { meta, name, children },
            Frame::ZeroOrMore { meta, name, children, delimiter } => {
                Element::ZeroOrMore(crate::element::RepeatElement { meta, name, children, delimiter: delimiter.map(Box::new) })
            }
            Frame::OneOrMore { meta, name, children, delimiter } => {
                Element::OneOrMore(crate::element::RepeatElement { meta, name, children, delimiter: delimiter.map(Box::new) })
            }
            Frame::OneOfSet { meta, children } => Element::OneOfSet { meta, children },
            Frame::IteratorDelimiter { meta, children } => Element::IteratorDelimiter { meta, children },
            Frame::SubGrammarDefinition { meta, name, children } => {
                Element::SubGrammarDefinition { meta, name, children, sub_grammars }
            }
        }
    }
}

/// Attaches `child` to the top of `element_stack`, raising
/// `NamedElementContents` (with a stack trace captured before the
/// mutable borrow) on violation.
fn attach_child(element_stack: &mut [Frame], child: Element, span: Span, grammar: &str) -> Result<(), Error> {
    let trace = stack_trace(element_stack);
    let top = element_stack.last_mut().expect("root frame always present");
    top.add_child(child)
        .map_err(|name| Error::NamedElementContents { name, span, grammar: grammar.to_string(), element_stack: trace })
}

fn stack_trace(stack: &[Frame]) -> Vec<StackFrame> {
    stack
        .iter()
        .enumerate()
        .map(|(depth, frame)| StackFrame { label: frame.human_readable_name(), depth })
        .collect()
}

/// Deep-copies an element's children for sub-grammar usage inlining.
/// Usages never appear in the final tree, so this is the only clone
/// path the compiler exercises.
fn clone_element(element: &Element) -> Element {
    element.clone()
}

/// Parses a lexed grammar token stream into the root `Grammar` element.
pub fn parse(
    tokens: Vec<GrammarToken>,
    allow_sub_grammar_definitions: bool,
    defaults: &FlagSet,
    grammar: &str,
) -> Result<Element, Error> {
    let mut element_stack: Vec<Frame> = vec![Frame::Grammar { meta: ElementMeta::new("", FlagSet::new(), FlagSet::new(), Span::default()), name: None, children: Vec::new() }];
    let mut sub_grammar_stack: Vec<HashMap<String, Element>> = vec![HashMap::new()];

    for token in tokens {
        let span = token.span;

        match token.shape {
            Shape::SubGrammarDefOpen { name } => {
                if !allow_sub_grammar_definitions {
                    return Err(Error::SubGrammarsDisabled { name, span, grammar: grammar.to_string() });
                }
                let scope_ok = element_stack[1..].iter().all(|f| matches!(f, Frame::SubGrammarDefinition { .. }));
                if !scope_ok {
                    return Err(Error::SubGrammarScope {
                        name,
                        span,
                        grammar: grammar.to_string(),
                        element_stack: stack_trace(&element_stack),
                    });
                }
                let meta = ElementMeta::new(token.text, FlagSet::new(), FlagSet::new(), span);
                element_stack.push(Frame::SubGrammarDefinition { meta, name, children: Vec::new() });
                sub_grammar_stack.push(HashMap::new());
            }

            Shape::SubGrammarUsage { name } => {
                let resolved = sub_grammar_stack.iter().rev().find_map(|scope| scope.get(&name));
                let children = match resolved {
                    Some(Element::SubGrammarDefinition { children, .. }) => children.iter().map(clone_element).collect::<Vec<_>>(),
                    _ => {
                        return Err(Error::UndefinedSubGrammar {
                            name,
                            span,
                            grammar: grammar.to_string(),
                            sub_grammar_stack: stack_trace(&element_stack),
                        })
                    }
                };
                for child in children {
                    attach_child(&mut element_stack, child, span, grammar)?;
                }
            }

            Shape::DelimiterOpen => {
                let top = element_stack.last_mut().expect("root frame always present");
                let is_repeat = matches!(top, Frame::ZeroOrMore { .. } | Frame::OneOrMore { .. });
                if !is_repeat {
                    let kind = top.human_readable_name();
                    return Err(Error::InvalidDelimiter {
                        kind,
                        span,
                        grammar: grammar.to_string(),
                        element_stack: stack_trace(&element_stack),
                    });
                }
                let has_delimiter = match top {
                    Frame::ZeroOrMore { delimiter, .. } | Frame::OneOrMore { delimiter, .. } => delimiter.is_some(),
                    _ => unreachable!("checked above"),
                };
                if has_delimiter {
                    let kind = top.human_readable_name();
                    return Err(Error::DuplicateDelimiter {
                        kind,
                        span,
                        grammar: grammar.to_string(),
                        element_stack: stack_trace(&element_stack),
                    });
                }
                let meta = ElementMeta::new(token.text, FlagSet::new(), FlagSet::new(), span);
                element_stack.push(Frame::IteratorDelimiter { meta, children: Vec::new() });
            }

            Shape::ScopedOpen { sigil, name } => {
                let meta = ElementMeta::new(token.text, FlagSet::new(), FlagSet::new(), span);
                let frame = match sigil {
                    Some('*') => Frame::ZeroOrMore { meta, name, children: Vec::new(), delimiter: None },
                    Some('+') => Frame::OneOrMore { meta, name, children: Vec::new(), delimiter: None },
                    Some('?') => Frame::ZeroOrOne { meta, name: Some(name), children: Vec::new() },
                    _ => Frame::Grammar { meta, name: Some(name), children: Vec::new() },
                };
                element_stack.push(frame);
            }

            Shape::UnnamedZeroOrOneOpen => {
                let meta = ElementMeta::new(token.text, FlagSet::new(), FlagSet::new(), span);
                element_stack.push(Frame::ZeroOrOne { meta, name: None, children: Vec::new() });
            }

            Shape::NamedElementOpen { name } => {
                let meta = ElementMeta::new(token.text, FlagSet::new(), FlagSet::new(), span);
                element_stack.push(Frame::NamedElement { meta, name, child: None });
            }

            Shape::SetOpen => {
                let meta = ElementMeta::new(token.text, FlagSet::new(), FlagSet::new(), span);
                element_stack.push(Frame::OneOfSet { meta, children: Vec::new() });
            }

            Shape::AnyString => {
                check_mutual_exclusion(Kind::AnyString, &token.flags, span, grammar, &element_stack)?;
                let effective = effective_flags(Kind::AnyString, &token.flags, defaults);
                let meta = ElementMeta::new(token.text, token.flags, effective, span);
                let child = Element::AnyString(meta);
                attach_child(&mut element_stack, child, span, grammar)?;
            }

            Shape::Newline => {
                let effective = effective_flags(Kind::Newline, &token.flags, defaults);
                let meta = ElementMeta::new(token.text, token.flags, effective, span);
                let child = Element::Newline(meta);
                attach_child(&mut element_stack, child, span, grammar)?;
            }

            Shape::StringLiteral { body, .. } => {
                check_mutual_exclusion(Kind::StringLiteral, &token.flags, span, grammar, &element_stack)?;
                let effective = effective_flags(Kind::StringLiteral, &token.flags, defaults);
                let literal = if effective.contains(&flags::Flag::CaseInsensitive) { body.to_lowercase() } else { body };
                let meta = ElementMeta::new(token.text, token.flags, effective, span);
                let child = Element::StringLiteral { meta, literal };
                attach_child(&mut element_stack, child, span, grammar)?;
            }

            Shape::RegexString { body } => {
                check_mutual_exclusion(Kind::RegexString, &token.flags, span, grammar, &element_stack)?;
                let effective = effective_flags(Kind::RegexString, &token.flags, defaults);
                let case_insensitive = effective.contains(&flags::Flag::CaseInsensitive);
                let regex = RegexBuilder::new(&body)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|e| Error::InvalidRegex { pattern: body.clone(), reason: e.to_string(), span, grammar: grammar.to_string() })?;
                let meta = ElementMeta::new(token.text, token.flags, effective, span);
                let child = Element::RegexString { meta, pattern: body, regex };
                attach_child(&mut element_stack, child, span, grammar)?;
            }

            Shape::CloseAngle => {
                let top = element_stack.last().expect("root frame always present");
                if top.kind() != Kind::NamedElement {
                    return Err(Error::MismatchedBrackets {
                        token: ">".to_string(),
                        expected: top.human_readable_name(),
                        span,
                        grammar: grammar.to_string(),
                        element_stack: stack_trace(&element_stack),
                    });
                }
                close_and_attach(&mut element_stack, &mut sub_grammar_stack, span, grammar)?;
            }

            Shape::CloseParen => {
                let top = element_stack.last().expect("root frame always present");
                let closable = matches!(top.kind(), Kind::Grammar | Kind::ZeroOrOne | Kind::ZeroOrMore | Kind::OneOrMore);
                if !closable || element_stack.len() == 1 {
                    return Err(Error::MismatchedBrackets {
                        token: ")".to_string(),
                        expected: top.human_readable_name(),
                        span,
                        grammar: grammar.to_string(),
                        element_stack: stack_trace(&element_stack),
                    });
                }
                close_and_attach(&mut element_stack, &mut sub_grammar_stack, span, grammar)?;
            }

            Shape::CloseBrace => {
                let top = element_stack.last().expect("root frame always present");
                if !matches!(top.kind(), Kind::OneOfSet | Kind::IteratorDelimiter | Kind::SubGrammarDefinition) {
                    return Err(Error::MismatchedBrackets {
                        token: "}".to_string(),
                        expected: top.human_readable_name(),
                        span,
                        grammar: grammar.to_string(),
                        element_stack: stack_trace(&element_stack),
                    });
                }
                close_and_attach(&mut element_stack, &mut sub_grammar_stack, span, grammar)?;
            }
        }
    }

    if element_stack.len() > 1 {
        let unclosed = element_stack.last().expect("checked len > 1");
        return Err(Error::ExtraOpeningBrackets {
            token: unclosed.human_readable_name(),
            span: unclosed_span(unclosed),
            grammar: grammar.to_string(),
            element_stack: stack_trace(&element_stack),
        });
    }

    let root = element_stack.pop().expect("root frame always present");
    Ok(root.finish(HashMap::new()))
}

fn unclosed_span(frame: &Frame) -> Span {
    match frame {
        Frame::Grammar { meta, .. }
        | Frame::NamedElement { meta, .. }
        | Frame::ZeroOrOne { meta, .. }
        | Frame::ZeroOrMore { meta, .. }
        | Frame::OneOrMore { meta, .. }
        | Frame::OneOfSet { meta, .. }
        | Frame::IteratorDelimiter { meta, .. }
        | Frame::SubGrammarDefinition { meta, .. } => meta.span,
    }
}

fn check_mutual_exclusion(kind: Kind, explicit: &FlagSet, span: Span, grammar: &str, element_stack: &[Frame]) -> Result<(), Error> {
    let conflicts = flags::conflicting(explicit);
    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(Error::MutuallyExclusiveGrammarTokenFlags {
            kind: kind.human_readable_name().to_string(),
            flags: flags::render(&conflicts),
            span,
            grammar: grammar.to_string(),
            element_stack: stack_trace(element_stack),
        })
    }
}

/// Pops the top frame, finishes it, and attaches the result to the
/// frame now on top — either as a child, as a parent's delimiter, or
/// (for sub-grammar definitions) filed by name in the enclosing scope.
fn close_and_attach(
    element_stack: &mut Vec<Frame>,
    sub_grammar_stack: &mut Vec<HashMap<String, Element>>,
    span: Span,
    grammar: &str,
) -> Result<(), Error> {
    let popped = element_stack.pop().expect("caller verified a closable top frame exists");

    match popped {
        Frame::SubGrammarDefinition { meta, name, children } => {
            let nested = sub_grammar_stack.pop().expect("pushed in lockstep with SubGrammarDefinition frames");
            let finished = Element::SubGrammarDefinition { meta, name: name.clone(), children, sub_grammars: nested };
            sub_grammar_stack.last_mut().expect("root scope always present").insert(name, finished);
        }
        Frame::IteratorDelimiter { meta, children } => {
            let finished = Element::IteratorDelimiter { meta, children };
            let top = element_stack.last_mut().expect("delimiter always nested under its owning repetition");
            match top {
                Frame::ZeroOrMore { delimiter, .. } | Frame::OneOrMore { delimiter, .. } => {
                    *delimiter = Some(finished);
                }
                _ => unreachable!("InvalidDelimiter is checked when the delimiter is opened, not when it closes"),
            }
        }
        other => {
            let finished = other.finish(HashMap::new());
            attach_child(element_stack, finished, span, grammar)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_str(grammar: &str) -> Result<Element, Error> {
        let tokens = lex(grammar)?;
        parse(tokens, true, &flags::default_flags(), grammar)
    }

    #[test]
    fn parses_flat_sequence() {
        let el = parse_str("'a' \"b\" s'c'").unwrap();
        match el {
            Element::Grammar { children, name, .. } => {
                assert_eq!(name, None);
                assert_eq!(children.len(), 3);
            }
            other => panic!("expected Grammar, got {other:?}"),
        }
    }

    #[test]
    fn named_element_rejects_second_child() {
        let err = parse_str("<a: . .>").unwrap_err();
        assert!(matches!(err, Error::NamedElementContents { .. }));
    }

    #[test]
    fn mismatched_closing_paren_on_named_element() {
        let err = parse_str("<a: .)").unwrap_err();
        assert!(matches!(err, Error::MismatchedBrackets { .. }));
    }

    #[test]
    fn unclosed_scope_raises_extra_opening_brackets() {
        let err = parse_str("(x: 'a'").unwrap_err();
        assert!(matches!(err, Error::ExtraOpeningBrackets { .. }));
    }

    #[test]
    fn delimiter_on_named_element_is_invalid() {
        let err = parse_str("<a: .> sep { . }").unwrap_err();
        assert!(matches!(err, Error::InvalidDelimiter { .. }));
    }

    #[test]
    fn duplicate_delimiter_raises() {
        let err = parse_str("*(xs: 'a' sep { . } sep { . })").unwrap_err();
        assert!(matches!(err, Error::DuplicateDelimiter { .. }));
    }

    #[test]
    fn sub_grammar_definitions_disabled_raises() {
        let tokens = lex("def g { 'x' } g()").unwrap();
        let err = parse(tokens, false, &flags::default_flags(), "def g { 'x' } g()").unwrap_err();
        assert!(matches!(err, Error::SubGrammarsDisabled { .. }));
    }

    #[test]
    fn undefined_sub_grammar_raises() {
        let err = parse_str("missing()").unwrap_err();
        assert!(matches!(err, Error::UndefinedSubGrammar { .. }));
    }

    #[test]
    fn sub_grammar_usage_inlines_copies() {
        let el = parse_str("def g { 'x' } g() g()").unwrap();
        match el {
            Element::Grammar { children, .. } => assert_eq!(children.len(), 2),
            other => panic!("expected Grammar, got {other:?}"),
        }
    }
}
