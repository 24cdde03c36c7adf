//! The match engine: a deterministic, backtracking-free tree walk
//! over a compiled element against a token sequence.

use std::collections::BTreeMap;

use crate::element::Element;
use crate::flags::Flag;
use crate::value::{self, Value};

/// The outcome of applying one element at one position: whether it
/// matched, the index to resume at on success, and any capture.
pub type ApplyResult = (bool, Option<usize>, Option<Value>);

fn fail() -> ApplyResult {
    (false, None, None)
}

/// Applies `element` against `tokens` starting at `idx`.
pub fn apply(element: &Element, tokens: &[String], idx: usize) -> ApplyResult {
    if idx < tokens.len() {
        tracing::trace!(target: "tokex", idx, token = %tokens[idx], element = %element.human_readable_name(), "matching");
    }
    let result = apply_inner(element, tokens, idx);
    tracing::trace!(target: "tokex", matched = result.0, "matched");
    result
}

fn apply_inner(element: &Element, tokens: &[String], idx: usize) -> ApplyResult {
    match element {
        Element::AnyString(meta) => {
            if quote_mode_token(tokens, idx, meta.has_flag(Flag::Quoted), meta.has_flag(Flag::Unquoted)).is_some() {
                (true, Some(idx + 1), None)
            } else {
                fail()
            }
        }

        Element::Newline(meta) => {
            let Some(tok) = quote_mode_token(tokens, idx, meta.has_flag(Flag::Quoted), meta.has_flag(Flag::Unquoted)) else {
                return fail();
            };
            if tok == "\n" {
                (true, Some(idx + 1), None)
            } else {
                fail()
            }
        }

        Element::StringLiteral { meta, literal } => {
            let Some(raw) = quote_mode_token(tokens, idx, meta.has_flag(Flag::Quoted), meta.has_flag(Flag::Unquoted)) else {
                return fail();
            };
            let candidate = if meta.has_flag(Flag::CaseInsensitive) { raw.to_lowercase() } else { raw.to_string() };
            let is_match = candidate == *literal;
            if is_match ^ meta.has_flag(Flag::Not) {
                (true, Some(idx + 1), None)
            } else {
                fail()
            }
        }

        Element::RegexString { meta, regex, .. } => {
            let Some(raw) = quote_mode_token(tokens, idx, meta.has_flag(Flag::Quoted), meta.has_flag(Flag::Unquoted)) else {
                return fail();
            };
            let is_match = regex.find(raw).is_some_and(|m| m.start() == 0);
            if is_match ^ meta.has_flag(Flag::Not) {
                (true, Some(idx + 1), None)
            } else {
                fail()
            }
        }

        Element::Grammar { name, children, .. } => {
            let (matched, next, local) = apply_sequence(children, tokens, idx);
            if !matched {
                return fail();
            }
            (true, next, Some(value::Value::named(name.as_deref(), Value::Map(local))))
        }

        Element::NamedElement { name, child, .. } => {
            let Some(child) = child.as_ref() else {
                let mut map = BTreeMap::new();
                map.insert(name.clone(), Value::Null);
                return (true, Some(idx), Some(Value::Map(map)));
            };
            let (matched, next, _) = apply(child, tokens, idx);
            if !matched {
                return fail();
            }
            let mut map = BTreeMap::new();
            map.insert(name.clone(), Value::Str(tokens[idx].clone()));
            (true, next, Some(Value::Map(map)))
        }

        Element::ZeroOrOne { name, children, .. } => {
            if idx >= tokens.len() {
                return (true, Some(idx), None);
            }
            let (matched, next, local) = apply_sequence(children, tokens, idx);
            if matched {
                let capture = if local.is_empty() { None } else { Some(Value::named(name.as_deref(), Value::Map(local))) };
                (true, next, capture)
            } else {
                (true, Some(idx), None)
            }
        }

        Element::ZeroOrMore(repeat) => apply_repeat(repeat, tokens, idx, 0),
        Element::OneOrMore(repeat) => apply_repeat(repeat, tokens, idx, 1),

        Element::OneOfSet { children, .. } => {
            for alternative in children {
                let result @ (matched, _, _) = apply(alternative, tokens, idx);
                if matched {
                    return result;
                }
            }
            fail()
        }

        Element::IteratorDelimiter { children, .. } => {
            let (matched, next, local) = apply_sequence(children, tokens, idx);
            if matched {
                (true, next, Some(Value::Map(local)))
            } else {
                fail()
            }
        }

        Element::SubGrammarDefinition { .. } | Element::SubGrammarUsage { .. } => {
            unreachable!("sub grammar definitions and usages are erased before matching begins")
        }
    }
}

/// Runs `children` as an ordered sequence, threading `idx` and
/// merging every child's mapping capture into one local map
/// (left-to-right overwrite on key collision).
fn apply_sequence(children: &[Element], tokens: &[String], idx: usize) -> (bool, Option<usize>, BTreeMap<String, Value>) {
    let mut local = BTreeMap::new();
    let mut cur = idx;
    for child in children {
        let (matched, next, capture) = apply(child, tokens, cur);
        if !matched {
            return (false, None, BTreeMap::new());
        }
        cur = next.expect("a matched element always reports its resume index");
        if let Some(Value::Map(map)) = capture {
            value::merge_into(&mut local, map);
        }
    }
    (true, Some(cur), local)
}

fn apply_repeat(repeat: &crate::element::RepeatElement, tokens: &[String], idx: usize, minimum: usize) -> ApplyResult {
    let mut cur = idx;
    let mut outputs: Vec<Value> = Vec::new();

    loop {
        if !outputs.is_empty() {
            if let Some(delimiter) = &repeat.delimiter {
                let (matched, next, delim_capture) = apply(delimiter, tokens, cur);
                if !matched {
                    break;
                }
                cur = next.expect("a matched delimiter always reports its resume index");
                if let Some(Value::Map(delim_map)) = delim_capture {
                    if let Some(Value::Map(prev)) = outputs.last_mut() {
                        value::merge_into(prev, delim_map);
                    }
                }
            }
        }

        let (matched, next, local) = apply_sequence(&repeat.children, tokens, cur);
        let next = match next {
            Some(next) if matched => next,
            _ => break,
        };
        if next == cur {
            break;
        }
        outputs.push(Value::Map(local));
        cur = next;
    }

    if outputs.len() >= minimum {
        (true, Some(cur), Some(Value::named(Some(&repeat.name), Value::List(outputs))))
    } else {
        fail()
    }
}

/// Applies the `q`/`u` quote-mode filter to the token at `idx`,
/// returning the (possibly quote-stripped) text to compare against,
/// or `None` if the position is out of range or excluded by the filter.
fn quote_mode_token(tokens: &[String], idx: usize, quoted_only: bool, unquoted_only: bool) -> Option<&str> {
    let tok = tokens.get(idx)?;
    let is_quoted = {
        let mut chars = tok.chars();
        match (chars.next(), tok.chars().last()) {
            (Some(first), Some(last)) => (first == '"' || first == '\'') && first == last && tok.len() >= 2,
            _ => false,
        }
    };

    if quoted_only {
        if is_quoted {
            Some(&tok[1..tok.len() - 1])
        } else {
            None
        }
    } else if unquoted_only && is_quoted {
        None
    } else {
        Some(tok.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::default_flags;
    use crate::{compile, tokenizer::DefaultTokenizer};

    fn tokens_of(input: &str) -> Vec<String> {
        DefaultTokenizer::default().tokenize(input)
    }

    #[test]
    fn scenario_a_literal_flags() {
        let grammar = crate::compile("'a' \"b\" s'c'", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap();
        assert!(grammar.match_str("a b c", true, false).is_some());
        assert!(grammar.match_str("a b C", true, false).is_none());
        assert!(grammar.match_str("a B c", true, false).is_some());
    }

    #[test]
    fn scenario_b_named_tokens() {
        let grammar = compile("<a1:'a'> <a2:.> <a3:'>'>", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap();
        let captured = grammar.match_str("a b >", true, false).unwrap();
        let map = captured.as_map().unwrap();
        assert_eq!(map.get("a1").unwrap().as_str(), Some("a"));
        assert_eq!(map.get("a2").unwrap().as_str(), Some("b"));
        assert_eq!(map.get("a3").unwrap().as_str(), Some(">"));
    }

    #[test]
    fn scenario_c_repetition_with_delimiter() {
        let grammar = compile(
            "(root: <x:'a'> *(xs: <v:.> sep { 'b' }))",
            true,
            Box::new(DefaultTokenizer::default()),
            default_flags(),
        )
        .unwrap();
        let captured = grammar.match_str("a p b q b r", true, false).unwrap();
        let root = captured.as_map().unwrap().get("root").unwrap().as_map().unwrap();
        assert_eq!(root.get("x").unwrap().as_str(), Some("a"));
        let xs = root.get("xs").unwrap().as_list().unwrap();
        assert_eq!(xs.len(), 3);
        assert_eq!(xs[0].as_map().unwrap().get("v").unwrap().as_str(), Some("p"));
        assert_eq!(xs[1].as_map().unwrap().get("v").unwrap().as_str(), Some("q"));
        assert_eq!(xs[2].as_map().unwrap().get("v").unwrap().as_str(), Some("r"));
    }

    #[test]
    fn scenario_d_alternation() {
        let grammar = compile(
            "{ <a:'a'>  (b: <b1:'b1'> 'b2')  'd' }",
            true,
            Box::new(DefaultTokenizer::default()),
            default_flags(),
        )
        .unwrap();
        let captured = grammar.match_str("b1 b2", true, false).unwrap();
        let b = captured.as_map().unwrap().get("b").unwrap().as_map().unwrap();
        assert_eq!(b.get("b1").unwrap().as_str(), Some("b1"));

        let captured = grammar.match_str("d", true, false).unwrap();
        assert!(captured.as_map().unwrap().is_empty());
    }

    #[test]
    fn scenario_e_sub_grammars() {
        let grammar = compile("def g { 'x' }  g()  g()", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap();
        assert!(grammar.match_str("x x", true, false).is_some());

        let err = crate::compile("def g { 'x' }  g()  g()", false, Box::new(DefaultTokenizer::default()), default_flags()).unwrap_err();
        assert!(matches!(err, crate::error::Error::SubGrammarsDisabled { .. }));
    }

    #[test]
    fn scenario_f_delimiter_errors() {
        let err = crate::compile("*(xs: 'a' sep { . } sep { . })", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap_err();
        assert!(matches!(err, crate::error::Error::DuplicateDelimiter { .. }));

        let err = crate::compile("<name: .> sep { . }", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidDelimiter { .. }));
    }

    #[test]
    fn trailing_tokens_fail_when_matching_entirety() {
        let grammar = compile("'a'", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap();
        assert!(grammar.match_str("a b", true, false).is_none());
        assert!(grammar.match_str("a b", false, false).is_some());
    }

    #[test]
    fn zero_or_more_matches_zero_times() {
        let grammar = compile("*(xs: 'a')", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap();
        let captured = grammar.match_str("", true, false).unwrap();
        let xs = captured.as_map().unwrap().get("xs").unwrap().as_list().unwrap();
        assert!(xs.is_empty());
    }

    #[test]
    fn quote_flag_filters_quoted_tokens() {
        let grammar = compile("q.", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap();
        assert!(grammar.match_str(r#""quoted""#, true, false).is_some());
        assert!(grammar.match_str("bare", true, false).is_none());
    }

    #[test]
    fn tokens_of_smoke() {
        assert_eq!(tokens_of("a b"), vec!["a".to_string(), "b".to_string()]);
    }
}
