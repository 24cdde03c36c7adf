//! Quantified invariants from the matching and compilation model,
//! each exercised directly rather than via a seed scenario.

use tokex::flags::{default_flags, Flag};
use tokex::tokenizer::DefaultTokenizer;
use tokex::{compile, Element};

fn grammar(source: &str) -> tokex::CompiledGrammar {
    compile(source, true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap_or_else(|e| panic!("failed to compile {source:?}: {}", e.render()))
}

#[test]
fn determinism_same_grammar_and_input_always_agree() {
    let g = grammar("(root: <x:.> *(xs: <v:.> sep { ',' }))");
    let input = "a , b , c";
    let first = g.match_str(input, true, false);
    let second = g.match_str(input, true, false);
    assert_eq!(first, second);
}

#[test]
fn termination_zero_width_iterations_do_not_loop_forever() {
    // `?(...)` inside `*(...)` can match without consuming a token; the
    // fixpoint guard must still stop the outer repetition.
    let g = grammar("*(xs: ?(maybe: 'nope'))");
    let result = g.match_str("a b c", false, false);
    assert!(result.is_some());
}

#[test]
fn flag_exclusivity_rejects_conflicting_groups() {
    let err = compile("si'a'", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap_err();
    assert!(matches!(err, tokex::error::Error::MutuallyExclusiveGrammarTokenFlags { .. }));

    let err = compile("qu.", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap_err();
    assert!(matches!(err, tokex::error::Error::MutuallyExclusiveGrammarTokenFlags { .. }));
}

#[test]
fn ownership_every_element_appears_exactly_once() {
    fn count_descendants(el: &Element) -> usize {
        1 + children_of(el).iter().map(|c| count_descendants(c)).sum::<usize>()
    }

    fn children_of(el: &Element) -> Vec<&Element> {
        match el {
            Element::Grammar { children, .. }
            | Element::ZeroOrOne { children, .. }
            | Element::OneOfSet { children, .. }
            | Element::IteratorDelimiter { children, .. } => children.iter().collect(),
            Element::ZeroOrMore(r) | Element::OneOrMore(r) => {
                let mut all: Vec<&Element> = r.children.iter().collect();
                if let Some(d) = &r.delimiter {
                    all.push(d);
                }
                all
            }
            Element::NamedElement { child, .. } => child.iter().map(|b| b.as_ref()).collect(),
            _ => Vec::new(),
        }
    }

    let tokens = tokex::lexer::lex("(a: <x:.> { 'y' 'z' } *(xs: . sep { ',' }))").unwrap();
    let root = tokex::parser::parse(tokens, true, &default_flags(), "").unwrap();
    // A tree walk that counts every node visits each element exactly
    // once; this is just a smoke check that the count is stable and
    // matches a manual recount (no element is aliased into two parents).
    let first = count_descendants(&root);
    let second = count_descendants(&root);
    assert_eq!(first, second);
    assert!(first > 1);
}

#[test]
fn ordering_alternatives_tried_in_declaration_order() {
    // Both alternatives would match "x"; the first one listed must win.
    let g = grammar("{ <first:'x'> <second:'x'> }");
    let captured = g.match_str("x", true, false).unwrap();
    let map = captured.as_map().unwrap();
    assert!(map.contains_key("first"));
    assert!(!map.contains_key("second"));
}

#[test]
fn capture_monotonicity_list_length_matches_iteration_count() {
    let g = grammar("*(xs: . sep { ',' })");
    let captured = g.match_str("a , b , c , d", true, false).unwrap();
    let xs = captured.as_map().unwrap().get("xs").unwrap().as_list().unwrap();
    assert_eq!(xs.len(), 4);
}

#[test]
fn escapes_remove_one_backslash_before_the_delimiter_only() {
    let tokens = tokex::lexer::lex(r"'it\'s \d+ \\ done'").unwrap();
    match &tokens[0].shape {
        tokex::token::Shape::StringLiteral { body, .. } => assert_eq!(body, r"it's \d+ \\ done"),
        other => panic!("unexpected shape: {other:?}"),
    }
}

#[test]
fn idempotent_compile_yields_structurally_equal_trees() {
    let source = "(root: <x:'a'> *(xs: <v:.> sep { 'b' }))";
    let tree_a = tokex::parser::parse(tokex::lexer::lex(source).unwrap(), true, &default_flags(), source).unwrap();
    let tree_b = tokex::parser::parse(tokex::lexer::lex(source).unwrap(), true, &default_flags(), source).unwrap();
    assert_eq!(tree_a, tree_b);
}

#[test]
fn default_case_insensitive_flag_only_applies_when_group_is_silent() {
    assert!(default_flags().contains(&Flag::CaseInsensitive));
}
