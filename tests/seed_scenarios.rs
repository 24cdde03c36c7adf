//! End-to-end scenarios exercising the grammar DSL against tokenized
//! input, one per documented behavior.

use tokex::flags::default_flags;
use tokex::tokenizer::DefaultTokenizer;
use tokex::{compile, error::Error};

fn grammar(source: &str) -> tokex::CompiledGrammar {
    compile(source, true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap_or_else(|e| panic!("failed to compile {source:?}: {}", e.render()))
}

#[test]
fn scenario_a_literals_and_default_case_insensitivity() {
    let g = grammar("'a' \"b\" s'c'");
    assert!(g.match_str("a b c", true, false).is_some());
    assert!(g.match_str("a b C", true, false).is_none());
    assert!(g.match_str("a B c", true, false).is_some());
}

#[test]
fn scenario_b_named_tokens_in_order() {
    let g = grammar("<a1:'a'> <a2:.> <a3:'>'>");
    let captured = g.match_str("a b >", true, false).unwrap();
    let map = captured.as_map().unwrap();
    assert_eq!(map.get("a1").unwrap().as_str(), Some("a"));
    assert_eq!(map.get("a2").unwrap().as_str(), Some("b"));
    assert_eq!(map.get("a3").unwrap().as_str(), Some(">"));
}

#[test]
fn scenario_c_nested_repetition_with_delimiter() {
    let g = grammar("(root: <x:'a'> *(xs: <v:.> sep { 'b' }))");
    let captured = g.match_str("a p b q b r", true, false).unwrap();
    let root = captured.as_map().unwrap().get("root").unwrap().as_map().unwrap();
    assert_eq!(root.get("x").unwrap().as_str(), Some("a"));
    let xs = root.get("xs").unwrap().as_list().unwrap();
    let values: Vec<_> = xs.iter().map(|v| v.as_map().unwrap().get("v").unwrap().as_str().unwrap()).collect();
    assert_eq!(values, vec!["p", "q", "r"]);
}

#[test]
fn scenario_d_alternation_first_match_wins() {
    let g = grammar("{ <a:'a'>  (b: <b1:'b1'> 'b2')  'd' }");

    let captured = g.match_str("b1 b2", true, false).unwrap();
    let b = captured.as_map().unwrap().get("b").unwrap().as_map().unwrap();
    assert_eq!(b.get("b1").unwrap().as_str(), Some("b1"));

    let captured = g.match_str("d", true, false).unwrap();
    assert!(captured.as_map().unwrap().is_empty());
}

#[test]
fn scenario_e_sub_grammar_reuse_and_disabling() {
    let g = grammar("def g { 'x' }  g()  g()");
    assert!(g.match_str("x x", true, false).is_some());

    let err = compile("def g { 'x' }  g()  g()", false, Box::new(DefaultTokenizer::default()), default_flags()).unwrap_err();
    assert!(matches!(err, Error::SubGrammarsDisabled { .. }));
}

#[test]
fn scenario_f_delimiter_misuse_raises_errors() {
    let err = compile("*(xs: 'a' sep { . } sep { . })", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap_err();
    assert!(matches!(err, Error::DuplicateDelimiter { .. }));

    let err = compile("<name: .> sep { . }", true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap_err();
    assert!(matches!(err, Error::InvalidDelimiter { .. }));
}
