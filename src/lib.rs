//! # Tokex
//!
//! Tokex compiles a small grammar DSL string into a tree of matchers,
//! then walks that tree against a tokenized input string to produce a
//! tree of named captures.
//!
//! ## Quick start
//!
//! ```rust
//! use tokex::{compile, flags::default_flags, tokenizer::DefaultTokenizer};
//!
//! let grammar = compile(
//!     "<greeting:'hello'> <name:.>",
//!     true,
//!     Box::new(DefaultTokenizer::default()),
//!     default_flags(),
//! ).unwrap();
//!
//! let captured = grammar.match_str("hello world", true, false).unwrap();
//! assert_eq!(captured.as_map().unwrap().get("name").unwrap().as_str(), Some("world"));
//! ```
//!
//! ## Modules
//!
//! - [`flags`]: flag characters and mutual-exclusion/default rules.
//! - [`token`]: the lexer's intermediate token representation.
//! - [`lexer`]: turns a grammar string into grammar tokens.
//! - [`element`]: the compiled grammar tree.
//! - [`parser`]: turns grammar tokens into an [`element::Element`] tree.
//! - [`matcher`]: the match engine.
//! - [`value`]: the capture value tree a match produces.
//! - [`tokenizer`]: pluggable input tokenization.
//! - [`tokenizers`]: non-default tokenizer variants (SQL, numeric).
//! - [`error`]: the closed set of grammar-compile-time errors.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod element;
pub mod error;
pub mod flags;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod token;
pub mod tokenizer;
pub mod tokenizers;
pub mod value;

pub use element::Element;
pub use error::Error;
pub use flags::FlagSet;
pub use tokenizer::Tokenizer;
pub use value::Value;

/// A grammar that has been lexed, parsed, and is ready to match input.
///
/// Building one is the expensive step; matching against it is not.
/// The element tree holds no interior mutability, so a `CompiledGrammar`
/// is `Send + Sync` and safe to share across threads (e.g. behind an
/// `Arc`) for concurrent, independent matches.
pub struct CompiledGrammar {
    root: Element,
    tokenizer: Box<dyn Tokenizer>,
}

impl CompiledGrammar {
    /// Tokenizes `input` with this grammar's tokenizer and matches it
    /// against the compiled tree.
    ///
    /// When `match_entirety` is true, the match must consume every
    /// token; a match that succeeds but leaves trailing tokens is
    /// reported as a failure (`None`). When `debug` is true, every
    /// lex/match step is emitted as a `tracing` event under the
    /// `tokex` target for the duration of this call.
    pub fn match_str(&self, input: &str, match_entirety: bool, debug: bool) -> Option<Value> {
        let span = debug.then(|| tracing::debug_span!(target: "tokex", "match_str", input));
        let _entered = span.as_ref().map(|s| s.enter());

        let tokens = self.tokenizer.tokenize(input);
        let (matched, next_idx, captured) = matcher::apply(&self.root, &tokens, 0);

        if !matched {
            return None;
        }
        if match_entirety && next_idx != Some(tokens.len()) {
            return None;
        }
        captured
    }
}

/// Lexes and parses `grammar`, returning a [`CompiledGrammar`] ready to
/// match input tokenized by `tokenizer`.
///
/// `allow_sub_grammar_definitions` gates whether `def name { ... }`
/// may appear at all; `default_flags` are applied to every element
/// whose flag group (`{s,i}` / `{q,u}`) is left unset, per
/// [`flags::resolve_effective`].
pub fn compile(
    grammar: &str,
    allow_sub_grammar_definitions: bool,
    tokenizer: Box<dyn Tokenizer>,
    default_flags: FlagSet,
) -> Result<CompiledGrammar, Error> {
    tracing::trace!(target: "tokex", "lexing grammar");
    let tokens = lexer::lex(grammar)?;

    tracing::trace!(target: "tokex", "parsing grammar");
    let root = parser::parse(tokens, allow_sub_grammar_definitions, &default_flags, grammar)?;

    Ok(CompiledGrammar { root, tokenizer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::DefaultTokenizer;

    #[test]
    fn compiles_and_matches_a_simple_grammar() {
        let grammar = compile("'a' '.'", true, Box::new(DefaultTokenizer::default()), flags::default_flags()).unwrap();
        assert!(grammar.match_str("a .", true, false).is_some());
        assert!(grammar.match_str("a", true, false).is_none());
    }

    #[test]
    fn propagates_compile_errors() {
        let err = compile("@@@", true, Box::new(DefaultTokenizer::default()), flags::default_flags()).unwrap_err();
        assert!(matches!(err, Error::UnknownGrammarToken { .. }));
    }

    #[test]
    fn idempotent_compile_produces_structurally_equal_trees() {
        let tokenizer = || Box::new(DefaultTokenizer::default());
        let a = compile("<x:'a'> *(xs: .)", true, tokenizer(), flags::default_flags()).unwrap();
        let b = compile("<x:'a'> *(xs: .)", true, tokenizer(), flags::default_flags()).unwrap();
        assert_eq!(a.root, b.root);
    }
}
