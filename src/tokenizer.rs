//! Pluggable input tokenization: turns a raw input string into the
//! token sequence the match engine walks.

use once_cell::sync::Lazy;
use regex::Regex;

/// Something that can split an input string into tokens for matching.
///
/// Implementors own their splitting rules entirely; Tokex only ever
/// calls `tokenize` and works with the resulting `Vec<String>`.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, input: &str) -> Vec<String>;
}

pub(crate) fn findall(pattern: &Regex, input: &str) -> Vec<String> {
    pattern.find_iter(input).map(|m| m.as_str().to_string()).collect()
}

pub(crate) fn combined(regexes: &[&str]) -> Regex {
    let pattern = regexes.join("|");
    Regex::new(&pattern).expect("tokenizer pattern is a compile-time constant")
}

/// The default whitespace/quote/punctuation tokenizer: quoted strings
/// stay whole, runs of word characters stay whole, and runs of
/// contiguous punctuation are grouped together.
pub struct DefaultTokenizer {
    regex: Regex,
    tokenize_newlines: bool,
    ignore_empty_lines: bool,
}

impl Default for DefaultTokenizer {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl DefaultTokenizer {
    const REGEXES: [&'static str; 4] = [r#""[^"]*""#, r"'[^']*'", r"\b\w+\b", r"[^A-Za-z0-9_\s]+"];

    pub fn new(tokenize_newlines: bool, ignore_empty_lines: bool) -> Self {
        let regex = if tokenize_newlines {
            combined(&[Self::REGEXES[0], Self::REGEXES[1], Self::REGEXES[2], Self::REGEXES[3], "\n"])
        } else {
            static DEFAULT: Lazy<Regex> = Lazy::new(|| combined(&DefaultTokenizer::REGEXES));
            DEFAULT.clone()
        };
        Self { regex, tokenize_newlines, ignore_empty_lines }
    }
}

impl Tokenizer for DefaultTokenizer {
    fn tokenize(&self, input: &str) -> Vec<String> {
        let mut tokens = findall(&self.regex, input);
        if self.tokenize_newlines && self.ignore_empty_lines {
            strip_consecutive_newlines(&mut tokens);
        }
        tokens
    }
}

/// Drops a `"\n"` token whenever it directly follows another `"\n"`
/// (or opens the stream), collapsing runs of blank lines to one.
fn strip_consecutive_newlines(tokens: &mut Vec<String>) {
    let mut idx = tokens.len();
    while idx > 0 {
        idx -= 1;
        let is_blank_newline = tokens[idx] == "\n" && (idx == 0 || tokens[idx - 1] == "\n");
        if is_blank_newline {
            tokens.remove(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tokenizer_splits_quotes_words_and_punctuation() {
        let tokens = DefaultTokenizer::default().tokenize(r#"SELECT "a b" FROM t;"#);
        assert_eq!(tokens, vec!["SELECT", "\"a b\"", "FROM", "t", ";"]);
    }

    #[test]
    fn default_tokenizer_can_ignore_blank_lines() {
        let tokenizer = DefaultTokenizer::new(true, true);
        let tokens = tokenizer.tokenize("a\n\n\nb");
        assert_eq!(tokens, vec!["a", "\n", "b"]);
    }
}
