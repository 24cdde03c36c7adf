use once_cell::sync::Lazy;
use regex::Regex;

use crate::tokenizer::{combined, findall, Tokenizer};

static REGEX: Lazy<Regex> = Lazy::new(|| {
    combined(&[r#""[^"]*""#, r"'[^']*'", r"\w+", "!=", "<=", ">=", "==", r"\S"])
});

/// Tokenizes SQL queries: quoted strings and `\w+` runs stay intact,
/// and multi-character operators (`!=`, `<=`, `>=`, `==`) are kept
/// whole instead of splitting into single characters.
pub struct SqlTokenizer;

impl Default for SqlTokenizer {
    fn default() -> Self {
        SqlTokenizer
    }
}

impl Tokenizer for SqlTokenizer {
    fn tokenize(&self, input: &str) -> Vec<String> {
        findall(&REGEX, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_operators_and_identifiers_whole() {
        let tokens = SqlTokenizer.tokenize("SELECT * FROM t WHERE a != 'b'");
        assert_eq!(tokens, vec!["SELECT", "*", "FROM", "t", "WHERE", "a", "!=", "'b'"]);
    }

    #[test]
    fn splits_unmatched_punctuation_into_single_characters() {
        let tokens = SqlTokenizer.tokenize("a <= b, c >= d");
        assert_eq!(tokens, vec!["a", "<=", "b", ",", "c", ">=", "d"]);
    }
}
