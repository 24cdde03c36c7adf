use once_cell::sync::Lazy;
use regex::Regex;

use crate::tokenizer::{combined, findall, Tokenizer};

static REGEX: Lazy<Regex> = Lazy::new(|| combined(&[r#""[^"]*""#, r"'[^']*'", r"\S+"]));

/// Keeps quoted runs intact but otherwise splits on any run of
/// non-whitespace, so numbers, decimals, and punctuation-glued tokens
/// stay joined instead of being shredded by the default tokenizer.
pub struct NumericTokenizer;

impl Default for NumericTokenizer {
    fn default() -> Self {
        NumericTokenizer
    }
}

impl Tokenizer for NumericTokenizer {
    fn tokenize(&self, input: &str) -> Vec<String> {
        findall(&REGEX, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_bare_runs_whole() {
        let tokens = NumericTokenizer.tokenize("3.14 'x' -5");
        assert_eq!(tokens, vec!["3.14", "'x'", "-5"]);
    }
}
