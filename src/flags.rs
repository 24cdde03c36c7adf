//! Flag characters that can prefix a singular grammar token (`.`, `'…'`,
//! `"…"`, `~…~`), and the mutual-exclusion/default rules that govern them.

use std::collections::BTreeSet;
use std::fmt;

/// A single flag character recognised by the grammar lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    /// `!`: negate the match.
    Not,
    /// `q`: match only quoted tokens, and strip the quotes before comparing.
    Quoted,
    /// `u`: match only unquoted tokens.
    Unquoted,
    /// `s`: case-sensitive comparison.
    CaseSensitive,
    /// `i`: case-insensitive comparison (the default).
    CaseInsensitive,
}

impl Flag {
    /// Maps a single character to the flag it denotes, if any.
    pub fn from_char(c: char) -> Option<Flag> {
        match c {
            '!' => Some(Flag::Not),
            'q' => Some(Flag::Quoted),
            'u' => Some(Flag::Unquoted),
            's' => Some(Flag::CaseSensitive),
            'i' => Some(Flag::CaseInsensitive),
            _ => None,
        }
    }

    /// The character this flag is written as in grammar source.
    pub fn as_char(self) -> char {
        match self {
            Flag::Not => '!',
            Flag::Quoted => 'q',
            Flag::Unquoted => 'u',
            Flag::CaseSensitive => 's',
            Flag::CaseInsensitive => 'i',
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// An ordered set of flags. Kept as a `BTreeSet` so rendering
/// (`InvalidGrammarTokenFlags`, etc.) is deterministic.
pub type FlagSet = BTreeSet<Flag>;

/// The two groups of flags that may never both be given explicitly on
/// the same token.
pub const MUTUALLY_EXCLUSIVE_GROUPS: &[[Flag; 2]] = &[
    [Flag::CaseSensitive, Flag::CaseInsensitive],
    [Flag::Quoted, Flag::Unquoted],
];

/// Default flag set applied when a grammar doesn't otherwise specify:
/// case-insensitive comparison.
pub fn default_flags() -> FlagSet {
    let mut set = FlagSet::new();
    set.insert(Flag::CaseInsensitive);
    set
}

/// Returns the other members of `group` that are not `flag`.
fn group_containing(flag: Flag) -> Option<&'static [Flag; 2]> {
    MUTUALLY_EXCLUSIVE_GROUPS.iter().find(|g| g.contains(&flag))
}

/// Returns the set of flags from `explicit` that violate mutual
/// exclusion, i.e. two-or-more members of the same group appearing
/// together. Empty if `explicit` is internally consistent.
pub fn conflicting(explicit: &FlagSet) -> FlagSet {
    let mut conflicts = FlagSet::new();
    for group in MUTUALLY_EXCLUSIVE_GROUPS {
        let present: Vec<Flag> = group.iter().copied().filter(|f| explicit.contains(f)).collect();
        if present.len() > 1 {
            conflicts.extend(present);
        }
    }
    conflicts
}

/// Unions `explicit` with `defaults`, dropping any default flag whose
/// mutually-exclusive counterpart was already given explicitly.
///
/// Mirrors the original implementation's `BaseElement.__init__` default
/// resolution: a default only applies when the whole exclusion group it
/// belongs to is otherwise silent.
pub fn resolve_effective(explicit: &FlagSet, defaults: &FlagSet, valid: &FlagSet) -> FlagSet {
    let mut effective = explicit.clone();

    for &flag in defaults {
        if !valid.contains(&flag) {
            continue;
        }
        match group_containing(flag) {
            Some(group) => {
                let group_set: FlagSet = group.iter().copied().collect();
                if explicit.is_disjoint(&group_set) {
                    effective.insert(flag);
                }
            }
            None => {
                effective.insert(flag);
            }
        }
    }

    effective
}

/// Renders a flag set as its characters joined with `, ` (for error messages).
pub fn render(flags: &FlagSet) -> String {
    flags
        .iter()
        .map(|f| f.as_char().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
