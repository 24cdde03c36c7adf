//! The capture value tree a successful match produces.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A captured value: either nothing, a raw token, a named mapping, or
/// an ordered list (one entry per repetition iteration).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Null,
    Str(String),
    Map(BTreeMap<String, Value>),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrows the inner map, if this is a `Map`.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Borrows the inner list, if this is a `List`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Borrows the inner string, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Wraps this value under a single key, unless the key is absent
    /// (the root grammar's unnamed case), in which case the value is
    /// returned unchanged.
    pub fn named(name: Option<&str>, inner: Value) -> Value {
        match name {
            Some(name) => {
                let mut map = BTreeMap::new();
                map.insert(name.to_string(), inner);
                Value::Map(map)
            }
            None => inner,
        }
    }
}

/// Merges `other`'s entries into `base`, left-to-right overwrite on
/// key collision (later wins), as specified for `Grammar` children.
pub fn merge_into(base: &mut BTreeMap<String, Value>, other: BTreeMap<String, Value>) {
    for (k, v) in other {
        base.insert(k, v);
    }
}
