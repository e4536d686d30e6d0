//! Query string parsing and serialization.
//!
//! # Design Decisions
//! - Keys keep insertion order, so `fullPath` is stable across runs
//! - A key without `=` is kept as a null value
//! - Repeated keys collapse into a list value
//! - The codec is pluggable through [`QueryCodec`]

use indexmap::map::Entry;
use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::routing::pattern::decode_component;

/// `encodeURIComponent` plus `!'()*`, with commas left readable.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',');

/// A single query value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(Option<String>),
    Many(Vec<Option<String>>),
}

impl QueryValue {
    /// First non-null string, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::One(v) => v.as_deref(),
            QueryValue::Many(vs) => vs.iter().flatten().next().map(String::as_str),
        }
    }

    /// Compare with scalar stringification (`null` equals itself only).
    pub fn loose_eq(&self, other: &QueryValue) -> bool {
        match (self, other) {
            (QueryValue::One(a), QueryValue::One(b)) => a == b,
            (QueryValue::Many(a), QueryValue::Many(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::One(Some(value.to_string()))
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::One(Some(value))
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::Many(values.into_iter().map(Some).collect())
    }
}

/// Query mapping with unique keys.
pub type Query = IndexMap<String, QueryValue>;

/// Pluggable query parser / stringifier.
pub trait QueryCodec: Send + Sync + std::fmt::Debug {
    fn parse(&self, raw: &str) -> Query;
    fn stringify(&self, query: &Query) -> String;
}

/// Default codec mirroring browser URL conventions.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultQueryCodec;

impl QueryCodec for DefaultQueryCodec {
    fn parse(&self, raw: &str) -> Query {
        parse_query(raw)
    }

    fn stringify(&self, query: &Query) -> String {
        stringify_query(query)
    }
}

/// Parse a raw query string.
pub fn parse_query(raw: &str) -> Query {
    let mut res = Query::new();
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(|c: char| matches!(c, '?' | '#' | '&'))
        .unwrap_or(trimmed);
    if trimmed.is_empty() {
        return res;
    }

    for param in trimmed.split('&') {
        let param = param.replace('+', " ");
        let (key, value) = match param.split_once('=') {
            Some((k, v)) => (decode_component(k), Some(decode_component(v))),
            None => (decode_component(&param), None),
        };
        match res.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(QueryValue::One(value));
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                match existing {
                    QueryValue::Many(values) => values.push(value),
                    QueryValue::One(first) => {
                        let first = first.take();
                        *existing = QueryValue::Many(vec![first, value]);
                    }
                }
            }
        }
    }
    res
}

/// Serialize a query mapping; empty mappings produce an empty string.
pub fn stringify_query(query: &Query) -> String {
    let parts: Vec<String> = query
        .iter()
        .map(|(key, value)| match value {
            QueryValue::One(None) => encode(key),
            QueryValue::One(Some(v)) => format!("{}={}", encode(key), encode(v)),
            QueryValue::Many(values) => values
                .iter()
                .map(|v| match v {
                    None => encode(key),
                    Some(v) => format!("{}={}", encode(key), encode(v)),
                })
                .collect::<Vec<_>>()
                .join("&"),
        })
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

/// Parse `raw` and overlay `extra`; explicit keys win.
pub fn resolve_query(raw: &str, extra: Option<&Query>, codec: &dyn QueryCodec) -> Query {
    let mut parsed = codec.parse(raw);
    if let Some(extra) = extra {
        for (key, value) in extra {
            parsed.insert(key.clone(), value.clone());
        }
    }
    parsed
}

/// Deep equality where scalar values compare as strings.
pub fn query_equal(a: &Query, b: &Query) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| value.loose_eq(other)))
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let q = parse_query("?a=1&b=two+words&a=3&flag");
        assert_eq!(
            q.get("a"),
            Some(&QueryValue::Many(vec![Some("1".into()), Some("3".into())]))
        );
        assert_eq!(q.get("b").and_then(|v| v.as_str()), Some("two words"));
        assert_eq!(q.get("flag"), Some(&QueryValue::One(None)));
    }

    #[test]
    fn test_stringify_query() {
        let mut q = Query::new();
        q.insert("q".into(), "a b".into());
        q.insert("tags".into(), vec!["x".to_string(), "y,z".to_string()].into());
        q.insert("flag".into(), QueryValue::One(None));
        assert_eq!(stringify_query(&q), "?q=a%20b&tags=x&tags=y,z&flag");
        assert_eq!(stringify_query(&Query::new()), "");
    }

    #[test]
    fn test_resolve_query_explicit_wins() {
        let mut extra = Query::new();
        extra.insert("a".into(), "override".into());
        let q = resolve_query("a=1&b=2", Some(&extra), &DefaultQueryCodec);
        assert_eq!(q.get("a").and_then(|v| v.as_str()), Some("override"));
        assert_eq!(q.get("b").and_then(|v| v.as_str()), Some("2"));
    }

    #[test]
    fn test_query_equal_ignores_order() {
        let a = parse_query("x=1&y=2");
        let b = parse_query("y=2&x=1");
        assert!(query_equal(&a, &b));
        assert!(!query_equal(&a, &parse_query("x=1")));
    }
}
