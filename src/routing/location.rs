//! Navigation targets and their normalization.
//!
//! # Responsibilities
//! - Represent a raw target (bare string or structured descriptor)
//! - Normalize it against the current route into a canonical [`Location`]
//!
//! # Design Decisions
//! - Normalization is idempotent: a normalized location is returned as-is
//! - Named targets are copied and left for the matcher to resolve
//! - Relative-params targets reuse the current route's name or template

use serde::{Deserialize, Serialize};

use crate::routing::path::{parse_path, resolve_path};
use crate::routing::query::{resolve_query, Query, QueryCodec, QueryValue};
use crate::routing::route::Route;
use crate::routing::Params;

/// A navigation target, normalized or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Location {
    #[serde(skip)]
    pub(crate) normalized: bool,
    pub name: Option<String>,
    pub path: Option<String>,
    pub hash: Option<String>,
    pub query: Option<Query>,
    pub params: Option<Params>,
    /// Resolve a relative path as if the current path were a directory.
    pub append: bool,
    /// Replace instead of push when a guard redirects here.
    pub replace: bool,
}

impl Location {
    /// A path target.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// A named target.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A params-only target, relative to the current route.
    pub fn params_only(params: Params) -> Self {
        Self {
            params: Some(params),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query
            .get_or_insert_with(Query::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Mark as already canonical so it is never re-normalized.
    pub(crate) fn into_normalized(mut self) -> Self {
        self.normalized = true;
        self
    }
}

/// A raw navigation target as handed to `push`/`replace`/`match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLocation {
    Path(String),
    Location(Location),
}

impl RawLocation {
    /// Whether this target asks for history replacement.
    pub fn wants_replace(&self) -> bool {
        matches!(self, RawLocation::Location(loc) if loc.replace)
    }
}

impl From<&str> for RawLocation {
    fn from(path: &str) -> Self {
        RawLocation::Path(path.to_string())
    }
}

impl From<String> for RawLocation {
    fn from(path: String) -> Self {
        RawLocation::Path(path)
    }
}

impl From<&String> for RawLocation {
    fn from(path: &String) -> Self {
        RawLocation::Path(path.clone())
    }
}

impl From<Location> for RawLocation {
    fn from(location: Location) -> Self {
        RawLocation::Location(location)
    }
}

impl std::fmt::Display for RawLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawLocation::Path(path) => write!(f, "{}", path),
            RawLocation::Location(loc) => match (&loc.name, &loc.path) {
                (Some(name), _) => write!(f, "{{ name: {} }}", name),
                (None, Some(path)) => write!(f, "{}", path),
                (None, None) => write!(f, "{{ params-only }}"),
            },
        }
    }
}

/// Normalize `raw` against `current`.
pub fn normalize_location(
    raw: RawLocation,
    current: Option<&Route>,
    append: bool,
    codec: &dyn QueryCodec,
) -> Location {
    let next = match raw {
        RawLocation::Path(path) => Location::path(path),
        RawLocation::Location(loc) => loc,
    };

    if next.normalized {
        return next;
    }
    if next.name.is_some() {
        // Clone semantics already give a one-level copy of params.
        return next;
    }

    if next.path.is_none() && next.params.is_some() {
        if let Some(current) = current {
            return relative_params(next, current);
        }
    }

    let parsed = parse_path(next.path.as_deref().unwrap_or(""));
    let base = current.map(|c| c.path.as_str()).unwrap_or("/");
    let path = if parsed.path.is_empty() {
        base.to_string()
    } else {
        resolve_path(&parsed.path, base, append || next.append)
    };

    let query = resolve_query(&parsed.query, next.query.as_ref(), codec);

    let hash = next
        .hash
        .filter(|h| !h.is_empty())
        .unwrap_or(parsed.hash);
    let hash = if hash.is_empty() || hash.starts_with('#') {
        hash
    } else {
        format!("#{}", hash)
    };

    Location {
        normalized: true,
        name: None,
        path: Some(path),
        hash: Some(hash),
        query: Some(query),
        params: None,
        append: false,
        replace: next.replace,
    }
}

fn relative_params(next: Location, current: &Route) -> Location {
    let mut merged = current.params.clone();
    if let Some(params) = &next.params {
        for (k, v) in params {
            merged.insert(k.clone(), v.clone());
        }
    }

    let mut out = next.into_normalized();
    if let Some(name) = &current.name {
        out.name = Some(name.clone());
        out.params = Some(merged);
    } else if let Some(record) = current.matched.last() {
        out.path = Some(match record.pattern.fill(&merged) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, path = %current.path, "Failed to fill relative params");
                String::new()
            }
        });
    } else {
        tracing::warn!("Relative params navigation requires a current route");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::query::DefaultQueryCodec;
    use crate::routing::route::START;

    #[test]
    fn test_string_target_resolves_against_current() {
        let loc = normalize_location("/a?x=1#top".into(), None, false, &DefaultQueryCodec);
        assert!(loc.is_normalized());
        assert_eq!(loc.path.as_deref(), Some("/a"));
        assert_eq!(loc.hash.as_deref(), Some("#top"));
        assert_eq!(
            loc.query.as_ref().and_then(|q| q.get("x")).and_then(|v| v.as_str()),
            Some("1")
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_location("/a".into(), None, false, &DefaultQueryCodec);
        let twice = normalize_location(once.clone().into(), None, false, &DefaultQueryCodec);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_named_target_passes_through() {
        let raw = Location::named("user").with_param("id", "1");
        let loc = normalize_location(raw.clone().into(), None, false, &DefaultQueryCodec);
        assert_eq!(loc, raw);
        assert!(!loc.is_normalized());
    }

    #[test]
    fn test_hash_gets_leading_marker() {
        let raw = Location::path("/a").with_hash("section");
        let loc = normalize_location(raw.into(), None, false, &DefaultQueryCodec);
        assert_eq!(loc.hash.as_deref(), Some("#section"));
    }

    #[test]
    fn test_empty_path_keeps_base() {
        let raw = Location::default().with_query("page", "2");
        let loc = normalize_location(raw.into(), Some(START.as_ref()), false, &DefaultQueryCodec);
        assert_eq!(loc.path.as_deref(), Some("/"));
    }

    #[test]
    fn test_relative_params_without_match_echoes() {
        let mut params = Params::new();
        params.insert("id".into(), "2".into());
        let loc = normalize_location(
            Location::params_only(params.clone()).into(),
            Some(START.as_ref()),
            false,
            &DefaultQueryCodec,
        );
        assert!(loc.is_normalized());
        assert_eq!(loc.path, None);
        assert_eq!(loc.name, None);
        assert_eq!(loc.params, Some(params));
    }
}
