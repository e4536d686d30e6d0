//! The resolved destination of a navigation.
//!
//! A [`Route`] is built once by the matcher and shared as `Arc<Route>`;
//! nothing mutates it afterwards.

use std::ptr;
use std::sync::{Arc, LazyLock};

use serde::Serialize;

use crate::routing::location::Location;
use crate::routing::query::{query_equal, Query, QueryCodec};
use crate::routing::record::RouteRecord;
use crate::routing::table::RouteTable;
use crate::routing::{Meta, Params};

/// Initial route before any navigation committed ("nowhere").
pub static START: LazyLock<Arc<Route>> = LazyLock::new(|| Arc::new(Route::empty("/")));

/// Immutable resolved route.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: Option<String>,
    pub meta: Meta,
    pub path: String,
    pub hash: String,
    pub query: Query,
    pub params: Params,
    /// `path` + serialized query + `hash`.
    pub full_path: String,
    /// Root-first chain of matched records; empty when nothing matched.
    pub matched: Vec<Arc<RouteRecord>>,
    /// Full path of the first location of a redirect chain.
    pub redirected_from: Option<String>,
}

impl Route {
    /// A route with no match chain at `path`.
    pub fn empty(path: &str) -> Self {
        Self {
            name: None,
            meta: Meta::new(),
            path: path.to_string(),
            hash: String::new(),
            query: Query::new(),
            params: Params::new(),
            full_path: path.to_string(),
            matched: Vec::new(),
            redirected_from: None,
        }
    }

    pub fn is_start(&self) -> bool {
        ptr::eq(self, START.as_ref())
    }

    /// Whether the route resolved to at least one record.
    pub fn is_matched(&self) -> bool {
        !self.matched.is_empty()
    }

    /// Serializable snapshot for display.
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            name: self.name.clone(),
            path: self.path.clone(),
            full_path: self.full_path.clone(),
            hash: self.hash.clone(),
            query: self.query.clone(),
            params: self.params.clone(),
            meta: self.meta.clone(),
            matched: self.matched.iter().map(|r| r.path.clone()).collect(),
            redirected_from: self.redirected_from.clone(),
        }
    }
}

/// Flattened, serializable view of a [`Route`].
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub name: Option<String>,
    pub path: String,
    pub full_path: String,
    pub hash: String,
    pub query: Query,
    pub params: Params,
    pub meta: Meta,
    pub matched: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirected_from: Option<String>,
}

/// Build and freeze a route.
pub fn create_route(
    record: Option<&Arc<RouteRecord>>,
    location: &Location,
    redirected_from: Option<&Location>,
    table: &RouteTable,
    codec: &dyn QueryCodec,
) -> Arc<Route> {
    Arc::new(build_route(record, location, redirected_from, table, codec))
}

pub(crate) fn build_route(
    record: Option<&Arc<RouteRecord>>,
    location: &Location,
    redirected_from: Option<&Location>,
    table: &RouteTable,
    codec: &dyn QueryCodec,
) -> Route {
    let query = location.query.clone().unwrap_or_default();
    let path = location.path.clone().unwrap_or_else(|| "/".to_string());
    let hash = location.hash.clone().unwrap_or_default();
    let full_path = full_path_of(&path, &query, &hash, codec);

    Route {
        name: location
            .name
            .clone()
            .or_else(|| record.and_then(|r| r.name.clone())),
        meta: record.map(|r| r.meta.clone()).unwrap_or_default(),
        path,
        hash,
        query,
        params: location.params.clone().unwrap_or_default(),
        full_path,
        matched: record.map(|r| table.ancestors(r)).unwrap_or_default(),
        redirected_from: redirected_from.map(|from| {
            full_path_of(
                from.path.as_deref().unwrap_or("/"),
                &from.query.clone().unwrap_or_default(),
                from.hash.as_deref().unwrap_or(""),
                codec,
            )
        }),
    }
}

fn full_path_of(path: &str, query: &Query, hash: &str, codec: &dyn QueryCodec) -> String {
    format!("{}{}{}", path, codec.stringify(query), hash)
}

fn strip_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

fn params_equal(a: &Params, b: &Params) -> bool {
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
}

/// Route equality used for duplicate detection.
pub fn is_same_route(a: &Route, b: &Route) -> bool {
    if a.is_start() || b.is_start() {
        return ptr::eq(a, b);
    }
    if !a.path.is_empty() && !b.path.is_empty() {
        return strip_trailing_slash(&a.path) == strip_trailing_slash(&b.path)
            && a.hash == b.hash
            && query_equal(&a.query, &b.query);
    }
    match (&a.name, &b.name) {
        (Some(an), Some(bn)) => {
            an == bn
                && a.hash == b.hash
                && query_equal(&a.query, &b.query)
                && params_equal(&a.params, &b.params)
        }
        _ => false,
    }
}

/// Whether `current` is `target` or nested under it.
pub fn is_included_route(current: &Route, target: &Route) -> bool {
    let with_slash = |p: &str| format!("{}/", strip_trailing_slash(p));
    with_slash(&current.path).starts_with(&with_slash(&target.path))
        && (target.hash.is_empty() || current.hash == target.hash)
        && target.query.keys().all(|k| current.query.contains_key(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str) -> Route {
        Route::empty(path)
    }

    #[test]
    fn test_start_identity() {
        assert!(is_same_route(&START, &START));
        assert!(!is_same_route(&route("/"), &START));
        assert!(!is_same_route(&START, &route("/")));
    }

    #[test]
    fn test_trailing_slash_ignored() {
        assert!(is_same_route(&route("/a/"), &route("/a")));
        assert!(!is_same_route(&route("/a"), &route("/b")));
    }

    #[test]
    fn test_query_and_hash_compared() {
        let mut a = route("/a");
        let mut b = route("/a");
        a.query.insert("x".into(), "1".into());
        assert!(!is_same_route(&a, &b));
        b.query.insert("x".into(), "1".into());
        assert!(is_same_route(&a, &b));
        b.hash = "#top".into();
        assert!(!is_same_route(&a, &b));
    }

    #[test]
    fn test_named_comparison_uses_params() {
        let mut a = route("");
        let mut b = route("");
        a.name = Some("user".into());
        b.name = Some("user".into());
        a.params.insert("id".into(), "1".into());
        b.params.insert("id".into(), "1".into());
        assert!(is_same_route(&a, &b));
        b.params.insert("id".into(), "2".into());
        assert!(!is_same_route(&a, &b));
    }

    #[test]
    fn test_included_route() {
        let mut current = route("/users/7/profile");
        current.query.insert("tab".into(), "a".into());
        assert!(is_included_route(&current, &route("/users/7")));
        assert!(is_included_route(&current, &route("/users/7/")));
        assert!(!is_included_route(&current, &route("/users/70")));

        let mut target = route("/users");
        target.query.insert("tab".into(), "b".into());
        assert!(is_included_route(&current, &target));
        target.query.insert("other".into(), "x".into());
        assert!(!is_included_route(&current, &target));
    }
}
