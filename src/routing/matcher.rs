//! Route matching logic.
//!
//! # Responsibilities
//! - Resolve any raw location to a [`Route`] against the current table
//! - Carry required params over on named navigations
//! - Follow redirect chains and alias records recursively
//! - Extend the table at runtime
//!
//! # Design Decisions
//! - The table sits behind `ArcSwap`: lookups load a snapshot, `add_routes`
//!   publishes an extended clone, readers never block
//! - Unresolvable targets produce an empty Route, never an error
//! - Redirect cycles are not detected; a cyclic configuration recurses
//!   until the stack is exhausted

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::schema::{Redirect, RouteConfig};
use crate::navigation::components::ComponentRegistry;
use crate::observability::metrics;
use crate::routing::error::{RouteConfigError, TableWarning};
use crate::routing::location::{normalize_location, Location, RawLocation};
use crate::routing::path::resolve_path;
use crate::routing::pattern::{PathPattern, PatternOptions};
use crate::routing::query::QueryCodec;
use crate::routing::record::RouteRecord;
use crate::routing::route::{build_route, create_route, Route};
use crate::routing::table::RouteTable;
use crate::routing::Params;

/// Resolves locations against a growable route table.
pub struct Matcher {
    table: ArcSwap<RouteTable>,
    registry: ComponentRegistry,
    codec: Arc<dyn QueryCodec>,
    /// Compiled templates used for filling redirect and alias targets.
    fill_cache: DashMap<String, Arc<PathPattern>>,
    metrics_enabled: bool,
}

impl Matcher {
    pub fn new(
        routes: &[RouteConfig],
        registry: ComponentRegistry,
        codec: Arc<dyn QueryCodec>,
    ) -> Result<(Self, Vec<TableWarning>), RouteConfigError> {
        let (table, warnings) = RouteTable::build(routes, &registry)?;
        tracing::debug!(paths = table.len(), warnings = warnings.len(), "Route table built");
        let matcher = Self {
            table: ArcSwap::from_pointee(table),
            registry,
            codec,
            fill_cache: DashMap::new(),
            metrics_enabled: true,
        };
        matcher.record_table_size();
        Ok((matcher, warnings))
    }

    /// Toggle metric recording.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Current table snapshot.
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    pub fn codec(&self) -> &dyn QueryCodec {
        self.codec.as_ref()
    }

    /// Append routes; the live table is untouched if compilation fails.
    pub fn add_routes(&self, routes: &[RouteConfig]) -> Result<Vec<TableWarning>, RouteConfigError> {
        let mut outcome = Ok(Vec::new());
        self.table.rcu(|current| {
            let mut next = RouteTable::clone(current);
            match next.extend(routes, &self.registry) {
                Ok(warnings) => {
                    outcome = Ok(warnings);
                    Arc::new(next)
                }
                Err(e) => {
                    outcome = Err(e);
                    Arc::clone(current)
                }
            }
        });
        if outcome.is_ok() {
            self.record_table_size();
        }
        outcome
    }

    /// Resolve `raw` relative to `current`.
    pub fn match_location(
        &self,
        raw: impl Into<RawLocation>,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
    ) -> Arc<Route> {
        let route = self.resolve(raw.into(), current, redirected_from);
        if self.metrics_enabled {
            metrics::record_match(route.is_matched());
        }
        route
    }

    fn resolve(
        &self,
        raw: RawLocation,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
    ) -> Arc<Route> {
        let table = self.table.load_full();
        let mut location = normalize_location(raw, current, false, self.codec());

        if let Some(name) = location.name.clone() {
            let Some(record) = table.by_name(&name).cloned() else {
                tracing::warn!(name = %name, "Route with name does not exist");
                return self.no_match(&table, &location);
            };

            let params = location.params.get_or_insert_with(Params::new);
            if let Some(current) = current {
                let required = record.pattern.required_names();
                for (key, value) in &current.params {
                    if !params.contains_key(key) && required.contains(key) {
                        params.insert(key.clone(), value.clone());
                    }
                }
            }
            location.path = Some(self.fill_pattern(&record.pattern, params, &name));
            return self.resolve_record(&table, &record, location, redirected_from);
        }

        if let Some(path) = location.path.clone().filter(|p| !p.is_empty()) {
            let mut params = Params::new();
            for candidate in table.path_list() {
                let Some(record) = table.by_path(candidate) else {
                    continue;
                };
                if record.pattern.match_into(&path, &mut params) {
                    let record = Arc::clone(record);
                    location.params = Some(params);
                    return self.resolve_record(&table, &record, location, redirected_from);
                }
            }
            location.params = Some(params);
        }

        self.no_match(&table, &location)
    }

    fn no_match(&self, table: &RouteTable, location: &Location) -> Arc<Route> {
        create_route(None, location, None, table, self.codec())
    }

    fn resolve_record(
        &self,
        table: &RouteTable,
        record: &Arc<RouteRecord>,
        location: Location,
        redirected_from: Option<&Location>,
    ) -> Arc<Route> {
        if let Some(redirect) = &record.redirect {
            return self.redirect(table, record, redirect, redirected_from.unwrap_or(&location));
        }
        if let Some(match_as) = &record.match_as {
            return self.alias(table, record, location, match_as, redirected_from);
        }
        create_route(Some(record), &location, redirected_from, table, self.codec())
    }

    fn redirect(
        &self,
        table: &RouteTable,
        record: &Arc<RouteRecord>,
        redirect: &Redirect,
        location: &Location,
    ) -> Arc<Route> {
        // Targets computed per navigation bypass the fill cache.
        let cacheable = !matches!(redirect, Redirect::Dynamic(_));
        let target = match redirect {
            Redirect::Path(path) => Some(Location::path(path.clone())),
            Redirect::Location(loc) => Some(loc.clone()),
            Redirect::Dynamic(f) => {
                let synthetic = build_route(Some(record), location, None, table, self.codec());
                f(&synthetic).map(|raw| match raw {
                    RawLocation::Path(path) => Location::path(path),
                    RawLocation::Location(loc) => loc,
                })
            }
        };
        let Some(target) = target else {
            tracing::warn!(path = %record.path, "Invalid redirect option");
            return self.no_match(table, location);
        };

        let query = target.query.clone().or_else(|| location.query.clone());
        let hash = target.hash.clone().or_else(|| location.hash.clone());
        let params = target.params.clone().or_else(|| location.params.clone());

        if let Some(name) = target.name {
            if table.by_name(&name).is_none() {
                tracing::warn!(name = %name, "Redirect failed: named route not found");
            }
            let next = Location {
                name: Some(name),
                query,
                hash,
                params,
                ..Location::default()
            }
            .into_normalized();
            return self.resolve(next.into(), None, Some(location));
        }

        if let Some(path) = target.path.filter(|p| !p.is_empty()) {
            let parent_path = record
                .parent
                .and_then(|id| table.record(id))
                .map(|p| p.path.as_str())
                .unwrap_or("/");
            let raw_path = resolve_path(&path, parent_path, true);
            let params = params.unwrap_or_default();
            let filled = if cacheable {
                self.fill_template(&raw_path, &params, &raw_path)
            } else {
                self.fill_uncached(&raw_path, &params)
            };
            let next = Location {
                path: Some(filled),
                query,
                hash,
                ..Location::default()
            }
            .into_normalized();
            return self.resolve(next.into(), None, Some(location));
        }

        tracing::warn!(path = %record.path, "Invalid redirect option");
        self.no_match(table, location)
    }

    fn alias(
        &self,
        table: &RouteTable,
        record: &Arc<RouteRecord>,
        mut location: Location,
        match_as: &str,
        redirected_from: Option<&Location>,
    ) -> Arc<Route> {
        let params = location.params.clone().unwrap_or_default();
        let canonical_path = self.fill_template(match_as, &params, match_as);
        let canonical = self.resolve(
            Location::path(canonical_path).into_normalized().into(),
            None,
            None,
        );
        if !canonical.is_matched() {
            return self.no_match(table, &location);
        }

        location.params = Some(canonical.params.clone());
        location.name = location.name.take().or_else(|| canonical.name.clone());
        let mut route = build_route(Some(record), &location, redirected_from, table, self.codec());
        route.meta = canonical.meta.clone();
        Arc::new(route)
    }

    fn fill_pattern(&self, pattern: &PathPattern, params: &Params, context: &str) -> String {
        pattern.fill(params).unwrap_or_else(|e| {
            tracing::warn!(error = %e, context = %context, "Failed to fill route params");
            String::new()
        })
    }

    /// Fill a template taken from the route table, compiling it once.
    fn fill_template(&self, template: &str, params: &Params, context: &str) -> String {
        let pattern = match self.fill_cache.get(template) {
            Some(cached) => Arc::clone(cached.value()),
            None => match Self::compile_template(template) {
                Some(compiled) => {
                    let compiled = Arc::new(compiled);
                    self.fill_cache.insert(template.to_string(), Arc::clone(&compiled));
                    compiled
                }
                None => return String::new(),
            },
        };
        self.fill_pattern(&pattern, params, context)
    }

    fn fill_uncached(&self, template: &str, params: &Params) -> String {
        match Self::compile_template(template) {
            Some(pattern) => self.fill_pattern(&pattern, params, template),
            None => String::new(),
        }
    }

    fn compile_template(template: &str) -> Option<PathPattern> {
        PathPattern::compile(template, PatternOptions::default())
            .map_err(|e| tracing::warn!(error = %e, template = %template, "Failed to compile path template"))
            .ok()
    }

    fn record_table_size(&self) {
        if self.metrics_enabled {
            metrics::record_routes_registered(self.table.load().len());
        }
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("paths", &self.table.load().path_list())
            .field("codec", &self.codec)
            .finish()
    }
}
