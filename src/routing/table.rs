//! Route table compilation.
//!
//! # Responsibilities
//! - Flatten a nested route configuration into records
//! - Maintain the ordered path list, the path map and the name map
//! - Report duplicate definitions without failing the build
//!
//! # Design Decisions
//! - Depth-first: children are registered before their parent's path,
//!   then aliases, then the name
//! - First writer wins for paths and names
//! - Wildcard (`*`) paths are moved to the tail after every build
//! - Extending a table is append-only; records keep their ids

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::schema::{ComponentRef, RouteConfig};
use crate::navigation::components::{ComponentDef, ComponentRegistry};
use crate::routing::error::{RouteConfigError, TableWarning};
use crate::routing::path::clean_path;
use crate::routing::pattern::PathPattern;
use crate::routing::record::{RecordId, RecordParts, RouteRecord};

/// Compiled lookup structures for a route configuration.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    records: Vec<Arc<RouteRecord>>,
    path_list: Vec<String>,
    path_map: HashMap<String, RecordId>,
    name_map: HashMap<String, RecordId>,
}

impl RouteTable {
    /// Compile `routes` into a fresh table.
    pub fn build(
        routes: &[RouteConfig],
        registry: &ComponentRegistry,
    ) -> Result<(Self, Vec<TableWarning>), RouteConfigError> {
        let mut table = Self::default();
        let warnings = table.extend(routes, registry)?;
        Ok((table, warnings))
    }

    /// Append `routes` to this table.
    ///
    /// On error the table may hold part of the new routes; callers that need
    /// atomicity extend a clone.
    pub fn extend(
        &mut self,
        routes: &[RouteConfig],
        registry: &ComponentRegistry,
    ) -> Result<Vec<TableWarning>, RouteConfigError> {
        let mut warnings = Vec::new();
        let first_new = self.path_list.len();
        for (i, route) in routes.iter().enumerate() {
            self.add_route_record(route, None, None, &format!("routes[{}]", i), registry, &mut warnings)?;
        }

        for path in &self.path_list[first_new..] {
            if !path.is_empty() && !path.starts_with('*') && !path.starts_with('/') {
                warnings.push(TableWarning::MissingLeadingSlash { path: path.clone() });
            }
        }

        // Stable partition: wildcards lose every tie.
        let (mut specific, wildcards): (Vec<String>, Vec<String>) =
            self.path_list.drain(..).partition(|p| p != "*");
        specific.extend(wildcards);
        self.path_list = specific;

        for warning in &warnings {
            tracing::warn!(warning = %warning, "Route table warning");
        }
        Ok(warnings)
    }

    pub fn record(&self, id: RecordId) -> Option<&Arc<RouteRecord>> {
        self.records.get(id.0)
    }

    pub fn by_path(&self, path: &str) -> Option<&Arc<RouteRecord>> {
        self.path_map.get(path).and_then(|id| self.record(*id))
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<RouteRecord>> {
        self.name_map.get(name).and_then(|id| self.record(*id))
    }

    /// Paths in match priority order.
    pub fn path_list(&self) -> &[String] {
        &self.path_list
    }

    /// Every record ever compiled, shadowed duplicates included.
    pub fn records(&self) -> &[Arc<RouteRecord>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.path_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path_list.is_empty()
    }

    /// Root-first chain ending at `record`.
    pub fn ancestors(&self, record: &Arc<RouteRecord>) -> Vec<Arc<RouteRecord>> {
        let mut chain = vec![Arc::clone(record)];
        let mut parent = record.parent;
        while let Some(id) = parent {
            match self.record(id) {
                Some(p) => {
                    parent = p.parent;
                    chain.push(Arc::clone(p));
                }
                None => break,
            }
        }
        chain.reverse();
        chain
    }

    fn add_route_record(
        &mut self,
        route: &RouteConfig,
        parent: Option<RecordId>,
        match_as: Option<String>,
        at: &str,
        registry: &ComponentRegistry,
        warnings: &mut Vec<TableWarning>,
    ) -> Result<(), RouteConfigError> {
        let raw_path = route
            .path
            .as_deref()
            .ok_or_else(|| RouteConfigError::MissingPath { at: at.to_string() })?;

        let mut options = route.path_options;
        if let Some(sensitive) = route.case_sensitive {
            options.sensitive = sensitive;
        }

        let parent_path = parent.and_then(|id| self.record(id)).map(|p| p.path.clone());
        let path = normalize_path(raw_path, parent_path.as_deref(), options.strict);
        let pattern = PathPattern::compile(&path, options).map_err(|e| RouteConfigError::InvalidPattern {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let mut seen = Vec::new();
        for key in pattern.keys() {
            let key = key.name.param_key();
            if seen.contains(&key) {
                warnings.push(TableWarning::DuplicateParamKey {
                    path: path.clone(),
                    key,
                });
            } else {
                seen.push(key);
            }
        }

        let components = resolve_components(route, &path, registry)?;
        let id = RecordId(self.records.len());
        let record = Arc::new(RouteRecord::new(RecordParts {
            id,
            path: path.clone(),
            pattern,
            name: route.name.clone(),
            parent,
            match_as: match_as.clone(),
            redirect: route.redirect.clone(),
            before_enter: route.before_enter.clone(),
            meta: route.meta.clone(),
            props: route.props_by_slot(),
            components,
        }));
        self.records.push(Arc::clone(&record));

        if !route.children.is_empty() {
            if let Some(name) = &route.name {
                let has_default_child = route.children.iter().any(|c| {
                    matches!(c.path.as_deref(), Some("") | Some("/"))
                });
                if route.redirect.is_none() && has_default_child {
                    warnings.push(TableWarning::NamedRouteWithDefaultChild { name: name.clone() });
                }
            }
            for (i, child) in route.children.iter().enumerate() {
                let child_match_as = match_as
                    .as_ref()
                    .map(|m| clean_path(&format!("{}/{}", m, child.path.as_deref().unwrap_or(""))));
                self.add_route_record(
                    child,
                    Some(id),
                    child_match_as,
                    &format!("{}.children[{}]", at, i),
                    registry,
                    warnings,
                )?;
            }
        }

        if self.path_map.contains_key(&path) {
            warnings.push(TableWarning::DuplicatePath { path: path.clone() });
        } else {
            self.path_list.push(path.clone());
            self.path_map.insert(path.clone(), id);
        }

        for (i, alias) in route.alias.iter().enumerate() {
            if alias == raw_path {
                warnings.push(TableWarning::AliasEqualsPath { path: raw_path.to_string() });
                continue;
            }
            let alias_route = RouteConfig {
                path: Some(alias.clone()),
                children: route.children.clone(),
                component: route.component.clone(),
                components: route.components.clone(),
                before_enter: route.before_enter.clone(),
                meta: route.meta.clone(),
                props: route.props.clone(),
                view_props: route.view_props.clone(),
                case_sensitive: route.case_sensitive,
                path_options: route.path_options,
                ..RouteConfig::default()
            };
            let canonical = if path.is_empty() { "/".to_string() } else { path.clone() };
            self.add_route_record(
                &alias_route,
                parent,
                Some(canonical),
                &format!("{}.alias[{}]", at, i),
                registry,
                warnings,
            )?;
        }

        if let Some(name) = &route.name {
            if !self.name_map.contains_key(name) {
                self.name_map.insert(name.clone(), id);
            } else if match_as.is_none() {
                warnings.push(TableWarning::DuplicateName {
                    name: name.clone(),
                    path: path.clone(),
                });
            }
        }

        tracing::trace!(path = %record.path, id = id.0, alias = record.is_alias(), "Route record compiled");
        Ok(())
    }
}

fn normalize_path(path: &str, parent: Option<&str>, strict: bool) -> String {
    let path = if strict {
        path
    } else {
        path.strip_suffix('/').unwrap_or(path)
    };
    if path.starts_with('/') {
        return path.to_string();
    }
    match parent {
        None => path.to_string(),
        Some(parent) => clean_path(&format!("{}/{}", parent, path)),
    }
}

fn resolve_components(
    route: &RouteConfig,
    path: &str,
    registry: &ComponentRegistry,
) -> Result<IndexMap<String, ComponentDef>, RouteConfigError> {
    let resolve = |reference: &ComponentRef| match reference {
        ComponentRef::Defined(def) => Ok(def.clone()),
        ComponentRef::Named(name) => registry.get(name).ok_or_else(|| RouteConfigError::UnknownComponent {
            path: path.to_string(),
            name: name.clone(),
        }),
    };

    let mut out = IndexMap::new();
    if let Some(default) = &route.component {
        out.insert("default".to_string(), resolve(default)?);
    }
    for (slot, reference) in &route.components {
        out.insert(slot.clone(), resolve(reference)?);
    }
    Ok(out)
}
