//! Compiled route records.
//!
//! # Responsibilities
//! - Hold one compiled entry per effective path (aliases included)
//! - Own the view-slot → component map and the slot → instance bindings
//! - Resolve the props handed to a view for a given route
//!
//! # Design Decisions
//! - Parent links are [`RecordId`] handles into the owning table, not pointers
//! - Records are shared via `Arc` and never removed; only the component map
//!   (lazy definitions resolved in place) and instance bindings mutate

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use indexmap::IndexMap;
use tokio::sync::Notify;

use crate::config::schema::{PropsConfig, Redirect};
use crate::navigation::components::{ComponentDef, ViewInstance};
use crate::navigation::guard::Guard;
use crate::routing::pattern::PathPattern;
use crate::routing::route::Route;
use crate::routing::Meta;

/// Stable handle of a record inside its route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub usize);

/// A compiled route definition.
pub struct RouteRecord {
    pub id: RecordId,
    /// Compiled (parent-joined) path template.
    pub path: String,
    pub pattern: PathPattern,
    pub name: Option<String>,
    pub parent: Option<RecordId>,
    /// Canonical template when this record is an alias.
    pub match_as: Option<String>,
    pub redirect: Option<Redirect>,
    pub before_enter: Option<Guard>,
    pub meta: Meta,
    pub props: IndexMap<String, PropsConfig>,
    components: RwLock<IndexMap<String, ComponentDef>>,
    instances: DashMap<String, ViewInstance>,
    registered: Notify,
}

/// Everything needed to construct a [`RouteRecord`].
pub(crate) struct RecordParts {
    pub id: RecordId,
    pub path: String,
    pub pattern: PathPattern,
    pub name: Option<String>,
    pub parent: Option<RecordId>,
    pub match_as: Option<String>,
    pub redirect: Option<Redirect>,
    pub before_enter: Option<Guard>,
    pub meta: Meta,
    pub props: IndexMap<String, PropsConfig>,
    pub components: IndexMap<String, ComponentDef>,
}

impl RouteRecord {
    pub(crate) fn new(parts: RecordParts) -> Self {
        Self {
            id: parts.id,
            path: parts.path,
            pattern: parts.pattern,
            name: parts.name,
            parent: parts.parent,
            match_as: parts.match_as,
            redirect: parts.redirect,
            before_enter: parts.before_enter,
            meta: parts.meta,
            props: parts.props,
            components: RwLock::new(parts.components),
            instances: DashMap::new(),
            registered: Notify::new(),
        }
    }

    pub fn is_alias(&self) -> bool {
        self.match_as.is_some()
    }

    /// Snapshot of the view-slot → component map.
    pub fn components(&self) -> Vec<(String, ComponentDef)> {
        self.components
            .read()
            .expect("component map poisoned")
            .iter()
            .map(|(slot, def)| (slot.clone(), def.clone()))
            .collect()
    }

    pub fn component(&self, slot: &str) -> Option<ComponentDef> {
        self.components
            .read()
            .expect("component map poisoned")
            .get(slot)
            .cloned()
    }

    /// Replace the definition bound to `slot` (used once a lazy one resolves).
    pub fn set_component(&self, slot: &str, def: ComponentDef) {
        self.components
            .write()
            .expect("component map poisoned")
            .insert(slot.to_string(), def);
    }

    /// Instance currently rendered in `slot`, if the view layer registered one.
    pub fn instance(&self, slot: &str) -> Option<ViewInstance> {
        self.instances.get(slot).map(|entry| entry.value().clone())
    }

    /// Called by the view layer once a component instance exists for `slot`.
    pub fn register_instance(&self, slot: impl Into<String>, instance: ViewInstance) {
        let slot = slot.into();
        tracing::trace!(path = %self.path, slot = %slot, "View instance registered");
        self.instances.insert(slot, instance);
        self.registered.notify_waiters();
    }

    /// Called by the view layer when the instance in `slot` is torn down.
    pub fn unregister_instance(&self, slot: &str) -> Option<ViewInstance> {
        self.instances.remove(slot).map(|(_, instance)| instance)
    }

    /// Wake-up source for waiters on instance registration.
    pub(crate) fn registrations(&self) -> &Notify {
        &self.registered
    }

    /// Props handed to the view in `slot` when `route` is rendered.
    pub fn resolve_props(&self, slot: &str, route: &Route) -> Meta {
        match self.props.get(slot) {
            None | Some(PropsConfig::Off) => Meta::new(),
            Some(PropsConfig::Params) => route
                .params
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
            Some(PropsConfig::Static(props)) => props.clone(),
            Some(PropsConfig::Dynamic(f)) => f(route),
        }
    }
}

impl std::fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRecord")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("match_as", &self.match_as)
            .field("redirect", &self.redirect)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::pattern::PatternOptions;

    fn record(props: IndexMap<String, PropsConfig>) -> RouteRecord {
        RouteRecord::new(RecordParts {
            id: RecordId(0),
            path: "/hello/:name".into(),
            pattern: PathPattern::compile("/hello/:name", PatternOptions::default()).unwrap(),
            name: None,
            parent: None,
            match_as: None,
            redirect: None,
            before_enter: None,
            meta: Meta::new(),
            props,
            components: IndexMap::new(),
        })
    }

    #[test]
    fn test_instance_registration() {
        let rec = record(IndexMap::new());
        assert!(rec.instance("default").is_none());
        rec.register_instance("default", Arc::new(5u32));
        let inst = rec.instance("default").unwrap();
        assert_eq!(inst.downcast_ref::<u32>(), Some(&5));
        assert!(rec.unregister_instance("default").is_some());
        assert!(rec.instance("default").is_none());
    }

    #[test]
    fn test_resolve_props() {
        let mut props = IndexMap::new();
        props.insert("default".to_string(), PropsConfig::Params);
        let mut fixed = Meta::new();
        fixed.insert("name".into(), "world".into());
        props.insert("side".to_string(), PropsConfig::Static(fixed.clone()));
        let rec = record(props);

        let mut route = Route::empty("/hello/you");
        route.params.insert("name".into(), "you".into());

        let resolved = rec.resolve_props("default", &route);
        assert_eq!(resolved.get("name"), Some(&serde_json::Value::String("you".into())));
        assert_eq!(rec.resolve_props("side", &route), fixed);
        assert!(rec.resolve_props("missing", &route).is_empty());
    }
}
