//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! Everything that can be authored as data derives Serde traits; function
//! values (dynamic redirects, computed props, guards, in-process component
//! definitions) are attached through builder methods and skipped by serde.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::navigation::components::ComponentDef;
use crate::navigation::guard::Guard;
use crate::routing::location::{Location, RawLocation};
use crate::routing::pattern::PatternOptions;
use crate::routing::route::Route;
use crate::routing::Meta;

/// Root configuration for a router instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// How the externally visible URL is represented.
    pub mode: HistoryMode,

    /// Prefix of every visible URL (e.g. "/app").
    pub base: String,

    /// Interval between checks while waiting for a view instance, in ms.
    pub enter_poll_interval_ms: u64,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route definitions.
    pub routes: Vec<RouteConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mode: HistoryMode::Abstract,
            base: String::new(),
            enter_poll_interval_ms: 16,
            observability: ObservabilityConfig::default(),
            routes: Vec::new(),
        }
    }
}

impl RouterConfig {
    pub fn new(routes: Vec<RouteConfig>) -> Self {
        Self {
            routes,
            ..Self::default()
        }
    }
}

/// History strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// `base + fullPath`.
    History,
    /// `base + "#" + fullPath`.
    Hash,
    /// In-memory stack, URL is the bare full path.
    #[default]
    Abstract,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Whether navigation and match counters are recorded.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "nav_router=info".to_string(),
            metrics_enabled: true,
        }
    }
}

/// One node of the route tree.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Path template; relative paths are joined to the parent's.
    pub path: Option<String>,

    pub name: Option<String>,

    /// Component of the `default` view slot.
    pub component: Option<ComponentRef>,

    /// Components of named view slots.
    pub components: IndexMap<String, ComponentRef>,

    pub redirect: Option<Redirect>,

    /// Extra paths rendering the same subtree.
    #[serde(deserialize_with = "one_or_many")]
    pub alias: Vec<String>,

    pub children: Vec<RouteConfig>,

    #[serde(skip)]
    pub before_enter: Option<Guard>,

    pub meta: Meta,

    /// Props of the `default` slot.
    pub props: Option<PropsConfig>,

    /// Props per named view slot; takes precedence over `props`.
    pub view_props: IndexMap<String, PropsConfig>,

    pub case_sensitive: Option<bool>,

    pub path_options: PatternOptions,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn component(mut self, def: ComponentDef) -> Self {
        self.component = Some(ComponentRef::Defined(def));
        self
    }

    /// Component looked up by name in the registry at build time.
    pub fn component_named(mut self, name: impl Into<String>) -> Self {
        self.component = Some(ComponentRef::Named(name.into()));
        self
    }

    /// Component for a named view slot.
    pub fn view(mut self, slot: impl Into<String>, def: ComponentDef) -> Self {
        self.components.insert(slot.into(), ComponentRef::Defined(def));
        self
    }

    pub fn redirect(mut self, target: impl Into<RawLocation>) -> Self {
        self.redirect = Some(match target.into() {
            RawLocation::Path(path) => Redirect::Path(path),
            RawLocation::Location(loc) => Redirect::Location(loc),
        });
        self
    }

    /// Redirect computed from the route being resolved.
    pub fn redirect_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Route) -> Option<RawLocation> + Send + Sync + 'static,
    {
        self.redirect = Some(Redirect::Dynamic(Arc::new(f)));
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn child(mut self, child: RouteConfig) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: Vec<RouteConfig>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn before_enter(mut self, guard: Guard) -> Self {
        self.before_enter = Some(guard);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn props(mut self, props: PropsConfig) -> Self {
        self.props = Some(props);
        self
    }

    pub fn view_props(mut self, slot: impl Into<String>, props: PropsConfig) -> Self {
        self.view_props.insert(slot.into(), props);
        self
    }

    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = Some(sensitive);
        self
    }

    pub fn path_options(mut self, options: PatternOptions) -> Self {
        self.path_options = options;
        self
    }

    /// Effective props per view slot.
    pub(crate) fn props_by_slot(&self) -> IndexMap<String, PropsConfig> {
        if !self.view_props.is_empty() {
            return self.view_props.clone();
        }
        let mut out = IndexMap::new();
        if let Some(props) = &self.props {
            out.insert("default".to_string(), props.clone());
        }
        out
    }
}

/// Component reference inside a route node.
#[derive(Debug, Clone)]
pub enum ComponentRef {
    /// Resolved through the host's component registry.
    Named(String),
    Defined(ComponentDef),
}

impl<'de> Deserialize<'de> for ComponentRef {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        String::deserialize(d).map(ComponentRef::Named)
    }
}

impl Serialize for ComponentRef {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            ComponentRef::Named(name) => s.serialize_str(name),
            ComponentRef::Defined(def) => s.serialize_str(&format!("{:?}", def)),
        }
    }
}

/// Redirect computed from the route that triggered it.
pub type RedirectFn = Arc<dyn Fn(&Route) -> Option<RawLocation> + Send + Sync>;

/// Redirect target of a route.
#[derive(Clone)]
pub enum Redirect {
    Path(String),
    Location(Location),
    /// `None` from the function is an invalid redirect.
    Dynamic(RedirectFn),
}

impl std::fmt::Debug for Redirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Redirect::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Redirect::Location(l) => f.debug_tuple("Location").field(l).finish(),
            Redirect::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for Redirect {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Path(String),
            Location(Location),
        }
        Ok(match Repr::deserialize(d)? {
            Repr::Path(path) => Redirect::Path(path),
            Repr::Location(loc) => Redirect::Location(loc),
        })
    }
}

impl Serialize for Redirect {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Redirect::Path(path) => path.serialize(s),
            Redirect::Location(loc) => loc.serialize(s),
            Redirect::Dynamic(_) => s.serialize_str("<dynamic>"),
        }
    }
}

/// Props computed from the route being rendered.
pub type PropsFn = Arc<dyn Fn(&Route) -> Meta + Send + Sync>;

/// How a view receives props.
#[derive(Clone)]
pub enum PropsConfig {
    Off,
    /// Pass the route params.
    Params,
    Static(Meta),
    Dynamic(PropsFn),
}

impl PropsConfig {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Route) -> Meta + Send + Sync + 'static,
    {
        PropsConfig::Dynamic(Arc::new(f))
    }
}

impl std::fmt::Debug for PropsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropsConfig::Off => f.write_str("Off"),
            PropsConfig::Params => f.write_str("Params"),
            PropsConfig::Static(m) => f.debug_tuple("Static").field(m).finish(),
            PropsConfig::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for PropsConfig {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Static(Meta),
        }
        Ok(match Repr::deserialize(d)? {
            Repr::Flag(true) => PropsConfig::Params,
            Repr::Flag(false) => PropsConfig::Off,
            Repr::Static(props) => PropsConfig::Static(props),
        })
    }
}

impl Serialize for PropsConfig {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            PropsConfig::Off => s.serialize_bool(false),
            PropsConfig::Params => s.serialize_bool(true),
            PropsConfig::Static(props) => props.serialize(s),
            PropsConfig::Dynamic(_) => s.serialize_str("<dynamic>"),
        }
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Repr::deserialize(d)? {
        Repr::One(s) => vec![s],
        Repr::Many(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.mode, HistoryMode::Abstract);
        assert_eq!(config.enter_poll_interval_ms, 16);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_route_tree_from_toml() {
        let toml = r#"
            mode = "hash"
            base = "/app"

            [[routes]]
            path = "/user/:id"
            name = "user"
            alias = "/u/:id"
            props = true
            meta = { auth = true }

            [[routes.children]]
            path = "posts"
            component = "Posts"

            [[routes]]
            path = "/old"
            redirect = { name = "user", params = { id = "1" } }
        "#;
        let config: RouterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.mode, HistoryMode::Hash);
        assert_eq!(config.routes.len(), 2);

        let user = &config.routes[0];
        assert_eq!(user.alias, vec!["/u/:id".to_string()]);
        assert!(matches!(user.props, Some(PropsConfig::Params)));
        assert_eq!(user.meta.get("auth"), Some(&serde_json::Value::Bool(true)));
        assert!(matches!(
            user.children[0].component,
            Some(ComponentRef::Named(ref n)) if n == "Posts"
        ));

        match &config.routes[1].redirect {
            Some(Redirect::Location(loc)) => {
                assert_eq!(loc.name.as_deref(), Some("user"));
                assert_eq!(loc.params.as_ref().and_then(|p| p.get("id")).map(String::as_str), Some("1"));
            }
            other => panic!("unexpected redirect: {:?}", other),
        }
    }

    #[test]
    fn test_view_props_override_default_props() {
        let route = RouteConfig::new("/a")
            .props(PropsConfig::Params)
            .view_props("side", PropsConfig::Off);
        let props = route.props_by_slot();
        assert_eq!(props.len(), 1);
        assert!(props.contains_key("side"));
    }
}
