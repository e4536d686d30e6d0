//! View-component collaborator.
//!
//! # Responsibilities
//! - Describe what the router needs from a view component: its guards
//! - Represent ready and lazily-loaded component definitions
//! - Resolve lazy definitions of activated records before guards run
//! - Extract leave, update and enter guards from matched records
//!
//! # Design Decisions
//! - Leave and update guards are bound to a registered view instance;
//!   records without one contribute nothing
//! - Lazy definitions contribute no guards until resolved
//! - A resolved definition replaces the lazy one on the record

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::future::{try_join_all, BoxFuture};
use futures_util::FutureExt;

use crate::navigation::errors::GuardError;
use crate::navigation::guard::{Guard, InstanceCallback, Next};
use crate::routing::record::RouteRecord;

/// Opaque handle of a rendered view, owned by the view layer.
pub type ViewInstance = Arc<dyn Any + Send + Sync>;

/// Error type of component loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Guards a view component defines.
pub trait ViewComponent: Send + Sync + std::fmt::Debug {
    /// Guards run when the component's route is left, bound to its instance.
    fn leave_guards(&self, _instance: &ViewInstance) -> Vec<Guard> {
        Vec::new()
    }

    /// Guards run when the route changes but the component is reused.
    fn update_guards(&self, _instance: &ViewInstance) -> Vec<Guard> {
        Vec::new()
    }

    /// Guards run before the component's route is entered (no instance yet).
    fn enter_guards(&self) -> Vec<Guard> {
        Vec::new()
    }
}

/// Loads a component definition on first use.
pub trait ComponentLoader: Send + Sync {
    fn load(&self) -> BoxFuture<'static, Result<Arc<dyn ViewComponent>, BoxError>>;
}

impl<F, Fut> ComponentLoader for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Arc<dyn ViewComponent>, BoxError>> + Send + 'static,
{
    fn load(&self) -> BoxFuture<'static, Result<Arc<dyn ViewComponent>, BoxError>> {
        self().boxed()
    }
}

/// A component bound to a view slot.
#[derive(Clone)]
pub enum ComponentDef {
    Ready(Arc<dyn ViewComponent>),
    Lazy(Arc<dyn ComponentLoader>),
}

impl ComponentDef {
    pub fn ready(component: impl ViewComponent + 'static) -> Self {
        ComponentDef::Ready(Arc::new(component))
    }

    pub fn lazy(loader: impl ComponentLoader + 'static) -> Self {
        ComponentDef::Lazy(Arc::new(loader))
    }

    pub fn as_ready(&self) -> Option<&Arc<dyn ViewComponent>> {
        match self {
            ComponentDef::Ready(component) => Some(component),
            ComponentDef::Lazy(_) => None,
        }
    }
}

impl std::fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentDef::Ready(c) => f.debug_tuple("Ready").field(c).finish(),
            ComponentDef::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Named component definitions referenced from configuration files.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    defs: HashMap<String, ComponentDef>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, def: ComponentDef) -> &mut Self {
        self.defs.insert(name.into(), def);
        self
    }

    pub fn with(mut self, name: impl Into<String>, def: ComponentDef) -> Self {
        self.register(name, def);
        self
    }

    pub fn get(&self, name: &str) -> Option<ComponentDef> {
        self.defs.get(name).cloned()
    }
}

/// Resolves lazy component definitions of activated records.
pub trait ComponentResolver: Send + Sync + std::fmt::Debug {
    fn resolve(&self, records: Vec<Arc<RouteRecord>>) -> BoxFuture<'static, Result<(), GuardError>>;
}

/// Loads every lazy definition concurrently; the first failure wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct LazyComponentResolver;

impl ComponentResolver for LazyComponentResolver {
    fn resolve(&self, records: Vec<Arc<RouteRecord>>) -> BoxFuture<'static, Result<(), GuardError>> {
        let mut loads = Vec::new();
        for record in records {
            for (slot, def) in record.components() {
                if let ComponentDef::Lazy(loader) = def {
                    let record = Arc::clone(&record);
                    loads.push(async move {
                        let component = loader.load().await.map_err(GuardError::from_boxed)?;
                        tracing::debug!(path = %record.path, slot = %slot, "Lazy component resolved");
                        record.set_component(&slot, ComponentDef::Ready(component));
                        Ok::<(), GuardError>(())
                    });
                }
            }
        }
        async move { try_join_all(loads).await.map(|_| ()) }.boxed()
    }
}

/// The resolution gate as a guard in the navigation queue.
pub(crate) fn resolution_gate(resolver: Arc<dyn ComponentResolver>, activated: Vec<Arc<RouteRecord>>) -> Guard {
    Guard::new(move |_, _| {
        let pending = resolver.resolve(activated.clone());
        async move {
            match pending.await {
                Ok(()) => Next::Continue,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to resolve async component");
                    Next::Fail(e)
                }
            }
        }
    })
}

/// Ready components of `records` with their instances, records then slots.
fn ready_components(
    records: &[Arc<RouteRecord>],
) -> Vec<(Arc<RouteRecord>, String, Arc<dyn ViewComponent>)> {
    records
        .iter()
        .flat_map(|record| {
            record
                .components()
                .into_iter()
                .filter_map(|(slot, def)| def.as_ready().cloned().map(|c| (Arc::clone(record), slot, c)))
        })
        .collect()
}

/// Leave guards, child components before parents.
pub fn extract_leave_guards(deactivated: &[Arc<RouteRecord>]) -> Vec<Guard> {
    let mut per_component: Vec<Vec<Guard>> = ready_components(deactivated)
        .into_iter()
        .filter_map(|(record, slot, component)| {
            record
                .instance(&slot)
                .map(|instance| component.leave_guards(&instance))
        })
        .collect();
    per_component.reverse();
    per_component.into_iter().flatten().collect()
}

/// Update guards of reused components, parents first.
pub fn extract_update_guards(updated: &[Arc<RouteRecord>]) -> Vec<Guard> {
    ready_components(updated)
        .into_iter()
        .filter_map(|(record, slot, component)| {
            record
                .instance(&slot)
                .map(|instance| component.update_guards(&instance))
        })
        .flatten()
        .collect()
}

/// Instance callback waiting for its view to register.
pub(crate) struct DeferredEnter {
    pub record: Arc<RouteRecord>,
    pub slot: String,
    pub callback: InstanceCallback,
}

/// Shared sink for instance callbacks of one navigation.
pub(crate) type DeferredEnters = Arc<Mutex<Vec<DeferredEnter>>>;

/// Enter guards of activated components, parents first.
///
/// An answer of `Next::Callback` is parked in `deferred` and the guard
/// continues the navigation.
pub(crate) fn extract_enter_guards(activated: &[Arc<RouteRecord>], deferred: &DeferredEnters) -> Vec<Guard> {
    let mut guards = Vec::new();
    for (record, slot, component) in ready_components(activated) {
        for inner in component.enter_guards() {
            let record = Arc::clone(&record);
            let slot = slot.clone();
            let deferred = Arc::clone(deferred);
            guards.push(Guard::new(move |to, from| {
                let inner = inner.clone();
                let record = Arc::clone(&record);
                let slot = slot.clone();
                let deferred = Arc::clone(&deferred);
                async move {
                    match inner.call(to, from).await {
                        Next::Callback(callback) => {
                            deferred
                                .lock()
                                .expect("deferred callbacks poisoned")
                                .push(DeferredEnter { record, slot, callback });
                            Next::Continue
                        }
                        other => other,
                    }
                }
            }));
        }
    }
    guards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;
    use crate::routing::table::RouteTable;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Named(&'static str);

    impl ViewComponent for Named {
        fn leave_guards(&self, _instance: &ViewInstance) -> Vec<Guard> {
            let name = self.0;
            vec![Guard::sync(move |_, _| {
                tracing::trace!(name, "leave");
                Next::Continue
            })]
        }
    }

    fn records(routes: Vec<RouteConfig>) -> Vec<Arc<RouteRecord>> {
        let (table, _) = RouteTable::build(&routes, &ComponentRegistry::default()).unwrap();
        let leaf = table.records().last().cloned().unwrap();
        table.ancestors(&leaf)
    }

    #[test]
    fn test_leave_guards_need_instances() {
        let chain = records(vec![RouteConfig::new("/a")
            .component(ComponentDef::ready(Named("a")))
            .child(RouteConfig::new("b").component(ComponentDef::ready(Named("b"))))]);
        assert!(extract_leave_guards(&chain).is_empty());

        chain[1].register_instance("default", Arc::new(()));
        assert_eq!(extract_leave_guards(&chain).len(), 1);
        chain[0].register_instance("default", Arc::new(()));
        assert_eq!(extract_leave_guards(&chain).len(), 2);
    }

    #[tokio::test]
    async fn test_lazy_components_resolve_in_place() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let chain = records(vec![RouteConfig::new("/lazy").component(ComponentDef::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, BoxError>(Arc::new(Named("lazy")) as Arc<dyn ViewComponent>) }
        }))]);

        LazyComponentResolver.resolve(chain.clone()).await.unwrap();
        assert!(chain[0].component("default").unwrap().as_ready().is_some());

        LazyComponentResolver.resolve(chain).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lazy_failure_is_reported() {
        let chain = records(vec![RouteConfig::new("/broken").component(ComponentDef::lazy(|| async {
            Err::<Arc<dyn ViewComponent>, BoxError>("chunk missing".into())
        }))]);
        let err = LazyComponentResolver.resolve(chain).await.unwrap_err();
        assert_eq!(err.to_string(), "chunk missing");
    }
}
