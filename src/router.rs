//! Router facade.
//!
//! # Responsibilities
//! - Wire configuration, matcher, history backend and controller together
//! - Expose the programmatic navigation API (push, replace, go, hooks)
//! - Follow history changes made outside the router (`go`, back/forward)
//!
//! # Data Flow
//! ```text
//! RouterConfig ──→ RouterBuilder::build
//!                      ├── validate_config
//!                      ├── Matcher::new (route table)
//!                      ├── UrlFormat + HistoryBackend
//!                      └── TransitionController
//!
//! Router::start
//!     ├── history.subscribe() ──→ listener task ──→ transition_to(url, Keep)
//!     └── transition_to(current location, Keep)
//! ```
//!
//! # Design Decisions
//! - `Router` is a cheap handle (`Arc` inside); clones share state
//! - The listener task holds a weak reference and is aborted on drop
//! - Each history change starts its own navigation task, so a stalled
//!   guard never blocks newer history moves

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::config::loader::ConfigError;
use crate::config::schema::{RouteConfig, RouterConfig};
use crate::config::validation::validate_config;
use crate::navigation::components::{ComponentDef, ComponentRegistry, ComponentResolver, LazyComponentResolver};
use crate::navigation::controller::{ControllerParts, ReadyErrorCallback, TransitionController, UrlAction};
use crate::navigation::errors::NavigationFailure;
use crate::navigation::guard::Guard;
use crate::navigation::history::{HistoryBackend, MemoryHistory, UrlFormat};
use crate::navigation::hooks::HookHandle;
use crate::routing::error::{RouteConfigError, TableWarning};
use crate::routing::location::{normalize_location, Location, RawLocation};
use crate::routing::matcher::Matcher;
use crate::routing::query::{DefaultQueryCodec, QueryCodec};
use crate::routing::route::Route;

/// Error building a router.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routes(#[from] RouteConfigError),
}

/// Result of [`Router::resolve`].
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The normalized target.
    pub location: Location,
    pub route: Arc<Route>,
    /// Visible URL of the target.
    pub href: String,
}

/// Builder for [`Router`] with optional collaborators.
pub struct RouterBuilder {
    config: RouterConfig,
    registry: ComponentRegistry,
    history: Option<Arc<dyn HistoryBackend>>,
    resolver: Option<Arc<dyn ComponentResolver>>,
    codec: Option<Arc<dyn QueryCodec>>,
}

impl RouterBuilder {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            registry: ComponentRegistry::default(),
            history: None,
            resolver: None,
            codec: None,
        }
    }

    /// Components referenced by name from configuration files.
    pub fn registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryBackend>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn ComponentResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn query_codec(mut self, codec: Arc<dyn QueryCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn build(self) -> Result<Router, RouterError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        let metrics_enabled = self.config.observability.metrics_enabled;
        let codec = self.codec.unwrap_or_else(|| Arc::new(DefaultQueryCodec));
        let (matcher, warnings) = Matcher::new(&self.config.routes, self.registry, codec)?;
        let matcher = Arc::new(matcher.with_metrics(metrics_enabled));

        let url = UrlFormat::new(self.config.mode, &self.config.base);
        let history = self
            .history
            .unwrap_or_else(|| Arc::new(MemoryHistory::new(url.href("/"))));
        let resolver = self.resolver.unwrap_or_else(|| Arc::new(LazyComponentResolver));

        let controller = Arc::new(TransitionController::new(ControllerParts {
            matcher,
            history,
            url,
            resolver,
            poll_interval: Duration::from_millis(self.config.enter_poll_interval_ms),
            metrics_enabled,
        }));

        tracing::info!(
            mode = ?self.config.mode,
            base = %self.config.base,
            routes = self.config.routes.len(),
            warnings = warnings.len(),
            "Router created"
        );

        Ok(Router {
            inner: Arc::new(RouterInner {
                controller,
                warnings: Mutex::new(warnings),
                listener: Mutex::new(None),
            }),
        })
    }
}

struct RouterInner {
    controller: Arc<TransitionController>,
    warnings: Mutex<Vec<TableWarning>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for RouterInner {
    fn drop(&mut self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

/// Client-side router handle.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// Router with an in-memory history and the default collaborators.
    pub fn new(config: RouterConfig) -> Result<Self, RouterError> {
        RouterBuilder::new(config).build()
    }

    pub fn builder(config: RouterConfig) -> RouterBuilder {
        RouterBuilder::new(config)
    }

    fn controller(&self) -> &Arc<TransitionController> {
        &self.inner.controller
    }

    /// Last committed route.
    pub fn current_route(&self) -> Arc<Route> {
        self.controller().current()
    }

    pub fn history(&self) -> &Arc<dyn HistoryBackend> {
        self.controller().history()
    }

    pub fn matcher(&self) -> &Arc<Matcher> {
        self.controller().matcher()
    }

    /// Warnings collected while building and extending the route table.
    pub fn warnings(&self) -> Vec<TableWarning> {
        self.inner.warnings.lock().expect("warnings poisoned").clone()
    }

    /// Resolve `raw` against the current route without navigating.
    pub fn match_location(&self, raw: impl Into<RawLocation>) -> Arc<Route> {
        let current = self.current_route();
        self.matcher().match_location(raw, Some(current.as_ref()), None)
    }

    /// Navigate and add a history entry.
    pub async fn push(&self, raw: impl Into<RawLocation>) -> Result<Arc<Route>, NavigationFailure> {
        self.controller().transition_to(raw.into(), UrlAction::Push).await
    }

    /// Navigate and replace the current history entry.
    pub async fn replace(&self, raw: impl Into<RawLocation>) -> Result<Arc<Route>, NavigationFailure> {
        self.controller().transition_to(raw.into(), UrlAction::Replace).await
    }

    /// Callback form of [`Router::push`].
    pub fn push_with<C, A>(&self, raw: impl Into<RawLocation>, on_complete: C, on_abort: A) -> JoinHandle<()>
    where
        C: FnOnce(Arc<Route>) + Send + 'static,
        A: FnOnce(NavigationFailure) + Send + 'static,
    {
        self.spawn_with(raw.into(), UrlAction::Push, on_complete, on_abort)
    }

    /// Callback form of [`Router::replace`].
    pub fn replace_with<C, A>(&self, raw: impl Into<RawLocation>, on_complete: C, on_abort: A) -> JoinHandle<()>
    where
        C: FnOnce(Arc<Route>) + Send + 'static,
        A: FnOnce(NavigationFailure) + Send + 'static,
    {
        self.spawn_with(raw.into(), UrlAction::Replace, on_complete, on_abort)
    }

    fn spawn_with<C, A>(&self, raw: RawLocation, action: UrlAction, on_complete: C, on_abort: A) -> JoinHandle<()>
    where
        C: FnOnce(Arc<Route>) + Send + 'static,
        A: FnOnce(NavigationFailure) + Send + 'static,
    {
        let navigation = self.controller().transition_to(raw, action);
        tokio::spawn(async move {
            match navigation.await {
                Ok(route) => on_complete(route),
                Err(failure) => on_abort(failure),
            }
        })
    }

    /// Move `delta` entries through the history.
    pub fn go(&self, delta: isize) {
        self.controller().go(delta);
    }

    pub fn back(&self) {
        self.go(-1);
    }

    pub fn forward(&self) {
        self.go(1);
    }

    /// Guard run before every navigation, after leave guards.
    pub fn before_each(&self, guard: Guard) -> HookHandle {
        self.controller().before_hooks.register(guard)
    }

    /// Guard run after all in-component enter guards.
    pub fn before_resolve(&self, guard: Guard) -> HookHandle {
        self.controller().resolve_hooks.register(guard)
    }

    /// Hook run after every committed navigation with `(to, from)`.
    pub fn after_each<F>(&self, hook: F) -> HookHandle
    where
        F: Fn(&Route, &Route) + Send + Sync + 'static,
    {
        self.controller().after_hooks.register(Arc::new(hook))
    }

    /// Hook receiving navigation errors.
    pub fn on_error<F>(&self, hook: F) -> HookHandle
    where
        F: Fn(&NavigationFailure) + Send + Sync + 'static,
    {
        self.controller().error_hooks.register(Arc::new(hook))
    }

    /// Run `cb` once the first navigation committed.
    pub fn on_ready<F>(&self, cb: F)
    where
        F: FnOnce(Arc<Route>) + Send + 'static,
    {
        self.controller().on_ready(Box::new(cb), None);
    }

    /// Like [`Router::on_ready`], with a callback for an initial failure.
    pub fn on_ready_or_error<F, E>(&self, cb: F, on_error: E)
    where
        F: FnOnce(Arc<Route>) + Send + 'static,
        E: FnOnce(NavigationFailure) + Send + 'static,
    {
        let on_error: ReadyErrorCallback = Box::new(on_error);
        self.controller().on_ready(Box::new(cb), Some(on_error));
    }

    /// Set the single route-changed listener (the view layer's hook).
    pub fn listen<F>(&self, listener: F)
    where
        F: Fn(Arc<Route>) + Send + Sync + 'static,
    {
        self.controller().listen(Arc::new(listener));
    }

    /// Normalize and match `raw` and compute its visible URL.
    pub fn resolve(&self, raw: impl Into<RawLocation>, current: Option<&Route>, append: bool) -> Resolved {
        let fallback = self.current_route();
        let current = current.unwrap_or(fallback.as_ref());
        let matcher = self.matcher();

        let location = normalize_location(raw.into(), Some(current), append, matcher.codec());
        let route = matcher.match_location(location.clone(), Some(current), None);
        let full_path = route.redirected_from.as_deref().unwrap_or(&route.full_path);
        let href = self.controller().url_format().href(full_path);

        Resolved { location, route, href }
    }

    /// Component definitions of the target's (or the current route's) chain.
    pub fn matched_components(&self, raw: Option<RawLocation>) -> Vec<ComponentDef> {
        let route = match raw {
            Some(raw) => self.match_location(raw),
            None => self.current_route(),
        };
        route
            .matched
            .iter()
            .flat_map(|record| record.components().into_iter().map(|(_, def)| def))
            .collect()
    }

    /// Append routes and re-resolve the current location against them.
    pub async fn add_routes(&self, routes: Vec<RouteConfig>) -> Result<Vec<TableWarning>, RouteConfigError> {
        let warnings = self.matcher().add_routes(&routes)?;
        self.inner
            .warnings
            .lock()
            .expect("warnings poisoned")
            .extend(warnings.iter().cloned());

        let controller = self.controller();
        if !controller.current().is_start() {
            let location = controller.current_location();
            if let Err(e) = controller.transition_to(location.into(), UrlAction::Keep).await {
                tracing::debug!(error = %e, "Re-resolution after add_routes did not commit");
            }
        }
        Ok(warnings)
    }

    /// Navigate to the backend's location and start following it.
    pub async fn start(&self) -> Result<Arc<Route>, NavigationFailure> {
        self.spawn_listener();
        let controller = self.controller();
        let location = controller.current_location();
        controller.transition_to(location.into(), UrlAction::Keep).await
    }

    fn spawn_listener(&self) {
        let mut listener = self.inner.listener.lock().expect("listener poisoned");
        if listener.is_some() {
            return;
        }

        let mut changes = self.history().subscribe();
        let controller = Arc::downgrade(self.controller());
        *listener = Some(tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(url) => {
                        let Some(controller) = controller.upgrade() else {
                            break;
                        };
                        let location = controller.url_format().full_path(&url);
                        tracing::debug!(url = %url, "History changed");
                        let navigation = controller.transition_to(location.into(), UrlAction::Keep);
                        tokio::spawn(async move {
                            if let Err(e) = navigation.await {
                                tracing::debug!(error = %e, "History navigation did not commit");
                            }
                        });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "History listener lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("controller", self.controller())
            .finish_non_exhaustive()
    }
}
