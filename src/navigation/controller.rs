//! Navigation transition controller.
//!
//! # Responsibilities
//! - Own the `current` and `pending` routes
//! - Detect duplicate navigations
//! - Diff matched chains and run the two guard queues in order
//! - Commit (listener, after hooks, visible URL, ready callbacks) or abort
//!   (error hooks, URL restore, redirect re-issue)
//!
//! # Data Flow
//! ```text
//! transition_to(raw)
//!     → matcher (raw, current) → route
//!     → duplicate? ─────────────────────────────→ abort(Duplicated)
//!     → pending = route
//!     → queue 1: leave → before_each → update → before_enter → resolve gate
//!     → queue 2: component enter → before_resolve
//!     → pending still route? ───────── no ──────→ abort(Cancelled)
//!     → commit: current = route, listener, after_each, URL, ready
//!     → deferred instance callbacks (background task)
//! ```
//!
//! # Design Decisions
//! - Cancellation is cooperative: every guard step first checks that its
//!   route is still the pending one; a running guard is never interrupted
//! - Locks are never held across an await point
//! - A guard redirect settles the original navigation only after the
//!   redirected navigation finished
//! - There is no guard timeout; a guard that never answers stalls its
//!   navigation until it is superseded

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::navigation::components::{ComponentResolver, DeferredEnter, DeferredEnters};
use crate::navigation::errors::{GuardError, NavigationFailure};
use crate::navigation::guard::{Guard, Next};
use crate::navigation::history::{HistoryBackend, UrlFormat};
use crate::navigation::hooks::{AfterHook, ErrorHook, HookList, RouteListener};
use crate::navigation::queue::{confirm_queue, resolve_hooks_queue, resolve_queue, Stage};
use crate::navigation::wait::wait_for_instance;
use crate::observability::metrics;
use crate::routing::location::RawLocation;
use crate::routing::matcher::Matcher;
use crate::routing::route::{is_same_route, Route, START};

/// What happens to the visible URL on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlAction {
    Push,
    Replace,
    /// The URL already shows the target (initial load, history moves).
    Keep,
}

/// Runs once with the first committed route.
pub type ReadyCallback = Box<dyn FnOnce(Arc<Route>) + Send>;

/// Runs once with the first navigation failure that settles readiness.
pub type ReadyErrorCallback = Box<dyn FnOnce(NavigationFailure) + Send>;

enum ReadyState {
    Waiting {
        on_ready: Vec<ReadyCallback>,
        on_error: Vec<ReadyErrorCallback>,
    },
    Ready(Arc<Route>),
    Failed(NavigationFailure),
}

struct TransitionState {
    current: Arc<Route>,
    pending: Option<Arc<Route>>,
}

/// Why a guard queue stopped.
enum Interrupt {
    Duplicated,
    Aborted,
    Cancelled,
    Errored(GuardError),
    Unanswered,
    Redirect(RawLocation),
}

/// Collaborators of a controller.
pub struct ControllerParts {
    pub matcher: Arc<Matcher>,
    pub history: Arc<dyn HistoryBackend>,
    pub url: UrlFormat,
    pub resolver: Arc<dyn ComponentResolver>,
    pub poll_interval: Duration,
    pub metrics_enabled: bool,
}

/// The navigation state machine.
pub struct TransitionController {
    matcher: Arc<Matcher>,
    history: Arc<dyn HistoryBackend>,
    url: UrlFormat,
    resolver: Arc<dyn ComponentResolver>,
    poll_interval: Duration,
    metrics_enabled: bool,
    pub(crate) before_hooks: HookList<Guard>,
    pub(crate) resolve_hooks: HookList<Guard>,
    pub(crate) after_hooks: HookList<AfterHook>,
    pub(crate) error_hooks: HookList<ErrorHook>,
    listener: Mutex<Option<RouteListener>>,
    state: Mutex<TransitionState>,
    ready: Mutex<ReadyState>,
}

impl TransitionController {
    pub fn new(parts: ControllerParts) -> Self {
        Self {
            matcher: parts.matcher,
            history: parts.history,
            url: parts.url,
            resolver: parts.resolver,
            poll_interval: parts.poll_interval,
            metrics_enabled: parts.metrics_enabled,
            before_hooks: HookList::new(),
            resolve_hooks: HookList::new(),
            after_hooks: HookList::new(),
            error_hooks: HookList::new(),
            listener: Mutex::new(None),
            state: Mutex::new(TransitionState {
                current: Arc::clone(&START),
                pending: None,
            }),
            ready: Mutex::new(ReadyState::Waiting {
                on_ready: Vec::new(),
                on_error: Vec::new(),
            }),
        }
    }

    pub fn matcher(&self) -> &Arc<Matcher> {
        &self.matcher
    }

    pub fn history(&self) -> &Arc<dyn HistoryBackend> {
        &self.history
    }

    pub fn url_format(&self) -> &UrlFormat {
        &self.url
    }

    /// Last committed route.
    pub fn current(&self) -> Arc<Route> {
        Arc::clone(&self.state.lock().expect("transition state poisoned").current)
    }

    /// Route of the navigation in flight, if any.
    pub fn pending(&self) -> Option<Arc<Route>> {
        self.state.lock().expect("transition state poisoned").pending.clone()
    }

    /// Full path shown by the history backend.
    pub fn current_location(&self) -> String {
        self.url.full_path(&self.history.current_location())
    }

    /// Set the single route-changed listener.
    pub fn listen(&self, listener: RouteListener) {
        *self.listener.lock().expect("listener poisoned") = Some(listener);
    }

    /// Register first-navigation callbacks; fire at once if already settled.
    pub fn on_ready(&self, on_ready: ReadyCallback, on_error: Option<ReadyErrorCallback>) {
        let mut on_ready = Some(on_ready);
        let mut on_error = on_error;
        let settled = {
            let mut ready = self.ready.lock().expect("ready state poisoned");
            match &mut *ready {
                ReadyState::Waiting {
                    on_ready: ready_cbs,
                    on_error: error_cbs,
                } => {
                    ready_cbs.extend(on_ready.take());
                    error_cbs.extend(on_error.take());
                    None
                }
                ReadyState::Ready(route) => Some(Ok(Arc::clone(route))),
                ReadyState::Failed(failure) => Some(Err(failure.clone())),
            }
        };
        match settled {
            Some(Ok(route)) => {
                if let Some(cb) = on_ready {
                    cb(route);
                }
            }
            Some(Err(failure)) => {
                if let Some(cb) = on_error {
                    cb(failure);
                }
            }
            None => {}
        }
    }

    /// Move through the history backend.
    pub fn go(&self, delta: isize) {
        self.history.go(delta);
    }

    /// Navigate to `raw`, updating the visible URL per `action` on commit.
    pub fn transition_to(
        self: &Arc<Self>,
        raw: RawLocation,
        action: UrlAction,
    ) -> BoxFuture<'static, Result<Arc<Route>, NavigationFailure>> {
        let navigation_id = Uuid::new_v4();
        let span = tracing::info_span!("navigation", %navigation_id, to = %raw);
        let this = Arc::clone(self);
        async move { this.run_transition(raw, action).await }
            .instrument(span)
            .boxed()
    }

    async fn run_transition(
        self: Arc<Self>,
        raw: RawLocation,
        action: UrlAction,
    ) -> Result<Arc<Route>, NavigationFailure> {
        let current = self.current();
        let route = self.matcher.match_location(raw, Some(current.as_ref()), None);
        tracing::debug!(from = %current.full_path, to = %route.full_path, "Navigation started");

        match self.confirm_transition(&route, &current).await {
            Ok(deferred) => {
                self.commit(&route, action, deferred);
                Ok(route)
            }
            Err(interrupt) => Err(self.abort(interrupt, &route, &current).await),
        }
    }

    async fn confirm_transition(
        &self,
        route: &Arc<Route>,
        current: &Arc<Route>,
    ) -> Result<Vec<DeferredEnter>, Interrupt> {
        if is_same_route(route, current) && route.matched.len() == current.matched.len() {
            self.ensure_url(false);
            return Err(Interrupt::Duplicated);
        }

        let diff = resolve_queue(&current.matched, &route.matched);
        let queue = confirm_queue(&diff, self.before_hooks.snapshot(), Arc::clone(&self.resolver));

        self.state.lock().expect("transition state poisoned").pending = Some(Arc::clone(route));
        self.run_queue(queue, route, current).await?;

        let deferred: DeferredEnters = Arc::new(Mutex::new(Vec::new()));
        let queue = resolve_hooks_queue(&diff.activated, self.resolve_hooks.snapshot(), &deferred);
        self.run_queue(queue, route, current).await?;

        if !self.take_pending(route) {
            return Err(Interrupt::Cancelled);
        }
        let deferred = std::mem::take(&mut *deferred.lock().expect("deferred callbacks poisoned"));
        Ok(deferred)
    }

    async fn run_queue(&self, queue: Vec<Stage>, route: &Arc<Route>, current: &Arc<Route>) -> Result<(), Interrupt> {
        for stage in queue {
            if !self.is_pending(route) {
                return Err(Interrupt::Cancelled);
            }
            let next = stage.guard.call(Arc::clone(route), Arc::clone(current)).await;
            tracing::trace!(stage = stage.label, answer = next.label(), "Guard answered");
            match next {
                Next::Continue => {}
                Next::Callback(_) => {
                    tracing::debug!(stage = stage.label, "Instance callback outside an enter guard ignored");
                }
                Next::Abort => {
                    self.ensure_url(true);
                    return Err(Interrupt::Aborted);
                }
                Next::Fail(err) => {
                    self.ensure_url(true);
                    return Err(Interrupt::Errored(err));
                }
                Next::Unanswered => {
                    self.ensure_url(true);
                    return Err(Interrupt::Unanswered);
                }
                Next::Redirect(target) => return Err(Interrupt::Redirect(target)),
            }
        }
        Ok(())
    }

    fn is_pending(&self, route: &Arc<Route>) -> bool {
        let state = self.state.lock().expect("transition state poisoned");
        state.pending.as_ref().is_some_and(|p| Arc::ptr_eq(p, route))
    }

    /// Clear `pending` if it is still `route`.
    fn take_pending(&self, route: &Arc<Route>) -> bool {
        let mut state = self.state.lock().expect("transition state poisoned");
        let still_pending = state.pending.as_ref().is_some_and(|p| Arc::ptr_eq(p, route));
        if still_pending {
            state.pending = None;
        }
        still_pending
    }

    fn commit(self: &Arc<Self>, route: &Arc<Route>, action: UrlAction, deferred: Vec<DeferredEnter>) {
        let prev = {
            let mut state = self.state.lock().expect("transition state poisoned");
            std::mem::replace(&mut state.current, Arc::clone(route))
        };

        let listener = self.listener.lock().expect("listener poisoned").clone();
        if let Some(listener) = listener {
            listener(Arc::clone(route));
        }
        for hook in self.after_hooks.snapshot() {
            hook(route, &prev);
        }

        let href = self.url.href(&route.full_path);
        match action {
            UrlAction::Push => self.history.push(&href),
            UrlAction::Replace => self.history.replace(&href),
            UrlAction::Keep => {}
        }
        self.ensure_url(false);
        self.settle_ready(Ok(Arc::clone(route)));

        if self.metrics_enabled {
            metrics::record_navigation("committed");
        }
        tracing::info!(from = %prev.full_path, to = %route.full_path, "Navigation committed");

        if !deferred.is_empty() {
            self.run_deferred(Arc::clone(route), deferred);
        }
    }

    /// Fire instance callbacks as their views register, in order.
    fn run_deferred(self: &Arc<Self>, route: Arc<Route>, deferred: Vec<DeferredEnter>) {
        let controller = Arc::downgrade(self);
        let interval = self.poll_interval;
        tokio::spawn(
            async move {
                for DeferredEnter { record, slot, callback } in deferred {
                    let is_valid = || {
                        controller
                            .upgrade()
                            .is_some_and(|c| Arc::ptr_eq(&c.current(), &route))
                    };
                    match wait_for_instance(&record, &slot, is_valid, interval).await {
                        Some(instance) => callback(instance),
                        None => tracing::debug!(slot = %slot, "Route left before its view registered"),
                    }
                }
            }
            .in_current_span(),
        );
    }

    async fn abort(
        self: &Arc<Self>,
        interrupt: Interrupt,
        route: &Arc<Route>,
        current: &Arc<Route>,
    ) -> NavigationFailure {
        let to = route.full_path.clone();
        let from = current.full_path.clone();
        let failure = match interrupt {
            Interrupt::Duplicated => NavigationFailure::Duplicated { to },
            Interrupt::Aborted => NavigationFailure::Aborted { from, to },
            Interrupt::Cancelled => NavigationFailure::Cancelled { to },
            Interrupt::Errored(source) => NavigationFailure::Errored { to, source },
            Interrupt::Unanswered => NavigationFailure::Unanswered { to },
            Interrupt::Redirect(target) => {
                let failure = NavigationFailure::Redirected {
                    from,
                    to,
                    target: target.to_string(),
                };
                let redirect_action = if target.wants_replace() {
                    UrlAction::Replace
                } else {
                    UrlAction::Push
                };
                tracing::debug!(redirect = %target, "Guard redirected navigation");
                if let Err(e) = self.transition_to(target, redirect_action).await {
                    tracing::debug!(error = %e, "Redirected navigation did not commit");
                }
                failure
            }
        };

        if failure.is_error() {
            let hooks = self.error_hooks.snapshot();
            if hooks.is_empty() {
                tracing::warn!(error = %failure, "Uncaught error during route navigation");
            }
            for hook in hooks {
                hook(&failure);
            }
        }
        if failure.settles_ready() {
            self.settle_ready(Err(failure.clone()));
        }

        if self.metrics_enabled {
            metrics::record_navigation(failure.kind());
        }
        tracing::debug!(outcome = failure.kind(), "Navigation aborted");
        failure
    }

    fn settle_ready(&self, outcome: Result<Arc<Route>, NavigationFailure>) {
        let waiting = {
            let mut ready = self.ready.lock().expect("ready state poisoned");
            if !matches!(*ready, ReadyState::Waiting { .. }) {
                return;
            }
            let settled = match &outcome {
                Ok(route) => ReadyState::Ready(Arc::clone(route)),
                Err(failure) => ReadyState::Failed(failure.clone()),
            };
            std::mem::replace(&mut *ready, settled)
        };

        if let ReadyState::Waiting { on_ready, on_error } = waiting {
            match outcome {
                Ok(route) => on_ready.into_iter().for_each(|cb| cb(Arc::clone(&route))),
                Err(failure) => on_error.into_iter().for_each(|cb| cb(failure.clone())),
            }
        }
    }

    /// Make the visible URL show the current route.
    pub fn ensure_url(&self, push: bool) {
        let expected = self.url.href(&self.current().full_path);
        if self.history.current_location() != expected {
            tracing::trace!(url = %expected, push, "Restoring visible URL");
            if push {
                self.history.push(&expected);
            } else {
                self.history.replace(&expected);
            }
        }
    }
}

impl std::fmt::Debug for TransitionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionController")
            .field("current", &self.current().full_path)
            .field("pending", &self.pending().map(|p| p.full_path.clone()))
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}
