//! Navigation guards and their answers.
//!
//! # Responsibilities
//! - Represent a guard as a future-returning function of `(to, from)`
//! - Represent its answer as an explicit [`Next`] command
//! - Adapt continuation-style guards through a single-use [`Proceed`]
//!
//! # Design Decisions
//! - `Proceed` is consumed when answered, so answering twice cannot compile
//! - A dropped `Proceed` resolves to [`Next::Unanswered`] instead of
//!   stalling the navigation forever
//! - Panics inside a guard are caught and reported as failures

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::oneshot;

use crate::navigation::components::ViewInstance;
use crate::navigation::errors::GuardError;
use crate::routing::location::RawLocation;
use crate::routing::route::Route;

/// Callback run with the view instance once it is registered.
pub type InstanceCallback = Box<dyn FnOnce(ViewInstance) + Send>;

/// A guard's answer.
pub enum Next {
    /// Proceed to the next guard.
    Continue,
    /// Stop the navigation and restore the previous URL.
    Abort,
    /// Stop the navigation with an error.
    Fail(GuardError),
    /// Stop the navigation and navigate to another location instead.
    Redirect(RawLocation),
    /// Proceed; run the callback with the view instance after commit.
    Callback(InstanceCallback),
    /// The continuation was dropped without an answer.
    Unanswered,
}

impl Next {
    pub fn redirect(to: impl Into<RawLocation>) -> Self {
        Next::Redirect(to.into())
    }

    pub fn fail<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Next::Fail(GuardError::new(err))
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce(ViewInstance) + Send + 'static,
    {
        Next::Callback(Box::new(f))
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Next::Continue => "continue",
            Next::Abort => "abort",
            Next::Fail(_) => "fail",
            Next::Redirect(_) => "redirect",
            Next::Callback(_) => "callback",
            Next::Unanswered => "unanswered",
        }
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Next::Fail(e) => f.debug_tuple("Fail").field(e).finish(),
            Next::Redirect(to) => f.debug_tuple("Redirect").field(to).finish(),
            other => f.write_str(other.label()),
        }
    }
}

impl From<bool> for Next {
    fn from(proceed: bool) -> Self {
        if proceed {
            Next::Continue
        } else {
            Next::Abort
        }
    }
}

/// Single-use continuation handed to callback-style guards.
#[derive(Debug)]
pub struct Proceed {
    tx: oneshot::Sender<Next>,
}

impl Proceed {
    pub fn resolve(self, next: Next) {
        // The receiver is gone only if the navigation future was dropped.
        let _ = self.tx.send(next);
    }

    pub fn next(self) {
        self.resolve(Next::Continue);
    }

    pub fn abort(self) {
        self.resolve(Next::Abort);
    }

    pub fn fail(self, err: GuardError) {
        self.resolve(Next::Fail(err));
    }

    pub fn redirect(self, to: impl Into<RawLocation>) {
        self.resolve(Next::Redirect(to.into()));
    }

    pub fn with_callback<F>(self, f: F)
    where
        F: FnOnce(ViewInstance) + Send + 'static,
    {
        self.resolve(Next::callback(f));
    }
}

type GuardFn = dyn Fn(Arc<Route>, Arc<Route>) -> BoxFuture<'static, Next> + Send + Sync;

/// A navigation guard: `(to, from) -> Next`.
#[derive(Clone)]
pub struct Guard {
    inner: Arc<GuardFn>,
}

impl Guard {
    /// Asynchronous guard.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<Route>, Arc<Route>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Next> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |to: Arc<Route>, from: Arc<Route>| -> BoxFuture<'static, Next> {
                f(to, from).boxed()
            }),
        }
    }

    /// Guard answering immediately.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Route, &Route) -> Next + Send + Sync + 'static,
    {
        Self::new(move |to, from| {
            let next = f(&to, &from);
            async move { next }
        })
    }

    /// Guard answering through a [`Proceed`] continuation.
    pub fn with_proceed<F>(f: F) -> Self
    where
        F: Fn(Arc<Route>, Arc<Route>, Proceed) + Send + Sync + 'static,
    {
        Self::new(move |to, from| {
            let (tx, rx) = oneshot::channel();
            f(to, from, Proceed { tx });
            async move { rx.await.unwrap_or(Next::Unanswered) }
        })
    }

    /// Run the guard, turning panics into failures.
    pub async fn call(&self, to: Arc<Route>, from: Arc<Route>) -> Next {
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| (self.inner)(to, from))) {
            Ok(fut) => fut,
            Err(panic) => return Next::Fail(GuardError::from_panic(panic)),
        };
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(next) => next,
            Err(panic) => Next::Fail(GuardError::from_panic(panic)),
        }
    }
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Guard(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::route::START;

    fn routes() -> (Arc<Route>, Arc<Route>) {
        (Arc::new(Route::empty("/to")), Arc::clone(&START))
    }

    #[tokio::test]
    async fn test_sync_guard() {
        let guard = Guard::sync(|to, _| if to.path == "/to" { Next::Abort } else { Next::Continue });
        let (to, from) = routes();
        assert!(matches!(guard.call(to, from).await, Next::Abort));
    }

    #[tokio::test]
    async fn test_proceed_from_another_task() {
        let guard = Guard::with_proceed(|_, _, proceed| {
            tokio::spawn(async move { proceed.redirect("/login") });
        });
        let (to, from) = routes();
        match guard.call(to, from).await {
            Next::Redirect(RawLocation::Path(p)) => assert_eq!(p, "/login"),
            other => panic!("unexpected answer: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropped_proceed_is_unanswered() {
        let guard = Guard::with_proceed(|_, _, proceed| drop(proceed));
        let (to, from) = routes();
        assert!(matches!(guard.call(to, from).await, Next::Unanswered));
    }

    #[tokio::test]
    async fn test_panicking_guard_fails() {
        let guard = Guard::sync(|_, _| panic!("no way"));
        let (to, from) = routes();
        match guard.call(to, from).await {
            Next::Fail(e) => assert!(e.to_string().contains("no way")),
            other => panic!("unexpected answer: {:?}", other),
        }

        let guard = Guard::new(|_, _| async {
            if true {
                panic!("async no way");
            }
            Next::Continue
        });
        let (to, from) = routes();
        assert!(matches!(guard.call(to, from).await, Next::Fail(_)));
    }
}
