//! Global hook registries.
//!
//! Hooks are kept in registration order and removed through the
//! [`HookHandle`] returned on registration.

use std::sync::{Arc, Mutex, Weak};

use crate::navigation::errors::NavigationFailure;
use crate::routing::route::Route;

/// Runs after every committed navigation with `(to, from)`.
pub type AfterHook = Arc<dyn Fn(&Route, &Route) + Send + Sync>;

/// Receives failures that are real errors.
pub type ErrorHook = Arc<dyn Fn(&NavigationFailure) + Send + Sync>;

/// Notified of every committed route.
pub type RouteListener = Arc<dyn Fn(Arc<Route>) + Send + Sync>;

struct Entries<T> {
    next_id: u64,
    hooks: Vec<(u64, T)>,
}

/// Ordered, removable list of hooks.
pub struct HookList<T> {
    inner: Arc<Mutex<Entries<T>>>,
}

impl<T: Clone + Send + 'static> HookList<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Entries {
                next_id: 0,
                hooks: Vec::new(),
            })),
        }
    }

    pub fn register(&self, hook: T) -> HookHandle {
        let id = {
            let mut entries = self.inner.lock().expect("hook list poisoned");
            let id = entries.next_id;
            entries.next_id += 1;
            entries.hooks.push((id, hook));
            id
        };
        let list: Weak<Mutex<Entries<T>>> = Arc::downgrade(&self.inner);
        HookHandle {
            remove: Box::new(move || {
                if let Some(list) = list.upgrade() {
                    list.lock()
                        .expect("hook list poisoned")
                        .hooks
                        .retain(|(hook_id, _)| *hook_id != id);
                }
            }),
        }
    }

    /// Hooks in registration order.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner
            .lock()
            .expect("hook list poisoned")
            .hooks
            .iter()
            .map(|(_, hook)| hook.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("hook list poisoned").hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + 'static> Default for HookList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes its hook when [`HookHandle::remove`] is called.
///
/// Dropping the handle keeps the hook registered.
pub struct HookHandle {
    remove: Box<dyn FnOnce() + Send + Sync>,
}

impl HookHandle {
    pub fn remove(self) {
        (self.remove)();
    }
}

impl std::fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HookHandle")
    }
}
