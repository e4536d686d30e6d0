//! Navigation subsystem.
//!
//! # Responsibilities
//! - Guards, their answers and the guard queues
//! - The transition controller (current/pending route, commit, abort)
//! - Global hook registries
//! - The view-component collaborator and lazy component resolution
//! - The history backend and visible URL format
//!
//! # Data Flow
//! ```text
//! Router::push ──→ TransitionController::transition_to
//!                      ├── Matcher (routing)
//!                      ├── queue::confirm_queue ──→ Guard::call …
//!                      ├── queue::resolve_hooks_queue ──→ Guard::call …
//!                      └── commit ──→ listener, after hooks, HistoryBackend
//! ```

pub mod components;
pub mod controller;
pub mod errors;
pub mod guard;
pub mod history;
pub mod hooks;
pub mod queue;
pub mod wait;

pub use components::{
    BoxError, ComponentDef, ComponentLoader, ComponentRegistry, ComponentResolver, LazyComponentResolver,
    ViewComponent, ViewInstance,
};
pub use controller::{ReadyCallback, ReadyErrorCallback, TransitionController, UrlAction};
pub use errors::{GuardError, NavigationFailure};
pub use guard::{Guard, InstanceCallback, Next, Proceed};
pub use history::{HistoryBackend, MemoryHistory, UrlFormat};
pub use hooks::{AfterHook, ErrorHook, HookHandle, HookList, RouteListener};
pub use queue::{resolve_queue, RecordDiff};
