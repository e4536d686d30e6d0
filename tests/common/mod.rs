//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use nav_router::navigation::{ComponentDef, Guard, MemoryHistory, Next, ViewComponent, ViewInstance};
use nav_router::{RouteConfig, Router, RouterConfig};

/// Ordered log of events observed by guards and hooks.
#[derive(Debug, Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Guard that records `label` and continues.
    pub fn guard(&self, label: &str) -> Guard {
        let events = self.clone();
        let label = label.to_string();
        Guard::sync(move |to, _| {
            events.push(format!("{}:{}", label, to.path));
            Next::Continue
        })
    }
}

/// View component whose guards record into [`Events`].
#[derive(Debug, Clone)]
pub struct RecordingView {
    pub name: &'static str,
    pub events: Events,
}

impl ViewComponent for RecordingView {
    fn leave_guards(&self, _instance: &ViewInstance) -> Vec<Guard> {
        vec![self.events.guard(&format!("leave.{}", self.name))]
    }

    fn update_guards(&self, _instance: &ViewInstance) -> Vec<Guard> {
        vec![self.events.guard(&format!("update.{}", self.name))]
    }

    fn enter_guards(&self) -> Vec<Guard> {
        vec![self.events.guard(&format!("enter.{}", self.name))]
    }
}

#[allow(dead_code)]
pub fn view(name: &'static str, events: &Events) -> ComponentDef {
    ComponentDef::ready(RecordingView {
        name,
        events: events.clone(),
    })
}

/// Router over `routes` with an in-memory history starting at "/".
#[allow(dead_code)]
pub fn router(routes: Vec<RouteConfig>) -> (Router, Arc<MemoryHistory>) {
    router_with(RouterConfig::new(routes))
}

#[allow(dead_code)]
pub fn router_with(config: RouterConfig) -> (Router, Arc<MemoryHistory>) {
    let history = Arc::new(MemoryHistory::default());
    let router = Router::builder(config).history(history.clone()).build().unwrap();
    (router, history)
}

/// Poll `condition` until it holds or a second elapses.
#[allow(dead_code)]
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
