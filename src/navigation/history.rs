//! Externally visible location.
//!
//! # Responsibilities
//! - Define the narrow contract the controller needs from a history facility
//! - Provide an in-memory implementation (stack + index)
//! - Map full paths to visible URLs per history mode, and back
//!
//! # Design Decisions
//! - `push`/`replace` never notify; only `go` does (popstate semantics)
//! - Change notifications use a broadcast channel so any number of
//!   listeners can follow the location

use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::config::schema::HistoryMode;
use crate::routing::path::clean_path;

/// The external location facility.
pub trait HistoryBackend: Send + Sync + std::fmt::Debug {
    /// The visible URL.
    fn current_location(&self) -> String;
    fn push(&self, url: &str);
    fn replace(&self, url: &str);
    /// Move through the entries; out-of-range moves are ignored.
    fn go(&self, delta: isize);
    /// Visible URLs after each `go`.
    fn subscribe(&self) -> broadcast::Receiver<String>;
}

struct Entries {
    stack: Vec<String>,
    index: usize,
}

/// In-memory history.
pub struct MemoryHistory {
    entries: Mutex<Entries>,
    tx: broadcast::Sender<String>,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            entries: Mutex::new(Entries {
                stack: vec![initial.into()],
                index: 0,
            }),
            tx,
        }
    }

    /// All entries and the current index.
    pub fn entries(&self) -> (Vec<String>, usize) {
        let entries = self.entries.lock().expect("history poisoned");
        (entries.stack.clone(), entries.index)
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl std::fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (stack, index) = self.entries();
        f.debug_struct("MemoryHistory")
            .field("stack", &stack)
            .field("index", &index)
            .finish()
    }
}

impl HistoryBackend for MemoryHistory {
    fn current_location(&self) -> String {
        let entries = self.entries.lock().expect("history poisoned");
        entries.stack[entries.index].clone()
    }

    fn push(&self, url: &str) {
        let mut entries = self.entries.lock().expect("history poisoned");
        let keep = entries.index + 1;
        entries.stack.truncate(keep);
        entries.stack.push(url.to_string());
        entries.index = keep;
    }

    fn replace(&self, url: &str) {
        let mut entries = self.entries.lock().expect("history poisoned");
        let index = entries.index;
        entries.stack[index] = url.to_string();
    }

    fn go(&self, delta: isize) {
        let url = {
            let mut entries = self.entries.lock().expect("history poisoned");
            let target = entries.index as isize + delta;
            if delta == 0 || target < 0 || target as usize >= entries.stack.len() {
                return;
            }
            entries.index = target as usize;
            entries.stack[entries.index].clone()
        };
        tracing::trace!(url = %url, delta, "History moved");
        // No subscribers is fine: nothing follows the location yet.
        let _ = self.tx.send(url);
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

/// Converts between full paths and visible URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFormat {
    mode: HistoryMode,
    base: String,
}

impl UrlFormat {
    pub fn new(mode: HistoryMode, base: &str) -> Self {
        Self {
            mode,
            base: normalize_base(base),
        }
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Visible URL of a route's full path.
    pub fn href(&self, full_path: &str) -> String {
        let path = match self.mode {
            HistoryMode::Hash => format!("#{}", full_path),
            HistoryMode::History | HistoryMode::Abstract => full_path.to_string(),
        };
        if self.base.is_empty() {
            path
        } else {
            clean_path(&format!("{}/{}", self.base, path))
        }
    }

    /// Full path encoded in a visible URL.
    pub fn full_path(&self, url: &str) -> String {
        match self.mode {
            HistoryMode::Hash => {
                let hash = url.split_once('#').map(|(_, rest)| rest).unwrap_or("");
                if hash.starts_with('/') {
                    hash.to_string()
                } else {
                    format!("/{}", hash)
                }
            }
            HistoryMode::History | HistoryMode::Abstract => {
                let path = if !self.base.is_empty() && url.starts_with(&self.base) {
                    &url[self.base.len()..]
                } else {
                    url
                };
                match path.chars().next() {
                    None => "/".to_string(),
                    Some('/') => path.to_string(),
                    Some(_) => format!("/{}", path),
                }
            }
        }
    }
}

/// Leading slash, no trailing slash; empty for the root.
fn normalize_base(base: &str) -> String {
    let base = if base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{}", base)
    };
    base.strip_suffix('/').unwrap_or(&base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_truncates_forward_entries() {
        let history = MemoryHistory::new("/");
        history.push("/a");
        history.push("/b");
        history.go(-1);
        history.push("/c");
        assert_eq!(history.entries(), (vec!["/".into(), "/a".into(), "/c".into()], 2));
    }

    #[test]
    fn test_replace_keeps_length() {
        let history = MemoryHistory::new("/");
        history.push("/a");
        history.replace("/b");
        assert_eq!(history.entries(), (vec!["/".into(), "/b".into()], 1));
    }

    #[tokio::test]
    async fn test_go_notifies_in_range_only() {
        let history = MemoryHistory::new("/");
        history.push("/a");
        let mut rx = history.subscribe();

        history.go(5);
        history.go(-1);
        assert_eq!(rx.recv().await.unwrap(), "/");
        assert!(rx.try_recv().is_err());
        assert_eq!(history.current_location(), "/");
    }

    #[test]
    fn test_url_formats() {
        let plain = UrlFormat::new(HistoryMode::History, "/app/");
        assert_eq!(plain.base(), "/app");
        assert_eq!(plain.href("/users?x=1"), "/app/users?x=1");
        assert_eq!(plain.full_path("/app/users?x=1"), "/users?x=1");
        assert_eq!(plain.full_path("/app"), "/");

        let hash = UrlFormat::new(HistoryMode::Hash, "");
        assert_eq!(hash.href("/users"), "#/users");
        assert_eq!(hash.full_path("/index.html#/users"), "/users");
        assert_eq!(hash.full_path("/index.html"), "/");

        let memory = UrlFormat::new(HistoryMode::Abstract, "/");
        assert_eq!(memory.href("/a"), "/a");
        assert_eq!(memory.full_path("/a"), "/a");
    }
}
