//! Navigation failure types.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

/// Error raised by a guard, a failed component load or a panicking guard.
#[derive(Debug, Clone)]
pub struct GuardError(Arc<dyn std::error::Error + Send + Sync>);

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

impl GuardError {
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Arc::new(err))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    pub fn from_boxed(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self(Arc::from(err))
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::msg(format!("guard panicked: {}", detail))
    }
}

impl std::fmt::Display for GuardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for GuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Why a navigation did not commit.
#[derive(Debug, Clone, Error)]
pub enum NavigationFailure {
    /// Target equals the current route.
    #[error("navigating to current location (\"{to}\") is not allowed")]
    Duplicated { to: String },

    /// A guard answered `Abort`.
    #[error("navigation from \"{from}\" to \"{to}\" was aborted by a guard")]
    Aborted { from: String, to: String },

    /// A guard redirected; the redirect ran as its own navigation.
    #[error("redirected when going from \"{from}\" to \"{to}\" via a navigation guard")]
    Redirected { from: String, to: String, target: String },

    /// A newer navigation superseded this one.
    #[error("navigation to \"{to}\" was cancelled by a newer navigation")]
    Cancelled { to: String },

    /// A guard failed, panicked, or a component could not be loaded.
    #[error("navigation to \"{to}\" failed: {source}")]
    Errored {
        to: String,
        #[source]
        source: GuardError,
    },

    /// A guard dropped its continuation without answering.
    #[error("a guard for \"{to}\" dropped its continuation without answering")]
    Unanswered { to: String },
}

impl NavigationFailure {
    /// Failures delivered to global error hooks.
    pub fn is_error(&self) -> bool {
        matches!(self, NavigationFailure::Errored { .. } | NavigationFailure::Unanswered { .. })
    }

    /// Failures that settle the first-navigation ready state.
    pub(crate) fn settles_ready(&self) -> bool {
        matches!(
            self,
            NavigationFailure::Duplicated { .. }
                | NavigationFailure::Errored { .. }
                | NavigationFailure::Unanswered { .. }
        )
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            NavigationFailure::Duplicated { .. } => "duplicated",
            NavigationFailure::Aborted { .. } => "aborted",
            NavigationFailure::Redirected { .. } => "redirected",
            NavigationFailure::Cancelled { .. } => "cancelled",
            NavigationFailure::Errored { .. } => "errored",
            NavigationFailure::Unanswered { .. } => "unanswered",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let dup = NavigationFailure::Duplicated { to: "/a".into() };
        assert!(!dup.is_error());
        assert!(dup.settles_ready());

        let err = NavigationFailure::Errored {
            to: "/a".into(),
            source: GuardError::msg("boom"),
        };
        assert!(err.is_error());
        assert!(err.to_string().contains("boom"));

        let aborted = NavigationFailure::Aborted {
            from: "/".into(),
            to: "/a".into(),
        };
        assert!(!aborted.is_error());
        assert!(!aborted.settles_ready());
    }

    #[test]
    fn test_panic_payload() {
        let err = GuardError::from_panic(Box::new("bad guard"));
        assert_eq!(err.to_string(), "guard panicked: bad guard");
        let err = GuardError::from_panic(Box::new(String::from("owned")));
        assert_eq!(err.to_string(), "guard panicked: owned");
    }
}
