//! Routing error and warning types.

use thiserror::Error;

/// Fatal problems found while compiling a route configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteConfigError {
    /// A route node has no `path`.
    #[error("\"path\" is required in a route configuration (at {at})")]
    MissingPath { at: String },

    /// The path template could not be compiled.
    #[error("invalid path pattern \"{path}\": {reason}")]
    InvalidPattern { path: String, reason: String },

    /// A component name that the registry does not know.
    #[error("route \"{path}\" references unknown component \"{name}\"")]
    UnknownComponent { path: String, name: String },
}

/// Failures of the path pattern compiler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("invalid path pattern \"{path}\": {reason}")]
    Invalid { path: String, reason: String },

    #[error("missing param \"{name}\" for path \"{path}\"")]
    MissingParam { path: String, name: String },

    #[error("param \"{name}\" of \"{path}\" must match \"{pattern}\", got \"{value}\"")]
    ParamMismatch {
        path: String,
        name: String,
        pattern: String,
        value: String,
    },
}

impl From<PatternError> for RouteConfigError {
    fn from(err: PatternError) -> Self {
        match err {
            PatternError::Invalid { path, reason } => RouteConfigError::InvalidPattern { path, reason },
            other => RouteConfigError::InvalidPattern {
                path: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

/// Non-fatal findings reported while building the route table.
///
/// The later definition is ignored; the table stays usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableWarning {
    DuplicateName { name: String, path: String },
    DuplicatePath { path: String },
    AliasEqualsPath { path: String },
    DuplicateParamKey { path: String, key: String },
    NamedRouteWithDefaultChild { name: String },
    MissingLeadingSlash { path: String },
}

impl std::fmt::Display for TableWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableWarning::DuplicateName { name, path } => {
                write!(f, "duplicate named routes definition: {{ name: \"{name}\", path: \"{path}\" }}")
            }
            TableWarning::DuplicatePath { path } => {
                write!(f, "duplicate path \"{path}\", the first definition wins")
            }
            TableWarning::AliasEqualsPath { path } => {
                write!(f, "found an alias with the same value as the path: \"{path}\", it is ignored")
            }
            TableWarning::DuplicateParamKey { path, key } => {
                write!(f, "duplicate param key \"{key}\" in route with path \"{path}\"")
            }
            TableWarning::NamedRouteWithDefaultChild { name } => write!(
                f,
                "named route \"{name}\" has a default child route; navigating by its name will not render the default child"
            ),
            TableWarning::MissingLeadingSlash { path } => {
                write!(f, "non-nested route \"{path}\" must include a leading slash")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouteConfigError::MissingPath { at: "routes[0].children[1]".into() };
        assert!(err.to_string().contains("routes[0].children[1]"));

        let warn = TableWarning::DuplicateName { name: "user".into(), path: "/u/:id".into() };
        assert!(warn.to_string().contains("\"user\""));
    }
}
