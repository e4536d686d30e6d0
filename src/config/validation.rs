//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every route node carries a path
//! - Validate value ranges (poll interval > 0, base is a plain prefix)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Duplicate paths and names are not errors here; the table builder
//!   reports them as warnings and keeps the first definition

use thiserror::Error;

use crate::config::schema::{RouteConfig, RouterConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route at {at} has no path")]
    MissingPath { at: String },

    #[error("base \"{base}\" must not contain '#' or '?'")]
    InvalidBase { base: String },

    #[error("enter_poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.base.contains('#') || config.base.contains('?') {
        errors.push(ValidationError::InvalidBase {
            base: config.base.clone(),
        });
    }

    if config.enter_poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    for (i, route) in config.routes.iter().enumerate() {
        check_route(route, &format!("routes[{}]", i), &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_route(route: &RouteConfig, at: &str, errors: &mut Vec<ValidationError>) {
    if route.path.is_none() {
        errors.push(ValidationError::MissingPath { at: at.to_string() });
    }
    for (i, child) in route.children.iter().enumerate() {
        check_route(child, &format!("{}.children[{}]", at, i), errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = RouterConfig::new(vec![RouteConfig::new("/")]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RouterConfig::new(vec![
            RouteConfig::new("/a").child(RouteConfig::default()),
            RouteConfig::default(),
        ]);
        config.base = "/app#x".into();
        config.enter_poll_interval_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::MissingPath {
            at: "routes[0].children[0]".into()
        }));
        assert!(errors.contains(&ValidationError::MissingPath { at: "routes[1]".into() }));
        assert!(errors.contains(&ValidationError::ZeroPollInterval));
    }
}
