//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated)
//!     → Router::new (compiles routes, picks history strategy)
//!
//! Programmatic setup:
//!     RouterConfig::new(routes) + RouteConfig builders
//!     → guards, dynamic redirects and component definitions attached in code
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Component names in files resolve through a host-supplied registry

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{HistoryMode, PropsConfig, Redirect, RouteConfig, RouterConfig};
