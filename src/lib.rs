//! Client-side navigation router library.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                       ROUTER                         │
//!                    │                                                      │
//!   push / replace   │  ┌──────────┐    ┌────────────┐    ┌─────────────┐   │
//!   ─────────────────┼─▶│  router  │───▶│ navigation │───▶│   routing   │   │
//!                    │  │  facade  │    │ controller │    │   matcher   │   │
//!                    │  └──────────┘    └─────┬──────┘    └──────┬──────┘   │
//!                    │                        │                  │          │
//!                    │                guards, hooks       route table,     │
//!                    │                components          patterns, query  │
//!                    │                        │                             │
//!   visible URL      │                  ┌─────▼──────┐                      │
//!   ◀────────────────┼──────────────────│  history   │                      │
//!                    │                  │  backend   │                      │
//!                    │                  └────────────┘                      │
//!                    │                                                      │
//!                    │  Cross-cutting: config, observability                │
//!                    └──────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod navigation;
pub mod observability;
pub mod router;
pub mod routing;

pub use config::schema::{RouteConfig, RouterConfig};
pub use navigation::{Guard, NavigationFailure, Next, Proceed};
pub use router::{Resolved, Router, RouterBuilder, RouterError};
pub use routing::{Location, RawLocation, Route};
