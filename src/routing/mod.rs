//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup, and on add_routes):
//!     RouteConfig[]
//!     → table.rs (flatten the tree, compile patterns)
//!     → pattern.rs (path template → regex + keys)
//!     → RouteTable (path list, path map, name map)
//!     → atomic swap behind the matcher
//!
//! Resolution (per navigation):
//!     RawLocation
//!     → location.rs (normalize against the current route)
//!     → matcher.rs (named lookup or ordered path scan)
//!     → redirect / alias resolution
//!     → route.rs (immutable Route)
//! ```
//!
//! # Design Decisions
//! - Records are append-only; existing records are never removed
//! - First definition wins for duplicate paths and names
//! - The catch-all `*` is always scanned last
//! - Unmatched targets still produce a Route (with an empty chain)

pub mod error;
pub mod location;
pub mod matcher;
pub mod path;
pub mod pattern;
pub mod query;
pub mod record;
pub mod route;
pub mod table;

use indexmap::IndexMap;

/// Resolved path parameters.
pub type Params = IndexMap<String, String>;

/// Free-form route metadata.
pub type Meta = serde_json::Map<String, serde_json::Value>;

pub use error::{PatternError, RouteConfigError, TableWarning};
pub use location::{normalize_location, Location, RawLocation};
pub use matcher::Matcher;
pub use query::{DefaultQueryCodec, Query, QueryCodec, QueryValue};
pub use record::{RecordId, RouteRecord};
pub use route::{is_included_route, is_same_route, Route, START};
pub use table::RouteTable;
