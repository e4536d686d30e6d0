//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Every transition runs in a span carrying its navigation_id,
//! so guard and hook events correlate without extra plumbing.
//! ```
//!
//! # Design Decisions
//! - Navigation ID (UUID v4) flows through all navigation events
//! - Metrics are cheap (facade calls, no-op without a recorder)

pub mod logging;
pub mod metrics;
