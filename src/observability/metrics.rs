//! Metrics collection.
//!
//! # Responsibilities
//! - Define router metrics (navigations, matches, table size)
//! - Record them through the `metrics` facade
//!
//! # Metrics
//! - `router_navigations_total` (counter): transitions by outcome
//! - `router_matches_total` (counter): match attempts by result
//! - `router_routes_registered` (gauge): paths in the route table
//!
//! # Design Decisions
//! - No exporter is installed here; the host picks one
//! - Recording is a no-op until a recorder is installed

/// Record the outcome of a transition ("committed", "duplicated", ...).
pub fn record_navigation(outcome: &'static str) {
    metrics::counter!("router_navigations_total", "outcome" => outcome).increment(1);
}

/// Record a match attempt.
pub fn record_match(matched: bool) {
    let result = if matched { "hit" } else { "miss" };
    metrics::counter!("router_matches_total", "result" => result).increment(1);
}

/// Record the current number of registered paths.
pub fn record_routes_registered(count: usize) {
    metrics::gauge!("router_routes_registered").set(count as f64);
}
