//! Community needs, offers, and ideas tracking.
//!
//! The [`submissions`] module owns the data model, the aggregation and matching
//! heuristics, and the HTTP router; [`config`], [`telemetry`], and [`error`] carry the
//! service plumbing shared with the API binary.

pub mod config;
pub mod error;
pub mod submissions;
pub mod telemetry;
