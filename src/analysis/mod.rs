//! Aggregation engine.
//!
//! Pure functions over an immutable record snapshot: demographic
//! frequencies, average-rank tables and Likert score distributions.

pub mod aggregator;
pub mod frequency;
pub mod likert;
pub mod ranking;

pub use aggregator::*;
