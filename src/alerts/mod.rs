//! Alert evaluation: drought and pest-risk detection over sensor readings.
//!
//! The detectors are pure functions over already-fetched readings. The
//! [`aggregator::AlertAggregator`] fetches data, runs the detectors per field
//! and persists whatever they find in one batch.

pub mod aggregator;
pub mod drought;
pub mod pest;

pub use aggregator::AlertAggregator;

use crate::models::AlertStatus;

// ---

/// A condition reported by a detector, ready to become an alert.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub status: AlertStatus,
    pub message: String,
}
