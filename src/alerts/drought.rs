//! Drought detection from soil-moisture history.
//!
//! A field is in drought when every soil-moisture reading of the trailing
//! day is strictly below [`DROUGHT_THRESHOLD_PERCENT`]. Fields whose history
//! spans less than a day are never flagged.

use chrono::{DateTime, Duration, Utc};

use super::Finding;
use crate::models::{AlertStatus, SensorReading};

// ---

pub const DROUGHT_THRESHOLD_PERCENT: f64 = 30.0;
pub const DROUGHT_DURATION_HOURS: i64 = 24;

pub fn drought_duration() -> Duration {
    Duration::hours(DROUGHT_DURATION_HOURS)
}

/// Evaluate a field's full soil-moisture history as of `now`.
pub fn detect_drought(history: &[SensorReading], now: DateTime<Utc>) -> Option<Finding> {
    // ---
    let newest = history.iter().map(|r| r.reading_timestamp).max()?;
    let oldest = history.iter().map(|r| r.reading_timestamp).min()?;

    if newest - oldest < drought_duration() {
        return None;
    }

    let cutoff = now - drought_duration();
    let mut recent = history
        .iter()
        .filter(|r| r.reading_timestamp >= cutoff)
        .map(|r| r.value)
        .peekable();

    recent.peek()?;

    let mut lowest = f64::INFINITY;
    let all_below = recent.all(|value| {
        lowest = lowest.min(value);
        value < DROUGHT_THRESHOLD_PERCENT
    });

    if !all_below {
        return None;
    }

    Some(Finding {
        status: AlertStatus::DroughtAlert,
        message: format!(
            "Soil moisture below {:.1}% for more than {} hours. Current value: {:.2}%",
            DROUGHT_THRESHOLD_PERCENT, DROUGHT_DURATION_HOURS, lowest
        ),
    })
}
