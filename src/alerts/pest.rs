//! Pest-risk detection from one field's readings in the current window.
//!
//! Checks run in order and the first match wins:
//! 1. mean of humidity readings above [`HUMIDITY_AVERAGE_THRESHOLD`];
//! 2. a metadata temperature above [`HEAT_TEMPERATURE_THRESHOLD`] while some
//!    humidity reading exceeds [`HEAT_HUMIDITY_THRESHOLD`];
//! 3. a metadata humidity above [`METADATA_HUMIDITY_THRESHOLD`].

use super::Finding;
use crate::models::{AlertStatus, SensorReading};
use crate::sensor::{MetadataKey, SensorKind};

// ---

pub const HUMIDITY_AVERAGE_THRESHOLD: f64 = 80.0;
pub const HEAT_TEMPERATURE_THRESHOLD: f64 = 30.0;
pub const HEAT_HUMIDITY_THRESHOLD: f64 = 70.0;
pub const METADATA_HUMIDITY_THRESHOLD: f64 = 80.0;

pub fn detect_pest_risk(window: &[SensorReading]) -> Option<Finding> {
    // ---
    let humidity: Vec<f64> = window
        .iter()
        .filter(|r| SensorKind::Humidity.matches(&r.sensor_type))
        .map(|r| r.value)
        .collect();

    if !humidity.is_empty() {
        let average = humidity.iter().sum::<f64>() / humidity.len() as f64;
        if average > HUMIDITY_AVERAGE_THRESHOLD {
            return Some(pest_risk(format!(
                "High air humidity detected ({average:.2}%). \
                 Conditions favorable for pest development."
            )));
        }
    }

    let peak_humidity = humidity.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if peak_humidity > HEAT_HUMIDITY_THRESHOLD {
        let hot = metadata_values(window, MetadataKey::Temperature)
            .find(|t| *t > HEAT_TEMPERATURE_THRESHOLD);
        if let Some(temperature) = hot {
            return Some(pest_risk(format!(
                "High temperature ({temperature:.2}°C) and humidity ({peak_humidity:.2}%) \
                 detected. Pest risk conditions present."
            )));
        }
    }

    metadata_values(window, MetadataKey::Humidity)
        .find(|h| *h > METADATA_HUMIDITY_THRESHOLD)
        .map(|h| {
            pest_risk(format!(
                "High humidity detected in metadata ({h:.2}%). Pest risk conditions present."
            ))
        })
}

fn metadata_values(
    window: &[SensorReading],
    key: MetadataKey,
) -> impl Iterator<Item = f64> + '_ {
    window
        .iter()
        .filter_map(|r| r.metadata.as_ref())
        .filter_map(move |m| key.lookup(m))
}

fn pest_risk(message: String) -> Finding {
    Finding {
        status: AlertStatus::PestRisk,
        message,
    }
}
