//! Recognized sensor-type tags and metadata keys.
//!
//! Devices in the field report the same quantity under slightly different
//! names ("Humidity", "AirHumidity", "humidity"). Each condition owns a small
//! alias set and matching is ASCII case-insensitive.

use std::fmt;
use std::str::FromStr;

use crate::models::Metadata;

// ---

/// Sensor kinds the alert detectors care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    SoilMoisture,
    Humidity,
    Temperature,
}

impl SensorKind {
    // ---
    /// Tags accepted for this kind. The first entry is the canonical name.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            SensorKind::SoilMoisture => &["SoilMoisture"],
            SensorKind::Humidity => &["Humidity", "AirHumidity"],
            SensorKind::Temperature => &["Temperature"],
        }
    }

    pub fn canonical(self) -> &'static str {
        self.aliases()[0]
    }

    /// Whether a reading's sensor-type tag belongs to this kind.
    pub fn matches(self, tag: &str) -> bool {
        self.aliases().iter().any(|a| a.eq_ignore_ascii_case(tag))
    }

    /// Lower-cased aliases, for store queries that compare `lower(sensor_type)`.
    pub fn lowercase_aliases(self) -> Vec<String> {
        self.aliases().iter().map(|a| a.to_ascii_lowercase()).collect()
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        [
            SensorKind::SoilMoisture,
            SensorKind::Humidity,
            SensorKind::Temperature,
        ]
        .into_iter()
        .find(|kind| kind.matches(s))
        .ok_or_else(|| format!("unknown sensor type: {s}"))
    }
}

/// Auxiliary readings a device may embed in a reading's metadata map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKey {
    Temperature,
    Humidity,
}

impl MetadataKey {
    // ---
    /// Keys tried verbatim, in precedence order.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            MetadataKey::Temperature => &["Temperature", "temperature"],
            MetadataKey::Humidity => &["Humidity", "humidity"],
        }
    }

    pub fn matches(self, key: &str) -> bool {
        self.aliases().iter().any(|a| a.eq_ignore_ascii_case(key))
    }

    /// Numeric value stored under this key, if any.
    ///
    /// Exact aliases win in [`MetadataKey::aliases`] order; any other casing
    /// is tried afterwards in sorted key order. Values that do not parse as a
    /// finite number are treated as absent.
    pub fn lookup(self, metadata: &Metadata) -> Option<f64> {
        // ---
        let exact = self
            .aliases()
            .iter()
            .filter_map(|alias| metadata.get(*alias))
            .find_map(|raw| parse_number(raw));
        if exact.is_some() {
            return exact;
        }

        let mut other: Vec<(&String, &String)> = metadata
            .iter()
            .filter(|(key, _)| self.matches(key))
            .collect();
        other.sort_unstable_by(|a, b| a.0.cmp(b.0));
        other.into_iter().find_map(|(_, raw)| parse_number(raw))
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
