//! Data models for sensor readings, fields and alerts.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AlertError, ValidationError};

// ---

/// Free-form auxiliary values attached to a reading (e.g. embedded temperature).
pub type Metadata = HashMap<String, String>;

const MAX_SENSOR_TYPE_LEN: usize = 50;
const MAX_UNIT_LEN: usize = 20;
const MAX_LOCATION_LEN: usize = 200;

/// A stored sensor reading. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    // ---
    pub id: Uuid,
    pub field_id: Uuid,
    pub sensor_type: String,
    pub value: f64,
    pub unit: String,
    pub reading_timestamp: DateTime<Utc>,
    pub location: Option<String>,
    pub metadata: Option<Metadata>,
}

/// Incoming reading as posted to the ingestion endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSensorReading {
    // ---
    pub field_id: Uuid,
    pub sensor_type: String,
    pub value: f64,
    pub unit: String,
    pub reading_timestamp: DateTime<Utc>,
    pub location: Option<String>,
    pub metadata: Option<Metadata>,
}

impl NewSensorReading {
    // ---
    pub fn validate(&self) -> Result<(), ValidationError> {
        // ---
        if self.field_id.is_nil() {
            return Err(ValidationError::Required("Field ID"));
        }
        check_text("Sensor type", &self.sensor_type, MAX_SENSOR_TYPE_LEN)?;
        check_text("Unit", &self.unit, MAX_UNIT_LEN)?;
        if !self.value.is_finite() {
            return Err(ValidationError::NotFinite);
        }
        if let Some(location) = &self.location {
            if location.chars().count() > MAX_LOCATION_LEN {
                return Err(ValidationError::TooLong {
                    field: "Location",
                    max: MAX_LOCATION_LEN,
                });
            }
        }
        Ok(())
    }

    /// Validate and assign an identity.
    pub fn into_reading(self) -> Result<SensorReading, ValidationError> {
        // ---
        self.validate()?;
        Ok(SensorReading {
            id: Uuid::new_v4(),
            field_id: self.field_id,
            sensor_type: self.sensor_type.trim().to_string(),
            value: self.value,
            unit: self.unit.trim().to_string(),
            reading_timestamp: self.reading_timestamp,
            location: self.location,
            metadata: self.metadata,
        })
    }
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    // ---
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Body of the batch ingestion endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchSensorReadings {
    #[serde(default)]
    pub readings: Vec<NewSensorReading>,
}

/// Outcome of a batch ingestion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionResponse {
    // ---
    pub success: bool,
    pub processed_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
    pub elapsed_ms: u64,
}

/// A cultivated field. Only its owning farm matters to alert evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Field {
    // ---
    pub id: Uuid,
    pub farm_id: Uuid,
    pub crop_type: String,
    pub planting_date: Option<DateTime<Utc>>,
    pub harvest_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewField {
    // ---
    pub farm_id: Uuid,
    pub crop_type: String,
    pub planting_date: Option<DateTime<Utc>>,
    pub harvest_date: Option<DateTime<Utc>>,
}

impl NewField {
    pub fn into_field(self) -> Result<Field, ValidationError> {
        // ---
        if self.farm_id.is_nil() {
            return Err(ValidationError::Required("Farm ID"));
        }
        if self.crop_type.trim().is_empty() {
            return Err(ValidationError::Required("Crop type"));
        }
        Ok(Field {
            id: Uuid::new_v4(),
            farm_id: self.farm_id,
            crop_type: self.crop_type.trim().to_string(),
            planting_date: self.planting_date,
            harvest_date: self.harvest_date,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    Normal,
    DroughtAlert,
    PestRisk,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Normal => "Normal",
            AlertStatus::DroughtAlert => "DroughtAlert",
            AlertStatus::PestRisk => "PestRisk",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(AlertStatus::Normal),
            "DroughtAlert" => Ok(AlertStatus::DroughtAlert),
            "PestRisk" => Ok(AlertStatus::PestRisk),
            other => Err(format!("unknown alert status: {other}")),
        }
    }
}

/// An alert raised for a field.
///
/// Only [`Alert::new`] creates alerts, so every alert carries non-nil field
/// and farm ids and a non-empty message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    // ---
    pub id: Uuid,
    pub field_id: Uuid,
    pub farm_id: Uuid,
    pub status: AlertStatus,
    pub message: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Alert {
    // ---
    pub fn new(
        field_id: Uuid,
        farm_id: Uuid,
        status: AlertStatus,
        message: impl Into<String>,
    ) -> Result<Self, AlertError> {
        // ---
        let message = message.into();
        if field_id.is_nil() {
            return Err(AlertError::Empty("Field ID"));
        }
        if farm_id.is_nil() {
            return Err(AlertError::Empty("Farm ID"));
        }
        if message.trim().is_empty() {
            return Err(AlertError::Empty("Message"));
        }

        Ok(Alert {
            id: Uuid::new_v4(),
            field_id,
            farm_id,
            status,
            message,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        })
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Some(Utc::now());
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Some(Utc::now());
    }

    /// Replace status and message. A blank message leaves the alert untouched.
    pub fn update_status(
        &mut self,
        status: AlertStatus,
        message: impl Into<String>,
    ) -> Result<(), AlertError> {
        // ---
        let message = message.into();
        if message.trim().is_empty() {
            return Err(AlertError::Empty("Message"));
        }
        self.status = status;
        self.message = message;
        self.updated_at = Some(Utc::now());
        Ok(())
    }
}

/// Result of one alert evaluation run, returned to the invoking scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    // ---
    pub success: bool,
    pub alerts_created: usize,
    pub fields_processed: usize,
    pub errors: Vec<String>,
    pub elapsed_ms: u64,
}

impl Default for EvaluationSummary {
    fn default() -> Self {
        Self {
            success: true,
            alerts_created: 0,
            fields_processed: 0,
            errors: Vec::new(),
            elapsed_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn new_reading() -> NewSensorReading {
        // ---
        NewSensorReading {
            field_id: Uuid::new_v4(),
            sensor_type: "SoilMoisture".to_string(),
            value: 42.0,
            unit: "%".to_string(),
            reading_timestamp: Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap(),
            location: None,
            metadata: None,
        }
    }

    #[test]
    fn test_valid_reading_passes() {
        // ---
        let raw = new_reading();
        let field_id = raw.field_id;
        let reading = raw.into_reading().unwrap();

        assert_eq!(reading.field_id, field_id);
        assert_eq!(reading.sensor_type, "SoilMoisture");
        assert_eq!(reading.value, 42.0);
        assert!(!reading.id.is_nil());
    }

    #[test]
    fn test_reading_validation_rules() {
        // ---
        let mut nil_field = new_reading();
        nil_field.field_id = Uuid::nil();
        assert_eq!(
            nil_field.validate(),
            Err(ValidationError::Required("Field ID"))
        );

        let mut blank_type = new_reading();
        blank_type.sensor_type = "   ".to_string();
        assert_eq!(
            blank_type.validate(),
            Err(ValidationError::Required("Sensor type"))
        );

        let mut long_unit = new_reading();
        long_unit.unit = "u".repeat(21);
        assert_eq!(
            long_unit.validate(),
            Err(ValidationError::TooLong {
                field: "Unit",
                max: 20
            })
        );

        let mut long_location = new_reading();
        long_location.location = Some("x".repeat(201));
        assert!(long_location.validate().is_err());

        let mut nan = new_reading();
        nan.value = f64::NAN;
        assert_eq!(nan.validate(), Err(ValidationError::NotFinite));
    }

    #[test]
    fn test_alert_requires_ids_and_message() {
        // ---
        let field = Uuid::new_v4();
        let farm = Uuid::new_v4();

        assert_eq!(
            Alert::new(Uuid::nil(), farm, AlertStatus::PestRisk, "x"),
            Err(AlertError::Empty("Field ID"))
        );
        assert_eq!(
            Alert::new(field, Uuid::nil(), AlertStatus::PestRisk, "x"),
            Err(AlertError::Empty("Farm ID"))
        );
        assert_eq!(
            Alert::new(field, farm, AlertStatus::PestRisk, "  "),
            Err(AlertError::Empty("Message"))
        );

        let alert = Alert::new(field, farm, AlertStatus::DroughtAlert, "dry").unwrap();
        assert!(alert.is_active);
        assert_eq!(alert.updated_at, None);
    }

    #[test]
    fn test_alert_lifecycle_stamps_updates() {
        // ---
        let mut alert = Alert::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            AlertStatus::PestRisk,
            "humid",
        )
        .unwrap();

        alert.deactivate();
        assert!(!alert.is_active);
        assert!(alert.updated_at.is_some());

        alert.activate();
        assert!(alert.is_active);
        assert!(alert.updated_at.is_some());
    }

    #[test]
    fn test_update_status_requires_message() {
        // ---
        let mut alert = Alert::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            AlertStatus::PestRisk,
            "humid",
        )
        .unwrap();
        let before = alert.clone();

        assert_eq!(
            alert.update_status(AlertStatus::Normal, " "),
            Err(AlertError::Empty("Message"))
        );
        assert_eq!(alert, before);

        alert
            .update_status(AlertStatus::Normal, "Conditions back to normal")
            .unwrap();
        assert_eq!(alert.status, AlertStatus::Normal);
        assert_eq!(alert.message, "Conditions back to normal");
        assert!(alert.updated_at.is_some());
        assert!(alert.is_active);
    }

    #[test]
    fn test_status_round_trips_through_text() {
        // ---
        for status in [
            AlertStatus::Normal,
            AlertStatus::DroughtAlert,
            AlertStatus::PestRisk,
        ] {
            assert_eq!(status.as_str().parse::<AlertStatus>(), Ok(status));
        }
        assert!("Flood".parse::<AlertStatus>().is_err());
    }
}
