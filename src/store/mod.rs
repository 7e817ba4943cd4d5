//! Store abstractions consumed by ingestion and alert evaluation.
//!
//! Evaluation code only sees these traits; `main.rs` injects the Postgres
//! implementation and tests inject [`memory::MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Alert, Field, SensorReading};
use crate::sensor::SensorKind;

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::PgStore;

// ---

#[async_trait]
pub trait ReadingStore: Send + Sync {
    // ---
    /// Readings with `start <= timestamp <= end`.
    async fn readings_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, StoreError>;

    /// Every reading of a field whose sensor type is an alias of `kind`.
    async fn readings_by_field_and_kind(
        &self,
        field_id: Uuid,
        kind: SensorKind,
    ) -> Result<Vec<SensorReading>, StoreError>;

    async fn insert_reading(&self, reading: &SensorReading) -> Result<(), StoreError>;

    /// Insert all readings or none of them.
    async fn insert_readings(&self, readings: &[SensorReading]) -> Result<(), StoreError>;
}

#[async_trait]
pub trait FieldStore: Send + Sync {
    async fn field_by_id(&self, id: Uuid) -> Result<Option<Field>, StoreError>;
    async fn insert_field(&self, field: &Field) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    // ---
    /// Persist all alerts in a single atomic write.
    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<(), StoreError>;

    async fn alert_by_id(&self, id: Uuid) -> Result<Option<Alert>, StoreError>;

    /// Write back status, message, active flag and update stamp of an existing alert.
    async fn update_alert(&self, alert: &Alert) -> Result<(), StoreError>;

    /// Alerts for a farm, newest first.
    async fn alerts_by_farm(&self, farm_id: Uuid) -> Result<Vec<Alert>, StoreError>;
}
