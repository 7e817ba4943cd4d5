//! In-memory stores for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{AlertStore, FieldStore, ReadingStore};
use crate::error::StoreError;
use crate::models::{Alert, Field, SensorReading};
use crate::sensor::SensorKind;

// ---

#[derive(Default)]
struct State {
    // ---
    readings: Vec<SensorReading>,
    fields: HashMap<Uuid, Field>,
    alerts: Vec<Alert>,
    fail_range_reads: bool,
    fail_writes: bool,
    broken_fields: HashSet<Uuid>,
    cancel_on_lookup: Option<CancellationToken>,
}

/// Implements every store trait over plain collections, with switches to
/// simulate store outages.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&self, field: Field) {
        self.state.lock().unwrap().fields.insert(field.id, field);
    }

    pub fn add_reading(&self, reading: SensorReading) {
        self.state.lock().unwrap().readings.push(reading);
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.state.lock().unwrap().alerts.clone()
    }

    pub fn readings(&self) -> Vec<SensorReading> {
        self.state.lock().unwrap().readings.clone()
    }

    pub fn fail_range_reads(&self) {
        self.state.lock().unwrap().fail_range_reads = true;
    }

    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    /// Cancel `token` from inside the next field lookup.
    pub fn cancel_on_field_lookup(&self, token: CancellationToken) {
        self.state.lock().unwrap().cancel_on_lookup = Some(token);
    }

    /// Make history lookups for one field fail.
    pub fn break_field(&self, field_id: Uuid) {
        self.state.lock().unwrap().broken_fields.insert(field_id);
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("simulated outage".to_string())
}

#[async_trait]
impl ReadingStore for MemoryStore {
    // ---
    async fn readings_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, StoreError> {
        // ---
        let state = self.state.lock().unwrap();
        if state.fail_range_reads {
            return Err(unavailable());
        }
        Ok(state
            .readings
            .iter()
            .filter(|r| r.reading_timestamp >= start && r.reading_timestamp <= end)
            .cloned()
            .collect())
    }

    async fn readings_by_field_and_kind(
        &self,
        field_id: Uuid,
        kind: SensorKind,
    ) -> Result<Vec<SensorReading>, StoreError> {
        // ---
        let state = self.state.lock().unwrap();
        if state.broken_fields.contains(&field_id) {
            return Err(unavailable());
        }
        Ok(state
            .readings
            .iter()
            .filter(|r| r.field_id == field_id && kind.matches(&r.sensor_type))
            .cloned()
            .collect())
    }

    async fn insert_reading(&self, reading: &SensorReading) -> Result<(), StoreError> {
        // ---
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(unavailable());
        }
        state.readings.push(reading.clone());
        Ok(())
    }

    async fn insert_readings(&self, readings: &[SensorReading]) -> Result<(), StoreError> {
        // ---
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(unavailable());
        }
        state.readings.extend_from_slice(readings);
        Ok(())
    }
}

#[async_trait]
impl FieldStore for MemoryStore {
    // ---
    async fn field_by_id(&self, id: Uuid) -> Result<Option<Field>, StoreError> {
        // ---
        let mut state = self.state.lock().unwrap();
        if let Some(token) = state.cancel_on_lookup.take() {
            token.cancel();
        }
        Ok(state.fields.get(&id).cloned())
    }

    async fn insert_field(&self, field: &Field) -> Result<(), StoreError> {
        self.add_field(field.clone());
        Ok(())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    // ---
    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        // ---
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(unavailable());
        }
        state.alerts.extend_from_slice(alerts);
        Ok(())
    }

    async fn alert_by_id(&self, id: Uuid) -> Result<Option<Alert>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .alerts
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn update_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        // ---
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.alerts.iter_mut().find(|a| a.id == alert.id) {
            existing.status = alert.status;
            existing.message = alert.message.clone();
            existing.is_active = alert.is_active;
            existing.updated_at = alert.updated_at;
        }
        Ok(())
    }

    async fn alerts_by_farm(&self, farm_id: Uuid) -> Result<Vec<Alert>, StoreError> {
        // ---
        let mut alerts: Vec<Alert> = self
            .state
            .lock()
            .unwrap()
            .alerts
            .iter()
            .filter(|a| a.farm_id == farm_id)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::AlertStatus;

    #[tokio::test]
    async fn update_alert_writes_back_status_and_message() {
        // ---
        let store = MemoryStore::new();
        let mut alert = Alert::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            AlertStatus::DroughtAlert,
            "dry",
        )
        .unwrap();
        store.insert_alerts(&[alert.clone()]).await.unwrap();

        alert
            .update_status(AlertStatus::Normal, "Soil moisture recovered")
            .unwrap();
        store.update_alert(&alert).await.unwrap();

        let stored = store.alert_by_id(alert.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AlertStatus::Normal);
        assert_eq!(stored.message, "Soil moisture recovered");
        assert_eq!(stored.updated_at, alert.updated_at);
    }
}
