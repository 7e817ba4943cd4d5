//! Sensor-reading ingestion: single, sequential batch and parallel batch.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::{IngestError, ValidationError};
use crate::models::{BatchSensorReadings, IngestionResponse, NewSensorReading, SensorReading};
use crate::store::ReadingStore;

// ---

pub struct Ingestor {
    readings: Arc<dyn ReadingStore>,
    concurrency: usize,
}

impl Ingestor {
    // ---
    pub fn new(readings: Arc<dyn ReadingStore>, concurrency: usize) -> Self {
        Self {
            readings,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn ingest_single(
        &self,
        reading: NewSensorReading,
    ) -> Result<SensorReading, IngestError> {
        // ---
        let reading = reading.into_reading()?;
        self.readings.insert_reading(&reading).await?;
        info!(
            field_id = %reading.field_id,
            "Ingested single reading: {}", reading.sensor_type
        );
        Ok(reading)
    }

    /// Validate every reading, then store the valid ones in one transaction.
    pub async fn ingest_batch(
        &self,
        batch: BatchSensorReadings,
    ) -> Result<IngestionResponse, IngestError> {
        // ---
        if batch.readings.is_empty() {
            return Err(ValidationError::EmptyBatch.into());
        }

        let started = Instant::now();
        let mut response = IngestionResponse {
            success: true,
            ..Default::default()
        };

        let mut valid = Vec::with_capacity(batch.readings.len());
        for new in batch.readings {
            let field_id = new.field_id;
            match new.into_reading() {
                Ok(reading) => valid.push(reading),
                Err(e) => {
                    warn!(%field_id, "Rejected reading: {}", e);
                    response.failed_count += 1;
                    response.errors.push(format!("Field {field_id}: {e}"));
                }
            }
        }

        if !valid.is_empty() {
            match self.readings.insert_readings(&valid).await {
                Ok(()) => response.processed_count = valid.len(),
                Err(e) => {
                    error!("Error saving batch of readings: {}", e);
                    response.success = false;
                    response.errors.push(format!("Batch save failed: {e}"));
                }
            }
        }

        response.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "Ingested batch: {} processed, {} failed in {}ms",
            response.processed_count, response.failed_count, response.elapsed_ms
        );
        Ok(response)
    }

    /// Validate and store each reading independently, `concurrency` at a time.
    pub async fn ingest_batch_parallel(
        &self,
        batch: BatchSensorReadings,
    ) -> Result<IngestionResponse, IngestError> {
        // ---
        if batch.readings.is_empty() {
            return Err(ValidationError::EmptyBatch.into());
        }

        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(batch.readings.len());

        for new in batch.readings {
            let sem = Arc::clone(&semaphore);
            let store = Arc::clone(&self.readings);
            let field_id = new.field_id;

            let task = tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| format!("Field {field_id}: {e}"))?;
                let reading = new
                    .into_reading()
                    .map_err(|e| format!("Field {field_id}: {e}"))?;
                store
                    .insert_reading(&reading)
                    .await
                    .map_err(|e| format!("Field {field_id}: {e}"))
            });
            tasks.push((field_id, task));
        }

        let mut response = IngestionResponse::default();
        for (field_id, task) in tasks {
            let outcome = match task.await {
                Ok(result) => result,
                Err(e) => Err(format!("Field {field_id}: ingestion task failed: {e}")),
            };
            match outcome {
                Ok(()) => response.processed_count += 1,
                Err(message) => {
                    warn!(%field_id, "Failed to ingest reading: {}", message);
                    response.failed_count += 1;
                    response.errors.push(message);
                }
            }
        }

        response.success = response.failed_count == 0;
        response.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "Parallel batch ingestion completed: {} processed, {} failed in {}ms",
            response.processed_count, response.failed_count, response.elapsed_ms
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::Utc;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    fn new_reading(value: f64) -> NewSensorReading {
        // ---
        NewSensorReading {
            field_id: Uuid::new_v4(),
            sensor_type: "Humidity".to_string(),
            value,
            unit: "%".to_string(),
            reading_timestamp: Utc::now(),
            location: Some("north-gate".to_string()),
            metadata: None,
        }
    }

    fn batch(readings: Vec<NewSensorReading>) -> BatchSensorReadings {
        BatchSensorReadings { readings }
    }

    #[tokio::test]
    async fn single_reading_is_stored() {
        // ---
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(store.clone(), 4);

        let stored = assert_ok!(ingestor.ingest_single(new_reading(55.0)).await);

        assert_eq!(store.readings(), vec![stored]);
    }

    #[tokio::test]
    async fn single_reading_validation_error() {
        // ---
        let ingestor = Ingestor::new(Arc::new(MemoryStore::new()), 4);
        let mut bad = new_reading(55.0);
        bad.unit = String::new();

        let err = ingestor.ingest_single(bad).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Validation(ValidationError::Required("Unit"))
        ));
    }

    #[tokio::test]
    async fn empty_batches_are_rejected() {
        // ---
        let ingestor = Ingestor::new(Arc::new(MemoryStore::new()), 4);

        assert_err!(ingestor.ingest_batch(batch(vec![])).await);
        assert_err!(ingestor.ingest_batch_parallel(batch(vec![])).await);
    }

    #[tokio::test]
    async fn batch_reports_invalid_rows_and_stores_the_rest() {
        // ---
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(store.clone(), 4);
        let mut bad = new_reading(10.0);
        bad.field_id = Uuid::nil();

        let response = ingestor
            .ingest_batch(batch(vec![new_reading(1.0), bad, new_reading(2.0)]))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.processed_count, 2);
        assert_eq!(response.failed_count, 1);
        assert_eq!(
            response.errors,
            vec![format!("Field {}: Field ID is required", Uuid::nil())]
        );
        assert_eq!(store.readings().len(), 2);
    }

    #[tokio::test]
    async fn batch_save_failure_is_reported() {
        // ---
        let store = Arc::new(MemoryStore::new());
        store.fail_writes();
        let ingestor = Ingestor::new(store.clone(), 4);

        let response = ingestor
            .ingest_batch(batch(vec![new_reading(1.0)]))
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.processed_count, 0);
        assert!(response.errors[0].starts_with("Batch save failed"));
    }

    #[tokio::test]
    async fn parallel_batch_stores_every_valid_reading() {
        // ---
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(store.clone(), 3);
        let readings = (0..25).map(|i| new_reading(i as f64)).collect();

        let response = ingestor
            .ingest_batch_parallel(batch(readings))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.processed_count, 25);
        assert_eq!(response.failed_count, 0);
        assert_eq!(store.readings().len(), 25);
    }

    #[tokio::test]
    async fn parallel_batch_failure_marks_response_unsuccessful() {
        // ---
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(store.clone(), 2);
        let mut bad = new_reading(1.0);
        bad.value = f64::INFINITY;

        let response = ingestor
            .ingest_batch_parallel(batch(vec![new_reading(1.0), bad]))
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.processed_count, 1);
        assert_eq!(response.failed_count, 1);
        assert!(response.errors[0].ends_with("Value must be a finite number"));
    }
}
