//! Per-run orchestration of alert evaluation.
//!
//! One run:
//! 1. fetches every reading of the trailing hour,
//! 2. groups them by field and evaluates fields on a bounded pool,
//! 3. persists all resulting alerts in one atomic write.
//!
//! Only the initial fetch, the final persist and cancellation abort a run.
//! Per-field problems are recorded in the summary and the run moves on.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::drought::detect_drought;
use super::pest::detect_pest_risk;
use crate::error::{EvaluationError, FieldError};
use crate::models::{Alert, EvaluationSummary, Field, SensorReading};
use crate::sensor::SensorKind;
use crate::store::{AlertStore, FieldStore, ReadingStore};

// ---

pub const EVALUATION_WINDOW_HOURS: i64 = 1;

struct FieldOutcome {
    field_id: Uuid,
    result: Result<Vec<Alert>, String>,
}

pub struct AlertAggregator {
    readings: Arc<dyn ReadingStore>,
    fields: Arc<dyn FieldStore>,
    alerts: Arc<dyn AlertStore>,
    concurrency: usize,
}

impl AlertAggregator {
    // ---
    pub fn new(
        readings: Arc<dyn ReadingStore>,
        fields: Arc<dyn FieldStore>,
        alerts: Arc<dyn AlertStore>,
        concurrency: usize,
    ) -> Self {
        Self {
            readings,
            fields,
            alerts,
            concurrency: concurrency.max(1),
        }
    }

    /// Evaluate the trailing hour as of now.
    pub async fn run(&self, cancel: &CancellationToken) -> EvaluationSummary {
        self.run_at(Utc::now(), cancel).await
    }

    /// Evaluate as of `now`. Never fails; failures are reported in the summary.
    pub async fn run_at(&self, now: DateTime<Utc>, cancel: &CancellationToken) -> EvaluationSummary {
        // ---
        let started = Instant::now();
        let mut summary = EvaluationSummary::default();

        if let Err(e) = self.evaluate(now, cancel, &mut summary).await {
            error!("Alert evaluation failed: {}", e);
            summary.success = false;
            summary.alerts_created = 0;
            summary.errors.push(e.to_string());
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            success = summary.success,
            alerts_created = summary.alerts_created,
            fields_processed = summary.fields_processed,
            errors = summary.errors.len(),
            elapsed_ms = summary.elapsed_ms,
            "Alert evaluation finished"
        );
        summary
    }

    async fn evaluate(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
        summary: &mut EvaluationSummary,
    ) -> Result<(), EvaluationError> {
        // ---
        let window_start = now - Duration::hours(EVALUATION_WINDOW_HOURS);
        let recent = self
            .readings
            .readings_in_range(window_start, now)
            .await
            .map_err(EvaluationError::Fetch)?;

        if recent.is_empty() {
            info!("No sensor readings found in the last hour");
            return Ok(());
        }

        let mut by_field: BTreeMap<Uuid, Vec<SensorReading>> = BTreeMap::new();
        for reading in recent {
            by_field.entry(reading.field_id).or_default().push(reading);
        }
        debug!("Evaluating {} fields", by_field.len());

        // A field that has not started by the time of cancellation is skipped;
        // fields already in flight run to completion.
        let evaluated: Vec<Option<FieldOutcome>> = stream::iter(by_field)
            .map(|(field_id, window)| async move {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(self.evaluate_field(field_id, window, now).await)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        if cancel.is_cancelled() {
            return Err(EvaluationError::Cancelled);
        }

        let mut outcomes: Vec<FieldOutcome> = evaluated.into_iter().flatten().collect();
        outcomes.sort_by_key(|o| o.field_id);
        summary.fields_processed = outcomes.len();

        let mut pending = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(alerts) => pending.extend(alerts),
                Err(message) => summary.errors.push(message),
            }
        }

        if !pending.is_empty() {
            self.alerts
                .insert_alerts(&pending)
                .await
                .map_err(EvaluationError::Persist)?;
            info!(
                "Created {} alerts for {} fields",
                pending.len(),
                summary.fields_processed
            );
        }
        summary.alerts_created = pending.len();

        Ok(())
    }

    async fn evaluate_field(
        &self,
        field_id: Uuid,
        window: Vec<SensorReading>,
        now: DateTime<Utc>,
    ) -> FieldOutcome {
        // ---
        let result = match self.fields.field_by_id(field_id).await {
            Ok(Some(field)) => self.field_alerts(&field, &window, now).await.map_err(|e| {
                warn!(%field_id, "Error processing alerts for field: {}", e);
                format!("Error processing field {field_id}: {e}")
            }),
            Ok(None) => {
                warn!(%field_id, "Field not found, skipping alert generation");
                Err(format!("Field {field_id} not found"))
            }
            Err(e) => {
                warn!(%field_id, "Field lookup failed: {}", e);
                Err(format!("Error processing field {field_id}: {e}"))
            }
        };

        FieldOutcome { field_id, result }
    }

    async fn field_alerts(
        &self,
        field: &Field,
        window: &[SensorReading],
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, FieldError> {
        // ---
        // Drought looks at the whole history, not just the current window.
        let history = self
            .readings
            .readings_by_field_and_kind(field.id, SensorKind::SoilMoisture)
            .await?;

        let findings = [detect_drought(&history, now), detect_pest_risk(window)];

        let alerts = findings
            .into_iter()
            .flatten()
            .map(|f| Alert::new(field.id, field.farm_id, f.status, f.message))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(alerts)
    }
}
