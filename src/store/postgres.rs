//! Postgres-backed stores (sqlx).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{AlertStore, FieldStore, ReadingStore};
use crate::error::StoreError;
use crate::models::{Alert, Field, Metadata, SensorReading};
use crate::sensor::SensorKind;

// ---

/// Single handle implementing every store trait over one connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReadingRow {
    // ---
    id: Uuid,
    field_id: Uuid,
    sensor_type: String,
    value: f64,
    unit: String,
    reading_timestamp: DateTime<Utc>,
    location: Option<String>,
    metadata: Option<Json<Metadata>>,
}

impl From<ReadingRow> for SensorReading {
    fn from(row: ReadingRow) -> Self {
        SensorReading {
            id: row.id,
            field_id: row.field_id,
            sensor_type: row.sensor_type,
            value: row.value,
            unit: row.unit,
            reading_timestamp: row.reading_timestamp,
            location: row.location,
            metadata: row.metadata.map(|Json(m)| m),
        }
    }
}

#[derive(sqlx::FromRow)]
struct AlertRow {
    // ---
    id: Uuid,
    field_id: Uuid,
    farm_id: Uuid,
    status: String,
    message: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = StoreError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        // ---
        let status = row.status.parse().map_err(StoreError::Corrupt)?;
        Ok(Alert {
            id: row.id,
            field_id: row.field_id,
            farm_id: row.farm_id,
            status,
            message: row.message,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const READING_COLUMNS: &str =
    "id, field_id, sensor_type, value, unit, reading_timestamp, location, metadata";

const ALERT_COLUMNS: &str =
    "id, field_id, farm_id, status, message, is_active, created_at, updated_at";

async fn insert_reading_with<'e, E>(executor: E, reading: &SensorReading) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    // ---
    sqlx::query(
        r#"
        INSERT INTO sensor_readings (
            id, field_id, sensor_type, value, unit,
            reading_timestamp, location, metadata
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(reading.id)
    .bind(reading.field_id)
    .bind(&reading.sensor_type)
    .bind(reading.value)
    .bind(&reading.unit)
    .bind(reading.reading_timestamp)
    .bind(&reading.location)
    .bind(reading.metadata.as_ref().map(Json))
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait]
impl ReadingStore for PgStore {
    // ---
    async fn readings_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, StoreError> {
        // ---
        let rows: Vec<ReadingRow> = sqlx::query_as(&format!(
            "SELECT {READING_COLUMNS} FROM sensor_readings \
             WHERE reading_timestamp >= $1 AND reading_timestamp <= $2 \
             ORDER BY reading_timestamp"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SensorReading::from).collect())
    }

    async fn readings_by_field_and_kind(
        &self,
        field_id: Uuid,
        kind: SensorKind,
    ) -> Result<Vec<SensorReading>, StoreError> {
        // ---
        let rows: Vec<ReadingRow> = sqlx::query_as(&format!(
            "SELECT {READING_COLUMNS} FROM sensor_readings \
             WHERE field_id = $1 AND lower(sensor_type) = ANY($2) \
             ORDER BY reading_timestamp DESC"
        ))
        .bind(field_id)
        .bind(kind.lowercase_aliases())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SensorReading::from).collect())
    }

    async fn insert_reading(&self, reading: &SensorReading) -> Result<(), StoreError> {
        insert_reading_with(&self.pool, reading).await?;
        Ok(())
    }

    async fn insert_readings(&self, readings: &[SensorReading]) -> Result<(), StoreError> {
        // ---
        let mut tx = self.pool.begin().await?;
        for reading in readings {
            insert_reading_with(&mut *tx, reading).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl FieldStore for PgStore {
    // ---
    async fn field_by_id(&self, id: Uuid) -> Result<Option<Field>, StoreError> {
        // ---
        let field = sqlx::query_as::<_, Field>(
            "SELECT id, farm_id, crop_type, planting_date, harvest_date FROM fields WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(field)
    }

    async fn insert_field(&self, field: &Field) -> Result<(), StoreError> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO fields (id, farm_id, crop_type, planting_date, harvest_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(field.id)
        .bind(field.farm_id)
        .bind(&field.crop_type)
        .bind(field.planting_date)
        .bind(field.harvest_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl AlertStore for PgStore {
    // ---
    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        // ---
        let mut tx = self.pool.begin().await?;

        for alert in alerts {
            sqlx::query(
                r#"
                INSERT INTO alerts (
                    id, field_id, farm_id, status, message,
                    is_active, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(alert.id)
            .bind(alert.field_id)
            .bind(alert.farm_id)
            .bind(alert.status.as_str())
            .bind(&alert.message)
            .bind(alert.is_active)
            .bind(alert.created_at)
            .bind(alert.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        // Dropping `tx` on an early return rolls everything back.
        tx.commit().await?;
        Ok(())
    }

    async fn alert_by_id(&self, id: Uuid) -> Result<Option<Alert>, StoreError> {
        // ---
        let row: Option<AlertRow> = sqlx::query_as(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Alert::try_from).transpose()
    }

    async fn update_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        // ---
        sqlx::query(
            "UPDATE alerts SET status = $2, message = $3, is_active = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(alert.id)
        .bind(alert.status.as_str())
        .bind(&alert.message)
        .bind(alert.is_active)
        .bind(alert.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn alerts_by_farm(&self, farm_id: Uuid) -> Result<Vec<Alert>, StoreError> {
        // ---
        let rows: Vec<AlertRow> = sqlx::query_as(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE farm_id = $1 ORDER BY created_at DESC"
        ))
        .bind(farm_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Alert::try_from).collect()
    }
}
