//! Database schema management for `agrosense-alerts`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the database schema (idempotent).
///
/// Creates `fields`, `sensor_readings` and `alerts` plus the indexes the
/// window and per-field queries rely on. Safe to call on every startup.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fields (
            id            UUID PRIMARY KEY,
            farm_id       UUID        NOT NULL,
            crop_type     TEXT        NOT NULL,
            planting_date TIMESTAMPTZ,
            harvest_date  TIMESTAMPTZ
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_readings (
            id                UUID PRIMARY KEY,
            field_id          UUID             NOT NULL,
            sensor_type       VARCHAR(50)      NOT NULL,
            value             DOUBLE PRECISION NOT NULL,
            unit              VARCHAR(20)      NOT NULL,
            reading_timestamp TIMESTAMPTZ      NOT NULL,
            location          VARCHAR(200),
            metadata          JSONB
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id         UUID PRIMARY KEY,
            field_id   UUID        NOT NULL,
            farm_id    UUID        NOT NULL,
            status     TEXT        NOT NULL,
            message    TEXT        NOT NULL,
            is_active  BOOLEAN     NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Trailing-window scans
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_readings_timestamp
            ON sensor_readings (reading_timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Per-field history lookups
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_readings_field_type
            ON sensor_readings (field_id, lower(sensor_type));
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_alerts_farm_id
            ON alerts (farm_id, created_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
