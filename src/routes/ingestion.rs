use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde_json::json;
use tracing::{error, info};

use super::AppState;
use crate::error::IngestError;
use crate::models::{BatchSensorReadings, IngestionResponse, NewSensorReading};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/ingestion/single", post(single))
        .route("/ingestion/batch", post(batch))
        .route("/ingestion/batch/parallel", post(batch_parallel))
}

async fn single(
    State(state): State<AppState>,
    Json(body): Json<NewSensorReading>,
) -> impl IntoResponse {
    // ---
    match state.ingestor.ingest_single(body).await {
        Ok(reading) => (StatusCode::CREATED, Json(reading)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn batch(
    State(state): State<AppState>,
    Json(body): Json<BatchSensorReadings>,
) -> impl IntoResponse {
    // ---
    info!("POST /ingestion/batch - {} readings", body.readings.len());
    batch_response(state.ingestor.ingest_batch(body).await)
}

async fn batch_parallel(
    State(state): State<AppState>,
    Json(body): Json<BatchSensorReadings>,
) -> impl IntoResponse {
    // ---
    info!("POST /ingestion/batch/parallel - {} readings", body.readings.len());
    batch_response(state.ingestor.ingest_batch_parallel(body).await)
}

fn batch_response(result: Result<IngestionResponse, IngestError>) -> axum::response::Response {
    // ---
    match result {
        Ok(response) if response.success => (StatusCode::OK, Json(response)).into_response(),
        Ok(response) => (StatusCode::BAD_REQUEST, Json(response)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

fn error_response(err: IngestError) -> (StatusCode, Json<serde_json::Value>) {
    // ---
    match err {
        IngestError::Validation(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errors": [e.to_string()] })),
        ),
        IngestError::Store(e) => {
            error!("Error ingesting readings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "errors": ["Failed to store readings"] })),
            )
        }
    }
}
