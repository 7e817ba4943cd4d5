use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};
use uuid::Uuid;

use super::AppState;
use crate::models::NewField;
use crate::sensor::SensorKind;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/fields", post(create))
        .route("/fields/{field_id}", get(by_id))
        .route("/fields/{field_id}/readings", get(readings))
}

async fn create(State(state): State<AppState>, Json(body): Json<NewField>) -> impl IntoResponse {
    // ---
    let field = match body.into_field() {
        Ok(field) => field,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
                .into_response();
        }
    };

    match state.fields.insert_field(&field).await {
        Ok(()) => (StatusCode::CREATED, Json(field)).into_response(),
        Err(e) => {
            error!("Failed to store field: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to store field" })),
            )
                .into_response()
        }
    }
}

async fn by_id(Path(field_id): Path<Uuid>, State(state): State<AppState>) -> impl IntoResponse {
    // ---
    match state.fields.field_by_id(field_id).await {
        Ok(Some(field)) => (StatusCode::OK, Json(field)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Field {field_id} not found") })),
        )
            .into_response(),
        Err(e) => {
            error!(%field_id, "Failed to load field: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load field" })),
            )
                .into_response()
        }
    }
}

/// Query parameters for `GET /fields/{field_id}/readings`
#[derive(Debug, Deserialize)]
struct ReadingsQuery {
    /// Any recognized alias, e.g. `SoilMoisture` or `AirHumidity`.
    sensor_type: String,
}

async fn readings(
    Path(field_id): Path<Uuid>,
    Query(params): Query<ReadingsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    debug!(%field_id, "Readings query: {:?}", params);

    let kind: SensorKind = match params.sensor_type.parse() {
        Ok(kind) => kind,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e }))).into_response();
        }
    };

    match state.readings.readings_by_field_and_kind(field_id, kind).await {
        Ok(readings) => (StatusCode::OK, Json(readings)).into_response(),
        Err(e) => {
            error!(%field_id, %kind, "Failed to load readings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load readings" })),
            )
                .into_response()
        }
    }
}
