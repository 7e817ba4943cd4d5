//! Alert routes: trigger an evaluation run, list, toggle and re-status alerts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use super::AppState;
use crate::models::{Alert, AlertStatus};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/alerts/evaluate", post(evaluate))
        .route("/alerts/{alert_id}/activate", post(activate))
        .route("/alerts/{alert_id}/deactivate", post(deactivate))
        .route("/alerts/{alert_id}/status", put(update_status))
        .route("/farms/{farm_id}/alerts", get(by_farm))
}

/// Handle `POST /alerts/evaluate`, called by the external scheduler.
async fn evaluate(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    info!("POST /alerts/evaluate - Starting alert evaluation");

    let cancel = state.shutdown.child_token();
    let summary = state.aggregator.run(&cancel).await;

    let status = if summary.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(summary))
}

async fn by_farm(
    Path(farm_id): Path<Uuid>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    match state.alerts.alerts_by_farm(farm_id).await {
        Ok(alerts) => (StatusCode::OK, Json(alerts)).into_response(),
        Err(e) => {
            error!(%farm_id, "Failed to load alerts: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load alerts" })),
            )
                .into_response()
        }
    }
}

async fn activate(Path(alert_id): Path<Uuid>, State(state): State<AppState>) -> impl IntoResponse {
    set_active(&state, alert_id, true).await
}

async fn deactivate(
    Path(alert_id): Path<Uuid>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    set_active(&state, alert_id, false).await
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: AlertStatus,
    message: String,
}

/// Handle `PUT /alerts/{alert_id}/status`.
async fn update_status(
    Path(alert_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    // ---
    let mut alert = match load_alert(&state, alert_id).await {
        Ok(alert) => alert,
        Err(response) => return response,
    };

    if let Err(e) = alert.update_status(update.status, update.message) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    info!(%alert_id, "Alert status changed to {}", alert.status);
    save_alert(&state, alert).await
}

async fn set_active(state: &AppState, alert_id: Uuid, active: bool) -> Response {
    // ---
    let mut alert = match load_alert(state, alert_id).await {
        Ok(alert) => alert,
        Err(response) => return response,
    };

    if active {
        alert.activate();
    } else {
        alert.deactivate();
    }

    save_alert(state, alert).await
}

async fn load_alert(state: &AppState, alert_id: Uuid) -> Result<Alert, Response> {
    // ---
    match state.alerts.alert_by_id(alert_id).await {
        Ok(Some(alert)) => Ok(alert),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Alert {alert_id} not found") })),
        )
            .into_response()),
        Err(e) => {
            error!(%alert_id, "Failed to load alert: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load alert" })),
            )
                .into_response())
        }
    }
}

async fn save_alert(state: &AppState, alert: Alert) -> Response {
    // ---
    let alert_id = alert.id;
    match state.alerts.update_alert(&alert).await {
        Ok(()) => (StatusCode::OK, Json(alert)).into_response(),
        Err(e) => {
            error!(%alert_id, "Failed to update alert: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to update alert" })),
            )
                .into_response()
        }
    }
}
