//! HTTP gateway: merges every subrouter and binds the shared state.

use std::sync::Arc;

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::alerts::AlertAggregator;
use crate::ingest::Ingestor;
use crate::store::{AlertStore, FieldStore, ReadingStore};

mod alerts;
mod fields;
mod ingestion;

// ---

/// Handles shared by all routes.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub aggregator: Arc<AlertAggregator>,
    pub ingestor: Arc<Ingestor>,
    pub readings: Arc<dyn ReadingStore>,
    pub fields: Arc<dyn FieldStore>,
    pub alerts: Arc<dyn AlertStore>,
    /// Cancelled on shutdown; evaluation runs observe a child token.
    pub shutdown: CancellationToken,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(alerts::router())
        .merge(fields::router())
        .merge(ingestion::router())
        .with_state(state)
}
