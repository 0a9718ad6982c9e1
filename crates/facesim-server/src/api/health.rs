//! Health check endpoint for the Facesim Server

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::server::AppState;

/// Health check handler
///
/// Reports `UP` with the number of stored records, or `DOWN` with 503 when
/// the store cannot be reached.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Health check requested");

    match state.store.len().await {
        Ok(records) => (
            StatusCode::OK,
            Json(json!({
                "status": "UP",
                "version": env!("CARGO_PKG_VERSION"),
                "records": records,
            })),
        ),
        Err(err) => {
            warn!(error = %err, "Embedding store is unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "DOWN",
                    "version": env!("CARGO_PKG_VERSION"),
                    "records": null,
                })),
            )
        }
    }
}
