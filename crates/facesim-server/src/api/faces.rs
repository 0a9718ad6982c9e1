//! Endpoints over stored faces

use axum::{
    extract::{multipart::Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use facesim_core::IngestionReport;

use super::{errors::ApiError, read_uploads};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct MostSimilarResponse {
    pub label: String,
    /// Closest other stored face, `null` when none exists
    #[serde(rename = "match")]
    pub matched: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// `GET /api/faces/:label/most-similar`
pub async fn most_similar_handler(
    State(state): State<Arc<AppState>>,
    Path(label): Path<String>,
) -> Result<Json<MostSimilarResponse>, ApiError> {
    let best = state.query.find_most_similar(&label).await?;
    Ok(Json(MostSimilarResponse {
        label,
        matched: best.as_ref().map(|n| n.label.clone()),
        score: best.map(|n| n.score),
    }))
}

/// `POST /api/faces/ingest` with one multipart part per image
pub async fn ingest_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<IngestionReport>, ApiError> {
    let images: Vec<_> = read_uploads(multipart)
        .await?
        .into_iter()
        .map(|upload| upload.image)
        .collect();
    if images.is_empty() {
        return Err(ApiError::MissingImage("file".to_string()));
    }

    let report = state.ingestion.ingest_batch(&images).await?;
    info!(
        stored = report.stored.len(),
        failures = report.failures.len(),
        "Ingestion request complete"
    );
    Ok(Json(report))
}
