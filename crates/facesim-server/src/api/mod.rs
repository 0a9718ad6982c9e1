//! API module for the Facesim Server
//!
//! This module contains the API routes and handlers.

use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit},
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub mod compare;
pub mod errors;
pub mod faces;
pub mod health;

use crate::server::AppState;
use errors::ApiError;
use facesim_core::ImageData;

/// Upper bound for an uploaded request body
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Build the router for API endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Face comparison
        .route("/api/compare-faces", post(compare::compare_faces_handler))
        // Stored faces
        .route(
            "/api/faces/:label/most-similar",
            get(faces::most_similar_handler),
        )
        .route("/api/faces/ingest", post(faces::ingest_handler))
        // Health check
        .route("/health", get(health::health_check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        // Shared state
        .with_state(state)
}

/// An uploaded multipart part: its field name and contents
pub struct UploadedImage {
    pub field: String,
    pub image: ImageData,
}

/// Reads every part of a multipart body.
///
/// The image is named after the uploaded file name, falling back to the
/// field name.
pub async fn read_uploads(mut multipart: Multipart) -> Result<Vec<UploadedImage>, ApiError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let source = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| name.clone());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read '{}': {}", name, e)))?;

        uploads.push(UploadedImage {
            field: name,
            image: ImageData::named(source, bytes.to_vec()),
        });
    }
    Ok(uploads)
}
