//! Two-image comparison endpoint

use axum::{
    extract::{multipart::Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{errors::ApiError, read_uploads};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CompareResponse {
    /// Distance between the two faces; 0 is identical, 2 is opposite
    pub score: f32,
}

/// `POST /api/compare-faces` with multipart fields `image1` and `image2`
pub async fn compare_faces_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<CompareResponse>, ApiError> {
    let mut uploads = read_uploads(multipart).await?;

    let mut take = |field: &str| {
        uploads
            .iter()
            .position(|u| u.field == field)
            .map(|i| uploads.swap_remove(i).image)
            .ok_or_else(|| ApiError::MissingImage(field.to_string()))
    };
    let image1 = take("image1")?;
    let image2 = take("image2")?;

    let score = state.query.compare_faces(&image1, &image2).await?;
    Ok(Json(CompareResponse { score }))
}
