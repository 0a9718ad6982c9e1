//! Error handling for the Facesim API
//!
//! Every failure is rendered as
//! `{"error": msg, "errorDetails": {"errorCode": CODE, "errorMessage": msg}}`.
//! An aborted ingestion also carries the `stored` labels and `failures` of
//! the partial run.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::{error, warn};

use facesim_core::{BatchAborted, FaceError};

/// API Error type for returning standard error responses
#[derive(Debug)]
pub enum ApiError {
    /// A required multipart field is missing (400)
    MissingImage(String),
    /// Request could not be read (400)
    BadRequest(String),
    /// Failure from the face pipeline or store
    Face(FaceError),
    /// Ingestion batch stopped by a store failure
    IngestionAborted(BatchAborted),
}

impl From<FaceError> for ApiError {
    fn from(err: FaceError) -> Self {
        ApiError::Face(err)
    }
}

impl From<BatchAborted> for ApiError {
    fn from(aborted: BatchAborted) -> Self {
        ApiError::IngestionAborted(aborted)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::MissingImage(field) => write!(f, "Missing image: {}", field),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Face(err) => write!(f, "{}", err),
            ApiError::IngestionAborted(aborted) => write!(f, "{}", aborted),
        }
    }
}

/// Caller-facing message for a pipeline or store failure. Store internals
/// and stored vectors stay out of responses.
fn face_error_message(err: &FaceError) -> String {
    match err {
        FaceError::MalformedVector(_) => "Stored embedding could not be decoded".to_string(),
        FaceError::StoreUnavailable(_) => "Embedding store unavailable".to_string(),
        other => other.to_string(),
    }
}

/// HTTP status for a pipeline or store failure
pub fn face_error_status(err: &FaceError) -> StatusCode {
    match err {
        FaceError::DegenerateVector
        | FaceError::DimensionMismatch { .. }
        | FaceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        FaceError::RecordNotFound(_) => StatusCode::NOT_FOUND,
        FaceError::ExternalExtractionFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FaceError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        FaceError::MalformedVector(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match &self {
            ApiError::MissingImage(field) => (
                StatusCode::BAD_REQUEST,
                "ERR_MISSING_IMAGE",
                format!("Missing image field '{}'", field),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "ERR_BAD_REQUEST", msg.clone()),
            ApiError::Face(err) => (
                face_error_status(err),
                err.reason(),
                face_error_message(err),
            ),
            ApiError::IngestionAborted(aborted) => (
                face_error_status(&aborted.error),
                aborted.error.reason(),
                face_error_message(&aborted.error),
            ),
        };

        if status.is_server_error() {
            error!(error = %self, error_code, "Request failed");
        } else {
            warn!(error = %self, error_code, "Request rejected");
        }

        let mut body = json!({
            "error": message,
            "errorDetails": {
                "errorCode": error_code,
                "errorMessage": message,
            }
        });
        if let ApiError::IngestionAborted(aborted) = &self {
            body["images_processed"] = json!(aborted.report.images_processed);
            body["stored"] = json!(aborted.report.stored);
            body["failures"] = json!(aborted.report.failures);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            face_error_status(&FaceError::RecordNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            face_error_status(&FaceError::extraction("no face")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            face_error_status(&FaceError::store_unavailable("down")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            face_error_status(&FaceError::DegenerateVector),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            face_error_status(&FaceError::MalformedVector("[1,".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_malformed_vector_message_is_hidden() {
        let response =
            ApiError::from(FaceError::MalformedVector("[0.25,abc]".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errorDetails"]["errorCode"], "MALFORMED_VECTOR");
        assert!(!body["error"].as_str().unwrap().contains("0.25"));
    }

    #[tokio::test]
    async fn test_store_unavailable_message_is_generic() {
        let response = ApiError::from(FaceError::store_unavailable(
            "Failed to upsert embedding: relation \"face_embeddings\" does not exist",
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errorDetails"]["errorCode"], "STORE_UNAVAILABLE");
        assert_eq!(body["error"], "Embedding store unavailable");
        assert!(!bytes.windows(15).any(|w| w == b"face_embeddings"));
    }
}
