//! Error types for the Facesim core

use thiserror::Error;

/// Errors raised by the normalizer, distance engine, stores and pipelines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaceError {
    #[error("Degenerate vector: zero or non-finite norm")]
    DegenerateVector,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("External extraction failure: {0}")]
    ExternalExtractionFailure(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Malformed vector: {0}")]
    MalformedVector(String),
}

/// Result type for core operations
pub type FaceResult<T> = Result<T, FaceError>;

impl FaceError {
    /// Stable machine-readable reason code for caller-facing failures
    pub fn reason(&self) -> &'static str {
        match self {
            FaceError::DegenerateVector => "DEGENERATE_VECTOR",
            FaceError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            FaceError::RecordNotFound(_) => "RECORD_NOT_FOUND",
            FaceError::InvalidArgument(_) => "INVALID_ARGUMENT",
            FaceError::ExternalExtractionFailure(_) => "EXTERNAL_EXTRACTION_FAILURE",
            FaceError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            FaceError::MalformedVector(_) => "MALFORMED_VECTOR",
        }
    }

    /// Helper to create an extraction failure
    pub fn extraction(message: impl Into<String>) -> Self {
        FaceError::ExternalExtractionFailure(message.into())
    }

    /// Helper to create a store failure
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        FaceError::StoreUnavailable(message.into())
    }

    /// Whether a batch may skip this error and continue with the next item.
    /// Store failures are not item scoped.
    pub fn is_item_scoped(&self) -> bool {
        matches!(
            self,
            FaceError::ExternalExtractionFailure(_)
                | FaceError::DegenerateVector
                | FaceError::DimensionMismatch { .. }
                | FaceError::InvalidArgument(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_error_display() {
        let error = FaceError::DimensionMismatch { expected: 768, actual: 512 };
        assert_eq!(format!("{}", error), "Dimension mismatch: expected 768, got 512");

        let error = FaceError::RecordNotFound("pb_face_0".into());
        assert_eq!(format!("{}", error), "Record not found: pb_face_0");
    }

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(FaceError::DegenerateVector.reason(), "DEGENERATE_VECTOR");
        assert_eq!(FaceError::extraction("no face").reason(), "EXTERNAL_EXTRACTION_FAILURE");
        assert_eq!(FaceError::store_unavailable("down").reason(), "STORE_UNAVAILABLE");
        assert_eq!(FaceError::InvalidArgument("k".into()).reason(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_item_scoped_errors() {
        assert!(FaceError::extraction("timeout").is_item_scoped());
        assert!(FaceError::DegenerateVector.is_item_scoped());
        assert!(!FaceError::store_unavailable("pool closed").is_item_scoped());
        assert!(!FaceError::RecordNotFound("x".into()).is_item_scoped());
    }
}
