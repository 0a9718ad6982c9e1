//! Facesim Core
//!
//! Face embedding comparison and lookup: vector normalization and distance,
//! a label-keyed embedding store, nearest-neighbor search, and the pipelines
//! that feed images through an external detector and embedding extractor.

pub mod error;
pub mod extraction;
pub mod ingestion;
pub mod memory;
pub mod query;
pub mod record;
pub mod search;
pub mod store;
pub mod vector;

// Deterministic stand-ins for the external capabilities
pub mod test_utils;

// Re-export key types for convenient usage
pub use error::{FaceError, FaceResult};
pub use extraction::{BoundingBox, EmbeddingExtractor, FaceDetector, FaceRegion, ImageData};
pub use ingestion::{
    derive_label, BatchAborted, IngestionFailure, IngestionOrchestrator, IngestionReport,
};
pub use memory::InMemoryEmbeddingStore;
pub use query::QueryService;
pub use record::{EmbeddingRecord, Neighbor};
pub use search::SimilaritySearch;
pub use store::EmbeddingStore;
pub use vector::{distance, format_vector, normalize, parse_vector};
