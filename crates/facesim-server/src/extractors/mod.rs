//! Clients for the external face detector and embedding extractor

pub mod http;

pub use http::{build_client, HttpEmbeddingExtractor, HttpFaceDetector};
