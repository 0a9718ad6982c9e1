//! Interfaces to the external face detector and embedding extractor
//!
//! Both capabilities are opaque: the core only calls `detect` and `embed`.
//! Implementations are created once and shared, since loading a model is
//! expensive.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::FaceResult;

/// Opaque image bytes with the name of the source they came from
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub source: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { source: None, bytes }
    }

    pub fn named(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source: Some(source.into()),
            bytes,
        }
    }

    /// File stem of the source name (`"jb.jpg"` -> `"jb"`), if any
    pub fn source_stem(&self) -> Option<String> {
        let source = self.source.as_deref()?;
        Path::new(source)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Image payloads are large; keep them out of logs.
impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("source", &self.source)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Pixel rectangle of a detected face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A detected face together with its cropped image
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRegion {
    pub bbox: BoundingBox,
    pub crop: ImageData,
}

/// Finds faces in an image.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Returns zero or more face regions, in the detector's order.
    async fn detect(&self, image: &ImageData) -> FaceResult<Vec<FaceRegion>>;
}

/// Turns a face crop into an embedding vector of fixed dimension.
#[async_trait]
pub trait EmbeddingExtractor: Send + Sync {
    /// Generates the raw (unnormalized) embedding for a face crop.
    async fn embed(&self, face: &ImageData) -> FaceResult<Vec<f32>>;

    /// Dimension of the vectors this extractor produces
    fn dimension(&self) -> usize;
}
