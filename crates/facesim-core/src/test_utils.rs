//! Deterministic detector and extractor stand-ins
//!
//! These let the pipelines run in tests and local development without the
//! real image-processing stack.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::error::{FaceError, FaceResult};
use crate::extraction::{BoundingBox, EmbeddingExtractor, FaceDetector, FaceRegion, ImageData};

/// Byte separating faces in a stub image
pub const FACE_SEPARATOR: u8 = b'|';

/// Treats the image bytes as `|`-separated face crops.
///
/// `b"alice|bob"` holds two faces whose crops are `b"alice"` and `b"bob"`;
/// an image without any non-empty segment holds no face.
#[derive(Debug, Clone, Default)]
pub struct StubFaceDetector {
    failing: HashSet<Vec<u8>>,
}

impl StubFaceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `detect` fail for images with exactly these bytes
    pub fn failing_on(mut self, image: impl AsRef<[u8]>) -> Self {
        self.failing.insert(image.as_ref().to_vec());
        self
    }
}

#[async_trait]
impl FaceDetector for StubFaceDetector {
    async fn detect(&self, image: &ImageData) -> FaceResult<Vec<FaceRegion>> {
        if self.failing.contains(&image.bytes) {
            return Err(FaceError::extraction("stub detector failure"));
        }

        let mut x = 0u32;
        let regions = image
            .bytes
            .split(|&b| b == FACE_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let region = FaceRegion {
                    bbox: BoundingBox {
                        x,
                        y: 0,
                        width: 100,
                        height: 100,
                    },
                    crop: ImageData::new(segment.to_vec()),
                };
                x += 100;
                region
            })
            .collect();
        Ok(regions)
    }
}

/// Produces deterministic embeddings from crop bytes.
///
/// Known crops can be pinned to exact vectors; other crops get a
/// pseudo-random vector seeded by their bytes.
#[derive(Debug, Clone)]
pub struct StubEmbeddingExtractor {
    dimension: usize,
    pinned: HashMap<Vec<u8>, Vec<f32>>,
    failing: HashSet<Vec<u8>>,
}

impl StubEmbeddingExtractor {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            pinned: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    /// Return `vector` whenever the crop equals `crop`
    pub fn with_vector(mut self, crop: impl AsRef<[u8]>, vector: Vec<f32>) -> Self {
        self.pinned.insert(crop.as_ref().to_vec(), vector);
        self
    }

    /// Make `embed` fail for this crop
    pub fn failing_on(mut self, crop: impl AsRef<[u8]>) -> Self {
        self.failing.insert(crop.as_ref().to_vec());
        self
    }

    fn seeded_vector(&self, bytes: &[u8]) -> Vec<f32> {
        // FNV-1a over the bytes, then an LCG per component
        let mut seed = bytes.iter().fold(0xcbf29ce484222325u64, |acc, &b| {
            (acc ^ b as u64).wrapping_mul(0x100000001b3)
        });

        (0..self.dimension)
            .map(|_| {
                seed = seed
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((seed >> 32) as f32) / (u32::MAX as f32) * 2.0 - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingExtractor for StubEmbeddingExtractor {
    async fn embed(&self, face: &ImageData) -> FaceResult<Vec<f32>> {
        if self.failing.contains(&face.bytes) {
            return Err(FaceError::extraction("stub extractor failure"));
        }
        if let Some(vector) = self.pinned.get(&face.bytes) {
            return Ok(vector.clone());
        }
        Ok(self.seeded_vector(&face.bytes))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
