//! Boundary operations invoked by external callers
//!
//! `compare_faces` scores two fresh images against each other;
//! `find_most_similar` looks up the closest stored face to a stored label.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{FaceError, FaceResult};
use crate::extraction::{EmbeddingExtractor, FaceDetector, ImageData};
use crate::record::Neighbor;
use crate::search::SimilaritySearch;
use crate::store::EmbeddingStore;
use crate::vector::distance;

/// Query surface over the external pipeline and the embedding store.
#[derive(Clone)]
pub struct QueryService {
    detector: Arc<dyn FaceDetector>,
    extractor: Arc<dyn EmbeddingExtractor>,
    search: SimilaritySearch,
}

impl QueryService {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        extractor: Arc<dyn EmbeddingExtractor>,
        store: Arc<dyn EmbeddingStore>,
    ) -> Self {
        Self {
            detector,
            extractor,
            search: SimilaritySearch::new(store),
        }
    }

    /// Distance between the faces of two images.
    ///
    /// Each image must yield a usable face; when several are found the first
    /// region reported by the detector is used.
    #[instrument(skip_all, fields(a = ?image_a.source, b = ?image_b.source))]
    pub async fn compare_faces(
        &self,
        image_a: &ImageData,
        image_b: &ImageData,
    ) -> FaceResult<f32> {
        let (a, b) = tokio::try_join!(self.embed_image(image_a), self.embed_image(image_b))?;
        let score = distance(&a, &b)?;
        info!(score, "Compared faces");
        Ok(score)
    }

    /// Closest stored face to the one stored under `label`.
    ///
    /// Fails with [`FaceError::RecordNotFound`] when `label` is not stored;
    /// returns `None` when no other record exists.
    #[instrument(skip(self))]
    pub async fn find_most_similar(&self, label: &str) -> FaceResult<Option<Neighbor>> {
        let best = self.search.nearest_to_label(label, 1).await?.into_iter().next();
        match &best {
            Some(hit) => info!(matched = %hit.label, score = hit.score, "Most similar face found"),
            None => info!("No other faces stored"),
        }
        Ok(best)
    }

    /// Top-`k` stored faces closest to `label`
    pub async fn find_similar(&self, label: &str, k: usize) -> FaceResult<Vec<Neighbor>> {
        self.search.nearest_to_label(label, k).await
    }

    /// Raw embedding of the first face found in `image`
    pub async fn embed_image(&self, image: &ImageData) -> FaceResult<Vec<f32>> {
        if image.is_empty() {
            return Err(FaceError::InvalidArgument("image is empty".to_string()));
        }

        let regions = self.detector.detect(image).await?;
        if regions.len() > 1 {
            debug!(faces = regions.len(), "Multiple faces detected, using the first");
        }
        let region = regions.into_iter().next().ok_or_else(|| {
            FaceError::extraction(format!(
                "no face detected in {}",
                image.source.as_deref().unwrap_or("image")
            ))
        })?;

        let vector = self.extractor.embed(&region.crop).await?;
        if vector.is_empty() {
            return Err(FaceError::extraction("extractor returned an empty embedding"));
        }
        Ok(vector)
    }
}
