//! Ingestion of images into the embedding store
//!
//! Drives detect -> embed -> normalize -> upsert for every face of every
//! image. Records are written one at a time; each write is atomic on its own.
//! Failures tied to a single image or face are recorded in the report and
//! skipped. A store failure aborts the rest of the batch, and records written
//! before it stay in place.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::error::{FaceError, FaceResult};
use crate::extraction::{EmbeddingExtractor, FaceDetector, ImageData};
use crate::store::EmbeddingStore;
use crate::vector::normalize;

/// Label under which the `index`-th face of `source` is stored
pub fn derive_label(source: &str, index: usize) -> String {
    format!("{}_face_{}", source, index)
}

/// A skipped image or face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionFailure {
    /// Image source name, or the face label when the failure is per face
    pub source: String,
    /// Stable reason code, see [`FaceError::reason`]
    pub reason: String,
    pub message: String,
}

impl IngestionFailure {
    fn from_error(source: impl Into<String>, err: &FaceError) -> Self {
        Self {
            source: source.into(),
            reason: err.reason().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub images_processed: usize,
    /// Labels written, in processing order
    pub stored: Vec<String>,
    pub failures: Vec<IngestionFailure>,
}

impl IngestionReport {
    fn skip_or_abort(&mut self, source: &str, err: FaceError) -> FaceResult<()> {
        if err.is_item_scoped() {
            warn!(source, error = %err, "Skipping item");
            self.failures.push(IngestionFailure::from_error(source, &err));
            Ok(())
        } else {
            Err(err)
        }
    }
}

/// A batch stopped by a store failure, with what it did before stopping
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Ingestion aborted after storing {stored} faces: {error}", stored = .report.stored.len())]
pub struct BatchAborted {
    /// Images, writes and skips up to the failing write
    pub report: IngestionReport,
    pub error: FaceError,
}

/// Runs the detect/embed/store pipeline.
///
/// The detector and extractor are long-lived handles created once by the
/// caller and shared by reference.
#[derive(Clone)]
pub struct IngestionOrchestrator {
    detector: Arc<dyn FaceDetector>,
    extractor: Arc<dyn EmbeddingExtractor>,
    store: Arc<dyn EmbeddingStore>,
}

impl IngestionOrchestrator {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        extractor: Arc<dyn EmbeddingExtractor>,
        store: Arc<dyn EmbeddingStore>,
    ) -> Self {
        Self {
            detector,
            extractor,
            store,
        }
    }

    /// Ingests every face of one image.
    ///
    /// Returns `Err` only for failures that must abort a batch (store
    /// unavailable); everything else lands in the report.
    pub async fn ingest_image(&self, image: &ImageData) -> FaceResult<IngestionReport> {
        let mut report = IngestionReport::default();
        self.ingest_into(image, &mut report).await?;
        Ok(report)
    }

    /// Ingests images in order. Per-image failures are skipped; a store
    /// failure stops the batch and is returned with the partial report.
    pub async fn ingest_batch(
        &self,
        images: &[ImageData],
    ) -> Result<IngestionReport, BatchAborted> {
        info!(images = images.len(), "Starting ingestion batch");

        let mut report = IngestionReport::default();
        for image in images {
            if let Err(error) = self.ingest_into(image, &mut report).await {
                error!(
                    error = %error,
                    stored = report.stored.len(),
                    "Aborting ingestion batch"
                );
                return Err(BatchAborted { report, error });
            }
        }

        info!(
            images = report.images_processed,
            stored = report.stored.len(),
            failures = report.failures.len(),
            "Ingestion batch complete"
        );
        Ok(report)
    }

    /// Appends the outcome of one image to `report`, which keeps everything
    /// done before an aborting error.
    #[instrument(skip(self, image, report), fields(source = ?image.source))]
    async fn ingest_into(
        &self,
        image: &ImageData,
        report: &mut IngestionReport,
    ) -> FaceResult<()> {
        report.images_processed += 1;

        let source = match image.source_stem() {
            Some(source) => source,
            None => {
                return report.skip_or_abort(
                    "<unnamed>",
                    FaceError::InvalidArgument("image has no source name".to_string()),
                );
            }
        };

        let regions = match self.detector.detect(image).await {
            Ok(regions) => regions,
            Err(e) => return report.skip_or_abort(&source, e),
        };

        if regions.is_empty() {
            return report.skip_or_abort(&source, FaceError::extraction("no face detected"));
        }

        let stored_before = report.stored.len();
        for (index, region) in regions.iter().enumerate() {
            let label = derive_label(&source, index);
            match self.store_face(&label, &region.crop).await {
                Ok(()) => report.stored.push(label),
                Err(e) => report.skip_or_abort(&label, e)?,
            }
        }

        info!(
            faces = regions.len(),
            stored = report.stored.len() - stored_before,
            "Image ingested"
        );
        Ok(())
    }

    async fn store_face(&self, label: &str, crop: &ImageData) -> FaceResult<()> {
        let raw = self.extractor.embed(crop).await?;

        let expected = self.extractor.dimension();
        if raw.len() != expected {
            return Err(FaceError::DimensionMismatch {
                expected,
                actual: raw.len(),
            });
        }

        let unit = normalize(&raw)?;
        self.store.upsert(label, &unit).await
    }
}
