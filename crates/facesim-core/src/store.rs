//! EmbeddingStore trait definition
//!
//! Abstracts the persistent, label-keyed collection of face embeddings.
//! Implementations exist for memory ([`crate::memory`]) and Postgres
//! (`facesim-store-postgres`).

use async_trait::async_trait;

use crate::error::{FaceError, FaceResult};
use crate::record::{EmbeddingRecord, Neighbor};
use crate::search::rank_records;

/// Contract for a label-keyed embedding collection.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Inserts a record or fully replaces the vector stored under `label`.
    ///
    /// Contract: atomic per record. A vector whose length differs from the
    /// established dimensionality is rejected with
    /// [`FaceError::DimensionMismatch`] and the previous record, if any, is
    /// left intact. The vector is stored verbatim.
    async fn upsert(&self, label: &str, vector: &[f32]) -> FaceResult<()>;

    /// Exact lookup. Fails with [`FaceError::RecordNotFound`] when absent.
    async fn get(&self, label: &str) -> FaceResult<Vec<f32>>;

    /// Every stored record, in no particular order.
    async fn list_all(&self) -> FaceResult<Vec<EmbeddingRecord>>;

    /// Number of stored records
    async fn len(&self) -> FaceResult<usize>;

    /// The dimensionality every vector must have, once known
    async fn dimension(&self) -> FaceResult<Option<usize>>;

    /// Ranks stored records against an already normalized query.
    ///
    /// The default scans [`EmbeddingStore::list_all`]; backends with a native
    /// distance operator may push the ranking down instead. Results are
    /// ascending by score, ties broken by label, `exclude_label` never
    /// included, at most `k` entries.
    async fn nearest(
        &self,
        unit_query: &[f32],
        exclude_label: Option<&str>,
        k: usize,
    ) -> FaceResult<Vec<Neighbor>> {
        let records = self.list_all().await?;
        Ok(rank_records(&records, unit_query, exclude_label, k))
    }

    /// Fails fast when a vector does not match the established dimensionality
    async fn check_dimension(&self, vector: &[f32]) -> FaceResult<()> {
        match self.dimension().await? {
            Some(expected) if expected != vector.len() => Err(FaceError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }
}
