//! Similarity search over the embedding store
//!
//! Exhaustive linear scan: every eligible record is scored against the query.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{FaceError, FaceResult};
use crate::record::{EmbeddingRecord, Neighbor};
use crate::store::EmbeddingStore;
use crate::vector::{distance_between_unit, normalize};

/// Scores `records` against a unit-length query and returns the best `k`.
///
/// Ascending by score, ties broken by label. Records labeled `exclude_label`
/// are skipped, as are records whose vector cannot be compared with the query.
pub fn rank_records(
    records: &[EmbeddingRecord],
    unit_query: &[f32],
    exclude_label: Option<&str>,
    k: usize,
) -> Vec<Neighbor> {
    let mut hits: Vec<Neighbor> = records
        .iter()
        .filter(|record| Some(record.label.as_str()) != exclude_label)
        .filter_map(|record| {
            if record.vector.len() != unit_query.len() {
                warn!(
                    label = %record.label,
                    expected = unit_query.len(),
                    actual = record.vector.len(),
                    "Skipping stored record with mismatched dimension"
                );
                return None;
            }
            match normalize(&record.vector) {
                Ok(unit) => Some(Neighbor::new(
                    record.label.clone(),
                    distance_between_unit(unit_query, &unit),
                )),
                Err(e) => {
                    warn!(label = %record.label, error = %e, "Skipping degenerate stored record");
                    None
                }
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.label.cmp(&b.label))
    });
    hits.truncate(k);
    hits
}

/// Nearest-neighbor queries against an [`EmbeddingStore`]
#[derive(Clone)]
pub struct SimilaritySearch {
    store: Arc<dyn EmbeddingStore>,
}

impl SimilaritySearch {
    pub fn new(store: Arc<dyn EmbeddingStore>) -> Self {
        Self { store }
    }

    /// Top-`k` stored records closest to `query`, excluding `exclude_label`.
    ///
    /// `k == 0` is rejected. Fewer than `k` eligible records yields all of
    /// them; none yields an empty vector.
    #[instrument(skip(self, query), fields(dimension = query.len()))]
    pub async fn nearest_neighbors(
        &self,
        query: &[f32],
        exclude_label: Option<&str>,
        k: usize,
    ) -> FaceResult<Vec<Neighbor>> {
        if k == 0 {
            return Err(FaceError::InvalidArgument(
                "k must be greater than zero".to_string(),
            ));
        }

        let unit_query = normalize(query)?;
        self.store.check_dimension(&unit_query).await?;

        let hits = self.store.nearest(&unit_query, exclude_label, k).await?;
        debug!(hits = hits.len(), "Similarity search complete");
        Ok(hits)
    }

    /// Top-`k` records closest to the vector stored under `label`
    pub async fn nearest_to_label(&self, label: &str, k: usize) -> FaceResult<Vec<Neighbor>> {
        let vector = self.store.get(label).await?;
        self.nearest_neighbors(&vector, Some(label), k).await
    }
}
