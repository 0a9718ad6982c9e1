//! In-memory implementation of EmbeddingStore
//!
//! Used for development, the `memory://` service URI and tests.
//! All data is lost when the instance is dropped.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{FaceError, FaceResult};
use crate::record::EmbeddingRecord;
use crate::store::EmbeddingStore;

#[derive(Debug, Default)]
struct Collection {
    records: HashMap<String, Vec<f32>>,
    dimension: Option<usize>,
}

/// In-memory implementation of EmbeddingStore
///
/// The dimensionality is either fixed at construction or established by the
/// first successful upsert. Dimension check and insert happen under one write
/// guard, so readers never observe a partially applied upsert.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmbeddingStore {
    inner: Arc<RwLock<Collection>>,
}

impl InMemoryEmbeddingStore {
    /// Create a store whose dimensionality is set by the first upsert
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that only accepts vectors of `dimension` components
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collection {
                records: HashMap::new(),
                dimension: Some(dimension),
            })),
        }
    }
}

#[async_trait]
impl EmbeddingStore for InMemoryEmbeddingStore {
    async fn upsert(&self, label: &str, vector: &[f32]) -> FaceResult<()> {
        if vector.is_empty() {
            return Err(FaceError::InvalidArgument(
                "cannot store an empty vector".to_string(),
            ));
        }

        let mut collection = self.inner.write().await;
        match collection.dimension {
            Some(expected) if expected != vector.len() => {
                return Err(FaceError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => collection.dimension = Some(vector.len()),
        }

        let replaced = collection
            .records
            .insert(label.to_string(), vector.to_vec())
            .is_some();
        debug!(label, replaced, "Upserted embedding");
        Ok(())
    }

    async fn get(&self, label: &str) -> FaceResult<Vec<f32>> {
        let collection = self.inner.read().await;
        collection
            .records
            .get(label)
            .cloned()
            .ok_or_else(|| FaceError::RecordNotFound(label.to_string()))
    }

    async fn list_all(&self) -> FaceResult<Vec<EmbeddingRecord>> {
        let collection = self.inner.read().await;
        Ok(collection
            .records
            .iter()
            .map(|(label, vector)| EmbeddingRecord::new(label.clone(), vector.clone()))
            .collect())
    }

    async fn len(&self) -> FaceResult<usize> {
        Ok(self.inner.read().await.records.len())
    }

    async fn dimension(&self) -> FaceResult<Option<usize>> {
        Ok(self.inner.read().await.dimension)
    }
}
