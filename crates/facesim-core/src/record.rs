//! Data types stored and returned by the embedding store

use serde::{Deserialize, Serialize};

/// A labeled face embedding. The label is the unique key of the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub label: String,
    pub vector: Vec<f32>,
}

impl EmbeddingRecord {
    pub fn new(label: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            vector,
        }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// One similarity search hit. Lower score means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub label: String,
    pub score: f32,
}

impl Neighbor {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}
