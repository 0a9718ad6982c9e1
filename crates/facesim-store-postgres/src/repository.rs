//! pgvector-backed [`EmbeddingStore`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::debug;

use facesim_core::{
    format_vector, parse_vector, EmbeddingRecord, EmbeddingStore, FaceError, FaceResult,
    Neighbor,
};

use crate::{store_error, PostgresConfig, PostgresConnection};

const UPSERT: &str = "
    INSERT INTO face_embeddings (label, embedding, updated_at)
    VALUES ($1, $2::vector, NOW())
    ON CONFLICT (label) DO UPDATE
    SET embedding = EXCLUDED.embedding, updated_at = NOW()
";

const GET: &str = "SELECT embedding::text AS embedding FROM face_embeddings WHERE label = $1";

const LIST_ALL: &str = "SELECT label, embedding::text AS embedding FROM face_embeddings";

const COUNT: &str = "SELECT COUNT(*) FROM face_embeddings";

// Zero vectors have no direction and are left out, as in the in-process scan.
// Ties sort by label bytes, whatever the database collation.
const NEAREST: &str = "
    SELECT label,
           LEAST(l2_normalize(embedding) <-> l2_normalize($1::vector), 2.0)::real AS score
    FROM face_embeddings
    WHERE ($2::text IS NULL OR label <> $2::text)
      AND vector_norm(embedding) > 0
    ORDER BY score, label COLLATE \"C\"
    LIMIT $3
";

/// Embedding store over a `face_embeddings` table with a pgvector column
#[derive(Clone)]
pub struct PostgresEmbeddingStore {
    conn: PostgresConnection,
    dimension: usize,
}

impl PostgresEmbeddingStore {
    /// Connect using `config`, applying migrations when it asks for them
    pub async fn connect(config: &PostgresConfig) -> FaceResult<Self> {
        let conn = PostgresConnection::new(config).await?;
        Ok(Self::new(conn, config.dimension))
    }

    pub fn new(conn: PostgresConnection, dimension: usize) -> Self {
        Self { conn, dimension }
    }

    /// When the record under `label` was last written
    pub async fn updated_at(&self, label: &str) -> FaceResult<DateTime<Utc>> {
        let row = sqlx::query("SELECT updated_at FROM face_embeddings WHERE label = $1")
            .bind(label)
            .fetch_optional(self.conn.pool())
            .await
            .map_err(|e| store_error("Failed to read record timestamp", &e))?
            .ok_or_else(|| FaceError::RecordNotFound(label.to_string()))?;

        row.try_get("updated_at")
            .map_err(|e| store_error("Failed to decode record timestamp", &e))
    }
}

fn decode_embedding(row: &sqlx::postgres::PgRow) -> FaceResult<Vec<f32>> {
    let text: String = row
        .try_get("embedding")
        .map_err(|e| store_error("Failed to decode embedding", &e))?;
    parse_vector(&text)
}

#[async_trait]
impl EmbeddingStore for PostgresEmbeddingStore {
    async fn upsert(&self, label: &str, vector: &[f32]) -> FaceResult<()> {
        if vector.is_empty() {
            return Err(FaceError::InvalidArgument(
                "embedding must not be empty".to_string(),
            ));
        }
        // Checked here so a mismatch is reported as such rather than as a
        // database error from the typed column.
        self.check_dimension(vector).await?;

        sqlx::query(UPSERT)
            .bind(label)
            .bind(format_vector(vector))
            .execute(self.conn.pool())
            .await
            .map_err(|e| store_error("Failed to upsert embedding", &e))?;

        debug!(label, dimension = vector.len(), "Upserted embedding");
        Ok(())
    }

    async fn get(&self, label: &str) -> FaceResult<Vec<f32>> {
        let row = sqlx::query(GET)
            .bind(label)
            .fetch_optional(self.conn.pool())
            .await
            .map_err(|e| store_error("Failed to read embedding", &e))?
            .ok_or_else(|| FaceError::RecordNotFound(label.to_string()))?;

        decode_embedding(&row)
    }

    async fn list_all(&self) -> FaceResult<Vec<EmbeddingRecord>> {
        let rows = sqlx::query(LIST_ALL)
            .fetch_all(self.conn.pool())
            .await
            .map_err(|e| store_error("Failed to list embeddings", &e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let label: String = row
                .try_get("label")
                .map_err(|e| store_error("Failed to decode label", &e))?;
            records.push(EmbeddingRecord::new(label, decode_embedding(&row)?));
        }
        Ok(records)
    }

    async fn len(&self) -> FaceResult<usize> {
        let count: i64 = sqlx::query_scalar(COUNT)
            .fetch_one(self.conn.pool())
            .await
            .map_err(|e| store_error("Failed to count embeddings", &e))?;
        Ok(count.max(0) as usize)
    }

    async fn dimension(&self) -> FaceResult<Option<usize>> {
        Ok(Some(self.dimension))
    }

    async fn nearest(
        &self,
        unit_query: &[f32],
        exclude_label: Option<&str>,
        k: usize,
    ) -> FaceResult<Vec<Neighbor>> {
        let rows = sqlx::query(NEAREST)
            .bind(format_vector(unit_query))
            .bind(exclude_label)
            .bind(k.min(i64::MAX as usize) as i64)
            .fetch_all(self.conn.pool())
            .await
            .map_err(|e| store_error("Failed to rank embeddings", &e))?;

        rows.iter()
            .map(|row| {
                let label: String = row
                    .try_get("label")
                    .map_err(|e| store_error("Failed to decode label", &e))?;
                let score: f32 = row
                    .try_get("score")
                    .map_err(|e| store_error("Failed to decode score", &e))?;
                Ok(Neighbor::new(label, score.max(0.0)))
            })
            .collect()
    }
}
