/// Generate SQL migrations for the embedding store
///
/// The vector column is typed with the configured dimension, so the same
/// database can only ever hold embeddings of one model. Every statement is
/// idempotent; applied migrations are tracked in `facesim_migrations`.
pub fn generate_migrations(dimension: usize) -> Vec<(&'static str, String)> {
    vec![
        (
            "20240601000000_enable_pgvector",
            "CREATE EXTENSION IF NOT EXISTS vector;".to_string(),
        ),
        (
            "20240601000001_face_embeddings",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS face_embeddings (
                    label TEXT PRIMARY KEY,
                    embedding vector({dimension}) NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );
                "#
            ),
        ),
    ]
}

/// Declared dimension of the embedding column; pgvector stores it as the
/// type modifier
pub const COLUMN_DIMENSION: &str = "
    SELECT atttypmod
    FROM pg_attribute
    WHERE attrelid = to_regclass('face_embeddings')
      AND attname = 'embedding'
      AND NOT attisdropped
";

/// Bookkeeping table for [`generate_migrations`]
pub const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS facesim_migrations (
        name TEXT PRIMARY KEY,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered_and_unique() {
        let migrations = generate_migrations(768);
        let names: Vec<&str> = migrations.iter().map(|(name, _)| *name).collect();

        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_table_uses_configured_dimension() {
        let migrations = generate_migrations(512);
        let (_, table) = &migrations[1];
        assert!(table.contains("vector(512)"));
        assert!(table.contains("label TEXT PRIMARY KEY"));
        assert!(migrations.iter().all(|(_, sql)| sql.contains("IF NOT EXISTS")));
    }
}
