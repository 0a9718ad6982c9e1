//!
//! Facesim Server - HTTP surface and batch runner for face similarity
//!

use std::sync::Arc;
use tracing::info;

use facesim_core::{EmbeddingStore, InMemoryEmbeddingStore};
use facesim_store_postgres::{PostgresConfig, PostgresEmbeddingStore};

/// API module
pub mod api;

/// Configuration module
pub mod config;

/// Error module
pub mod error;

/// Detector and extractor clients
pub mod extractors;

/// Logging setup
pub mod logging;

/// Server module
pub mod server;

// Re-export key types
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{AppState, FacesimServer};

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    let state = create_app_state(&config).await?;
    FacesimServer::new(config, state).run().await
}

/// Wire the HTTP detector/extractor and the configured store together
pub async fn create_app_state(config: &ServerConfig) -> ServerResult<AppState> {
    let client = extractors::build_client(config.external_timeout())?;
    let detector = Arc::new(extractors::HttpFaceDetector::new(
        client.clone(),
        config.detector_url.clone(),
    ));
    let extractor = Arc::new(extractors::HttpEmbeddingExtractor::new(
        client,
        config.extractor_url.clone(),
        config.embedding_dimension,
    ));
    let store = create_store(config).await?;

    Ok(AppState::new(detector, extractor, store))
}

/// Create the embedding store named by `SERVICE_URI`
pub async fn create_store(config: &ServerConfig) -> ServerResult<Arc<dyn EmbeddingStore>> {
    let uri = config.service_uri.as_str();

    if uri.starts_with("memory://") {
        // Use in-memory store for development and testing
        info!("Using in-memory embedding store");
        Ok(Arc::new(InMemoryEmbeddingStore::with_dimension(
            config.embedding_dimension,
        )))
    } else if uri.starts_with("postgres://") || uri.starts_with("postgresql://") {
        info!("Using PostgreSQL embedding store");
        let pg_config = PostgresConfig {
            connection_string: config.service_uri.clone(),
            max_connections: config.db_max_connections,
            dimension: config.embedding_dimension,
            ..PostgresConfig::default()
        };
        let store = PostgresEmbeddingStore::connect(&pg_config).await?;
        Ok(Arc::new(store))
    } else {
        // The URI may carry credentials, so only the scheme is reported
        let scheme = uri.split("://").next().unwrap_or_default();
        Err(ServerError::ConfigError(format!(
            "Unsupported SERVICE_URI scheme '{}'",
            scheme
        )))
    }
}
