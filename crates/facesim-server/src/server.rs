//! Main Facesim Server implementation

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use facesim_core::{
    EmbeddingExtractor, EmbeddingStore, FaceDetector, IngestionOrchestrator, QueryService,
};

use crate::api;
use crate::config::ServerConfig;
use crate::error::ServerResult;

/// State shared by every request.
///
/// The detector, extractor and store handles are created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EmbeddingStore>,
    pub query: QueryService,
    pub ingestion: IngestionOrchestrator,
}

impl AppState {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        extractor: Arc<dyn EmbeddingExtractor>,
        store: Arc<dyn EmbeddingStore>,
    ) -> Self {
        Self {
            query: QueryService::new(detector.clone(), extractor.clone(), store.clone()),
            ingestion: IngestionOrchestrator::new(detector, extractor, store.clone()),
            store,
        }
    }
}

/// HTTP server over an [`AppState`]
pub struct FacesimServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl FacesimServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Router with request tracing and CORS applied
    pub fn router(&self) -> Router {
        api::build_router(self.state.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> ServerResult<()> {
        let address = self.config.socket_address();
        let listener = TcpListener::bind(&address).await?;
        info!(address = %address, "Facesim server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Facesim server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
