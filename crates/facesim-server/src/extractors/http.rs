//! HTTP adapters for the detector and extractor services
//!
//! Both services take the raw image bytes as the request body. The detector
//! answers `{"faces": [{"x", "y", "width", "height", "crop"}]}` with the crop
//! base64-encoded; the extractor answers `{"embedding": [...]}`.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use facesim_core::{
    BoundingBox, EmbeddingExtractor, FaceDetector, FaceError, FaceRegion, FaceResult, ImageData,
};

use crate::error::ServerResult;

/// Shared HTTP client with the external request timeout applied
pub fn build_client(timeout: Duration) -> ServerResult<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn post_image(
    client: &Client,
    url: &str,
    image: &ImageData,
    service: &str,
) -> FaceResult<Response> {
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(image.bytes.clone())
        .send()
        .await
        .map_err(|e| FaceError::extraction(format!("{} request failed: {}", service, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FaceError::extraction(format!(
            "{} returned status {}",
            service, status
        )));
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    faces: Vec<DetectedFace>,
}

#[derive(Debug, Deserialize)]
struct DetectedFace {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    crop: String,
}

/// Face detector reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpFaceDetector {
    client: Client,
    url: String,
}

impl HttpFaceDetector {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FaceDetector for HttpFaceDetector {
    #[instrument(skip(self, image), fields(source = ?image.source))]
    async fn detect(&self, image: &ImageData) -> FaceResult<Vec<FaceRegion>> {
        let response = post_image(&self.client, &self.url, image, "detector").await?;
        let body: DetectResponse = response
            .json()
            .await
            .map_err(|e| FaceError::extraction(format!("detector response is malformed: {}", e)))?;

        let regions = body
            .faces
            .into_iter()
            .map(|face| {
                let crop = base64::decode(&face.crop).map_err(|e| {
                    FaceError::extraction(format!("detector returned an invalid crop: {}", e))
                })?;
                Ok(FaceRegion {
                    bbox: BoundingBox {
                        x: face.x,
                        y: face.y,
                        width: face.width,
                        height: face.height,
                    },
                    crop: ImageData {
                        source: image.source.clone(),
                        bytes: crop,
                    },
                })
            })
            .collect::<FaceResult<Vec<_>>>()?;

        debug!(faces = regions.len(), "Detector response received");
        Ok(regions)
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embedding extractor reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpEmbeddingExtractor {
    client: Client,
    url: String,
    dimension: usize,
}

impl HttpEmbeddingExtractor {
    pub fn new(client: Client, url: impl Into<String>, dimension: usize) -> Self {
        Self {
            client,
            url: url.into(),
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingExtractor for HttpEmbeddingExtractor {
    #[instrument(skip(self, face), fields(bytes = face.bytes.len()))]
    async fn embed(&self, face: &ImageData) -> FaceResult<Vec<f32>> {
        let response = post_image(&self.client, &self.url, face, "extractor").await?;
        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| FaceError::extraction(format!("extractor response is malformed: {}", e)))?;
        Ok(body.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
