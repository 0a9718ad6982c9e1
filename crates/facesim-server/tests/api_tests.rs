use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use mockall::mock;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use facesim_core::test_utils::{StubEmbeddingExtractor, StubFaceDetector};
use facesim_core::{EmbeddingRecord, EmbeddingStore, FaceError, FaceResult, InMemoryEmbeddingStore};
use facesim_server::{api::build_router, AppState};

const BOUNDARY: &str = "facesim-test-boundary";

mock! {
    pub Store {}

    #[async_trait]
    impl EmbeddingStore for Store {
        async fn upsert(&self, label: &str, vector: &[f32]) -> FaceResult<()>;
        async fn get(&self, label: &str) -> FaceResult<Vec<f32>>;
        async fn list_all(&self) -> FaceResult<Vec<EmbeddingRecord>>;
        async fn len(&self) -> FaceResult<usize>;
        async fn dimension(&self) -> FaceResult<Option<usize>>;
    }
}

fn extractor() -> StubEmbeddingExtractor {
    StubEmbeddingExtractor::new(2)
        .with_vector("jb", vec![1.0, 0.0])
        .with_vector("jb-again", vec![3.0, 0.2])
        .with_vector("cw", vec![0.0, 1.0])
}

fn app_with_store(store: Arc<dyn EmbeddingStore>) -> Router {
    let state = AppState::new(
        Arc::new(StubFaceDetector::new()),
        Arc::new(extractor()),
        store,
    );
    build_router(Arc::new(state))
}

fn app() -> Router {
    app_with_store(Arc::new(InMemoryEmbeddingStore::new()))
}

/// Multipart body with one file part per `(field, file_name, contents)`
fn multipart(parts: &[(&str, &str, &str)]) -> Request<Body> {
    multipart_to("/api/compare-faces", parts)
}

fn multipart_to(uri: &str, parts: &[(&str, &str, &str)]) -> Request<Body> {
    let mut body = Vec::new();
    for (field, file_name, contents) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(contents.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(&app(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
    assert_eq!(body["records"], 0);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_compare_faces() {
    let app = app();

    let (status, body) = send(
        &app,
        multipart(&[("image1", "a.jpg", "jb"), ("image2", "b.jpg", "jb-again")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["score"].as_f64().unwrap() < 0.1);

    let (status, body) = send(
        &app,
        multipart(&[("image1", "a.jpg", "jb"), ("image2", "b.jpg", "cw")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let score = body["score"].as_f64().unwrap();
    assert!((score - 2f64.sqrt()).abs() < 1e-5);
}

#[tokio::test]
async fn test_compare_faces_missing_image() {
    let (status, body) = send(&app(), multipart(&[("image1", "a.jpg", "jb")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorDetails"]["errorCode"], "ERR_MISSING_IMAGE");
    assert!(body["error"].as_str().unwrap().contains("image2"));
}

#[tokio::test]
async fn test_compare_faces_without_a_face() {
    let (status, body) = send(
        &app(),
        multipart(&[("image1", "a.jpg", "jb"), ("image2", "wall.jpg", "|")]),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errorDetails"]["errorCode"],
        "EXTERNAL_EXTRACTION_FAILURE"
    );
    assert_eq!(body["error"], body["errorDetails"]["errorMessage"]);
}

#[tokio::test]
async fn test_ingest_then_find_most_similar() {
    let app = app();

    let (status, report) = send(
        &app,
        multipart_to(
            "/api/faces/ingest",
            &[
                ("file", "jb.jpg", "jb"),
                ("file", "cw.jpg", "cw"),
                ("file", "jb2.jpg", "jb-again"),
                ("file", "blank.jpg", "|"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["images_processed"], 4);
    assert_eq!(
        report["stored"],
        serde_json::json!(["jb_face_0", "cw_face_0", "jb2_face_0"])
    );
    assert_eq!(report["failures"][0]["source"], "blank");

    let (status, body) = send(&app, get("/api/faces/jb_face_0/most-similar")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "jb_face_0");
    assert_eq!(body["match"], "jb2_face_0");
    assert!(body["score"].as_f64().unwrap() < 0.1);

    let (_, health) = send(&app, get("/health")).await;
    assert_eq!(health["records"], 3);
}

#[tokio::test]
async fn test_ingest_without_files() {
    let (status, body) = send(&app(), multipart_to("/api/faces/ingest", &[])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorDetails"]["errorCode"], "ERR_MISSING_IMAGE");
}

#[tokio::test]
async fn test_most_similar_unknown_label() {
    let (status, body) = send(&app(), get("/api/faces/ghost/most-similar")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorDetails"]["errorCode"], "RECORD_NOT_FOUND");
}

#[tokio::test]
async fn test_most_similar_when_alone() {
    let store = Arc::new(InMemoryEmbeddingStore::new());
    store.upsert("solo_face_0", &[1.0, 0.0]).await.unwrap();

    let (status, body) = send(
        &app_with_store(store),
        get("/api/faces/solo_face_0/most-similar"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["match"], Value::Null);
    assert!(body.get("score").is_none());
}

#[tokio::test]
async fn test_store_unavailable() {
    let mut store = MockStore::new();
    store
        .expect_len()
        .returning(|| Err(FaceError::store_unavailable("Failed to count embeddings: I/O error")));
    store
        .expect_get()
        .returning(|_| Err(FaceError::store_unavailable("Failed to read embedding: I/O error")));
    let app = app_with_store(Arc::new(store));

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "DOWN");

    let (status, body) = send(&app, get("/api/faces/jb_face_0/most-similar")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["errorDetails"]["errorCode"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn test_ingest_aborts_when_store_goes_down() {
    let mut store = MockStore::new();
    store.expect_dimension().returning(|| Ok(None));
    let mut writes = 0;
    store.expect_upsert().times(2).returning(move |_, _| {
        writes += 1;
        if writes == 1 {
            Ok(())
        } else {
            Err(FaceError::store_unavailable(
                "Failed to upsert embedding: relation \"face_embeddings\" is locked",
            ))
        }
    });
    let app = app_with_store(Arc::new(store));

    let (status, body) = send(
        &app,
        multipart_to(
            "/api/faces/ingest",
            &[
                ("file", "blank.jpg", "|"),
                ("file", "jb.jpg", "jb"),
                ("file", "cw.jpg", "cw"),
                ("file", "pb.jpg", "pb"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["errorDetails"]["errorCode"], "STORE_UNAVAILABLE");
    assert_eq!(body["error"], "Embedding store unavailable");
    assert_eq!(body["images_processed"], 3);
    assert_eq!(body["stored"], serde_json::json!(["jb_face_0"]));
    assert_eq!(body["failures"][0]["source"], "blank");
    assert_eq!(body["failures"][0]["reason"], "EXTERNAL_EXTRACTION_FAILURE");
    assert_eq!(body["failures"].as_array().unwrap().len(), 1);
}
