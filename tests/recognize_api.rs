//! HTTP-level tests for the recognition endpoints, run against a stub engine.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Request, StatusCode},
};
use axum_test::TestServer;
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use serde_json::Value;
use tower::ServiceExt;

use text_scanner_server::{
    app,
    config::Config,
    ocr::{BatchResponse, EngineKind, FileStatus, OcrEngine, OcrError},
    state::AppState,
};

const BOUNDARY: &str = "----text-scanner-test-boundary";

/// Engine stub that "reads" a fixed text and records what it was given
struct StubEngine {
    fragments: Vec<String>,
    available: bool,
    calls: Mutex<Vec<(u32, u32)>>,
}

impl StubEngine {
    fn reading(fragments: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            available: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn offline() -> Arc<Self> {
        Arc::new(Self {
            fragments: Vec::new(),
            available: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrEngine for StubEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Tesseract
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn read_text(&self, image: &RgbImage) -> Result<Vec<String>, OcrError> {
        if !self.available {
            return Err(OcrError::EngineUnavailable("stub engine offline".to_string()));
        }
        self.calls.lock().unwrap().push(image.dimensions());
        Ok(self.fragments.clone())
    }
}

fn state_with(engine: Arc<StubEngine>) -> AppState {
    AppState::with_engine(Config::default(), engine)
}

fn state_with_limit(engine: Arc<StubEngine>, max_upload_bytes: usize) -> AppState {
    let mut config = Config::default();
    config.limits.max_upload_bytes = max_upload_bytes;
    AppState::with_engine(config, engine)
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([255])));
    let mut buffer = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}

/// A file part for a hand-built multipart body
struct Part<'a> {
    field: &'a str,
    filename: &'a str,
    content_type: Option<&'a str>,
    data: Vec<u8>,
}

fn file<'a>(filename: &'a str, content_type: &'a str, data: Vec<u8>) -> Part<'a> {
    Part {
        field: "files",
        filename,
        content_type: Some(content_type),
        data,
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.field, part.filename
            )
            .as_bytes(),
        );
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn post_multipart(state: AppState, parts: &[Part<'_>]) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .method("POST")
        .uri("/recognize-text/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();

    let response = app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body)
}

async fn post_batch(state: AppState, parts: &[Part<'_>]) -> BatchResponse {
    let (status, body) = post_multipart(state, parts).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_batch_hello_and_empty_file() {
    let engine = StubEngine::reading(&["HELLO"]);
    let batch = post_batch(
        state_with(engine.clone()),
        &[
            file("hello.png", "image/png", png(400, 120)),
            file("empty.png", "image/png", Vec::new()),
        ],
    )
    .await;

    assert_eq!(batch.results.len(), 2);

    let first = &batch.results[0];
    assert_eq!(first.filename, "hello.png");
    assert_eq!(first.status, FileStatus::Success);
    assert!(first.text.to_uppercase().contains("HELLO"));
    assert!(first.message.is_none());

    let second = &batch.results[1];
    assert_eq!(second.filename, "empty.png");
    assert_eq!(second.status, FileStatus::Error);
    assert!(second.text.is_empty());
    assert!(!second.message.as_deref().unwrap_or_default().is_empty());

    // Only the decodable file reached the engine, upscaled 2x
    assert_eq!(engine.calls(), vec![(800, 240)]);
}

#[tokio::test]
async fn test_batch_isolates_non_image_content_type() {
    let engine = StubEngine::reading(&["Привет", "мир"]);
    let batch = post_batch(
        state_with(engine.clone()),
        &[
            file("a.png", "image/png", png(50, 50)),
            file("notes.txt", "text/plain", b"HELLO".to_vec()),
            file("c.png", "image/png", png(1200, 80)),
        ],
    )
    .await;

    let statuses: Vec<FileStatus> = batch.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![FileStatus::Success, FileStatus::Error, FileStatus::Success]
    );
    assert_eq!(batch.results[0].text, "Привет мир");
    assert!(batch.results[1]
        .message
        .as_deref()
        .unwrap()
        .contains("text/plain"));
    assert_eq!(batch.results[2].filename, "c.png");
    assert_eq!(engine.calls(), vec![(100, 100), (1200, 80)]);
}

#[tokio::test]
async fn test_batch_missing_content_type_and_garbage() {
    let batch = post_batch(
        state_with(StubEngine::reading(&["x"])),
        &[
            Part {
                field: "files",
                filename: "blob",
                content_type: None,
                data: png(10, 10),
            },
            file("fake.jpg", "image/jpeg", b"not really a jpeg".to_vec()),
        ],
    )
    .await;

    assert_eq!(batch.results.len(), 2);
    assert!(batch.results.iter().all(|r| r.status == FileStatus::Error));
}

#[tokio::test]
async fn test_batch_engine_failure_is_per_file() {
    let batch = post_batch(
        state_with(StubEngine::offline()),
        &[file("a.png", "image/png", png(10, 10))],
    )
    .await;

    assert_eq!(batch.results[0].status, FileStatus::Error);
    assert!(batch.results[0]
        .message
        .as_deref()
        .unwrap()
        .contains("not available"));
}

#[tokio::test]
async fn test_batch_without_files_field_is_rejected() {
    let (status, body) = post_multipart(
        state_with(StubEngine::reading(&["x"])),
        &[Part {
            field: "image",
            filename: "a.png",
            content_type: Some("image/png"),
            data: png(10, 10),
        }],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "bad_request");
}

#[tokio::test]
async fn test_single_raw_body() {
    let engine = StubEngine::reading(&["HELLO", "WORLD"]);
    let server = TestServer::new(app(state_with(engine.clone()))).unwrap();

    let response = server
        .post("/recognize-text/")
        .bytes(Bytes::from(png(2000, 100)))
        .content_type("application/octet-stream")
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<String>(), "HELLO WORLD");
    assert_eq!(engine.calls(), vec![(2000, 100)]);
}

#[tokio::test]
async fn test_single_route_without_trailing_slash() {
    let server = TestServer::new(app(state_with(StubEngine::reading(&["ok"])))).unwrap();

    let response = server
        .post("/recognize-text")
        .bytes(Bytes::from(png(10, 10)))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<String>(), "ok");
}

#[tokio::test]
async fn test_single_invalid_body_returns_explicit_error() {
    let server = TestServer::new(app(state_with(StubEngine::reading(&["x"])))).unwrap();

    let empty = server
        .post("/recognize-text/")
        .bytes(Bytes::new())
        .expect_failure()
        .await;
    empty.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(empty.json::<Value>()["error"], "empty_image");

    let garbage = server
        .post("/recognize-text/")
        .bytes(Bytes::from_static(b"\x89PNG but truncated"))
        .expect_failure()
        .await;
    garbage.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(garbage.json::<Value>()["error"], "decode_error");
}

#[tokio::test]
async fn test_single_engine_unavailable() {
    let server = TestServer::new(app(state_with(StubEngine::offline()))).unwrap();

    let response = server
        .post("/recognize-text/")
        .bytes(Bytes::from(png(10, 10)))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["error"], "engine_unavailable");
}

#[tokio::test]
async fn test_health_reports_engine() {
    let server = TestServer::new(app(state_with(StubEngine::reading(&[])))).unwrap();
    let health = server.get("/health").await.json::<Value>();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["engine"], "tesseract");
    assert_eq!(health["engine_available"], true);

    let server = TestServer::new(app(state_with(StubEngine::offline()))).unwrap();
    let health = server.get("/health").await.json::<Value>();
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["engine_available"], false);
}

#[tokio::test]
async fn test_oversized_raw_body_is_payload_too_large() {
    let engine = StubEngine::reading(&["x"]);
    let server = TestServer::new(app(state_with_limit(engine.clone(), 1024))).unwrap();

    let response = server
        .post("/recognize-text/")
        .bytes(Bytes::from(vec![0u8; 4096]))
        .content_type("application/octet-stream")
        .expect_failure()
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json::<Value>()["error"], "payload_too_large");
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_oversized_multipart_body_is_payload_too_large() {
    let engine = StubEngine::reading(&["x"]);
    let (status, body) = post_multipart(
        state_with_limit(engine.clone(), 1024),
        &[file("big.png", "image/png", vec![0u8; 4096])],
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "payload_too_large");
    assert!(engine.calls().is_empty());
}
