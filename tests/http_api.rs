mod common;

use common::{build_pdf, encode_png};
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use engagement_lens::extract::{ExtractError, OcrEngine, PageRasterizer};
use engagement_lens::server::{router, AppState};
use engagement_lens::{Analyzer, Extractor};
use image::{DynamicImage, RgbImage};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "lens-test-boundary";

#[derive(Default)]
struct Counters {
    renders: AtomicUsize,
    recognitions: AtomicUsize,
}

struct StubRasterizer(Arc<Counters>);

impl PageRasterizer for StubRasterizer {
    fn render_page(&self, _pdf: &[u8], _page_number: u32, _dpi: u32) -> Result<DynamicImage, ExtractError> {
        self.0.renders.fetch_add(1, Ordering::SeqCst);
        Ok(DynamicImage::ImageRgb8(RgbImage::new(2, 2)))
    }
}

struct StubOcr {
    counters: Arc<Counters>,
    text: &'static str,
}

impl OcrEngine for StubOcr {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn recognize(&self, _image: &RgbImage) -> Result<String, ExtractError> {
        self.counters.recognitions.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.to_string())
    }
}

fn app_with(ocr_text: &'static str, max_upload_bytes: usize) -> (Router, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let extractor = Extractor::new(
        Arc::new(StubRasterizer(counters.clone())),
        Arc::new(StubOcr {
            counters: counters.clone(),
            text: ocr_text,
        }),
        200,
    );
    let state = AppState::new(Analyzer::with_vader(), extractor, 2);
    (router(state, max_upload_bytes), counters)
}

fn app(ocr_text: &'static str) -> (Router, Arc<Counters>) {
    app_with(ocr_text, 10 * 1024 * 1024)
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(field: &str, filename: Option<&str>, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    let disposition = match filename {
        Some(name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            field, name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field),
    };
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn png_bytes() -> Vec<u8> {
    encode_png(DynamicImage::ImageRgb8(RgbImage::new(4, 4)))
}

#[tokio::test]
async fn health_is_served_at_root_and_under_api() {
    for uri in ["/health", "/api/health"] {
        let (app, _) = app("");
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }
}

#[tokio::test]
async fn json_text_is_analyzed_inline() {
    let (app, counters) = app("");
    let (status, body) = send(
        app,
        json_request("/analyze", r#"{"text": "  Hello world! Foo_bar 123.  "}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "raw_text");
    assert_eq!(body["extracted_text"], "Hello world! Foo_bar 123.");
    assert_eq!(body["metrics"]["word_count"], 4);
    assert_eq!(body["metrics"]["char_count"], 25);
    assert!(body["metrics"]["flesch_reading_ease"].is_null());
    assert!(body.get("warning").is_none());
    assert_eq!(counters.recognitions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_or_blank_text_is_rejected() {
    for payload in [r#"{"text": "   "}"#, "{}", r#"{"text": 42}"#, "not json", "[]"] {
        let (app, _) = app("");
        let (status, body) = send(app, json_request("/api/analyze", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body, json!({ "error": "No text provided" }));
    }
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_extraction() {
    let (app, counters) = app("should never be read");
    let (status, body) = send(app, multipart_request("file", Some("clip.mp4"), b"\x00\x00\x00\x18ftyp")).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body, json!({ "error": "Unsupported file type" }));
    assert_eq!(counters.renders.load(Ordering::SeqCst), 0);
    assert_eq!(counters.recognitions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_file_part_is_rejected() {
    let (app, _) = app("");
    let (status, body) = send(app, multipart_request("attachment", Some("scan.png"), b"x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file part named 'file'" }));

    let (app, _) = self::app("");
    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file part named 'file'" }));
}

#[tokio::test]
async fn empty_filename_is_rejected() {
    let (app, _) = app("");
    let (status, body) = send(app, multipart_request("file", Some(""), b"x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No selected file" }));
}

#[tokio::test]
async fn file_field_without_filename_is_not_a_file_part() {
    let (app, counters) = app("");
    let (status, body) = send(app, multipart_request("file", None, b"just a form value")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file part named 'file'" }));
    assert_eq!(counters.recognitions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn truncated_multipart_body_is_a_json_client_error() {
    let (app, _) = app("");
    let body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"scan.png\"\r\n\r\npartial bytes",
        BOUNDARY
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "expected JSON error, got {}", body);
}

#[tokio::test]
async fn oversized_file_part_is_a_json_413() {
    let (app, counters) = app_with("", 256);
    let (status, body) = send(app, multipart_request("file", Some("big.png"), &[0u8; 4096])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string(), "expected JSON error, got {}", body);
    assert_eq!(counters.recognitions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn image_upload_is_extracted_and_analyzed() {
    let (app, counters) = app("Check out our launch today #rust https://example.com\n");
    let (status, body) = send(app, multipart_request("file", Some("Scan.PNG"), &png_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "image");
    assert_eq!(
        body["extracted_text"],
        "Check out our launch today #rust https://example.com"
    );
    assert_eq!(body["metrics"]["hashtags"], json!(["#rust"]));
    assert_eq!(body["metrics"]["links"], json!(["https://example.com"]));
    assert!(body.get("warning").is_none());
    assert_eq!(counters.recognitions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn pdf_upload_reads_the_text_layer() {
    let (app, counters) = app("");
    let pdf = build_pdf(&[Some("Check the new release notes at https://example.com #rust @ferris")]);
    let (status, body) = send(app, multipart_request("file", Some("notes.pdf"), &pdf)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "pdf");
    assert_eq!(
        body["extracted_text"],
        "Check the new release notes at https://example.com #rust @ferris"
    );
    assert_eq!(body["metrics"]["word_count"], 11);
    assert_eq!(body["metrics"]["hashtags"], json!(["#rust"]));
    assert_eq!(body["metrics"]["mentions"], json!(["@ferris"]));
    assert_eq!(body["metrics"]["links"], json!(["https://example.com"]));
    assert!(body.get("warning").is_none());
    assert_eq!(counters.renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_extraction_returns_empty_metrics_with_warning() {
    let (app, _) = app("   ");
    let (status, body) = send(app, multipart_request("file", Some("blank.jpg"), &png_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "source": "image",
            "extracted_text": "",
            "metrics": {},
            "warning": "No text detected."
        })
    );
}

#[tokio::test]
async fn corrupt_pdf_is_an_internal_error() {
    let (app, counters) = app("");
    let (status, body) = send(app, multipart_request("file", Some("broken.pdf"), b"not a pdf at all")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap_or_default();
    assert!(message.starts_with("corrupt document"), "got {}", message);
    assert_eq!(counters.renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let (app, _) = app_with("", 256);
    let payload = json!({ "text": "word ".repeat(200) }).to_string();
    let response = app
        .oneshot(json_request("/api/analyze", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
