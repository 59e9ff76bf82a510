//! Endpoint contract tests.
//!
//! The extractor is substituted with a canned implementation so every
//! request/response property of `/extract` can be exercised without network
//! access: success shape, each 4xx validation failure, each upstream error
//! mapping, and the request-id header.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use nfse_extract::{
    create_router, AppConfig, AppState, ExtractError, InvoiceExtractor, NfseData,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// ── Canned extractor ─────────────────────────────────────────────────────────

enum MockMode {
    Success(Value),
    Timeout,
    Failure,
    Malformed,
}

struct MockExtractor {
    mode: MockMode,
}

#[async_trait]
impl InvoiceExtractor for MockExtractor {
    async fn extract(&self, _pdf: &[u8]) -> Result<NfseData, ExtractError> {
        match &self.mode {
            MockMode::Success(payload) => Ok(serde_json::from_value(payload.clone())
                .expect("mock payload must deserialise")),
            MockMode::Timeout => Err(ExtractError::UpstreamTimeout { secs: 60 }),
            MockMode::Failure => Err(ExtractError::UpstreamFailure {
                detail: "HTTP 500 Internal Server Error: overloaded".into(),
            }),
            MockMode::Malformed => Err(ExtractError::MalformedUpstreamResponse {
                detail: "missing field `valor_total`".into(),
            }),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const BOUNDARY: &str = "nfse-test-boundary";

fn sample_invoice() -> Value {
    json!({
        "numero_nota": "1234",
        "data_emissao": "2023-10-27",
        "prestador_cnpj": "00.000.000/0001-00",
        "valor_total": 1500.00,
        "itens_servico": []
    })
}

fn app_with(mode: MockMode) -> axum::Router {
    app_with_config(mode, AppConfig::builder().api_key("sk-test").build().unwrap())
}

fn app_with_config(mode: MockMode, config: AppConfig) -> axum::Router {
    let state = AppState::with_extractor(config, Arc::new(MockExtractor { mode }));
    create_router(state)
}

/// Hand-rolled multipart body with a single part.
fn multipart_body(
    field: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{name}\"\r\n")
                .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"\r\n").as_bytes(),
        ),
    }
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn extract_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/extract")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn pdf_upload(data: &[u8]) -> Vec<u8> {
    multipart_body("file", Some("nota.pdf"), Some("application/pdf"), data)
}

// ── Success path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_pdf_returns_extracted_invoice() {
    let app = app_with(MockMode::Success(sample_invoice()));
    let response = app
        .oneshot(extract_request(pdf_upload(b"%PDF-1.4 sample invoice")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // Optional fields the upstream did not report must not appear as nulls.
    assert_eq!(body, sample_invoice());
}

#[tokio::test]
async fn response_carries_request_id_header() {
    let app = app_with(MockMode::Success(sample_invoice()));
    let response = app
        .oneshot(extract_request(pdf_upload(b"%PDF-1.4 x")))
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

// ── Client errors ────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_file_field_is_400() {
    let app = app_with(MockMode::Success(sample_invoice()));
    let body = multipart_body("comment", None, None, b"not a file at all");
    let response = app.oneshot(extract_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("No file supplied"));
}

#[tokio::test]
async fn text_content_type_is_rejected() {
    let app = app_with(MockMode::Success(sample_invoice()));
    let body = multipart_body("file", Some("nota.txt"), Some("text/plain"), b"plain text");
    let response = app.oneshot(extract_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Unsupported media type"));
}

#[tokio::test]
async fn png_bytes_behind_pdf_name_are_rejected() {
    let app = app_with(MockMode::Success(sample_invoice()));
    let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    let response = app
        .oneshot(extract_request(pdf_upload(&png)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Unsupported media type"));
}

#[tokio::test]
async fn empty_file_is_400() {
    let app = app_with(MockMode::Success(sample_invoice()));
    let response = app.oneshot(extract_request(pdf_upload(b""))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn file_above_size_cap_is_400() {
    let config = AppConfig::builder()
        .api_key("sk-test")
        .max_upload_bytes(64)
        .build()
        .unwrap();
    let app = app_with_config(MockMode::Success(sample_invoice()), config);

    let mut data = b"%PDF-1.4 ".to_vec();
    data.resize(65, b'x');
    let response = app.oneshot(extract_request(pdf_upload(&data))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("exceeds limit"));
}

// ── Upstream errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn upstream_timeout_maps_to_504() {
    let app = app_with(MockMode::Timeout);
    let response = app
        .oneshot(extract_request(pdf_upload(b"%PDF-1.4 x")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn upstream_failure_maps_to_502() {
    let app = app_with(MockMode::Failure);
    let response = app
        .oneshot(extract_request(pdf_upload(b"%PDF-1.4 x")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn malformed_upstream_content_maps_to_502_not_partial_200() {
    let app = app_with(MockMode::Malformed);
    let response = app
        .oneshot(extract_request(pdf_upload(b"%PDF-1.4 x")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("valor_total"));
    assert!(body.get("numero_nota").is_none());
}

// ── Auxiliary routes ─────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let app = app_with(MockMode::Success(sample_invoice()));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_i64());
}

#[tokio::test]
async fn docs_serves_html() {
    let app = app_with(MockMode::Success(sample_invoice()));
    let response = app
        .oneshot(Request::builder().uri("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/html"));
}
