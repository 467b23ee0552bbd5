//! Common test utilities for in-process API testing with a mock processor.
//!
//! This module provides a test fixture that builds the router around a
//! [`MockProcessor`] and a private workspace root, so requests run end to end
//! without ffmpeg.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use loudnorm_core::testing::MockProcessor;
use loudnorm_core::Config;
use loudnorm_server::{create_router, AppState};

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "loudnorm-test-boundary";

/// Test fixture for API testing with a mock processor.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_analyze() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.upload("/analyze", &[("a.mp3", b"ID3")]).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock processor - script per-file outcomes
    pub processor: Arc<MockProcessor>,
    /// Holds the workspace root
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    /// Body parsed as JSON (`Null` when it is not JSON).
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test fixture, letting the caller adjust the configuration.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.workspace.temp_dir = temp_dir.path().join("work");
        adjust(&mut config);

        let processor = Arc::new(MockProcessor::new());
        let state = Arc::new(AppState::with_processor(config, processor.clone()));
        let router = create_router(state);

        Self {
            router,
            processor,
            temp_dir,
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.temp_dir.path().join("work")
    }

    /// Number of request workspaces still on disk.
    pub fn leftover_workspaces(&self) -> usize {
        match std::fs::read_dir(self.work_dir()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST the given files as `files` parts of a multipart form.
    pub async fn upload(&self, path: &str, files: &[(&str, &[u8])]) -> TestResponse {
        self.post_multipart(path, multipart_body(files)).await
    }

    /// POST a pre-built multipart body.
    pub async fn post_multipart(&self, path: &str, body: Vec<u8>) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Send a request and consume the whole body.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            bytes,
        }
    }
}

/// One `files` part per entry, in order.
pub fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, content) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: audio/mpeg\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// A text field that is not part of the upload.
pub fn multipart_with_extra_field(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"comment\"\r\n\r\nhello\r\n",
        BOUNDARY
    )
    .into_bytes();
    body.extend_from_slice(&multipart_body(files));
    body
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status,
            $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            String::from_utf8_lossy(&$response.bytes)
        );
    };
}
