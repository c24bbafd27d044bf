//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock stage adapters injected, so the full request -> pipeline ->
//! publish path runs without an LLM, a TTS service, Manim or ffmpeg.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use edapt_core::{
    testing::{MockContentGenerator, MockMuxer, MockRenderer, MockSynthesizer},
    Config, InMemorySessionStore, JobDispatcher, PipelineController, Publisher, SessionStore,
    StageAdapters, StorageConfig,
};
use edapt_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use edapt_core::testing::fixtures;

/// Test fixture for API testing with mock stage adapters.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_session_creation() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/sessions", json!({ "query": "Why is the sky blue?" })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub store: Arc<InMemorySessionStore>,
    pub generator: Arc<MockContentGenerator>,
    pub synthesizer: Arc<MockSynthesizer>,
    pub renderer: Arc<MockRenderer>,
    pub muxer: Arc<MockMuxer>,
    pub storage: StorageConfig,
    /// Temporary directory holding session output and the public tree
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Raw response, for non-JSON endpoints
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.storage = StorageConfig {
            output_dir: temp_dir.path().join("output"),
            public_dir: temp_dir.path().join("public"),
            public_url_prefix: "/public".to_string(),
        };
        config.pipeline.auto_publish = test_config.auto_publish;
        config.content.api_key = Some("sk-test-secret".to_string());
        config.narration.api_key = Some("tts-test-secret".to_string());

        let store = Arc::new(InMemorySessionStore::new());
        let generator = Arc::new(MockContentGenerator::new());
        let synthesizer = Arc::new(MockSynthesizer::new());
        let renderer = Arc::new(MockRenderer::new());
        let muxer = Arc::new(MockMuxer::new());

        let controller = Arc::new(PipelineController::new(
            config.pipeline.clone(),
            config.storage.output_dir.clone(),
            Arc::clone(&store) as Arc<dyn SessionStore>,
            StageAdapters {
                generator: generator.clone(),
                synthesizer: synthesizer.clone(),
                renderer: renderer.clone(),
                muxer: muxer.clone(),
            },
        ));
        let publisher = Arc::new(Publisher::new(config.storage.clone()));

        let mut dispatcher =
            JobDispatcher::new(Arc::clone(&store) as Arc<dyn SessionStore>, controller);
        if test_config.auto_publish {
            dispatcher = dispatcher.with_publisher(Arc::clone(&publisher));
        }

        let storage = config.storage.clone();
        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            dispatcher,
            publisher,
        ));

        Self {
            router: create_router(state),
            store,
            generator,
            synthesizer,
            renderer,
            muxer,
            storage,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let raw = self.send(request).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.body),
        }
    }

    /// Send a GET request and keep the body as bytes.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Submit a generation and wait until the session is terminal.
    pub async fn submit_and_wait(&self, body: Value) -> Value {
        let response = self.post("/api/v1/sessions", body).await;
        assert_eq!(response.status, StatusCode::ACCEPTED, "{:?}", response.body);
        let session_id = response.body["session_id"]
            .as_str()
            .expect("session_id missing")
            .to_string();
        self.wait_for_terminal(&session_id).await
    }

    /// Poll the status endpoint until the session is no longer processing.
    pub async fn wait_for_terminal(&self, session_id: &str) -> Value {
        let path = format!("/api/v1/sessions/{}/status", session_id);
        for _ in 0..500 {
            let response = self.get(&path).await;
            assert_eq!(response.status, StatusCode::OK);
            if response.body["status"] != "processing" {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session {} did not finish in time", session_id);
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        RawResponse { status, body }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        let raw = self.send(request).await;

        TestResponse {
            status: raw.status,
            body: parse_json(&raw.body),
        }
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Publish every completed session automatically
    pub auto_publish: bool,
}

impl TestConfig {
    pub fn with_auto_publish() -> Self {
        Self { auto_publish: true }
    }
}
