#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use bytes::Bytes;
use doc_transcribe::config::AppConfig;
use doc_transcribe::services::batch::BatchOrchestrator;
use doc_transcribe::services::retrieval::TextRetrieval;
use doc_transcribe::services::storage::{ObjectStore, StorageError};
use doc_transcribe::services::transcription::{TranscriptionClient, TranscriptionError};
use doc_transcribe::services::worker_pool::WorkerPool;
use doc_transcribe::utils::validation::Validator;
use doc_transcribe::{AppState, create_app};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n1 0 obj << >> endobj\n%%EOF";
pub const BOUNDARY: &str = "----doc-transcribe-test-boundary";

pub struct MockObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failing_keys: Mutex<HashSet<String>>,
    writes: Mutex<Vec<String>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            failing_keys: Mutex::new(HashSet::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Every read or write of `key` fails with a backend error.
    pub fn fail_on(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.writes.lock().unwrap().push(key.to_string());
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(StorageError::Backend(format!("write refused for {}", key)));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(StorageError::Backend(format!("read refused for {}", key)));
        }
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Scripted transcription service.
///
/// Files without a scripted response get `"Text of <filename>"`. Each call
/// sleeps briefly so concurrent calls overlap and the peak can be observed.
pub struct MockTranscriber {
    responses: Mutex<HashMap<String, Result<String, String>>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay: Duration::from_millis(20),
        }
    }

    pub fn respond(self, filename: &str, text: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(filename.to_string(), Ok(text.to_string()));
        self
    }

    pub fn fail(self, filename: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(filename.to_string(), Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionClient for MockTranscriber {
    async fn transcribe(
        &self,
        filename: &str,
        _document: &[u8],
        _instruction: &str,
    ) -> Result<String, TranscriptionError> {
        self.calls.lock().unwrap().push(filename.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        let scripted = self.responses.lock().unwrap().get(filename).cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match scripted {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(TranscriptionError::Generation(message)),
            None => Ok(format!("Text of {}", filename)),
        }
    }
}

pub struct TestApp {
    pub router: axum::Router,
    pub storage: Arc<MockObjectStore>,
    pub transcriber: Arc<MockTranscriber>,
}

pub fn setup_app(transcriber: MockTranscriber, max_concurrency: usize) -> TestApp {
    let storage = Arc::new(MockObjectStore::new());
    setup_app_with_storage(storage, transcriber, max_concurrency)
}

pub fn setup_app_with_storage(
    storage: Arc<MockObjectStore>,
    transcriber: MockTranscriber,
    max_concurrency: usize,
) -> TestApp {
    let config = AppConfig {
        max_concurrency,
        ..AppConfig::development()
    };
    setup_app_with_config(storage, transcriber, config)
}

pub fn setup_app_with_config(
    storage: Arc<MockObjectStore>,
    transcriber: MockTranscriber,
    config: AppConfig,
) -> TestApp {
    let transcriber = Arc::new(transcriber);

    let orchestrator = BatchOrchestrator::new(
        storage.clone(),
        transcriber.clone(),
        WorkerPool::new(config.max_concurrency),
        Validator::new(config.max_file_size),
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        retrieval: Arc::new(TextRetrieval::new(storage.clone())),
        config: Arc::new(config),
    };

    TestApp {
        router: create_app(state),
        storage,
        transcriber,
    }
}

/// Builds a multipart/form-data body with one `files` part per entry.
pub fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, data) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(files: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
