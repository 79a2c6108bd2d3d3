//! In-memory collaborators and fixtures for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::StatusCode;

use crate::AppState;
use crate::config::Config;
use crate::events::{PubsubMessage, ResultMessage};
use crate::google::ApiError;
use crate::messaging::{PublishError, Publisher};
use crate::ocr::{OcrError, TextAnnotation, TextDetector};
use crate::pipeline::{ImageProcessor, ResultSaver};
use crate::storage::{ObjectStore, StorageError};

fn unavailable(service: &'static str) -> ApiError {
    ApiError::Status {
        service,
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "backend unavailable".to_string(),
    }
}

/// Returns a fixed detection result and records every image it was asked about.
#[derive(Default)]
pub struct FakeDetector {
    annotations: Vec<TextAnnotation>,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeDetector {
    pub fn returning(annotations: Vec<TextAnnotation>) -> Self {
        Self {
            annotations,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextDetector for FakeDetector {
    async fn detect_text(&self, image_uri: &str) -> Result<Vec<TextAnnotation>, OcrError> {
        self.calls.lock().unwrap().push(image_uri.to_string());
        if self.fail {
            return Err(unavailable("vision").into());
        }
        Ok(self.annotations.clone())
    }
}

#[derive(Default)]
pub struct RecordingStore {
    fail: bool,
    saved: Mutex<Vec<(String, String, String)>>,
}

impl RecordingStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// `(bucket, name, contents)` for every successful write
    pub fn saved(&self) -> Vec<(String, String, String)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn save(&self, bucket: &str, name: &str, contents: &str) -> Result<(), StorageError> {
        if self.fail {
            return Err(unavailable("storage").into());
        }
        self.saved
            .lock()
            .unwrap()
            .push((bucket.to_string(), name.to_string(), contents.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    fail: bool,
    published: Mutex<Vec<(String, ResultMessage)>>,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<(String, ResultMessage)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, message: &ResultMessage) -> Result<String, PublishError> {
        if self.fail {
            return Err(unavailable("pubsub").into());
        }
        let mut published = self.published.lock().unwrap();
        published.push((topic.to_string(), message.clone()));
        Ok(format!("msg-{}", published.len()))
    }
}

/// A Pub/Sub message whose data is `json`, base64-encoded.
pub fn pubsub_message(json: &str) -> PubsubMessage {
    PubsubMessage {
        data: Some(STANDARD.encode(json)),
        message_id: Some("test-message".to_string()),
        ..Default::default()
    }
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        result_bucket: Some("out-bucket".to_string()),
        result_topic: Some("projects/test/topics/ocr-results".to_string()),
        ..Default::default()
    }
}

/// Collaborators wired into an [`AppState`], kept so tests can inspect what was called.
pub struct TestCollaborators {
    pub detector: Arc<FakeDetector>,
    pub store: Arc<RecordingStore>,
    pub publisher: Arc<RecordingPublisher>,
}

pub fn create_test_state(config: Config, detector: FakeDetector) -> (AppState, TestCollaborators) {
    let collaborators = TestCollaborators {
        detector: Arc::new(detector),
        store: Arc::new(RecordingStore::default()),
        publisher: Arc::new(RecordingPublisher::default()),
    };

    let image_processor = ImageProcessor::new(
        collaborators.detector.clone(),
        collaborators.publisher.clone(),
        config.result_topic.clone(),
        config.default_language.clone(),
    );
    let result_saver = ResultSaver::new(
        collaborators.store.clone(),
        config.result_bucket.clone(),
        config.default_language.clone(),
    );

    let state = AppState::builder()
        .config(config)
        .image_processor(Arc::new(image_processor))
        .result_saver(Arc::new(result_saver))
        .build();

    (state, collaborators)
}
