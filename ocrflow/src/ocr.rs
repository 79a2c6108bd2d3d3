//! Text detection seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::google::ApiError;

/// A block of text found by the OCR service.
///
/// The first annotation of a detection result covers the whole image; later entries are the
/// individual words and are not used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub description: String,
    /// BCP-47 language the service detected for this block, if it reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The service processed the request but reported a per-image failure
    #[error("Text detection failed for {image_uri}: {message} (code {code})")]
    Detection { image_uri: String, code: i32, message: String },
}

/// Detects text in an image stored in object storage.
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Run text detection against a fully qualified object locator (`gs://bucket/name`).
    ///
    /// Returns the annotations in service order; an empty list means no text was found.
    async fn detect_text(&self, image_uri: &str) -> Result<Vec<TextAnnotation>, OcrError>;
}
