use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::errors::Result;
use crate::events::{ResultMessage, UploadEvent, object_uri};
use crate::messaging::Publisher;
use crate::ocr::TextDetector;

/// Outcome of processing one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedImage {
    #[serde(flatten)]
    pub result: ResultMessage,
    /// Id assigned by the message bus, if the result was published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Runs text detection on newly uploaded images and forwards the result.
pub struct ImageProcessor {
    detector: Arc<dyn TextDetector>,
    publisher: Arc<dyn Publisher>,
    result_topic: Option<String>,
    default_language: String,
}

impl ImageProcessor {
    pub fn new(
        detector: Arc<dyn TextDetector>,
        publisher: Arc<dyn Publisher>,
        result_topic: Option<String>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            detector,
            publisher,
            result_topic,
            default_language: default_language.into(),
        }
    }

    #[instrument(skip_all, fields(bucket = ?event.bucket, name = ?event.name))]
    pub async fn process(&self, event: &UploadEvent) -> Result<ProcessedImage> {
        let (bucket, name) = event.validate()?;

        info!("Looking for text in image {}", name);
        let annotations = self.detector.detect_text(&object_uri(bucket, name)).await?;

        let (text, locale) = match annotations.into_iter().next() {
            Some(annotation) => (annotation.description, annotation.locale),
            None => (String::new(), None),
        };
        info!(text = %text, "Extracted text from image");

        let result = ResultMessage {
            text,
            filename: name.to_string(),
            lang: locale.filter(|l| !l.is_empty()).unwrap_or_else(|| self.default_language.clone()),
        };

        // The result saver rejects messages without text, so blank images stop here
        let message_id = match &self.result_topic {
            Some(_) if result.text.is_empty() => {
                info!("No text found in image {}, not publishing", name);
                None
            }
            Some(topic) => Some(self.publisher.publish(topic, &result).await?),
            None => {
                debug!("No result topic configured, not publishing");
                None
            }
        };

        info!("File {} processed.", name);
        Ok(ProcessedImage { result, message_id })
    }
}
