use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::errors::{Error, Result};
use crate::events::{PubsubMessage, ResultMessage, rename_image_for_save};
use crate::storage::ObjectStore;

/// A text file written by the result saver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    pub bucket: String,
    pub name: String,
    pub lang: String,
}

/// Persists detection results delivered over the message bus.
pub struct ResultSaver {
    store: Arc<dyn ObjectStore>,
    result_bucket: Option<String>,
    default_language: String,
}

impl ResultSaver {
    pub fn new(store: Arc<dyn ObjectStore>, result_bucket: Option<String>, default_language: impl Into<String>) -> Self {
        Self {
            store,
            result_bucket,
            default_language: default_language.into(),
        }
    }

    #[instrument(skip_all, fields(message_id = ?message.message_id))]
    pub async fn save(&self, message: &PubsubMessage) -> Result<SavedFile> {
        let result = ResultMessage::decode(message, &self.default_language)?;

        let bucket = self
            .result_bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Error::Configuration {
                message: "RESULT_BUCKET is not set; cannot save results".to_string(),
            })?;

        let name = rename_image_for_save(&result.filename, &result.lang);
        info!("Saving result to {} in bucket {}", name, bucket);
        self.store.save(bucket, &name, &result.text).await?;
        info!("File saved.");

        Ok(SavedFile {
            bucket: bucket.to_string(),
            name,
            lang: result.lang,
        })
    }
}
