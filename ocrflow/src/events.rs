//! Trigger payloads and the result message passed between the two pipeline stages.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Object-store notification for a newly finalized object.
///
/// This is the object resource as delivered by the storage notification; fields other than
/// `bucket` and `name` (content type, size, generation, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadEvent {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl UploadEvent {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            name: Some(name.into()),
        }
    }

    /// Returns `(bucket, name)`, rejecting absent or empty values.
    pub fn validate(&self) -> Result<(&str, &str)> {
        let bucket = non_empty(&self.bucket).ok_or(Error::missing_field("Bucket", "bucket"))?;
        let name = non_empty(&self.name).ok_or(Error::missing_field("Filename", "name"))?;
        Ok((bucket, name))
    }
}

/// Fully qualified locator for an object in Cloud Storage.
pub fn object_uri(bucket: &str, name: &str) -> String {
    format!("gs://{bucket}/{name}")
}

/// Push delivery wrapper sent by a Pub/Sub push subscription.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushEnvelope {
    pub message: PubsubMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

/// A single Pub/Sub message. `data` holds the base64-encoded payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
}

impl PubsubMessage {
    /// Encode a result message as the JSON-in-base64 data of an outgoing message.
    pub fn encode(message: &ResultMessage) -> serde_json::Result<Self> {
        let json = serde_json::to_vec(message)?;
        Ok(Self {
            data: Some(STANDARD.encode(json)),
            ..Default::default()
        })
    }
}

/// Detection result handed from the image processor to the result saver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResultMessage {
    pub text: String,
    pub filename: String,
    pub lang: String,
}

/// Decoded message body before required fields are checked.
#[derive(Debug, Deserialize)]
struct RawResultMessage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    lang: Option<String>,
}

impl ResultMessage {
    /// Decode a Pub/Sub message into a result message.
    ///
    /// Decoding failures (base64, UTF-8, JSON) are reported before missing fields. A message
    /// without a `lang` is attributed to `default_lang`.
    pub fn decode(message: &PubsubMessage, default_lang: &str) -> Result<Self> {
        let data = message.data.as_deref().ok_or_else(|| Error::malformed("message has no data"))?;
        let bytes = STANDARD.decode(data.trim()).map_err(|e| Error::malformed(format!("invalid base64: {e}")))?;
        let json = String::from_utf8(bytes).map_err(|e| Error::malformed(format!("invalid UTF-8: {e}")))?;
        let raw: RawResultMessage = serde_json::from_str(&json).map_err(|e| Error::malformed(format!("invalid JSON: {e}")))?;

        let text = non_empty(&raw.text).ok_or(Error::missing_field("Text", "text"))?;
        let filename = non_empty(&raw.filename).ok_or(Error::missing_field("Filename", "filename"))?;
        let lang = non_empty(&raw.lang).unwrap_or(default_lang);

        Ok(Self {
            text: text.to_string(),
            filename: filename.to_string(),
            lang: lang.to_string(),
        })
    }
}

/// Name of the text file a result is saved under.
pub fn rename_image_for_save(filename: &str, lang: &str) -> String {
    format!("{filename}_to_{lang}.txt")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
