//! Cloud Vision `images:annotate` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::{ApiError, check_response, endpoint_url};
use crate::ocr::{OcrError, TextAnnotation, TextDetector};

const SERVICE: &str = "vision";

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: Image<'a>,
    features: [Feature; 1],
}

#[derive(Debug, Serialize)]
struct Image<'a> {
    source: ImageSource<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageSource<'a> {
    image_uri: &'a str,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    #[serde(default)]
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Text detection backed by the Cloud Vision REST API.
#[derive(Clone)]
pub struct VisionClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl VisionClient {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl TextDetector for VisionClient {
    #[instrument(skip(self), err)]
    async fn detect_text(&self, image_uri: &str) -> Result<Vec<TextAnnotation>, OcrError> {
        let url = endpoint_url(SERVICE, &self.endpoint, &["v1", "images:annotate"])?;
        let body = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: Image {
                    source: ImageSource { image_uri },
                },
                features: [Feature { kind: "TEXT_DETECTION" }],
            }],
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { service: SERVICE, source })?;

        let response: AnnotateResponse = check_response(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|source| ApiError::Decode { service: SERVICE, source })?;

        let image = response.responses.into_iter().next().unwrap_or_default();
        if let Some(status) = image.error {
            return Err(OcrError::Detection {
                image_uri: image_uri.to_string(),
                code: status.code,
                message: status.message,
            });
        }

        tracing::debug!(annotations = image.text_annotations.len(), "Text detection completed");
        Ok(image.text_annotations)
    }
}
