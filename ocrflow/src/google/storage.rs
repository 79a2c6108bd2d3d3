//! Cloud Storage JSON API client (simple media uploads).

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::instrument;
use url::Url;

use super::{ApiError, check_response, endpoint_url};
use crate::storage::{ObjectStore, StorageError};

const SERVICE: &str = "storage";

#[derive(Clone)]
pub struct GcsClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl GcsClient {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    fn upload_url(&self, bucket: &str, name: &str) -> Result<Url, ApiError> {
        let mut url = endpoint_url(SERVICE, &self.endpoint, &["upload", "storage", "v1", "b", bucket, "o"])?;
        url.query_pairs_mut().append_pair("uploadType", "media").append_pair("name", name);
        Ok(url)
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    #[instrument(skip(self, contents), fields(bytes = contents.len()), err)]
    async fn save(&self, bucket: &str, name: &str, contents: &str) -> Result<(), StorageError> {
        let url = self.upload_url(bucket, name)?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(contents.to_owned())
            .send()
            .await
            .map_err(|source| ApiError::Transport { service: SERVICE, source })?;

        check_response(SERVICE, response).await?;
        tracing::debug!("Uploaded gs://{}/{}", bucket, name);
        Ok(())
    }
}
