//! REST clients for the hosted Google Cloud services the pipeline delegates to.
//!
//! Each client implements one of the collaborator traits ([`crate::ocr::TextDetector`],
//! [`crate::storage::ObjectStore`], [`crate::messaging::Publisher`]) and talks to the service's
//! JSON API over a shared [`reqwest::Client`]. Credential discovery is not handled here: requests
//! carry a static bearer token when one is configured, and are otherwise sent unauthenticated
//! (which is what the emulators and a credential-injecting sidecar expect).

pub mod pubsub;
pub mod storage;
pub mod vision;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::GoogleApiConfig;

pub use pubsub::PubSubClient;
pub use storage::GcsClient;
pub use vision::VisionClient;

/// Header naming the project billed for quota.
const USER_PROJECT_HEADER: &str = "x-goog-user-project";

/// Transport-level failure talking to one of the Google APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS)
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    /// The success response body did not have the expected shape
    #[error("{service} returned an unreadable response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The configured endpoint cannot have path segments appended
    #[error("{service} endpoint {endpoint} is not a valid base URL")]
    InvalidEndpoint { service: &'static str, endpoint: String },
}

/// Build the HTTP client shared by all service clients.
pub fn build_http_client(config: &GoogleApiConfig) -> anyhow::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();

    if let Some(token) = &config.access_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    if let Some(project) = &config.quota_project {
        headers.insert(USER_PROJECT_HEADER, HeaderValue::from_str(project)?);
    }

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .default_headers(headers)
        .build()?;

    Ok(client)
}

/// Append path segments to a service endpoint, percent-encoding each segment.
pub(crate) fn endpoint_url(service: &'static str, base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidEndpoint {
            service,
            endpoint: base.to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-success response into [`ApiError::Status`], keeping the body for the logs.
pub(crate) async fn check_response(service: &'static str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(service, %status, body = %body, "Google API request failed");
    Err(ApiError::Status { service, status, body })
}
