//! Cloud Pub/Sub publish client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::{ApiError, check_response, endpoint_url};
use crate::events::{PubsubMessage, ResultMessage};
use crate::messaging::{PublishError, Publisher};

const SERVICE: &str = "pubsub";

#[derive(Debug, Serialize)]
struct PublishRequest {
    messages: Vec<PubsubMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

#[derive(Clone)]
pub struct PubSubClient {
    client: reqwest::Client,
    endpoint: Url,
    project_id: Option<String>,
}

impl PubSubClient {
    pub fn new(client: reqwest::Client, endpoint: Url, project_id: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            project_id,
        }
    }

    /// Resolve a short topic name against the configured project. Full topic paths pass through.
    fn topic_path(&self, topic: &str) -> Result<String, PublishError> {
        if topic.starts_with("projects/") {
            return Ok(topic.to_string());
        }

        let project = self.project_id.as_deref().ok_or_else(|| PublishError::MissingProject {
            topic: topic.to_string(),
        })?;
        Ok(format!("projects/{project}/topics/{topic}"))
    }
}

#[async_trait]
impl Publisher for PubSubClient {
    #[instrument(skip(self, message), fields(filename = %message.filename), err)]
    async fn publish(&self, topic: &str, message: &ResultMessage) -> Result<String, PublishError> {
        let topic_path = self.topic_path(topic)?;

        // The topic path's own slashes must survive, so split it back into segments
        let url = {
            let mut segments: Vec<&str> = topic_path.split('/').collect();
            let publish_segment = format!("{}:publish", segments.pop().unwrap_or_default());
            segments.insert(0, "v1");
            segments.push(&publish_segment);
            endpoint_url(SERVICE, &self.endpoint, &segments)?
        };

        let mut outgoing = PubsubMessage::encode(message)?;
        outgoing.attributes.insert("filename".to_string(), message.filename.clone());
        outgoing.attributes.insert("lang".to_string(), message.lang.clone());

        let response = self
            .client
            .post(url)
            .json(&PublishRequest { messages: vec![outgoing] })
            .send()
            .await
            .map_err(|source| ApiError::Transport { service: SERVICE, source })?;

        let response: PublishResponse = check_response(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|source| ApiError::Decode { service: SERVICE, source })?;

        let message_id = response
            .message_ids
            .into_iter()
            .next()
            .ok_or(PublishError::NoMessageId { topic: topic_path })?;

        tracing::debug!(message_id = %message_id, "Published result message");
        Ok(message_id)
    }
}
