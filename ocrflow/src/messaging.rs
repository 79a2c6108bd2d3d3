//! Message bus seam used to hand detection results from the image processor to the result saver.

use async_trait::async_trait;
use thiserror::Error;

use crate::events::ResultMessage;
use crate::google::ApiError;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to encode result message: {0}")]
    Encode(#[from] serde_json::Error),

    /// Short topic names need a project to be resolved against
    #[error("Cannot resolve topic {topic}: no project id configured")]
    MissingProject { topic: String },

    #[error("Publish to {topic} returned no message id")]
    NoMessageId { topic: String },
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a result message to `topic` and return the id the bus assigned to it.
    ///
    /// `topic` is either a short topic name or a full `projects/{project}/topics/{topic}` path.
    async fn publish(&self, topic: &str, message: &ResultMessage) -> Result<String, PublishError>;
}
