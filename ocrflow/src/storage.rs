use async_trait::async_trait;
use thiserror::Error;

use crate::google::ApiError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Write access to an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `contents` as the object `name` in `bucket`, replacing any existing object.
    async fn save(&self, bucket: &str, name: &str, contents: &str) -> Result<(), StorageError>;
}
