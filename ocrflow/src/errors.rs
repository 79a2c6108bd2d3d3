use crate::{messaging::PublishError, ocr::OcrError, storage::StorageError};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// A required field was absent or empty in the trigger payload
    #[error("{label} not provided. Make sure you have a \"{property}\" property in your request")]
    MissingField { label: &'static str, property: &'static str },

    /// The message data could not be decoded into a result message
    #[error("Malformed message payload: {reason}")]
    MalformedPayload { reason: String },

    /// Required configuration was not supplied
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Text detection call failed
    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// Object storage write failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Publishing to the message bus failed
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl Error {
    pub fn missing_field(label: &'static str, property: &'static str) -> Self {
        Error::MissingField { label, property }
    }

    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        Error::MalformedPayload {
            reason: reason.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingField { .. } | Error::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            Error::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Ocr(_) | Error::Storage(_) | Error::Publish(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message returned to the trigger infrastructure. Upstream failures are summarised so
    /// response bodies from the Google APIs are only ever logged.
    pub fn user_message(&self) -> String {
        match self {
            Error::MissingField { .. } | Error::MalformedPayload { .. } | Error::Configuration { .. } => self.to_string(),
            Error::Ocr(_) => "Text detection request failed".to_string(),
            Error::Storage(_) => "Storage write failed".to_string(),
            Error::Publish(_) => "Publishing result message failed".to_string(),
        }
    }
}

/// Trigger bodies that fail to deserialize are malformed payloads, not axum's 4xx texts.
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::malformed(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Ocr(_) | Error::Storage(_) | Error::Publish(_) => {
                tracing::error!("Upstream service error: {:#}", self);
            }
            Error::Configuration { .. } => {
                tracing::error!("{}", self);
            }
            Error::MissingField { .. } | Error::MalformedPayload { .. } => {
                tracing::warn!("Rejected invocation: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for pipeline operation results
pub type Result<T> = std::result::Result<T, Error>;
