use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::instrument;

use crate::{
    AppState,
    errors::Result,
    events::{PushEnvelope, UploadEvent},
    pipeline::{ProcessedImage, SavedFile},
};

/// Object finalized in the upload bucket.
#[instrument(skip_all)]
pub async fn object_finalized(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UploadEvent>, JsonRejection>,
) -> Result<Json<ProcessedImage>> {
    let Json(event) = payload?;
    let processed = state.image_processor.process(&event).await?;
    Ok(Json(processed))
}

/// Result message pushed by the results subscription.
#[instrument(skip_all)]
pub async fn result_message(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PushEnvelope>, JsonRejection>,
) -> Result<Json<SavedFile>> {
    let Json(envelope) = payload?;
    tracing::debug!(subscription = ?envelope.subscription, "Received result message");
    let saved = state.result_saver.save(&envelope.message).await?;
    Ok(Json(saved))
}

pub async fn healthz() -> &'static str {
    "OK"
}
