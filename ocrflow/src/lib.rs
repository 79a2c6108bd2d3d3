//! # ocrflow: event-driven OCR pipeline
//!
//! `ocrflow` detects text in images as they land in object storage and saves the extracted text
//! back to storage as plain-text files. The text detection, storage and messaging themselves are
//! delegated to hosted Google Cloud services; this crate is the orchestration between them.
//!
//! ## Overview
//!
//! Two independently triggered stages make up the pipeline:
//!
//! - The **image processor** ([`pipeline::ImageProcessor`]) runs when an object is finalized in
//!   the upload bucket. It asks Cloud Vision for text in `gs://{bucket}/{name}`, takes the first
//!   annotation (the full text block), and publishes a [`events::ResultMessage`] to the results
//!   topic.
//! - The **result saver** ([`pipeline::ResultSaver`]) runs when a result message is pushed from
//!   the results subscription. It decodes the message and writes the text to
//!   `{filename}_to_{lang}.txt` in the result bucket.
//!
//! The stages only communicate through the message bus. Each trigger delivery is one invocation:
//! it either succeeds or fails as a whole, and retrying is left to the trigger infrastructure.
//!
//! ## Architecture
//!
//! The service is an [Axum](https://github.com/tokio-rs/axum) application exposing one push
//! endpoint per trigger (see [`api`]). The external services sit behind the
//! [`ocr::TextDetector`], [`storage::ObjectStore`] and [`messaging::Publisher`] traits, with REST
//! implementations in [`google`]. Collaborators are built once at startup and shared by all
//! invocations through [`AppState`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use ocrflow::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = ocrflow::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     ocrflow::install_crypto_provider();
//!     ocrflow::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod errors;
pub mod events;
pub mod google;
pub mod messaging;
pub mod ocr;
pub mod pipeline;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use std::sync::{Arc, Once};

use axum::{
    Router,
    routing::{get, post},
};
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

pub use config::Config;

use crate::google::{GcsClient, PubSubClient, VisionClient, build_http_client};
use crate::pipeline::{ImageProcessor, ResultSaver};

/// Application state shared across all request handlers.
///
/// Holds the two pipeline stages, each wired to its external collaborators at startup.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub image_processor: Arc<ImageProcessor>,
    pub result_saver: Arc<ResultSaver>,
}

impl AppState {
    /// Build the pipeline stages on top of the Google REST clients.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let http = build_http_client(&config.google)?;

        let detector = Arc::new(VisionClient::new(http.clone(), config.google.vision_endpoint.clone()));
        let store = Arc::new(GcsClient::new(http.clone(), config.google.storage_endpoint.clone()));
        let publisher = Arc::new(PubSubClient::new(
            http,
            config.google.pubsub_endpoint.clone(),
            config.google.project_id.clone(),
        ));

        let image_processor = ImageProcessor::new(detector, publisher, config.result_topic.clone(), config.default_language.clone());
        let result_saver = ResultSaver::new(store, config.result_bucket.clone(), config.default_language.clone());

        Ok(Self::builder()
            .config(config)
            .image_processor(Arc::new(image_processor))
            .result_saver(Arc::new(result_saver))
            .build())
    }
}

/// Install the process-wide rustls crypto provider used by the HTTP client.
///
/// Safe to call more than once; only the first call has an effect.
pub fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        // Err means another provider is already installed, which is fine
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    });
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/events/object-finalized", post(api::handlers::object_finalized))
        .route("/events/result-message", post(api::handlers::result_message))
        .route("/healthz", get(api::handlers::healthz))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns the router and configuration.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all collaborators initialized
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting ocrflow with configuration: {:#?}", config);

        if config.result_bucket.is_none() {
            info!("RESULT_BUCKET is not set; result messages will be rejected");
        }
        if config.result_topic.is_none() {
            info!("RESULT_TOPIC is not set; extracted text will only be logged");
        }

        let state = AppState::from_config(config.clone())?;
        Ok(Self::from_state(state))
    }

    /// Create an application around an already-built state (e.g. with in-memory collaborators)
    pub fn from_state(state: AppState) -> Self {
        let config = state.config.clone();
        Self {
            router: build_router(state),
            config,
        }
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "ocrflow listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
