//! HTTP surface for the trigger infrastructure.
//!
//! - `POST /events/object-finalized`: object-store notification, runs the image processor
//! - `POST /events/result-message`: Pub/Sub push delivery, runs the result saver
//! - `GET /healthz`: liveness check
//!
//! Any non-2xx response marks the invocation as failed; redelivery is up to the trigger.

pub mod handlers;
