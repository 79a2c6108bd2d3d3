//! The two pipeline stages.
//!
//! ```text
//! object finalized ──► ImageProcessor ──detect──► Vision
//!                            │
//!                            └──publish ResultMessage──► results topic
//!                                                            │
//! push delivery ◄────────────────────────────────────────────┘
//!       │
//!       └──► ResultSaver ──save {filename}_to_{lang}.txt──► result bucket
//! ```
//!
//! The stages never call each other; the message bus is the only link between them.

pub mod image_processor;
pub mod result_saver;

pub use image_processor::{ImageProcessor, ProcessedImage};
pub use result_saver::{ResultSaver, SavedFile};
