//! Extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Pulling pages from a [`PageSource`](crate::traits::PageSource)
//! - Host and certificate dedup
//! - Favicon detection
//! - JavaScript source discovery, string extraction and classification
//! - HTML and JavaScript comment extraction
//! - Delivery to value-only or value-with-page consumers

pub mod dispatch;
pub mod runner;

pub use dispatch::{Callback, Dispatcher, IncludeOrigin};
pub use runner::{ExtractionPipeline, PipelineStats};
