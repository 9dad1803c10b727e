//! Spider Extraction Library
//!
//! Derives structured facts from a stream of pages fetched by a web crawler:
//! host names, TLS certificates, favicons, HTML comments and, from every
//! JavaScript source, string literals (optionally filtered to paths or URLs)
//! and comments.
//!
//! # Design Philosophy
//!
//! - The crawler is a collaborator, not a base type: it plugs in as a
//!   [`PageSource`]
//! - JavaScript is scanned, not parsed; malformed input never fails
//! - Dedup trackers yield each key once, in first-discovery order
//! - Consumers choose per registration whether they want the page too
//!
//! # Usage
//!
//! ```rust,ignore
//! use spider_extract::{Callback, ExtractionPipeline, IterSource};
//!
//! let mut urls = Vec::new();
//! let mut comments = Vec::new();
//!
//! let mut pipeline = ExtractionPipeline::new();
//! pipeline
//!     .every_javascript_url_string(Callback::value(|s: &str| urls.push(s.to_string())))
//!     .every_comment(Callback::with_page(|c: &str, page: &PageRecord| {
//!         comments.push(format!("{}: {}", page.url, c))
//!     }));
//!
//! let stats = pipeline.run(&mut IterSource::new(pages)).await?;
//! ```
//!
//! # Modules
//!
//! - [`js`] - JavaScript lexical scanner, unescaping and classifiers
//! - [`filters`] - Host/cert trackers, favicon filter, comment and script discovery
//! - [`pipeline`] - Extraction pipeline and callback dispatch
//! - [`traits`] - Page source abstraction
//! - [`types`] - Page, certificate and configuration types
//! - [`archive`] - Directory and git-backed archive sinks
//! - [`testing`] - Mock implementations for testing

pub mod archive;
pub mod error;
pub mod filters;
pub mod js;
pub mod pipeline;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ArchiveError, ConfigError, PipelineError, SourceError};
pub use traits::{IterSource, PageSource, StreamSource};
pub use types::{
    cert::Certificate,
    config::{CrawlConfig, CrawlScope, ExtractionConfig, Pattern, Proxy},
    page::{PageRecord, TlsSession},
};

// Re-export scanner and classifiers
pub use js::{
    contains_url, is_absolute_path, is_path, is_relative_path, scan, Classifier, JsScanner,
    ScanSpan, SpanKind,
};

// Re-export filters
pub use filters::{CertTracker, FaviconFilter, HostTracker};

// Re-export pipeline components
pub use pipeline::{Callback, Dispatcher, ExtractionPipeline, IncludeOrigin, PipelineStats};

// Re-export archives
pub use archive::{Archive, ArchiveSink, GitArchive, GitRunner, SystemGit};

// Re-export testing utilities
pub use testing::{MockPageSource, MockSourceCall};
