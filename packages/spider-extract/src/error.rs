//! Typed errors for the spider extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. The scanner, classifiers and
//! dedup trackers never fail; only the page source, the archive sinks and
//! configuration parsing have error paths.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate an extraction run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The page source failed to produce the next page
    #[error("page source failed: {0}")]
    Source(#[from] SourceError),

    /// The run was cancelled before the source was exhausted
    #[error("run cancelled")]
    Cancelled,
}

/// Errors raised by a page source (the external crawler).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Fetching a page failed in a way the source cannot recover from
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The source was closed underneath the pipeline
    #[error("page source closed")]
    Closed,
}

/// Errors raised by the archive sinks.
///
/// A missing `git` binary and a failed `git` command are distinct variants so
/// callers can tell "tool not installed" apart from "operation failed".
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Filesystem operation failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `git` could not be found on the `PATH`
    #[error("the git command was not found")]
    GitNotInstalled,

    /// `git` ran but exited unsuccessfully
    #[error("git command failed: {command}")]
    GitFailed { command: String },

    /// URL cannot be mapped onto an archive path
    #[error("cannot archive URL: {url}")]
    InvalidUrl { url: String },
}

/// Errors raised while building or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Proxy string is not a usable `scheme://host[:port]` URL
    #[error("invalid proxy: {0}")]
    InvalidProxy(String),

    /// A host/link/extension pattern did not compile
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A port value is out of range
    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// No URL schemes are allowed
    #[error("at least one URL scheme must be allowed")]
    NoSchemes,

    /// Crawl scope could not be parsed
    #[error("invalid crawl scope: {0}")]
    InvalidScope(String),
}

/// Result type alias for pipeline runs.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for page sources.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for archive operations.
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Result type alias for configuration.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
