//! Archive sinks for raw page bodies.
//!
//! The pipeline never writes anything itself; consumers that want page
//! bodies on disk wire an [`ArchiveSink`] into a callback.

pub mod fs;
pub mod git;

use std::path::PathBuf;

use url::Url;

use crate::error::ArchiveResult;

pub use fs::Archive;
pub use git::{GitArchive, GitRunner, SystemGit};

/// Destination for `(url, body)` pairs.
pub trait ArchiveSink {
    /// Persist a body under a path derived from the URL, returning the path.
    fn write(&mut self, url: &Url, body: &[u8]) -> ArchiveResult<PathBuf>;
}
