//! Plain directory archive.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use url::Url;

use super::ArchiveSink;
use crate::error::{ArchiveError, ArchiveResult};

/// A directory of archived page bodies, laid out by URL path.
///
/// `https://example.com/a/b.js` is written to `<root>/a/b.js`; paths ending
/// in `/` get an `index.html` file name and a query string is kept as part
/// of the file name, with path separators percent-encoded. The host is not
/// part of the layout, so one archive is meant for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    root: PathBuf,
}

impl Archive {
    /// Refer to an archive without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the archive directory if needed and return the archive.
    pub fn open(root: impl AsRef<Path>) -> ArchiveResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|source| io_error(root, source))?;
        let root = fs::canonicalize(root).map_err(|source| io_error(root, source))?;
        Ok(Self { root })
    }

    /// Archive root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a URL's body is stored in this archive.
    pub fn path_for(&self, url: &Url) -> ArchiveResult<PathBuf> {
        if url.cannot_be_a_base() {
            return Err(ArchiveError::InvalidUrl {
                url: url.to_string(),
            });
        }

        let mut relative = url.path().trim_start_matches('/').to_string();
        if let Some(query) = url.query() {
            relative.push('?');
            relative.push_str(&query.replace('/', "%2F").replace('\\', "%5C"));
        }
        if relative.is_empty() || relative.ends_with('/') {
            relative.push_str("index.html");
        }

        // Every component must stay below the root
        let path = Path::new(&relative);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(ArchiveError::InvalidUrl {
                url: url.to_string(),
            });
        }

        Ok(self.root.join(path))
    }

    /// Write a page body, creating parent directories as needed.
    ///
    /// Returns the full path of the written file.
    pub fn write(&self, url: &Url, body: &[u8]) -> ArchiveResult<PathBuf> {
        let path = self.path_for(url)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
        fs::write(&path, body).map_err(|source| io_error(&path, source))?;

        debug!(url = %url, path = %path.display(), bytes = body.len(), "Archived page");
        Ok(path)
    }
}

impl ArchiveSink for Archive {
    fn write(&mut self, url: &Url, body: &[u8]) -> ArchiveResult<PathBuf> {
        Archive::write(self, url, body)
    }
}

impl fmt::Display for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}
