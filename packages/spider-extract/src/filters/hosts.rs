//! Host name dedup tracker.

use indexmap::IndexSet;
use tracing::debug;

use crate::types::page::PageRecord;

/// Yields each page host name the first time it is seen.
///
/// Host names are compared as the crawler normalized them; no case folding
/// happens here.
#[derive(Debug, Clone, Default)]
pub struct HostTracker {
    seen: IndexSet<String>,
}

impl HostTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the page's host, returning it if it was not seen before.
    pub fn observe<'p>(&mut self, page: &'p PageRecord) -> Option<&'p str> {
        let host = page.host()?;
        if self.seen.contains(host) {
            return None;
        }

        self.seen.insert(host.to_string());
        debug!(host = %host, total = self.seen.len(), "New host discovered");
        Some(host)
    }

    /// Hosts seen so far, in discovery order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.seen.iter().map(String::as_str)
    }

    /// Check if a host was already yielded.
    pub fn contains(&self, host: &str) -> bool {
        self.seen.contains(host)
    }

    /// Number of distinct hosts seen.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if no host has been seen.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
