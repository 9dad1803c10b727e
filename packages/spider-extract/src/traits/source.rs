//! Page source trait - the crawler collaborator that feeds the pipeline.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::error::SourceResult;
use crate::types::config::CrawlConfig;
use crate::types::page::PageRecord;

/// Ordered supply of fetched pages.
///
/// The pipeline only ever asks for the next page; link discovery, scheduling
/// and transport belong to the implementation. Pages are not `Send` (they
/// cache a parsed document), so neither are the futures returned here.
#[async_trait(?Send)]
pub trait PageSource {
    /// Called once before the first page is requested.
    ///
    /// Sources that crawl use the config to decide what to fetch.
    async fn start(&mut self, _config: &CrawlConfig) -> SourceResult<()> {
        Ok(())
    }

    /// Next page in visitation order, or `None` when the crawl is finished.
    async fn next_page(&mut self) -> SourceResult<Option<PageRecord>>;

    /// Source name (for logging/debugging).
    fn name(&self) -> &str;
}

/// Page source over pages that are already in memory.
#[derive(Debug, Default)]
pub struct IterSource {
    pages: VecDeque<PageRecord>,
}

impl IterSource {
    pub fn new(pages: impl IntoIterator<Item = PageRecord>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
        }
    }

    /// Pages not yet handed out.
    pub fn remaining(&self) -> usize {
        self.pages.len()
    }
}

#[async_trait(?Send)]
impl PageSource for IterSource {
    async fn next_page(&mut self) -> SourceResult<Option<PageRecord>> {
        Ok(self.pages.pop_front())
    }

    fn name(&self) -> &str {
        "iter"
    }
}

/// Page source adapting a stream of fetch results.
pub struct StreamSource<S> {
    name: String,
    stream: S,
}

impl<S> StreamSource<S>
where
    S: Stream<Item = SourceResult<PageRecord>> + Unpin,
{
    pub fn new(name: impl Into<String>, stream: S) -> Self {
        Self {
            name: name.into(),
            stream,
        }
    }
}

#[async_trait(?Send)]
impl<S> PageSource for StreamSource<S>
where
    S: Stream<Item = SourceResult<PageRecord>> + Unpin,
{
    async fn next_page(&mut self) -> SourceResult<Option<PageRecord>> {
        self.stream.next().await.transpose()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use url::Url;

    fn page(path: &str) -> PageRecord {
        PageRecord::new(Url::parse("https://example.com/").unwrap().join(path).unwrap(), Vec::new())
    }

    #[tokio::test]
    async fn test_iter_source_in_order() {
        let mut source = IterSource::new(vec![page("/a"), page("/b")]);
        source.start(&CrawlConfig::default()).await.unwrap();

        assert_eq!(source.next_page().await.unwrap().unwrap().url.path(), "/a");
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.next_page().await.unwrap().unwrap().url.path(), "/b");
        assert!(source.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stream_source_forwards_errors() {
        let items = vec![Ok(page("/a")), Err(SourceError::Closed)];
        let mut source = StreamSource::new("stream", futures::stream::iter(items));

        assert_eq!(source.name(), "stream");
        assert!(source.next_page().await.unwrap().is_some());
        assert!(matches!(source.next_page().await, Err(SourceError::Closed)));
        assert!(source.next_page().await.unwrap().is_none());
    }
}
