//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction library
//! without running a real crawler.

use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use url::Url;

use crate::error::{SourceError, SourceResult};
use crate::traits::source::PageSource;
use crate::types::config::CrawlConfig;
use crate::types::page::{PageRecord, TlsSession};

/// A mock page source for testing.
///
/// Hands out predefined pages in order and records how it was driven.
/// Clones share the same call log, so a test can keep one clone for
/// assertions while the pipeline drives the other.
#[derive(Clone, Default)]
pub struct MockPageSource {
    /// Pages still to be handed out
    pages: Rc<RefCell<VecDeque<PageRecord>>>,

    /// Fail with this URL once the queue is drained to this many pages
    fail_at: Option<(usize, String)>,

    /// Call tracking
    calls: Rc<RefCell<Vec<MockSourceCall>>>,
}

/// Record of a call made to the mock source.
#[derive(Debug, Clone, PartialEq)]
pub enum MockSourceCall {
    Start {
        user_agent: Option<String>,
        schemes: Vec<String>,
    },
    NextPage,
}

impl MockPageSource {
    /// Create an empty mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page to the end of the queue.
    pub fn with_page(self, page: PageRecord) -> Self {
        self.pages.borrow_mut().push_back(page);
        self
    }

    /// Add multiple pages to the end of the queue.
    pub fn with_pages(self, pages: impl IntoIterator<Item = PageRecord>) -> Self {
        self.pages.borrow_mut().extend(pages);
        self
    }

    /// Fail with a fetch error for `url` when `remaining` pages are left.
    pub fn fail_when_remaining(mut self, remaining: usize, url: impl Into<String>) -> Self {
        self.fail_at = Some((remaining, url.into()));
        self
    }

    /// Pages not yet handed out.
    pub fn remaining(&self) -> usize {
        self.pages.borrow().len()
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockSourceCall> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl PageSource for MockPageSource {
    async fn start(&mut self, config: &CrawlConfig) -> SourceResult<()> {
        self.calls.borrow_mut().push(MockSourceCall::Start {
            user_agent: config.user_agent.clone(),
            schemes: config.schemes.clone(),
        });
        Ok(())
    }

    async fn next_page(&mut self) -> SourceResult<Option<PageRecord>> {
        self.calls.borrow_mut().push(MockSourceCall::NextPage);

        if let Some((remaining, url)) = &self.fail_at {
            if self.remaining() == *remaining {
                return Err(SourceError::Fetch {
                    url: url.clone(),
                    source: Box::new(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Mock connection refused",
                    )),
                });
            }
        }

        Ok(self.pages.borrow_mut().pop_front())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn parse_url(url: &str) -> Url {
    Url::parse(url).unwrap_or_else(|e| panic!("invalid test URL {url:?}: {e}"))
}

/// An HTML page.
pub fn html_page(url: &str, body: &str) -> PageRecord {
    PageRecord::new(parse_url(url), body).with_content_type("text/html; charset=utf-8")
}

/// A JavaScript resource.
pub fn javascript_page(url: &str, body: &str) -> PageRecord {
    PageRecord::new(parse_url(url), body).with_content_type("application/javascript")
}

/// An icon resource.
pub fn icon_page(url: &str) -> PageRecord {
    PageRecord::new(parse_url(url), vec![0u8, 0, 1, 0]).with_content_type("image/x-icon")
}

/// A page fetched over TLS with the given leaf certificate.
pub fn tls_page(url: &str, certificate_der: impl Into<Vec<u8>>) -> PageRecord {
    PageRecord::new(parse_url(url), Vec::new())
        .with_content_type("text/html")
        .with_tls_session(TlsSession::with_peer_certificate(certificate_der))
}
