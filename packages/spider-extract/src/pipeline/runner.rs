//! Extraction pipeline - fans each page out to the registered filters.

use std::borrow::Borrow;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::dispatch::{Callback, Dispatcher};
use crate::error::{PipelineError, Result};
use crate::filters::{
    javascript_comments, javascript_sources, page_html_comments, CertTracker, FaviconFilter,
    HostTracker,
};
use crate::js::{scanner, Classifier};
use crate::traits::source::PageSource;
use crate::types::cert::Certificate;
use crate::types::config::{CrawlConfig, ExtractionConfig};
use crate::types::page::PageRecord;

/// Counts of values discovered during a run.
///
/// Each value is counted once, however many consumers receive it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub pages: usize,
    pub hosts: usize,
    pub certs: usize,
    pub favicons: usize,
    pub javascript_sources: usize,
    pub javascript_strings: usize,
    pub html_comments: usize,
    pub javascript_comments: usize,
}

/// Derives hosts, certificates, favicons, comments and JavaScript literals
/// from a page stream.
///
/// Pages are processed one at a time, each completely before the next is
/// pulled. Per page, consumers are called in this order: hosts, certs,
/// favicons, JavaScript sources, JavaScript strings, HTML comments,
/// JavaScript comments, merged comments. A filter kind does no work unless
/// something is registered for it.
///
/// Dedup state lives as long as the pipeline, so one pipeline is one run.
///
/// # Example
///
/// ```rust,ignore
/// let mut paths = Vec::new();
/// let mut pipeline = ExtractionPipeline::new();
/// pipeline.every_javascript_path_string(Callback::value(|s: &str| paths.push(s.to_string())));
/// pipeline.run(&mut source).await?;
/// ```
#[derive(Debug, Default)]
pub struct ExtractionPipeline<'a> {
    config: ExtractionConfig,
    crawl_config: CrawlConfig,
    host_tracker: HostTracker,
    cert_tracker: CertTracker,
    favicon_filter: FaviconFilter,
    stats: PipelineStats,

    on_host: Dispatcher<'a, str>,
    on_cert: Dispatcher<'a, Certificate>,
    on_favicon: Dispatcher<'a, PageRecord>,
    on_javascript: Dispatcher<'a, str>,
    on_string: Vec<(Classifier, Callback<'a, str>)>,
    on_html_comment: Dispatcher<'a, str>,
    on_javascript_comment: Dispatcher<'a, str>,
    on_comment: Dispatcher<'a, str>,
}

impl<'a> ExtractionPipeline<'a> {
    /// Create a pipeline with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the extraction config.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the crawl config handed to the page source at the start of a run.
    pub fn with_crawl_config(mut self, crawl_config: CrawlConfig) -> Self {
        self.crawl_config = crawl_config;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn crawl_config(&self) -> &CrawlConfig {
        &self.crawl_config
    }

    /// Counts so far.
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Host names discovered so far, in discovery order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.host_tracker.hosts()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Each host name, the first time a page on it is seen.
    pub fn every_host(&mut self, callback: Callback<'a, str>) -> &mut Self {
        self.on_host.push(callback);
        self
    }

    /// Each TLS peer certificate, the first time its serial is seen.
    pub fn every_cert(&mut self, callback: Callback<'a, Certificate>) -> &mut Self {
        self.on_cert.push(callback);
        self
    }

    /// Each icon page.
    pub fn every_favicon(&mut self, callback: Callback<'a, PageRecord>) -> &mut Self {
        self.on_favicon.push(callback);
        self
    }

    /// Each non-empty HTML comment, trimmed.
    pub fn every_html_comment(&mut self, callback: Callback<'a, str>) -> &mut Self {
        self.on_html_comment.push(callback);
        self
    }

    /// Each JavaScript source: inline scripts of markup pages and the bodies
    /// of JavaScript pages.
    pub fn every_javascript(&mut self, callback: Callback<'a, str>) -> &mut Self {
        self.on_javascript.push(callback);
        self
    }

    /// Each unquoted JavaScript string literal.
    pub fn every_javascript_string(&mut self, callback: Callback<'a, str>) -> &mut Self {
        self.every_classified_string(Classifier::Any, callback)
    }

    /// JavaScript string literals shaped like relative paths.
    pub fn every_javascript_relative_path_string(
        &mut self,
        callback: Callback<'a, str>,
    ) -> &mut Self {
        self.every_classified_string(Classifier::RelativePath, callback)
    }

    /// JavaScript string literals shaped like absolute paths.
    pub fn every_javascript_absolute_path_string(
        &mut self,
        callback: Callback<'a, str>,
    ) -> &mut Self {
        self.every_classified_string(Classifier::AbsolutePath, callback)
    }

    /// JavaScript string literals shaped like relative or absolute paths.
    pub fn every_javascript_path_string(&mut self, callback: Callback<'a, str>) -> &mut Self {
        self.every_classified_string(Classifier::Path, callback)
    }

    /// JavaScript string literals containing a URL.
    pub fn every_javascript_url_string(&mut self, callback: Callback<'a, str>) -> &mut Self {
        self.every_classified_string(Classifier::Url, callback)
    }

    /// JavaScript string literals accepted by an arbitrary classifier.
    pub fn every_classified_string(
        &mut self,
        classifier: Classifier,
        callback: Callback<'a, str>,
    ) -> &mut Self {
        self.on_string.push((classifier, callback));
        self
    }

    /// Each JavaScript comment with its delimiters.
    pub fn every_javascript_comment(&mut self, callback: Callback<'a, str>) -> &mut Self {
        self.on_javascript_comment.push(callback);
        self
    }

    /// HTML comments followed by JavaScript comments, per page.
    pub fn every_comment(&mut self, callback: Callback<'a, str>) -> &mut Self {
        self.on_comment.push(callback);
        self
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Run every active filter over one page.
    pub fn process_page(&mut self, page: &PageRecord) {
        self.stats.pages += 1;
        debug!(url = %page.url, content_type = ?page.content_type, "Processing page");

        if !self.on_host.is_empty() {
            if let Some(host) = self.host_tracker.observe(page) {
                self.stats.hosts += 1;
                self.on_host.emit(host, page);
            }
        }

        if !self.on_cert.is_empty() {
            if let Some(cert) = self.cert_tracker.observe(page) {
                self.stats.certs += 1;
                self.on_cert.emit(&cert, page);
            }
        }

        if !self.on_favicon.is_empty() {
            if let Some(icon) = self.favicon_filter.filter(page) {
                self.stats.favicons += 1;
                self.on_favicon.emit(icon, page);
            }
        }

        let wants_html_comments = !self.on_html_comment.is_empty() || !self.on_comment.is_empty();
        let wants_js_comments =
            !self.on_javascript_comment.is_empty() || !self.on_comment.is_empty();
        let wants_js =
            !self.on_javascript.is_empty() || !self.on_string.is_empty() || wants_js_comments;

        let sources = if wants_js {
            javascript_sources(page, &self.config)
        } else {
            Vec::new()
        };

        for source in &sources {
            self.stats.javascript_sources += 1;
            self.on_javascript.emit(source, page);
        }

        if !self.on_string.is_empty() {
            for value in sources.iter().flat_map(|source| scanner::string_literals(source)) {
                self.stats.javascript_strings += 1;
                for (classifier, callback) in &mut self.on_string {
                    if classifier.matches(&value) {
                        callback.call(&value, page);
                    }
                }
            }
        }

        let html_comments = if wants_html_comments {
            page_html_comments(page)
        } else {
            Vec::new()
        };
        self.stats.html_comments += html_comments.len();
        for comment in &html_comments {
            self.on_html_comment.emit(comment, page);
        }

        let js_comments: Vec<String> = if wants_js_comments {
            sources
                .iter()
                .flat_map(|source| javascript_comments(source))
                .collect()
        } else {
            Vec::new()
        };
        self.stats.javascript_comments += js_comments.len();
        for comment in &js_comments {
            self.on_javascript_comment.emit(comment, page);
        }

        if !self.on_comment.is_empty() {
            for comment in html_comments.iter().chain(&js_comments) {
                self.on_comment.emit(comment, page);
            }
        }
    }

    /// Process pages from an iterator until it is exhausted.
    pub fn run_iter<I>(&mut self, pages: I) -> PipelineStats
    where
        I: IntoIterator,
        I::Item: Borrow<PageRecord>,
    {
        for page in pages {
            self.process_page(page.borrow());
        }
        self.stats
    }

    /// Pull pages from a source until it is exhausted.
    ///
    /// A source error ends the run; dedup state is kept on the pipeline.
    pub async fn run<S>(&mut self, source: &mut S) -> Result<PipelineStats>
    where
        S: PageSource + ?Sized,
    {
        self.drive(source, None).await
    }

    /// Like [`run`](Self::run), but stops pulling pages once `token` is
    /// cancelled and returns [`PipelineError::Cancelled`].
    pub async fn run_until_cancelled<S>(
        &mut self,
        source: &mut S,
        token: CancellationToken,
    ) -> Result<PipelineStats>
    where
        S: PageSource + ?Sized,
    {
        self.drive(source, Some(&token)).await
    }

    async fn drive<S>(
        &mut self,
        source: &mut S,
        token: Option<&CancellationToken>,
    ) -> Result<PipelineStats>
    where
        S: PageSource + ?Sized,
    {
        info!(source = source.name(), "Starting extraction run");
        source.start(&self.crawl_config).await?;

        loop {
            let next = match token {
                Some(token) => {
                    if token.is_cancelled() {
                        return Err(self.cancelled());
                    }
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(self.cancelled()),
                        page = source.next_page() => page?,
                    }
                }
                None => source.next_page().await?,
            };

            let Some(page) = next else {
                break;
            };
            self.process_page(&page);
        }

        info!(
            source = source.name(),
            pages = self.stats.pages,
            hosts = self.stats.hosts,
            certs = self.stats.certs,
            javascript_strings = self.stats.javascript_strings,
            comments = self.stats.html_comments + self.stats.javascript_comments,
            "Extraction run complete"
        );

        Ok(self.stats)
    }

    fn cancelled(&self) -> PipelineError {
        info!(pages = self.stats.pages, "Extraction run cancelled");
        PipelineError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{html_page, javascript_page};

    #[test]
    fn test_strings_routed_by_classifier() {
        let page = javascript_page(
            "https://example.com/app.js",
            r#"var a = "sub/dir"; var b = "/abs/path"; var c = "foo"; var d = "see https://cdn.example.com/x";"#,
        );

        let mut all = Vec::new();
        let mut relative = Vec::new();
        let mut absolute = Vec::new();
        let mut paths = Vec::new();
        let mut urls = Vec::new();

        let mut pipeline = ExtractionPipeline::new();
        pipeline
            .every_javascript_string(Callback::value(|s: &str| all.push(s.to_string())))
            .every_javascript_relative_path_string(Callback::value(|s: &str| {
                relative.push(s.to_string())
            }))
            .every_javascript_absolute_path_string(Callback::value(|s: &str| {
                absolute.push(s.to_string())
            }))
            .every_javascript_path_string(Callback::value(|s: &str| paths.push(s.to_string())))
            .every_javascript_url_string(Callback::value(|s: &str| urls.push(s.to_string())));
        let stats = pipeline.run_iter([&page]);
        drop(pipeline);

        assert_eq!(stats.javascript_strings, 4);
        assert_eq!(all.len(), 4);
        assert_eq!(relative, vec!["sub/dir"]);
        assert_eq!(absolute, vec!["/abs/path"]);
        assert_eq!(paths, vec!["sub/dir", "/abs/path"]);
        assert_eq!(urls, vec!["see https://cdn.example.com/x"]);
    }

    #[test]
    fn test_inactive_filters_do_no_work() {
        let page = html_page(
            "https://example.com/",
            r#"<!-- note --><script type="text/javascript">var a = "x";</script>"#,
        );

        let mut pipeline = ExtractionPipeline::new();
        let stats = pipeline.run_iter([&page]);

        assert_eq!(stats.pages, 1);
        assert_eq!(stats.hosts, 0);
        assert_eq!(stats.javascript_sources, 0);
        assert_eq!(stats.html_comments, 0);
        assert_eq!(pipeline.hosts().count(), 0);
    }

    #[test]
    fn test_per_page_emission_order() {
        let page = html_page(
            "https://example.com/",
            r#"<!-- html --><script type="text/javascript">/* js */ var s = "str";</script>"#,
        );

        let events = std::cell::RefCell::new(Vec::new());
        let record = |tag: &'static str| {
            let events = &events;
            Callback::value(move |v: &str| events.borrow_mut().push(format!("{tag}:{v}")))
        };

        let mut pipeline = ExtractionPipeline::new();
        pipeline
            .every_comment(record("comment"))
            .every_javascript_comment(record("js_comment"))
            .every_html_comment(record("html_comment"))
            .every_javascript_string(record("string"))
            .every_javascript(record("js"))
            .every_host(record("host"));
        pipeline.process_page(&page);
        drop(pipeline);

        assert_eq!(
            events.into_inner(),
            vec![
                "host:example.com",
                r#"js:/* js */ var s = "str";"#,
                "string:str",
                "html_comment:html",
                "js_comment:/* js */",
                "comment:html",
                "comment:/* js */",
            ]
        );
    }

    #[test]
    fn test_favicon_with_origin() {
        let icon = PageRecord::new(
            url::Url::parse("https://example.com/favicon.ico").unwrap(),
            vec![0u8; 4],
        )
        .with_content_type("image/vnd.microsoft.icon");
        let other = html_page("https://example.com/", "<p>hi</p>");

        let mut seen = Vec::new();
        let mut pipeline = ExtractionPipeline::new();
        pipeline.every_favicon(Callback::with_page(|icon: &PageRecord, page: &PageRecord| {
            seen.push((icon.url.path().to_string(), page.url == icon.url))
        }));
        let stats = pipeline.run_iter([&other, &icon]);
        drop(pipeline);

        assert_eq!(stats.favicons, 1);
        assert_eq!(seen, vec![("/favicon.ico".to_string(), true)]);
    }
}
