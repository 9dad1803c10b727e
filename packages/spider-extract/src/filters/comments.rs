//! Comment extraction from markup and JavaScript.
//!
//! HTML comments come from the parsed document tree; JavaScript comments
//! come from re-scanning each JavaScript source of the page. The merged
//! stream is HTML comments in document order followed by JavaScript
//! comments in script order.

use scraper::Html;

use super::scripts::javascript_sources;
use crate::js::scanner;
use crate::types::config::ExtractionConfig;
use crate::types::page::PageRecord;

/// Trimmed, non-empty comment nodes of a document, in document order.
pub fn html_comments(document: &Html) -> Vec<String> {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_comment())
        .map(|comment| comment.trim())
        .filter(|text| !text.is_empty())
        .map(String::from)
        .collect()
}

/// HTML comments of a page; empty when the page has no document.
pub fn page_html_comments(page: &PageRecord) -> Vec<String> {
    page.document().map(html_comments).unwrap_or_default()
}

/// Comments of a single JavaScript source, delimiters included.
pub fn javascript_comments(source: &str) -> Vec<String> {
    scanner::comments(source).map(String::from).collect()
}

/// JavaScript comments of every source attributed to a page.
pub fn page_javascript_comments(page: &PageRecord, config: &ExtractionConfig) -> Vec<String> {
    javascript_sources(page, config)
        .iter()
        .flat_map(|source| javascript_comments(source))
        .collect()
}

/// HTML comments followed by JavaScript comments.
pub fn page_comments(page: &PageRecord, config: &ExtractionConfig) -> Vec<String> {
    let mut comments = page_html_comments(page);
    comments.extend(page_javascript_comments(page, config));
    comments
}
