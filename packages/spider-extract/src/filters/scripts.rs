//! JavaScript source discovery.
//!
//! A page contributes JavaScript in two ways: a markup page carries inline
//! `<script>` bodies, and a fetched `.js` resource is JavaScript as a whole.

use std::borrow::Cow;

use scraper::{Html, Selector};

use crate::types::config::ExtractionConfig;
use crate::types::page::PageRecord;

/// Inline `<script>` bodies in document order.
///
/// Only elements whose `type` attribute the config accepts are returned.
/// Whitespace-only bodies (typically `<script src=...>` tags) are dropped.
pub fn inline_scripts(document: &Html, config: &ExtractionConfig) -> Vec<String> {
    let selector = match Selector::parse("script") {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    document
        .select(&selector)
        .filter(|el| config.accepts_script_type(el.value().attr("type")))
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect()
}

/// Every JavaScript source attributed to a page.
///
/// A JavaScript resource yields its whole body; a markup page yields its
/// accepted inline scripts. Anything else yields nothing.
pub fn javascript_sources<'p>(page: &'p PageRecord, config: &ExtractionConfig) -> Vec<Cow<'p, str>> {
    if page.is_javascript() {
        return vec![page.text()];
    }

    match page.document() {
        Some(document) => inline_scripts(document, config)
            .into_iter()
            .map(Cow::Owned)
            .collect(),
        None => vec![],
    }
}
