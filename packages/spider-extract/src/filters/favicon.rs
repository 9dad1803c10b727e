//! Favicon filter.

use crate::types::page::PageRecord;

/// Passes through pages that are icon resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaviconFilter;

impl FaviconFilter {
    /// Return the page unchanged if it is an icon, otherwise nothing.
    pub fn filter<'p>(&self, page: &'p PageRecord) -> Option<&'p PageRecord> {
        page.is_icon().then_some(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_only_icons_pass() {
        let url = Url::parse("https://example.com/favicon.ico").unwrap();
        let icon = PageRecord::new(url.clone(), vec![0u8; 4]).with_content_type("image/x-icon");
        let html = PageRecord::new(url, "<html></html>").with_content_type("text/html");

        assert!(FaviconFilter.filter(&icon).is_some());
        assert!(FaviconFilter.filter(&html).is_none());
    }
}
