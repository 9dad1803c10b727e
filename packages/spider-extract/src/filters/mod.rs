//! Per-page filters.
//!
//! Trackers keep dedup state for one pipeline run; the remaining filters are
//! stateless functions over a single page.

pub mod certs;
pub mod comments;
pub mod favicon;
pub mod hosts;
pub mod scripts;

pub use certs::CertTracker;
pub use comments::{
    html_comments, javascript_comments, page_comments, page_html_comments,
    page_javascript_comments,
};
pub use favicon::FaviconFilter;
pub use hosts::HostTracker;
pub use scripts::{inline_scripts, javascript_sources};
