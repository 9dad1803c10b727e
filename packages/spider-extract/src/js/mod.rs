//! JavaScript lexical scanning.
//!
//! - [`scanner`] - span-level scanner (strings, regexes, templates, comments)
//! - [`unescape`] - string-literal escape resolution
//! - [`classify`] - path and URL classifiers over extracted strings

pub mod classify;
pub mod scanner;
pub mod unescape;

pub use classify::{contains_url, is_absolute_path, is_path, is_relative_path, Classifier};
pub use scanner::{comments, scan, string_literals, JsScanner, ScanSpan, SpanKind};
pub use unescape::unescape;
