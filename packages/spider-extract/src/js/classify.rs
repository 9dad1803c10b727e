//! Path and URL classifiers over extracted string values.
//!
//! Classifiers are pure predicates: they look only at the value, keep no
//! state and never re-scan the source.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `name.ext`, or two or more slash-separated segments not starting with `/`.
static RELATIVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^/\s]+(?:/[^/\s]+)+/?|[^/\s]+\.[A-Za-z][A-Za-z0-9]*)$")
        .expect("relative path regex")
});

/// One or more `/segment` groups.
static ABSOLUTE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:/[^/\s]+)+/?$").expect("absolute path regex"));

/// `scheme://host` anywhere in the value.
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#'"<>]+"#).expect("url regex")
});

/// Check if a value looks like a relative path (`file.txt`, `dir/name`, `../name`).
pub fn is_relative_path(value: &str) -> bool {
    RELATIVE_PATH.is_match(value)
}

/// Check if a value looks like an absolute path (`/dir/name`).
pub fn is_absolute_path(value: &str) -> bool {
    ABSOLUTE_PATH.is_match(value)
}

/// Check if a value looks like a relative or absolute path.
pub fn is_path(value: &str) -> bool {
    is_relative_path(value) || is_absolute_path(value)
}

/// Check if a value contains an absolute URL (scheme and host).
pub fn contains_url(value: &str) -> bool {
    URL.is_match(value)
}

/// A string classification stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classifier {
    /// Accepts every value
    Any,
    /// Relative or absolute paths
    Path,
    /// Relative paths only
    RelativePath,
    /// Absolute paths only
    AbsolutePath,
    /// Values containing a URL
    Url,
}

impl Classifier {
    /// Check a value against this classifier.
    pub fn matches(self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Path => is_path(value),
            Self::RelativePath => is_relative_path(value),
            Self::AbsolutePath => is_absolute_path(value),
            Self::Url => contains_url(value),
        }
    }

    /// Pass through the values this classifier accepts.
    pub fn filter<I, S>(self, values: I) -> impl Iterator<Item = S>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values.into_iter().filter(move |v| self.matches(v.as_ref()))
    }
}
