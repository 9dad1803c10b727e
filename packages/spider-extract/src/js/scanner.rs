//! Lexical scanner approximating JavaScript tokenization.
//!
//! The scanner does not parse JavaScript. It walks the source once, left to
//! right, and labels contiguous regions as string literals, regex literals,
//! template literals, comments or anything else. Spans never overlap and
//! their concatenation is the original input.
//!
//! # Limitations
//!
//! - `/` is treated as the start of a regex literal only when the previous
//!   non-whitespace character is one of `{ [ ( ; : , =` or there is none.
//!   `return /re/` and similar forms are scanned as division.
//! - Template literals end at the first unescaped backtick, so a nested
//!   template inside `${...}` terminates the outer literal early.

use std::borrow::Cow;

use serde::Serialize;

use super::unescape::unescape;

/// Label attached to a scanned region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// Single- or double-quoted string literal, quotes included
    String,
    /// `// ...` or `/* ... */` comment, delimiters included
    Comment,
    /// Regex literal with its flags
    Regex,
    /// Backtick template literal
    Template,
    /// Everything else
    Other,
}

/// A contiguous labeled region of scanned source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSpan<'a> {
    pub kind: SpanKind,
    /// Byte offset of the first byte
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
    /// Source text covered by the span
    pub text: &'a str,
}

impl<'a> ScanSpan<'a> {
    /// Unquoted, unescaped value of a string literal.
    ///
    /// Returns `None` for every other span kind.
    pub fn string_value(&self) -> Option<Cow<'a, str>> {
        if self.kind != SpanKind::String {
            return None;
        }
        let inner = &self.text[1..self.text.len() - 1];
        Some(unescape(inner))
    }

    /// Comment text with its delimiters, for comment spans.
    pub fn comment(&self) -> Option<&'a str> {
        (self.kind == SpanKind::Comment).then_some(self.text)
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Spans produced by the scanner are never empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Characters after which a `/` opens a regex literal.
const REGEX_PRECEDERS: &[char] = &['{', '[', '(', ';', ':', ',', '='];

/// Bytes that may open a non-`Other` span.
fn opens_span(b: u8) -> bool {
    matches!(b, b'"' | b'\'' | b'`' | b'/')
}

/// Forward-only scanner over a JavaScript source string.
///
/// # Example
///
/// ```rust
/// use spider_extract::js::{JsScanner, SpanKind};
///
/// let kinds: Vec<SpanKind> = JsScanner::new("a = 'b'; // c")
///     .map(|span| span.kind)
///     .collect();
///
/// assert_eq!(kinds, vec![SpanKind::Other, SpanKind::String, SpanKind::Other, SpanKind::Comment]);
/// ```
#[derive(Debug, Clone)]
pub struct JsScanner<'a> {
    src: &'a str,
    pos: usize,
    /// Failed scans, so openers inside a region already known to be
    /// unterminated fail without rescanning it
    dead: DeadRegions,
}

/// Extent of earlier unterminated scans.
#[derive(Debug, Clone, Copy, Default)]
struct DeadRegions {
    /// End of the line an unterminated `'` string ran into
    single_quote: usize,
    /// End of the line an unterminated `"` string ran into
    double_quote: usize,
    /// Where an unterminated regex literal gave up
    regex: usize,
    template: bool,
    block_comment: bool,
}

impl<'a> JsScanner<'a> {
    /// Create a scanner positioned at the start of `src`.
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            dead: DeadRegions::default(),
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    /// Whether a `/` at the cursor may start a regex literal.
    fn regex_allowed(&self) -> bool {
        match self.src[..self.pos].trim_end().chars().last() {
            None => true,
            Some(c) => REGEX_PRECEDERS.contains(&c),
        }
    }

    /// End of a quoted string starting at the cursor.
    ///
    /// A later quote inside a failed string's line was an escaped quote of
    /// that string, so scanning from it reaches the same line end.
    fn quoted_end(&mut self, quote: u8) -> Option<usize> {
        let dead = match quote {
            b'\'' => &mut self.dead.single_quote,
            _ => &mut self.dead.double_quote,
        };
        if self.pos < *dead {
            return None;
        }

        let bytes = self.src.as_bytes();
        let mut i = self.pos + 1;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    // `\` CR LF is a single line continuation
                    i += if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                        3
                    } else {
                        2
                    };
                }
                b'\n' | b'\r' => break,
                b if b == quote => return Some(i + 1),
                _ => i += 1,
            }
        }
        *dead = i.min(bytes.len());
        None
    }

    /// End of a regex literal (flags included) starting at the cursor.
    ///
    /// An opener inside a failed regex was inside its character class. From
    /// the next `[` or `]` on both scans are in the same state, so the newer
    /// one gives up there.
    fn regex_end(&mut self) -> Option<usize> {
        let bytes = self.src.as_bytes();
        if matches!(bytes.get(self.pos + 1), None | Some(b'/') | Some(b'*')) {
            return None;
        }
        if !self.regex_allowed() {
            return None;
        }

        let resync = self.pos < self.dead.regex;
        let mut i = self.pos + 1;
        let mut in_class = false;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' if matches!(bytes.get(i + 1), Some(b'\n') | Some(b'\r')) => break,
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'\n' | b'\r' => break,
                b'[' | b']' if resync => return None,
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    let mut end = i + 1;
                    while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
                        end += 1;
                    }
                    return Some(end);
                }
                _ => {}
            }
            i += 1;
        }
        self.dead.regex = self.dead.regex.max(i.min(bytes.len()));
        None
    }

    /// End of a template literal starting at the cursor.
    ///
    /// Once one template is unterminated every later backtick is escaped.
    fn template_end(&mut self) -> Option<usize> {
        if self.dead.template {
            return None;
        }

        let bytes = self.src.as_bytes();
        let mut i = self.pos + 1;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'`' => return Some(i + 1),
                _ => i += 1,
            }
        }
        self.dead.template = true;
        None
    }

    /// End of a comment starting at the cursor.
    fn comment_end(&mut self) -> Option<usize> {
        let body = self.pos + 2;
        match self.bytes().get(self.pos + 1) {
            Some(b'/') => Some(
                self.src[body..]
                    .find('\n')
                    .map(|nl| body + nl + 1)
                    .unwrap_or(self.src.len()),
            ),
            Some(b'*') if self.dead.block_comment => None,
            Some(b'*') => {
                let end = self.src[body..].find("*/").map(|close| body + close + 2);
                self.dead.block_comment = end.is_none();
                end
            }
            _ => None,
        }
    }

    /// End of a run of `Other` text starting at the cursor.
    fn other_end(&self) -> usize {
        let bytes = self.bytes();
        let mut i = self.pos + 1;
        while i < bytes.len() && !opens_span(bytes[i]) {
            i += 1;
        }
        i
    }
}

impl<'a> Iterator for JsScanner<'a> {
    type Item = ScanSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos;
        let first = *self.bytes().get(start)?;

        let matched = match first {
            b'"' | b'\'' => self.quoted_end(first).map(|end| (SpanKind::String, end)),
            b'/' => self
                .regex_end()
                .map(|end| (SpanKind::Regex, end))
                .or_else(|| self.comment_end().map(|end| (SpanKind::Comment, end))),
            b'`' => self.template_end().map(|end| (SpanKind::Template, end)),
            _ => None,
        };
        let (kind, end) = matched.unwrap_or_else(|| (SpanKind::Other, self.other_end()));

        self.pos = end;
        Some(ScanSpan {
            kind,
            start,
            end,
            text: &self.src[start..end],
        })
    }
}

impl std::iter::FusedIterator for JsScanner<'_> {}

/// Scan `src` into spans.
pub fn scan(src: &str) -> JsScanner<'_> {
    JsScanner::new(src)
}

/// Unescaped values of every string literal in `src`.
pub fn string_literals(src: &str) -> impl Iterator<Item = Cow<'_, str>> {
    scan(src).filter_map(|span| span.string_value())
}

/// Every comment in `src`, delimiters intact.
pub fn comments(src: &str) -> impl Iterator<Item = &str> {
    scan(src).filter_map(|span| span.comment())
}
