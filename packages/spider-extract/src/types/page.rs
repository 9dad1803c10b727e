//! Page types - fetched resources handed to the pipeline by the crawler.

use std::borrow::Cow;
use std::cell::OnceCell;

use rustls_pki_types::CertificateDer;
use scraper::Html;
use tracing::warn;
use url::Url;

/// MIME types recognised as JavaScript resources.
const JAVASCRIPT_TYPES: &[&str] = &["text/javascript", "application/javascript"];

/// MIME types recognised as icon resources.
const ICON_TYPES: &[&str] = &["image/x-icon", "image/vnd.microsoft.icon"];

/// MIME types parsed into a document tree.
const HTML_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// TLS session details captured by the crawler for an HTTPS fetch.
#[derive(Debug, Clone, Default)]
pub struct TlsSession {
    /// Peer certificate chain, leaf first
    pub peer_certificates: Vec<CertificateDer<'static>>,
}

impl TlsSession {
    /// Create a session from a peer chain (leaf first).
    pub fn new(peer_certificates: Vec<CertificateDer<'static>>) -> Self {
        Self { peer_certificates }
    }

    /// Create a session holding only the leaf certificate.
    pub fn with_peer_certificate(der: impl Into<Vec<u8>>) -> Self {
        Self::new(vec![CertificateDer::from(der.into())])
    }

    /// The server's leaf certificate, if the handshake exposed one.
    pub fn peer_certificate(&self) -> Option<&CertificateDer<'static>> {
        self.peer_certificates.first()
    }
}

/// A fetched resource produced by the crawler.
///
/// The pipeline only borrows a record for the duration of one page pass;
/// nothing in this crate mutates it. The parsed document is built lazily the
/// first time a filter asks for it, unless the crawler already supplied one.
#[derive(Debug, Clone)]
pub struct PageRecord {
    /// Final URL of the resource
    pub url: Url,

    /// HTTP status code
    pub status: u16,

    /// Raw `Content-Type` header value, if any
    pub content_type: Option<String>,

    /// Response body
    pub body: Vec<u8>,

    /// TLS session handle for HTTPS fetches
    pub tls_session: Option<TlsSession>,

    document: OnceCell<Option<Html>>,
}

impl PageRecord {
    /// Create a new page record with status 200 and no content type.
    pub fn new(url: Url, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url,
            status: 200,
            content_type: None,
            body: body.into(),
            tls_session: None,
            document: OnceCell::new(),
        }
    }

    /// Set the HTTP status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Attach the TLS session the page was fetched over.
    pub fn with_tls_session(mut self, session: TlsSession) -> Self {
        self.tls_session = Some(session);
        self
    }

    /// Supply a document tree the crawler already parsed.
    pub fn with_document(self, document: Html) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(Some(document));
        Self {
            document: cell,
            ..self
        }
    }

    /// Host name of the page URL.
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// MIME essence of the content type (lowercased, parameters stripped).
    pub fn mime_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// Check the content type against a MIME type or a bare major type.
    ///
    /// `"text/html"` matches `text/html; charset=utf-8`; `"image"` matches any
    /// `image/*` subtype.
    pub fn is_content_type(&self, expected: &str) -> bool {
        let Some(mime) = self.mime_type() else {
            return false;
        };
        let expected = expected.to_ascii_lowercase();

        if expected.contains('/') {
            mime == expected
        } else {
            mime.split('/').next() == Some(expected.as_str())
        }
    }

    /// Check if the page is an HTML document.
    pub fn is_html(&self) -> bool {
        HTML_TYPES.iter().any(|t| self.is_content_type(t))
    }

    /// Check if the page is a JavaScript resource.
    pub fn is_javascript(&self) -> bool {
        JAVASCRIPT_TYPES.iter().any(|t| self.is_content_type(t))
    }

    /// Check if the page is an icon resource.
    pub fn is_icon(&self) -> bool {
        ICON_TYPES.iter().any(|t| self.is_content_type(t))
    }

    /// Check if the page was fetched over TLS.
    pub fn is_tls(&self) -> bool {
        self.tls_session.is_some()
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        let text = String::from_utf8_lossy(&self.body);
        if let Cow::Owned(_) = text {
            warn!(url = %self.url, bytes = self.body.len(), "Body is not valid UTF-8, replacing invalid sequences");
        }
        text
    }

    /// Parsed document tree.
    ///
    /// `None` for non-markup pages and for empty bodies.
    pub fn document(&self) -> Option<&Html> {
        self.document
            .get_or_init(|| {
                if !self.is_html() || self.body.is_empty() {
                    return None;
                }
                Some(Html::parse_document(&self.text()))
            })
            .as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content_type: &str, body: &str) -> PageRecord {
        PageRecord::new(Url::parse("https://example.com/").unwrap(), body)
            .with_content_type(content_type)
    }

    #[test]
    fn test_content_type_matching() {
        let html = page("text/html; charset=UTF-8", "<html></html>");
        assert!(html.is_content_type("text/html"));
        assert!(html.is_content_type("text"));
        assert!(!html.is_content_type("text/plain"));
        assert!(html.is_html());
        assert!(!html.is_javascript());
    }

    #[test]
    fn test_javascript_and_icon_types() {
        assert!(page("application/javascript", "").is_javascript());
        assert!(page("Text/JavaScript", "").is_javascript());
        assert!(page("image/x-icon", "").is_icon());
        assert!(page("image/vnd.microsoft.icon", "").is_icon());
        assert!(!page("image/png", "").is_icon());
    }

    #[test]
    fn test_missing_content_type() {
        let page = PageRecord::new(Url::parse("https://example.com/").unwrap(), "x");
        assert_eq!(page.mime_type(), None);
        assert!(!page.is_html());
        assert!(page.document().is_none());
    }

    #[test]
    fn test_document_only_for_non_empty_html() {
        assert!(page("text/html", "<p>hi</p>").document().is_some());
        assert!(page("text/html", "").document().is_none());
        assert!(page("application/javascript", "var a;").document().is_none());
    }

    #[test]
    fn test_supplied_document_is_used() {
        let doc = Html::parse_document("<title>given</title>");
        let page = PageRecord::new(Url::parse("https://example.com/").unwrap(), Vec::new())
            .with_document(doc);
        assert!(page.document().is_some());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_invalid_utf8_body_is_replaced_and_logged() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let page = PageRecord::new(
            Url::parse("https://example.com/app.js").unwrap(),
            vec![b'a', 0xff, b'b'],
        )
        .with_content_type("application/javascript");
        let text = tracing::subscriber::with_default(subscriber, || page.text().into_owned());

        assert_eq!(text, "a\u{FFFD}b");
        let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("https://example.com/app.js"), "{logs}");
    }

    #[test]
    fn test_valid_utf8_body_is_borrowed() {
        let page = page("application/javascript", "var s = 'héllo';");
        assert!(matches!(page.text(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_tls_session_leaf() {
        let session = TlsSession::with_peer_certificate(vec![1, 2, 3]);
        assert_eq!(session.peer_certificate().map(|c| c.to_vec()), Some(vec![1u8, 2, 3]));
        let page = page("text/html", "").with_tls_session(session);
        assert!(page.is_tls());
        assert_eq!(page.host(), Some("example.com"));
    }
}
