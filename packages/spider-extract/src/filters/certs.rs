//! TLS certificate dedup tracker.

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::types::cert::Certificate;
use crate::types::page::PageRecord;

/// Yields each peer certificate the first time its serial number is seen.
///
/// Only serial numbers are retained; the decoded certificate is handed to
/// the consumer and not kept.
#[derive(Debug, Clone, Default)]
pub struct CertTracker {
    ledger: IndexSet<String>,
}

impl CertTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the page's peer certificate, decoding it if its serial is new.
    ///
    /// Pages without a TLS session, or whose session exposed no certificate,
    /// are skipped. Certificates that fail to decode are logged and skipped.
    pub fn observe(&mut self, page: &PageRecord) -> Option<Certificate> {
        let der = page.tls_session.as_ref()?.peer_certificate()?;

        let parsed = match Certificate::parse(der.as_ref()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(url = %page.url, error = %e, "Skipping undecodable peer certificate");
                return None;
            }
        };

        let serial = Certificate::serial_key(&parsed);
        if self.ledger.contains(&serial) {
            return None;
        }

        debug!(url = %page.url, serial = %serial, "New certificate discovered");
        self.ledger.insert(serial);
        Some(Certificate::from_parsed(&parsed, der.as_ref()))
    }

    /// Serial numbers seen so far, in discovery order.
    pub fn serials(&self) -> impl Iterator<Item = &str> {
        self.ledger.iter().map(String::as_str)
    }

    /// Number of distinct certificates seen.
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    /// Check if no certificate has been seen.
    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::page::TlsSession;
    use url::Url;

    fn cert_der(name: &str, serial: u64) -> Vec<u8> {
        let mut params = rcgen::CertificateParams::new(vec![name.to_string()]);
        params.serial_number = Some(serial.into());
        rcgen::Certificate::from_params(params)
            .unwrap()
            .serialize_der()
            .unwrap()
    }

    fn https_page(url: &str, der: Vec<u8>) -> PageRecord {
        PageRecord::new(Url::parse(url).unwrap(), Vec::new())
            .with_tls_session(TlsSession::with_peer_certificate(der))
    }

    #[test]
    fn test_each_serial_yielded_once() {
        let mut tracker = CertTracker::new();
        let der = cert_der("example.com", 1);

        let first = tracker.observe(&https_page("https://example.com/", der.clone()));
        let again = tracker.observe(&https_page("https://example.com/about", der));

        assert_eq!(first.unwrap().subject_alt_names, vec!["example.com"]);
        assert!(again.is_none());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_distinct_serials_in_discovery_order() {
        let mut tracker = CertTracker::new();
        let pages = [
            https_page("https://a.example.com/", cert_der("a.example.com", 10)),
            https_page("https://b.example.com/", cert_der("b.example.com", 20)),
            https_page("https://c.example.com/", cert_der("c.example.com", 10)),
        ];

        let names: Vec<String> = pages
            .iter()
            .filter_map(|p| tracker.observe(p))
            .flat_map(|c| c.subject_alt_names)
            .collect();

        assert_eq!(names, vec!["a.example.com", "b.example.com"]);
        assert_eq!(tracker.serials().count(), 2);
    }

    #[test]
    fn test_plain_http_page_is_skipped() {
        let mut tracker = CertTracker::new();
        let page = PageRecord::new(Url::parse("http://example.com/").unwrap(), Vec::new());
        assert!(tracker.observe(&page).is_none());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_undecodable_certificate_is_skipped() {
        let mut tracker = CertTracker::new();
        let page = https_page("https://example.com/", b"garbage".to_vec());
        assert!(tracker.observe(&page).is_none());
        assert!(tracker.is_empty());
    }
}
