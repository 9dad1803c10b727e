//! Decoded TLS certificates.

use chrono::{DateTime, Utc};
use serde::Serialize;
use x509_parser::certificate::X509Certificate;
use x509_parser::error::X509Error;
use x509_parser::extensions::GeneralName;
use x509_parser::nom;

/// A peer certificate decoded from DER.
///
/// Only owned values are kept so the certificate can outlive the page it was
/// collected from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    /// Serial number as lowercase hex of the raw DER integer bytes
    pub serial: String,

    /// Subject distinguished name
    pub subject: String,

    /// Issuer distinguished name
    pub issuer: String,

    /// Start of the validity period
    pub not_before: Option<DateTime<Utc>>,

    /// End of the validity period
    pub not_after: Option<DateTime<Utc>>,

    /// DNS names from the subjectAltName extension
    pub subject_alt_names: Vec<String>,

    /// Original DER encoding
    #[serde(skip)]
    pub der: Vec<u8>,
}

impl Certificate {
    /// Parse a DER-encoded X.509 certificate.
    pub fn parse(der: &[u8]) -> Result<X509Certificate<'_>, X509Error> {
        x509_parser::parse_x509_certificate(der)
            .map(|(_, cert)| cert)
            .map_err(|e| match e {
                nom::Err::Error(e) | nom::Err::Failure(e) => e,
                nom::Err::Incomplete(_) => X509Error::InvalidCertificate,
            })
    }

    /// Decode a DER-encoded certificate into an owned value.
    pub fn from_der(der: &[u8]) -> Result<Self, X509Error> {
        let parsed = Self::parse(der)?;
        Ok(Self::from_parsed(&parsed, der))
    }

    /// Serial key used for deduplication.
    pub fn serial_key(parsed: &X509Certificate<'_>) -> String {
        hex::encode(parsed.raw_serial())
    }

    /// Build an owned certificate from an already parsed one.
    pub fn from_parsed(parsed: &X509Certificate<'_>, der: &[u8]) -> Self {
        let validity = parsed.validity();

        let subject_alt_names = match parsed.subject_alternative_name() {
            Ok(Some(san)) => san
                .value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some(dns.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            serial: Self::serial_key(parsed),
            subject: parsed.subject().to_string(),
            issuer: parsed.issuer().to_string(),
            not_before: DateTime::from_timestamp(validity.not_before.timestamp(), 0),
            not_after: DateTime::from_timestamp(validity.not_after.timestamp(), 0),
            subject_alt_names,
            der: der.to_vec(),
        }
    }
}
