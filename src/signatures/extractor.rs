//! Signer certificate extraction.
//!
//! A signature's `/Contents` normally holds a CMS (PKCS#7) `SignedData`
//! structure. This module does not parse CMS; it locates the first X.509
//! certificate in the blob with a list of strategies tried in order:
//!
//! 1. [`PemStrategy`]: the blob contains a PEM `CERTIFICATE` block.
//! 2. [`DerWalkStrategy`]: every `0x30` (SEQUENCE) byte is a candidate
//!    certificate start. Each candidate is parsed directly, then again after
//!    unwrapping one ASN.1 layer.
//!
//! For a typical `SignedData` the walk stops at the first embedded
//! certificate, which is the signer certificate for single-certificate
//! blobs. SignerInfo, digest and algorithm fields are never read.

use super::certificate::Certificate;
use crate::error::ExtractionError;
use der::asn1::AnyRef;
use der::{Decode, SliceReader};
use x509_parser::pem::parse_x509_pem;

/// ASN.1 SEQUENCE tag
const SEQUENCE_TAG: u8 = 0x30;

/// Encapsulation boundary of a PEM certificate
const PEM_CERTIFICATE_HEADER: &[u8] = b"-----BEGIN CERTIFICATE-----";

/// One way of finding a certificate in a byte blob.
pub trait ExtractionStrategy: Send + Sync {
    /// Strategy name, used in log output.
    fn name(&self) -> &str;

    /// Locate a certificate, or describe why none was found.
    fn extract(&self, data: &[u8]) -> Result<Certificate, String>;
}

/// Decode a PEM `CERTIFICATE` block found anywhere in the blob.
///
/// Bytes before the header (binary data, a label on the same line) are
/// ignored. Each header is tried in turn until one yields a certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PemStrategy;

impl ExtractionStrategy for PemStrategy {
    fn name(&self) -> &str {
        "pem"
    }

    fn extract(&self, data: &[u8]) -> Result<Certificate, String> {
        let mut last_error = None;
        for offset in find_all(data, PEM_CERTIFICATE_HEADER) {
            match parse_x509_pem(&data[offset..]) {
                Ok((_, pem)) => match Certificate::from_der(&pem.contents) {
                    Ok(cert) => {
                        log::debug!("PEM certificate found at offset {}", offset);
                        return Ok(cert);
                    },
                    Err(e) => last_error = Some(format!("invalid PEM certificate: {}", e)),
                },
                Err(e) => last_error = Some(format!("invalid PEM data: {}", e)),
            }
        }
        Err(last_error.unwrap_or_else(|| "no PEM CERTIFICATE block".to_string()))
    }
}

/// Try every SEQUENCE offset as the start of a DER certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerWalkStrategy;

impl DerWalkStrategy {
    /// Contents of the TLV at the start of `data`.
    fn unwrap_one_layer(data: &[u8]) -> Option<&[u8]> {
        let mut reader = SliceReader::new(data).ok()?;
        let any = AnyRef::decode(&mut reader).ok()?;
        Some(any.value())
    }
}

impl ExtractionStrategy for DerWalkStrategy {
    fn name(&self) -> &str {
        "der-walk"
    }

    fn extract(&self, data: &[u8]) -> Result<Certificate, String> {
        for offset in 0..data.len().saturating_sub(4) {
            if data[offset] != SEQUENCE_TAG {
                continue;
            }
            let candidate = &data[offset..];

            if let Ok(cert) = Certificate::from_der(candidate) {
                log::debug!("Certificate found at offset {}", offset);
                return Ok(cert);
            }
            if let Some(inner) = Self::unwrap_one_layer(candidate) {
                if let Ok(cert) = Certificate::from_der(inner) {
                    log::debug!("Wrapped certificate found at offset {}", offset);
                    return Ok(cert);
                }
            }
        }
        Err("no certificate SEQUENCE found".to_string())
    }
}

/// Ordered list of extraction strategies; the first success wins.
pub struct CertificateExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl CertificateExtractor {
    /// Create an extractor with no strategies.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy, tried after the existing ones.
    pub fn with_strategy(mut self, strategy: impl ExtractionStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Names of the configured strategies, in order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Locate the signer certificate in a decoded `/Contents` blob.
    pub fn extract(&self, cms_bytes: &[u8]) -> Result<Certificate, ExtractionError> {
        let mut causes = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.extract(cms_bytes) {
                Ok(cert) => {
                    log::debug!("Certificate extracted by '{}' strategy", strategy.name());
                    return Ok(cert);
                },
                Err(cause) => {
                    log::debug!("'{}' strategy failed: {}", strategy.name(), cause);
                    causes.push(cause);
                },
            }
        }

        if causes.is_empty() {
            causes.push("no extraction strategies configured".to_string());
        }
        Err(ExtractionError::NoCertificate(causes.join("; ")))
    }
}

impl Default for CertificateExtractor {
    fn default() -> Self {
        Self::empty()
            .with_strategy(PemStrategy)
            .with_strategy(DerWalkStrategy)
    }
}

impl std::fmt::Debug for CertificateExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateExtractor")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

/// Extract a certificate with the default strategies (PEM, then DER walk).
pub fn extract_certificate(cms_bytes: &[u8]) -> Result<Certificate, ExtractionError> {
    CertificateExtractor::default().extract(cms_bytes)
}

fn find_all<'a>(haystack: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(move |(_, window)| *window == needle)
        .map(|(offset, _)| offset)
}
