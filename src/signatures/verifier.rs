//! PDF signature verification pipeline.
//!
//! ```text
//! bytes ─► input checks ─► scanner ─► per block: hex decode
//!                                          ─► certificate extraction
//!                                          ─► chain validation
//!                                          ─► SignatureInfo
//!       ─► VerificationResult
//! ```
//!
//! Once the input checks pass, every signature dictionary found produces
//! exactly one [`SignatureInfo`]. A failure in one block marks that entry
//! invalid and keeps whatever metadata was read before the failure; the
//! remaining blocks are still processed.

use super::chain::{validate_chain, TrustAnchors};
use super::date::parse_pdf_date;
use super::extractor::CertificateExtractor;
use super::hex_decode::decode_hex;
use super::scanner::{SignatureScanner, TextualScanner};
use super::types::{RawSignatureBlock, SignatureInfo, VerificationResult};
use crate::config::VerifierOptions;
use crate::error::InputError;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// PDF magic marker
const PDF_MAGIC: &[u8] = b"%PDF";

/// Failure reason for a dictionary without a `/Contents` hex string.
pub const REASON_NO_CONTENTS: &str = "no /Contents found in signature dictionary";

/// Failure reason for a `/Contents` value that decodes to nothing.
pub const REASON_UNDECODABLE: &str = "could not decode signature contents";

/// Verifier for PDF digital signatures.
///
/// Holds no per-call state; one instance can serve concurrent calls.
pub struct SignatureVerifier {
    anchors: Arc<TrustAnchors>,
    options: VerifierOptions,
    scanner: Box<dyn SignatureScanner>,
    extractor: CertificateExtractor,
}

impl SignatureVerifier {
    /// Create a verifier trusting `anchors`.
    pub fn new(anchors: Arc<TrustAnchors>) -> Self {
        Self {
            anchors,
            options: VerifierOptions::default(),
            scanner: Box::new(TextualScanner::new()),
            extractor: CertificateExtractor::default(),
        }
    }

    /// Create a verifier trusting the platform store (empty if unavailable).
    pub fn with_system_roots() -> Self {
        Self::new(Arc::new(TrustAnchors::system_or_empty()))
    }

    /// Replace the options.
    pub fn with_options(mut self, options: VerifierOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the scanning backend.
    pub fn with_scanner(mut self, scanner: impl SignatureScanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    /// Replace the certificate extraction strategies.
    pub fn with_extractor(mut self, extractor: CertificateExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Trust anchors in use.
    pub fn anchors(&self) -> &TrustAnchors {
        &self.anchors
    }

    /// Options in use.
    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    /// Verify every signature in `data`, validating certificates at the
    /// current time.
    pub fn verify(&self, data: &[u8]) -> Result<VerificationResult, InputError> {
        self.verify_at(data, Utc::now())
    }

    /// Verify every signature in `data`, validating certificates at `now`.
    ///
    /// `verified_at` on the result is still the wall-clock time of the call.
    pub fn verify_at(
        &self,
        data: &[u8],
        now: DateTime<Utc>,
    ) -> Result<VerificationResult, InputError> {
        Pipeline {
            anchors: &self.anchors,
            options: &self.options,
            scanner: self.scanner.as_ref(),
            extractor: &self.extractor,
        }
        .run(data, now)
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("anchors", &self.anchors)
            .field("options", &self.options)
            .field("scanner", &self.scanner.name())
            .field("extractor", &self.extractor)
            .finish()
    }
}

/// Verify every signature in `data` against `anchors` with default options.
///
/// ```
/// use pdf_sigverify::signatures::TrustAnchors;
/// use pdf_sigverify::verify_pdf_signatures;
///
/// let result = verify_pdf_signatures(b"%PDF-1.7\n%%EOF", &TrustAnchors::new()).unwrap();
/// assert_eq!(result.signed_count, 0);
/// assert!(result.all_valid);
/// ```
pub fn verify_pdf_signatures(
    data: &[u8],
    anchors: &TrustAnchors,
) -> Result<VerificationResult, InputError> {
    let extractor = CertificateExtractor::default();
    Pipeline {
        anchors,
        options: &VerifierOptions::default(),
        scanner: &TextualScanner,
        extractor: &extractor,
    }
    .run(data, Utc::now())
}

/// Borrowed view of everything one verification call needs.
struct Pipeline<'a> {
    anchors: &'a TrustAnchors,
    options: &'a VerifierOptions,
    scanner: &'a dyn SignatureScanner,
    extractor: &'a CertificateExtractor,
}

impl Pipeline<'_> {
    fn run(&self, data: &[u8], now: DateTime<Utc>) -> Result<VerificationResult, InputError> {
        self.check_input(data)?;

        let mut blocks = self.scanner.scan(data);
        let limit = self.options.max_signatures;
        if limit > 0 && blocks.len() > limit {
            log::warn!(
                "Document has {} signature dictionaries, only the first {} are verified",
                blocks.len(),
                limit
            );
            blocks.truncate(limit);
        }

        let signatures: Vec<SignatureInfo> = blocks
            .into_iter()
            .enumerate()
            .map(|(index, block)| {
                let info = self.verify_block(block, now);
                if let Some(reason) = &info.failure_reason {
                    log::warn!("Signature #{} is invalid: {}", index + 1, reason);
                }
                info
            })
            .collect();

        let result = VerificationResult::from_signatures(signatures, Utc::now());
        log::info!(
            "Verified {} signature(s) with the {} scanner, all valid: {}",
            result.signed_count,
            self.scanner.name(),
            result.all_valid
        );
        Ok(result)
    }

    fn check_input(&self, data: &[u8]) -> Result<(), InputError> {
        if data.is_empty() {
            return Err(InputError::Empty);
        }
        let limit = self.options.max_input_size;
        if limit > 0 && data.len() > limit {
            return Err(InputError::TooLarge {
                size: data.len(),
                limit,
            });
        }
        if !data.starts_with(PDF_MAGIC) {
            return Err(InputError::NotAPdf);
        }
        Ok(())
    }

    fn verify_block(&self, raw: RawSignatureBlock, now: DateTime<Utc>) -> SignatureInfo {
        let mut info = SignatureInfo::unverified(
            raw.signer_name.unwrap_or_default(),
            raw.signer_role.unwrap_or_default(),
            raw.signing_time_raw.as_deref().and_then(parse_pdf_date),
        );

        if raw.contents_hex.is_empty() {
            info.invalidate(REASON_NO_CONTENTS);
            return info;
        }

        let cms_bytes = match decode_hex(&raw.contents_hex) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            _ => {
                info.invalidate(REASON_UNDECODABLE);
                return info;
            },
        };

        let cert = match self.extractor.extract(&cms_bytes) {
            Ok(cert) => cert,
            Err(e) => {
                info.invalidate(format!("certificate extraction failed: {}", e));
                return info;
            },
        };

        info.certificate_issuer = cert.issuer().to_string();
        info.certificate_subject = cert.subject().to_string();
        if info.signer_name.is_empty() {
            info.signer_name = cert.common_name().unwrap_or_default().to_string();
        }
        info.signer_email = cert.email().unwrap_or_default().to_string();
        if self.options.include_certificate_pem {
            info.raw_certificate_pem = Some(cert.to_pem());
        }

        match validate_chain(&cert, self.anchors, now) {
            Ok(()) => info.validate(),
            Err(e) => info.invalidate(format!("certificate chain validation failed: {}", e)),
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(Arc::new(TrustAnchors::new()))
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(verifier().verify(b"").unwrap_err(), InputError::Empty);
    }

    #[test]
    fn test_not_a_pdf() {
        assert_eq!(verifier().verify(b"PK\x03\x04").unwrap_err(), InputError::NotAPdf);
        assert_eq!(verifier().verify(b" %PDF-1.7").unwrap_err(), InputError::NotAPdf);
    }

    #[test]
    fn test_size_limit() {
        let v = verifier().with_options(VerifierOptions::new().with_max_input_size(8));
        assert_eq!(
            v.verify(b"%PDF-1.7 too long").unwrap_err(),
            InputError::TooLarge { size: 17, limit: 8 }
        );
        assert!(v.verify(b"%PDF-1.7").is_ok());
    }

    #[test]
    fn test_unsigned_document() {
        let result = verifier().verify(b"%PDF-1.4\n%%EOF").unwrap();
        assert_eq!(result.signed_count, 0);
        assert!(result.all_valid);
        assert!(result.signatures.is_empty());
    }

    #[test]
    fn test_missing_contents_keeps_metadata() {
        let pdf = b"%PDF-1.7 << /Type /Sig /Name (Alice) /Reason (Approver) /M (D:20240315143000Z) >>";
        let result = verifier().verify(pdf).unwrap();

        assert_eq!(result.signed_count, 1);
        assert!(!result.all_valid);
        let sig = &result.signatures[0];
        assert!(!sig.is_valid);
        assert_eq!(sig.failure_reason.as_deref(), Some(REASON_NO_CONTENTS));
        assert_eq!(sig.signer_name, "Alice");
        assert_eq!(sig.signer_role, "Approver");
        assert!(sig.signing_time.is_some());
    }

    #[test]
    fn test_extraction_failure() {
        let pdf = b"%PDF-1.7 << /Type /Sig /Contents <0102030405> >>";
        let result = verifier().verify(pdf).unwrap();
        let reason = result.signatures[0].failure_reason.as_deref().unwrap();
        assert!(reason.starts_with("certificate extraction failed: no parseable certificate"));
        assert!(result.signatures[0].certificate_subject.is_empty());
    }

    #[test]
    fn test_signature_limit() {
        let pdf = b"%PDF-1.7 << /Type /Sig >> << /Type /Sig >> << /Type /Sig >>";
        let v = verifier().with_options(VerifierOptions::new().with_max_signatures(2));
        assert_eq!(v.verify(pdf).unwrap().signed_count, 2);
        assert_eq!(verifier().verify(pdf).unwrap().signed_count, 3);
    }

    #[test]
    fn test_custom_scanner() {
        struct Fixed;
        impl SignatureScanner for Fixed {
            fn scan(&self, _data: &[u8]) -> Vec<RawSignatureBlock> {
                vec![RawSignatureBlock {
                    signer_name: Some("Scripted".to_string()),
                    ..RawSignatureBlock::default()
                }]
            }
            fn name(&self) -> &str {
                "fixed"
            }
        }

        let result = verifier().with_scanner(Fixed).verify(b"%PDF-1.7").unwrap();
        assert_eq!(result.signatures[0].signer_name, "Scripted");
        assert_eq!(result.signatures[0].failure_reason.as_deref(), Some(REASON_NO_CONTENTS));
    }

    /// Scanner that reports one fully populated block with the given hex.
    struct HexOnly(&'static str);

    impl SignatureScanner for HexOnly {
        fn scan(&self, _data: &[u8]) -> Vec<RawSignatureBlock> {
            vec![RawSignatureBlock {
                contents_hex: self.0.to_string(),
                signer_name: Some("Alice".to_string()),
                signer_role: Some("Approver".to_string()),
                signing_time_raw: Some("D:20240315143000Z".to_string()),
            }]
        }
        fn name(&self) -> &str {
            "hex-only"
        }
    }

    #[test]
    fn test_undecodable_contents() {
        for hex in ["zz", "  \n\t"] {
            let result = verifier().with_scanner(HexOnly(hex)).verify(b"%PDF-1.7").unwrap();
            assert!(!result.all_valid);

            let sig = &result.signatures[0];
            assert!(!sig.is_valid);
            assert_eq!(sig.failure_reason.as_deref(), Some(REASON_UNDECODABLE), "{:?}", hex);
            assert_eq!(sig.signer_name, "Alice");
            assert_eq!(sig.signer_role, "Approver");
            assert_eq!(
                sig.signing_time.map(|t| t.timestamp()),
                parse_pdf_date("D:20240315143000Z").map(|t| t.timestamp())
            );
            assert!(sig.signing_time.is_some());
            assert!(sig.certificate_subject.is_empty());
        }
    }

    #[test]
    fn test_debug_output() {
        let debug = format!("{:?}", verifier());
        assert!(debug.contains("textual"));
        assert!(debug.contains("der-walk"));
    }
}
