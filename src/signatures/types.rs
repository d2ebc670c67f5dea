//! Signature verification data types.
//!
//! [`RawSignatureBlock`] is the transient output of the scanner.
//! [`SignatureInfo`] and [`VerificationResult`] are what callers receive,
//! serialise and persist (one row per signature).

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// Fields lifted from one `/Type /Sig` dictionary, before any decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSignatureBlock {
    /// Hex-encoded `/Contents` value with whitespace removed (empty if absent)
    pub contents_hex: String,
    /// `/Name` value
    pub signer_name: Option<String>,
    /// `/Reason` value
    pub signer_role: Option<String>,
    /// `/M` value, still a raw PDF date literal
    pub signing_time_raw: Option<String>,
}

/// Verification outcome for a single embedded signature.
///
/// `is_valid` reports certificate trust-chain validity only. The signature
/// bytes are not checked against the `/ByteRange` content, so a valid entry
/// is not proof that the signer's key produced a signature over this
/// document.
///
/// There is no `Default`: every value the crate hands out satisfies the
/// `failure_reason`/`is_valid` pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureInfo {
    /// `/Name` from the dictionary, or the certificate's common name
    pub signer_name: String,
    /// First email address from the certificate's subjectAltName
    pub signer_email: String,
    /// `/Reason` from the dictionary
    pub signer_role: String,
    /// Issuer DN (RFC 4514)
    pub certificate_issuer: String,
    /// Subject DN (RFC 4514)
    pub certificate_subject: String,
    /// Parsed `/M` value; `None` when absent or unparseable
    pub signing_time: Option<DateTime<FixedOffset>>,
    /// Whether the signer certificate chains to a trust anchor
    pub is_valid: bool,
    /// Why the signature is invalid; set iff `is_valid` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Signer certificate as PEM, when requested through the options
    #[serde(skip)]
    pub raw_certificate_pem: Option<String>,
}

/// Reason carried by an entry until the pipeline reaches a verdict.
pub(crate) const REASON_UNVERIFIED: &str = "signature not verified";

impl SignatureInfo {
    /// Entry carrying the dictionary metadata, invalid until verified.
    pub(crate) fn unverified(
        signer_name: String,
        signer_role: String,
        signing_time: Option<DateTime<FixedOffset>>,
    ) -> Self {
        Self {
            signer_name,
            signer_email: String::new(),
            signer_role,
            certificate_issuer: String::new(),
            certificate_subject: String::new(),
            signing_time,
            is_valid: false,
            failure_reason: Some(REASON_UNVERIFIED.to_string()),
            raw_certificate_pem: None,
        }
    }

    /// Mark this signature invalid with the given reason.
    pub(crate) fn invalidate(&mut self, reason: impl Into<String>) {
        self.is_valid = false;
        self.failure_reason = Some(reason.into());
    }

    /// Mark this signature valid, clearing any failure reason.
    pub(crate) fn validate(&mut self) {
        self.is_valid = true;
        self.failure_reason = None;
    }

    /// Compact JSON summary stored next to each persisted signature row.
    pub fn verification_details(&self) -> serde_json::Value {
        serde_json::json!({
            "is_valid": self.is_valid,
            "failure_reason": self.failure_reason.as_deref().unwrap_or(""),
            "certificate_issuer": self.certificate_issuer,
            "certificate_subject": self.certificate_subject,
        })
    }
}

/// Aggregate outcome of one verification call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// One entry per signature dictionary, in document order
    pub signatures: Vec<SignatureInfo>,
    /// True iff every entry is valid (vacuously true with no signatures)
    pub all_valid: bool,
    /// Number of entries in `signatures`
    pub signed_count: usize,
    /// Wall-clock time of the call
    pub verified_at: DateTime<Utc>,
}

impl VerificationResult {
    /// Aggregate per-signature results.
    pub fn from_signatures(signatures: Vec<SignatureInfo>, verified_at: DateTime<Utc>) -> Self {
        let all_valid = signatures.iter().all(|s| s.is_valid);
        Self {
            signed_count: signatures.len(),
            signatures,
            all_valid,
            verified_at,
        }
    }

    /// Whether the document carries at least one signature.
    ///
    /// An unsigned document is reported as `all_valid`; callers that require
    /// a signature must check this.
    pub fn is_signed(&self) -> bool {
        self.signed_count > 0
    }

    /// Entries that failed verification.
    pub fn invalid_signatures(&self) -> impl Iterator<Item = &SignatureInfo> {
        self.signatures.iter().filter(|s| !s.is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(name: &str) -> SignatureInfo {
        let mut info = SignatureInfo::unverified(name.to_string(), String::new(), None);
        info.validate();
        info
    }

    #[test]
    fn test_empty_result_is_vacuously_valid() {
        let result = VerificationResult::from_signatures(Vec::new(), Utc::now());
        assert_eq!(result.signed_count, 0);
        assert!(result.all_valid);
        assert!(!result.is_signed());
    }

    #[test]
    fn test_one_invalid_signature_fails_aggregate() {
        let mut bad = valid("Bob");
        bad.invalidate("no /Contents found in signature dictionary");
        let result = VerificationResult::from_signatures(vec![valid("Alice"), bad], Utc::now());

        assert_eq!(result.signed_count, 2);
        assert!(!result.all_valid);
        let invalid: Vec<_> = result.invalid_signatures().collect();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].signer_name, "Bob");
    }

    #[test]
    fn test_unverified_entry_is_invalid_with_reason() {
        let info = SignatureInfo::unverified("Alice".to_string(), "Approver".to_string(), None);
        assert!(!info.is_valid);
        assert_eq!(info.failure_reason.as_deref(), Some(REASON_UNVERIFIED));
        assert_eq!(info.signer_name, "Alice");
        assert_eq!(info.signer_role, "Approver");
    }

    #[test]
    fn test_failure_reason_tracks_validity() {
        let mut info = SignatureInfo::unverified(String::new(), String::new(), None);
        info.invalidate("broken");
        assert!(!info.is_valid);
        assert_eq!(info.failure_reason.as_deref(), Some("broken"));

        info.validate();
        assert!(info.is_valid);
        assert!(info.failure_reason.is_none());
    }

    #[test]
    fn test_serialization_omits_absent_reason_and_pem() {
        let mut info = valid("Alice");
        info.raw_certificate_pem = Some("-----BEGIN CERTIFICATE-----".to_string());
        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["signer_name"], "Alice");
        assert_eq!(json["is_valid"], true);
        assert!(json.get("failure_reason").is_none());
        assert!(json.get("raw_certificate_pem").is_none());
    }

    #[test]
    fn test_verification_details() {
        let mut info = SignatureInfo::unverified(String::new(), String::new(), None);
        info.certificate_issuer = "CN=Root".to_string();
        info.certificate_subject = "CN=Alice".to_string();
        info.invalidate("expired");
        let details = info.verification_details();

        assert_eq!(details["is_valid"], false);
        assert_eq!(details["failure_reason"], "expired");
        assert_eq!(details["certificate_issuer"], "CN=Root");
        assert_eq!(details["certificate_subject"], "CN=Alice");
    }
}
