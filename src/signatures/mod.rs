//! PDF embedded signature verification.
//!
//! This module finds the digital signatures embedded in a PDF document,
//! extracts each signer's X.509 certificate and validates the certificate
//! against a set of trust anchors.
//!
//! ## Components
//!
//! - **Scanner**: finds `/Type /Sig` dictionaries and reads `/Name`,
//!   `/Reason`, `/M` and `/Contents` ([`scan`], [`SignatureScanner`])
//! - **Hex decoding**: turns `/Contents` into bytes ([`decode_hex`])
//! - **Certificate extraction**: PEM first, then a DER walk
//!   ([`CertificateExtractor`], [`extract_certificate`])
//! - **Chain validation**: against injectable [`TrustAnchors`]
//!   ([`validate_chain`])
//! - **Date parsing**: PDF date literals ([`parse_pdf_date`])
//! - **Pipeline**: [`SignatureVerifier`] ties everything together
//!
//! ## Scope
//!
//! A signature is reported valid when its signer certificate chains to a
//! trust anchor at the validation instant. The CMS `SignerInfo` is not
//! parsed and the signature value is not checked against the bytes covered
//! by `/ByteRange`. A valid result is therefore not proof that the document
//! is unmodified or that the certificate holder produced the signature
//! (full PAdES validation is out of scope).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pdf_sigverify::signatures::{SignatureVerifier, TrustAnchors};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let anchors = Arc::new(TrustAnchors::from_pem_file("roots.pem".as_ref())?);
//! let verifier = SignatureVerifier::new(anchors);
//!
//! let bytes = std::fs::read("contract.pdf")?;
//! let result = verifier.verify(&bytes)?;
//! for sig in &result.signatures {
//!     println!("{}: valid={} {:?}", sig.signer_name, sig.is_valid, sig.failure_reason);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## PDF Specification Reference
//!
//! - ISO 32000-1:2008 Section 12.8 - Digital Signatures
//! - ISO 32000-1:2008 Section 7.9.4 - Dates

mod certificate;
mod chain;
mod date;
mod extractor;
mod hex_decode;
mod scanner;
mod types;
mod verifier;

pub use certificate::Certificate;
pub use chain::{validate_chain, TrustAnchors};
pub use date::parse_pdf_date;
pub use extractor::{
    extract_certificate, CertificateExtractor, DerWalkStrategy, ExtractionStrategy, PemStrategy,
};
pub use hex_decode::decode_hex;
pub use scanner::{scan, SignatureScanner, TextualScanner, SIGNATURE_WINDOW};
pub use types::{RawSignatureBlock, SignatureInfo, VerificationResult};
pub use verifier::{
    verify_pdf_signatures, SignatureVerifier, REASON_NO_CONTENTS, REASON_UNDECODABLE,
};
