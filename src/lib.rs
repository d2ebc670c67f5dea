//! # PDF Sigverify
//!
//! Embedded-signature verification for PDF documents.
//!
//! Given the raw bytes of a PDF, the crate locates every embedded digital
//! signature, extracts the signer's X.509 certificate, validates the
//! certificate's trust chain and reports one result per signature.
//!
//! ## Features
//!
//! - **Heuristic scanning**: `/Type /Sig` dictionaries are found in the
//!   raw bytes, no object model is built
//! - **Certificate extraction**: PEM blocks or DER certificates inside
//!   CMS/PKCS#7 blobs, without a CMS parser
//! - **Chain validation**: against an explicit, shareable trust anchor set
//! - **Defensive**: malformed signature blocks yield an invalid entry with a
//!   reason, never a failed call
//!
//! The core is a pure function from bytes to [`VerificationResult`]: it
//! performs no I/O, holds no state between calls and is safe to call from
//! many threads at once.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_sigverify::signatures::TrustAnchors;
//! use pdf_sigverify::verify_pdf_signatures;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let anchors = TrustAnchors::system_or_empty();
//! let bytes = std::fs::read("signed.pdf")?;
//!
//! let result = verify_pdf_signatures(&bytes, &anchors)?;
//! if !result.is_signed() {
//!     println!("document is not signed");
//! }
//! println!("{} signature(s), all valid: {}", result.signed_count, result.all_valid);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 (<http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license (<http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Signature scanning, certificate extraction and chain validation
pub mod signatures;

pub use config::VerifierOptions;
pub use error::{ChainError, Error, ExtractionError, InputError, Result, TrustStoreError};
pub use signatures::{
    verify_pdf_signatures, SignatureInfo, SignatureVerifier, TrustAnchors, VerificationResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
