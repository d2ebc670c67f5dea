//! Error types for signature verification.
//!
//! Errors come in two tiers. [`InputError`] aborts a verification call
//! entirely. [`ExtractionError`] and [`ChainError`] are per-signature: the
//! pipeline turns them into a `failure_reason` on the affected
//! [`SignatureInfo`](crate::signatures::SignatureInfo) and moves on to the
//! next signature block.

/// Result type alias for fallible operations outside the verification core.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal, input-level failures. No partial result is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The byte buffer is empty
    #[error("PDF content is empty")]
    Empty,

    /// The byte buffer does not start with the `%PDF` marker
    #[error("content does not appear to be a valid PDF")]
    NotAPdf,

    /// The byte buffer exceeds the configured size limit
    #[error("PDF content is {size} bytes, exceeding the limit of {limit} bytes")]
    TooLarge {
        /// Size of the rejected input
        size: usize,
        /// Configured limit
        limit: usize,
    },
}

/// No certificate could be located in a signature's `/Contents` blob.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// Every extraction strategy failed
    #[error("no parseable certificate found in CMS blob: {0}")]
    NoCertificate(String),
}

/// The signer certificate does not chain to a trust anchor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The validation instant is after the certificate's `notAfter`
    #[error("certificate has expired: current time {now} is after {not_after}")]
    Expired {
        /// Validation instant (RFC 3339)
        now: String,
        /// Certificate expiry (RFC 3339)
        not_after: String,
    },

    /// The validation instant is before the certificate's `notBefore`
    #[error("certificate is not yet valid: current time {now} is before {not_before}")]
    NotYetValid {
        /// Validation instant (RFC 3339)
        now: String,
        /// Certificate start of validity (RFC 3339)
        not_before: String,
    },

    /// No trust anchor issued the certificate
    #[error("certificate signed by unknown authority{}", parenthesized(.0))]
    UnknownAuthority(Option<String>),

    /// The certificate or a candidate anchor could not be decoded
    #[error("malformed certificate: {0}")]
    Malformed(String),
}

fn parenthesized(reason: &Option<String>) -> String {
    match reason {
        Some(r) => format!(" ({})", r),
        None => String::new(),
    }
}

/// Failures while building a [`TrustAnchors`](crate::signatures::TrustAnchors) set.
#[derive(Debug, thiserror::Error)]
pub enum TrustStoreError {
    /// IO error while reading a bundle or directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A PEM bundle could not be decoded
    #[error("invalid PEM data: {0}")]
    Pem(String),

    /// A DER certificate could not be parsed
    #[error("invalid DER certificate: {0}")]
    Der(String),

    /// No system trust store could be located
    #[error("no system trust store found")]
    NotFound,
}

/// Umbrella error for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input rejected before scanning
    #[error(transparent)]
    Input(#[from] InputError),

    /// Trust anchor loading failed
    #[error(transparent)]
    TrustStore(#[from] TrustStoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
