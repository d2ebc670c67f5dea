//! Configuration for signature verification.

/// Signature verification options.
///
/// The defaults impose no limits, which reproduces the plain pipeline
/// behaviour: every signature dictionary found is reported, whatever the
/// size of the document.
///
/// # Example
///
/// ```
/// use pdf_sigverify::config::VerifierOptions;
///
/// let options = VerifierOptions::default()
///     .with_max_input_size(50 * 1024 * 1024)
///     .with_max_signatures(64);
/// assert_eq!(options.max_signatures, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerifierOptions {
    /// Reject inputs larger than this many bytes (0 = unlimited).
    ///
    /// Scanning cost is linear in document size, so callers that need to
    /// bound latency should set this.
    pub max_input_size: usize,

    /// Process at most this many signature dictionaries (0 = unlimited).
    pub max_signatures: usize,

    /// Attach the extracted signer certificate as PEM to each result.
    pub include_certificate_pem: bool,
}

impl VerifierOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum accepted input size in bytes.
    pub fn with_max_input_size(mut self, limit: usize) -> Self {
        self.max_input_size = limit;
        self
    }

    /// Set the maximum number of signature dictionaries processed.
    pub fn with_max_signatures(mut self, limit: usize) -> Self {
        self.max_signatures = limit;
        self
    }

    /// Attach signer certificates as PEM.
    pub fn with_certificate_pem(mut self, enable: bool) -> Self {
        self.include_certificate_pem = enable;
        self
    }
}
