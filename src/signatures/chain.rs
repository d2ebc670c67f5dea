//! Trust anchors and certificate chain validation.
//!
//! The signer certificate is accepted when, at the validation instant, it
//! is within its validity period and either is itself a trust anchor or
//! carries a signature made by a trust anchor whose subject matches its
//! issuer. Key usage is not restricted: any certificate issued by a trusted
//! root is acceptable for document signing. Revocation is not checked.
//!
//! [`TrustAnchors`] is built once and shared read-only (typically behind an
//! `Arc`) between concurrent verifications. Loading the platform store is
//! the only place this crate touches the filesystem.

use super::certificate::Certificate;
use crate::error::{ChainError, TrustStoreError};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use x509_parser::pem::Pem;
use x509_parser::prelude::*;

/// Well-known CA bundle files, in order of preference.
const KNOWN_CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL/CentOS/Fedora
    "/etc/ssl/ca-bundle.pem",             // openSUSE
    "/etc/ssl/cert.pem",                  // macOS, Alpine
];

/// Well-known CA certificate directories.
const KNOWN_CA_DIR_PATHS: &[&str] = &["/etc/ssl/certs"];

/// A set of trusted root certificates.
#[derive(Clone, Default)]
pub struct TrustAnchors {
    /// Raw DER subject name -> DER certificates with that subject
    certs_by_subject: HashMap<Vec<u8>, Vec<Vec<u8>>>,
    count: usize,
}

impl std::fmt::Debug for TrustAnchors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustAnchors")
            .field("count", &self.count)
            .finish()
    }
}

impl TrustAnchors {
    /// Create an empty anchor set. Nothing validates against it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the platform trust store.
    ///
    /// Looks, in order, at `SSL_CERT_FILE`, the bundle reported by
    /// `openssl-probe`, the well-known bundle paths, then `SSL_CERT_DIR`,
    /// the probed directory and the well-known directories.
    pub fn system() -> Result<Self, TrustStoreError> {
        let probe = openssl_probe::probe();

        let bundles = std::env::var_os("SSL_CERT_FILE")
            .map(PathBuf::from)
            .into_iter()
            .chain(probe.cert_file)
            .chain(KNOWN_CA_BUNDLE_PATHS.iter().map(PathBuf::from));
        for path in bundles {
            if let Ok(anchors) = Self::from_pem_file(&path) {
                if !anchors.is_empty() {
                    log::debug!("Loaded {} trust anchors from {}", anchors.len(), path.display());
                    return Ok(anchors);
                }
            }
        }

        let dirs = std::env::var_os("SSL_CERT_DIR")
            .map(PathBuf::from)
            .into_iter()
            .chain(probe.cert_dir)
            .chain(KNOWN_CA_DIR_PATHS.iter().map(PathBuf::from));
        for dir in dirs {
            let mut anchors = Self::new();
            if let Ok(added) = anchors.add_pem_directory(&dir) {
                if added > 0 {
                    log::debug!("Loaded {} trust anchors from {}", added, dir.display());
                    return Ok(anchors);
                }
            }
        }

        Err(TrustStoreError::NotFound)
    }

    /// Load the platform trust store, or fall back to an empty set.
    pub fn system_or_empty() -> Self {
        match Self::system() {
            Ok(anchors) => anchors,
            Err(e) => {
                log::warn!("System trust store unavailable ({}), using an empty anchor set", e);
                Self::new()
            },
        }
    }

    /// Build an anchor set from a PEM bundle.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, TrustStoreError> {
        let mut anchors = Self::new();
        anchors.add_pem_bundle(pem_data)?;
        Ok(anchors)
    }

    /// Build an anchor set from a PEM bundle on disk.
    pub fn from_pem_file(path: &Path) -> Result<Self, TrustStoreError> {
        let data = std::fs::read(path)?;
        Self::from_pem(&data)
    }

    /// Add a DER-encoded root certificate.
    pub fn add_der(&mut self, der: &[u8]) -> Result<(), TrustStoreError> {
        let (_, x509) =
            X509Certificate::from_der(der).map_err(|e| TrustStoreError::Der(e.to_string()))?;

        let entry = self
            .certs_by_subject
            .entry(x509.subject().as_raw().to_vec())
            .or_default();
        if !entry.iter().any(|existing| existing == der) {
            entry.push(der.to_vec());
            self.count += 1;
        }
        Ok(())
    }

    /// Add every `CERTIFICATE` block of a PEM bundle.
    ///
    /// Blocks that fail to parse as certificates are skipped. Returns the
    /// number of certificates added.
    pub fn add_pem_bundle(&mut self, pem_data: &[u8]) -> Result<usize, TrustStoreError> {
        let mut added = 0;
        for block in Pem::iter_from_buffer(pem_data) {
            let pem = block.map_err(|e| TrustStoreError::Pem(e.to_string()))?;
            if pem.label == "CERTIFICATE" && self.add_der(&pem.contents).is_ok() {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Add the PEM files of a directory (`.pem`, `.crt`, `.cer` and
    /// OpenSSL hash links such as `a1b2c3d4.0`).
    pub fn add_pem_directory(&mut self, dir: &Path) -> Result<usize, TrustStoreError> {
        let mut total = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || !is_pem_cert_file(&path) {
                continue;
            }
            if let Ok(data) = std::fs::read(&path) {
                if let Ok(added) = self.add_pem_bundle(&data) {
                    total += added;
                }
            }
        }
        Ok(total)
    }

    /// Number of anchors.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn find_by_subject_raw(&self, subject_raw: &[u8]) -> &[Vec<u8>] {
        self.certs_by_subject
            .get(subject_raw)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn is_pem_cert_file(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e,
        None => return false,
    };
    matches!(ext, "pem" | "crt" | "cer")
        || (ext.len() == 1 && ext.bytes().all(|b| b.is_ascii_digit()))
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn check_validity(
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ChainError> {
    if now < not_before {
        return Err(ChainError::NotYetValid {
            now: rfc3339(now),
            not_before: rfc3339(not_before),
        });
    }
    if now > not_after {
        return Err(ChainError::Expired {
            now: rfc3339(now),
            not_after: rfc3339(not_after),
        });
    }
    Ok(())
}

/// Validate `certificate` against `anchors` at instant `now`.
pub fn validate_chain(
    certificate: &Certificate,
    anchors: &TrustAnchors,
    now: DateTime<Utc>,
) -> Result<(), ChainError> {
    check_validity(certificate.not_before(), certificate.not_after(), now)?;

    let (_, leaf) = X509Certificate::from_der(certificate.der())
        .map_err(|e| ChainError::Malformed(e.to_string()))?;

    if anchors
        .find_by_subject_raw(leaf.subject().as_raw())
        .iter()
        .any(|der| der.as_slice() == certificate.der())
    {
        log::debug!("Signer certificate is itself a trust anchor");
        return Ok(());
    }

    let candidates = anchors.find_by_subject_raw(leaf.issuer().as_raw());

    let mut last_reason = None;
    for anchor_der in candidates {
        let anchor = match Certificate::from_der(anchor_der) {
            Ok(anchor) => anchor,
            Err(e) => {
                last_reason = Some(format!("unreadable anchor: {}", e));
                continue;
            },
        };
        if let Err(e) = check_validity(anchor.not_before(), anchor.not_after(), now) {
            last_reason = Some(format!("trust anchor \"{}\": {}", anchor.subject(), e));
            continue;
        }

        let (_, anchor_x509) = X509Certificate::from_der(anchor_der)
            .map_err(|e| ChainError::Malformed(e.to_string()))?;
        match leaf.verify_signature(Some(anchor_x509.public_key())) {
            Ok(()) => {
                log::debug!("Signer certificate chains to \"{}\"", anchor.subject());
                return Ok(());
            },
            Err(e) => {
                last_reason = Some(format!(
                    "signature check against \"{}\" failed: {}",
                    anchor.subject(),
                    e
                ));
            },
        }
    }

    Err(ChainError::UnknownAuthority(last_reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ROOT_PEM: &[u8] = include_bytes!("../../tests/fixtures/signatures/root_ca.pem");
    const OTHER_ROOT_PEM: &[u8] = include_bytes!("../../tests/fixtures/signatures/other_root_ca.pem");
    const SIGNER_PEM: &[u8] = include_bytes!("../../tests/fixtures/signatures/signer.pem");

    fn pem_cert(pem: &[u8]) -> Certificate {
        let (_, block) = x509_parser::pem::parse_x509_pem(pem).unwrap();
        Certificate::from_der(&block.contents).unwrap()
    }

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_anchor_loading() {
        let mut anchors = TrustAnchors::from_pem(ROOT_PEM).unwrap();
        assert_eq!(anchors.len(), 1);

        // duplicates are ignored
        assert_eq!(anchors.add_pem_bundle(ROOT_PEM).unwrap(), 1);
        assert_eq!(anchors.len(), 1);

        anchors.add_pem_bundle(OTHER_ROOT_PEM).unwrap();
        assert_eq!(anchors.len(), 2);
        assert!(!anchors.is_empty());
    }

    #[test]
    fn test_add_der_rejects_garbage() {
        let mut anchors = TrustAnchors::new();
        assert!(matches!(anchors.add_der(&[0x30, 0x00]), Err(TrustStoreError::Der(_))));
        assert!(anchors.is_empty());
    }

    #[test]
    fn test_valid_chain() {
        let anchors = TrustAnchors::from_pem(ROOT_PEM).unwrap();
        assert_eq!(validate_chain(&pem_cert(SIGNER_PEM), &anchors, at(2025)), Ok(()));
    }

    #[test]
    fn test_expired() {
        let anchors = TrustAnchors::from_pem(ROOT_PEM).unwrap();
        let err = validate_chain(&pem_cert(SIGNER_PEM), &anchors, at(2031)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "certificate has expired: current time 2031-06-01T00:00:00Z is after 2030-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_not_yet_valid() {
        let anchors = TrustAnchors::from_pem(ROOT_PEM).unwrap();
        let err = validate_chain(&pem_cert(SIGNER_PEM), &anchors, at(2023)).unwrap_err();
        assert!(matches!(err, ChainError::NotYetValid { .. }));
    }

    #[test]
    fn test_unknown_authority() {
        let anchors = TrustAnchors::from_pem(OTHER_ROOT_PEM).unwrap();
        let err = validate_chain(&pem_cert(SIGNER_PEM), &anchors, at(2025)).unwrap_err();
        assert_eq!(err, ChainError::UnknownAuthority(None));

        let err = validate_chain(&pem_cert(SIGNER_PEM), &TrustAnchors::new(), at(2025)).unwrap_err();
        assert_eq!(err.to_string(), "certificate signed by unknown authority");
    }

    #[test]
    fn test_root_is_its_own_anchor() {
        let anchors = TrustAnchors::from_pem(ROOT_PEM).unwrap();
        assert_eq!(validate_chain(&pem_cert(ROOT_PEM), &anchors, at(2025)), Ok(()));
    }

    #[test]
    fn test_pinned_leaf_without_its_issuer() {
        let anchors = TrustAnchors::from_pem(SIGNER_PEM).unwrap();
        assert_eq!(validate_chain(&pem_cert(SIGNER_PEM), &anchors, at(2025)), Ok(()));
    }

    #[test]
    fn test_pem_file_extensions() {
        assert!(is_pem_cert_file(Path::new("/etc/ssl/certs/root.pem")));
        assert!(is_pem_cert_file(Path::new("ca.crt")));
        assert!(is_pem_cert_file(Path::new("a1b2c3d4.0")));
        assert!(!is_pem_cert_file(Path::new("README")));
        assert!(!is_pem_cert_file(Path::new("notes.txt")));
    }
}
