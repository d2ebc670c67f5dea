//! Signature dictionary scanning.
//!
//! The default backend treats the document as a flat byte sequence. It finds
//! every `/Type /Sig` marker and reads the neighbouring dictionary entries
//! from a fixed-size window that starts at the marker:
//!
//! ```text
//! << /Type /Sig /Filter /Adobe.PPKLite /SubFilter /adbe.pkcs7.detached
//!    /Name (Alice) /Reason (Approver) /M (D:20240315143000Z)
//!    /Contents <3082...> /ByteRange [0 840 960 240] >>
//! ```
//!
//! No cross-reference table is read and object streams are not
//! decompressed, so signature dictionaries stored inside compressed object
//! streams are not found. Stricter backends can be plugged in through
//! [`SignatureScanner`] as long as they produce the same fields.

use super::types::RawSignatureBlock;
use lazy_static::lazy_static;
use regex::bytes::Regex;

/// Bytes examined after each `/Type /Sig` marker.
///
/// Persisted verification records depend on this bound; changing it
/// changes which fields are picked up for large dictionaries.
pub const SIGNATURE_WINDOW: usize = 4096;

lazy_static! {
    /// `/Type /Sig`, whitespace-tolerant
    static ref RE_SIG_MARKER: Regex = Regex::new(r"(?-u)/Type\s*/Sig").unwrap();

    static ref RE_NAME: Regex = Regex::new(r"(?-u)/Name\s*\(([^)]*)\)").unwrap();
    static ref RE_REASON: Regex = Regex::new(r"(?-u)/Reason\s*\(([^)]*)\)").unwrap();
    static ref RE_SIGNING_TIME: Regex = Regex::new(r"(?-u)/M\s*\(([^)]*)\)").unwrap();
    static ref RE_CONTENTS: Regex = Regex::new(r"(?-u)/Contents\s*<([0-9A-Fa-f\s]+)>").unwrap();
}

/// Backend that locates signature dictionaries in a document.
///
/// Implementations return one block per signature dictionary, in document
/// order. Finding nothing is not an error.
pub trait SignatureScanner: Send + Sync {
    /// Scan a whole document.
    fn scan(&self, data: &[u8]) -> Vec<RawSignatureBlock>;

    /// Backend name, used in log output.
    fn name(&self) -> &str;
}

/// Regex-based scanner over the raw document bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextualScanner;

impl TextualScanner {
    /// Create a new textual scanner.
    pub fn new() -> Self {
        Self
    }

    fn extract_block(window: &[u8]) -> RawSignatureBlock {
        RawSignatureBlock {
            contents_hex: capture(&RE_CONTENTS, window)
                .map(|hex| {
                    hex.iter()
                        .filter(|b| !b.is_ascii_whitespace())
                        .map(|&b| b as char)
                        .collect()
                })
                .unwrap_or_default(),
            signer_name: capture(&RE_NAME, window).and_then(decode_text_string),
            signer_role: capture(&RE_REASON, window).and_then(decode_text_string),
            signing_time_raw: capture(&RE_SIGNING_TIME, window)
                .map(|raw| String::from_utf8_lossy(raw).into_owned()),
        }
    }
}

impl SignatureScanner for TextualScanner {
    fn scan(&self, data: &[u8]) -> Vec<RawSignatureBlock> {
        let blocks: Vec<RawSignatureBlock> = RE_SIG_MARKER
            .find_iter(data)
            .map(|m| {
                let start = m.start();
                let end = (start + SIGNATURE_WINDOW).min(data.len());
                log::debug!("Signature dictionary marker at offset {}", start);
                Self::extract_block(&data[start..end])
            })
            .collect();

        log::debug!("Found {} signature dictionary marker(s)", blocks.len());
        blocks
    }

    fn name(&self) -> &str {
        "textual"
    }
}

/// Scan a document with the default [`TextualScanner`].
pub fn scan(data: &[u8]) -> Vec<RawSignatureBlock> {
    TextualScanner.scan(data)
}

fn capture<'a>(re: &Regex, window: &'a [u8]) -> Option<&'a [u8]> {
    re.captures(window)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_bytes())
}

/// Decode the body of a PDF literal string (the part between the parens).
///
/// UTF-16BE with a byte-order mark is honoured; anything else is read as
/// UTF-8, replacing invalid sequences. Blank values count as absent.
fn decode_text_string(raw: &[u8]) -> Option<String> {
    let text = match raw {
        [0xFE, 0xFF, rest @ ..] => {
            let units = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        },
        _ => String::from_utf8_lossy(raw).into_owned(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNED: &[u8] = b"%PDF-1.7\n\
        5 0 obj\n<< /Type /Sig /Filter /Adobe.PPKLite\n\
        /Name ( Alice Example ) /Reason (Approver)\n\
        /M (D:20240315143000Z)\n\
        /Contents <3082 01\n0a>\n>>\nendobj\n%%EOF";

    #[test]
    fn test_no_markers() {
        assert!(scan(b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n").is_empty());
    }

    #[test]
    fn test_extracts_fields() {
        let blocks = scan(SIGNED);
        assert_eq!(blocks.len(), 1);

        let block = &blocks[0];
        assert_eq!(block.signer_name.as_deref(), Some("Alice Example"));
        assert_eq!(block.signer_role.as_deref(), Some("Approver"));
        assert_eq!(block.signing_time_raw.as_deref(), Some("D:20240315143000Z"));
        assert_eq!(block.contents_hex, "3082010a");
    }

    #[test]
    fn test_marker_without_whitespace() {
        let blocks = scan(b"%PDF-1.7 <</Type/Sig/Contents<00ff>>>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].contents_hex, "00ff");
        assert!(blocks[0].signer_name.is_none());
    }

    #[test]
    fn test_missing_fields_still_yield_block() {
        let blocks = scan(b"%PDF-1.7 << /Type /Sig /Filter /Adobe.PPKLite >>");
        assert_eq!(blocks, vec![RawSignatureBlock::default()]);
    }

    #[test]
    fn test_fields_outside_window_are_ignored() {
        let mut pdf = b"%PDF-1.7 << /Type /Sig ".to_vec();
        pdf.extend(std::iter::repeat(b' ').take(SIGNATURE_WINDOW));
        pdf.extend_from_slice(b"/Name (Too Far) /Contents <00> >>");

        let blocks = scan(&pdf);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].signer_name.is_none());
        assert!(blocks[0].contents_hex.is_empty());
    }

    #[test]
    fn test_overlapping_windows_each_produce_a_block() {
        let pdf = b"%PDF-1.7 << /Type /Sig /Name (First) >> << /Type /Sig /Name (Second) >>";
        let blocks = scan(pdf);
        assert_eq!(blocks.len(), 2);
        // the first window also covers the second dictionary; the first match wins
        assert_eq!(blocks[0].signer_name.as_deref(), Some("First"));
        assert_eq!(blocks[1].signer_name.as_deref(), Some("Second"));
    }

    #[test]
    fn test_utf16_name() {
        let mut pdf = b"%PDF-1.7 << /Type /Sig /Name (".to_vec();
        pdf.extend_from_slice(&[0xFE, 0xFF, 0x00, b'J', 0x00, 0xF6, 0x00, b'r', 0x00, b'g']);
        pdf.extend_from_slice(b") >>");

        let blocks = scan(&pdf);
        assert_eq!(blocks[0].signer_name.as_deref(), Some("J\u{f6}rg"));
    }

    #[test]
    fn test_non_utf8_bytes_do_not_break_scan() {
        let mut pdf = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n".to_vec();
        pdf.extend_from_slice(b"<< /Type /Sig /Name (\xFFx) >>");
        let blocks = scan(&pdf);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].signer_name.as_deref(), Some("\u{fffd}x"));
    }

    #[test]
    fn test_scanner_name() {
        assert_eq!(TextualScanner::new().name(), "textual");
    }
}
