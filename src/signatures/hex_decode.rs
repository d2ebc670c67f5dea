//! Hex decoding for `/Contents` values.

/// Decode a hex string, ignoring embedded whitespace.
///
/// An odd number of digits is left-padded with a single `0` nibble before
/// decoding. Existing verification records were produced with this rule,
/// so it is kept even though the PDF specification pads on the right.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let mut digits: String = hex_str
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        digits.insert(0, '0');
    }
    hex::decode(digits)
}
