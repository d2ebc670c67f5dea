//! Owned X.509 certificate summary.
//!
//! Parsed `x509-parser` certificates borrow the buffer they were decoded
//! from. Extraction often decodes into a temporary buffer (PEM), so the
//! pipeline carries this owned summary instead and re-parses the DER when a
//! full certificate view is needed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use x509_parser::prelude::*;

/// An X.509 certificate located inside a signature's `/Contents` blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    common_name: Option<String>,
    email: Option<String>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl Certificate {
    /// Parse a DER certificate at the start of `data`.
    ///
    /// Trailing bytes after the certificate are allowed and dropped.
    pub fn from_der(data: &[u8]) -> Result<Self, String> {
        let (rest, x509) = X509Certificate::from_der(data).map_err(|e| e.to_string())?;
        let der = data[..data.len() - rest.len()].to_vec();
        Self::summarize(&x509, der)
    }

    fn summarize(x509: &X509Certificate<'_>, der: Vec<u8>) -> Result<Self, String> {
        let validity = x509.validity();
        let not_before = timestamp(validity.not_before.timestamp())?;
        let not_after = timestamp(validity.not_after.timestamp())?;

        Ok(Self {
            subject: format_dn(x509.subject()),
            issuer: format_dn(x509.issuer()),
            common_name: x509
                .subject()
                .iter_common_name()
                .next()
                .and_then(|cn| cn.as_str().ok())
                .map(str::to_string),
            email: first_email(x509),
            not_before,
            not_after,
            der,
        })
    }

    /// DER encoding of exactly this certificate.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject DN (RFC 4514).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer DN (RFC 4514).
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// First subject common name.
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// First rfc822Name from the subjectAltName extension.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Start of validity.
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// End of validity.
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// PEM encoding.
    pub fn to_pem(&self) -> String {
        let b64 = STANDARD.encode(&self.der);
        let mut pem = String::with_capacity(b64.len() + b64.len() / 64 + 64);
        pem.push_str("-----BEGIN CERTIFICATE-----\n");
        for line in b64.as_bytes().chunks(64) {
            pem.push_str(&String::from_utf8_lossy(line));
            pem.push('\n');
        }
        pem.push_str("-----END CERTIFICATE-----\n");
        pem
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| format!("validity time out of range: {}", secs))
}

fn first_email(x509: &X509Certificate<'_>) -> Option<String> {
    let san = x509.subject_alternative_name().ok().flatten()?;
    san.value.general_names.iter().find_map(|name| match name {
        GeneralName::RFC822Name(email) => Some(email.to_string()),
        _ => None,
    })
}

/// Attribute types with a fixed position, least specific first.
const CANONICAL_ORDER: &[(&str, &str)] = &[
    ("2.5.4.6", "C"),
    ("2.5.4.8", "ST"),
    ("2.5.4.7", "L"),
    ("2.5.4.9", "STREET"),
    ("2.5.4.17", "POSTALCODE"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.3", "CN"),
    ("2.5.4.5", "SERIALNUMBER"),
];

/// Canonical attributes that keep only their last encoded value.
const SINGLE_VALUED: &[&str] = &["2.5.4.3", "2.5.4.5"];

/// Short names for attributes outside the canonical set.
const EXTRA_SHORT_NAMES: &[(&str, &str)] = &[
    ("0.9.2342.19200300.100.1.1", "UID"),
    ("0.9.2342.19200300.100.1.25", "DC"),
];

/// Render a distinguished name as an RFC 4514 string.
///
/// The output is normalised rather than a mirror of the encoding, so the
/// same identity always yields the same string: `SERIALNUMBER`, `CN`,
/// `OU`, `O`, `POSTALCODE`, `STREET`, `L`, `ST`, `C`, then any other
/// attributes in reverse encoding order. Repeated attributes of one type
/// share an RDN joined with `+`; for `CN` and `SERIALNUMBER` the last one
/// encoded wins. Canonical attributes with non-string values are dropped.
pub(crate) fn format_dn(name: &X509Name<'_>) -> String {
    let mut rdns: Vec<String> = name
        .iter_attributes()
        .filter(|atv| canonical_key(&atv.attr_type().to_id_string()).is_none())
        .map(format_extra_attribute)
        .collect();

    for (oid, key) in CANONICAL_ORDER {
        let mut values: Vec<&str> = name
            .iter_attributes()
            .filter(|atv| atv.attr_type().to_id_string() == *oid)
            .filter_map(|atv| atv.as_str().ok())
            .collect();
        if SINGLE_VALUED.contains(oid) {
            values = values.pop().filter(|v| !v.is_empty()).into_iter().collect();
        }
        if values.is_empty() {
            continue;
        }
        rdns.push(
            values
                .iter()
                .map(|v| format!("{}={}", key, escape_value(v)))
                .collect::<Vec<_>>()
                .join("+"),
        );
    }

    rdns.into_iter().rev().collect::<Vec<_>>().join(",")
}

fn canonical_key(oid: &str) -> Option<&'static str> {
    CANONICAL_ORDER
        .iter()
        .find(|(known, _)| *known == oid)
        .map(|(_, key)| *key)
}

fn format_extra_attribute(atv: &AttributeTypeAndValue<'_>) -> String {
    let oid = atv.attr_type().to_id_string();
    let short = EXTRA_SHORT_NAMES
        .iter()
        .find(|(known, _)| *known == oid)
        .map(|(_, key)| *key);

    match (short, atv.as_str()) {
        (Some(key), Ok(value)) => format!("{}={}", key, escape_value(value)),
        _ => format!("{}=#{}", oid, hex::encode(attribute_value_der(atv))),
    }
}

/// Full DER encoding (tag, length, contents) of an attribute value.
fn attribute_value_der(atv: &AttributeTypeAndValue<'_>) -> Vec<u8> {
    let value = atv.attr_value();
    let header = &value.header;
    let mut identifier = (header.class() as u8) << 6;
    if header.is_constructed() {
        identifier |= 0x20;
    }

    let encoded = u8::try_from(header.tag().0)
        .ok()
        .filter(|number| *number < 0x1f)
        .and_then(|number| ::der::Tag::try_from(identifier | number).ok())
        .and_then(|tag| ::der::asn1::AnyRef::new(tag, value.data).ok())
        .and_then(|any| ::der::Encode::to_der(&any).ok());
    encoded.unwrap_or_else(|| value.data.to_vec())
}

/// RFC 4514, Section 2.4.
fn escape_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' => {
                out.push('\\');
                out.push(c);
            },
            '#' if i == 0 => out.push_str("\\#"),
            ' ' if i == 0 || i == last => out.push_str("\\ "),
            '\0' => out.push_str("\\00"),
            _ => out.push(c),
        }
    }
    out
}
