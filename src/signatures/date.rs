//! PDF date literal parsing.
//!
//! PDF dates look like `D:YYYYMMDDHHmmSSOHH'mm'` (ISO 32000-1:2008,
//! Section 7.9.4). Producers are inconsistent about which trailing parts
//! they emit, so a handful of layouts are tried in order.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Layouts tried in order after the `D:` prefix and trailing apostrophes
/// have been removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateLayout {
    /// `20240315143000+05'30`
    QuotedOffset,
    /// `20240315143000-0700`
    Offset,
    /// `20240315143000Z`
    Utc,
    /// `20240315143000`, read as UTC
    Bare,
    /// `20240315`, midnight UTC
    DateOnly,
}

const LAYOUTS: [DateLayout; 5] = [
    DateLayout::QuotedOffset,
    DateLayout::Offset,
    DateLayout::Utc,
    DateLayout::Bare,
    DateLayout::DateOnly,
];

impl DateLayout {
    fn parse(self, s: &str) -> Option<DateTime<FixedOffset>> {
        match self {
            DateLayout::QuotedOffset => {
                if !s.contains('\'') {
                    return None;
                }
                let joined: String = s.chars().filter(|&c| c != '\'').collect();
                DateTime::parse_from_str(&joined, "%Y%m%d%H%M%S%z").ok()
            },
            DateLayout::Offset => DateTime::parse_from_str(s, "%Y%m%d%H%M%S%z").ok(),
            DateLayout::Utc => NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%SZ")
                .ok()
                .and_then(as_utc),
            DateLayout::Bare => NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S")
                .ok()
                .and_then(as_utc),
            DateLayout::DateOnly => NaiveDate::parse_from_str(s, "%Y%m%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .and_then(as_utc),
        }
    }
}

fn as_utc(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    let utc = FixedOffset::east_opt(0)?;
    Some(DateTime::from_naive_utc_and_offset(naive, utc))
}

/// Parse a PDF date literal.
///
/// Never fails: an absent or unrecognised date yields `None`, and the
/// signature it belongs to is still verified.
///
/// ```
/// use pdf_sigverify::signatures::parse_pdf_date;
///
/// let t = parse_pdf_date("D:20240315143000Z").unwrap();
/// assert_eq!(t.to_rfc3339(), "2024-03-15T14:30:00+00:00");
/// assert!(parse_pdf_date("yesterday").is_none());
/// ```
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);
    let s = s.trim_end_matches('\'');
    if s.is_empty() {
        return None;
    }

    LAYOUTS.iter().find_map(|layout| layout.parse(s))
}
