//! ASN.1 UTCTime / GeneralizedTime conversion
//!
//! Only the RFC 5280 profile is accepted: UTC (`Z` suffix), no fractional
//! seconds, `YYMMDDHHMMSSZ` or `YYYYMMDDHHMMSSZ`.

use chrono::{NaiveDate, TimeZone, Utc};

const SHORT_LEN: usize = 13;
const LONG_LEN: usize = 15;

fn parse_digits(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

/// Convert an ASN.1 time string to seconds since the epoch.
///
/// `long_format` selects GeneralizedTime (four digit year). Returns -1 for
/// any malformed input, including dates before 1970.
pub fn asn1_time_to_sec(bytes: &[u8], long_format: bool) -> i64 {
    let expected = if long_format { LONG_LEN } else { SHORT_LEN };
    if bytes.len() != expected {
        return -1;
    }

    let (digits, zone) = bytes.split_at(bytes.len() - 1);
    if zone != b"Z" || !digits.iter().all(u8::is_ascii_digit) {
        return -1;
    }

    let (year, rest) = if long_format {
        let year = parse_digits(&digits[..4]);
        (year as i32, &digits[4..])
    } else {
        let yy = parse_digits(&digits[..2]) as i32;
        (if yy < 50 { 2000 + yy } else { 1900 + yy }, &digits[2..])
    };

    if year < 1970 {
        return -1;
    }

    let month = parse_digits(&rest[0..2]);
    let day = parse_digits(&rest[2..4]);
    let hour = parse_digits(&rest[4..6]);
    let minute = parse_digits(&rest[6..8]);
    let second = parse_digits(&rest[8..10]);

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp())
        .unwrap_or(-1)
}
