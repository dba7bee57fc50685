//! Expiry Header Module
//!
//! Fixed 14-byte ASCII envelope prepended to payloads that carry a TTL:
//!
//! ```text
//! _$ DDDDDDDDDD $_ <payload>
//! ```
//!
//! where the ten digits are the zero-padded absolute expiry in Unix seconds.
//! Presence is detected structurally, so payloads written without a TTL are
//! stored raw and read back unchanged.

use crate::ttl::Ttl;

/// Total header length in bytes
pub const HEADER_LEN: usize = 14;

const DIGITS_START: usize = 2;
const DIGITS_END: usize = 12;

/// Largest expiry that fits in ten digits
const MAX_EXPIRY_SECS: u64 = 9_999_999_999;

// == Encode ==
/// Prepends the expiry header for a write at `now_ms`.
///
/// `Ttl::Forever` returns the payload unchanged.
pub fn encode(ttl: Ttl, payload: &[u8], now_ms: u64) -> Vec<u8> {
    let Ttl::Seconds(secs) = ttl else {
        return payload.to_vec();
    };
    let expiry = (now_ms / 1000).saturating_add(secs).min(MAX_EXPIRY_SECS);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(format!("_${:010}$_", expiry).as_bytes());
    out.extend_from_slice(payload);
    out
}

// == Fingerprint ==
/// True when `bytes` starts with a structurally valid header.
pub fn has_header(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN
        && bytes[0] == b'_'
        && bytes[1] == b'$'
        && bytes[12] == b'$'
        && bytes[13] == b'_'
}

// == Due Time ==
/// Absolute expiry in Unix milliseconds.
///
/// `None` when there is no header or the digit field does not parse.
pub fn due_time_ms(bytes: &[u8]) -> Option<u64> {
    if !has_header(bytes) {
        return None;
    }
    let digits = &bytes[DIGITS_START..DIGITS_END];
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let secs: u64 = std::str::from_utf8(digits).ok()?.parse().ok()?;
    Some(secs * 1000)
}

// == Is Due ==
/// True when the header's expiry lies strictly before `now_ms`.
///
/// A corrupt digit field reads as not due.
pub fn is_due(bytes: &[u8], now_ms: u64) -> bool {
    due_time_ms(bytes).is_some_and(|due| now_ms > due)
}

// == Strip ==
/// Returns the payload without its header, or `bytes` unchanged if there is none.
pub fn strip(bytes: &[u8]) -> &[u8] {
    if has_header(bytes) {
        &bytes[HEADER_LEN..]
    } else {
        bytes
    }
}
