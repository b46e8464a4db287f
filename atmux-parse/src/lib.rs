//! Allocation-free parsers for AT command responses
//!
//! This crate provides pure functions that extract typed values (integers,
//! floats, hexadecimal words, strings, quoted strings, IPv4 addresses,
//! binary payloads) from response lines of the AT command family.
//!
//! All parsers share a discipline:
//! * locate the caller-supplied prefix as a substring of the response,
//!   failing with [`ParseError::PrefixNotFound`] when absent;
//! * advance past the prefix and skip SP / HT;
//! * apply the parser-specific body. Structural failures map to
//!   [`ParseError::InvalidFormat`]; output-buffer overflow maps to
//!   [`ParseError::BufferTooSmall`] with the buffer holding whatever fit.
//!
//! The functions never allocate and write only into caller-provided buffers,
//! so they are safe to call from any context.
#![no_std]

mod num;
mod text;

pub use num::{is_cme_error, is_cms_error, parse_float, parse_hex, parse_int, parse_int_array};
pub use text::{
    parse_binary_data, parse_escaped_string, parse_ip_address, parse_quoted_string, parse_string,
};

/// Failure modes of the response parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// The requested prefix does not occur in the response
    PrefixNotFound,
    /// The bytes after the prefix do not match the expected shape
    InvalidFormat,
    /// The output buffer cannot hold the result; `written` bytes were copied
    BufferTooSmall { written: usize },
    /// A numeric value does not fit the target type
    Overflow,
    /// The value is structurally well-formed but semantically out of range.
    /// Reserved for callers that validate on top of the structural parsers.
    InvalidValue,
}

/// Returns true when `prefix` occurs anywhere in `response`.
///
/// Two empty strings match.
pub fn has_prefix(response: &str, prefix: &str) -> bool {
    response.contains(prefix)
}

/// Returns true when the response contains the literal `"ERROR"`.
///
/// The match is a substring test, so `"ERRORS"` also qualifies.
pub fn is_error(response: &str) -> bool {
    has_prefix(response, "ERROR")
}

/// Returns true when the response contains the literal `"OK"`.
///
/// The match is a substring test, so `"OKAY"` also qualifies.
pub fn is_ok(response: &str) -> bool {
    has_prefix(response, "OK")
}

/// Counts occurrences of `delimiter` in `s`. A NUL delimiter counts nothing.
pub fn count_delimiters(s: &str, delimiter: char) -> usize {
    if delimiter == '\0' {
        return 0;
    }
    s.chars().filter(|&c| c == delimiter).count()
}

/// The slice of `response` after the first occurrence of `prefix`.
pub(crate) fn after_prefix<'a>(response: &'a str, prefix: &str) -> Option<&'a str> {
    let at = response.find(prefix)?;
    Some(&response[at + prefix.len()..])
}

/// Skips leading SP and HT.
pub(crate) fn skip_ws(s: &str) -> &str {
    s.trim_start_matches(|c| c == ' ' || c == '\t')
}

/// Parses `[+-]?[0-9]+` at the start of `s`.
///
/// Returns the value, the number of bytes consumed and whether the magnitude
/// left the `i32` range (the value is 0 in that case).
pub(crate) fn scan_decimal(s: &str) -> Option<(i32, usize, bool)> {
    // Clamp point past every representable magnitude, so long digit runs
    // cannot overflow the accumulator itself.
    const CLAMP: i64 = i32::MAX as i64 + 2;

    let bytes = s.as_bytes();
    let mut idx = 0;
    let mut negative = false;
    match bytes.first() {
        Some(b'+') => idx = 1,
        Some(b'-') => {
            negative = true;
            idx = 1;
        }
        _ => {}
    }

    let digits_start = idx;
    let mut acc: i64 = 0;
    while let Some(&b) = bytes.get(idx) {
        if !b.is_ascii_digit() {
            break;
        }
        acc = (acc * 10 + i64::from(b - b'0')).min(CLAMP);
        idx += 1;
    }
    if idx == digits_start {
        return None;
    }

    let limit = if negative {
        -(i64::from(i32::MIN))
    } else {
        i64::from(i32::MAX)
    };
    if acc > limit {
        return Some((0, idx, true));
    }
    let value = if negative { -acc } else { acc } as i32;
    Some((value, idx, false))
}
