//! Numeric extractors

use crate::{ParseError, after_prefix, scan_decimal, skip_ws};

/// Extracts a signed decimal integer following `prefix`.
///
/// The first non-whitespace byte after the prefix must be a sign or a digit.
/// A value outside the `i32` range fails with [`ParseError::Overflow`]
/// rather than saturating.
pub fn parse_int(response: &str, prefix: &str) -> Result<i32, ParseError> {
    let rest = after_prefix(response, prefix).ok_or(ParseError::PrefixNotFound)?;
    let (value, _, overflow) = scan_decimal(skip_ws(rest)).ok_or(ParseError::InvalidFormat)?;
    if overflow {
        return Err(ParseError::Overflow);
    }
    Ok(value)
}

/// Extracts `delimiter`-separated signed integers following `prefix`.
///
/// Parsing stops at the first token that is not a number, at the first
/// missing delimiter, or when `out` is full; values parsed up to that point
/// are kept. Succeeds with the count if at least one value was parsed.
pub fn parse_int_array(
    response: &str,
    prefix: &str,
    delimiter: char,
    out: &mut [i32],
) -> Result<usize, ParseError> {
    let mut rest = after_prefix(response, prefix).ok_or(ParseError::PrefixNotFound)?;
    let mut count = 0;

    while count < out.len() {
        rest = skip_ws(rest);
        let Some((value, used, overflow)) = scan_decimal(rest) else {
            break;
        };
        if overflow {
            return Err(ParseError::Overflow);
        }
        out[count] = value;
        count += 1;

        rest = skip_ws(&rest[used..]);
        match rest.strip_prefix(delimiter) {
            Some(tail) => rest = tail,
            None => break,
        }
    }

    if count == 0 {
        return Err(ParseError::InvalidFormat);
    }
    Ok(count)
}

/// Extracts a decimal floating-point value following `prefix`.
pub fn parse_float(response: &str, prefix: &str) -> Result<f32, ParseError> {
    let rest = after_prefix(response, prefix).ok_or(ParseError::PrefixNotFound)?;
    let rest = skip_ws(rest);
    if !matches!(rest.as_bytes().first(), Some(b'+' | b'-' | b'.' | b'0'..=b'9')) {
        return Err(ParseError::InvalidFormat);
    }
    let span = &rest[..float_span(rest)];
    span.parse::<f32>().map_err(|_| ParseError::InvalidFormat)
}

/// Length of the longest decimal-float token at the start of `s`:
/// `[+-]? digits* ('.' digits*)? ([eE] [+-]? digits+)?`
fn float_span(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
    }
    if matches!(bytes.get(i).copied(), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                j += 1;
            }
            i = j;
        }
    }
    i
}

/// Extracts an unsigned 32-bit hexadecimal value following `prefix`.
///
/// An optional `0x` / `0X` marker is skipped; at least one hex digit is
/// required. More than 32 bits of digits fail with [`ParseError::Overflow`].
pub fn parse_hex(response: &str, prefix: &str) -> Result<u32, ParseError> {
    let rest = after_prefix(response, prefix).ok_or(ParseError::PrefixNotFound)?;
    let rest = skip_ws(rest);
    let rest = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .unwrap_or(rest);

    let bytes = rest.as_bytes();
    let mut idx = 0;
    let mut acc: u64 = 0;
    let mut overflow = false;
    while let Some(digit) = bytes.get(idx).copied().and_then(hex_val) {
        acc = (acc << 4) | u64::from(digit);
        if acc > u64::from(u32::MAX) {
            overflow = true;
            acc = u64::from(u32::MAX) + 1;
        }
        idx += 1;
    }

    if idx == 0 {
        return Err(ParseError::InvalidFormat);
    }
    if overflow {
        return Err(ParseError::Overflow);
    }
    Ok(acc as u32)
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Returns the mobile-equipment error code when the response carries a
/// `+CME ERROR: <n>` report.
pub fn is_cme_error(response: &str) -> Option<i32> {
    numeric_report(response, "+CME ERROR: ")
}

/// Returns the SMS-service error code when the response carries a
/// `+CMS ERROR: <n>` report.
pub fn is_cms_error(response: &str) -> Option<i32> {
    numeric_report(response, "+CMS ERROR: ")
}

fn numeric_report(response: &str, pattern: &str) -> Option<i32> {
    let rest = after_prefix(response, pattern)?;
    let (value, _, overflow) = scan_decimal(skip_ws(rest))?;
    if overflow {
        return None;
    }
    Some(value)
}
