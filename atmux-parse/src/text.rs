//! String, address and payload extractors

use crate::{ParseError, after_prefix, skip_ws};

/// Extracts the text following `prefix`, up to (not including) CR, LF or the
/// end of the response.
///
/// An empty result fails with [`ParseError::InvalidFormat`].
pub fn parse_string<'a>(
    response: &str,
    prefix: &str,
    buf: &'a mut [u8],
) -> Result<&'a str, ParseError> {
    let rest = after_prefix(response, prefix).ok_or(ParseError::PrefixNotFound)?;
    let rest = skip_ws(rest);
    let end = rest.find(['\r', '\n']).unwrap_or(rest.len());
    if end == 0 {
        return Err(ParseError::InvalidFormat);
    }
    copy_span(&rest.as_bytes()[..end], buf)
}

/// Extracts the contents of a double-quoted string following `prefix`.
///
/// The quotes are not copied. A missing opening or closing quote fails with
/// [`ParseError::InvalidFormat`].
pub fn parse_quoted_string<'a>(
    response: &str,
    prefix: &str,
    buf: &'a mut [u8],
) -> Result<&'a str, ParseError> {
    let rest = after_prefix(response, prefix).ok_or(ParseError::PrefixNotFound)?;
    let rest = skip_ws(rest)
        .strip_prefix('"')
        .ok_or(ParseError::InvalidFormat)?;
    let end = rest.find('"').ok_or(ParseError::InvalidFormat)?;
    copy_span(&rest.as_bytes()[..end], buf)
}

/// Extracts a double-quoted string following `prefix`, decoding backslash
/// escapes.
///
/// `\n`, `\r`, `\t`, `\\` and `\"` decode to the obvious bytes; any other
/// escape copies the byte after the backslash verbatim. A missing closing
/// quote fails with [`ParseError::BufferTooSmall`] when the buffer filled up
/// before the response ended, with [`ParseError::InvalidFormat`] otherwise.
pub fn parse_escaped_string<'a>(
    response: &str,
    prefix: &str,
    buf: &'a mut [u8],
) -> Result<&'a str, ParseError> {
    let rest = after_prefix(response, prefix).ok_or(ParseError::PrefixNotFound)?;
    let rest = skip_ws(rest)
        .strip_prefix('"')
        .ok_or(ParseError::InvalidFormat)?;

    let bytes = rest.as_bytes();
    let mut i = 0;
    let mut written = 0;
    let mut overflowed = false;
    while let Some(&b) = bytes.get(i) {
        let decoded = match b {
            b'"' => {
                if overflowed {
                    return Err(ParseError::BufferTooSmall { written });
                }
                return as_str(&buf[..written]);
            }
            b'\\' => {
                i += 1;
                let Some(&escaped) = bytes.get(i) else {
                    break;
                };
                match escaped {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    other => other,
                }
            }
            other => other,
        };
        i += 1;
        if written < buf.len() {
            buf[written] = decoded;
            written += 1;
        } else {
            overflowed = true;
        }
    }

    if overflowed {
        Err(ParseError::BufferTooSmall { written })
    } else {
        Err(ParseError::InvalidFormat)
    }
}

/// Extracts a dotted-quad IPv4 address following `prefix`.
///
/// The address runs to the first CR, LF, SP or the end of the response and
/// must consist of exactly four octets of 1 to 3 digits, each at most 255.
pub fn parse_ip_address<'a>(
    response: &str,
    prefix: &str,
    buf: &'a mut [u8],
) -> Result<&'a str, ParseError> {
    let rest = after_prefix(response, prefix).ok_or(ParseError::PrefixNotFound)?;
    let rest = skip_ws(rest);
    let bytes = rest.as_bytes();

    let mut i = 0;
    let mut dots = 0;
    let mut digits = 0;
    let mut octet: u32 = 0;
    while let Some(&b) = bytes.get(i) {
        match b {
            b'\r' | b'\n' | b' ' => break,
            b'.' => {
                if digits == 0 {
                    return Err(ParseError::InvalidFormat);
                }
                dots += 1;
                digits = 0;
                octet = 0;
            }
            b'0'..=b'9' => {
                digits += 1;
                if digits > 3 {
                    return Err(ParseError::InvalidFormat);
                }
                octet = octet * 10 + u32::from(b - b'0');
                if octet > 255 {
                    return Err(ParseError::InvalidFormat);
                }
            }
            _ => return Err(ParseError::InvalidFormat),
        }
        i += 1;
    }
    if dots != 3 || digits == 0 {
        return Err(ParseError::InvalidFormat);
    }

    // Validation precedes the copy, so a short buffer leaves it untouched.
    if i > buf.len() {
        return Err(ParseError::BufferTooSmall { written: 0 });
    }
    buf[..i].copy_from_slice(&bytes[..i]);
    as_str(&buf[..i])
}

/// Extracts a binary payload following `prefix`.
///
/// When the payload starts with a decimal count, that many bytes are taken
/// after the count and one optional `,` or `:`; otherwise the whole remainder
/// of the response is the payload. At most `min(count, remaining, buf.len())`
/// bytes are copied; [`ParseError::BufferTooSmall`] is returned exactly when
/// the buffer was the limiter.
pub fn parse_binary_data<'a>(
    response: &str,
    prefix: &str,
    buf: &'a mut [u8],
) -> Result<&'a [u8], ParseError> {
    let rest = after_prefix(response, prefix).ok_or(ParseError::PrefixNotFound)?;
    let bytes = skip_ws(rest).as_bytes();

    let payload = if bytes.first().is_some_and(u8::is_ascii_digit) {
        let mut i = 0;
        let mut count: usize = 0;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            count = count
                .saturating_mul(10)
                .saturating_add(usize::from(bytes[i] - b'0'));
            i += 1;
        }
        if matches!(bytes.get(i).copied(), Some(b',' | b':')) {
            i += 1;
        }
        let remainder = &bytes[i..];
        &remainder[..count.min(remainder.len())]
    } else {
        bytes
    };

    if payload.len() > buf.len() {
        let written = buf.len();
        buf.copy_from_slice(&payload[..written]);
        return Err(ParseError::BufferTooSmall { written });
    }
    buf[..payload.len()].copy_from_slice(payload);
    Ok(&buf[..payload.len()])
}

/// Copies `span` into `buf`, truncating on overflow.
fn copy_span<'a>(span: &[u8], buf: &'a mut [u8]) -> Result<&'a str, ParseError> {
    if span.len() > buf.len() {
        let written = buf.len();
        buf.copy_from_slice(&span[..written]);
        return Err(ParseError::BufferTooSmall { written });
    }
    buf[..span.len()].copy_from_slice(span);
    as_str(&buf[..span.len()])
}

fn as_str(bytes: &[u8]) -> Result<&str, ParseError> {
    core::str::from_utf8(bytes).map_err(|_| ParseError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_basic() {
        let mut buf = [0u8; 100];
        assert_eq!(
            parse_string("Name: TestDevice", "Name: ", &mut buf),
            Ok("TestDevice")
        );
        assert_eq!(
            parse_string("Model: RC7120\r\n", "Model: ", &mut buf),
            Ok("RC7120")
        );
        assert_eq!(parse_string("Value: test", "Value: ", &mut buf), Ok("test"));
    }

    #[test]
    fn string_errors() {
        let mut buf = [0u8; 100];
        assert_eq!(
            parse_string("Empty: ", "Empty: ", &mut buf),
            Err(ParseError::InvalidFormat)
        );
        assert_eq!(
            parse_string("Name: \r\n", "Name: ", &mut buf),
            Err(ParseError::InvalidFormat)
        );
        assert_eq!(
            parse_string("Name: TestDevice", "Missing: ", &mut buf),
            Err(ParseError::PrefixNotFound)
        );
    }

    #[test]
    fn string_truncates_into_short_buffer() {
        let mut buf = [0u8; 5];
        assert_eq!(
            parse_string("Name: VeryLongDeviceName", "Name: ", &mut buf),
            Err(ParseError::BufferTooSmall { written: 5 })
        );
        assert_eq!(&buf, b"VeryL");
    }

    #[test]
    fn quoted_basic() {
        let mut buf = [0u8; 100];
        assert_eq!(
            parse_quoted_string("Operator: \"Verizon\"", "Operator: ", &mut buf),
            Ok("Verizon")
        );
        assert_eq!(
            parse_quoted_string("Name: \"Test Device\"", "Name: ", &mut buf),
            Ok("Test Device")
        );
        assert_eq!(parse_quoted_string("E: \"\"", "E: ", &mut buf), Ok(""));
    }

    #[test]
    fn quoted_errors() {
        let mut buf = [0u8; 100];
        assert_eq!(
            parse_quoted_string("Name: NoQuotes", "Name: ", &mut buf),
            Err(ParseError::InvalidFormat)
        );
        assert_eq!(
            parse_quoted_string("Name: \"Unclosed", "Name: ", &mut buf),
            Err(ParseError::InvalidFormat)
        );
    }

    #[test]
    fn escaped_decodes_sequences() {
        let mut buf = [0u8; 100];
        assert_eq!(
            parse_escaped_string("Text: \"Hello\\nWorld\"", "Text: ", &mut buf),
            Ok("Hello\nWorld")
        );
        assert_eq!(
            parse_escaped_string("Path: \"C:\\\\temp\\\\file.txt\"", "Path: ", &mut buf),
            Ok("C:\\temp\\file.txt")
        );
        assert_eq!(
            parse_escaped_string("Quote: \"He said \\\"Hello\\\"\"", "Quote: ", &mut buf),
            Ok("He said \"Hello\"")
        );
        // unknown escapes copy the following byte
        assert_eq!(
            parse_escaped_string("X: \"a\\qb\"", "X: ", &mut buf),
            Ok("aqb")
        );
    }

    #[test]
    fn escaped_errors() {
        let mut buf = [0u8; 100];
        assert_eq!(
            parse_escaped_string("Text: NoQuotes", "Text: ", &mut buf),
            Err(ParseError::InvalidFormat)
        );
        assert_eq!(
            parse_escaped_string("Text: \"Unclosed", "Text: ", &mut buf),
            Err(ParseError::InvalidFormat)
        );

        let mut small = [0u8; 4];
        assert_eq!(
            parse_escaped_string("Text: \"overflowing", "Text: ", &mut small),
            Err(ParseError::BufferTooSmall { written: 4 })
        );
        assert_eq!(&small, b"over");
    }

    #[test]
    fn ip_basic() {
        let mut buf = [0u8; 20];
        assert_eq!(
            parse_ip_address("IP: 192.168.1.1", "IP: ", &mut buf),
            Ok("192.168.1.1")
        );
        assert_eq!(
            parse_ip_address("IP: 192.168.1.1\r\n", "IP: ", &mut buf),
            Ok("192.168.1.1")
        );
        assert_eq!(
            parse_ip_address("Gateway: 10.0.0.1\r\n", "Gateway: ", &mut buf),
            Ok("10.0.0.1")
        );
    }

    #[test]
    fn ip_rejects_malformed() {
        let mut buf = [0u8; 20];
        for bad in [
            "IP: 1.2.3.999",
            "IP: 1.2.3",
            "IP: 1.2.3.4.5",
            "IP: 1..2.3",
            "IP: 1.2.3.",
            "IP: 1.2.3.a",
            "IP: 1000.2.3.4",
        ] {
            assert_eq!(
                parse_ip_address(bad, "IP: ", &mut buf),
                Err(ParseError::InvalidFormat),
                "{bad}"
            );
        }
    }

    #[test]
    fn ip_short_buffer_is_untouched() {
        let mut buf = [0xaau8; 4];
        assert_eq!(
            parse_ip_address("IP: 192.168.1.1", "IP: ", &mut buf),
            Err(ParseError::BufferTooSmall { written: 0 })
        );
        assert_eq!(buf, [0xaa; 4]);
    }

    #[test]
    fn binary_with_count() {
        let mut buf = [0u8; 100];
        assert_eq!(
            parse_binary_data("Data: 5,HELLO", "Data: ", &mut buf),
            Ok(&b"HELLO"[..])
        );
        // count larger than the remainder takes what is there
        assert_eq!(
            parse_binary_data("Data: 9,HI", "Data: ", &mut buf),
            Ok(&b"HI"[..])
        );
        // colon separator
        assert_eq!(
            parse_binary_data("Data: 2:ABCD", "Data: ", &mut buf),
            Ok(&b"AB"[..])
        );
    }

    #[test]
    fn binary_without_count_takes_remainder() {
        let mut buf = [0u8; 100];
        assert_eq!(
            parse_binary_data("Payload: TESTDATA", "Payload: ", &mut buf),
            Ok(&b"TESTDATA"[..])
        );
    }

    #[test]
    fn binary_short_buffer_keeps_what_fit() {
        let mut buf = [0u8; 3];
        assert_eq!(
            parse_binary_data("Data: VERYLONGDATA", "Data: ", &mut buf),
            Err(ParseError::BufferTooSmall { written: 3 })
        );
        assert_eq!(&buf, b"VER");
    }
}
