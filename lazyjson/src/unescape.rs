// SPDX-License-Identifier: Apache-2.0

//! Decoding of JSON string bodies.
//!
//! Bodies without a backslash are borrowed straight from the input; only
//! strings that actually contain escapes are copied.

use std::borrow::Cow;

use crate::error_code::ErrorCode;

/// Decode the body of a string token (the bytes between the quotes).
///
/// The body must already be valid UTF-8 with well-formed escape syntax; what
/// remains to check here are the code points named by `\u` escapes.
pub(crate) fn unescape(body: &[u8]) -> Result<Cow<'_, str>, ErrorCode> {
    let text = core::str::from_utf8(body).map_err(|_| ErrorCode::Utf8Error)?;
    let Some(first) = memchr::memchr(b'\\', body) else {
        return Ok(Cow::Borrowed(text));
    };

    let mut out = String::with_capacity(body.len());
    out.push_str(&text[..first]);
    let mut pos = first;
    let mut pending_high: Option<u32> = None;

    while pos < body.len() {
        let Some(offset) = memchr::memchr(b'\\', &body[pos..]) else {
            if pending_high.is_some() {
                return Err(ErrorCode::StringError);
            }
            out.push_str(&text[pos..]);
            break;
        };
        if offset > 0 {
            if pending_high.is_some() {
                return Err(ErrorCode::StringError);
            }
            out.push_str(&text[pos..pos + offset]);
            pos += offset;
        }
        let escape = *body.get(pos + 1).ok_or(ErrorCode::StringError)?;
        if escape == b'u' {
            let hex = body.get(pos + 2..pos + 6).ok_or(ErrorCode::StringError)?;
            let codepoint = parse_hex4(hex)?;
            pos += 6;
            match pending_high.take() {
                Some(high) => {
                    out.push(combine_surrogate_pair(high, codepoint)?);
                }
                None if is_high_surrogate(codepoint) => pending_high = Some(codepoint),
                None if is_low_surrogate(codepoint) => return Err(ErrorCode::StringError),
                None => out.push(char::from_u32(codepoint).ok_or(ErrorCode::StringError)?),
            }
        } else {
            if pending_high.is_some() {
                return Err(ErrorCode::StringError);
            }
            out.push(char::from(simple_escape(escape)?));
            pos += 2;
        }
    }

    if pending_high.is_some() {
        return Err(ErrorCode::StringError);
    }
    Ok(Cow::Owned(out))
}

/// Map the character after a backslash to the byte it stands for.
pub(crate) fn simple_escape(escape: u8) -> Result<u8, ErrorCode> {
    match escape {
        b'n' => Ok(b'\n'),
        b't' => Ok(b'\t'),
        b'r' => Ok(b'\r'),
        b'\\' => Ok(b'\\'),
        b'"' => Ok(b'"'),
        b'/' => Ok(b'/'),
        b'b' => Ok(0x08),
        b'f' => Ok(0x0C),
        _ => Err(ErrorCode::StringError),
    }
}

pub(crate) fn hex_digit(byte: u8) -> Result<u32, ErrorCode> {
    match byte {
        b'0'..=b'9' => Ok((byte - b'0') as u32),
        b'a'..=b'f' => Ok((byte - b'a' + 10) as u32),
        b'A'..=b'F' => Ok((byte - b'A' + 10) as u32),
        _ => Err(ErrorCode::StringError),
    }
}

fn parse_hex4(hex: &[u8]) -> Result<u32, ErrorCode> {
    hex.iter().try_fold(0u32, |acc, &b| -> Result<u32, ErrorCode> {
        Ok((acc << 4) | hex_digit(b)?)
    })
}

fn is_high_surrogate(codepoint: u32) -> bool {
    (0xD800..=0xDBFF).contains(&codepoint)
}

fn is_low_surrogate(codepoint: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&codepoint)
}

fn combine_surrogate_pair(high: u32, low: u32) -> Result<char, ErrorCode> {
    if !is_low_surrogate(low) {
        return Err(ErrorCode::StringError);
    }
    let codepoint = 0x10000 + ((high & 0x3FF) << 10) + (low & 0x3FF);
    char::from_u32(codepoint).ok_or(ErrorCode::StringError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bodies_are_borrowed() {
        match unescape(b"hello world").unwrap() {
            Cow::Borrowed(s) => assert_eq!(s, "hello world"),
            Cow::Owned(s) => panic!("Expected borrowed, got owned {:?}", s),
        }
    }

    #[test]
    fn simple_escapes() {
        assert_eq!(unescape(br#"a\nb\t\"c\"\\/\/"#).unwrap(), "a\nb\t\"c\"\\//");
        assert_eq!(unescape(br"\b\f\r").unwrap(), "\u{8}\u{c}\r");
    }

    #[test]
    fn unicode_escapes_and_surrogates() {
        assert_eq!(unescape(br"caf\u00e9").unwrap(), "caf\u{e9}");
        assert_eq!(unescape(br"\ud83d\ude00!").unwrap(), "\u{1f600}!");
        assert_eq!(unescape(br"x\u0041y").unwrap(), "xAy");
    }

    #[test]
    fn broken_surrogates_are_string_errors() {
        assert_eq!(unescape(br"\uD83D"), Err(ErrorCode::StringError));
        assert_eq!(unescape(br"\uD83Dx"), Err(ErrorCode::StringError));
        assert_eq!(unescape(br"\uDE00"), Err(ErrorCode::StringError));
        assert_eq!(unescape(br"\uD83DA"), Err(ErrorCode::StringError));
        assert_eq!(unescape(br"\u12G4"), Err(ErrorCode::StringError));
    }
}
