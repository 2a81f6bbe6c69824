// SPDX-License-Identifier: Apache-2.0

use core::str::FromStr;

use crate::error_code::ErrorCode;

/// A decoded JSON number.
///
/// Integers are kept exact: anything that fits `i64` is `Int`, non-negative
/// values up to `u64::MAX` are `UInt`, and larger magnitudes are surfaced as
/// `BigInt` with the exact token text rather than rounded.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    /// Integer that fits in `i64`
    Int(i64),
    /// Non-negative integer above `i64::MAX`
    UInt(u64),
    /// Number with a fraction or exponent
    Float(f64),
    /// Integer too large for 64 bits (exact token text)
    BigInt(String),
}

impl Number {
    /// Decode a validated number token.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ErrorCode> {
        let text = core::str::from_utf8(bytes).map_err(|_| ErrorCode::NumberError)?;
        if is_integer(bytes) {
            Ok(parse_integer(text))
        } else {
            parse_float(text)
        }
    }

    /// The value as `i64` if it is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(val) => Some(*val),
            Number::UInt(val) => i64::try_from(*val).ok(),
            _ => None,
        }
    }

    /// The value as `u64` if it is a non-negative integer in range.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::Int(val) => u64::try_from(*val).ok(),
            Number::UInt(val) => Some(*val),
            _ => None,
        }
    }

    /// The value as `f64`. Big integers are not converted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Number::Int(val) => Some(*val as f64),
            Number::UInt(val) => Some(*val as f64),
            Number::Float(val) => Some(*val),
            Number::BigInt(_) => None,
        }
    }

    /// Check if this number has no fraction or exponent.
    pub fn is_integer(&self) -> bool {
        !matches!(self, Number::Float(_))
    }

    /// Returns true for numbers written with a fraction or exponent.
    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }
}

impl From<i64> for Number {
    fn from(val: i64) -> Self {
        Number::Int(val)
    }
}

impl From<f64> for Number {
    fn from(val: f64) -> Self {
        Number::Float(val)
    }
}

impl core::fmt::Display for Number {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Number::Int(val) => write!(f, "{val}"),
            Number::UInt(val) => write!(f, "{val}"),
            Number::Float(val) => write!(f, "{val}"),
            Number::BigInt(raw) => f.write_str(raw),
        }
    }
}

/// Detects if a number byte slice represents an integer (no decimal point or exponent).
pub fn is_integer(bytes: &[u8]) -> bool {
    !bytes.iter().any(|&b| b == b'.' || b == b'e' || b == b'E')
}

fn parse_integer(text: &str) -> Number {
    if let Ok(val) = i64::from_str(text) {
        return Number::Int(val);
    }
    match u64::from_str(text) {
        Ok(val) => Number::UInt(val),
        Err(_) => Number::BigInt(text.to_string()),
    }
}

fn parse_float(text: &str) -> Result<Number, ErrorCode> {
    match f64::from_str(text) {
        Ok(val) if val.is_finite() => Ok(Number::Float(val)),
        Ok(_) => Err(ErrorCode::NumberOutOfRange),
        Err(_) => Err(ErrorCode::NumberError),
    }
}

/// Scan a JSON number starting at `start`, returning the index just past it.
///
/// Grammar: `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
pub(crate) fn scan(bytes: &[u8], start: usize) -> Result<usize, ErrorCode> {
    let mut pos = start;
    if bytes.get(pos) == Some(&b'-') {
        pos += 1;
    }
    match bytes.get(pos) {
        Some(b'0') => pos += 1,
        Some(b'1'..=b'9') => pos = skip_digits(bytes, pos + 1),
        _ => return Err(ErrorCode::NumberError),
    }
    if bytes.get(pos) == Some(&b'.') {
        let digits = pos + 1;
        pos = skip_digits(bytes, digits);
        if pos == digits {
            return Err(ErrorCode::NumberError);
        }
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let digits = pos;
        pos = skip_digits(bytes, digits);
        if pos == digits {
            return Err(ErrorCode::NumberError);
        }
    }
    // A number must be followed by a structural character, whitespace or the end.
    match bytes.get(pos) {
        None | Some(b',' | b']' | b'}' | b' ' | b'\t' | b'\n' | b'\r') => Ok(pos),
        Some(_) => Err(ErrorCode::NumberError),
    }
}

fn skip_digits(bytes: &[u8], mut pos: usize) -> usize {
    while matches!(bytes.get(pos), Some(b'0'..=b'9')) {
        pos += 1;
    }
    pos
}
