// SPDX-License-Identifier: Apache-2.0

//! JSON Pointer (RFC 6901) resolution over the tape, including the URI
//! fragment form (`#/a%20b/0`).

use std::borrow::Cow;

use crate::cursor::{element_at, find_field_unordered, Position};
use crate::error_code::ErrorCode;
use crate::tape::NodeKind;
use crate::unescape::hex_digit;
use crate::value::Frame;

type CodeResult<T> = core::result::Result<T, ErrorCode>;

/// Resolve `pointer` against the value at tape index `start`, returning the
/// tape index of the target.
pub(crate) fn resolve(frame: Frame<'_>, start: usize, pointer: &str) -> CodeResult<usize> {
    let decoded;
    let pointer = match pointer.strip_prefix('#') {
        Some(fragment) => {
            decoded = percent_decode(fragment)?;
            &*decoded
        }
        None => pointer,
    };
    if pointer.is_empty() {
        return Ok(start);
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(ErrorCode::InvalidJsonPointer);
    };

    let mut current = start;
    for token in rest.split('/') {
        let token = unescape_token(token)?;
        current = step(frame, current, &token)?;
    }
    log::trace!("pointer: resolved {:?} to tape index {}", pointer, current);
    Ok(current)
}

fn step(frame: Frame<'_>, current: usize, token: &str) -> CodeResult<usize> {
    match frame.node(current)?.kind {
        NodeKind::Object => {
            let mut pos = Position::start(current);
            find_field_unordered(frame, current, &mut pos, token)
        }
        NodeKind::Array => {
            let index = array_index(token)?;
            let mut pos = Position::start(current);
            element_at(frame, current, &mut pos, index)
        }
        _ => Err(ErrorCode::IncorrectType),
    }
}

/// Parse an array reference token: decimal digits without leading zeros.
fn array_index(token: &str) -> CodeResult<usize> {
    if token == "-" {
        return Err(ErrorCode::IndexOutOfBounds);
    }
    if token.is_empty() {
        return Err(ErrorCode::InvalidJsonPointer);
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ErrorCode::IncorrectType);
    }
    if token.len() > 1 && token.starts_with('0') {
        return Err(ErrorCode::InvalidJsonPointer);
    }
    token.parse().map_err(|_| ErrorCode::IndexOutOfBounds)
}

/// Undo `~1` (`/`) and `~0` (`~`).
fn unescape_token(token: &str) -> CodeResult<Cow<'_, str>> {
    if !token.contains('~') {
        return Ok(Cow::Borrowed(token));
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(ErrorCode::InvalidJsonPointer),
        }
    }
    Ok(Cow::Owned(out))
}

fn percent_decode(fragment: &str) -> CodeResult<Cow<'_, str>> {
    if !fragment.contains('%') {
        return Ok(Cow::Borrowed(fragment));
    }
    let bytes = fragment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] != b'%' {
            out.push(bytes[pos]);
            pos += 1;
            continue;
        }
        let hex = bytes
            .get(pos + 1..pos + 3)
            .ok_or(ErrorCode::InvalidUriFragment)?;
        let high = hex_digit(hex[0]).map_err(|_| ErrorCode::InvalidUriFragment)?;
        let low = hex_digit(hex[1]).map_err(|_| ErrorCode::InvalidUriFragment)?;
        out.push(((high << 4) | low) as u8);
        pos += 3;
    }
    String::from_utf8(out)
        .map(Cow::Owned)
        .map_err(|_| ErrorCode::InvalidUriFragment)
}
