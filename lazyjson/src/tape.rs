// SPDX-License-Identifier: Apache-2.0

//! The validating tape builder behind [`crate::Parser`].
//!
//! One pass over the input checks UTF-8 and the JSON grammar and records every
//! value as a [`Node`] in document order. Containers store how many children
//! they hold and the tape index just past their subtree, so a cursor can hop
//! over a whole subtree without looking at it.

use crate::error_code::ErrorCode;
use crate::number;
use crate::unescape::{hex_digit, simple_escape};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Null,
    True,
    False,
    Number,
    String,
    Array,
    Object,
}

/// One tape entry.
///
/// For strings `start..end` is the body between the quotes; for every other
/// kind it is the whole token, brackets included.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub start: u32,
    pub end: u32,
    /// Tape index of the node following this subtree
    pub next: u32,
    /// Elements (arrays) or fields (objects); zero for scalars
    pub count: u32,
}

impl Node {
    pub fn raw<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.start as usize..self.end as usize]
    }
}

/// Reusable scratch storage: the node tape plus the open-container stack.
#[derive(Debug)]
pub(crate) struct Tape {
    nodes: Vec<Node>,
    stack: Vec<usize>,
    capacity: usize,
    max_depth: usize,
}

impl Tape {
    /// Reserve room for documents of up to `capacity` bytes.
    pub fn with_capacity(capacity: usize, max_depth: usize) -> Self {
        let mut tape = Self {
            nodes: Vec::new(),
            stack: Vec::new(),
            capacity: 0,
            max_depth,
        };
        tape.reserve(capacity, max_depth);
        tape
    }

    /// Grow the scratch to fit `capacity` bytes and `max_depth` nesting. Never shrinks.
    pub fn reserve(&mut self, capacity: usize, max_depth: usize) {
        // Every node but the root costs at least two input bytes.
        let nodes = nodes_for(capacity);
        if nodes > self.nodes.capacity() {
            self.nodes.reserve_exact(nodes - self.nodes.len());
        }
        // Nesting can never run deeper than the node count.
        let depth = max_depth.min(nodes);
        if depth > self.stack.capacity() {
            self.stack.reserve_exact(depth - self.stack.len());
        }
        self.capacity = self.capacity.max(capacity);
        self.max_depth = max_depth;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Validate `bytes` and rebuild the tape from it.
    pub fn build(&mut self, bytes: &[u8]) -> Result<(), ErrorCode> {
        self.nodes.clear();
        self.stack.clear();
        if u32::try_from(bytes.len()).is_err() {
            return Err(ErrorCode::Capacity);
        }
        core::str::from_utf8(bytes).map_err(|_| ErrorCode::Utf8Error)?;

        let start = skip_whitespace(bytes, 0);
        if start == bytes.len() {
            return Err(ErrorCode::Empty);
        }
        let (mut pos, mut opened) = self.value(bytes, start)?;

        while let Some(&open) = self.stack.last() {
            let (is_object, close) = match self.nodes[open].kind {
                NodeKind::Object => (true, b'}'),
                _ => (false, b']'),
            };
            pos = skip_whitespace(bytes, pos);
            let byte = *bytes.get(pos).ok_or(ErrorCode::IncompleteArrayOrObject)?;

            if byte == close {
                self.exit(open, pos);
                pos += 1;
                opened = false;
                continue;
            }
            if !opened {
                if byte != b',' {
                    return Err(ErrorCode::TapeError);
                }
                pos += 1;
            }
            if is_object {
                pos = self.key(bytes, pos)?;
            }
            self.nodes[open].count += 1;
            (pos, opened) = self.value(bytes, pos)?;
        }

        if skip_whitespace(bytes, pos) != bytes.len() {
            return Err(ErrorCode::TrailingContent);
        }
        log::trace!(
            "tape: built {} nodes from {} bytes",
            self.nodes.len(),
            bytes.len()
        );
        Ok(())
    }

    /// Record the value at `pos`. Returns the position after it and whether it
    /// opened a container.
    fn value(&mut self, bytes: &[u8], pos: usize) -> Result<(usize, bool), ErrorCode> {
        let pos = skip_whitespace(bytes, pos);
        let byte = *bytes.get(pos).ok_or(ErrorCode::IncompleteArrayOrObject)?;
        match byte {
            b'{' => self.enter(NodeKind::Object, pos).map(|_| (pos + 1, true)),
            b'[' => self.enter(NodeKind::Array, pos).map(|_| (pos + 1, true)),
            b'"' => {
                let end = scan_string(bytes, pos + 1)?;
                self.push_scalar(NodeKind::String, pos + 1, end);
                Ok((end + 1, false))
            }
            b't' => self.atom(bytes, pos, b"true", NodeKind::True, ErrorCode::TAtomError),
            b'f' => self.atom(bytes, pos, b"false", NodeKind::False, ErrorCode::FAtomError),
            b'n' => self.atom(bytes, pos, b"null", NodeKind::Null, ErrorCode::NAtomError),
            b'-' | b'0'..=b'9' => {
                let end = number::scan(bytes, pos)?;
                self.push_scalar(NodeKind::Number, pos, end);
                Ok((end, false))
            }
            _ => Err(ErrorCode::TapeError),
        }
    }

    /// Record an object key and consume the colon after it.
    fn key(&mut self, bytes: &[u8], pos: usize) -> Result<usize, ErrorCode> {
        let pos = skip_whitespace(bytes, pos);
        match bytes.get(pos) {
            Some(b'"') => {}
            None => return Err(ErrorCode::IncompleteArrayOrObject),
            Some(_) => return Err(ErrorCode::TapeError),
        }
        let end = scan_string(bytes, pos + 1)?;
        self.push_scalar(NodeKind::String, pos + 1, end);
        let colon = skip_whitespace(bytes, end + 1);
        match bytes.get(colon) {
            Some(b':') => Ok(colon + 1),
            None => Err(ErrorCode::IncompleteArrayOrObject),
            Some(_) => Err(ErrorCode::TapeError),
        }
    }

    fn atom(
        &mut self,
        bytes: &[u8],
        pos: usize,
        literal: &[u8],
        kind: NodeKind,
        err: ErrorCode,
    ) -> Result<(usize, bool), ErrorCode> {
        let end = pos + literal.len();
        if bytes.get(pos..end) != Some(literal) || !is_delimiter(bytes.get(end)) {
            return Err(err);
        }
        self.push_scalar(kind, pos, end);
        Ok((end, false))
    }

    fn enter(&mut self, kind: NodeKind, pos: usize) -> Result<(), ErrorCode> {
        if self.stack.len() >= self.max_depth {
            return Err(ErrorCode::DepthError);
        }
        self.stack.push(self.nodes.len());
        self.nodes.push(Node {
            kind,
            start: pos as u32,
            end: 0,
            next: 0,
            count: 0,
        });
        Ok(())
    }

    fn exit(&mut self, open: usize, pos: usize) {
        let next = self.nodes.len() as u32;
        let node = &mut self.nodes[open];
        node.end = (pos + 1) as u32;
        node.next = next;
        self.stack.pop();
    }

    fn push_scalar(&mut self, kind: NodeKind, start: usize, end: usize) {
        let next = (self.nodes.len() + 1) as u32;
        self.nodes.push(Node {
            kind,
            start: start as u32,
            end: end as u32,
            next,
            count: 0,
        });
    }
}

fn nodes_for(capacity: usize) -> usize {
    capacity / 2 + 2
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while matches!(bytes.get(pos), Some(b' ' | b'\t' | b'\n' | b'\r')) {
        pos += 1;
    }
    pos
}

fn is_delimiter(byte: Option<&u8>) -> bool {
    matches!(
        byte,
        None | Some(b',' | b']' | b'}' | b' ' | b'\t' | b'\n' | b'\r')
    )
}

/// Scan a string body starting just after the opening quote. Returns the
/// index of the closing quote.
fn scan_string(bytes: &[u8], start: usize) -> Result<usize, ErrorCode> {
    let mut pos = start;
    loop {
        let rest = &bytes[pos..];
        let Some(offset) = memchr::memchr2(b'"', b'\\', rest) else {
            return Err(ErrorCode::UnclosedString);
        };
        if rest[..offset].iter().any(|&b| b < 0x20) {
            return Err(ErrorCode::UnescapedChars);
        }
        let found = pos + offset;
        if bytes[found] == b'"' {
            return Ok(found);
        }
        match bytes.get(found + 1) {
            None => return Err(ErrorCode::UnclosedString),
            Some(b'u') => {
                let hex = bytes
                    .get(found + 2..found + 6)
                    .ok_or(ErrorCode::UnclosedString)?;
                for &digit in hex {
                    hex_digit(digit)?;
                }
                pos = found + 6;
            }
            Some(&escape) => {
                simple_escape(escape)?;
                pos = found + 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn build(json: &str) -> Result<Vec<Node>, ErrorCode> {
        let mut tape = Tape::with_capacity(json.len(), 16);
        tape.build(json.as_bytes())?;
        Ok(tape.nodes().to_vec())
    }

    #[test]
    fn scalar_documents() {
        let nodes = build(" 42 ").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, NodeKind::Number);
        assert_eq!(nodes[0].raw(b" 42 "), b"42");

        let nodes = build(r#""hi""#).unwrap();
        assert_eq!(nodes[0].kind, NodeKind::String);
        assert_eq!(nodes[0].raw(br#""hi""#), b"hi");

        assert_eq!(build("null").unwrap()[0].kind, NodeKind::Null);
        assert_eq!(build("true").unwrap()[0].kind, NodeKind::True);
        assert_eq!(build("false").unwrap()[0].kind, NodeKind::False);
    }

    #[test]
    fn containers_record_count_and_skip() {
        let json = r#"{"a": [1, [2, 3]], "b": {}, "c": null}"#;
        let nodes = build(json).unwrap();
        let kinds: Vec<NodeKind> = nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Object,
                NodeKind::String,
                NodeKind::Array,
                NodeKind::Number,
                NodeKind::Array,
                NodeKind::Number,
                NodeKind::Number,
                NodeKind::String,
                NodeKind::Object,
                NodeKind::String,
                NodeKind::Null,
            ]
        );
        assert_eq!(nodes[0].count, 3);
        assert_eq!(nodes[0].next, 11);
        assert_eq!(nodes[2].count, 2);
        assert_eq!(nodes[2].next, 7);
        assert_eq!(nodes[4].next, 7);
        assert_eq!(nodes[8].count, 0);
        assert_eq!(nodes[8].next, 9);
        assert_eq!(nodes[0].raw(json.as_bytes()), json.as_bytes());
    }

    #[test]
    fn structural_errors() {
        assert_eq!(build("").err(), Some(ErrorCode::Empty));
        assert_eq!(build("  \n ").err(), Some(ErrorCode::Empty));
        assert_eq!(build("[1,]").err(), Some(ErrorCode::TapeError));
        assert_eq!(build("[,1]").err(), Some(ErrorCode::TapeError));
        assert_eq!(build("[1 2]").err(), Some(ErrorCode::TapeError));
        assert_eq!(build(r#"{"a" 1}"#).err(), Some(ErrorCode::TapeError));
        assert_eq!(build(r#"{1: 2}"#).err(), Some(ErrorCode::TapeError));
        assert_eq!(build("[1}").err(), Some(ErrorCode::TapeError));
        assert_eq!(build("[1, 2").err(), Some(ErrorCode::IncompleteArrayOrObject));
        assert_eq!(build(r#"{"a":"#).err(), Some(ErrorCode::IncompleteArrayOrObject));
        assert_eq!(build("[] []").err(), Some(ErrorCode::TrailingContent));
        assert_eq!(build("1 x").err(), Some(ErrorCode::TrailingContent));
    }

    #[test]
    fn atom_and_number_errors() {
        assert_eq!(build("tru").err(), Some(ErrorCode::TAtomError));
        assert_eq!(build("[falsey]").err(), Some(ErrorCode::FAtomError));
        assert_eq!(build("nul").err(), Some(ErrorCode::NAtomError));
        assert_eq!(build("[01]").err(), Some(ErrorCode::NumberError));
        assert_eq!(build("-").err(), Some(ErrorCode::NumberError));
    }

    #[test]
    fn string_errors() {
        assert_eq!(build(r#""abc"#).err(), Some(ErrorCode::UnclosedString));
        assert_eq!(build("\"a\u{1}b\"").err(), Some(ErrorCode::UnescapedChars));
        assert_eq!(build(r#""\x""#).err(), Some(ErrorCode::StringError));
        assert_eq!(build(r#""\u12xy""#).err(), Some(ErrorCode::StringError));
        assert_eq!(build(r#""\u12""#).err(), Some(ErrorCode::UnclosedString));
        assert!(build(r#""a\"b\\""#).is_ok());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut tape = Tape::with_capacity(16, 4);
        assert_eq!(tape.build(b"[\"\xff\"]"), Err(ErrorCode::Utf8Error));
    }

    #[test]
    fn depth_limit() {
        let mut tape = Tape::with_capacity(64, 2);
        assert!(tape.build(b"[[1]]").is_ok());
        assert_eq!(tape.build(b"[[[1]]]"), Err(ErrorCode::DepthError));
        assert_eq!(tape.build(br#"{"a":{"b":{}}}"#), Err(ErrorCode::DepthError));
    }

    #[test]
    fn reserve_only_grows() {
        let mut tape = Tape::with_capacity(1024, 8);
        let reserved = tape.nodes.capacity();
        tape.reserve(16, 8);
        assert_eq!(tape.capacity(), 1024);
        assert!(tape.nodes.capacity() >= reserved);
        tape.reserve(4096, 32);
        assert_eq!(tape.capacity(), 4096);
        assert_eq!(tape.max_depth(), 32);
        assert!(tape.nodes.capacity() >= nodes_for(4096));
    }
}
