// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;

use crate::cursor::{Array, Object};
use crate::error::Result;
use crate::error_code::ErrorCode;
use crate::number::Number;
use crate::tape::{Node, NodeKind};
use crate::unescape::unescape;

/// The six JSON value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    Array,
    Object,
    Number,
    String,
    Boolean,
    Null,
}

impl JsonType {
    pub const fn as_str(self) -> &'static str {
        match self {
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
        }
    }
}

impl core::fmt::Display for JsonType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<NodeKind> for JsonType {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Null => JsonType::Null,
            NodeKind::True | NodeKind::False => JsonType::Boolean,
            NodeKind::Number => JsonType::Number,
            NodeKind::String => JsonType::String,
            NodeKind::Array => JsonType::Array,
            NodeKind::Object => JsonType::Object,
        }
    }
}

/// A parsed tape together with the input bytes it points into.
#[derive(Clone, Copy)]
pub(crate) struct Frame<'d> {
    nodes: &'d [Node],
    bytes: &'d [u8],
}

impl<'d> Frame<'d> {
    pub fn new(nodes: &'d [Node], bytes: &'d [u8]) -> Self {
        Self { nodes, bytes }
    }

    pub fn node(&self, index: usize) -> core::result::Result<&'d Node, ErrorCode> {
        self.nodes.get(index).ok_or(ErrorCode::UnexpectedError)
    }

    pub fn bytes(&self) -> &'d [u8] {
        self.bytes
    }

    pub fn json_type(&self, index: usize) -> core::result::Result<JsonType, ErrorCode> {
        Ok(self.node(index)?.kind.into())
    }

    /// Decoded body of the string node at `index`.
    pub fn string(&self, index: usize) -> core::result::Result<Cow<'d, str>, ErrorCode> {
        let node = self.node(index)?;
        if node.kind != NodeKind::String {
            return Err(ErrorCode::IncorrectType);
        }
        unescape(node.raw(self.bytes))
    }

    /// Materialise the node at `index`: scalars are decoded, containers become cursors.
    pub fn value(&self, index: usize) -> core::result::Result<Value<'d>, ErrorCode> {
        let node = self.node(index)?;
        Ok(match node.kind {
            NodeKind::Null => Value::Null,
            NodeKind::True => Value::Bool(true),
            NodeKind::False => Value::Bool(false),
            NodeKind::Number => Value::Number(Number::from_slice(node.raw(self.bytes))?),
            NodeKind::String => Value::String(unescape(node.raw(self.bytes))?),
            NodeKind::Array => Value::Array(Array::new(*self, index)),
            NodeKind::Object => Value::Object(Object::new(*self, index)),
        })
    }
}

/// A lazily materialised JSON value borrowed from a document.
///
/// Scalars are decoded when the value is produced. Arrays and objects are
/// nested forward-only cursors over their subtree; nothing below them is
/// decoded until it is visited.
#[derive(Debug, Clone)]
pub enum Value<'d> {
    Null,
    Bool(bool),
    Number(Number),
    String(Cow<'d, str>),
    Array(Array<'d>),
    Object(Object<'d>),
}

impl<'d> Value<'d> {
    pub fn json_type(&self) -> JsonType {
        match self {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().and_then(Number::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Array<'d>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Object<'d>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Decode this value and everything below it into an owned tree.
    ///
    /// Containers are walked from their first child regardless of how far
    /// this value's own cursor has advanced. The walk keeps its open
    /// containers on the heap, so any depth the parser accepted can be
    /// materialised.
    pub fn to_owned_value(&self) -> Result<OwnedValue> {
        let (frame, index) = match self {
            Value::Array(array) => array.location(),
            Value::Object(object) => object.location(),
            scalar => return Ok(scalar.owned_scalar().unwrap_or(OwnedValue::Null)),
        };
        Ok(materialise(frame, index)?)
    }

    /// Owned copy of a scalar; `None` for containers.
    fn owned_scalar(&self) -> Option<OwnedValue> {
        Some(match self {
            Value::Null => OwnedValue::Null,
            Value::Bool(b) => OwnedValue::Bool(*b),
            Value::Number(n) => OwnedValue::Number(n.clone()),
            Value::String(s) => OwnedValue::String(s.to_string()),
            Value::Array(_) | Value::Object(_) => return None,
        })
    }
}

/// A container being rebuilt by [`materialise`].
struct Open {
    partial: Partial,
    /// Tape index of the next child (the key, for objects).
    next: usize,
    remaining: usize,
}

enum Partial {
    Array(Vec<OwnedValue>),
    /// Fields so far and the key of the value being built.
    Object(Vec<(String, OwnedValue)>, String),
}

impl Open {
    fn new(node: &Node, index: usize) -> Self {
        let count = node.count as usize;
        let partial = match node.kind {
            NodeKind::Object => Partial::Object(Vec::with_capacity(count), String::new()),
            _ => Partial::Array(Vec::with_capacity(count)),
        };
        Self {
            partial,
            next: index + 1,
            remaining: count,
        }
    }

    fn push(&mut self, value: OwnedValue) {
        match &mut self.partial {
            Partial::Array(items) => items.push(value),
            Partial::Object(fields, key) => fields.push((core::mem::take(key), value)),
        }
    }

    fn finish(self) -> OwnedValue {
        match self.partial {
            Partial::Array(items) => OwnedValue::Array(items),
            Partial::Object(fields, _) => OwnedValue::Object(fields),
        }
    }
}

/// Build the owned tree rooted at the container node `root`.
fn materialise(frame: Frame<'_>, root: usize) -> core::result::Result<OwnedValue, ErrorCode> {
    let mut open: Vec<Open> = Vec::new();
    let mut current = root;
    loop {
        let mut done = frame.value(current)?.owned_scalar();
        if done.is_none() {
            open.push(Open::new(frame.node(current)?, current));
        }
        // Hand finished values to their parents until one has a child left to visit.
        loop {
            let Some(top) = open.last_mut() else {
                return done.ok_or(ErrorCode::UnexpectedError);
            };
            if let Some(value) = done.take() {
                top.push(value);
            }
            if top.remaining == 0 {
                done = open.pop().map(Open::finish);
                continue;
            }
            top.remaining -= 1;
            current = match &mut top.partial {
                Partial::Object(_, key) => {
                    *key = frame.string(top.next)?.into_owned();
                    top.next + 1
                }
                Partial::Array(_) => top.next,
            };
            top.next = frame.node(current)?.next as usize;
            break;
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value<'_> {
    fn from(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }
}

impl From<f64> for Value<'_> {
    fn from(n: f64) -> Self {
        Value::Number(Number::Float(n))
    }
}

impl<'d> From<&'d str> for Value<'d> {
    fn from(s: &'d str) -> Self {
        Value::String(Cow::Borrowed(s))
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::String(Cow::Owned(s))
    }
}

/// A fully decoded JSON value that no longer borrows from a document.
///
/// Object fields keep document order and duplicates.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<OwnedValue>),
    Object(Vec<(String, OwnedValue)>),
}

// Nested values are released from a heap worklist so deep trees cannot
// exhaust the stack.
impl Drop for OwnedValue {
    fn drop(&mut self) {
        let mut pending = match self {
            OwnedValue::Array(items) if !items.is_empty() => core::mem::take(items),
            OwnedValue::Object(fields) if !fields.is_empty() => {
                fields.drain(..).map(|(_, value)| value).collect()
            }
            _ => return,
        };
        while let Some(mut value) = pending.pop() {
            match &mut value {
                OwnedValue::Array(items) => pending.append(items),
                OwnedValue::Object(fields) => pending.extend(fields.drain(..).map(|(_, value)| value)),
                _ => {}
            }
        }
    }
}

impl OwnedValue {
    pub fn json_type(&self) -> JsonType {
        match self {
            OwnedValue::Null => JsonType::Null,
            OwnedValue::Bool(_) => JsonType::Boolean,
            OwnedValue::Number(_) => JsonType::Number,
            OwnedValue::String(_) => JsonType::String,
            OwnedValue::Array(_) => JsonType::Array,
            OwnedValue::Object(_) => JsonType::Object,
        }
    }

    /// First field named `key`, for objects.
    pub fn get(&self, key: &str) -> Option<&OwnedValue> {
        match self {
            OwnedValue::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OwnedValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OwnedValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

impl From<&str> for OwnedValue {
    fn from(s: &str) -> Self {
        OwnedValue::String(s.to_string())
    }
}

impl From<i64> for OwnedValue {
    fn from(n: i64) -> Self {
        OwnedValue::Number(Number::Int(n))
    }
}

impl From<bool> for OwnedValue {
    fn from(b: bool) -> Self {
        OwnedValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::Tape;

    fn with_frame<R>(json: &str, f: impl FnOnce(Frame<'_>) -> R) -> R {
        let mut tape = Tape::with_capacity(json.len(), 32);
        tape.build(json.as_bytes()).unwrap();
        f(Frame::new(tape.nodes(), json.as_bytes()))
    }

    #[test]
    fn scalars_decode_immediately() {
        with_frame(r#"[null, true, false, -3, 2.5, "aBc"]"#, |frame| {
            assert!(frame.value(1).unwrap().is_null());
            assert_eq!(frame.value(2).unwrap().as_bool(), Some(true));
            assert_eq!(frame.value(3).unwrap().as_bool(), Some(false));
            assert_eq!(frame.value(4).unwrap().as_i64(), Some(-3));
            assert_eq!(frame.value(5).unwrap().as_f64(), Some(2.5));
            assert_eq!(frame.value(6).unwrap().as_str(), Some("aBc"));
        });
    }

    #[test]
    fn decode_failures_surface_codes() {
        with_frame(r#"[1e999, "\ud800"]"#, |frame| {
            assert_eq!(frame.value(1).err(), Some(ErrorCode::NumberOutOfRange));
            assert_eq!(frame.value(2).err(), Some(ErrorCode::StringError));
        });
    }

    #[test]
    fn containers_materialise_into_owned_trees() {
        with_frame(r#"{"a": [1, {"b": null}], "c": "d", "a": true}"#, |frame| {
            let owned = frame.value(0).unwrap().to_owned_value().unwrap();
            assert_eq!(
                owned,
                OwnedValue::Object(vec![
                    (
                        "a".into(),
                        OwnedValue::Array(vec![
                            1i64.into(),
                            OwnedValue::Object(vec![("b".into(), OwnedValue::Null)]),
                        ])
                    ),
                    ("c".into(), "d".into()),
                    ("a".into(), true.into()),
                ])
            );
            assert_eq!(owned.get("c").and_then(OwnedValue::as_str), Some("d"));
            assert_eq!(owned.json_type(), JsonType::Object);
        });
    }

    #[test]
    fn deep_nesting_materialises() {
        let levels = 20_000;
        let json = format!("{}0{}", r#"[{"k":"#.repeat(levels), "}]".repeat(levels));
        let mut tape = Tape::with_capacity(json.len(), 2 * levels);
        tape.build(json.as_bytes()).unwrap();
        let frame = Frame::new(tape.nodes(), json.as_bytes());
        let owned = frame.value(0).unwrap().to_owned_value().unwrap();

        let mut depth = 0;
        let mut current = &owned;
        loop {
            current = match current {
                OwnedValue::Array(items) => &items[0],
                OwnedValue::Object(fields) => {
                    assert_eq!(fields[0].0, "k");
                    &fields[0].1
                }
                _ => break,
            };
            depth += 1;
        }
        assert_eq!(depth, 2 * levels);
        assert_eq!(current.as_i64(), Some(0));
        drop(owned);
    }

    #[test]
    fn node_kinds_map_to_json_types() {
        assert_eq!(JsonType::from(NodeKind::True), JsonType::Boolean);
        assert_eq!(JsonType::from(NodeKind::False), JsonType::Boolean);
        assert_eq!(JsonType::Boolean.to_string(), "boolean");
        assert_eq!(JsonType::Null.to_string(), "null");
    }
}
