// SPDX-License-Identifier: Apache-2.0

//! Forward-only cursors over arrays and objects.
//!
//! A cursor remembers how many children of its container it has passed and
//! where the next one starts on the tape. Lookups only move it forward;
//! `rewind` is the only way back to the first child.
//!
//! Indexed access is single-use: once `at(i)` has returned element `i`,
//! asking for `i` again is a miss and asking for anything before it is an
//! [`crate::Error::OutOfOrderIteration`] error. Rewind first to read an
//! element twice.

use std::borrow::Cow;

use crate::error::{lookup, Result};
use crate::error_code::ErrorCode;
use crate::tape::NodeKind;
use crate::unescape::unescape;
use crate::value::{Frame, Value};
use crate::{path, pointer};

type CodeResult<T> = core::result::Result<T, ErrorCode>;

#[cfg(test)]
thread_local! {
    /// Number of element iterators created on this thread.
    pub(crate) static ELEMENT_ITERATORS: core::cell::Cell<usize> = const { core::cell::Cell::new(0) };
}

/// Forward position within one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Position {
    /// Tape index where the next unvisited child starts
    next: usize,
    /// Children already passed
    consumed: usize,
}

impl Position {
    pub fn start(container: usize) -> Self {
        Self {
            next: container + 1,
            consumed: 0,
        }
    }
}

fn container(frame: Frame<'_>, index: usize, kind: NodeKind) -> CodeResult<usize> {
    let node = frame.node(index)?;
    if node.kind != kind {
        return Err(ErrorCode::IncorrectType);
    }
    Ok(node.count as usize)
}

fn key_matches(frame: Frame<'_>, key_index: usize, key: &str) -> CodeResult<bool> {
    let raw = frame.node(key_index)?.raw(frame.bytes());
    if memchr::memchr(b'\\', raw).is_none() {
        return Ok(raw == key.as_bytes());
    }
    Ok(unescape(raw)? == key)
}

/// Step over the field at `pos`, returning its key and value tape indices.
fn next_field(frame: Frame<'_>, pos: &mut Position) -> CodeResult<(usize, usize)> {
    let key = pos.next;
    let value = key + 1;
    pos.next = frame.node(value)?.next as usize;
    pos.consumed += 1;
    Ok((key, value))
}

fn next_element(frame: Frame<'_>, pos: &mut Position) -> CodeResult<usize> {
    let element = pos.next;
    pos.next = frame.node(element)?.next as usize;
    pos.consumed += 1;
    Ok(element)
}

/// Ordered search: scan the remaining fields for `key`.
///
/// On a hit the position moves just past the field. On a miss it ends at the
/// end of the object.
pub(crate) fn find_field(
    frame: Frame<'_>,
    object: usize,
    pos: &mut Position,
    key: &str,
) -> CodeResult<usize> {
    let count = container(frame, object, NodeKind::Object)?;
    while pos.consumed < count {
        let (key_index, value_index) = next_field(frame, pos)?;
        if key_matches(frame, key_index, key)? {
            return Ok(value_index);
        }
    }
    Err(ErrorCode::NoSuchField)
}

/// Unordered search: scan the remaining fields, then wrap around once to the
/// fields before the starting position. A miss leaves the position unchanged.
pub(crate) fn find_field_unordered(
    frame: Frame<'_>,
    object: usize,
    pos: &mut Position,
    key: &str,
) -> CodeResult<usize> {
    let origin = *pos;
    match find_field(frame, object, pos, key) {
        Err(ErrorCode::NoSuchField) => {}
        found => return found,
    }
    let mut wrapped = Position::start(object);
    while wrapped.consumed < origin.consumed {
        let (key_index, value_index) = next_field(frame, &mut wrapped)?;
        if key_matches(frame, key_index, key)? {
            *pos = wrapped;
            return Ok(value_index);
        }
    }
    *pos = origin;
    Err(ErrorCode::NoSuchField)
}

/// Indexed access relative to the forward position.
pub(crate) fn element_at(
    frame: Frame<'_>,
    array: usize,
    pos: &mut Position,
    index: usize,
) -> CodeResult<usize> {
    let count = container(frame, array, NodeKind::Array)?;
    if index >= count {
        return Err(ErrorCode::IndexOutOfBounds);
    }
    if index < pos.consumed {
        if index + 1 == pos.consumed {
            return Err(ErrorCode::OutOfBounds);
        }
        return Err(ErrorCode::OutOfOrderIteration);
    }
    while pos.consumed < index {
        next_element(frame, pos)?;
    }
    next_element(frame, pos)
}

/// Iterator over the elements of an array that the cursor has not passed yet.
pub struct Elements<'c, 'd> {
    frame: Frame<'d>,
    pos: &'c mut Position,
    count: usize,
}

impl<'c, 'd> Elements<'c, 'd> {
    pub(crate) fn new(frame: Frame<'d>, array: usize, pos: &'c mut Position) -> CodeResult<Self> {
        let count = container(frame, array, NodeKind::Array)?;
        Ok(Self::with_count(frame, pos, count))
    }

    fn with_count(frame: Frame<'d>, pos: &'c mut Position, count: usize) -> Self {
        #[cfg(test)]
        ELEMENT_ITERATORS.with(|created| created.set(created.get() + 1));
        Self { frame, pos, count }
    }
}

impl<'d> Iterator for Elements<'_, 'd> {
    type Item = Result<Value<'d>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos.consumed >= self.count {
            return None;
        }
        let item = next_element(self.frame, self.pos).and_then(|index| self.frame.value(index));
        Some(item.map_err(Into::into))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count.saturating_sub(self.pos.consumed);
        (remaining, Some(remaining))
    }
}

/// Iterator over the `(key, value)` pairs of an object that the cursor has
/// not passed yet, in document order.
pub struct Fields<'c, 'd> {
    frame: Frame<'d>,
    pos: &'c mut Position,
    count: usize,
}

impl<'c, 'd> Fields<'c, 'd> {
    pub(crate) fn new(frame: Frame<'d>, object: usize, pos: &'c mut Position) -> CodeResult<Self> {
        let count = container(frame, object, NodeKind::Object)?;
        Ok(Self { frame, pos, count })
    }
}

impl<'d> Iterator for Fields<'_, 'd> {
    type Item = Result<(Cow<'d, str>, Value<'d>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos.consumed >= self.count {
            return None;
        }
        let frame = self.frame;
        let item = next_field(frame, self.pos)
            .and_then(|(key, value)| Ok((frame.string(key)?, frame.value(value)?)));
        Some(item.map_err(Into::into))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count.saturating_sub(self.pos.consumed);
        (remaining, Some(remaining))
    }
}

/// A forward-only cursor over one JSON array.
#[derive(Clone)]
pub struct Array<'d> {
    frame: Frame<'d>,
    index: usize,
    pos: Position,
}

impl<'d> Array<'d> {
    pub(crate) fn new(frame: Frame<'d>, index: usize) -> Self {
        Self {
            frame,
            index,
            pos: Position::start(index),
        }
    }

    /// Tape and index of this container's own node.
    pub(crate) fn location(&self) -> (Frame<'d>, usize) {
        (self.frame, self.index)
    }

    /// Number of elements, known without visiting them.
    pub fn count_elements(&self) -> usize {
        self.frame.node(self.index).map_or(0, |node| node.count as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.count_elements() == 0
    }

    /// Element `index`, or `None` when it is out of range or was already returned.
    pub fn at(&mut self, index: usize) -> Result<Option<Value<'d>>> {
        let frame = self.frame;
        lookup(element_at(frame, self.index, &mut self.pos, index).and_then(|i| frame.value(i)))
    }

    /// The elements after the cursor position; consuming them advances the cursor.
    pub fn elements(&mut self) -> Elements<'_, 'd> {
        let count = self.count_elements();
        Elements::with_count(self.frame, &mut self.pos, count)
    }

    /// Back to the first element.
    pub fn rewind(&mut self) {
        self.pos = Position::start(self.index);
    }

    /// Resolve a JSON Pointer relative to this array. Does not move the cursor.
    pub fn at_pointer(&self, json_pointer: &str) -> Result<Option<Value<'d>>> {
        let frame = self.frame;
        lookup(pointer::resolve(frame, self.index, json_pointer).and_then(|i| frame.value(i)))
    }

    /// Resolve a JSON path (`$[0].key`) relative to this array. Does not move the cursor.
    pub fn at_path(&self, json_path: &str) -> Result<Option<Value<'d>>> {
        let frame = self.frame;
        lookup(path::resolve(frame, self.index, json_path).and_then(|i| frame.value(i)))
    }

    /// Raw JSON text of the whole array.
    pub fn raw_json(&self) -> &'d str {
        raw_json(self.frame, self.index)
    }
}

impl core::fmt::Debug for Array<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Array")
            .field("count", &self.count_elements())
            .field("consumed", &self.pos.consumed)
            .finish()
    }
}

/// A forward-only cursor over one JSON object.
#[derive(Clone)]
pub struct Object<'d> {
    frame: Frame<'d>,
    index: usize,
    pos: Position,
}

impl<'d> Object<'d> {
    pub(crate) fn new(frame: Frame<'d>, index: usize) -> Self {
        Self {
            frame,
            index,
            pos: Position::start(index),
        }
    }

    /// Tape and index of this container's own node.
    pub(crate) fn location(&self) -> (Frame<'d>, usize) {
        (self.frame, self.index)
    }

    /// Number of fields, known without visiting them.
    pub fn count_fields(&self) -> usize {
        self.frame.node(self.index).map_or(0, |node| node.count as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.count_fields() == 0
    }

    /// Ordered lookup: search forward from the cursor for `key`.
    ///
    /// Fields before the cursor are not considered, so look keys up in
    /// document order or use [`Object::find_field_unordered`].
    pub fn find_field(&mut self, key: &str) -> Result<Option<Value<'d>>> {
        let frame = self.frame;
        lookup(find_field(frame, self.index, &mut self.pos, key).and_then(|i| frame.value(i)))
    }

    /// Same as [`Object::find_field`].
    pub fn aref(&mut self, key: &str) -> Result<Option<Value<'d>>> {
        self.find_field(key)
    }

    /// Lookup that wraps around once, for keys accessed out of document order.
    pub fn find_field_unordered(&mut self, key: &str) -> Result<Option<Value<'d>>> {
        let frame = self.frame;
        lookup(
            find_field_unordered(frame, self.index, &mut self.pos, key)
                .and_then(|i| frame.value(i)),
        )
    }

    /// The fields after the cursor position; consuming them advances the cursor.
    pub fn fields(&mut self) -> Fields<'_, 'd> {
        let count = self.count_fields();
        Fields {
            frame: self.frame,
            pos: &mut self.pos,
            count,
        }
    }

    /// Back to the first field.
    pub fn rewind(&mut self) {
        self.pos = Position::start(self.index);
    }

    /// Resolve a JSON Pointer relative to this object. Does not move the cursor.
    pub fn at_pointer(&self, json_pointer: &str) -> Result<Option<Value<'d>>> {
        let frame = self.frame;
        lookup(pointer::resolve(frame, self.index, json_pointer).and_then(|i| frame.value(i)))
    }

    /// Resolve a JSON path (`$.key[0]`) relative to this object. Does not move the cursor.
    pub fn at_path(&self, json_path: &str) -> Result<Option<Value<'d>>> {
        let frame = self.frame;
        lookup(path::resolve(frame, self.index, json_path).and_then(|i| frame.value(i)))
    }

    /// Raw JSON text of the whole object.
    pub fn raw_json(&self) -> &'d str {
        raw_json(self.frame, self.index)
    }
}

impl core::fmt::Debug for Object<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Object")
            .field("count", &self.count_fields())
            .field("consumed", &self.pos.consumed)
            .finish()
    }
}

fn raw_json<'d>(frame: Frame<'d>, index: usize) -> &'d str {
    frame
        .node(index)
        .ok()
        .and_then(|node| core::str::from_utf8(node.raw(frame.bytes())).ok())
        .unwrap_or_default()
}
