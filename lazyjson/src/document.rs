// SPDX-License-Identifier: Apache-2.0

//! The lazy document cursor.
//!
//! A [`Document`] binds one [`PaddedView`] to one [`Parser`] and walks the
//! root value forward-only. It is either *alive*, holding the parser's
//! scratch tape, or *dormant* after [`Document::release`]. Every accessor
//! goes through `ensure_alive`, which re-iterates the retained view when the
//! document is dormant, so revival is invisible to callers.
//!
//! Values returned by the accessors borrow the document, so the borrow
//! checker ends their use before the cursor moves again. Use
//! [`Value::to_owned_value`] to keep data past the next lookup.

use std::borrow::Cow;

use crate::cursor::{self, Elements, Fields, Position};
use crate::deserialize;
use crate::error::{lookup, Error, Result};
use crate::error_code::ErrorCode;
use crate::parser::Parser;
use crate::schema::Schema;
use crate::tape::{NodeKind, Tape};
use crate::value::{Frame, JsonType, Value};
use crate::view::PaddedView;
use crate::{path, pointer};

/// Key or index for [`Document::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Key(String),
    Index(usize),
}

impl Selector {
    fn not_found(self) -> Error {
        match self {
            Selector::Key(key) => Error::KeyNotFound(key),
            Selector::Index(index) => Error::IndexNotFound(index),
        }
    }
}

impl From<&str> for Selector {
    fn from(key: &str) -> Self {
        Selector::Key(key.to_string())
    }
}

impl From<String> for Selector {
    fn from(key: String) -> Self {
        Selector::Key(key)
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Selector::Index(index)
    }
}

impl core::fmt::Display for Selector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Selector::Key(key) => write!(f, "{key:?}"),
            Selector::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A parsed JSON document read lazily through a forward-only cursor.
pub struct Document {
    parser: Parser,
    view: PaddedView,
    /// `Some` while alive
    tape: Option<Tape>,
    root: Position,
}

impl Document {
    pub(crate) fn new(parser: Parser, view: PaddedView, tape: Tape) -> Self {
        Self {
            parser,
            view,
            tape: Some(tape),
            root: Position::start(0),
        }
    }

    /// True while the document holds its parser's scratch.
    pub fn is_alive(&self) -> bool {
        self.tape.is_some()
    }

    /// The view this document reads from.
    pub fn view(&self) -> &PaddedView {
        &self.view
    }

    /// The parser this document is bound to.
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Hand the scratch back to the parser. The document turns dormant and
    /// revives on its next access.
    pub fn release(&mut self) {
        if let Some(tape) = self.tape.take() {
            log::trace!("document: releasing parser scratch");
            self.parser.give_back(tape);
        }
    }

    /// Reset the cursor to the start of the document without re-parsing.
    pub fn rewind(&mut self) {
        self.root = Position::start(0);
    }

    /// Parse the view again and restart from the beginning, even when alive.
    pub fn reiterate(&mut self) -> Result<()> {
        self.release();
        self.ensure_alive()
    }

    fn ensure_alive(&mut self) -> Result<()> {
        if self.tape.is_none() {
            log::debug!("document: reviving from {} byte view", self.view.len());
            self.tape = Some(self.parser.lease(&self.view)?);
            self.root = Position::start(0);
        }
        Ok(())
    }

    /// Revive if needed and split into the tape frame and the root position.
    fn parts(&mut self) -> Result<(Frame<'_>, &mut Position)> {
        self.ensure_alive()?;
        let tape = self
            .tape
            .as_ref()
            .ok_or(Error::ParserMisuse(ErrorCode::Uninitialized))?;
        Ok((Frame::new(tape.nodes(), self.view.as_bytes()), &mut self.root))
    }

    /// The root value. Containers come back as fresh cursors.
    pub fn value(&mut self) -> Result<Value<'_>> {
        let (frame, _) = self.parts()?;
        Ok(frame.value(0)?)
    }

    /// Type of the root value.
    pub fn json_type(&mut self) -> Result<JsonType> {
        let (frame, _) = self.parts()?;
        Ok(frame.json_type(0)?)
    }

    /// Raw JSON text of the whole document, surrounding whitespace excluded.
    pub fn raw_json(&mut self) -> Result<&str> {
        let (frame, _) = self.parts()?;
        let node = frame.node(0)?;
        let raw = match node.kind {
            // String nodes span the body only; widen to the quotes.
            NodeKind::String => &frame.bytes()[node.start as usize - 1..node.end as usize + 1],
            _ => node.raw(frame.bytes()),
        };
        core::str::from_utf8(raw).map_err(|_| Error::Utf8)
    }

    /// Number of elements (array root) or fields (object root).
    pub fn count_elements(&mut self) -> Result<usize> {
        let (frame, _) = self.parts()?;
        let node = frame.node(0)?;
        match node.kind {
            NodeKind::Array | NodeKind::Object => Ok(node.count as usize),
            _ => Err(Error::IncorrectType),
        }
    }

    /// True for an empty array or object root.
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.count_elements()? == 0)
    }

    /// Ordered lookup of `key` in the root object, searching forward from
    /// the cursor. `None` when absent or when the root is not an object.
    pub fn find_field(&mut self, key: &str) -> Result<Option<Value<'_>>> {
        let (frame, root) = self.parts()?;
        lookup(cursor::find_field(frame, 0, root, key).and_then(|i| frame.value(i)))
    }

    /// Same as [`Document::find_field`].
    pub fn aref(&mut self, key: &str) -> Result<Option<Value<'_>>> {
        self.find_field(key)
    }

    /// Lookup that wraps around the root object once, for keys read out of
    /// document order.
    pub fn find_field_unordered(&mut self, key: &str) -> Result<Option<Value<'_>>> {
        let (frame, root) = self.parts()?;
        lookup(cursor::find_field_unordered(frame, 0, root, key).and_then(|i| frame.value(i)))
    }

    /// Element `index` of the root array.
    ///
    /// Each index can be read once per pass: repeating the last index gives
    /// `None`, going back further is [`Error::OutOfOrderIteration`]. Call
    /// [`Document::rewind`] to start over.
    pub fn at(&mut self, index: usize) -> Result<Option<Value<'_>>> {
        let (frame, root) = self.parts()?;
        lookup(cursor::element_at(frame, 0, root, index).and_then(|i| frame.value(i)))
    }

    fn select(&mut self, selector: &Selector) -> Result<Option<Value<'_>>> {
        match selector {
            Selector::Key(key) => self.find_field(key),
            Selector::Index(index) => self.at(*index),
        }
    }

    /// Like [`Document::find_field`] / [`Document::at`], but a miss is
    /// [`Error::KeyNotFound`] or [`Error::IndexNotFound`].
    pub fn fetch(&mut self, selector: impl Into<Selector>) -> Result<Value<'_>> {
        let selector = selector.into();
        match self.select(&selector)? {
            Some(value) => Ok(value),
            None => Err(selector.not_found()),
        }
    }

    /// Like [`Document::fetch`], falling back to `default` on a miss.
    pub fn fetch_or<'a>(
        &'a mut self,
        selector: impl Into<Selector>,
        default: Value<'a>,
    ) -> Result<Value<'a>> {
        let selector = selector.into();
        Ok(self.select(&selector)?.unwrap_or(default))
    }

    /// Like [`Document::fetch`], computing the fallback from the selector on a miss.
    pub fn fetch_or_else<'a, F>(&'a mut self, selector: impl Into<Selector>, f: F) -> Result<Value<'a>>
    where
        F: FnOnce(&Selector) -> Value<'a>,
    {
        let selector = selector.into();
        match self.select(&selector)? {
            Some(value) => Ok(value),
            None => Ok(f(&selector)),
        }
    }

    /// Resolve a JSON Pointer (or `#` URI fragment) against the root.
    ///
    /// Resolution always starts from the top of the document and leaves the
    /// cursor rewound.
    pub fn at_pointer(&mut self, json_pointer: &str) -> Result<Option<Value<'_>>> {
        self.rewind();
        let (frame, _) = self.parts()?;
        lookup(pointer::resolve(frame, 0, json_pointer).and_then(|i| frame.value(i)))
    }

    /// Resolve a JSON path such as `$.items[0]['name']` against the root.
    /// Wildcards are rejected here; see [`Document::at_path_with_wildcard`].
    pub fn at_path(&mut self, json_path: &str) -> Result<Option<Value<'_>>> {
        self.rewind();
        let (frame, _) = self.parts()?;
        lookup(path::resolve(frame, 0, json_path).and_then(|i| frame.value(i)))
    }

    /// Every value matched by a path that may contain `.*` or `[*]`, in
    /// document order.
    pub fn at_path_with_wildcard(&mut self, json_path: &str) -> Result<Vec<Value<'_>>> {
        self.rewind();
        let (frame, _) = self.parts()?;
        let matches = path::resolve_all(frame, 0, json_path)?;
        let mut values = Vec::with_capacity(matches.len());
        for index in matches {
            values.push(frame.value(index)?);
        }
        Ok(values)
    }

    /// Calls `f` once per value matched by a wildcard path instead of
    /// collecting them.
    pub fn at_path_each<F>(&mut self, json_path: &str, mut f: F) -> Result<&mut Self>
    where
        F: FnMut(Value<'_>),
    {
        self.rewind();
        {
            let (frame, _) = self.parts()?;
            for index in path::resolve_all(frame, 0, json_path)? {
                f(frame.value(index)?);
            }
        }
        Ok(self)
    }

    /// Remaining root array elements, or `None` for an empty array.
    fn elements(&mut self) -> Result<Option<Elements<'_, '_>>> {
        let (frame, root) = self.parts()?;
        let node = frame.node(0)?;
        if node.kind != NodeKind::Array {
            return Err(Error::IncorrectType);
        }
        if node.count == 0 {
            return Ok(None);
        }
        Ok(Some(Elements::new(frame, 0, root)?))
    }

    fn fields(&mut self) -> Result<Option<Fields<'_, '_>>> {
        let (frame, root) = self.parts()?;
        let node = frame.node(0)?;
        if node.kind != NodeKind::Object {
            return Err(Error::IncorrectType);
        }
        if node.count == 0 {
            return Ok(None);
        }
        Ok(Some(Fields::new(frame, 0, root)?))
    }

    /// Calls `f` for each remaining element of the root array, in order.
    pub fn array_each<F>(&mut self, mut f: F) -> Result<&mut Self>
    where
        F: FnMut(Value<'_>),
    {
        if let Some(elements) = self.elements()? {
            for element in elements {
                f(element?);
            }
        }
        Ok(self)
    }

    /// The remaining elements of the root array, decoded lazily into a
    /// vector sized from the element count.
    pub fn array_values(&mut self) -> Result<Vec<Value<'_>>> {
        match self.elements()? {
            Some(elements) => {
                let mut values = Vec::with_capacity(elements.size_hint().0);
                for element in elements {
                    values.push(element?);
                }
                Ok(values)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Calls `f` with each remaining `(key, value)` of the root object, in
    /// document order. Keys are unescaped.
    pub fn object_each<F>(&mut self, mut f: F) -> Result<&mut Self>
    where
        F: FnMut(Cow<'_, str>, Value<'_>),
    {
        if let Some(fields) = self.fields()? {
            for field in fields {
                let (key, value) = field?;
                f(key, value);
            }
        }
        Ok(self)
    }

    /// The remaining `(key, value)` pairs of the root object.
    pub fn object_entries(&mut self) -> Result<Vec<(Cow<'_, str>, Value<'_>)>> {
        match self.fields()? {
            Some(fields) => {
                let mut entries = Vec::with_capacity(fields.size_hint().0);
                for field in fields {
                    entries.push(field?);
                }
                Ok(entries)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Populate `target` from the root object as described by `schema`.
    pub fn deserialize_into<'t, T>(
        &mut self,
        target: &'t mut T,
        schema: &Schema<T>,
    ) -> Result<&'t mut T> {
        deserialize::into(self, target, schema)
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.release();
    }
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Document")
            .field("view", &self.view)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::ELEMENT_ITERATORS;
    use test_log::test;

    fn created() -> usize {
        ELEMENT_ITERATORS.with(|c| c.get())
    }

    #[test]
    fn empty_array_skips_element_iteration() {
        let parser = Parser::new();
        let mut doc = parser.iterate_input("[]").unwrap();
        let before = created();
        assert!(doc.array_values().unwrap().is_empty());
        let mut calls = 0;
        doc.array_each(|_| calls += 1).unwrap();
        assert_eq!(calls, 0);
        assert_eq!(created(), before);

        drop(doc);
        let mut doc = parser.iterate_input("[1]").unwrap();
        assert_eq!(doc.array_values().unwrap().len(), 1);
        assert_eq!(created(), before + 1);
    }

    #[test]
    fn each_requires_matching_root() {
        let parser = Parser::new();
        let mut doc = parser.iterate_input(r#"{"a": 1}"#).unwrap();
        match doc.array_values() {
            Err(Error::IncorrectType) => {}
            other => panic!("Expected IncorrectType, got: {:?}", other),
        }
        match doc.object_each(|_, _| {}) {
            Ok(_) => {}
            Err(e) => panic!("Expected object iteration to work, got: {:?}", e),
        }
    }

    #[test]
    fn raw_json_trims_whitespace() {
        let parser = Parser::new();
        let mut doc = parser.iterate_input("  [1, 2] \n").unwrap();
        assert_eq!(doc.raw_json().unwrap(), "[1, 2]");
        drop(doc);
        let mut doc = parser.iterate_input(r#" "s" "#).unwrap();
        assert_eq!(doc.raw_json().unwrap(), r#""s""#);
    }

    #[test]
    fn selector_conversions() {
        assert_eq!(Selector::from("k"), Selector::Key("k".into()));
        assert_eq!(Selector::from(3usize), Selector::Index(3));
        assert_eq!(Selector::from("k").to_string(), "\"k\"");
        assert!(matches!(
            Selector::from(7usize).not_found(),
            Error::IndexNotFound(7)
        ));
    }
}
