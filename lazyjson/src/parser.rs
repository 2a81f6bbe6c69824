// SPDX-License-Identifier: Apache-2.0

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::error_code::ErrorCode;
use crate::padding::PADDING;
use crate::tape::Tape;
use crate::view::{Input, PaddedView};

/// Scratch reserved by [`Parser::new`], in input bytes.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;
/// Largest document any parser accepts; tape offsets are 32-bit.
pub const DEFAULT_MAX_CAPACITY: usize = u32::MAX as usize;
/// Deepest container nesting accepted by default.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Limits a [`Parser`] is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Input bytes the scratch is sized for up front
    pub capacity: usize,
    /// Hard ceiling on input size and on later [`Parser::allocate`] calls
    pub max_capacity: usize,
    /// Deepest container nesting accepted
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_capacity: DEFAULT_MAX_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserOptions {
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

struct Inner {
    max_capacity: usize,
    capacity: Cell<usize>,
    max_depth: Cell<usize>,
    /// `None` while a document holds the tape
    scratch: RefCell<Option<Tape>>,
}

/// A reusable parser handle.
///
/// The parser owns one scratch tape, sized once by [`Parser::allocate`] and
/// reused for every document it iterates. A [`Document`] borrows that tape
/// for as long as it is alive, so a parser serves one document at a time:
/// iterating again while a document still holds the tape fails with
/// [`ErrorCode::ParserInUse`]. Releasing or dropping the document hands the
/// tape back.
///
/// Cloning a `Parser` yields another handle to the same scratch.
#[derive(Clone)]
pub struct Parser {
    inner: Rc<Inner>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// A parser with [`ParserOptions::default`].
    pub fn new() -> Self {
        Self::build(ParserOptions::default())
    }

    /// A parser that rejects inputs above `max_capacity` bytes.
    pub fn with_max_capacity(max_capacity: usize) -> Result<Self> {
        let capacity = DEFAULT_CAPACITY.min(max_capacity);
        Self::with_options(
            ParserOptions::default()
                .capacity(capacity)
                .max_capacity(max_capacity),
        )
    }

    /// A parser with explicit limits.
    pub fn with_options(options: ParserOptions) -> Result<Self> {
        if options.max_capacity > DEFAULT_MAX_CAPACITY || options.capacity > options.max_capacity {
            return Err(ErrorCode::Capacity.into());
        }
        Ok(Self::build(options))
    }

    fn build(options: ParserOptions) -> Self {
        log::debug!(
            "parser: allocating for {} bytes, depth {} (max {} bytes)",
            options.capacity,
            options.max_depth,
            options.max_capacity
        );
        Self {
            inner: Rc::new(Inner {
                max_capacity: options.max_capacity,
                capacity: Cell::new(options.capacity),
                max_depth: Cell::new(options.max_depth),
                scratch: RefCell::new(Some(Tape::with_capacity(
                    options.capacity,
                    options.max_depth,
                ))),
            }),
        }
    }

    /// Grow the scratch to hold documents of `capacity` bytes nested up to
    /// `max_depth`. Scratch never shrinks; a smaller request keeps what is
    /// already reserved.
    pub fn allocate(&self, capacity: usize, max_depth: usize) -> Result<()> {
        if capacity > self.inner.max_capacity {
            return Err(ErrorCode::Capacity.into());
        }
        let mut slot = self.inner.scratch.borrow_mut();
        let tape = slot
            .as_mut()
            .ok_or(Error::ParserMisuse(ErrorCode::ParserInUse))?;
        tape.reserve(capacity, max_depth);
        self.inner.capacity.set(tape.capacity());
        self.inner.max_depth.set(tape.max_depth());
        log::debug!(
            "parser: scratch now fits {} bytes, depth {}",
            tape.capacity(),
            tape.max_depth()
        );
        Ok(())
    }

    /// Input bytes the current scratch can hold.
    pub fn capacity(&self) -> usize {
        self.inner.capacity.get()
    }

    pub fn max_capacity(&self) -> usize {
        self.inner.max_capacity
    }

    pub fn max_depth(&self) -> usize {
        self.inner.max_depth.get()
    }

    /// True while a live document holds this parser's scratch.
    pub fn is_in_use(&self) -> bool {
        self.inner.scratch.borrow().is_none()
    }

    /// Parse `view` and bind a lazy document to it and to this parser.
    pub fn iterate(&self, view: PaddedView) -> Result<Document> {
        let tape = self.lease(&view)?;
        Ok(Document::new(self.clone(), view, tape))
    }

    /// Prepare raw input with the buffer preparer, then iterate it.
    pub fn iterate_input(&self, input: impl Into<Input>) -> Result<Document> {
        self.iterate(PaddedView::prepare(input)?)
    }

    /// Take the scratch and build the tape for `view` into it.
    pub(crate) fn lease(&self, view: &PaddedView) -> Result<Tape> {
        let mut tape = self
            .inner
            .scratch
            .borrow_mut()
            .take()
            .ok_or(Error::ParserMisuse(ErrorCode::ParserInUse))?;
        let built = Self::check(&tape, self.inner.max_capacity, view)
            .and_then(|_| tape.build(view.as_bytes()));
        match built {
            Ok(()) => {
                log::trace!("parser: iterated {} bytes", view.len());
                Ok(tape)
            }
            Err(code) => {
                log::debug!("parser: iterate failed: {}", code);
                self.give_back(tape);
                Err(code.into())
            }
        }
    }

    fn check(
        tape: &Tape,
        max_capacity: usize,
        view: &PaddedView,
    ) -> core::result::Result<(), ErrorCode> {
        let len = view.len();
        if len > max_capacity {
            return Err(ErrorCode::Capacity);
        }
        if len > tape.capacity() {
            return Err(ErrorCode::OutOfCapacity);
        }
        if view.capacity().saturating_sub(len) < PADDING {
            return Err(ErrorCode::InsufficientPadding);
        }
        Ok(())
    }

    /// Return the scratch taken by [`Parser::lease`].
    pub(crate) fn give_back(&self, tape: Tape) {
        *self.inner.scratch.borrow_mut() = Some(tape);
    }
}

impl core::fmt::Debug for Parser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Parser")
            .field("capacity", &self.capacity())
            .field("max_capacity", &self.max_capacity())
            .field("max_depth", &self.max_depth())
            .field("in_use", &self.is_in_use())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn options_are_validated() {
        match Parser::with_options(ParserOptions::default().capacity(10).max_capacity(5)) {
            Err(Error::Capacity(ErrorCode::Capacity)) => {}
            other => panic!("Expected Capacity, got: {:?}", other),
        }
        let parser = Parser::with_max_capacity(100).unwrap();
        assert_eq!(parser.capacity(), 100);
        assert_eq!(parser.max_capacity(), 100);
        assert_eq!(parser.max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn allocate_grows_but_never_shrinks() {
        let parser = Parser::with_options(ParserOptions::default().capacity(16)).unwrap();
        parser.allocate(4096, 64).unwrap();
        assert_eq!(parser.capacity(), 4096);
        assert_eq!(parser.max_depth(), 64);
        parser.allocate(32, 64).unwrap();
        assert_eq!(parser.capacity(), 4096);
    }

    #[test]
    fn allocate_respects_max_capacity() {
        let parser = Parser::with_max_capacity(64).unwrap();
        match parser.allocate(65, 8) {
            Err(Error::Capacity(ErrorCode::Capacity)) => {}
            other => panic!("Expected Capacity, got: {:?}", other),
        }
    }

    #[test]
    fn iterate_checks_sizes_before_parsing() {
        let options = ParserOptions::default().capacity(4).max_capacity(8);
        let parser = Parser::with_options(options).unwrap();
        let too_big = PaddedView::prepare("[1,2,3,4,5]").unwrap();
        match parser.iterate(too_big) {
            Err(Error::Capacity(ErrorCode::Capacity)) => {}
            other => panic!("Expected Capacity, got: {:?}", other),
        }
        let needs_growth = PaddedView::prepare("[1,2,3]").unwrap();
        match parser.iterate(needs_growth.clone()) {
            Err(Error::Capacity(ErrorCode::OutOfCapacity)) => {}
            other => panic!("Expected OutOfCapacity, got: {:?}", other),
        }
        parser.allocate(8, 8).unwrap();
        assert!(parser.iterate(needs_growth).is_ok());
    }

    #[test]
    fn failed_iteration_returns_the_scratch() {
        let parser = Parser::new();
        assert!(parser.iterate_input("[1,").is_err());
        assert!(!parser.is_in_use());
        assert!(parser.iterate_input("[1]").is_ok());
    }

    #[test]
    fn live_document_holds_the_scratch() {
        let parser = Parser::new();
        let doc = parser.iterate_input("{}").unwrap();
        assert!(parser.is_in_use());
        match parser.allocate(1 << 20, 16) {
            Err(Error::ParserMisuse(ErrorCode::ParserInUse)) => {}
            other => panic!("Expected ParserInUse, got: {:?}", other),
        }
        drop(doc);
        assert!(!parser.is_in_use());
        parser.allocate(1 << 20, 16).unwrap();
    }
}
