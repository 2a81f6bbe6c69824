// SPDX-License-Identifier: Apache-2.0

//! Caller input, padded views, and the buffer preparer that chooses between them.

use std::path::Path;
use std::rc::Rc;

use crate::error::Result;
use crate::error_code::ErrorCode;
use crate::padded_buffer::PaddedBuffer;
use crate::padding::{need_allocation, padded_len, zero_copy_enabled};

/// Raw JSON bytes handed over by the caller.
///
/// `Owned` input is still mutable and may be grown in place. `Frozen` input is
/// shared and immutable; it can only be aliased or copied.
#[derive(Debug, Clone)]
pub enum Input {
    /// A growable buffer the preparer may take over and freeze.
    Owned(Vec<u8>),
    /// An immutable shared buffer.
    Frozen(Rc<[u8]>),
}

impl Input {
    /// Logical length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// True when there are no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for input that can no longer be resized.
    pub fn is_frozen(&self) -> bool {
        matches!(self, Input::Frozen(_))
    }

    /// Bytes physically owned by the allocation.
    pub fn capacity(&self) -> usize {
        match self {
            Input::Owned(vec) => vec.capacity(),
            Input::Frozen(bytes) => bytes.len(),
        }
    }

    /// The content.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Input::Owned(vec) => vec.as_slice(),
            Input::Frozen(bytes) => &bytes[..],
        }
    }

    fn addr(&self) -> usize {
        self.as_bytes().as_ptr() as usize
    }

    fn freeze(self) -> Backing {
        match self {
            Input::Owned(vec) => Backing::Vec(Rc::new(vec)),
            Input::Frozen(bytes) => Backing::Shared(bytes),
        }
    }
}

impl From<Vec<u8>> for Input {
    fn from(vec: Vec<u8>) -> Self {
        Input::Owned(vec)
    }
}

impl From<String> for Input {
    fn from(s: String) -> Self {
        Input::Owned(s.into_bytes())
    }
}

impl From<Rc<[u8]>> for Input {
    fn from(bytes: Rc<[u8]>) -> Self {
        Input::Frozen(bytes)
    }
}

impl From<Rc<str>> for Input {
    fn from(s: Rc<str>) -> Self {
        Input::Frozen(Rc::from(s))
    }
}

/// Copies the slice into a fresh shared allocation. A later
/// [`Strategy::InPlace`] reuses that copy, not the caller's memory; pass a
/// `Vec<u8>` or `Rc<[u8]>` to hand over a buffer without copying.
impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Input::Frozen(Rc::from(bytes))
    }
}

/// Copies the text like the `&[u8]` conversion does.
impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Input::Frozen(Rc::from(s.as_bytes()))
    }
}

/// How a view came to reference its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The input's buffer is reused as-is and frozen. For borrowed slices
    /// that buffer is the copy made when converting them into [`Input`].
    InPlace,
    /// Frozen input was copied into an owned [`PaddedBuffer`].
    Copied,
    /// Mutable input was grown to hold the padding, then frozen.
    Grown,
    /// The view wraps a [`PaddedBuffer`] built elsewhere (e.g. a file load).
    Buffer,
}

#[derive(Clone)]
enum Backing {
    Vec(Rc<Vec<u8>>),
    Shared(Rc<[u8]>),
    Padded(PaddedBuffer),
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            Backing::Vec(vec) => vec.as_slice(),
            Backing::Shared(bytes) => &bytes[..],
            Backing::Padded(buffer) => buffer.as_bytes(),
        }
    }
}

/// A window over padded JSON input: the unit a [`crate::Parser`] consumes.
///
/// The view holds a strong reference to whatever storage backs it, so the bytes
/// stay valid for as long as the view (or any document cloned from it) lives.
/// `capacity()` always satisfies `capacity() >= len() + PADDING`; it is
/// advisory to the engine, which never reads past `len()`.
#[derive(Clone)]
pub struct PaddedView {
    backing: Backing,
    len: usize,
    capacity: usize,
    strategy: Strategy,
}

impl PaddedView {
    /// Runs the buffer preparer over caller input.
    ///
    /// With zero-copy enabled and a tail that can be over-read safely, the
    /// caller's buffer is frozen and reused. Otherwise frozen input is copied
    /// into a [`PaddedBuffer`] and owned input is grown in place to hold the
    /// padding. Either way the input is consumed and can no longer be mutated.
    pub fn prepare(input: impl Into<Input>) -> Result<Self> {
        let input = input.into();
        let len = input.len();
        let required = padded_len(len)?;

        if zero_copy_enabled() && !need_allocation(input.addr(), len, input.capacity()) {
            log::trace!("view: reusing {} byte input in place", len);
            return Ok(Self {
                backing: input.freeze(),
                len,
                capacity: required,
                strategy: Strategy::InPlace,
            });
        }

        match input {
            Input::Frozen(bytes) => {
                log::trace!("view: copying {} byte frozen input", len);
                let buffer = PaddedBuffer::new(&bytes)?;
                Ok(Self::from_buffer(buffer, Strategy::Copied))
            }
            Input::Owned(mut vec) => {
                if vec.capacity() < required {
                    log::trace!("view: growing {} byte input to {}", len, required);
                    vec.reserve_exact(required - len);
                }
                Ok(Self {
                    backing: Backing::Vec(Rc::new(vec)),
                    len,
                    capacity: required,
                    strategy: Strategy::Grown,
                })
            }
        }
    }

    /// Builds a view over input whose physical capacity the caller vouches for.
    ///
    /// Fails with `InsufficientPadding` when `capacity < len + PADDING`.
    pub fn with_capacity(input: impl Into<Input>, capacity: usize) -> Result<Self> {
        let input = input.into();
        let len = input.len();
        if capacity < padded_len(len)? {
            return Err(ErrorCode::InsufficientPadding.into());
        }
        Ok(Self {
            backing: input.freeze(),
            len,
            capacity,
            strategy: Strategy::InPlace,
        })
    }

    /// Loads a file into a fresh [`PaddedBuffer`] and views it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_buffer(PaddedBuffer::load(path)?, Strategy::Buffer))
    }

    fn from_buffer(buffer: PaddedBuffer, strategy: Strategy) -> Self {
        Self {
            len: buffer.len(),
            capacity: buffer.capacity(),
            backing: Backing::Padded(buffer),
            strategy,
        }
    }

    /// Logical content.
    pub fn as_bytes(&self) -> &[u8] {
        &self.backing.bytes()[..self.len]
    }

    /// Logical length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the logical content is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Physical capacity advertised to the engine.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Which preparation strategy produced this view.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

impl From<PaddedBuffer> for PaddedView {
    fn from(buffer: PaddedBuffer) -> Self {
        Self::from_buffer(buffer, Strategy::Buffer)
    }
}

impl core::fmt::Debug for PaddedView {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaddedView")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("strategy", &self.strategy)
            .finish()
    }
}
