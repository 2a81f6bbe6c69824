// SPDX-License-Identifier: Apache-2.0

//! Lazy, forward-only access to JSON documents over padded input buffers.
//!
//! Raw bytes go through the buffer preparer into a [`PaddedView`], a reusable
//! [`Parser`] iterates the view, and the resulting [`Document`] decodes only
//! the values a caller actually touches:
//!
//! ```
//! let mut doc = lazyjson::parse_lazy(r#"{"name": "ada", "langs": ["en", "fr"]}"#, None)?;
//! assert_eq!(doc.find_field("name")?.and_then(|v| v.as_str().map(str::to_owned)), Some("ada".into()));
//! let langs = doc.at_path_with_wildcard("$.langs[*]")?;
//! assert_eq!(langs.len(), 2);
//! # Ok::<(), lazyjson::Error>(())
//! ```
//!
//! Cursors only move forward. Array elements read with `at` can be read once
//! per pass; call `rewind` to start again.

use std::path::Path;

// Compile-time configuration validation
mod config_check;

mod error_code;
pub use error_code::ErrorCode;

mod error;
pub use error::{is_lookup_miss, lookup, Error, Result};

mod padding;
pub use padding::{need_allocation, padded_len, page_size, set_zero_copy, zero_copy_enabled, PADDING};

mod padded_buffer;
pub use padded_buffer::PaddedBuffer;

mod view;
pub use view::{Input, PaddedView, Strategy};

mod number;
pub use number::Number;

mod unescape;

mod tape;

mod value;
pub use value::{JsonType, OwnedValue, Value};

mod cursor;
pub use cursor::{Array, Elements, Fields, Object};

mod pointer;

mod path;

mod parser;
pub use parser::{Parser, ParserOptions, DEFAULT_CAPACITY, DEFAULT_MAX_CAPACITY, DEFAULT_MAX_DEPTH};

mod document;
pub use document::{Document, Selector};

mod schema;
pub use schema::Schema;

pub mod deserialize;

/// Prepare `input` and iterate it, with `parser` or a fresh one sized to the input.
pub fn parse_lazy(input: impl Into<Input>, parser: Option<&Parser>) -> Result<Document> {
    iterate_with(PaddedView::prepare(input)?, parser)
}

/// Load `path` into a padded buffer and iterate it like [`parse_lazy`].
pub fn load_lazy(path: impl AsRef<Path>, parser: Option<&Parser>) -> Result<Document> {
    iterate_with(PaddedView::load(path)?, parser)
}

fn iterate_with(view: PaddedView, parser: Option<&Parser>) -> Result<Document> {
    match parser {
        Some(parser) => parser.iterate(view),
        None => {
            let options = ParserOptions::default().capacity(view.len());
            Parser::with_options(options)?.iterate(view)
        }
    }
}
