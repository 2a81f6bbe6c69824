// SPDX-License-Identifier: Apache-2.0

//! Typed failure taxonomy and the translation from engine result codes.
//!
//! Every operation that receives a non-success [`ErrorCode`] funnels it through
//! [`Error::from`], which picks exactly one narrowly scoped variant. Lookup
//! style accessors first ask [`is_lookup_miss`] and turn misses into `None`
//! via [`lookup`], so a missing field never surfaces as an error there.

use std::path::PathBuf;

use crate::error_code::ErrorCode;
use crate::value::JsonType;

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed document structure: tape errors, trailing content,
    /// unterminated containers, or broken `true`/`false`/`null` atoms.
    #[error("malformed JSON structure: {0}")]
    Structure(ErrorCode),
    /// Malformed string: unterminated, invalid escape, or unescaped control character.
    #[error("malformed JSON string: {0}")]
    String(ErrorCode),
    /// Malformed numeric literal or a magnitude beyond what can be represented.
    #[error("invalid JSON number: {0}")]
    Number(ErrorCode),
    /// The input is not valid UTF-8.
    #[error("{}", ErrorCode::Utf8Error)]
    Utf8,
    /// Depth limit, parser capacity, or padding requirement exceeded.
    #[error("capacity exceeded: {0}")]
    Capacity(ErrorCode),
    /// The input holds no JSON value.
    #[error("{}", ErrorCode::Empty)]
    EmptyInput,
    /// The parser was used in a way it does not support (uninitialized,
    /// iterated while a document still holds it, scalar document misuse).
    #[error("parser misuse: {0}")]
    ParserMisuse(ErrorCode),
    /// An array was indexed behind the position the cursor already passed.
    #[error("{}", ErrorCode::OutOfOrderIteration)]
    OutOfOrderIteration,
    /// Reading the input file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being loaded.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Invalid JSON Pointer, JSON path, or URI fragment syntax.
    #[error("invalid pointer: {0}")]
    InvalidPointer(ErrorCode),
    /// No engine implementation supports this CPU.
    #[error("{}", ErrorCode::UnsupportedArchitecture)]
    UnsupportedArchitecture,
    /// Anything the engine reports that fits no other kind.
    #[error("unexpected condition: {0}")]
    Unexpected(ErrorCode),
    /// The input is so large that adding the required padding would overflow.
    #[error("JSON input too large for padding ({len} bytes)")]
    InputTooLarge {
        /// Logical length of the rejected input.
        len: usize,
    },
    /// A value was requested as a type it does not have.
    #[error("{}", ErrorCode::IncorrectType)]
    IncorrectType,
    /// A lookup-miss code escaped a context that does not treat misses as absence.
    #[error("not found: {0}")]
    NotFound(ErrorCode),
    /// `fetch` by key found nothing and no fallback was given.
    #[error("key not found: {0:?}")]
    KeyNotFound(String),
    /// `fetch` by index found nothing and no fallback was given.
    #[error("index not found: {0}")]
    IndexNotFound(usize),
    /// A schema field is present with a different JSON type than declared.
    #[error("type mismatch for attribute `{attribute}`: expected {expected}, found {found}")]
    TypeMismatch {
        /// Attribute named in the schema.
        attribute: String,
        /// Type the schema declares.
        expected: JsonType,
        /// Type found in the document.
        found: JsonType,
    },
    /// None of the schema's fields were present in the document.
    #[error("no schema field matched the document")]
    NoFieldsMatched,
}

impl Error {
    /// The engine result code behind this error, when there is one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Structure(code)
            | Error::String(code)
            | Error::Number(code)
            | Error::Capacity(code)
            | Error::ParserMisuse(code)
            | Error::InvalidPointer(code)
            | Error::Unexpected(code)
            | Error::NotFound(code) => Some(*code),
            Error::Utf8 => Some(ErrorCode::Utf8Error),
            Error::EmptyInput => Some(ErrorCode::Empty),
            Error::OutOfOrderIteration => Some(ErrorCode::OutOfOrderIteration),
            Error::Io { .. } => Some(ErrorCode::IoError),
            Error::UnsupportedArchitecture => Some(ErrorCode::UnsupportedArchitecture),
            Error::IncorrectType => Some(ErrorCode::IncorrectType),
            Error::InputTooLarge { .. }
            | Error::KeyNotFound(_)
            | Error::IndexNotFound(_)
            | Error::TypeMismatch { .. }
            | Error::NoFieldsMatched => None,
        }
    }
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::TapeError
            | ErrorCode::TrailingContent
            | ErrorCode::IncompleteArrayOrObject
            | ErrorCode::TAtomError
            | ErrorCode::FAtomError
            | ErrorCode::NAtomError => Error::Structure(code),

            ErrorCode::StringError | ErrorCode::UnclosedString | ErrorCode::UnescapedChars => {
                Error::String(code)
            }

            ErrorCode::NumberError | ErrorCode::BigIntError | ErrorCode::NumberOutOfRange => {
                Error::Number(code)
            }

            ErrorCode::Utf8Error => Error::Utf8,

            ErrorCode::DepthError
            | ErrorCode::Capacity
            | ErrorCode::OutOfCapacity
            | ErrorCode::InsufficientPadding
            | ErrorCode::MemAlloc => Error::Capacity(code),

            ErrorCode::Empty => Error::EmptyInput,

            ErrorCode::Uninitialized
            | ErrorCode::ParserInUse
            | ErrorCode::ScalarDocumentAsValue => Error::ParserMisuse(code),

            ErrorCode::OutOfOrderIteration => Error::OutOfOrderIteration,

            ErrorCode::IoError => Error::Io {
                path: PathBuf::new(),
                source: std::io::Error::other(code.message()),
            },

            ErrorCode::InvalidJsonPointer | ErrorCode::InvalidUriFragment => {
                Error::InvalidPointer(code)
            }

            ErrorCode::UnsupportedArchitecture => Error::UnsupportedArchitecture,

            ErrorCode::IncorrectType => Error::IncorrectType,

            ErrorCode::NoSuchField | ErrorCode::IndexOutOfBounds | ErrorCode::OutOfBounds => {
                Error::NotFound(code)
            }

            ErrorCode::UnexpectedError => Error::Unexpected(code),
        }
    }
}

/// True for codes that mean "nothing there" during a lookup rather than a
/// broken document.
pub fn is_lookup_miss(code: ErrorCode) -> bool {
    matches!(
        code,
        ErrorCode::NoSuchField
            | ErrorCode::OutOfBounds
            | ErrorCode::IndexOutOfBounds
            | ErrorCode::IncorrectType
    )
}

/// Convert an engine result into the three-way lookup outcome:
/// `Ok(Some(v))` found, `Ok(None)` miss, `Err(e)` structural failure.
pub fn lookup<T>(result: core::result::Result<T, ErrorCode>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(code) if is_lookup_miss(code) => Ok(None),
        Err(code) => Err(code.into()),
    }
}
