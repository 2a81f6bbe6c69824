// SPDX-License-Identifier: Apache-2.0

//! Result codes reported by the tape engine and the cursor primitives.
//!
//! These are the raw, fine-grained conditions. Callers normally see them
//! wrapped in [`crate::Error`], which groups them into the closed failure
//! taxonomy; the code stays available through [`crate::Error::code`].

/// A non-success result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// This parser can't support a document that big.
    Capacity,
    /// Error allocating memory, most likely out of memory.
    MemAlloc,
    /// Something went wrong while writing to the tape (stage 2), this is a generic error.
    TapeError,
    /// Your document exceeds the user-specified depth limitation.
    DepthError,
    /// Problem while parsing a string.
    StringError,
    /// Problem while parsing an atom starting with the letter 't'.
    TAtomError,
    /// Problem while parsing an atom starting with the letter 'f'.
    FAtomError,
    /// Problem while parsing an atom starting with the letter 'n'.
    NAtomError,
    /// Problem while parsing a number.
    NumberError,
    /// The integer value exceeds 64 bits.
    BigIntError,
    /// The input is not valid UTF-8.
    Utf8Error,
    /// Unknown error, or uninitialized document.
    Uninitialized,
    /// No structural element found.
    Empty,
    /// Found unescaped characters in a string.
    UnescapedChars,
    /// Missing quote at the end.
    UnclosedString,
    /// Unsupported architecture.
    UnsupportedArchitecture,
    /// JSON element has a different type than user expected.
    IncorrectType,
    /// JSON number does not fit in 64 bits.
    NumberOutOfRange,
    /// JSON array index too large.
    IndexOutOfBounds,
    /// JSON field not found in object.
    NoSuchField,
    /// Error reading a file.
    IoError,
    /// Invalid JSON pointer syntax.
    InvalidJsonPointer,
    /// Invalid URI fragment.
    InvalidUriFragment,
    /// Indicative of a bug in the engine.
    UnexpectedError,
    /// Parser is already in use.
    ParserInUse,
    /// Tried to iterate an array or object out of order.
    OutOfOrderIteration,
    /// The view does not reserve the required padding past its content.
    InsufficientPadding,
    /// The document ended early.
    IncompleteArrayOrObject,
    /// A scalar document was treated as an array or object.
    ScalarDocumentAsValue,
    /// Attempted to access location outside of document.
    OutOfBounds,
    /// Unexpected trailing content after the root value.
    TrailingContent,
    /// The document is larger than the parser's allocated capacity.
    OutOfCapacity,
}

impl ErrorCode {
    /// Stable human readable description of the condition.
    pub const fn message(self) -> &'static str {
        match self {
            ErrorCode::Capacity => "This parser can't support a document that big",
            ErrorCode::MemAlloc => "Error allocating memory, we're most likely out of memory",
            ErrorCode::TapeError => {
                "The JSON document has an improper structure: missing or superfluous commas, braces, missing keys, etc."
            }
            ErrorCode::DepthError => {
                "The JSON document was too deep (too many nested objects and arrays)"
            }
            ErrorCode::StringError => "Problem while parsing a string",
            ErrorCode::TAtomError => {
                "Problem while parsing an atom starting with the letter 't'"
            }
            ErrorCode::FAtomError => {
                "Problem while parsing an atom starting with the letter 'f'"
            }
            ErrorCode::NAtomError => {
                "Problem while parsing an atom starting with the letter 'n'"
            }
            ErrorCode::NumberError => "Problem while parsing a number",
            ErrorCode::BigIntError => "Problem while parsing a big integer",
            ErrorCode::Utf8Error => "The input is not valid UTF-8",
            ErrorCode::Uninitialized => "Uninitialized",
            ErrorCode::Empty => "Empty: no JSON found",
            ErrorCode::UnescapedChars => {
                "Within strings, some characters must be escaped, we found unescaped characters"
            }
            ErrorCode::UnclosedString => "A string is opened, but never closed.",
            ErrorCode::UnsupportedArchitecture => {
                "The engine does not have an implementation supported by this CPU architecture"
            }
            ErrorCode::IncorrectType => {
                "The JSON element does not have the requested type."
            }
            ErrorCode::NumberOutOfRange => {
                "The JSON number is too large or too small to fit within the requested type."
            }
            ErrorCode::IndexOutOfBounds => {
                "Attempted to access an element of a JSON array that is beyond its length."
            }
            ErrorCode::NoSuchField => "The JSON field referenced does not exist in this object.",
            ErrorCode::IoError => "Error reading the file.",
            ErrorCode::InvalidJsonPointer => "Invalid JSON pointer syntax.",
            ErrorCode::InvalidUriFragment => "Invalid URI fragment syntax.",
            ErrorCode::UnexpectedError => {
                "Unexpected error, consider reporting this problem as you may have found a bug"
            }
            ErrorCode::ParserInUse => "Cannot parse a new document while a document is still in use.",
            ErrorCode::OutOfOrderIteration => {
                "Objects and arrays can only be iterated when they are first encountered."
            }
            ErrorCode::InsufficientPadding => {
                "The input does not have enough padding past its end for the parser."
            }
            ErrorCode::IncompleteArrayOrObject => {
                "JSON document ended early in the middle of an object or array."
            }
            ErrorCode::ScalarDocumentAsValue => {
                "A JSON document made of a scalar (number, Boolean, null or string) is treated as a value. Use get_bool(), get_double(), etc. on the document instead."
            }
            ErrorCode::OutOfBounds => "Attempted to access location outside of document.",
            ErrorCode::TrailingContent => "Unexpected trailing content in the JSON input.",
            ErrorCode::OutOfCapacity => {
                "The document is larger than the allocated capacity; call allocate() first."
            }
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_message() {
        assert_eq!(
            ErrorCode::NoSuchField.to_string(),
            "The JSON field referenced does not exist in this object."
        );
        assert_eq!(ErrorCode::Empty.to_string(), ErrorCode::Empty.message());
    }
}
