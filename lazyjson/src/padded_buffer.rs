// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::padding::padded_len;

/// An owned copy of JSON input followed by [`PADDING`](crate::PADDING) zero bytes.
///
/// Immutable once built. Clones share the same allocation, which is how views
/// and documents keep the bytes alive for as long as any of them needs them.
#[derive(Clone)]
pub struct PaddedBuffer {
    /// Content plus zeroed padding; `data.len() == len + PADDING`
    data: Rc<Vec<u8>>,
    len: usize,
}

impl PaddedBuffer {
    /// Copies `bytes` into a new padded allocation.
    pub fn new(bytes: &[u8]) -> Result<Self> {
        let total = padded_len(bytes.len())?;
        let mut data = Vec::with_capacity(total);
        data.extend_from_slice(bytes);
        data.resize(total, 0);
        Ok(Self {
            data: Rc::new(data),
            len: bytes.len(),
        })
    }

    /// Reads a whole file into a padded allocation.
    ///
    /// The buffer is sized from the file metadata up front so the read lands
    /// directly in its final allocation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::open(path).map_err(io_err)?;
        let hint = file
            .metadata()
            .map(|m| usize::try_from(m.len()).unwrap_or(usize::MAX))
            .map_err(io_err)?;
        let mut data = Vec::with_capacity(padded_len(hint)?);
        file.read_to_end(&mut data).map_err(io_err)?;
        let len = data.len();
        data.resize(padded_len(len)?, 0);
        log::debug!("padded_buffer: loaded {} bytes from {}", len, path.display());
        Ok(Self {
            data: Rc::new(data),
            len,
        })
    }

    /// Logical content, without the padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Logical length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the logical content is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Physically present bytes, padding included.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl core::fmt::Debug for PaddedBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaddedBuffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::padding::PADDING;
    use std::io::Write;

    #[test]
    fn new_appends_zeroed_padding() {
        let buffer = PaddedBuffer::new(b"[1,2]").unwrap();
        assert_eq!(buffer.as_bytes(), b"[1,2]");
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.capacity(), 5 + PADDING);
        assert!(buffer.data[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_input_still_padded() {
        let buffer = PaddedBuffer::new(b"").unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), PADDING);
    }

    #[test]
    fn load_reads_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"loaded": true}"#).unwrap();
        let buffer = PaddedBuffer::load(file.path()).unwrap();
        assert_eq!(buffer.as_bytes(), br#"{"loaded": true}"#);
        assert_eq!(buffer.capacity(), buffer.len() + PADDING);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        match PaddedBuffer::load(&missing) {
            Err(Error::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("Expected Io error, got: {:?}", other),
        }
    }
}
