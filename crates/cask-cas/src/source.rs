//! The one ordered byte source the chunker consumes.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;

use bytes::Bytes;

/// An ordered byte stream with a declared total length.
///
/// The chunker needs the length up front to hold back its end-of-stream
/// reserve, so the kind of source is decided once at this boundary: an
/// in-memory buffer, or a reader paired with its declared length.
pub struct ByteSource {
    inner: Inner,
    len: u64,
}

enum Inner {
    Memory(Cursor<Bytes>),
    Reader(BufReader<Box<dyn Read + Send>>),
}

impl ByteSource {
    /// Source over an in-memory payload.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let len = data.len() as u64;
        Self {
            inner: Inner::Memory(Cursor::new(data)),
            len,
        }
    }

    /// Source over a reader with a declared length.
    ///
    /// The reader is trusted to yield exactly `len` bytes; the chunker
    /// verifies this at end of stream.
    pub fn from_reader(reader: impl Read + Send + 'static, len: u64) -> Self {
        Self {
            inner: Inner::Reader(BufReader::new(Box::new(reader))),
            len,
        }
    }

    /// Source over a file, with the length taken from its metadata.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self::from_reader(file, len))
    }

    /// Declared total length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the declared length is zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Read for ByteSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Memory(cursor) => cursor.read(buf),
            Inner::Reader(reader) => reader.read(buf),
        }
    }
}

impl From<Bytes> for ByteSource {
    fn from(data: Bytes) -> Self {
        Self::from_bytes(data)
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&[u8]> for ByteSource {
    fn from(data: &[u8]) -> Self {
        Self::from_bytes(Bytes::copy_from_slice(data))
    }
}
