//! Byte-range access to a located payload.

use std::io::Cursor;

/// The raw bytes of one entry inside its data file.
///
/// Borrowed from the reader's mapping, so it cannot outlive the
/// [`SqpackReader`](crate::SqpackReader) that produced it. The bytes are
/// handed over exactly as stored; decoding them is the caller's job.
#[derive(Debug, Clone, Copy)]
pub struct ByteRange<'a> {
    data_file_index: u32,
    offset: u64,
    bytes: &'a [u8],
}

impl<'a> ByteRange<'a> {
    pub(crate) fn new(data_file_index: u32, offset: u64, bytes: &'a [u8]) -> Self {
        Self {
            data_file_index,
            offset,
            bytes,
        }
    }

    #[inline]
    pub fn data_file_index(&self) -> u32 {
        self.data_file_index
    }

    /// Offset of the first byte inside the data file.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// A seekable reader over the range, positioned at its start.
    pub fn reader(&self) -> Cursor<&'a [u8]> {
        Cursor::new(self.bytes)
    }
}

impl AsRef<[u8]> for ByteRange<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}
