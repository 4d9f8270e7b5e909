//! Bounds-checked reads over mapped SqPack files.
//!
//! SqPack files are fixed-layout tables addressed by absolute offsets, so
//! [`BinaryReader`] mixes a sequential cursor (headers, entry tables) with
//! absolute slicing (segments, folder runs).

use zerocopy::FromBytes;

use crate::{Error, Result};

/// A cursor over a byte slice that never reads past its end.
///
/// # Example
///
/// ```
/// use sqpack_common::BinaryReader;
///
/// let data = [0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// let pair: [u32; 2] = reader.read_struct().unwrap();
/// assert_eq!(pair, [1, 2]);
/// assert_eq!(reader.remaining(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// A reader whose cursor starts at `position`.
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Bytes left between the cursor and the end of the buffer.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Borrow `len` bytes at an absolute `offset` without moving the cursor.
    pub fn slice_at(&self, offset: u64, len: u64) -> Result<&'a [u8]> {
        let out_of_bounds = || Error::OutOfBounds {
            offset,
            len,
            available: self.data.len(),
        };
        let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
        let len = usize::try_from(len).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        self.data.get(start..end).ok_or_else(out_of_bounds)
    }

    /// Take the next `count` bytes and advance past them.
    pub fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if available < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available,
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read one little-endian on-disk record.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.take(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Read `count` consecutive records.
    pub fn read_structs<T: FromBytes>(&mut self, count: usize) -> Result<Vec<T>> {
        let size = std::mem::size_of::<T>();
        let needed = size.checked_mul(count).ok_or(Error::UnexpectedEof {
            needed: usize::MAX,
            available: self.remaining(),
        })?;
        let bytes = self.take(needed)?;

        bytes
            .chunks_exact(size)
            .map(|chunk| {
                T::read_from_bytes(chunk).map_err(|_| Error::UnexpectedEof {
                    needed: size,
                    available: chunk.len(),
                })
            })
            .collect()
    }
}
