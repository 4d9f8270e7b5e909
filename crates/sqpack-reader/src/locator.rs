//! Packed data-file locators.

use std::fmt;

/// Byte alignment of every entry inside a data file.
pub const ENTRY_ALIGNMENT: u64 = 0x80;

/// Number of data files a locator can address with its three index bits.
pub const MAX_DATA_FILES: u32 = 8;

/// A `(data file, offset)` pair packed into 32 bits.
///
/// Bit 0 flags a hash synonym, bits 1..=3 select the data file and the
/// remaining bits hold the offset divided by [`ENTRY_ALIGNMENT`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct DataLocator(u32);

impl DataLocator {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Pack a data file index and an aligned byte offset.
    ///
    /// Returns `None` if the index needs more than three bits or the offset
    /// is unaligned or too large to encode.
    pub fn new(data_file_index: u32, offset: u64) -> Option<Self> {
        if data_file_index >= MAX_DATA_FILES || offset % ENTRY_ALIGNMENT != 0 {
            return None;
        }
        let packed = u32::try_from(offset / 8).ok()?;
        Some(Self(packed | (data_file_index << 1)))
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_synonym(self) -> bool {
        self.0 & 1 != 0
    }

    /// Zero-based index of the `.datN` file.
    #[inline]
    pub const fn data_file_index(self) -> u32 {
        (self.0 >> 1) & 0b111
    }

    /// Byte offset inside the data file.
    #[inline]
    pub const fn offset(self) -> u64 {
        (self.0 & !0xF) as u64 * 8
    }
}

impl fmt::Debug for DataLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dat{}:{:#x}", self.data_file_index(), self.offset())?;
        if self.is_synonym() {
            f.write_str(" (synonym)")?;
        }
        Ok(())
    }
}
