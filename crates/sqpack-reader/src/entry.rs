//! Merged file-table entries.

use std::ops::Range;

use crate::index::{FileEntry, FileEntry2};
use crate::locator::DataLocator;

/// One payload in the archive, as seen by either or both index files.
///
/// The size is not stored on disk; it becomes known once the owning data
/// file has been reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// Row from the legacy `.index`, if it lists this payload.
    pub legacy: Option<FileEntry>,
    /// Row from `.index2`, if it lists this payload.
    pub index2: Option<FileEntry2>,
    data_file_index: u32,
    offset: u64,
    size: Option<u64>,
}

impl ResolvedEntry {
    pub(crate) fn from_index2(entry: FileEntry2) -> Self {
        let mut resolved = Self::unlocated(entry.data_locator());
        resolved.index2 = Some(entry);
        resolved
    }

    pub(crate) fn from_legacy(entry: FileEntry) -> Self {
        let mut resolved = Self::unlocated(entry.data_locator());
        resolved.legacy = Some(entry);
        resolved
    }

    fn unlocated(locator: DataLocator) -> Self {
        Self::at(locator.data_file_index(), locator.offset())
    }

    /// An entry with no index rows attached, placed at an arbitrary offset.
    pub(crate) fn at(data_file_index: u32, offset: u64) -> Self {
        Self {
            legacy: None,
            index2: None,
            data_file_index,
            offset,
            size: None,
        }
    }

    /// Zero-based index of the `.datN` file holding the payload.
    #[inline]
    pub fn data_file_index(&self) -> u32 {
        self.data_file_index
    }

    /// Byte offset of the payload inside its data file.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Payload size, or `None` if the data file was never reconciled.
    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    pub(crate) fn set_size(&mut self, size: u64) {
        self.size = Some(size);
    }

    /// `[offset, offset + size)` once the size is known.
    pub fn range(&self) -> Option<Range<u64>> {
        self.size.map(|size| self.offset..self.offset + size)
    }

    /// Folder hash from the legacy index.
    pub fn path_hash(&self) -> Option<u32> {
        self.legacy.map(|entry| entry.path_hash)
    }

    /// File name hash from the legacy index.
    pub fn name_hash(&self) -> Option<u32> {
        self.legacy.map(|entry| entry.name_hash)
    }

    /// Full path hash from index2.
    pub fn full_path_hash(&self) -> Option<u32> {
        self.index2.map(|entry| entry.full_path_hash)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ResolvedEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("ResolvedEntry", 6)?;
        state.serialize_field("path_hash", &self.path_hash())?;
        state.serialize_field("name_hash", &self.name_hash())?;
        state.serialize_field("full_path_hash", &self.full_path_hash())?;
        state.serialize_field("data_file", &self.data_file_index)?;
        state.serialize_field("offset", &self.offset)?;
        state.serialize_field("size", &self.size)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_fields() {
        let locator = (0x1000 / 8) | (1 << 1);
        let mut entry = ResolvedEntry::from_index2(FileEntry2 {
            full_path_hash: 0xAAAA_AAAA,
            locator,
        });
        assert_eq!(entry.data_file_index(), 1);
        assert_eq!(entry.offset(), 0x1000);
        assert_eq!(entry.full_path_hash(), Some(0xAAAA_AAAA));
        assert_eq!(entry.path_hash(), None);
        assert_eq!(entry.size(), None);
        assert_eq!(entry.range(), None);

        entry.set_size(0x80);
        assert_eq!(entry.range(), Some(0x1000..0x1080));
    }

    #[test]
    fn test_legacy_only() {
        let entry = ResolvedEntry::from_legacy(FileEntry {
            name_hash: 1,
            path_hash: 2,
            locator: 0x100,
            padding: 0,
        });
        assert_eq!(entry.name_hash(), Some(1));
        assert_eq!(entry.path_hash(), Some(2));
        assert_eq!(entry.full_path_hash(), None);
        assert_eq!(entry.offset(), 0x800);
    }
}
