//! Archive reader: opens every file of one archive and merges their tables.
//!
//! Open order:
//! - `.index2` (flat, authoritative for which payloads exist),
//! - `.index` (legacy rows attached to matching payloads, extra rows appended),
//! - `.dat0` .. `.datN` (sizes derived per data file).

use std::fmt;
use std::path::{Path, PathBuf};

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;
use sqpack_common::hash::PathHashes;
use tracing::info;

use crate::accessor::ByteRange;
use crate::data::SqData;
use crate::entry::ResolvedEntry;
use crate::index::{FileEntry, FileEntry2, SqIndex, SqIndex2};
use crate::{Error, Result};

type FxHashMap<K, V> = FastHashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Options controlling how an archive is opened.
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    strict: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl OpenOptions {
    /// Strict verification, the default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle hash and coverage verification.
    ///
    /// Without it the tables are still parsed, merged and sized, but no
    /// integrity is proven.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<SqpackReader> {
        SqpackReader::open_with(path, *self)
    }
}

/// A fully resolved SqPack archive.
///
/// Immutable after [`open`](Self::open); share it freely across threads.
pub struct SqpackReader {
    path: PathBuf,
    index: SqIndex,
    index2: SqIndex2,
    entries: Vec<ResolvedEntry>,
    data: Vec<SqData>,
    by_full_path: FxHashMap<u32, usize>,
    by_folder_and_name: FxHashMap<(u32, u32), usize>,
}

impl SqpackReader {
    /// Open the archive whose files share `path`'s stem.
    ///
    /// `path` may name any member (usually the `.index`); siblings are found
    /// by swapping the extension.
    pub fn open<P: AsRef<Path>>(path: P, strict: bool) -> Result<Self> {
        Self::open_with(path, OpenOptions::new().strict(strict))
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let strict = options.strict;

        let index2 = SqIndex2::open(path.with_extension("index2"), strict)?;
        let index = SqIndex::open(path.with_extension("index"), strict)?;

        let mut entries = merge_entries(&index2.files, index.files());

        let data_file_count = index.data_file_count();
        let mut data = Vec::with_capacity(data_file_count as usize);
        for i in 0..data_file_count {
            let dat_path = path.with_extension(format!("dat{i}"));
            data.push(SqData::open(dat_path, i, &mut entries, strict)?);
        }

        let (by_full_path, by_folder_and_name) = build_lookups(&entries);

        info!(
            path = %path.display(),
            entries = entries.len(),
            data_files = data.len(),
            strict,
            "opened archive"
        );

        Ok(Self {
            path,
            index,
            index2,
            entries,
            data,
            by_full_path,
            by_folder_and_name,
        })
    }

    /// Path the archive was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn index(&self) -> &SqIndex {
        &self.index
    }

    #[inline]
    pub fn index2(&self) -> &SqIndex2 {
        &self.index2
    }

    /// All merged entries: index2 order first, then legacy-only ones.
    #[inline]
    pub fn entries(&self) -> &[ResolvedEntry] {
        &self.entries
    }

    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&ResolvedEntry> {
        self.entries.get(index)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedEntry> + '_ {
        self.entries.iter()
    }

    #[inline]
    pub fn data_files(&self) -> &[SqData] {
        &self.data
    }

    /// Look an entry up by game path, e.g. `exd/root.exl`.
    ///
    /// Tries the index2 full-path hash first, then the legacy folder and
    /// name hash pair.
    pub fn find(&self, path: &str) -> Option<&ResolvedEntry> {
        let hashes = PathHashes::of(path);
        self.by_full_path
            .get(&hashes.full_path_hash)
            .or_else(|| {
                self.by_folder_and_name
                    .get(&(hashes.path_hash, hashes.name_hash))
            })
            .map(|&i| &self.entries[i])
    }

    /// The raw bytes of a reconciled entry.
    ///
    /// Fails with [`Error::UnknownSize`] if the entry never received a size,
    /// which happens when it names a data file the archive does not have.
    pub fn resolve(&self, entry: &ResolvedEntry) -> Result<ByteRange<'_>> {
        let data_file = entry.data_file_index();
        let offset = entry.offset();
        let unknown = || Error::UnknownSize { data_file, offset };

        let size = entry.size().ok_or_else(unknown)?;
        let data = self.data.get(data_file as usize).ok_or_else(unknown)?;

        let out_of_bounds = || Error::EntryOutOfBounds {
            data_file,
            offset,
            size,
            len: data.len(),
        };
        let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
        let end = offset
            .checked_add(size)
            .and_then(|end| usize::try_from(end).ok())
            .ok_or_else(out_of_bounds)?;
        let bytes = data.bytes().get(start..end).ok_or_else(out_of_bounds)?;

        Ok(ByteRange::new(data_file, offset, bytes))
    }
}

impl fmt::Debug for SqpackReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqpackReader")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .field("data_files", &self.data.len())
            .finish()
    }
}

/// Merge both index tables into one entry list.
///
/// Every index2 row becomes an entry. A legacy row whose locator matches an
/// index2 row is attached to that entry; any other legacy row is appended as
/// an entry of its own. The locator map holds positions, never references.
pub fn merge_entries<'a, I>(index2: &[FileEntry2], legacy: I) -> Vec<ResolvedEntry>
where
    I: IntoIterator<Item = &'a FileEntry>,
{
    let mut entries: Vec<ResolvedEntry> = Vec::with_capacity(index2.len());
    let mut by_locator: FxHashMap<u32, usize> = FxHashMap::default();

    for row in index2 {
        by_locator.entry(row.locator).or_insert(entries.len());
        entries.push(ResolvedEntry::from_index2(*row));
    }

    let mut legacy_only = Vec::new();
    for row in legacy {
        match by_locator.get(&{ row.locator }) {
            Some(&i) => entries[i].legacy = Some(*row),
            None => legacy_only.push(ResolvedEntry::from_legacy(*row)),
        }
    }
    entries.extend(legacy_only);

    entries
}

fn build_lookups(
    entries: &[ResolvedEntry],
) -> (FxHashMap<u32, usize>, FxHashMap<(u32, u32), usize>) {
    let mut by_full_path = FxHashMap::default();
    let mut by_folder_and_name = FxHashMap::default();

    for (i, entry) in entries.iter().enumerate() {
        if let Some(hash) = entry.full_path_hash() {
            by_full_path.entry(hash).or_insert(i);
        }
        if let (Some(folder), Some(name)) = (entry.path_hash(), entry.name_hash()) {
            by_folder_and_name.entry((folder, name)).or_insert(i);
        }
    }

    (by_full_path, by_folder_and_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row2(hash: u32, locator: u32) -> FileEntry2 {
        FileEntry2 {
            full_path_hash: hash,
            locator,
        }
    }

    fn row(folder: u32, name: u32, locator: u32) -> FileEntry {
        FileEntry {
            name_hash: name,
            path_hash: folder,
            locator,
            padding: 0,
        }
    }

    #[test]
    fn test_merge_attaches_and_appends() {
        let index2 = [row2(0xA, 0x100), row2(0xB, 0x110)];
        let legacy = [row(1, 2, 0x110), row(3, 4, 0x120)];

        let entries = merge_entries(&index2, legacy.iter());
        assert_eq!(entries.len(), 3);

        // index2 only
        assert_eq!(entries[0].full_path_hash(), Some(0xA));
        assert!(entries[0].legacy.is_none());

        // both
        assert_eq!(entries[1].full_path_hash(), Some(0xB));
        assert_eq!(entries[1].name_hash(), Some(2));
        assert_eq!(entries[1].offset(), 0x880);

        // legacy only
        assert!(entries[2].index2.is_none());
        assert_eq!(entries[2].path_hash(), Some(3));
        assert_eq!(entries[2].offset(), 0x900);
    }

    #[test]
    fn test_merge_keeps_legacy_duplicates() {
        let legacy = [row(1, 2, 0x200), row(1, 3, 0x200)];
        let entries = merge_entries(&[], legacy.iter());
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.index2.is_none()));
    }

    #[test]
    fn test_lookups_prefer_first_entry() {
        let index2 = [row2(0xA, 0x100), row2(0xA, 0x110)];
        let entries = merge_entries(&index2, std::iter::empty());
        let (by_full_path, by_folder_and_name) = build_lookups(&entries);
        assert_eq!(by_full_path.get(&0xA), Some(&0));
        assert!(by_folder_and_name.is_empty());
    }

    #[test]
    fn test_default_options_are_strict() {
        assert!(OpenOptions::new().is_strict());
        assert!(!OpenOptions::new().strict(false).is_strict());
    }

    #[test]
    fn test_missing_archive() {
        let err = SqpackReader::open("/nonexistent/000000.win32.index", true).unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
    }
}
