//! Legacy `.index` parser: folder table plus per-folder file tables.

use std::path::Path;

use sqpack_common::{BinaryReader, Sha1Value};
use tracing::{debug, warn};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::coverage::{self, AccessLog};
use crate::file::map_read_only;
use crate::header::{verify_digest, IndexHeader, IndexType, SqpackHeader};
use crate::index::read_prelude;
use crate::locator::{DataLocator, MAX_DATA_FILES};
use crate::{Error, Result};

/// One row of the FolderSegment.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct FolderEntry {
    /// Hash of the folder path.
    pub name_hash: u32,
    /// Absolute offset of this folder's file table.
    pub file_segment_offset: u32,
    /// Byte size of this folder's file table.
    pub file_segment_size: u32,
    pub padding: u32,
}

impl FolderEntry {
    /// Number of [`FileEntry`] rows in this folder's table.
    #[inline]
    pub fn file_count(&self) -> usize {
        self.file_segment_size as usize / FileEntry::SIZE
    }
}

/// One row of a folder's file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct FileEntry {
    /// Hash of the file name.
    pub name_hash: u32,
    /// Hash of the folder path; equals the owning folder's `name_hash`.
    pub path_hash: u32,
    pub locator: u32,
    pub padding: u32,
}

impl FileEntry {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    #[inline]
    pub fn data_locator(&self) -> DataLocator {
        DataLocator::from_raw(self.locator)
    }
}

/// Where a folder's file table lives, which decides whether its rows are real.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderKind {
    /// Inside the FileSegment: rows describe real files.
    Real,
    /// Inside the DataFilesSegment: placeholder, rows are discarded.
    DataPlaceholder,
    /// Inside UnknownSegment3: placeholder, rows are discarded.
    ReservedPlaceholder,
    /// Inside none of the above.
    Stray,
}

impl FolderKind {
    /// Classify a folder by the segment its file table offset falls in.
    pub fn classify(folder: &FolderEntry, header: &IndexHeader) -> Self {
        let offset = u64::from(folder.file_segment_offset);
        if header.file_segment.contains(offset) {
            Self::Real
        } else if header.data_files_segment.contains(offset) {
            Self::DataPlaceholder
        } else if header.unknown_segment3.contains(offset) {
            Self::ReservedPlaceholder
        } else {
            Self::Stray
        }
    }

    #[inline]
    pub fn is_placeholder(self) -> bool {
        matches!(self, Self::DataPlaceholder | Self::ReservedPlaceholder)
    }
}

/// A folder together with the file rows retained for it.
#[derive(Debug, Clone)]
pub struct Folder {
    pub entry: FolderEntry,
    pub kind: FolderKind,
    /// Empty for placeholder folders.
    pub files: Vec<FileEntry>,
}

/// A parsed `.index` file.
#[derive(Debug, Clone)]
pub struct SqIndex {
    pub header: SqpackHeader,
    pub index_header: IndexHeader,
    /// Raw DataFilesSegment bytes.
    pub data_files_segment: Vec<u8>,
    /// Raw UnknownSegment3 bytes, kept opaque.
    pub segment3: Vec<u8>,
    /// Every folder in FolderSegment order.
    pub folders: Vec<Folder>,
    access_log: AccessLog,
}

impl SqIndex {
    /// Map and parse an `.index` file.
    pub fn open<P: AsRef<Path>>(path: P, strict: bool) -> Result<Self> {
        let mmap = map_read_only(path.as_ref())?;
        Self::parse(&mmap, strict)
    }

    /// Parse an `.index` file held in memory.
    ///
    /// With `strict` set, every segment hash is verified, real folders must
    /// tile the FileSegment in order and the whole file must be accounted for.
    pub fn parse(bytes: &[u8], strict: bool) -> Result<Self> {
        let mut log = AccessLog::new();
        let prelude = read_prelude(bytes, IndexType::Index, strict, &mut log)?;
        let index_header = prelude.index_header;

        let data_file_count = index_header.data_files_segment.count;
        if data_file_count > MAX_DATA_FILES {
            return Err(Error::MalformedHeader {
                header: "index",
                detail: format!(
                    "{data_file_count} data files declared, at most {MAX_DATA_FILES} addressable"
                ),
            });
        }

        if strict && prelude.folder_segment.len() % std::mem::size_of::<FolderEntry>() != 0 {
            return Err(Error::MalformedHeader {
                header: "index",
                detail: format!(
                    "FolderSegment size {:#x} is not a whole number of folders",
                    prelude.folder_segment.len()
                ),
            });
        }
        let folder_count = prelude.folder_segment.len() / std::mem::size_of::<FolderEntry>();
        let folder_entries: Vec<FolderEntry> =
            BinaryReader::new(prelude.folder_segment).read_structs(folder_count)?;

        let reader = BinaryReader::new(bytes);
        let file_segment = index_header.file_segment;
        let mut cursor = file_segment.start();
        let mut real_runs: Vec<&[u8]> = Vec::new();
        let mut folders = Vec::with_capacity(folder_entries.len());

        for entry in folder_entries {
            let name_hash = entry.name_hash;
            let offset = u64::from(entry.file_segment_offset);
            let size = u64::from(entry.file_segment_size);

            if strict && size % FileEntry::SIZE as u64 != 0 {
                return Err(Error::MalformedFolder {
                    folder: name_hash,
                    size: entry.file_segment_size,
                    entry_size: FileEntry::SIZE,
                });
            }

            let kind = FolderKind::classify(&entry, &index_header);
            let files = match kind {
                FolderKind::Real => {
                    let run = reader.slice_at(offset, size)?;
                    if strict {
                        coverage::advance(&mut cursor, offset, size)?;
                        log.record(offset, size);
                        real_runs.push(run);
                    }

                    let files = read_file_run(run)?;
                    if strict {
                        if let Some(file) = files.iter().find(|f| f.path_hash != name_hash) {
                            return Err(Error::FolderHashMismatch {
                                folder: name_hash,
                                path_hash: file.path_hash,
                            });
                        }
                    }
                    files
                }
                FolderKind::DataPlaceholder | FolderKind::ReservedPlaceholder => {
                    debug!(
                        folder = name_hash,
                        offset,
                        ?kind,
                        "skipping placeholder folder"
                    );
                    Vec::new()
                }
                FolderKind::Stray => {
                    if strict {
                        return Err(Error::StrayFolder {
                            folder: name_hash,
                            offset: entry.file_segment_offset,
                        });
                    }
                    warn!(folder = name_hash, offset, "folder table outside every segment");
                    read_file_run(reader.slice_at(offset, size)?)?
                }
            };

            folders.push(Folder { entry, kind, files });
        }

        if strict {
            let end = file_segment.end();
            if cursor < end {
                return Err(Error::UnreadRegion {
                    offset: cursor,
                    size: end - cursor,
                });
            }
            if cursor > end {
                return Err(Error::TrailingRegion {
                    offset: end,
                    size: cursor - end,
                });
            }

            let digest = Sha1Value::digest_parts(real_runs.iter().copied());
            verify_digest("FileSegment", &file_segment, digest)?;

            log.verify_tiles(bytes.len() as u64)?;
        }

        debug!(
            folders = folders.len(),
            files = folders.iter().map(|f| f.files.len()).sum::<usize>(),
            "parsed index"
        );

        Ok(Self {
            header: prelude.header,
            index_header,
            data_files_segment: prelude.data_files_segment.to_vec(),
            segment3: prelude.segment3.to_vec(),
            folders,
            access_log: log,
        })
    }

    /// Number of `.datN` files the archive declares.
    #[inline]
    pub fn data_file_count(&self) -> u32 {
        self.index_header.data_files_segment.count
    }

    /// Every retained file row, in folder order.
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> + '_ {
        self.folders.iter().flat_map(|folder| folder.files.iter())
    }

    /// Ranges read during a strict parse; empty otherwise.
    #[inline]
    pub fn access_log(&self) -> &AccessLog {
        &self.access_log
    }
}

fn read_file_run(run: &[u8]) -> Result<Vec<FileEntry>> {
    Ok(BinaryReader::new(run).read_structs(run.len() / FileEntry::SIZE)?)
}
