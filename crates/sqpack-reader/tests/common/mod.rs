//! Builds small but well-formed SqPack archives for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sqpack_common::hash::PathHashes;
use sqpack_common::{FromZeros, Immutable, IntoBytes, Sha1Value};
use sqpack_reader::header::{
    DataHeader, IndexHeader, IndexType, SegmentDescriptor, SqpackHeader, SqpackKind,
    HASHED_HEADER_LEN, HEADER_BLOCK_SIZE,
};
use sqpack_reader::{DataLocator, FileEntry, FileEntry2, FolderEntry, FolderKind};

/// Both header blocks; segments and payloads start here.
pub const BODY_START: usize = 2 * HEADER_BLOCK_SIZE as usize;
pub const ALIGNMENT: usize = 0x80;
const OPAQUE_SEGMENT_LEN: usize = 0x100;

/// Offset of `index_type` inside a whole index file.
pub const INDEX_TYPE_OFFSET: usize = HEADER_BLOCK_SIZE as usize + 4 + 0x48 + 4 + 3 * 0x48 + 4;
/// Offset of `kind` inside a whole file.
pub const KIND_OFFSET: usize = 0x14;
/// Offset of the DataFilesSegment `count` inside a whole index file.
pub const DATA_FILE_COUNT_OFFSET: usize = Segment::DataFiles.descriptor_offset();

/// One of the four segments named by an index header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    File,
    DataFiles,
    Unknown3,
    Folder,
}

impl Segment {
    /// Offset of this segment's descriptor inside a whole index file.
    pub const fn descriptor_offset(self) -> usize {
        let within = match self {
            Self::File => 0,
            Self::DataFiles => 0x48 + 4,
            Self::Unknown3 => 2 * 0x48 + 4,
            Self::Folder => 3 * 0x48 + 4,
        };
        HEADER_BLOCK_SIZE as usize + 4 + within
    }

    /// Offset of the descriptor's stored SHA-1.
    pub const fn hash_offset(self) -> usize {
        self.descriptor_offset() + 12
    }

    /// Absolute offset of the segment's first byte, read back from `index`.
    pub fn start(self, index: &[u8]) -> usize {
        let at = self.descriptor_offset() + 4;
        u32::from_le_bytes(index[at..at + 4].try_into().unwrap()) as usize
    }
}

/// A change applied to one folder entry after layout.
#[derive(Debug, Clone, Copy)]
pub enum FolderEdit {
    /// Move the file table offset by a signed delta.
    Shift(i64),
    /// Point the file table at an absolute offset.
    MoveTo(u32),
    /// Declare a different file table size.
    Resize(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Both,
    LegacyOnly,
    Index2Only,
}

struct PendingFile {
    path: String,
    data_file: u32,
    payload: Vec<u8>,
    listing: Listing,
}

pub struct ArchiveBuilder {
    files: Vec<PendingFile>,
    data_files: u32,
    folder_edit: Option<(usize, FolderEdit)>,
    placeholder: Option<FolderKind>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            data_files: 1,
            folder_edit: None,
            placeholder: None,
        }
    }

    pub fn data_files(mut self, count: u32) -> Self {
        self.data_files = count;
        self
    }

    /// A file listed by both indexes.
    pub fn file(self, path: &str, data_file: u32, payload: &[u8]) -> Self {
        self.listed(path, data_file, payload, Listing::Both)
    }

    pub fn listed(mut self, path: &str, data_file: u32, payload: &[u8], listing: Listing) -> Self {
        self.files.push(PendingFile {
            path: path.to_string(),
            data_file,
            payload: payload.to_vec(),
            listing,
        });
        self
    }

    /// Move the file table offset of the folder at `position` (in folder
    /// table order) by `delta` bytes after layout.
    pub fn shift_folder(self, position: usize, delta: i64) -> Self {
        self.edit_folder(position, FolderEdit::Shift(delta))
    }

    pub fn edit_folder(mut self, position: usize, edit: FolderEdit) -> Self {
        self.folder_edit = Some((position, edit));
        self
    }

    /// Add a folder whose table points into the DataFilesSegment
    /// ([`FolderKind::DataPlaceholder`]) or UnknownSegment3
    /// ([`FolderKind::ReservedPlaceholder`]).
    pub fn placeholder_folder(mut self, kind: FolderKind) -> Self {
        self.placeholder = Some(kind);
        self
    }

    pub fn build(&self) -> BuiltArchive {
        let mut dats: Vec<Vec<u8>> = (0..self.data_files).map(|_| vec![0u8; BODY_START]).collect();
        let mut legacy_rows = Vec::new();
        let mut index2_rows = Vec::new();

        for file in &self.files {
            let offset = match dats.get_mut(file.data_file as usize) {
                Some(dat) => {
                    let offset = dat.len();
                    dat.extend_from_slice(&file.payload);
                    dat.resize(offset + padded_len(file.payload.len()), 0);
                    offset
                }
                None => BODY_START,
            };

            let locator = DataLocator::new(file.data_file, offset as u64)
                .expect("aligned offset and small data file index")
                .raw();
            let hashes = PathHashes::of(&file.path);
            if file.listing != Listing::Index2Only {
                legacy_rows.push(FileEntry {
                    name_hash: hashes.name_hash,
                    path_hash: hashes.path_hash,
                    locator,
                    padding: 0,
                });
            }
            if file.listing != Listing::LegacyOnly {
                index2_rows.push(FileEntry2 {
                    full_path_hash: hashes.full_path_hash,
                    locator,
                });
            }
        }

        index2_rows.sort_by_key(|row| row.full_path_hash);

        BuiltArchive {
            index: self.legacy_index(legacy_rows),
            index2: self.index_file(IndexType::Index2, index2_rows.as_bytes(), None),
            dats: dats
                .into_iter()
                .enumerate()
                .map(|(i, dat)| data_file(i as u32, dat))
                .collect(),
        }
    }

    fn legacy_index(&self, rows: Vec<FileEntry>) -> Vec<u8> {
        let mut by_folder: BTreeMap<u32, Vec<FileEntry>> = BTreeMap::new();
        for row in rows {
            by_folder.entry(row.path_hash).or_default().push(row);
        }

        let mut file_segment = Vec::new();
        let mut folders = Vec::new();
        for (folder_hash, mut files) in by_folder {
            files.sort_by_key(|file| file.name_hash);
            folders.push(FolderEntry {
                name_hash: folder_hash,
                file_segment_offset: (BODY_START + file_segment.len()) as u32,
                file_segment_size: (files.len() * FileEntry::SIZE) as u32,
                padding: 0,
            });
            file_segment.extend_from_slice(files.as_bytes());
        }

        if let Some((position, edit)) = self.folder_edit {
            let folder = &mut folders[position];
            match edit {
                FolderEdit::Shift(delta) => {
                    folder.file_segment_offset =
                        (i64::from(folder.file_segment_offset) + delta) as u32;
                }
                FolderEdit::MoveTo(offset) => folder.file_segment_offset = offset,
                FolderEdit::Resize(size) => folder.file_segment_size = size,
            }
        }

        if let Some(kind) = self.placeholder {
            // DataFilesSegment directly follows the FileSegment, then UnknownSegment3.
            let data_files_start = BODY_START + file_segment.len();
            let offset = match kind {
                FolderKind::DataPlaceholder => data_files_start,
                FolderKind::ReservedPlaceholder => data_files_start + OPAQUE_SEGMENT_LEN,
                other => panic!("{other:?} is not a placeholder kind"),
            };
            folders.push(FolderEntry {
                name_hash: 0xFFFF_0000,
                file_segment_offset: offset as u32,
                file_segment_size: FileEntry::SIZE as u32,
                padding: 0,
            });
        }

        let folder_segment = folders.as_bytes().to_vec();
        self.index_file(IndexType::Index, &file_segment, Some(&folder_segment))
    }

    fn index_file(
        &self,
        index_type: IndexType,
        file_segment: &[u8],
        folder_segment: Option<&[u8]>,
    ) -> Vec<u8> {
        let mut index_header = IndexHeader::new_zeroed();
        index_header.header_size = HEADER_BLOCK_SIZE;
        index_header.index_type = index_type as u32;

        let mut body = Vec::new();
        index_header.file_segment = append_segment(&mut body, 0, file_segment);
        index_header.data_files_segment =
            append_segment(&mut body, self.data_files, &[0u8; OPAQUE_SEGMENT_LEN]);
        index_header.unknown_segment3 = append_segment(&mut body, 0, &[0u8; OPAQUE_SEGMENT_LEN]);
        if let Some(folder_segment) = folder_segment {
            index_header.folder_segment = append_segment(&mut body, 0, folder_segment);
        }
        index_header.sha1 = self_hash(&index_header);

        let mut bytes = sqpack_header(SqpackKind::Index).as_bytes().to_vec();
        bytes.extend_from_slice(index_header.as_bytes());
        bytes.extend_from_slice(&body);
        bytes
    }
}

/// The files of one archive, ready to be tampered with and written out.
pub struct BuiltArchive {
    pub index: Vec<u8>,
    pub index2: Vec<u8>,
    pub dats: Vec<Vec<u8>>,
}

impl BuiltArchive {
    /// Write every file into `dir` and return the `.index` path.
    pub fn write(&self, dir: &Path) -> PathBuf {
        let base = dir.join("000000.win32.index");
        fs::write(&base, &self.index).unwrap();
        fs::write(base.with_extension("index2"), &self.index2).unwrap();
        for (i, dat) in self.dats.iter().enumerate() {
            fs::write(base.with_extension(format!("dat{i}")), dat).unwrap();
        }
        base
    }
}

/// Recompute the self-hash of the header block starting at `at`, so that a
/// patched field is only caught by the check it targets.
pub fn reseal_header(bytes: &mut [u8], at: usize) {
    let digest = Sha1Value::digest(&bytes[at..at + HASHED_HEADER_LEN]);
    bytes[at + HASHED_HEADER_LEN..at + HASHED_HEADER_LEN + 20].copy_from_slice(&digest.0);
}

pub fn padded_len(len: usize) -> usize {
    len.div_ceil(ALIGNMENT) * ALIGNMENT
}

fn append_segment(body: &mut Vec<u8>, count: u32, bytes: &[u8]) -> SegmentDescriptor {
    let mut descriptor = SegmentDescriptor::new_zeroed();
    descriptor.count = count;
    if bytes.is_empty() {
        return descriptor;
    }
    descriptor.offset = (BODY_START + body.len()) as u32;
    descriptor.size = bytes.len() as u32;
    descriptor.sha1 = Sha1Value::digest(bytes);
    body.extend_from_slice(bytes);
    descriptor
}

fn sqpack_header(kind: SqpackKind) -> SqpackHeader {
    let mut header = SqpackHeader::new_zeroed();
    header.signature = *SqpackHeader::SIGNATURE;
    header.header_size = HEADER_BLOCK_SIZE;
    header.version = 1;
    header.kind = kind as u32;
    header.sha1 = self_hash(&header);
    header
}

fn data_file(index: u32, mut bytes: Vec<u8>) -> Vec<u8> {
    let header = sqpack_header(SqpackKind::Data);

    let mut data_header = DataHeader::new_zeroed();
    data_header.header_size = HEADER_BLOCK_SIZE;
    data_header.data_size = (bytes.len() - BODY_START) as u64;
    data_header.span_index = index + 1;
    data_header.max_file_size = 2_000_000_000;
    data_header.data_sha1 = Sha1Value::digest(&bytes[BODY_START..]);
    data_header.sha1 = self_hash(&data_header);

    bytes[..BODY_START / 2].copy_from_slice(header.as_bytes());
    bytes[BODY_START / 2..BODY_START].copy_from_slice(data_header.as_bytes());
    bytes
}

fn self_hash<H: IntoBytes + Immutable>(header: &H) -> Sha1Value {
    Sha1Value::digest(&header.as_bytes()[..HASHED_HEADER_LEN])
}
