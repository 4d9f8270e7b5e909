//! `.index2` parser: one flat table keyed by full-path hash.

use std::path::Path;

use sqpack_common::BinaryReader;
use tracing::debug;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::coverage::AccessLog;
use crate::file::map_read_only;
use crate::header::{IndexHeader, IndexType, SqpackHeader};
use crate::index::{read_prelude, read_segment};
use crate::locator::DataLocator;
use crate::{Error, Result};

/// One row of the index2 FileSegment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct FileEntry2 {
    /// Hash of the complete lower-cased path.
    pub full_path_hash: u32,
    pub locator: u32,
}

impl FileEntry2 {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    #[inline]
    pub fn data_locator(&self) -> DataLocator {
        DataLocator::from_raw(self.locator)
    }
}

/// A parsed `.index2` file.
#[derive(Debug, Clone)]
pub struct SqIndex2 {
    pub header: SqpackHeader,
    pub index_header: IndexHeader,
    pub data_files_segment: Vec<u8>,
    pub segment3: Vec<u8>,
    /// Raw FolderSegment bytes; index2 does not use folders.
    pub folder_segment: Vec<u8>,
    pub files: Vec<FileEntry2>,
    access_log: AccessLog,
}

impl SqIndex2 {
    /// Map and parse an `.index2` file.
    pub fn open<P: AsRef<Path>>(path: P, strict: bool) -> Result<Self> {
        let mmap = map_read_only(path.as_ref())?;
        Self::parse(&mmap, strict)
    }

    /// Parse an `.index2` file held in memory.
    pub fn parse(bytes: &[u8], strict: bool) -> Result<Self> {
        let mut log = AccessLog::new();
        let prelude = read_prelude(bytes, IndexType::Index2, strict, &mut log)?;
        let index_header = prelude.index_header;

        let reader = BinaryReader::new(bytes);
        let file_segment = read_segment(
            &reader,
            "FileSegment",
            &index_header.file_segment,
            strict,
            &mut log,
        )?;
        if strict && file_segment.len() % FileEntry2::SIZE != 0 {
            return Err(Error::MalformedHeader {
                header: "index2",
                detail: format!(
                    "FileSegment size {:#x} is not a whole number of entries",
                    file_segment.len()
                ),
            });
        }
        let files: Vec<FileEntry2> =
            BinaryReader::new(file_segment).read_structs(file_segment.len() / FileEntry2::SIZE)?;

        if strict {
            log.verify_tiles(bytes.len() as u64)?;
        }

        debug!(files = files.len(), "parsed index2");

        Ok(Self {
            header: prelude.header,
            index_header,
            data_files_segment: prelude.data_files_segment.to_vec(),
            segment3: prelude.segment3.to_vec(),
            folder_segment: prelude.folder_segment.to_vec(),
            files,
            access_log: log,
        })
    }

    /// Number of `.datN` files the archive declares.
    #[inline]
    pub fn data_file_count(&self) -> u32 {
        self.index_header.data_files_segment.count
    }

    /// Ranges read during a strict parse; empty otherwise.
    #[inline]
    pub fn access_log(&self) -> &AccessLog {
        &self.access_log
    }
}
