//! Index file parsers.
//!
//! `.index` and `.index2` share the same header and segment table; they
//! differ only in how the FileSegment is laid out.

mod legacy;
mod split;

pub use legacy::{FileEntry, Folder, FolderEntry, FolderKind, SqIndex};
pub use split::{FileEntry2, SqIndex2};

use sqpack_common::BinaryReader;
use tracing::debug;

use crate::coverage::AccessLog;
use crate::header::{
    parse_header, parse_index_header, verify_header_hash, verify_index_type, verify_kind,
    verify_segment, IndexHeader, IndexType, SegmentDescriptor, SqpackHeader, SqpackKind,
};
use crate::Result;

/// Headers and raw segment bytes common to both index flavours.
pub(crate) struct IndexPrelude<'a> {
    pub header: SqpackHeader,
    pub index_header: IndexHeader,
    pub data_files_segment: &'a [u8],
    pub segment3: &'a [u8],
    pub folder_segment: &'a [u8],
}

/// Read both headers and the three segments that precede file parsing.
///
/// In strict mode every read is recorded in `log` and every hash is checked.
pub(crate) fn read_prelude<'a>(
    bytes: &'a [u8],
    expected: IndexType,
    strict: bool,
    log: &mut AccessLog,
) -> Result<IndexPrelude<'a>> {
    let header = parse_header(bytes)?;
    verify_kind(&header, SqpackKind::Index)?;
    let header_size = header.header_size;
    if strict {
        verify_header_hash("SqPack header", &header, header.sha1)?;
        log.record(0, u64::from(header_size));
    }

    let index_header = parse_index_header(bytes, header_size)?;
    verify_index_type(&index_header, expected)?;
    if strict {
        verify_header_hash("index header", &index_header, index_header.sha1)?;
        log.record(u64::from(header_size), u64::from(index_header.header_size));
    }

    let reader = BinaryReader::new(bytes);
    let data_files_segment = read_segment(
        &reader,
        "DataFilesSegment",
        &index_header.data_files_segment,
        strict,
        log,
    )?;
    let segment3 = read_segment(
        &reader,
        "UnknownSegment3",
        &index_header.unknown_segment3,
        strict,
        log,
    )?;
    let folder_segment = read_segment(
        &reader,
        "FolderSegment",
        &index_header.folder_segment,
        strict,
        log,
    )?;

    Ok(IndexPrelude {
        header,
        index_header,
        data_files_segment,
        segment3,
        folder_segment,
    })
}

/// Borrow a whole segment, verifying and recording it in strict mode.
pub(crate) fn read_segment<'a>(
    reader: &BinaryReader<'a>,
    region: &'static str,
    descriptor: &SegmentDescriptor,
    strict: bool,
    log: &mut AccessLog,
) -> Result<&'a [u8]> {
    let bytes = reader.slice_at(descriptor.start(), descriptor.len())?;
    if strict {
        verify_segment(region, descriptor, bytes)?;
        log.record(descriptor.start(), descriptor.len());
    }
    debug!(
        region,
        offset = descriptor.start(),
        size = descriptor.len(),
        "read index segment"
    );
    Ok(bytes)
}
