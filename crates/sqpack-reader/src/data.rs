//! `.datN` data files and payload size reconciliation.
//!
//! Index rows only store where a payload starts. Its size is the distance
//! to the next payload in the same data file, or to the end of the file for
//! the last one.

use std::fmt;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::entry::ResolvedEntry;
use crate::file::map_read_only;
use crate::header::{
    parse_data_header, parse_header, verify_header_hash, verify_kind, DataHeader, SqpackHeader,
    SqpackKind,
};
use crate::{Error, Result};

/// An open, memory-mapped `.datN` file.
pub struct SqData {
    pub header: SqpackHeader,
    pub data_header: DataHeader,
    index: u32,
    mmap: Mmap,
}

impl SqData {
    /// Map a data file, check its headers and assign sizes to every entry
    /// in `entries` that points into it.
    pub fn open<P: AsRef<Path>>(
        path: P,
        index: u32,
        entries: &mut [ResolvedEntry],
        strict: bool,
    ) -> Result<Self> {
        let mmap = map_read_only(path.as_ref())?;
        let (header, data_header) = read_headers(&mmap, index, strict)?;

        reconcile_sizes(entries, index, mmap.len() as u64)?;
        debug!(index, len = mmap.len(), "opened data file");

        Ok(Self {
            header,
            data_header,
            index,
            mmap,
        })
    }

    /// Zero-based position among the archive's data files.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// The whole mapped file.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }
}

impl fmt::Debug for SqData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqData")
            .field("index", &self.index)
            .field("len", &self.mmap.len())
            .finish()
    }
}

/// Parse and check the two headers of data file number `index`.
///
/// Only `.dat0` has its type tag checked. In strict mode the header hashes,
/// the span index and the total file length are verified as well.
pub(crate) fn read_headers(bytes: &[u8], index: u32, strict: bool) -> Result<(SqpackHeader, DataHeader)> {
    let header = parse_header(bytes)?;
    if index == 0 {
        verify_kind(&header, SqpackKind::Data)?;
    }
    let header_size = header.header_size;
    let data_header = parse_data_header(bytes, header_size)?;

    if strict {
        verify_header_hash("SqPack header", &header, header.sha1)?;
        verify_header_hash("data header", &data_header, data_header.sha1)?;

        let span_index = data_header.span_index;
        if span_index != index + 1 {
            return Err(Error::MalformedHeader {
                header: "data",
                detail: format!("span index {span_index}, expected {}", index + 1),
            });
        }

        let data_size = data_header.data_size;
        let expected = u64::from(header_size)
            .checked_add(u64::from(data_header.header_size))
            .and_then(|headers| headers.checked_add(data_size))
            .ok_or_else(|| Error::MalformedHeader {
                header: "data",
                detail: format!("declared data size {data_size:#x} overflows the file length"),
            })?;
        let actual = bytes.len() as u64;
        if actual != expected {
            return Err(Error::SizeMismatch {
                data_file: index,
                expected,
                actual,
            });
        }
    }

    Ok((header, data_header))
}

/// Give every entry of data file `data_file_index` the size of the gap up to
/// the next distinct offset, the last one extending to `file_length`.
///
/// Entries sharing an offset share a size. Entries of other data files are
/// left untouched.
pub fn reconcile_sizes(
    entries: &mut [ResolvedEntry],
    data_file_index: u32,
    file_length: u64,
) -> Result<()> {
    let mut members: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.data_file_index() == data_file_index)
        .map(|(i, _)| i)
        .collect();
    members.sort_by_key(|&i| entries[i].offset());

    let mut start = 0;
    while start < members.len() {
        let offset = entries[members[start]].offset();
        let group_end = members[start..]
            .iter()
            .position(|&i| entries[i].offset() != offset)
            .map_or(members.len(), |n| start + n);
        let next = members
            .get(group_end)
            .map_or(file_length, |&i| entries[i].offset());

        if offset > next {
            return Err(Error::EntryOutOfBounds {
                data_file: data_file_index,
                offset,
                size: 0,
                len: file_length,
            });
        }
        for &i in &members[start..group_end] {
            entries[i].set_size(next - offset);
        }
        start = group_end;
    }

    Ok(())
}
