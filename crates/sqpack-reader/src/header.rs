//! Fixed-layout headers shared by index and data files.
//!
//! Every SqPack file starts with a 0x400-byte [`SqpackHeader`]. Index files
//! follow it with an [`IndexHeader`] describing four segments; data files
//! follow it with a [`DataHeader`]. Each header carries a SHA-1 of its own
//! first 0x3C0 bytes.

use sqpack_common::{BinaryReader, IntoBytes, Sha1Value};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::{Error, Result};

/// Number of leading header bytes covered by a header's own SHA-1.
pub const HASHED_HEADER_LEN: usize = 0x3C0;

/// Size of every fixed header block.
pub const HEADER_BLOCK_SIZE: u32 = 0x400;

/// File type tag in [`SqpackHeader::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SqpackKind {
    Database = 0,
    Data = 1,
    Index = 2,
}

impl SqpackKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Data => "data",
            Self::Index => "index",
        }
    }
}

/// Index flavour tag in [`IndexHeader::index_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum IndexType {
    /// Folder/file hash pair tables (`.index`).
    Index = 1,
    /// Flat full-path hash table (`.index2`).
    Index2 = 2,
}

impl IndexType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Index2 => "index2",
        }
    }
}

/// Common header at offset 0 of every SqPack file.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct SqpackHeader {
    /// `"SqPack"` followed by six NULs.
    pub signature: [u8; 12],
    /// Declared header size, always 0x400.
    pub header_size: u32,
    pub version: u32,
    /// See [`SqpackKind`].
    pub kind: u32,
    pub build_date: u32,
    pub build_time: u32,
    pub region: u32,
    pub padding0: [u8; 0x39C],
    /// SHA-1 of the first 0x3C0 bytes.
    pub sha1: Sha1Value,
    pub padding1: [u8; 0x2C],
}

impl SqpackHeader {
    pub const SIGNATURE: &'static [u8; 12] = b"SqPack\0\0\0\0\0\0";
}

/// Location and hash of one index segment.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct SegmentDescriptor {
    /// Segment-specific count; the number of data files for DataFilesSegment.
    pub count: u32,
    pub offset: u32,
    pub size: u32,
    pub sha1: Sha1Value,
    pub padding: [u8; 0x28],
}

impl SegmentDescriptor {
    /// Absolute offset of the first byte.
    #[inline]
    pub fn start(&self) -> u64 {
        u64::from(self.offset)
    }

    /// Absolute offset one past the last byte.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start() + self.len()
    }

    #[inline]
    pub fn len(&self) -> u64 {
        u64::from(self.size)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Whether `offset` falls inside `[start, end)`.
    #[inline]
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start() && offset < self.end()
    }

    /// A descriptor with zero size and a zero hash carries no data.
    #[inline]
    pub fn is_absent(&self) -> bool {
        self.is_empty() && self.sha1.is_zero()
    }
}

/// Segment table following the [`SqpackHeader`] of `.index` and `.index2`.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct IndexHeader {
    pub header_size: u32,
    pub file_segment: SegmentDescriptor,
    pub padding0: [u8; 4],
    pub data_files_segment: SegmentDescriptor,
    pub unknown_segment3: SegmentDescriptor,
    pub folder_segment: SegmentDescriptor,
    pub padding1: [u8; 4],
    /// See [`IndexType`].
    pub index_type: u32,
    pub padding2: [u8; 0x290],
    pub sha1: Sha1Value,
    pub padding3: [u8; 0x2C],
}

/// Header following the [`SqpackHeader`] of every `.datN`.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DataHeader {
    pub header_size: u32,
    pub null1: u32,
    pub unknown1: u32,
    pub padding0: [u8; 4],
    /// Payload bytes following both headers.
    pub data_size: u64,
    /// One-based: `.dat0` stores 1.
    pub span_index: u32,
    pub null2: u32,
    pub max_file_size: u64,
    pub data_sha1: Sha1Value,
    pub padding1: [u8; 0x384],
    pub sha1: Sha1Value,
    pub padding2: [u8; 0x2C],
}

const _: () = assert!(std::mem::size_of::<SqpackHeader>() == HEADER_BLOCK_SIZE as usize);
const _: () = assert!(std::mem::size_of::<SegmentDescriptor>() == 0x48);
const _: () = assert!(std::mem::size_of::<IndexHeader>() == HEADER_BLOCK_SIZE as usize);
const _: () = assert!(std::mem::size_of::<DataHeader>() == HEADER_BLOCK_SIZE as usize);

/// Parse the common header at the start of `bytes`.
///
/// Fails with [`Error::MalformedHeader`] if the signature is wrong or the
/// declared header size is not 0x400.
pub fn parse_header(bytes: &[u8]) -> Result<SqpackHeader> {
    let header: SqpackHeader = BinaryReader::new(bytes).read_struct()?;

    if &header.signature != SqpackHeader::SIGNATURE {
        return Err(Error::MalformedHeader {
            header: "SqPack",
            detail: format!("bad signature {:02x?}", header.signature),
        });
    }

    let header_size = header.header_size;
    if header_size != HEADER_BLOCK_SIZE {
        return Err(Error::MalformedHeader {
            header: "SqPack",
            detail: format!("declared size {header_size:#x}, expected {HEADER_BLOCK_SIZE:#x}"),
        });
    }

    Ok(header)
}

/// Parse the index header located right after the common header.
pub fn parse_index_header(bytes: &[u8], offset: u32) -> Result<IndexHeader> {
    let header: IndexHeader = BinaryReader::new_at(bytes, offset as usize).read_struct()?;

    let header_size = header.header_size;
    if header_size != HEADER_BLOCK_SIZE {
        return Err(Error::MalformedHeader {
            header: "index",
            detail: format!("declared size {header_size:#x}, expected {HEADER_BLOCK_SIZE:#x}"),
        });
    }

    Ok(header)
}

/// Parse the data header located right after the common header.
pub fn parse_data_header(bytes: &[u8], offset: u32) -> Result<DataHeader> {
    let header: DataHeader = BinaryReader::new_at(bytes, offset as usize).read_struct()?;

    let header_size = header.header_size;
    if header_size != HEADER_BLOCK_SIZE {
        return Err(Error::MalformedHeader {
            header: "data",
            detail: format!("declared size {header_size:#x}, expected {HEADER_BLOCK_SIZE:#x}"),
        });
    }

    Ok(header)
}

/// Check the common header's type tag.
pub fn verify_kind(header: &SqpackHeader, expected: SqpackKind) -> Result<()> {
    let actual = header.kind;
    if actual != expected as u32 {
        return Err(Error::WrongArchiveKind {
            expected: expected.name(),
            actual,
        });
    }
    Ok(())
}

/// Check the index header's flavour tag.
pub fn verify_index_type(header: &IndexHeader, expected: IndexType) -> Result<()> {
    let actual = header.index_type;
    if actual != expected as u32 {
        return Err(Error::WrongArchiveKind {
            expected: expected.name(),
            actual,
        });
    }
    Ok(())
}

/// Recompute the hash over `bytes` and compare it to the descriptor.
///
/// An absent descriptor (zero size, zero hash) always passes.
pub fn verify_segment(region: &'static str, descriptor: &SegmentDescriptor, bytes: &[u8]) -> Result<()> {
    verify_digest(region, descriptor, Sha1Value::digest(bytes))
}

/// Compare an already computed digest against the descriptor's hash.
pub fn verify_digest(region: &'static str, descriptor: &SegmentDescriptor, actual: Sha1Value) -> Result<()> {
    if descriptor.is_absent() {
        return Ok(());
    }
    check_digest(region, descriptor.sha1, actual)
}

/// Verify the SHA-1 a header stores over its own leading bytes.
pub fn verify_header_hash<H: IntoBytes + Immutable>(region: &'static str, header: &H, stored: Sha1Value) -> Result<()> {
    let bytes = header.as_bytes();
    let hashed = &bytes[..HASHED_HEADER_LEN.min(bytes.len())];
    check_digest(region, stored, Sha1Value::digest(hashed))
}

fn check_digest(region: &'static str, expected: Sha1Value, actual: Sha1Value) -> Result<()> {
    if expected != actual {
        return Err(Error::ChecksumMismatch {
            region,
            expected,
            actual,
        });
    }
    Ok(())
}
