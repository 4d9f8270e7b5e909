//! Error types for the SqPack reader.

use std::path::PathBuf;

use sqpack_common::Sha1Value;
use thiserror::Error;

/// Errors that can occur when opening or reading a SqPack archive.
///
/// Every variant is fatal to [`SqpackReader::open`](crate::SqpackReader::open);
/// nothing is retried or recovered internally.
#[derive(Debug, Error)]
pub enum Error {
    /// A file belonging to the archive could not be opened or mapped.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Common library error.
    #[error("{0}")]
    Common(#[from] sqpack_common::Error),

    /// Signature or declared size of a header is invalid.
    #[error("malformed {header} header: {detail}")]
    MalformedHeader { header: &'static str, detail: String },

    /// A header's type tag names a different kind of file.
    #[error("wrong archive kind: expected {expected}, got type tag {actual}")]
    WrongArchiveKind { expected: &'static str, actual: u32 },

    /// Recomputed SHA-1 of a region disagrees with the stored hash.
    #[error("{region} SHA-1 mismatch: stored {expected}, computed {actual}")]
    ChecksumMismatch {
        region: &'static str,
        expected: Sha1Value,
        actual: Sha1Value,
    },

    /// A file entry's folder hash disagrees with the folder that owns it.
    #[error("file entry path hash {path_hash:#010x} does not match folder {folder:#010x}")]
    FolderHashMismatch { folder: u32, path_hash: u32 },

    /// A folder's file-segment size is not a whole number of entries.
    #[error("folder {folder:#010x} declares {size} bytes of file entries, not a multiple of {entry_size}")]
    MalformedFolder {
        folder: u32,
        size: u32,
        entry_size: usize,
    },

    /// A folder's file-segment run lies outside every known segment.
    #[error("folder {folder:#010x} points at offset {offset:#x} outside every index segment")]
    StrayFolder { folder: u32, offset: u32 },

    /// Bytes were skipped over between two recorded reads.
    #[error("unread region of {size:#x} bytes at {offset:#x}")]
    UnreadRegion { offset: u64, size: u64 },

    /// Two recorded reads cover the same bytes.
    #[error("overlapping region of {size:#x} bytes at {offset:#x}")]
    OverlappingRegion { offset: u64, size: u64 },

    /// Bytes remain past the last recorded read.
    #[error("trailing region of {size:#x} bytes at {offset:#x}")]
    TrailingRegion { offset: u64, size: u64 },

    /// A data file's length disagrees with its headers.
    #[error("data file {data_file} is {actual} bytes, headers declare {expected}")]
    SizeMismatch {
        data_file: u32,
        expected: u64,
        actual: u64,
    },

    /// A byte range was requested for an entry that never received a size.
    #[error("entry at data file {data_file}, offset {offset:#x} has no resolved size")]
    UnknownSize { data_file: u32, offset: u64 },

    /// A resolved byte range does not fit inside its data file.
    #[error("entry {offset:#x}+{size:#x} exceeds data file {data_file} of {len:#x} bytes")]
    EntryOutOfBounds {
        data_file: u32,
        offset: u64,
        size: u64,
        len: u64,
    },
}

/// Result type for SqPack operations.
pub type Result<T> = std::result::Result<T, Error>;
