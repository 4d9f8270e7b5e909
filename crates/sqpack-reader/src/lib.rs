//! SqPack archive reader.
//!
//! A SqPack archive is a set of sibling files sharing one stem:
//!
//! - `.index` - folder table plus per-folder file tables (folder and name hashes)
//! - `.index2` - one flat file table keyed by full-path hash
//! - `.dat0` .. `.datN` - payload bytes
//!
//! Neither index stores payload sizes. [`SqpackReader`] merges both tables
//! into one list of [`ResolvedEntry`] values and sizes each entry by the gap
//! to the next payload in the same data file.
//!
//! In strict mode every header and segment hash is verified, and each index
//! file must be read exhaustively: the ranges touched while parsing have to
//! tile the file exactly.
//!
//! # Example
//!
//! ```no_run
//! use sqpack_reader::SqpackReader;
//!
//! let archive = SqpackReader::open("sqpack/ffxiv/0a0000.win32.index", true)?;
//!
//! if let Some(entry) = archive.find("exd/root.exl") {
//!     let range = archive.resolve(entry)?;
//!     println!("{} raw bytes at {:#x}", range.len(), range.offset());
//! }
//! # Ok::<(), sqpack_reader::Error>(())
//! ```

mod accessor;
mod coverage;
mod data;
mod entry;
mod error;
mod file;
mod reader;

pub mod header;
pub mod index;
pub mod locator;

pub use accessor::ByteRange;
pub use coverage::AccessLog;
pub use data::{reconcile_sizes, SqData};
pub use entry::ResolvedEntry;
pub use error::{Error, Result};
pub use index::{FileEntry, FileEntry2, Folder, FolderEntry, FolderKind, SqIndex, SqIndex2};
pub use locator::DataLocator;
pub use reader::{merge_entries, OpenOptions, SqpackReader};
