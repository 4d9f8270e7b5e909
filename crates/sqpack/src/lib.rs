//! SqPack - game archive reading and verification library.
//!
//! This crate provides a unified interface to the SqPack crates.
//!
//! # Crates
//!
//! - [`sqpack_common`] - Common utilities (binary reading, SHA-1, path hashes)
//! - [`sqpack_reader`] - Index/index2/data parsing, verification and merging
//!
//! # Example
//!
//! ```no_run
//! use sqpack::prelude::*;
//!
//! // Open and fully verify an archive
//! let archive = SqpackReader::open("sqpack/ffxiv/000000.win32.index", true)?;
//!
//! for entry in archive.iter() {
//!     let range = archive.resolve(entry)?;
//!     println!("dat{} {:#x} {}", range.data_file_index(), range.offset(), range.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use sqpack_common as common;
pub use sqpack_reader as reader;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sqpack_common::hash::PathHashes;
    pub use sqpack_common::Sha1Value;
    pub use sqpack_reader::{
        ByteRange, DataLocator, FolderKind, OpenOptions, ResolvedEntry, SqIndex, SqIndex2,
        SqpackReader,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
