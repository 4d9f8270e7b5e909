//! Read-only file mapping.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::{Error, Result};

/// Map a whole file read-only.
///
/// The file is opened for shared reading, so several readers (or the game
/// itself) may hold the same archive open at once.
pub(crate) fn map_read_only(path: &Path) -> Result<Mmap> {
    let open_error = |source| Error::Open {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(open_error)?;
    // SAFETY: the mapping is read-only and archives are not modified while open.
    let mmap = unsafe { Mmap::map(&file) }.map_err(open_error)?;
    #[cfg(unix)]
    let _ = mmap.advise(memmap2::Advice::Sequential);

    Ok(mmap)
}
