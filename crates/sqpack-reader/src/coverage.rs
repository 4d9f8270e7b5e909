//! Byte-range accounting for exhaustive index verification.

use crate::{Error, Result};

/// A record of every byte range a parser consumed from one file.
///
/// In strict mode the recorded ranges must tile `[0, file_length)` exactly.
#[derive(Debug, Clone, Default)]
pub struct AccessLog {
    ranges: Vec<(u64, u64)>,
}

impl AccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read of `size` bytes at `offset`. Empty reads are ignored.
    pub fn record(&mut self, offset: u64, size: u64) {
        if size != 0 {
            self.ranges.push((offset, size));
        }
    }

    /// Recorded `(offset, size)` pairs, sorted by offset.
    pub fn ranges(&self) -> Vec<(u64, u64)> {
        let mut ranges = self.ranges.clone();
        ranges.sort_unstable();
        ranges
    }

    /// Check that the recorded ranges tile `[0, file_length)` with no gap,
    /// no overlap and nothing left over.
    pub fn verify_tiles(&self, file_length: u64) -> Result<()> {
        let mut cursor = 0u64;
        for (offset, size) in self.ranges() {
            advance(&mut cursor, offset, size)?;
        }

        match cursor.cmp(&file_length) {
            std::cmp::Ordering::Equal => Ok(()),
            std::cmp::Ordering::Less => Err(Error::TrailingRegion {
                offset: cursor,
                size: file_length - cursor,
            }),
            std::cmp::Ordering::Greater => Err(Error::OverlappingRegion {
                offset: file_length,
                size: cursor - file_length,
            }),
        }
    }
}

/// Move `cursor` past a range that must start exactly at it.
pub(crate) fn advance(cursor: &mut u64, offset: u64, size: u64) -> Result<()> {
    if offset > *cursor {
        return Err(Error::UnreadRegion {
            offset: *cursor,
            size: offset - *cursor,
        });
    }
    if offset < *cursor {
        return Err(Error::OverlappingRegion {
            offset,
            size: *cursor - offset,
        });
    }
    *cursor = offset + size;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_tiling() {
        let mut log = AccessLog::new();
        log.record(0x400, 0x400);
        log.record(0, 0x400);
        log.record(0x800, 0x10);
        assert!(log.verify_tiles(0x810).is_ok());
        assert_eq!(log.ranges(), vec![(0, 0x400), (0x400, 0x400), (0x800, 0x10)]);
    }

    #[test]
    fn test_gap_is_unread() {
        let mut log = AccessLog::new();
        log.record(0, 0x10);
        log.record(0x14, 0x10);
        assert!(matches!(
            log.verify_tiles(0x24),
            Err(Error::UnreadRegion { offset: 0x10, size: 4 })
        ));
    }

    #[test]
    fn test_overlap() {
        let mut log = AccessLog::new();
        log.record(0, 0x10);
        log.record(0x0C, 0x10);
        assert!(matches!(
            log.verify_tiles(0x1C),
            Err(Error::OverlappingRegion { offset: 0x0C, size: 4 })
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut log = AccessLog::new();
        log.record(0, 0x10);
        assert!(matches!(
            log.verify_tiles(0x20),
            Err(Error::TrailingRegion { offset: 0x10, size: 0x10 })
        ));
    }

    #[test]
    fn test_empty_reads_are_ignored() {
        let mut log = AccessLog::new();
        log.record(0, 0x10);
        log.record(0x05, 0);
        assert!(log.verify_tiles(0x10).is_ok());
    }

    #[test]
    fn test_first_range_must_start_at_zero() {
        let mut log = AccessLog::new();
        log.record(0x10, 0x10);
        assert!(matches!(
            log.verify_tiles(0x20),
            Err(Error::UnreadRegion { offset: 0, size: 0x10 })
        ));
    }
}
