//! Path hashing for SqPack index tables.
//!
//! Index entries never store path strings. A game path such as
//! `exd/root.exl` is identified by CRC-32 hashes of its lower-cased
//! components, stored bit-inverted (the "JAMCRC" variant):
//!
//! - the legacy index keys folders by the hash of `exd` and files by the
//!   hash of `root.exl`,
//! - index2 keys files by the hash of the whole path.

/// Bit-inverted CRC-32 of a byte slice.
#[inline]
pub fn hash_bytes(data: &[u8]) -> u32 {
    !crc32fast::hash(data)
}

/// Hash of a single path component or full path, case-insensitively.
#[inline]
pub fn hash_str(s: &str) -> u32 {
    hash_bytes(s.to_ascii_lowercase().as_bytes())
}

/// The three hashes that locate one game path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathHashes {
    /// Hash of the folder part, keying the legacy folder table.
    pub path_hash: u32,
    /// Hash of the file name part.
    pub name_hash: u32,
    /// Hash of the complete path, keying index2.
    pub full_path_hash: u32,
}

impl PathHashes {
    /// Hash a game path. Backslashes are treated as separators and a leading
    /// separator is ignored.
    pub fn of(path: &str) -> Self {
        let normalized = normalize(path);
        let (folder, name) = match normalized.rfind('/') {
            Some(split) => (&normalized[..split], &normalized[split + 1..]),
            None => ("", normalized.as_str()),
        };

        Self {
            path_hash: hash_bytes(folder.as_bytes()),
            name_hash: hash_bytes(name.as_bytes()),
            full_path_hash: hash_bytes(normalized.as_bytes()),
        }
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches(['/', '\\'])
        .replace('\\', "/")
        .to_ascii_lowercase()
}
