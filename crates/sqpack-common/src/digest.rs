//! SHA-1 digests as they appear inside SqPack headers.

use std::fmt;

use sha1::{Digest, Sha1};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A 20-byte SHA-1 digest.
///
/// An all-zero value marks a hash that was never written.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct Sha1Value(pub [u8; 20]);

impl Sha1Value {
    /// Digest of a single byte span.
    pub fn digest(data: &[u8]) -> Self {
        Self::digest_parts([data])
    }

    /// Digest of several spans hashed back to back.
    pub fn digest_parts<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = Sha1::new();
        for part in parts {
            hasher.update(part);
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    /// Whether every byte is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for Sha1Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Sha1Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha1Value({self})")
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Sha1Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
