//! Errors raised while slicing and decoding raw bytes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The cursor ran out of bytes.
    #[error("unexpected end of buffer: needed {needed} bytes, {available} left")]
    UnexpectedEof { needed: usize, available: usize },

    /// An absolute span lies outside the buffer.
    #[error("span {offset:#x}+{len:#x} lies outside a buffer of {available:#x} bytes")]
    OutOfBounds {
        offset: u64,
        len: u64,
        available: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
