//! Common utilities for SqPack.
//!
//! This crate provides the foundational pieces shared by the SqPack crates:
//!
//! - [`BinaryReader`] - Bounds-checked cursor over a byte slice
//! - [`Sha1Value`] - Fixed-size SHA-1 digest as stored on disk
//! - [`hash`] - Path hashing used by the index tables

mod digest;
mod error;
mod reader;

pub mod hash;

pub use digest::Sha1Value;
pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};
