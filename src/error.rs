//! Errors reported by the tree and the key encoders.

use thiserror::Error;

/// Errors that reject a key before the tree is modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The tree does not index empty keys.
    #[error("empty keys cannot be indexed")]
    EmptyKey,
    /// The key is longer than the supported maximum.
    #[error("key of {len} bytes exceeds the maximum key length of {max} bytes")]
    KeyTooLong {
        /// Length of the rejected key
        len: usize,
        /// Maximum supported key length
        max: usize,
    },
    /// A string key contains the terminator byte.
    #[error("string key contains the terminator byte at position {position}")]
    InteriorTerminator {
        /// Offset of the first terminator byte in the string
        position: usize,
    },
    /// The key is a strict prefix of an indexed key, or the other way around.
    #[error("key is a prefix of an indexed key (or an indexed key is a prefix of it)")]
    NotPrefixFree,
}

/// Result alias for tree operations.
pub type Result<T> = std::result::Result<T, Error>;
