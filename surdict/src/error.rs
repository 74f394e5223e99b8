//! Errors reported by the dictionary.

use thiserror::Error;

/// Errors that reject a dictionary operation before any state changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The string cannot be encoded as a tree key.
    #[error(transparent)]
    Key(#[from] surrogate_art::Error),
    /// The ID was never assigned or has been retired.
    #[error("unknown id {0}")]
    UnknownId(u64),
    /// Every ID has been handed out.
    #[error("no surrogate ids left to assign")]
    IdSpaceExhausted,
    /// Bulk-load input is not strictly ascending.
    #[error("bulk load input is not strictly ascending at position {position}")]
    UnsortedBulkLoad {
        /// Index of the first string that is not greater than its predecessor
        position: usize,
    },
    /// Bulk load requires an empty dictionary.
    #[error("bulk load requires an empty dictionary")]
    NotEmpty,
}

/// Result alias for dictionary operations.
pub type Result<T> = std::result::Result<T, Error>;
