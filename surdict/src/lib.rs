//! # surdict
//!
//! A bidirectional dictionary between byte strings and dense 64-bit surrogate
//! IDs, built on the `surrogate-art` Adaptive Radix Tree.
//!
//! ## Features
//!
//! - **Single copy of every string**: the string index stores IDs only and
//!   rebuilds keys from the string store on demand
//! - **Both directions**: string to ID and ID to string
//! - **Prefix ranges**: the inclusive ID range of all strings sharing a prefix
//! - **Order-preserving bulk load**: sorted input gets consecutive IDs
//!
//! ## Example
//!
//! ```rust
//! use surdict::ArtDictionary;
//!
//! let mut dict = ArtDictionary::new();
//! dict.bulk_load(["aabc", "abbd", "baa", "bab"]).unwrap();
//!
//! assert_eq!(dict.lookup_id(b"baa"), Some(3));
//! assert_eq!(dict.lookup_str(2), Some(&b"abbd"[..]));
//! assert_eq!(dict.range_lookup(b"ba"), Some((3, 4)));
//! assert_eq!(dict.range_lookup(b"c"), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod dictionary;
mod error;
mod shared;
mod store;

pub use dictionary::{AddResult, ArtDictionary};
pub use error::{Error, Result};
pub use shared::SharedDictionary;
pub use store::StringStore;
pub use surrogate_art::PrefixMatch;

/// Memory usage statistics for the dictionary.
#[derive(Debug, Clone, Default)]
pub struct MemoryStats {
    /// Total bytes used by string contents
    pub key_bytes: usize,
    /// Total bytes used by index nodes
    pub node_bytes: usize,
    /// Total bytes used to map IDs to strings
    pub value_bytes: usize,
    /// Number of strings stored
    pub num_keys: usize,
    /// Bytes per string (calculated)
    pub bytes_per_key: f64,
}

/// Configuration for the dictionary.
#[derive(Debug, Clone)]
pub struct Config {
    /// The first ID handed out
    pub first_id: u64,
    /// Prefix matching policy of the string index
    pub prefix_match: PrefixMatch,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_id: 1,
            prefix_match: PrefixMatch::Optimistic,
        }
    }
}

#[cfg(test)]
mod proptests;
