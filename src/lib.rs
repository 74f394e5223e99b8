//! # surrogate-art
//!
//! An Adaptive Radix Tree (ART) index for surrogate string dictionaries.
//!
//! Based on "The Adaptive Radix Tree: ARTful Indexing for Main-Memory Databases"
//! (ICDE 2013, Leis et al.)
//!
//! Leaves hold a 64-bit payload and nothing else. The key of a leaf is
//! rebuilt on demand by a [`LoadKey`] collaborator, which lets a dictionary
//! keep its strings in one place and use the tree purely as an index.
//!
//! - Node4 / Node16 / Node48 / Node256 inner nodes that grow and shrink with
//!   their occupancy
//! - Path compression with up to 9 inline bytes per node; longer paths are
//!   completed from a leaf
//! - Optimistic and pessimistic prefix matching
//! - Exact, ceiling, floor and prefix lookups over one traversal
//!
//! ## Example
//!
//! ```rust
//! use surrogate_art::{encode_u64, ArtTree, U64Keys};
//!
//! let mut tree = ArtTree::new(U64Keys);
//! for id in [42u64, 7, 1_000_000] {
//!     tree.insert(&encode_u64(id), id).unwrap();
//! }
//!
//! assert_eq!(tree.lookup(&encode_u64(7)), Some(7));
//! assert_eq!(tree.minimum(), Some(7));
//! assert_eq!(tree.ceiling(&encode_u64(43)), Some(1_000_000));
//! assert_eq!(tree.floor(&encode_u64(43)), Some(42));
//! ```

#![warn(missing_docs)]

mod debug;
mod error;
mod iter;
mod key;
pub mod leaf;
pub mod node;
mod tree;

pub use debug::TreeStats;
pub use error::{Error, Result};
pub use iter::{Iter, Subtree};
pub use key::{
    decode_str, decode_u64, encode_str, encode_u64, KeyBytes, LoadKey, U64Keys, MAX_KEY_LEN,
    TERMINATOR,
};
pub use leaf::Ref;
pub use node::{Node, NodeType, Prefix, MAX_PREFIX_LEN};
pub use tree::{ArtTree, Options, PrefixMatch};

#[cfg(test)]
mod proptests;
