//! Key encodings and key reconstruction.
//!
//! The tree indexes raw bytes. Two encodings are supported:
//!
//! - `u64` keys are stored big-endian, so byte order equals numeric order.
//! - String keys are stored verbatim followed by [`TERMINATOR`], so that
//!   `"ab"` and `"abc"` stay distinct: the tree requires its keys to be
//!   prefix-free.
//!
//! Leaves carry only a payload, so whenever a traversal has to see the full
//! key of a leaf it asks a [`LoadKey`] collaborator to rebuild it.

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Byte appended to every string key.
pub const TERMINATOR: u8 = 0x00;

/// Longest key, in encoded bytes, the tree accepts.
pub const MAX_KEY_LEN: usize = 4096;

/// Buffer for encoded and reconstructed keys.
pub type KeyBytes = SmallVec<[u8; 32]>;

/// Rebuilds the key of a leaf from its payload.
///
/// Passed to [`ArtTree`](crate::ArtTree) at construction. The tree calls it to
/// verify leaves and to recover compressed path bytes that do not fit in a
/// node header.
pub trait LoadKey {
    /// Write the encoded key of the leaf carrying `value` into `key`.
    ///
    /// `key` is empty on entry.
    fn load_key(&self, value: u64, key: &mut KeyBytes);
}

impl<F> LoadKey for F
where
    F: Fn(u64, &mut KeyBytes),
{
    #[inline]
    fn load_key(&self, value: u64, key: &mut KeyBytes) {
        self(value, key)
    }
}

/// Loader for trees whose payload is the `u64` key itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct U64Keys;

impl LoadKey for U64Keys {
    #[inline]
    fn load_key(&self, value: u64, key: &mut KeyBytes) {
        key.extend_from_slice(&encode_u64(value));
    }
}

/// Encode an integer key big-endian.
#[inline]
pub fn encode_u64(key: u64) -> [u8; 8] {
    key.to_be_bytes()
}

/// Decode a big-endian integer key.
#[inline]
pub fn decode_u64(key: &[u8]) -> Option<u64> {
    key.try_into().ok().map(u64::from_be_bytes)
}

/// Encode a string key: its bytes followed by [`TERMINATOR`].
pub fn encode_str(s: &[u8]) -> Result<KeyBytes> {
    if let Some(position) = s.iter().position(|&b| b == TERMINATOR) {
        return Err(Error::InteriorTerminator { position });
    }
    let len = s.len() + 1;
    if len > MAX_KEY_LEN {
        return Err(Error::KeyTooLong {
            len,
            max: MAX_KEY_LEN,
        });
    }

    let mut key = KeyBytes::with_capacity(len);
    key.extend_from_slice(s);
    key.push(TERMINATOR);
    Ok(key)
}

/// Strip the terminator from an encoded string key.
#[inline]
pub fn decode_str(key: &[u8]) -> Option<&[u8]> {
    key.strip_suffix(&[TERMINATOR])
}

/// Reject keys the tree cannot index.
pub(crate) fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(Error::EmptyKey);
    }
    if key.len() > MAX_KEY_LEN {
        return Err(Error::KeyTooLong {
            len: key.len(),
            max: MAX_KEY_LEN,
        });
    }
    Ok(())
}

/// Length of the common prefix of two byte slices.
#[inline]
pub(crate) fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
