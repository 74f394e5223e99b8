//! Thread-safe access to a dictionary.

use parking_lot::{RwLock, RwLockReadGuard};

use crate::dictionary::{AddResult, ArtDictionary};
use crate::error::Result;
use crate::{Config, MemoryStats};

/// A dictionary shared between threads.
///
/// Readers run in parallel; writers are serialized. Methods return owned
/// data so no lock outlives a call, except [`read`](Self::read).
#[derive(Debug, Default)]
pub struct SharedDictionary {
    inner: RwLock<ArtDictionary>,
}

impl SharedDictionary {
    /// Create a new empty dictionary with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new dictionary with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: RwLock::new(ArtDictionary::with_config(config)),
        }
    }

    /// Add a string, returning its ID.
    pub fn insert(&self, s: impl AsRef<[u8]>) -> Result<AddResult> {
        self.inner.write().insert(s.as_ref())
    }

    /// Add every string under one write lock.
    pub fn bulk_insert<I, S>(&self, strings: I) -> Result<Vec<u64>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.inner.write().bulk_insert(strings)
    }

    /// Load strictly ascending strings into an empty dictionary.
    pub fn bulk_load<I, S>(&self, strings: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.inner.write().bulk_load(strings)
    }

    /// The ID of a string.
    pub fn lookup_id(&self, s: impl AsRef<[u8]>) -> Option<u64> {
        self.inner.read().lookup_id(s.as_ref())
    }

    /// A copy of the string stored under `id`.
    pub fn lookup_str(&self, id: u64) -> Option<Vec<u8>> {
        self.inner.read().lookup_str(id).map(<[u8]>::to_vec)
    }

    /// Check if a string is in the dictionary.
    pub fn contains(&self, s: impl AsRef<[u8]>) -> bool {
        self.inner.read().contains(s.as_ref())
    }

    /// Inclusive ID bounds of the strings starting with `prefix`.
    pub fn range_lookup(&self, prefix: impl AsRef<[u8]>) -> Option<(u64, u64)> {
        self.inner.read().range_lookup(prefix.as_ref())
    }

    /// IDs of the strings starting with `prefix`, in string order.
    pub fn prefix_ids(&self, prefix: impl AsRef<[u8]>) -> Vec<u64> {
        self.inner.read().prefix_ids(prefix.as_ref())
    }

    /// Replace the string of `id`.
    pub fn update(&self, id: u64, s: impl AsRef<[u8]>) -> Result<AddResult> {
        self.inner.write().update(id, s.as_ref())
    }

    /// Remove a string, returning the ID it had.
    pub fn remove(&self, s: impl AsRef<[u8]>) -> Option<u64> {
        self.inner.write().remove(s.as_ref())
    }

    /// Remove the string stored under `id` and return it.
    pub fn remove_id(&self, id: u64) -> Option<Vec<u8>> {
        self.inner.write().remove_id(id)
    }

    /// Get the number of strings.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Get memory usage statistics.
    pub fn memory_usage(&self) -> MemoryStats {
        self.inner.read().memory_usage()
    }

    /// Lock the dictionary for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, ArtDictionary> {
        self.inner.read()
    }

    /// Unwrap the dictionary.
    pub fn into_inner(self) -> ArtDictionary {
        self.inner.into_inner()
    }
}

impl From<ArtDictionary> for SharedDictionary {
    fn from(dict: ArtDictionary) -> Self {
        Self {
            inner: RwLock::new(dict),
        }
    }
}
