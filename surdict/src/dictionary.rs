//! The bidirectional string dictionary.

use surrogate_art::{encode_str, encode_u64, ArtTree, KeyBytes, Options, TreeStats, U64Keys};

use crate::error::{Error, Result};
use crate::store::StringStore;
use crate::{Config, MemoryStats};

/// Outcome of adding a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    /// The string was new and got this ID.
    Fresh(u64),
    /// The string was already present under this ID.
    Known(u64),
}

impl AddResult {
    /// The string's ID.
    pub fn id(self) -> u64 {
        match self {
            AddResult::Fresh(id) | AddResult::Known(id) => id,
        }
    }

    /// Whether a new ID was assigned.
    pub fn is_fresh(self) -> bool {
        matches!(self, AddResult::Fresh(_))
    }
}

/// Maps byte strings to dense 64-bit IDs and back.
///
/// Strings are kept once, in a [`StringStore`]. Two trees index them:
///
/// - `reverse`: terminated string bytes to ID. Its leaves hold only the ID;
///   the store rebuilds the key when the tree needs it.
/// - `forward`: big-endian ID to ID, the set of live IDs in ID order.
///
/// IDs are handed out in insertion order starting at [`Config::first_id`] and
/// are never reused. [`range_lookup`](Self::range_lookup) relies on IDs
/// following string order, which holds after [`bulk_load`](Self::bulk_load)
/// or when strings are inserted in sorted order.
#[derive(Debug, Clone)]
pub struct ArtDictionary {
    reverse: ArtTree<StringStore>,
    forward: ArtTree<U64Keys>,
    config: Config,
}

impl ArtDictionary {
    /// Create an empty dictionary with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty dictionary with the given configuration.
    pub fn with_config(config: Config) -> Self {
        let options = Options {
            prefix_match: config.prefix_match,
        };
        Self {
            reverse: ArtTree::with_options(StringStore::new(config.first_id), options),
            forward: ArtTree::with_options(U64Keys, options),
            config,
        }
    }

    /// The configuration the dictionary was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn store(&self) -> &StringStore {
        self.reverse.loader()
    }

    fn encode(s: &[u8]) -> Result<KeyBytes> {
        encode_str(s).map_err(|err| {
            log::warn!("rejecting string of {} bytes: {}", s.len(), err);
            Error::from(err)
        })
    }

    /// Add `s`, returning its ID.
    ///
    /// A string that is already present keeps its ID.
    pub fn insert(&mut self, s: &[u8]) -> Result<AddResult> {
        let key = Self::encode(s)?;
        if let Some(id) = self.reverse.lookup(&key) {
            return Ok(AddResult::Known(id));
        }
        self.insert_new(s, &key).map(AddResult::Fresh)
    }

    fn insert_new(&mut self, s: &[u8], key: &[u8]) -> Result<u64> {
        if self.store().next_id().is_none() {
            return Err(Error::IdSpaceExhausted);
        }
        let id = self.reverse.loader_mut().push(s);
        if let Err(err) = self.reverse.insert(key, id) {
            self.reverse.loader_mut().pop();
            return Err(err.into());
        }
        self.forward.insert(&encode_u64(id), id)?;
        Ok(id)
    }

    /// Add every string, returning their IDs in input order.
    ///
    /// Stops at the first rejected string; the strings before it stay added.
    pub fn bulk_insert<I, S>(&mut self, strings: I) -> Result<Vec<u64>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut ids = Vec::new();
        let mut fresh = 0usize;
        for s in strings {
            let added = self.insert(s.as_ref())?;
            fresh += added.is_fresh() as usize;
            ids.push(added.id());
        }
        log::debug!("bulk insert of {} strings, {} new", ids.len(), fresh);
        Ok(ids)
    }

    /// Load strictly ascending strings into an empty dictionary.
    ///
    /// The strings get consecutive IDs in input order, so ID order equals
    /// string order. The whole input is validated before anything is added.
    /// Returns the number of strings loaded.
    pub fn bulk_load<I, S>(&mut self, strings: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        if !self.is_empty() {
            return Err(Error::NotEmpty);
        }

        let strings: Vec<S> = strings.into_iter().collect();
        let mut keys: Vec<KeyBytes> = Vec::with_capacity(strings.len());
        for (position, s) in strings.iter().enumerate() {
            let key = Self::encode(s.as_ref())?;
            if keys.last().is_some_and(|previous| *previous >= key) {
                return Err(Error::UnsortedBulkLoad { position });
            }
            keys.push(key);
        }
        if strings.is_empty() {
            return Ok(0);
        }

        let first = self.store().next_id().ok_or(Error::IdSpaceExhausted)?;
        let last = first
            .checked_add(strings.len() as u64 - 1)
            .ok_or(Error::IdSpaceExhausted)?;
        for (s, key) in strings.iter().zip(&keys) {
            self.insert_new(s.as_ref(), key)?;
        }
        log::debug!("bulk loaded {} strings as ids {}..={}", strings.len(), first, last);
        Ok(strings.len())
    }

    /// The ID of `s`.
    pub fn lookup_id(&self, s: &[u8]) -> Option<u64> {
        let key = encode_str(s).ok()?;
        self.reverse.lookup(&key)
    }

    /// The string stored under `id`.
    pub fn lookup_str(&self, id: u64) -> Option<&[u8]> {
        let id = self.forward.lookup(&encode_u64(id))?;
        self.store().get(id)
    }

    /// Whether `s` is in the dictionary.
    pub fn contains(&self, s: &[u8]) -> bool {
        self.lookup_id(s).is_some()
    }

    /// Inclusive bounds of the IDs of all strings starting with `prefix`.
    ///
    /// The bounds are the IDs of the smallest and the largest such string; they
    /// enclose exactly those strings when IDs follow string order.
    pub fn range_lookup(&self, prefix: &[u8]) -> Option<(u64, u64)> {
        let subtree = self.reverse.lookup_prefix(prefix)?;
        Some((subtree.minimum()?, subtree.maximum()?))
    }

    /// IDs of all strings starting with `prefix`, in string order.
    pub fn prefix_ids(&self, prefix: &[u8]) -> Vec<u64> {
        self.reverse
            .lookup_prefix(prefix)
            .map(|subtree| subtree.iter().collect())
            .unwrap_or_default()
    }

    /// Replace the string of `id` with `s`.
    ///
    /// `id` is retired and `s` is added as if by [`insert`](Self::insert), so
    /// it gets a fresh ID unless it is already present. Setting a string to
    /// itself changes nothing.
    pub fn update(&mut self, id: u64, s: &[u8]) -> Result<AddResult> {
        let key = Self::encode(s)?;
        let current = self.lookup_str(id).ok_or(Error::UnknownId(id))?;
        if current == s {
            return Ok(AddResult::Known(id));
        }

        let existing = self.reverse.lookup(&key);
        if existing.is_none() && self.store().next_id().is_none() {
            return Err(Error::IdSpaceExhausted);
        }
        self.remove_id(id);
        match existing {
            Some(other) => Ok(AddResult::Known(other)),
            None => self.insert_new(s, &key).map(AddResult::Fresh),
        }
    }

    /// Remove `s`, returning the ID it had. The ID is retired.
    pub fn remove(&mut self, s: &[u8]) -> Option<u64> {
        let key = encode_str(s).ok()?;
        let id = self.reverse.erase(&key)?;
        self.retire(id);
        Some(id)
    }

    /// Remove the string stored under `id` and return it. The ID is retired.
    pub fn remove_id(&mut self, id: u64) -> Option<Vec<u8>> {
        let s = self.lookup_str(id)?.to_vec();
        let key = encode_str(&s).ok()?;
        let erased = self.reverse.erase(&key);
        debug_assert_eq!(erased, Some(id));
        self.retire(id);
        Some(s)
    }

    fn retire(&mut self, id: u64) {
        self.forward.erase(&encode_u64(id));
        self.reverse.loader_mut().retire(id);
        log::debug!("retired id {}", id);
    }

    /// The smallest live ID.
    pub fn min_id(&self) -> Option<u64> {
        self.forward.minimum()
    }

    /// The largest live ID.
    pub fn max_id(&self) -> Option<u64> {
        self.forward.maximum()
    }

    /// Number of strings.
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    /// Whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Iterate over `(id, string)` pairs in string order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[u8])> + '_ {
        let store = self.store();
        self.reverse.iter().filter_map(move |id| Some((id, store.get(id)?)))
    }

    /// Iterate over live IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.forward.iter()
    }

    /// Structural statistics of the string index.
    pub fn index_stats(&self) -> TreeStats {
        self.reverse.stats()
    }

    /// Get memory usage statistics.
    pub fn memory_usage(&self) -> MemoryStats {
        let store = self.store();
        let key_bytes = store.key_bytes();
        let node_bytes = self.reverse.stats().node_bytes + self.forward.stats().node_bytes;
        let value_bytes = store.index_bytes();
        let num_keys = self.len();
        MemoryStats {
            key_bytes,
            node_bytes,
            value_bytes,
            num_keys,
            bytes_per_key: if num_keys > 0 {
                (key_bytes + node_bytes + value_bytes) as f64 / num_keys as f64
            } else {
                0.0
            },
        }
    }

    /// Verify both indexes and their agreement - returns list of issues found.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues: Vec<String> = self
            .reverse
            .verify_integrity()
            .into_iter()
            .map(|issue| format!("reverse: {issue}"))
            .collect();
        issues.extend(
            self.forward
                .verify_integrity()
                .into_iter()
                .map(|issue| format!("forward: {issue}")),
        );
        if self.forward.len() != self.reverse.len() || self.store().len() != self.reverse.len() {
            issues.push(format!(
                "{} strings, {} live ids, {} stored strings",
                self.reverse.len(),
                self.forward.len(),
                self.store().len()
            ));
        }
        for id in self.reverse.iter() {
            if self.forward.lookup(&encode_u64(id)).is_none() {
                issues.push(format!("id {id} is indexed by string but not by id"));
            }
        }
        issues
    }
}

impl Default for ArtDictionary {
    fn default() -> Self {
        Self::new()
    }
}
