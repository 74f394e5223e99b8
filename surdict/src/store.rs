//! Contiguous string storage addressed by surrogate ID.
//!
//! All strings live in one byte buffer; IDs map to spans of it. Strings are
//! never moved or freed individually: retiring an ID only hides its span, so
//! an ID keeps meaning the same string for the lifetime of the store.

use surrogate_art::{KeyBytes, LoadKey, TERMINATOR};

/// ID-indexed strings, doubling as the key loader of the string index.
#[derive(Debug, Clone)]
pub struct StringStore {
    first_id: u64,
    bytes: Vec<u8>,
    /// `offsets[i]..offsets[i + 1]` holds the string of ID `first_id + i`.
    offsets: Vec<usize>,
    live: Vec<bool>,
    live_count: usize,
}

impl StringStore {
    /// Create an empty store whose first slot is `first_id`.
    pub fn new(first_id: u64) -> Self {
        Self {
            first_id,
            bytes: Vec::new(),
            offsets: vec![0],
            live: Vec::new(),
            live_count: 0,
        }
    }

    /// The ID the next [`push`](Self::push) will be stored under.
    pub fn next_id(&self) -> Option<u64> {
        self.first_id.checked_add(self.live.len() as u64)
    }

    /// Append `s` under the next ID and return that ID.
    pub fn push(&mut self, s: &[u8]) -> u64 {
        let id = self.first_id + self.live.len() as u64;
        self.bytes.extend_from_slice(s);
        self.offsets.push(self.bytes.len());
        self.live.push(true);
        self.live_count += 1;
        id
    }

    fn slot(&self, id: u64) -> Option<usize> {
        let slot = usize::try_from(id.checked_sub(self.first_id)?).ok()?;
        (slot < self.live.len()).then_some(slot)
    }

    /// The string stored under `id`, unless it was retired.
    pub fn get(&self, id: u64) -> Option<&[u8]> {
        let slot = self.slot(id)?;
        if !self.live[slot] {
            return None;
        }
        Some(&self.bytes[self.offsets[slot]..self.offsets[slot + 1]])
    }

    /// Hide the string stored under `id`. Returns `false` if it was not live.
    pub fn retire(&mut self, id: u64) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        if !std::mem::replace(&mut self.live[slot], false) {
            return false;
        }
        self.live_count -= 1;
        true
    }

    /// Undo the most recent [`push`](Self::push).
    pub(crate) fn pop(&mut self) {
        if self.live.pop() == Some(true) {
            self.live_count -= 1;
        }
        self.offsets.pop();
        let end = self.offsets.last().copied().unwrap_or(0);
        self.bytes.truncate(end);
    }

    /// Number of live strings.
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Whether no string is live.
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Number of IDs ever assigned, including retired ones.
    pub fn assigned(&self) -> usize {
        self.live.len()
    }

    /// Bytes held by string contents, including retired strings.
    pub fn key_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Approximate heap bytes spent on mapping IDs to spans.
    pub fn index_bytes(&self) -> usize {
        self.offsets.capacity() * std::mem::size_of::<usize>() + self.live.capacity()
    }
}

impl LoadKey for StringStore {
    fn load_key(&self, value: u64, key: &mut KeyBytes) {
        // Retired strings stay loadable until their leaf is erased.
        let Some(slot) = self.slot(value) else {
            debug_assert!(false, "no string stored under id {value}");
            return;
        };
        key.extend_from_slice(&self.bytes[self.offsets[slot]..self.offsets[slot + 1]]);
        key.push(TERMINATOR);
    }
}
