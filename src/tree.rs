//! The Adaptive Radix Tree engine.
//!
//! Leaves carry a 64-bit payload only. Whenever the engine needs bytes that
//! are not stored in the tree itself (the tail of a long compressed path, or
//! the key of a leaf it has to verify) it asks the [`LoadKey`] collaborator
//! the tree was built with.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::iter::{Iter, Subtree};
use crate::key::{check_key, common_prefix_len, KeyBytes, LoadKey};
use crate::leaf::Ref;
use crate::node::{Node, NodeType, Prefix};

/// How a lookup compares compressed paths longer than the inline capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrefixMatch {
    /// Compare every path byte, reconstructing the bytes that are not stored
    /// inline from a leaf below the node.
    Pessimistic,
    /// Compare the inline bytes only and skip the rest. The leaf reached at the
    /// end is always verified against the full key.
    #[default]
    Optimistic,
}

/// Tree configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Policy used by [`ArtTree::lookup`].
    pub prefix_match: PrefixMatch,
}

/// What a traversal looks for.
#[derive(Debug, Clone, Copy)]
enum Seek {
    /// The key itself.
    Exact(PrefixMatch),
    /// The smallest key greater than or equal to the search key.
    Ceiling,
    /// The largest key less than or equal to the search key.
    Floor,
}

/// Outcome of comparing a node's compressed path against the search key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathCmp {
    /// Every path byte matched.
    Match,
    /// The inline bytes matched and the rest was not compared.
    Skipped,
    /// Every key below the node sorts before the search key.
    Below,
    /// Every key below the node sorts after the search key.
    Above,
    /// The search key ends inside the path; every key below extends it.
    KeyEnds,
}

/// An Adaptive Radix Tree mapping prefix-free byte keys to `u64` payloads.
///
/// The key of a leaf is not stored: `L` rebuilds it from the payload. The
/// caller is responsible for keeping the loader consistent with the tree, in
/// particular a payload must resolve to the key it was inserted under for as
/// long as it is in the tree.
#[derive(Clone)]
pub struct ArtTree<L> {
    pub(crate) root: Option<Ref>,
    pub(crate) len: usize,
    pub(crate) loader: L,
    options: Options,
}

impl<L: LoadKey> ArtTree<L> {
    /// Create an empty tree.
    pub fn new(loader: L) -> Self {
        Self::with_options(loader, Options::default())
    }

    /// Create an empty tree with the given options.
    pub fn with_options(loader: L, options: Options) -> Self {
        Self {
            root: None,
            len: 0,
            loader,
            options,
        }
    }

    /// Number of keys in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The options the tree was built with.
    #[inline]
    pub fn options(&self) -> Options {
        self.options
    }

    /// The key loader.
    #[inline]
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// The key loader, mutably.
    ///
    /// Payloads already in the tree must keep resolving to their keys.
    #[inline]
    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Insert `key` with payload `value`.
    ///
    /// Returns the previous payload if the key was already present; the new
    /// payload replaces it. Keys that are empty, too long, or a prefix of an
    /// indexed key (or the other way around) are rejected without touching
    /// the tree.
    pub fn insert(&mut self, key: &[u8], value: u64) -> Result<Option<u64>> {
        check_key(key)?;
        let mut scratch = KeyBytes::new();
        let old = match self.root.as_mut() {
            Some(root) => Self::insert_at(&self.loader, root, key, 0, value, &mut scratch)?,
            None => {
                self.root = Some(Ref::leaf(value));
                None
            }
        };
        if old.is_none() {
            self.len += 1;
        }
        Ok(old)
    }

    fn insert_at(
        loader: &L,
        slot: &mut Ref,
        key: &[u8],
        mut depth: usize,
        value: u64,
        scratch: &mut KeyBytes,
    ) -> Result<Option<u64>> {
        let node = match slot {
            Ref::Inner(node) => node,
            Ref::Leaf(existing) => {
                let existing = *existing;
                load(loader, existing, scratch);
                if scratch.as_slice() == key {
                    *slot = Ref::leaf(value);
                    return Ok(Some(existing));
                }

                // Both keys agree up to `depth`; the new Node4 takes the rest
                // of their common run as its path.
                let existing_rest = scratch.get(depth..).unwrap_or_default();
                let split = depth + common_prefix_len(existing_rest, &key[depth..]);
                let (Some(&existing_byte), Some(&new_byte)) = (scratch.get(split), key.get(split))
                else {
                    return Err(Error::NotPrefixFree);
                };

                let mut node = Node::new_node4(Prefix::new(&key[depth..split]));
                node.insert_child(existing_byte, Ref::leaf(existing));
                node.insert_child(new_byte, Ref::leaf(value));
                *slot = Ref::inner(node);
                return Ok(None);
            }
        };

        let prefix = *node.prefix();
        if !prefix.is_empty() {
            load_path(loader, node, depth, scratch);
            let matched = common_prefix_len(scratch, &key[depth..]);
            if matched < prefix.len() {
                let Some(&new_byte) = key.get(depth + matched) else {
                    return Err(Error::NotPrefixFree);
                };

                let old_byte = scratch[matched];
                let mut parent = Node::new_node4(Prefix::new(&scratch[..matched]));
                node.set_prefix(Prefix::new(&scratch[matched + 1..]));
                let old = std::mem::replace(slot, Ref::leaf(value));
                parent.insert_child(old_byte, old);
                parent.insert_child(new_byte, Ref::leaf(value));
                log::trace!(
                    "split path of {} bytes after {} at depth {}",
                    prefix.len(),
                    matched,
                    depth
                );
                *slot = Ref::inner(parent);
                return Ok(None);
            }
            depth += prefix.len();
        }

        let Some(&byte) = key.get(depth) else {
            return Err(Error::NotPrefixFree);
        };
        if let Some(child) = node.find_child_mut(byte) {
            return Self::insert_at(loader, child, key, depth + 1, value, scratch);
        }
        if node.is_full() {
            node.grow();
        }
        node.insert_child(byte, Ref::leaf(value));
        Ok(None)
    }

    /// Look up `key` with the tree's configured [`PrefixMatch`].
    ///
    /// `key` must be encoded like the indexed keys. A leaf reached after every
    /// key byte matched is returned without loading its key, so a key that is
    /// a strict prefix of an indexed key may resolve to it.
    pub fn lookup(&self, key: &[u8]) -> Option<u64> {
        self.lookup_with(key, self.options.prefix_match)
    }

    /// Look up `key` with an explicit [`PrefixMatch`] policy.
    pub fn lookup_with(&self, key: &[u8], prefix_match: PrefixMatch) -> Option<u64> {
        self.seek_from_root(key, Seek::Exact(prefix_match))
    }

    /// Whether `key` is in the tree.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.lookup(key).is_some()
    }

    /// Payload of the smallest key greater than or equal to `key`.
    pub fn ceiling(&self, key: &[u8]) -> Option<u64> {
        self.seek_from_root(key, Seek::Ceiling)
    }

    /// Payload of the largest key less than or equal to `key`.
    pub fn floor(&self, key: &[u8]) -> Option<u64> {
        self.seek_from_root(key, Seek::Floor)
    }

    /// Payload of the smallest key.
    pub fn minimum(&self) -> Option<u64> {
        self.root.as_ref()?.minimum()
    }

    /// Payload of the largest key.
    pub fn maximum(&self) -> Option<u64> {
        self.root.as_ref()?.maximum()
    }

    fn seek_from_root(&self, key: &[u8], mode: Seek) -> Option<u64> {
        let root = self.root.as_ref()?;
        if key.is_empty() {
            // Every indexed key is longer than the empty key.
            return match mode {
                Seek::Ceiling => root.minimum(),
                Seek::Exact(_) | Seek::Floor => None,
            };
        }
        let mut scratch = KeyBytes::new();
        self.seek(root, key, 0, false, mode, &mut scratch)
    }

    /// The traversal shared by exact and approximate lookups.
    fn seek(
        &self,
        slot: &Ref,
        key: &[u8],
        mut depth: usize,
        mut skipped: bool,
        mode: Seek,
        scratch: &mut KeyBytes,
    ) -> Option<u64> {
        let node = match slot {
            Ref::Leaf(value) => return self.check_leaf(*value, key, depth, skipped, mode, scratch),
            Ref::Inner(node) => node,
        };

        let prefix_len = node.prefix().len();
        if prefix_len > 0 {
            match self.compare_path(node, key, depth, mode, scratch) {
                PathCmp::Match => {}
                PathCmp::Skipped => skipped = true,
                PathCmp::Below => return below(node, mode),
                PathCmp::Above | PathCmp::KeyEnds => return above(node, mode),
            }
            depth += prefix_len;
        }

        let Some(&byte) = key.get(depth) else {
            return above(node, mode);
        };
        if let Some(child) = node.find_child(byte) {
            let found = self.seek(child, key, depth + 1, skipped, mode, scratch);
            if found.is_some() {
                return found;
            }
        }
        match mode {
            Seek::Exact(_) => None,
            Seek::Ceiling => node.child_greater_than(byte)?.1.minimum(),
            Seek::Floor => node.child_less_than(byte)?.1.maximum(),
        }
    }

    fn compare_path(
        &self,
        node: &Node,
        key: &[u8],
        depth: usize,
        mode: Seek,
        scratch: &mut KeyBytes,
    ) -> PathCmp {
        let prefix = node.prefix();
        let path: &[u8] = if matches!(mode, Seek::Exact(PrefixMatch::Optimistic)) || !prefix.is_truncated() {
            prefix.inline()
        } else {
            load_path(&self.loader, node, depth, scratch);
            scratch
        };

        let rest = &key[depth..];
        for (i, &byte) in path.iter().enumerate() {
            let Some(&expected) = rest.get(i) else {
                return PathCmp::KeyEnds;
            };
            match byte.cmp(&expected) {
                Ordering::Less => return PathCmp::Below,
                Ordering::Greater => return PathCmp::Above,
                Ordering::Equal => {}
            }
        }
        if path.len() < prefix.len() {
            PathCmp::Skipped
        } else {
            PathCmp::Match
        }
    }

    fn check_leaf(
        &self,
        value: u64,
        key: &[u8],
        depth: usize,
        skipped: bool,
        mode: Seek,
        scratch: &mut KeyBytes,
    ) -> Option<u64> {
        match mode {
            // Every byte of the key was matched on the way down. Indexed keys
            // are prefix-free, so the leaf's key is the search key.
            Seek::Exact(_) if depth == key.len() && !skipped => Some(value),
            Seek::Exact(_) => {
                load(&self.loader, value, scratch);
                let start = if skipped { 0 } else { depth.min(key.len()) };
                let equal = scratch.len() == key.len() && scratch[start..] == key[start..];
                equal.then_some(value)
            }
            Seek::Ceiling => {
                load(&self.loader, value, scratch);
                (scratch.as_slice() >= key).then_some(value)
            }
            Seek::Floor => {
                load(&self.loader, value, scratch);
                (scratch.as_slice() <= key).then_some(value)
            }
        }
    }

    /// Remove `key` and return its payload. Absent keys leave the tree untouched.
    pub fn erase(&mut self, key: &[u8]) -> Option<u64> {
        if key.is_empty() {
            return None;
        }
        let mut scratch = KeyBytes::new();
        let root = self.root.as_mut()?;
        let removed = match root {
            Ref::Leaf(value) => {
                let value = *value;
                if !leaf_matches(&self.loader, value, key, &mut scratch) {
                    return None;
                }
                self.root = None;
                value
            }
            Ref::Inner(_) => Self::erase_at(&self.loader, root, key, 0, &mut scratch)?,
        };
        self.len -= 1;
        Some(removed)
    }

    fn erase_at(
        loader: &L,
        slot: &mut Ref,
        key: &[u8],
        depth: usize,
        scratch: &mut KeyBytes,
    ) -> Option<u64> {
        let Ref::Inner(node) = slot else {
            return None;
        };

        // Bytes past the inline capacity are checked against the leaf.
        let prefix = *node.prefix();
        let inline = prefix.inline();
        if key.get(depth..depth + inline.len())? != inline {
            return None;
        }
        let depth = depth + prefix.len();
        let byte = *key.get(depth)?;

        let child = node.find_child_mut(byte)?;
        let removed = match child {
            Ref::Inner(_) => return Self::erase_at(loader, child, key, depth + 1, scratch),
            Ref::Leaf(value) => {
                let value = *value;
                if !leaf_matches(loader, value, key, scratch) {
                    return None;
                }
                node.remove_child(byte);
                value
            }
        };

        Self::rebalance(slot);
        Some(removed)
    }

    /// Restore the occupancy bounds of the node in `slot` after a removal.
    fn rebalance(slot: &mut Ref) {
        let Ref::Inner(node) = slot else {
            return;
        };
        if node.should_shrink() {
            node.shrink();
            return;
        }
        if node.node_type() != NodeType::Node4 || node.num_children() != 1 {
            return;
        }

        let parent_prefix = *node.prefix();
        let Some((byte, _)) = node.first_child() else {
            return;
        };
        let Some(mut child) = node.remove_child(byte) else {
            return;
        };
        if let Ref::Inner(child_node) = &mut child {
            let joined = Prefix::join(&parent_prefix, byte, child_node.prefix());
            child_node.set_prefix(joined);
        }
        log::trace!("collapse Node4 into its only child {:#04x}", byte);
        *slot = child;
    }

    /// The subtree holding exactly the keys that start with `prefix`.
    ///
    /// A prefix that ends inside a node's compressed path selects that node.
    /// Returns `None` when no key starts with `prefix`.
    pub fn lookup_prefix(&self, prefix: &[u8]) -> Option<Subtree<'_>> {
        let mut current = self.root.as_ref()?;
        let mut depth = 0;
        while depth < prefix.len() {
            let Ref::Inner(node) = current else {
                break;
            };
            let path = node.prefix();
            let inline = path.inline();
            let rest = &prefix[depth..];
            let n = inline.len().min(rest.len());
            if inline[..n] != rest[..n] {
                return None;
            }
            depth += path.len();
            if depth >= prefix.len() {
                break;
            }
            current = node.find_child(prefix[depth])?;
            depth += 1;
        }

        // Every key below `current` shares the bytes walked so far; checking
        // one of them covers the bytes that were not stored inline.
        let mut scratch = KeyBytes::new();
        load(&self.loader, current.minimum()?, &mut scratch);
        scratch.starts_with(prefix).then(|| Subtree::new(current))
    }

    /// Iterate over all payloads in key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.root.as_ref())
    }
}

impl<'a, L: LoadKey> IntoIterator for &'a ArtTree<L> {
    type Item = u64;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<L> std::fmt::Debug for ArtTree<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtTree")
            .field("len", &self.len)
            .field("options", &self.options)
            .field("root", &self.root)
            .finish()
    }
}

/// Fallback when every key below `node` sorts before the search key.
fn below(node: &Node, mode: Seek) -> Option<u64> {
    match mode {
        Seek::Floor => node.last_child()?.1.maximum(),
        Seek::Exact(_) | Seek::Ceiling => None,
    }
}

/// Fallback when every key below `node` sorts after the search key.
fn above(node: &Node, mode: Seek) -> Option<u64> {
    match mode {
        Seek::Ceiling => node.first_child()?.1.minimum(),
        Seek::Exact(_) | Seek::Floor => None,
    }
}

#[inline]
fn load<L: LoadKey>(loader: &L, value: u64, key: &mut KeyBytes) {
    key.clear();
    loader.load_key(value, key);
}

fn leaf_matches<L: LoadKey>(loader: &L, value: u64, key: &[u8], scratch: &mut KeyBytes) -> bool {
    load(loader, value, scratch);
    scratch.as_slice() == key
}

/// Fill `path` with the full compressed path of `node`, which starts at
/// `depth` in every key below it.
fn load_path<L: LoadKey>(loader: &L, node: &Node, depth: usize, path: &mut KeyBytes) {
    let prefix = node.prefix();
    path.clear();
    if !prefix.is_truncated() {
        path.extend_from_slice(prefix.inline());
        return;
    }

    if let Some(value) = node.first_child().and_then(|(_, child)| child.minimum()) {
        loader.load_key(value, path);
    }
    let start = depth.min(path.len());
    path.drain(..start);
    path.truncate(prefix.len());
    debug_assert_eq!(path.len(), prefix.len(), "leaf key shorter than its path");
}
