//! ART inner node types with adaptive sizing.
//!
//! The layout of an inner node follows the number of children it actually
//! holds:
//!
//! - Node4: up to 4 children, sorted key bytes, linear scan
//! - Node16: 5-16 children, sorted key bytes, linear scan
//! - Node48: 17-48 children (256-byte index + 48 child slots)
//! - Node256: 49-256 children (direct array indexing)
//!
//! Every variant carries the same compressed path [`Prefix`].

use smallvec::SmallVec;

use crate::leaf::Ref;

/// Number of compressed path bytes stored inline in a node header.
pub const MAX_PREFIX_LEN: usize = 9;

/// Node48 index entry for an absent child.
pub(crate) const EMPTY_SLOT: u8 = u8::MAX;

/// Occupancy at or below which a Node16 is rebuilt as a Node4.
pub const NODE16_SHRINK_AT: usize = 3;
/// Occupancy at or below which a Node48 is rebuilt as a Node16.
pub const NODE48_SHRINK_AT: usize = 12;
/// Occupancy at or below which a Node256 is rebuilt as a Node48.
pub const NODE256_SHRINK_AT: usize = 37;

/// The compressed path skipped by a node.
///
/// `len` is the true length of the path; only the first
/// `min(len, MAX_PREFIX_LEN)` bytes are kept. Bytes past that are recovered
/// from a leaf below the node when a traversal needs them.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Prefix {
    len: u32,
    bytes: [u8; MAX_PREFIX_LEN],
}

impl Prefix {
    /// A prefix covering exactly `path`.
    pub fn new(path: &[u8]) -> Self {
        Self::with_len(path, path.len())
    }

    /// A prefix of logical length `len` whose leading bytes are `stored`.
    ///
    /// `stored` must hold at least `min(len, MAX_PREFIX_LEN)` bytes; anything
    /// past the inline capacity is ignored.
    pub fn with_len(stored: &[u8], len: usize) -> Self {
        let inline = len.min(MAX_PREFIX_LEN);
        debug_assert!(stored.len() >= inline, "not enough prefix bytes");
        let inline = inline.min(stored.len());

        let mut bytes = [0u8; MAX_PREFIX_LEN];
        bytes[..inline].copy_from_slice(&stored[..inline]);
        Self {
            len: len as u32,
            bytes,
        }
    }

    /// Concatenate a parent's path, the byte leading to a child, and the child's path.
    pub fn join(parent: &Prefix, byte: u8, child: &Prefix) -> Self {
        let mut stored: SmallVec<[u8; 2 * MAX_PREFIX_LEN + 1]> = SmallVec::new();
        stored.extend_from_slice(parent.inline());
        stored.push(byte);
        stored.extend_from_slice(child.inline());
        Self::with_len(&stored, parent.len() + 1 + child.len())
    }

    /// Logical length of the path.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the node skips no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bytes stored inline.
    #[inline]
    pub fn inline(&self) -> &[u8] {
        &self.bytes[..self.len().min(MAX_PREFIX_LEN)]
    }

    /// Whether part of the path is not stored inline.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.len() > MAX_PREFIX_LEN
    }
}

impl std::fmt::Debug for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.inline()))?;
        if self.is_truncated() {
            write!(f, "..({})", self.len)?;
        }
        Ok(())
    }
}

/// The variant of an inner node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// A node with up to 4 children.
    Node4,
    /// A node with 5-16 children.
    Node16,
    /// A node with 17-48 children.
    Node48,
    /// A node with 49-256 children.
    Node256,
}

/// An inner node in the Adaptive Radix Tree.
#[derive(Clone)]
pub enum Node {
    /// A node with up to 4 children.
    Node4 {
        /// Compressed path prefix.
        prefix: Prefix,
        /// Number of valid children.
        num_children: u8,
        /// Child keys, sorted ascending.
        keys: [u8; 4],
        /// Children, parallel to `keys`.
        children: [Option<Ref>; 4],
    },

    /// A node with 5-16 children.
    Node16 {
        /// Compressed path prefix.
        prefix: Prefix,
        /// Number of valid children.
        num_children: u8,
        /// Child keys, sorted ascending.
        keys: [u8; 16],
        /// Children, parallel to `keys`. Boxed to reduce enum size.
        children: Box<[Option<Ref>; 16]>,
    },

    /// A node with 17-48 children.
    Node48 {
        /// Compressed path prefix.
        prefix: Prefix,
        /// Number of valid children.
        num_children: u8,
        /// Maps key bytes to child slots (`EMPTY_SLOT` = absent).
        child_index: Box<[u8; 256]>,
        /// Child slots.
        children: Box<[Option<Ref>; 48]>,
    },

    /// A node with 49-256 children.
    Node256 {
        /// Compressed path prefix.
        prefix: Prefix,
        /// Number of valid children.
        num_children: u16,
        /// Children indexed directly by key byte.
        children: Box<[Option<Ref>; 256]>,
    },
}

/// Position of `byte` in sorted `keys`, or where it would be inserted.
///
/// Stops at the first key larger than `byte`.
#[inline]
fn scan(keys: &[u8], byte: u8) -> Result<usize, usize> {
    for (i, &key) in keys.iter().enumerate() {
        if key == byte {
            return Ok(i);
        }
        if key > byte {
            return Err(i);
        }
    }
    Err(keys.len())
}

fn insert_sorted(
    keys: &mut [u8],
    children: &mut [Option<Ref>],
    num_children: &mut u8,
    byte: u8,
    child: Ref,
) {
    let n = *num_children as usize;
    match scan(&keys[..n], byte) {
        Ok(i) => children[i] = Some(child),
        Err(i) => {
            if n == keys.len() {
                panic!("Node{} is full, should grow first", keys.len());
            }
            keys.copy_within(i..n, i + 1);
            children[i..=n].rotate_right(1);
            keys[i] = byte;
            children[i] = Some(child);
            *num_children += 1;
        }
    }
}

fn remove_sorted(
    keys: &mut [u8],
    children: &mut [Option<Ref>],
    num_children: &mut u8,
    byte: u8,
) -> Option<Ref> {
    let n = *num_children as usize;
    let i = scan(&keys[..n], byte).ok()?;
    let child = children[i].take();
    keys.copy_within(i + 1..n, i);
    children[i..n].rotate_left(1);
    *num_children -= 1;
    child
}

fn sorted_entry<'a>(keys: &[u8], children: &'a [Option<Ref>], i: usize) -> Option<(u8, &'a Ref)> {
    Some((keys[i], children[i].as_ref()?))
}

impl Node {
    /// Create an empty Node4.
    pub fn new_node4(prefix: Prefix) -> Self {
        Node::Node4 {
            prefix,
            num_children: 0,
            keys: [0; 4],
            children: Default::default(),
        }
    }

    /// Get the node type.
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Node4 { .. } => NodeType::Node4,
            Node::Node16 { .. } => NodeType::Node16,
            Node::Node48 { .. } => NodeType::Node48,
            Node::Node256 { .. } => NodeType::Node256,
        }
    }

    /// Get the number of children.
    pub fn num_children(&self) -> usize {
        match self {
            Node::Node4 { num_children, .. }
            | Node::Node16 { num_children, .. }
            | Node::Node48 { num_children, .. } => *num_children as usize,
            Node::Node256 { num_children, .. } => *num_children as usize,
        }
    }

    /// Maximum number of children of this variant.
    pub fn capacity(&self) -> usize {
        match self {
            Node::Node4 { .. } => 4,
            Node::Node16 { .. } => 16,
            Node::Node48 { .. } => 48,
            Node::Node256 { .. } => 256,
        }
    }

    /// Whether inserting a new key byte requires growing first.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.num_children() >= self.capacity()
    }

    /// Get the prefix.
    pub fn prefix(&self) -> &Prefix {
        match self {
            Node::Node4 { prefix, .. }
            | Node::Node16 { prefix, .. }
            | Node::Node48 { prefix, .. }
            | Node::Node256 { prefix, .. } => prefix,
        }
    }

    /// Set the prefix.
    pub fn set_prefix(&mut self, new_prefix: Prefix) {
        match self {
            Node::Node4 { prefix, .. }
            | Node::Node16 { prefix, .. }
            | Node::Node48 { prefix, .. }
            | Node::Node256 { prefix, .. } => *prefix = new_prefix,
        }
    }

    /// Find the child for a key byte.
    pub fn find_child(&self, byte: u8) -> Option<&Ref> {
        match self {
            Node::Node4 {
                num_children,
                keys,
                children,
                ..
            } => {
                let i = scan(&keys[..*num_children as usize], byte).ok()?;
                children[i].as_ref()
            }
            Node::Node16 {
                num_children,
                keys,
                children,
                ..
            } => {
                let i = scan(&keys[..*num_children as usize], byte).ok()?;
                children[i].as_ref()
            }
            Node::Node48 {
                child_index,
                children,
                ..
            } => match child_index[byte as usize] {
                EMPTY_SLOT => None,
                slot => children[slot as usize].as_ref(),
            },
            Node::Node256 { children, .. } => children[byte as usize].as_ref(),
        }
    }

    /// Find the child for a key byte, mutably.
    pub fn find_child_mut(&mut self, byte: u8) -> Option<&mut Ref> {
        match self {
            Node::Node4 {
                num_children,
                keys,
                children,
                ..
            } => {
                let i = scan(&keys[..*num_children as usize], byte).ok()?;
                children[i].as_mut()
            }
            Node::Node16 {
                num_children,
                keys,
                children,
                ..
            } => {
                let i = scan(&keys[..*num_children as usize], byte).ok()?;
                children[i].as_mut()
            }
            Node::Node48 {
                child_index,
                children,
                ..
            } => match child_index[byte as usize] {
                EMPTY_SLOT => None,
                slot => children[slot as usize].as_mut(),
            },
            Node::Node256 { children, .. } => children[byte as usize].as_mut(),
        }
    }

    /// Add a child under `byte`, replacing any child already there.
    ///
    /// # Panics
    /// Panics if a new byte is added to a full node; call [`Node::grow`] first.
    pub fn insert_child(&mut self, byte: u8, child: Ref) {
        match self {
            Node::Node4 {
                num_children,
                keys,
                children,
                ..
            } => insert_sorted(keys, &mut children[..], num_children, byte, child),
            Node::Node16 {
                num_children,
                keys,
                children,
                ..
            } => insert_sorted(keys, &mut children[..], num_children, byte, child),
            Node::Node48 {
                num_children,
                child_index,
                children,
                ..
            } => {
                let existing = child_index[byte as usize];
                if existing != EMPTY_SLOT {
                    children[existing as usize] = Some(child);
                    return;
                }
                // Slots freed by removals are reused before the tail.
                let Some(slot) = children.iter().position(Option::is_none) else {
                    panic!("Node48 is full, should grow first");
                };
                children[slot] = Some(child);
                child_index[byte as usize] = slot as u8;
                *num_children += 1;
            }
            Node::Node256 {
                num_children,
                children,
                ..
            } => {
                if children[byte as usize].is_none() {
                    *num_children += 1;
                }
                children[byte as usize] = Some(child);
            }
        }
    }

    /// Remove and return the child under `byte`.
    pub fn remove_child(&mut self, byte: u8) -> Option<Ref> {
        match self {
            Node::Node4 {
                num_children,
                keys,
                children,
                ..
            } => remove_sorted(keys, &mut children[..], num_children, byte),
            Node::Node16 {
                num_children,
                keys,
                children,
                ..
            } => remove_sorted(keys, &mut children[..], num_children, byte),
            Node::Node48 {
                num_children,
                child_index,
                children,
                ..
            } => {
                let slot = child_index[byte as usize];
                if slot == EMPTY_SLOT {
                    return None;
                }
                child_index[byte as usize] = EMPTY_SLOT;
                *num_children -= 1;
                children[slot as usize].take()
            }
            Node::Node256 {
                num_children,
                children,
                ..
            } => {
                let child = children[byte as usize].take();
                if child.is_some() {
                    *num_children -= 1;
                }
                child
            }
        }
    }

    /// The child with the smallest key byte.
    pub fn first_child(&self) -> Option<(u8, &Ref)> {
        match self {
            Node::Node4 {
                num_children,
                keys,
                children,
                ..
            } if *num_children > 0 => sorted_entry(keys, &children[..], 0),
            Node::Node16 {
                num_children,
                keys,
                children,
                ..
            } if *num_children > 0 => sorted_entry(keys, &children[..], 0),
            Node::Node4 { .. } | Node::Node16 { .. } => None,
            Node::Node48 { .. } | Node::Node256 { .. } => self.sparse_find(0..=u8::MAX),
        }
    }

    /// The child with the largest key byte.
    pub fn last_child(&self) -> Option<(u8, &Ref)> {
        match self {
            Node::Node4 {
                num_children,
                keys,
                children,
                ..
            } if *num_children > 0 => sorted_entry(keys, &children[..], *num_children as usize - 1),
            Node::Node16 {
                num_children,
                keys,
                children,
                ..
            } if *num_children > 0 => sorted_entry(keys, &children[..], *num_children as usize - 1),
            Node::Node4 { .. } | Node::Node16 { .. } => None,
            Node::Node48 { .. } | Node::Node256 { .. } => self.sparse_find((0..=u8::MAX).rev()),
        }
    }

    /// The child with the smallest key byte greater than `byte`.
    pub fn child_greater_than(&self, byte: u8) -> Option<(u8, &Ref)> {
        match self {
            Node::Node4 {
                num_children,
                keys,
                children,
                ..
            } => {
                let i = keys[..*num_children as usize].iter().position(|&k| k > byte)?;
                sorted_entry(keys, &children[..], i)
            }
            Node::Node16 {
                num_children,
                keys,
                children,
                ..
            } => {
                let i = keys[..*num_children as usize].iter().position(|&k| k > byte)?;
                sorted_entry(keys, &children[..], i)
            }
            Node::Node48 { .. } | Node::Node256 { .. } => {
                self.sparse_find(byte.checked_add(1)?..=u8::MAX)
            }
        }
    }

    /// The child with the largest key byte less than `byte`.
    pub fn child_less_than(&self, byte: u8) -> Option<(u8, &Ref)> {
        match self {
            Node::Node4 {
                num_children,
                keys,
                children,
                ..
            } => {
                let i = keys[..*num_children as usize].iter().rposition(|&k| k < byte)?;
                sorted_entry(keys, &children[..], i)
            }
            Node::Node16 {
                num_children,
                keys,
                children,
                ..
            } => {
                let i = keys[..*num_children as usize].iter().rposition(|&k| k < byte)?;
                sorted_entry(keys, &children[..], i)
            }
            Node::Node48 { .. } | Node::Node256 { .. } => self.sparse_find((0..byte).rev()),
        }
    }

    fn sparse_find(&self, mut bytes: impl Iterator<Item = u8>) -> Option<(u8, &Ref)> {
        bytes.find_map(|b| self.find_child(b).map(|child| (b, child)))
    }

    /// Iterate over `(key byte, child)` pairs in ascending byte order.
    pub fn children(&self) -> Children<'_> {
        match self {
            Node::Node4 {
                num_children,
                keys,
                children,
                ..
            } => {
                let n = *num_children as usize;
                Children::Sorted {
                    keys: &keys[..n],
                    children: &children[..n],
                }
            }
            Node::Node16 {
                num_children,
                keys,
                children,
                ..
            } => {
                let n = *num_children as usize;
                Children::Sorted {
                    keys: &keys[..n],
                    children: &children[..n],
                }
            }
            Node::Node48 { .. } | Node::Node256 { .. } => Children::Sparse {
                node: self,
                front: 0,
                back: 256,
            },
        }
    }

    /// Whether a removal left this node below its variant's shrink threshold.
    ///
    /// Node4 never shrinks; a Node4 with a single child is eliminated by the tree.
    pub fn should_shrink(&self) -> bool {
        match self {
            Node::Node4 { .. } => false,
            Node::Node16 { num_children, .. } => *num_children as usize <= NODE16_SHRINK_AT,
            Node::Node48 { num_children, .. } => *num_children as usize <= NODE48_SHRINK_AT,
            Node::Node256 { num_children, .. } => *num_children as usize <= NODE256_SHRINK_AT,
        }
    }

    /// Rebuild as the next larger variant, keeping prefix and children.
    pub fn grow(&mut self) {
        let grown = match self {
            Node::Node4 {
                prefix,
                num_children,
                keys,
                children,
            } => {
                let mut new_keys = [0u8; 16];
                new_keys[..4].copy_from_slice(&keys[..]);
                let mut new_children: Box<[Option<Ref>; 16]> = Box::default();
                for (slot, child) in new_children.iter_mut().zip(children.iter_mut()) {
                    *slot = child.take();
                }

                Node::Node16 {
                    prefix: *prefix,
                    num_children: *num_children,
                    keys: new_keys,
                    children: new_children,
                }
            }

            Node::Node16 {
                prefix,
                num_children,
                keys,
                children,
            } => {
                let mut child_index = Box::new([EMPTY_SLOT; 256]);
                let mut new_children: Box<[Option<Ref>; 48]> =
                    Box::new(std::array::from_fn(|_| None));
                for i in 0..*num_children as usize {
                    child_index[keys[i] as usize] = i as u8;
                    new_children[i] = children[i].take();
                }

                Node::Node48 {
                    prefix: *prefix,
                    num_children: *num_children,
                    child_index,
                    children: new_children,
                }
            }

            Node::Node48 {
                prefix,
                num_children,
                child_index,
                children,
            } => {
                let mut new_children: Box<[Option<Ref>; 256]> =
                    Box::new(std::array::from_fn(|_| None));
                for (byte, &slot) in child_index.iter().enumerate() {
                    if slot != EMPTY_SLOT {
                        new_children[byte] = children[slot as usize].take();
                    }
                }

                Node::Node256 {
                    prefix: *prefix,
                    num_children: *num_children as u16,
                    children: new_children,
                }
            }

            Node::Node256 { .. } => {
                debug_assert!(false, "Node256 cannot grow");
                return;
            }
        };

        log::trace!(
            "grow {:?} -> {:?} ({} children)",
            self.node_type(),
            grown.node_type(),
            grown.num_children()
        );
        *self = grown;
    }

    /// Rebuild as the next smaller variant, keeping prefix and children.
    ///
    /// The remaining children must fit into the smaller variant.
    pub fn shrink(&mut self) {
        let shrunk = match self {
            Node::Node4 { .. } => {
                debug_assert!(false, "Node4 cannot shrink");
                return;
            }

            Node::Node16 {
                prefix,
                num_children,
                keys,
                children,
            } => {
                let n = *num_children as usize;
                debug_assert!(n <= 4);
                let mut new_keys = [0u8; 4];
                let mut new_children: [Option<Ref>; 4] = Default::default();
                new_keys[..n].copy_from_slice(&keys[..n]);
                for (slot, child) in new_children.iter_mut().zip(children[..n].iter_mut()) {
                    *slot = child.take();
                }

                Node::Node4 {
                    prefix: *prefix,
                    num_children: n as u8,
                    keys: new_keys,
                    children: new_children,
                }
            }

            Node::Node48 {
                prefix,
                num_children,
                child_index,
                children,
            } => {
                debug_assert!(*num_children as usize <= 16);
                let mut keys = [0u8; 16];
                let mut new_children: Box<[Option<Ref>; 16]> = Box::default();
                let mut n = 0;
                for (byte, &slot) in child_index.iter().enumerate() {
                    if slot != EMPTY_SLOT {
                        keys[n] = byte as u8;
                        new_children[n] = children[slot as usize].take();
                        n += 1;
                    }
                }

                Node::Node16 {
                    prefix: *prefix,
                    num_children: n as u8,
                    keys,
                    children: new_children,
                }
            }

            Node::Node256 {
                prefix,
                num_children,
                children,
            } => {
                debug_assert!(*num_children as usize <= 48);
                let mut child_index = Box::new([EMPTY_SLOT; 256]);
                let mut new_children: Box<[Option<Ref>; 48]> =
                    Box::new(std::array::from_fn(|_| None));
                let mut n = 0;
                for (byte, child) in children.iter_mut().enumerate() {
                    if let Some(child) = child.take() {
                        child_index[byte] = n as u8;
                        new_children[n] = Some(child);
                        n += 1;
                    }
                }

                Node::Node48 {
                    prefix: *prefix,
                    num_children: n as u8,
                    child_index,
                    children: new_children,
                }
            }
        };

        log::trace!(
            "shrink {:?} -> {:?} ({} children)",
            self.node_type(),
            shrunk.node_type(),
            shrunk.num_children()
        );
        *self = shrunk;
    }

    /// Approximate heap footprint of this node, excluding its children.
    pub fn heap_size(&self) -> usize {
        let boxed = match self {
            Node::Node4 { .. } => 0,
            Node::Node16 { .. } => std::mem::size_of::<[Option<Ref>; 16]>(),
            Node::Node48 { .. } => 256 + std::mem::size_of::<[Option<Ref>; 48]>(),
            Node::Node256 { .. } => std::mem::size_of::<[Option<Ref>; 256]>(),
        };
        std::mem::size_of::<Node>() + boxed
    }
}

/// Iterator over the children of a node in key byte order.
pub enum Children<'a> {
    /// Node4 / Node16: sorted parallel arrays.
    Sorted {
        /// Remaining key bytes.
        keys: &'a [u8],
        /// Remaining children.
        children: &'a [Option<Ref>],
    },
    /// Node48 / Node256: probe every byte in `front..back`.
    Sparse {
        /// The node being iterated.
        node: &'a Node,
        /// Next byte to probe from the front.
        front: u16,
        /// One past the next byte to probe from the back.
        back: u16,
    },
}

impl<'a> Iterator for Children<'a> {
    type Item = (u8, &'a Ref);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Children::Sorted { keys, children } => {
                let all_keys: &'a [u8] = *keys;
                let all_children: &'a [Option<Ref>] = *children;
                let (&byte, rest_keys) = all_keys.split_first()?;
                let (child, rest_children) = all_children.split_first()?;
                *keys = rest_keys;
                *children = rest_children;
                Some((byte, child.as_ref()?))
            }
            Children::Sparse { node, front, back } => {
                let node: &'a Node = *node;
                while *front < *back {
                    let byte = *front as u8;
                    *front += 1;
                    if let Some(child) = node.find_child(byte) {
                        return Some((byte, child));
                    }
                }
                None
            }
        }
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self {
            Children::Sorted { keys, children } => {
                let all_keys = *keys;
                let all_children = *children;
                let (&byte, rest_keys) = all_keys.split_last()?;
                let (child, rest_children) = all_children.split_last()?;
                *keys = rest_keys;
                *children = rest_children;
                Some((byte, child.as_ref()?))
            }
            Children::Sparse { node, front, back } => {
                let node = *node;
                while *front < *back {
                    *back -= 1;
                    let byte = *back as u8;
                    if let Some(child) = node.find_child(byte) {
                        return Some((byte, child));
                    }
                }
                None
            }
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<u8> = self.children().map(|(byte, _)| byte).collect();
        f.debug_struct(match self.node_type() {
            NodeType::Node4 => "Node4",
            NodeType::Node16 => "Node16",
            NodeType::Node48 => "Node48",
            NodeType::Node256 => "Node256",
        })
        .field("prefix", self.prefix())
        .field("num_children", &self.num_children())
        .field("keys", &keys)
        .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_bytes(node: &Node) -> Vec<u8> {
        node.children().map(|(byte, _)| byte).collect()
    }

    fn leaf_at(node: &Node, byte: u8) -> Option<u64> {
        node.find_child(byte).and_then(Ref::leaf_value)
    }

    /// Insert `bytes` as leaves (payload = byte), growing as the tree would.
    fn fill(node: &mut Node, bytes: impl IntoIterator<Item = u8>) {
        for byte in bytes {
            if node.is_full() {
                node.grow();
            }
            node.insert_child(byte, Ref::leaf(byte as u64));
        }
    }

    #[test]
    fn test_node4_keeps_keys_sorted() {
        let mut node = Node::new_node4(Prefix::default());
        fill(&mut node, [b'd', b'a', b'c', b'b']);

        assert_eq!(node.node_type(), NodeType::Node4);
        assert_eq!(child_bytes(&node), b"abcd");
        assert_eq!(leaf_at(&node, b'c'), Some(b'c' as u64));
        assert!(node.find_child(b'e').is_none());
        assert!(node.is_full());
    }

    #[test]
    fn test_insert_child_replaces_existing() {
        let mut node = Node::new_node4(Prefix::default());
        node.insert_child(7, Ref::leaf(1));
        node.insert_child(7, Ref::leaf(2));
        assert_eq!(node.num_children(), 1);
        assert_eq!(leaf_at(&node, 7), Some(2));
    }

    #[test]
    fn test_growth_preserves_children() {
        let mut node = Node::new_node4(Prefix::new(b"pre"));
        let bytes: Vec<u8> = (0..=255u8).rev().collect();

        for (count, &byte) in bytes.iter().enumerate() {
            fill(&mut node, [byte]);
            let expected = match count + 1 {
                1..=4 => NodeType::Node4,
                5..=16 => NodeType::Node16,
                17..=48 => NodeType::Node48,
                _ => NodeType::Node256,
            };
            assert_eq!(node.node_type(), expected, "after {} inserts", count + 1);
        }

        assert_eq!(node.num_children(), 256);
        assert_eq!(node.prefix(), &Prefix::new(b"pre"));
        for byte in 0..=255u8 {
            assert_eq!(leaf_at(&node, byte), Some(byte as u64));
        }
        assert_eq!(child_bytes(&node), (0..=255u8).collect::<Vec<_>>());
    }

    #[test]
    fn test_shrink_thresholds() {
        let mut node = Node::new_node4(Prefix::new(b"x"));
        fill(&mut node, 0..=255u8);

        let mut remaining = 256;
        for byte in 0..=255u8 {
            assert!(node.remove_child(byte).is_some());
            remaining -= 1;
            if node.should_shrink() {
                node.shrink();
            }
            let expected = match remaining {
                0..=3 => NodeType::Node4,
                4..=12 => NodeType::Node16,
                13..=37 => NodeType::Node48,
                _ => NodeType::Node256,
            };
            assert_eq!(node.node_type(), expected, "with {} children left", remaining);
            assert_eq!(node.num_children(), remaining);
            if remaining > 0 {
                assert_eq!(node.first_child().map(|(b, _)| b), Some(byte + 1));
            }
        }
        assert_eq!(node.prefix(), &Prefix::new(b"x"));
    }

    #[test]
    fn test_neighbours() {
        for target in [4usize, 16, 48, 256] {
            let mut node = Node::new_node4(Prefix::default());
            let mut bytes: Vec<u8> = (0..target).map(|i| (i * 255 / target) as u8 | 1).collect();
            bytes.dedup();
            fill(&mut node, bytes.iter().copied());

            let first = bytes[0];
            let last = *bytes.last().unwrap();
            assert_eq!(node.first_child().map(|(b, _)| b), Some(first));
            assert_eq!(node.last_child().map(|(b, _)| b), Some(last));
            assert_eq!(node.child_greater_than(last).map(|(b, _)| b), None);
            assert_eq!(node.child_less_than(first).map(|(b, _)| b), None);
            assert_eq!(node.child_less_than(0).map(|(b, _)| b), None);
            assert_eq!(node.child_greater_than(255).map(|(b, _)| b), None);

            for pair in bytes.windows(2) {
                assert_eq!(node.child_greater_than(pair[0]).map(|(b, _)| b), Some(pair[1]));
                assert_eq!(node.child_less_than(pair[1]).map(|(b, _)| b), Some(pair[0]));
                // Bytes between two children resolve to the same neighbours.
                if pair[1] - pair[0] > 1 {
                    assert_eq!(node.child_greater_than(pair[0] + 1).map(|(b, _)| b), Some(pair[1]));
                    assert_eq!(node.child_less_than(pair[1] - 1).map(|(b, _)| b), Some(pair[0]));
                }
            }
        }
    }

    #[test]
    fn test_children_double_ended() {
        for count in [3usize, 10, 40, 200] {
            let mut node = Node::new_node4(Prefix::default());
            fill(&mut node, (0..count as u8).map(|b| b.wrapping_mul(7)));

            let forward = child_bytes(&node);
            let mut backward: Vec<u8> = node.children().rev().map(|(b, _)| b).collect();
            backward.reverse();
            assert_eq!(forward, backward);
            assert!(forward.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(forward.len(), count);

            // Meeting in the middle yields every child once.
            let mut it = node.children();
            let mut seen = 0;
            while it.next().is_some() {
                seen += 1;
                if it.next_back().is_some() {
                    seen += 1;
                }
            }
            assert_eq!(seen, count);
        }
    }

    #[test]
    fn test_node48_reuses_freed_slots() {
        let mut node = Node::new_node4(Prefix::default());
        fill(&mut node, 0..48u8);
        assert_eq!(node.node_type(), NodeType::Node48);
        assert!(node.is_full());

        assert_eq!(node.remove_child(10).and_then(|c| c.leaf_value()), Some(10));
        assert!(!node.is_full());
        node.insert_child(200, Ref::leaf(200));
        assert_eq!(node.node_type(), NodeType::Node48);
        assert_eq!(leaf_at(&node, 200), Some(200));
        assert!(node.find_child(10).is_none());
        assert_eq!(node.num_children(), 48);
    }

    #[test]
    fn test_remove_missing_child() {
        let mut node = Node::new_node4(Prefix::default());
        fill(&mut node, [1, 2]);
        assert!(node.remove_child(3).is_none());
        assert_eq!(node.num_children(), 2);
    }

    #[test]
    fn test_prefix_truncation() {
        let short = Prefix::new(b"abc");
        assert_eq!(short.len(), 3);
        assert_eq!(short.inline(), b"abc");
        assert!(!short.is_truncated());

        let long = Prefix::new(b"0123456789abcdef");
        assert_eq!(long.len(), 16);
        assert_eq!(long.inline(), b"012345678");
        assert!(long.is_truncated());
    }

    #[test]
    fn test_prefix_join() {
        let joined = Prefix::join(&Prefix::new(b"ab"), b'/', &Prefix::new(b"cd"));
        assert_eq!(joined, Prefix::new(b"ab/cd"));

        let joined = Prefix::join(&Prefix::new(b"abcdef"), b'/', &Prefix::new(b"ghijkl"));
        assert_eq!(joined.len(), 13);
        assert_eq!(joined.inline(), b"abcdef/gh");

        let long_parent = Prefix::new(b"0123456789");
        let joined = Prefix::join(&long_parent, b'x', &Prefix::default());
        assert_eq!(joined.len(), 11);
        assert_eq!(joined.inline(), b"012345678");
    }
}
