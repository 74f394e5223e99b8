//! Ordered traversal over leaf payloads.

use crate::leaf::Ref;

/// A subtree selected by [`ArtTree::lookup_prefix`](crate::ArtTree::lookup_prefix).
///
/// Holds exactly the keys that start with the requested prefix.
#[derive(Debug, Clone, Copy)]
pub struct Subtree<'a> {
    root: &'a Ref,
}

impl<'a> Subtree<'a> {
    pub(crate) fn new(root: &'a Ref) -> Self {
        Self { root }
    }

    /// Payload of the smallest key in the subtree.
    pub fn minimum(&self) -> Option<u64> {
        self.root.minimum()
    }

    /// Payload of the largest key in the subtree.
    pub fn maximum(&self) -> Option<u64> {
        self.root.maximum()
    }

    /// Iterate over the subtree's payloads in key order.
    pub fn iter(&self) -> Iter<'a> {
        Iter::new(Some(self.root))
    }

    /// The reference at the top of the subtree.
    pub fn root(&self) -> &'a Ref {
        self.root
    }
}

impl<'a> IntoIterator for Subtree<'a> {
    type Item = u64;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Depth-first iterator over leaf payloads in key order.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    stack: Vec<&'a Ref>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(root: Option<&'a Ref>) -> Self {
        Self {
            stack: root.into_iter().collect(),
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        while let Some(current) = self.stack.pop() {
            match current {
                Ref::Leaf(value) => return Some(*value),
                // Reversed so the smallest child is popped first.
                Ref::Inner(node) => self.stack.extend(node.children().rev().map(|(_, child)| child)),
            }
        }
        None
    }
}
