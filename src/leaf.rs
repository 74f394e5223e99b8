//! Child references: either a leaf payload or an owned inner node.
//!
//! Every slot in the tree (the root and each child slot of an inner node)
//! holds a [`Ref`]. Leaves only carry a 64-bit payload, never the key itself;
//! the key is recovered through [`LoadKey`](crate::LoadKey) when a traversal
//! needs it.

use crate::node::Node;

/// A reference stored in a tree slot.
#[derive(Clone)]
pub enum Ref {
    /// A leaf carrying its payload.
    Leaf(u64),
    /// An inner node, exclusively owned by this slot.
    Inner(Box<Node>),
}

impl Ref {
    /// Create a leaf reference.
    #[inline]
    pub fn leaf(value: u64) -> Self {
        Ref::Leaf(value)
    }

    /// Wrap an inner node.
    #[inline]
    pub fn inner(node: Node) -> Self {
        Ref::Inner(Box::new(node))
    }

    /// Whether this reference is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Ref::Leaf(_))
    }

    /// The payload of a leaf, `None` for inner nodes.
    #[inline]
    pub fn leaf_value(&self) -> Option<u64> {
        match self {
            Ref::Leaf(value) => Some(*value),
            Ref::Inner(_) => None,
        }
    }

    /// The inner node, `None` for leaves.
    #[inline]
    pub fn as_inner(&self) -> Option<&Node> {
        match self {
            Ref::Leaf(_) => None,
            Ref::Inner(node) => Some(node),
        }
    }

    /// The inner node, mutably.
    #[inline]
    pub fn as_inner_mut(&mut self) -> Option<&mut Node> {
        match self {
            Ref::Leaf(_) => None,
            Ref::Inner(node) => Some(node),
        }
    }

    /// Payload of the smallest key below this reference.
    pub fn minimum(&self) -> Option<u64> {
        let mut current = self;
        loop {
            match current {
                Ref::Leaf(value) => return Some(*value),
                Ref::Inner(node) => current = node.first_child()?.1,
            }
        }
    }

    /// Payload of the largest key below this reference.
    pub fn maximum(&self) -> Option<u64> {
        let mut current = self;
        loop {
            match current {
                Ref::Leaf(value) => return Some(*value),
                Ref::Inner(node) => current = node.last_child()?.1,
            }
        }
    }
}

impl std::fmt::Debug for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ref::Leaf(value) => f.debug_tuple("Leaf").field(value).finish(),
            Ref::Inner(node) => std::fmt::Debug::fmt(&**node, f),
        }
    }
}
