//! Debug utilities for ART troubleshooting.

use std::fmt::Write;

use crate::key::{KeyBytes, LoadKey};
use crate::leaf::Ref;
use crate::node::{
    Node, NodeType, EMPTY_SLOT, NODE16_SHRINK_AT, NODE256_SHRINK_AT, NODE48_SHRINK_AT,
};
use crate::tree::ArtTree;

/// Structural statistics of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of Node4 instances
    pub node4_count: usize,
    /// Number of Node16 instances
    pub node16_count: usize,
    /// Number of Node48 instances
    pub node48_count: usize,
    /// Number of Node256 instances
    pub node256_count: usize,
    /// Number of leaves
    pub leaf_count: usize,
    /// Inner nodes on the longest root-to-leaf path
    pub height: usize,
    /// Approximate bytes used by inner nodes
    pub node_bytes: usize,
}

impl TreeStats {
    /// Total number of inner nodes.
    pub fn inner_count(&self) -> usize {
        self.node4_count + self.node16_count + self.node48_count + self.node256_count
    }
}

fn byte_label(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        (byte as char).to_string()
    } else {
        format!("{byte:#04x}")
    }
}

impl<L: LoadKey> ArtTree<L> {
    /// Print the tree structure for debugging.
    pub fn debug_print(&self) {
        println!("=== ART Debug ===");
        println!("Size: {}", self.len);
        print!("{}", self.dump());
        println!("=================");
    }

    /// Render the tree structure, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        match &self.root {
            Some(root) => Self::dump_ref(&mut out, root, 0),
            None => out.push_str("(empty)\n"),
        }
        out
    }

    fn dump_ref(out: &mut String, r: &Ref, indent: usize) {
        let pad = "  ".repeat(indent);
        match r {
            Ref::Leaf(value) => {
                let _ = writeln!(out, "{pad}Leaf({value})");
            }
            Ref::Inner(node) => {
                let _ = writeln!(
                    out,
                    "{pad}{:?} (prefix={:?}, children={})",
                    node.node_type(),
                    node.prefix(),
                    node.num_children()
                );
                for (byte, child) in node.children() {
                    let _ = writeln!(out, "{pad}  [{}] ->", byte_label(byte));
                    Self::dump_ref(out, child, indent + 2);
                }
            }
        }
    }

    /// Compute structural statistics by walking the tree.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        if let Some(root) = &self.root {
            Self::compute_stats(root, 0, &mut stats);
        }
        stats
    }

    fn compute_stats(r: &Ref, height: usize, stats: &mut TreeStats) {
        let node = match r {
            Ref::Leaf(_) => {
                stats.leaf_count += 1;
                stats.height = stats.height.max(height);
                return;
            }
            Ref::Inner(node) => node,
        };
        match node.node_type() {
            NodeType::Node4 => stats.node4_count += 1,
            NodeType::Node16 => stats.node16_count += 1,
            NodeType::Node48 => stats.node48_count += 1,
            NodeType::Node256 => stats.node256_count += 1,
        }
        stats.node_bytes += node.heap_size();
        for (_, child) in node.children() {
            Self::compute_stats(child, height + 1, stats);
        }
    }

    /// Verify tree integrity - returns list of issues found.
    ///
    /// Checks child counts against occupied slots, variant occupancy bounds,
    /// sorted key bytes, Node48 index consistency, that every leaf's key agrees
    /// with the path leading to it, and that keys come out in strictly
    /// ascending order.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut leaves = 0;
        if let Some(root) = &self.root {
            let mut path = Vec::new();
            self.verify_ref(root, 0, &mut path, &mut leaves, &mut issues);
        }
        if leaves != self.len {
            issues.push(format!("tree holds {leaves} leaves but len() is {}", self.len));
        }

        let mut previous = KeyBytes::new();
        let mut key = KeyBytes::new();
        for (i, value) in self.iter().enumerate() {
            key.clear();
            self.loader.load_key(value, &mut key);
            if i > 0 && previous >= key {
                issues.push(format!("key of payload {value} is out of order"));
            }
            std::mem::swap(&mut previous, &mut key);
        }
        issues
    }

    /// `path` holds `(position, byte)` pairs every key below `r` must contain.
    fn verify_ref(
        &self,
        r: &Ref,
        depth: usize,
        path: &mut Vec<(usize, u8)>,
        leaves: &mut usize,
        issues: &mut Vec<String>,
    ) {
        let node = match r {
            Ref::Leaf(value) => {
                *leaves += 1;
                let mut key = KeyBytes::new();
                self.loader.load_key(*value, &mut key);
                if key.len() < depth {
                    issues.push(format!(
                        "leaf {value} has a {}-byte key at depth {depth}",
                        key.len()
                    ));
                }
                if let Some((position, _)) = path.iter().find(|(p, b)| key.get(*p) != Some(b)) {
                    issues.push(format!("leaf {value} disagrees with its path at byte {position}"));
                }
                return;
            }
            Ref::Inner(node) => node,
        };

        let kind = node.node_type();
        let n = node.num_children();
        let min = match kind {
            NodeType::Node4 => 2,
            NodeType::Node16 => NODE16_SHRINK_AT + 1,
            NodeType::Node48 => NODE48_SHRINK_AT + 1,
            NodeType::Node256 => NODE256_SHRINK_AT + 1,
        };
        if n < min || n > node.capacity() {
            issues.push(format!("{kind:?} at depth {depth} has {n} children"));
        }
        let occupied = node.children().count();
        if occupied != n {
            issues.push(format!(
                "{kind:?} at depth {depth} has {occupied} occupied slots but num_children={n}"
            ));
        }
        Self::verify_layout(node, depth, issues);

        let prefix = node.prefix();
        let mark = path.len();
        path.extend(prefix.inline().iter().enumerate().map(|(i, &b)| (depth + i, b)));
        let depth = depth + prefix.len();
        for (byte, child) in node.children() {
            path.push((depth, byte));
            self.verify_ref(child, depth + 1, path, leaves, issues);
            path.pop();
        }
        path.truncate(mark);
    }

    fn verify_layout(node: &Node, depth: usize, issues: &mut Vec<String>) {
        match node {
            Node::Node4 {
                num_children,
                keys,
                children,
                ..
            } => Self::verify_sorted("Node4", &keys[..], &children[..], *num_children, depth, issues),
            Node::Node16 {
                num_children,
                keys,
                children,
                ..
            } => Self::verify_sorted("Node16", &keys[..], &children[..], *num_children, depth, issues),
            Node::Node48 {
                child_index,
                children,
                ..
            } => {
                let mut used = [false; 48];
                for (byte, &slot) in child_index.iter().enumerate() {
                    if slot == EMPTY_SLOT {
                        continue;
                    }
                    let Some(child) = children.get(slot as usize) else {
                        issues.push(format!("Node48 at depth {depth} maps {byte} to slot {slot}"));
                        continue;
                    };
                    if child.is_none() {
                        issues.push(format!("Node48 at depth {depth} maps {byte} to an empty slot"));
                    }
                    if std::mem::replace(&mut used[slot as usize], true) {
                        issues.push(format!("Node48 at depth {depth} shares slot {slot}"));
                    }
                }
                let orphans = children
                    .iter()
                    .zip(used.iter())
                    .filter(|(child, &indexed)| child.is_some() && !indexed)
                    .count();
                if orphans > 0 {
                    issues.push(format!("Node48 at depth {depth} has {orphans} unindexed children"));
                }
            }
            Node::Node256 { .. } => {}
        }
    }

    fn verify_sorted(
        kind: &str,
        keys: &[u8],
        children: &[Option<Ref>],
        num_children: u8,
        depth: usize,
        issues: &mut Vec<String>,
    ) {
        let n = num_children as usize;
        if keys[..n].windows(2).any(|w| w[0] >= w[1]) {
            issues.push(format!("{kind} at depth {depth} has unsorted keys {:?}", &keys[..n]));
        }
        if children[n..].iter().any(Option::is_some) {
            issues.push(format!("{kind} at depth {depth} has children past num_children"));
        }
    }
}
