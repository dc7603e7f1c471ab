//! Depth-first traversal of the hash trie.

use std::iter::FusedIterator;
use std::slice;

use smallvec::SmallVec;

use super::spliterator::{Characteristics, Spliterator};
use super::trie::TrieNode;
use super::Entry;

/// Pending nodes, next one last. Trie depth is bounded so the inline
/// capacity covers most traversals.
type PendingNodes<'a, K, V> = SmallVec<[&'a TrieNode<K, V>; 16]>;

/// Pre-order cursor over the leaves of a trie, skipping empty slots.
struct Cursor<'a, K, V> {
    pending: PendingNodes<'a, K, V>,
    bucket: slice::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    fn new(root: Option<&'a TrieNode<K, V>>) -> Self {
        Self {
            pending: root.into_iter().collect(),
            bucket: slice::Iter::default(),
        }
    }

    fn push_children(&mut self, node: &'a TrieNode<K, V>) {
        match node {
            TrieNode::Hash(branch) => self
                .pending
                .extend(branch.children.iter().rev().map(|child| &**child)),
            TrieNode::Array(branch) => self
                .pending
                .extend(branch.slots.iter().rev().filter_map(|slot| slot.as_deref())),
            TrieNode::Entry(_) | TrieNode::Collision(_) => {}
        }
    }

    fn next_entry(&mut self) -> Option<&'a Entry<K, V>> {
        loop {
            if let Some(entry) = self.bucket.next() {
                return Some(entry);
            }
            let node = self.pending.pop()?;
            match node {
                TrieNode::Entry(leaf) => return Some(&leaf.entry),
                TrieNode::Collision(bucket) => self.bucket = bucket.entries.iter(),
                TrieNode::Hash(_) | TrieNode::Array(_) => self.push_children(node),
            }
        }
    }

    /// Splits the pending window at its midpoint, expanding a lone branch first.
    fn split(&mut self) -> Option<Self> {
        if self.pending.len() == 1
            && let Some(&only) = self.pending.first()
            && !only.is_leaf()
        {
            self.pending.clear();
            self.push_children(only);
        }
        let length = self.pending.len();
        if length < 2 {
            return None;
        }
        let prefix = self.pending.drain(length - length / 2..).collect();
        Some(Self {
            pending: prefix,
            bucket: slice::Iter::default(),
        })
    }
}

// =============================================================================
// TrieIter
// =============================================================================

/// Iterator over the entries of a hash trie, in trie order.
pub struct TrieIter<'a, K, V> {
    cursor: Cursor<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> TrieIter<'a, K, V> {
    pub(crate) fn new(root: Option<&'a TrieNode<K, V>>, length: usize) -> Self {
        Self {
            cursor: Cursor::new(root),
            remaining: length,
        }
    }

    pub(crate) fn next_entry(&mut self) -> Option<&'a Entry<K, V>> {
        let entry = self.cursor.next_entry()?;
        self.remaining -= 1;
        Some(entry)
    }
}

impl<'a, K, V> Iterator for TrieIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().map(Entry::as_pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for TrieIter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for TrieIter<'_, K, V> {}

// =============================================================================
// TrieSpliterator
// =============================================================================

/// Splittable cursor over the entries of a hash trie.
///
/// Reports `DISTINCT | IMMUTABLE`, plus `SIZED` until the first split.
pub struct TrieSpliterator<'a, K, V> {
    cursor: Cursor<'a, K, V>,
    estimate: usize,
    characteristics: Characteristics,
}

impl<'a, K, V> TrieSpliterator<'a, K, V> {
    pub(crate) fn new(root: Option<&'a TrieNode<K, V>>, length: usize) -> Self {
        Self {
            cursor: Cursor::new(root),
            estimate: length,
            characteristics: Characteristics::DISTINCT
                | Characteristics::IMMUTABLE
                | Characteristics::SIZED,
        }
    }

    pub(crate) fn next_entry(&mut self) -> Option<&'a Entry<K, V>> {
        let entry = self.cursor.next_entry()?;
        self.estimate = self.estimate.saturating_sub(1);
        Some(entry)
    }
}

impl<'a, K, V> Iterator for TrieSpliterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().map(Entry::as_pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.characteristics.contains(Characteristics::SIZED) {
            (self.estimate, Some(self.estimate))
        } else {
            (0, None)
        }
    }
}

impl<K, V> Spliterator for TrieSpliterator<'_, K, V> {
    fn try_split(&mut self) -> Option<Self> {
        let prefix = self.cursor.split()?;
        self.estimate >>= 1;
        self.characteristics = self.characteristics.difference(Characteristics::SIZED);
        Some(Self {
            cursor: prefix,
            estimate: self.estimate,
            characteristics: self.characteristics,
        })
    }

    fn estimate_size(&self) -> usize {
        self.estimate
    }

    fn characteristics(&self) -> Characteristics {
        self.characteristics
    }
}
