//! In-order traversal of the red-black tree.

use std::iter::FusedIterator;
use std::ops::Bound;

use smallvec::SmallVec;

use super::comparator::Comparator;
use super::rbtree::TreeNode;
use super::spliterator::{Characteristics, Spliterator};
use super::Entry;

/// Ancestors still to be visited, next one last. A red-black tree of `n`
/// nodes is at most `2 log2(n + 1)` deep.
type Ancestors<'a, K, V> = SmallVec<[&'a TreeNode<K, V>; 32]>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Direction {
    Ascending,
    Descending,
}

fn push_spine<'a, K, V>(
    stack: &mut Ancestors<'a, K, V>,
    mut node: Option<&'a TreeNode<K, V>>,
    direction: Direction,
) {
    while let Some(current) = node {
        stack.push(current);
        node = match direction {
            Direction::Ascending => current.left.as_deref(),
            Direction::Descending => current.right.as_deref(),
        };
    }
}

fn advance<'a, K, V>(
    stack: &mut Ancestors<'a, K, V>,
    direction: Direction,
) -> Option<&'a TreeNode<K, V>> {
    let node = stack.pop()?;
    let next_subtree = match direction {
        Direction::Ascending => node.right.as_deref(),
        Direction::Descending => node.left.as_deref(),
    };
    push_spine(stack, next_subtree, direction);
    Some(node)
}

fn satisfies_lower<K, C: Comparator<K>>(comparator: &C, key: &K, lower: &Bound<K>) -> bool {
    match lower {
        Bound::Unbounded => true,
        Bound::Included(bound) => comparator.compare(key, bound).is_ge(),
        Bound::Excluded(bound) => comparator.compare(key, bound).is_gt(),
    }
}

fn satisfies_upper<K, C: Comparator<K>>(comparator: &C, key: &K, upper: &Bound<K>) -> bool {
    match upper {
        Bound::Unbounded => true,
        Bound::Included(bound) => comparator.compare(key, bound).is_le(),
        Bound::Excluded(bound) => comparator.compare(key, bound).is_lt(),
    }
}

// =============================================================================
// TreeIter
// =============================================================================

/// Iterator over every entry of a tree, ascending or descending.
pub struct TreeIter<'a, K, V> {
    stack: Ancestors<'a, K, V>,
    direction: Direction,
    remaining: usize,
}

impl<'a, K, V> TreeIter<'a, K, V> {
    pub(crate) fn ascending(root: Option<&'a TreeNode<K, V>>, length: usize) -> Self {
        Self::new(root, length, Direction::Ascending)
    }

    pub(crate) fn descending(root: Option<&'a TreeNode<K, V>>, length: usize) -> Self {
        Self::new(root, length, Direction::Descending)
    }

    fn new(root: Option<&'a TreeNode<K, V>>, length: usize, direction: Direction) -> Self {
        let mut stack = Ancestors::new();
        push_spine(&mut stack, root, direction);
        Self {
            stack,
            direction,
            remaining: length,
        }
    }

    pub(crate) fn next_entry(&mut self) -> Option<&'a Entry<K, V>> {
        let node = advance(&mut self.stack, self.direction)?;
        self.remaining -= 1;
        Some(&node.entry)
    }
}

impl<'a, K, V> Iterator for TreeIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().map(Entry::as_pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for TreeIter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for TreeIter<'_, K, V> {}

// =============================================================================
// TreeRange
// =============================================================================

/// Iterator over the entries of a tree that fall between two bounds.
///
/// Only subtrees that can hold keys inside the bounds are descended into.
pub struct TreeRange<'a, K, V, C> {
    stack: Ancestors<'a, K, V>,
    comparator: &'a C,
    /// The bound still to be checked: upper when ascending, lower when descending.
    limit: Bound<K>,
    direction: Direction,
}

impl<'a, K, V, C: Comparator<K>> TreeRange<'a, K, V, C> {
    pub(crate) fn ascending(
        root: Option<&'a TreeNode<K, V>>,
        comparator: &'a C,
        lower: &Bound<K>,
        upper: Bound<K>,
    ) -> Self {
        let mut stack = Ancestors::new();
        let mut node = root;
        while let Some(current) = node {
            if satisfies_lower(comparator, current.entry.key(), lower) {
                stack.push(current);
                node = current.left.as_deref();
            } else {
                node = current.right.as_deref();
            }
        }
        Self {
            stack,
            comparator,
            limit: upper,
            direction: Direction::Ascending,
        }
    }

    pub(crate) fn descending(
        root: Option<&'a TreeNode<K, V>>,
        comparator: &'a C,
        lower: Bound<K>,
        upper: &Bound<K>,
    ) -> Self {
        let mut stack = Ancestors::new();
        let mut node = root;
        while let Some(current) = node {
            if satisfies_upper(comparator, current.entry.key(), upper) {
                stack.push(current);
                node = current.right.as_deref();
            } else {
                node = current.left.as_deref();
            }
        }
        Self {
            stack,
            comparator,
            limit: lower,
            direction: Direction::Descending,
        }
    }

    pub(crate) fn next_entry(&mut self) -> Option<&'a Entry<K, V>> {
        let node = advance(&mut self.stack, self.direction)?;
        let key = node.entry.key();
        let inside = match self.direction {
            Direction::Ascending => satisfies_upper(self.comparator, key, &self.limit),
            Direction::Descending => satisfies_lower(self.comparator, key, &self.limit),
        };
        if inside {
            Some(&node.entry)
        } else {
            self.stack.clear();
            None
        }
    }
}

impl<'a, K, V, C: Comparator<K>> Iterator for TreeRange<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().map(Entry::as_pair)
    }
}

impl<K, V, C: Comparator<K>> FusedIterator for TreeRange<'_, K, V, C> {}

// =============================================================================
// TreeSpliterator
// =============================================================================

enum Chunk<'a, K, V> {
    /// A single node, without its children.
    Single(&'a TreeNode<K, V>),
    /// A node and everything below it.
    Subtree(&'a TreeNode<K, V>),
}

/// Splittable cursor over a tree in ascending order.
///
/// Reports `ORDERED | DISTINCT | SORTED | IMMUTABLE`, plus `SIZED` until the
/// first split. A split hands the lower half of the remaining chunks to the
/// new cursor.
pub struct TreeSpliterator<'a, K, V, C> {
    pending: SmallVec<[Chunk<'a, K, V>; 16]>,
    comparator: &'a C,
    estimate: usize,
    characteristics: Characteristics,
}

impl<'a, K, V, C> TreeSpliterator<'a, K, V, C> {
    pub(crate) fn new(root: Option<&'a TreeNode<K, V>>, comparator: &'a C, length: usize) -> Self {
        Self {
            pending: root.map(Chunk::Subtree).into_iter().collect(),
            comparator,
            estimate: length,
            characteristics: Characteristics::ORDERED
                | Characteristics::DISTINCT
                | Characteristics::SORTED
                | Characteristics::IMMUTABLE
                | Characteristics::SIZED,
        }
    }

    /// Returns the comparator that defines the encounter order.
    pub const fn comparator(&self) -> &'a C {
        self.comparator
    }

    fn expand(&mut self, node: &'a TreeNode<K, V>) {
        if let Some(right) = node.right.as_deref() {
            self.pending.push(Chunk::Subtree(right));
        }
        self.pending.push(Chunk::Single(node));
        if let Some(left) = node.left.as_deref() {
            self.pending.push(Chunk::Subtree(left));
        }
    }

    pub(crate) fn next_entry(&mut self) -> Option<&'a Entry<K, V>> {
        loop {
            match self.pending.pop()? {
                Chunk::Single(node) => {
                    self.estimate = self.estimate.saturating_sub(1);
                    return Some(&node.entry);
                }
                Chunk::Subtree(node) => self.expand(node),
            }
        }
    }
}

impl<'a, K, V, C> Iterator for TreeSpliterator<'a, K, V, C> {
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

impl<K, V, C> Spliterator for TreeSpliterator<'_, K, V, C> {
    fn try_split(&mut self) -> Option<Self> {
        if self.pending.len() == 1
            && let Some(&Chunk::Subtree(node)) = self.pending.first()
        {
            self.pending.clear();
            self.expand(node);
        }
        let length = self.pending.len();
        if length < 2 {
            return None;
        }
        let prefix = self.pending.drain(length - length / 2..).collect();
        self.estimate >>= 1;
        self.characteristics = self.characteristics.difference(Characteristics::SIZED);
        Some(Self {
            pending: prefix,
            comparator: self.comparator,
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
