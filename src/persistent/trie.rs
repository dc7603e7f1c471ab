//! Hash array mapped trie.
//!
//! The trie is indexed by successive 5-bit slices of a 32-bit hash, lowest
//! slice at the root. Four node kinds exist:
//!
//! - `Entry`: a single leaf
//! - `Hash`: a sparse branch with a presence bitmap and a compacted child
//!   array (at most 31 children)
//! - `Array`: a dense 32-slot branch with a live-child counter
//! - `Collision`: two or more entries whose hashes are fully equal
//!
//! Every branch and bucket records the [`EditId`] of the batch that created
//! it. Operations mutate a node in place only when the running
//! [`UpdateContext`] is that batch; otherwise they copy the path from the
//! root down to the change.

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

use super::context::{EditId, Merger, UpdateContext};
use super::{Entry, ReferenceCounter};
use crate::tracing_helpers::trace_log;

// =============================================================================
// Constants
// =============================================================================

/// Bits of hash consumed per level.
pub(crate) const BITS_PER_LEVEL: u32 = 5;

/// Slots in an array node (2^5).
pub(crate) const BRANCHING_FACTOR: usize = 32;

const MASK: u32 = 0x1f;

/// A hash node holding this many children becomes an array node on the next insert.
const MAX_HASH_NODE_CHILDREN: usize = 31;

/// An array node with fewer live children than this becomes a hash node.
const MIN_ARRAY_NODE_CHILDREN: usize = 16;

pub(crate) type NodeRef<K, V> = ReferenceCounter<TrieNode<K, V>>;

// =============================================================================
// Hash computation
// =============================================================================

/// Hashes `key` with `builder` and folds the result to 32 bits.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn hash_key<Q, S>(builder: &S, key: &Q) -> u32
where
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    let full = builder.hash_one(key);
    (full ^ (full >> 32)) as u32
}

#[inline]
const fn fragment(hash: u32, shift: u32) -> usize {
    if shift >= u32::BITS {
        0
    } else {
        ((hash >> shift) & MASK) as usize
    }
}

#[inline]
const fn bit_of(hash: u32, shift: u32) -> u32 {
    1 << fragment(hash, shift)
}

#[inline]
const fn sparse_index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

/// Copies `items`, leaving room for further growth when the batch expects it.
fn copy_with_headroom<T: Clone>(items: &[T], expected_updates: usize) -> Vec<T> {
    let headroom = if expected_updates > 1 {
        items.len().clamp(1, expected_updates)
    } else {
        0
    };
    let capacity = (items.len() + headroom)
        .min(BRANCHING_FACTOR)
        .max(items.len());
    let mut copy = Vec::with_capacity(capacity);
    copy.extend_from_slice(items);
    copy
}

/// Makes room for one more element: one slot at a time for single edits,
/// geometric growth capped at the branching factor for batches.
fn reserve_slot<T>(items: &mut Vec<T>, expected_updates: usize) {
    if items.len() < items.capacity() {
        return;
    }
    let additional = if expected_updates > 1 {
        let ceiling = BRANCHING_FACTOR.saturating_sub(items.len()).max(1);
        items.len().clamp(1, ceiling)
    } else {
        1
    };
    items.reserve_exact(additional);
}

// =============================================================================
// Node Definition
// =============================================================================

/// A trie node.
#[derive(Clone)]
pub(crate) enum TrieNode<K, V> {
    Entry(EntryNode<K, V>),
    Hash(HashNode<K, V>),
    Array(ArrayNode<K, V>),
    Collision(CollisionNode<K, V>),
}

/// Leaf holding one entry. Immutable; replacement allocates a new leaf.
#[derive(Clone)]
pub(crate) struct EntryNode<K, V> {
    pub(super) hash: u32,
    pub(super) entry: Entry<K, V>,
}

/// Sparse branch: bit `i` of `bitmap` is set iff slot `i` is present, and
/// its child lives at `children[popcount(bitmap & (bit - 1))]`.
#[derive(Clone)]
pub(crate) struct HashNode<K, V> {
    owner: EditId,
    bitmap: u32,
    pub(super) children: Vec<NodeRef<K, V>>,
}

/// Dense branch indexed directly by hash slice.
#[derive(Clone)]
pub(crate) struct ArrayNode<K, V> {
    owner: EditId,
    count: usize,
    pub(super) slots: Box<[Option<NodeRef<K, V>>; BRANCHING_FACTOR]>,
}

/// Bucket of entries sharing one full hash, scanned linearly.
#[derive(Clone)]
pub(crate) struct CollisionNode<K, V> {
    owner: EditId,
    hash: u32,
    pub(super) entries: Vec<Entry<K, V>>,
}

/// Result of a removal below a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Removal {
    /// The key was not present; nothing was touched.
    Absent,
    /// The key was removed and the slot now holds the updated node.
    Removed,
    /// The key was removed and the slot must be dropped by its parent.
    Emptied,
}

impl<K, V> HashNode<K, V> {
    fn promote(&self, edit: EditId, hash: u32, shift: u32, leaf: NodeRef<K, V>) -> ArrayNode<K, V> {
        let mut slots: Box<[Option<NodeRef<K, V>>; BRANCHING_FACTOR]> =
            Box::new(std::array::from_fn(|_| None));
        let mut children = self.children.iter();
        for (index, slot) in slots.iter_mut().enumerate() {
            if self.bitmap & (1u32 << index) != 0 {
                *slot = children.next().cloned();
            }
        }
        slots[fragment(hash, shift)] = Some(leaf);
        ArrayNode {
            owner: edit,
            count: self.children.len() + 1,
            slots,
        }
    }
}

impl<K, V> ArrayNode<K, V> {
    fn pack(&mut self) -> HashNode<K, V> {
        let mut bitmap = 0;
        let mut children = Vec::with_capacity(self.count);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(child) = slot.take() {
                bitmap |= 1u32 << index;
                children.push(child);
            }
        }
        HashNode {
            owner: self.owner,
            bitmap,
            children,
        }
    }
}

// =============================================================================
// Read-only operations
// =============================================================================

impl<K, V> TrieNode<K, V> {
    pub(crate) const fn leaf(hash: u32, entry: Entry<K, V>) -> Self {
        Self::Entry(EntryNode { hash, entry })
    }

    const fn owner(&self) -> Option<EditId> {
        match self {
            Self::Entry(_) => None,
            Self::Hash(node) => Some(node.owner),
            Self::Array(node) => Some(node.owner),
            Self::Collision(node) => Some(node.owner),
        }
    }

    /// `true` for nodes that compare full hashes: entries and buckets.
    pub(crate) const fn is_leaf(&self) -> bool {
        matches!(self, Self::Entry(_) | Self::Collision(_))
    }

    pub(crate) fn child(&self, hash: u32, shift: u32) -> Option<&NodeRef<K, V>> {
        match self {
            Self::Hash(node) => {
                let bit = bit_of(hash, shift);
                (node.bitmap & bit != 0).then(|| &node.children[sparse_index(node.bitmap, bit)])
            }
            Self::Array(node) => node.slots[fragment(hash, shift)].as_ref(),
            Self::Entry(_) | Self::Collision(_) => None,
        }
    }

    fn child_mut(&mut self, hash: u32, shift: u32) -> Option<&mut NodeRef<K, V>> {
        match self {
            Self::Hash(node) => {
                let bit = bit_of(hash, shift);
                if node.bitmap & bit == 0 {
                    None
                } else {
                    Some(&mut node.children[sparse_index(node.bitmap, bit)])
                }
            }
            Self::Array(node) => node.slots[fragment(hash, shift)].as_mut(),
            Self::Entry(_) | Self::Collision(_) => None,
        }
    }

    /// Number of direct children of a branch, or entries of a leaf.
    pub(crate) fn child_count(&self) -> usize {
        match self {
            Self::Entry(_) => 1,
            Self::Hash(node) => node.children.len(),
            Self::Array(node) => node.count,
            Self::Collision(node) => node.entries.len(),
        }
    }

    /// Looks up `key` by descending along the slices of `hash`.
    pub(crate) fn find<Q>(&self, hash: u32, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut node = self;
        let mut shift = 0;
        loop {
            match node {
                Self::Entry(leaf) => {
                    return (leaf.hash == hash && leaf.entry.key().borrow() == key)
                        .then_some(&leaf.entry);
                }
                Self::Collision(bucket) => {
                    if bucket.hash != hash {
                        return None;
                    }
                    return bucket
                        .entries
                        .iter()
                        .find(|candidate| candidate.key().borrow() == key);
                }
                Self::Hash(_) | Self::Array(_) => {
                    node = node.child(hash, shift).map(|child| &**child)?;
                }
            }
            shift += BITS_PER_LEVEL;
        }
    }
}

// =============================================================================
// Editing operations
// =============================================================================

impl<K: Clone, V: Clone> TrieNode<K, V> {
    /// Mutable access when the running batch owns the node.
    fn owned_mut(slot: &mut NodeRef<K, V>, edit: EditId) -> Option<&mut Self> {
        if slot.owner() == Some(edit) {
            ReferenceCounter::get_mut(slot)
        } else {
            None
        }
    }

    /// Mutable access to the node in `slot`, copying it first unless the
    /// running batch owns it.
    fn edit_in(slot: &mut NodeRef<K, V>, edit: EditId, expected_updates: usize) -> &mut Self {
        if slot.owner() != Some(edit) {
            let copy = slot.copy_for(edit, expected_updates);
            *slot = ReferenceCounter::new(copy);
        }
        ReferenceCounter::make_mut(slot)
    }

    fn copy_for(&self, edit: EditId, expected_updates: usize) -> Self {
        match self {
            Self::Entry(leaf) => Self::Entry(leaf.clone()),
            Self::Hash(node) => Self::Hash(HashNode {
                owner: edit,
                bitmap: node.bitmap,
                children: copy_with_headroom(&node.children, expected_updates),
            }),
            Self::Array(node) => Self::Array(ArrayNode {
                owner: edit,
                count: node.count,
                slots: node.slots.clone(),
            }),
            Self::Collision(node) => Self::Collision(CollisionNode {
                owner: edit,
                hash: node.hash,
                entries: copy_with_headroom(&node.entries, expected_updates),
            }),
        }
    }

    fn insert_child(&mut self, hash: u32, shift: u32, child: NodeRef<K, V>, expected_updates: usize) {
        match self {
            Self::Hash(node) => {
                let bit = bit_of(hash, shift);
                let index = sparse_index(node.bitmap, bit);
                reserve_slot(&mut node.children, expected_updates);
                node.children.insert(index, child);
                node.bitmap |= bit;
            }
            Self::Array(node) => {
                node.slots[fragment(hash, shift)] = Some(child);
                node.count += 1;
            }
            Self::Entry(_) | Self::Collision(_) => {}
        }
    }

    fn set_child(&mut self, hash: u32, shift: u32, child: NodeRef<K, V>) {
        if let Some(existing) = self.child_mut(hash, shift) {
            *existing = child;
        }
    }

    fn remove_child(&mut self, hash: u32, shift: u32) {
        match self {
            Self::Hash(node) => {
                let bit = bit_of(hash, shift);
                if node.bitmap & bit != 0 {
                    node.children.remove(sparse_index(node.bitmap, bit));
                    node.bitmap &= !bit;
                }
            }
            Self::Array(node) => {
                if node.slots[fragment(hash, shift)].take().is_some() {
                    node.count -= 1;
                }
                if node.count < MIN_ARRAY_NODE_CHILDREN {
                    trace_log!(shift, live = node.count, "array node demoted to hash node");
                    let packed = node.pack();
                    *self = Self::Hash(packed);
                }
            }
            Self::Entry(_) | Self::Collision(_) => {}
        }
    }

    /// Builds the smallest branch chain separating two nodes whose hashes differ.
    fn pair(
        edit: EditId,
        shift: u32,
        first: (NodeRef<K, V>, u32),
        second: (NodeRef<K, V>, u32),
    ) -> NodeRef<K, V> {
        debug_assert_ne!(first.1, second.1, "paired nodes must have distinct hashes");
        let first_fragment = fragment(first.1, shift);
        let second_fragment = fragment(second.1, shift);
        let node = if first_fragment == second_fragment {
            HashNode {
                owner: edit,
                bitmap: 1 << first_fragment,
                children: vec![Self::pair(edit, shift + BITS_PER_LEVEL, first, second)],
            }
        } else {
            let children = if first_fragment < second_fragment {
                vec![first.0, second.0]
            } else {
                vec![second.0, first.0]
            };
            HashNode {
                owner: edit,
                bitmap: (1 << first_fragment) | (1 << second_fragment),
                children,
            }
        };
        ReferenceCounter::new(Self::Hash(node))
    }

    /// Replaces a single-child hash node by its child when that child is a leaf.
    fn collapse(slot: &mut NodeRef<K, V>) {
        let hoisted = match &**slot {
            Self::Hash(node) if node.children.len() == 1 && node.children[0].is_leaf() => {
                ReferenceCounter::clone(&node.children[0])
            }
            _ => return,
        };
        *slot = hoisted;
    }

    /// Inserts or updates `entry` in the subtree held by `slot`.
    ///
    /// Returns `true` if the subtree changed. The context records `+1` when
    /// the key was new.
    pub(crate) fn assoc<M>(
        slot: &mut NodeRef<K, V>,
        context: &mut UpdateContext<M>,
        shift: u32,
        hash: u32,
        entry: Entry<K, V>,
    ) -> bool
    where
        K: Eq,
        M: Merger<K, V>,
    {
        let edit = context.edit();
        let expected_updates = context.expected_updates();
        match &**slot {
            Self::Entry(leaf) => {
                if leaf.hash == hash && leaf.entry.key() == entry.key() {
                    if !context.merge(&leaf.entry, &entry) {
                        return false;
                    }
                    *slot = ReferenceCounter::new(Self::leaf(hash, entry));
                    return true;
                }
                context.insert(&entry);
                if leaf.hash == hash {
                    trace_log!(hash, "collision node created");
                    let bucket = CollisionNode {
                        owner: edit,
                        hash,
                        entries: vec![leaf.entry.clone(), entry],
                    };
                    *slot = ReferenceCounter::new(Self::Collision(bucket));
                } else {
                    let existing = (ReferenceCounter::clone(slot), leaf.hash);
                    let incoming = (ReferenceCounter::new(Self::leaf(hash, entry)), hash);
                    *slot = Self::pair(edit, shift, existing, incoming);
                }
                true
            }
            Self::Hash(node) => {
                if node.bitmap & bit_of(hash, shift) != 0 {
                    return Self::assoc_child(slot, context, shift, hash, entry);
                }
                context.insert(&entry);
                let leaf = ReferenceCounter::new(Self::leaf(hash, entry));
                if node.children.len() >= MAX_HASH_NODE_CHILDREN {
                    trace_log!(shift, "hash node promoted to array node");
                    let promoted = Self::Array(node.promote(edit, hash, shift, leaf));
                    *slot = ReferenceCounter::new(promoted);
                } else {
                    Self::edit_in(slot, edit, expected_updates).insert_child(
                        hash,
                        shift,
                        leaf,
                        expected_updates,
                    );
                }
                true
            }
            Self::Array(node) => {
                if node.slots[fragment(hash, shift)].is_some() {
                    return Self::assoc_child(slot, context, shift, hash, entry);
                }
                context.insert(&entry);
                let leaf = ReferenceCounter::new(Self::leaf(hash, entry));
                Self::edit_in(slot, edit, expected_updates).insert_child(
                    hash,
                    shift,
                    leaf,
                    expected_updates,
                );
                true
            }
            Self::Collision(node) => {
                if node.hash != hash {
                    context.insert(&entry);
                    let existing = (ReferenceCounter::clone(slot), node.hash);
                    let incoming = (ReferenceCounter::new(Self::leaf(hash, entry)), hash);
                    *slot = Self::pair(edit, shift, existing, incoming);
                    return true;
                }
                let position = node
                    .entries
                    .iter()
                    .position(|candidate| candidate.key() == entry.key());
                match position {
                    Some(position) => {
                        if !context.merge(&node.entries[position], &entry) {
                            return false;
                        }
                        if let Self::Collision(bucket) = Self::edit_in(slot, edit, expected_updates) {
                            bucket.entries[position] = entry;
                        }
                    }
                    None => {
                        context.insert(&entry);
                        if let Self::Collision(bucket) = Self::edit_in(slot, edit, expected_updates) {
                            reserve_slot(&mut bucket.entries, expected_updates);
                            bucket.entries.push(entry);
                        }
                    }
                }
                true
            }
        }
    }

    fn assoc_child<M>(
        slot: &mut NodeRef<K, V>,
        context: &mut UpdateContext<M>,
        shift: u32,
        hash: u32,
        entry: Entry<K, V>,
    ) -> bool
    where
        K: Eq,
        M: Merger<K, V>,
    {
        let edit = context.edit();
        if let Some(node) = Self::owned_mut(slot, edit)
            && let Some(child) = node.child_mut(hash, shift)
        {
            return Self::assoc(child, context, shift + BITS_PER_LEVEL, hash, entry);
        }
        let Some(mut child) = slot.child(hash, shift).cloned() else {
            return false;
        };
        if !Self::assoc(&mut child, context, shift + BITS_PER_LEVEL, hash, entry) {
            return false;
        }
        Self::edit_in(slot, edit, context.expected_updates()).set_child(hash, shift, child);
        true
    }

    /// Removes `key` from the subtree held by `slot`.
    ///
    /// The context records `-1` when a key was removed. On
    /// [`Removal::Absent`] the slot is untouched.
    pub(crate) fn dissoc<Q, M>(
        slot: &mut NodeRef<K, V>,
        context: &mut UpdateContext<M>,
        shift: u32,
        hash: u32,
        key: &Q,
    ) -> Removal
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        M: Merger<K, V>,
    {
        let edit = context.edit();
        match &**slot {
            Self::Entry(leaf) => {
                if leaf.hash != hash || leaf.entry.key().borrow() != key {
                    return Removal::Absent;
                }
                context.delete(&leaf.entry);
                Removal::Emptied
            }
            Self::Collision(node) => {
                if node.hash != hash {
                    return Removal::Absent;
                }
                let Some(position) = node
                    .entries
                    .iter()
                    .position(|candidate| candidate.key().borrow() == key)
                else {
                    return Removal::Absent;
                };
                context.delete(&node.entries[position]);
                if node.entries.len() == 2 {
                    let survivor = node.entries[1 - position].clone();
                    *slot = ReferenceCounter::new(Self::leaf(node.hash, survivor));
                } else if let Self::Collision(bucket) =
                    Self::edit_in(slot, edit, context.expected_updates())
                {
                    bucket.entries.remove(position);
                }
                Removal::Removed
            }
            Self::Hash(_) | Self::Array(_) => Self::dissoc_child(slot, context, shift, hash, key),
        }
    }

    fn dissoc_child<Q, M>(
        slot: &mut NodeRef<K, V>,
        context: &mut UpdateContext<M>,
        shift: u32,
        hash: u32,
        key: &Q,
    ) -> Removal
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        M: Merger<K, V>,
    {
        let edit = context.edit();
        let mut detached = None;
        let outcome = if let Some(node) = Self::owned_mut(slot, edit)
            && let Some(child) = node.child_mut(hash, shift)
        {
            Self::dissoc(child, context, shift + BITS_PER_LEVEL, hash, key)
        } else {
            let Some(mut child) = slot.child(hash, shift).cloned() else {
                return Removal::Absent;
            };
            let outcome = Self::dissoc(&mut child, context, shift + BITS_PER_LEVEL, hash, key);
            detached = Some(child);
            outcome
        };

        let expected_updates = context.expected_updates();
        match outcome {
            Removal::Absent => Removal::Absent,
            Removal::Removed => {
                let node = Self::edit_in(slot, edit, expected_updates);
                if let Some(child) = detached {
                    node.set_child(hash, shift, child);
                }
                Self::collapse(slot);
                Removal::Removed
            }
            Removal::Emptied => {
                if slot.child_count() == 1 {
                    return Removal::Emptied;
                }
                Self::edit_in(slot, edit, expected_updates).remove_child(hash, shift);
                Self::collapse(slot);
                Removal::Removed
            }
        }
    }

    /// Inserts into an optional root. Returns `true` if the trie changed.
    pub(crate) fn assoc_root<M>(
        root: &mut Option<NodeRef<K, V>>,
        context: &mut UpdateContext<M>,
        hash: u32,
        entry: Entry<K, V>,
    ) -> bool
    where
        K: Eq,
        M: Merger<K, V>,
    {
        if let Some(slot) = root.as_mut() {
            return Self::assoc(slot, context, 0, hash, entry);
        }
        context.insert(&entry);
        *root = Some(ReferenceCounter::new(Self::leaf(hash, entry)));
        true
    }

    /// Removes from an optional root. Returns `true` if a key was removed.
    pub(crate) fn dissoc_root<Q, M>(
        root: &mut Option<NodeRef<K, V>>,
        context: &mut UpdateContext<M>,
        hash: u32,
        key: &Q,
    ) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        M: Merger<K, V>,
    {
        let Some(slot) = root.as_mut() else {
            return false;
        };
        match Self::dissoc(slot, context, 0, hash, key) {
            Removal::Absent => false,
            Removal::Removed => true,
            Removal::Emptied => {
                *root = None;
                true
            }
        }
    }
}

// =============================================================================
// Structural checks
// =============================================================================

#[cfg(test)]
impl<K, V> TrieNode<K, V> {
    /// Asserts the structural invariants and returns the number of entries.
    ///
    /// `path` holds the hash bits below `shift` that lead to this node.
    pub(crate) fn validate(&self, shift: u32, path: u32) -> usize {
        let below = if shift >= u32::BITS {
            u32::MAX
        } else {
            (1u32 << shift) - 1
        };
        match self {
            Self::Entry(leaf) => {
                assert_eq!(leaf.hash & below, path, "leaf reached by a foreign path");
                1
            }
            Self::Collision(node) => {
                assert!(node.entries.len() >= 2, "collision bucket with a single entry");
                assert_eq!(node.hash & below, path, "bucket reached by a foreign path");
                node.entries.len()
            }
            Self::Hash(node) => {
                assert_eq!(node.bitmap.count_ones() as usize, node.children.len());
                assert!(!node.children.is_empty(), "empty hash node");
                assert!(node.children.len() <= MAX_HASH_NODE_CHILDREN);
                let mut children = node.children.iter();
                (0..BRANCHING_FACTOR)
                    .filter(|index| node.bitmap & (1u32 << index) != 0)
                    .map(|index| {
                        let child = children.next().expect("bitmap and children agree");
                        #[allow(clippy::cast_possible_truncation)]
                        child.validate(shift + BITS_PER_LEVEL, path | ((index as u32) << shift))
                    })
                    .sum()
            }
            Self::Array(node) => {
                let live = node.slots.iter().filter(|slot| slot.is_some()).count();
                assert_eq!(live, node.count);
                assert!(node.count >= MIN_ARRAY_NODE_CHILDREN, "sparse array node");
                node.slots
                    .iter()
                    .enumerate()
                    .filter_map(|(index, slot)| slot.as_ref().map(|child| (index, child)))
                    .map(|(index, child)| {
                        #[allow(clippy::cast_possible_truncation)]
                        child.validate(shift + BITS_PER_LEVEL, path | ((index as u32) << shift))
                    })
                    .sum()
            }
        }
    }

    pub(crate) const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub(crate) const fn is_collision(&self) -> bool {
        matches!(self, Self::Collision(_))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    type Root = Option<NodeRef<u32, u32>>;

    fn insert(root: &mut Root, context: &mut UpdateContext, hash: u32, key: u32) -> bool {
        TrieNode::assoc_root(root, context, hash, Entry::new(key, key * 10))
    }

    fn remove(root: &mut Root, context: &mut UpdateContext, hash: u32, key: u32) -> bool {
        TrieNode::dissoc_root(root, context, hash, &key)
    }

    fn lookup(root: &Root, hash: u32, key: u32) -> Option<u32> {
        root.as_ref()?.find(hash, &key).map(|entry| *entry.value())
    }

    fn count(root: &Root) -> usize {
        root.as_ref().map_or(0, |node| node.validate(0, 0))
    }

    #[rstest]
    fn test_insert_and_find_distinct_hashes() {
        let mut root = None;
        let mut context = UpdateContext::new(100);
        for key in 0..100u32 {
            assert!(insert(&mut root, &mut context, key.wrapping_mul(0x9E37_79B9), key));
            assert_eq!(context.take_change(), 1);
        }
        assert_eq!(count(&root), 100);
        for key in 0..100u32 {
            assert_eq!(lookup(&root, key.wrapping_mul(0x9E37_79B9), key), Some(key * 10));
        }
        assert_eq!(lookup(&root, 7, 1000), None);
    }

    #[rstest]
    fn test_replace_reports_no_size_change() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        insert(&mut root, &mut context, 5, 1);
        context.take_change();

        assert!(TrieNode::assoc_root(&mut root, &mut context, 5, Entry::new(1, 99)));
        assert_eq!(context.take_change(), 0);
        assert_eq!(lookup(&root, 5, 1), Some(99));
    }

    #[rstest]
    fn test_root_branches_on_lowest_hash_slice() {
        let mut context = UpdateContext::new(2);

        let mut apart = None;
        insert(&mut apart, &mut context, 1, 1);
        insert(&mut apart, &mut context, 2, 2);
        let Some(TrieNode::Hash(node)) = apart.as_deref() else {
            panic!("two distinct low slices make a hash node");
        };
        assert_eq!(node.bitmap, 0b110);

        let mut nested = None;
        insert(&mut nested, &mut context, 32, 3);
        insert(&mut nested, &mut context, 64, 4);
        let Some(TrieNode::Hash(node)) = nested.as_deref() else {
            panic!("a shared low slice makes a hash node");
        };
        assert_eq!(node.bitmap, 0b1);
        let Some(TrieNode::Hash(inner)) = node.children.first().map(|child| &**child) else {
            panic!("the shared slot holds a deeper hash node");
        };
        assert_eq!(inner.bitmap, 0b110);
        assert_eq!(lookup(&nested, 32, 3), Some(30));
        assert_eq!(lookup(&nested, 64, 4), Some(40));
    }

    #[rstest]
    fn test_hash_node_promotes_at_thirty_two_children_and_demotes_below_sixteen() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        for key in 0..31u32 {
            insert(&mut root, &mut context, key, key);
        }
        assert!(!root.as_ref().unwrap().is_array());

        insert(&mut root, &mut context, 31, 31);
        assert!(root.as_ref().unwrap().is_array());
        assert_eq!(count(&root), 32);

        for key in 0..16u32 {
            assert!(remove(&mut root, &mut context, key, key));
        }
        assert!(root.as_ref().unwrap().is_array());
        assert_eq!(count(&root), 16);

        assert!(remove(&mut root, &mut context, 16, 16));
        assert!(!root.as_ref().unwrap().is_array());
        assert_eq!(count(&root), 15);
        for key in 17..32u32 {
            assert_eq!(lookup(&root, key, key), Some(key * 10));
        }
    }

    #[rstest]
    fn test_full_collision_uses_bucket_and_degenerates_to_entry() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        insert(&mut root, &mut context, 42, 1);
        insert(&mut root, &mut context, 42, 2);
        insert(&mut root, &mut context, 42, 3);
        assert!(root.as_ref().unwrap().is_collision());
        assert_eq!(count(&root), 3);

        assert!(remove(&mut root, &mut context, 42, 2));
        assert_eq!(count(&root), 2);
        assert!(remove(&mut root, &mut context, 42, 1));
        assert!(matches!(root.as_deref(), Some(TrieNode::Entry(_))));
        assert_eq!(lookup(&root, 42, 3), Some(30));
    }

    #[rstest]
    fn test_bucket_splits_when_foreign_hash_arrives() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        insert(&mut root, &mut context, 0b1_00001, 1);
        insert(&mut root, &mut context, 0b1_00001, 2);
        insert(&mut root, &mut context, 0b10_00001, 3);

        assert_eq!(count(&root), 3);
        assert_eq!(lookup(&root, 0b1_00001, 2), Some(20));
        assert_eq!(lookup(&root, 0b10_00001, 3), Some(30));
    }

    #[rstest]
    fn test_shared_prefix_builds_chain_and_collapses_on_removal() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        let low = 0x0000_0001;
        let high = 0x4000_0001;
        insert(&mut root, &mut context, low, 1);
        insert(&mut root, &mut context, high, 2);
        assert_eq!(count(&root), 2);
        assert_eq!(lookup(&root, high, 2), Some(20));

        assert!(remove(&mut root, &mut context, low, 1));
        assert!(matches!(root.as_deref(), Some(TrieNode::Entry(_))));
        assert!(remove(&mut root, &mut context, high, 2));
        assert!(root.is_none());
    }

    #[rstest]
    fn test_absent_removal_leaves_root_untouched() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        for key in 0..10u32 {
            insert(&mut root, &mut context, key, key);
        }
        let before = root.clone().unwrap();

        let mut other = UpdateContext::new(1);
        assert!(!remove(&mut root, &mut other, 3, 99));
        assert!(!remove(&mut root, &mut other, 300, 300));
        assert_eq!(other.take_change(), 0);
        assert!(ReferenceCounter::ptr_eq(&before, root.as_ref().unwrap()));
    }

    #[rstest]
    fn test_same_batch_mutates_in_place() {
        let mut root = None;
        let mut context = UpdateContext::new(8);
        insert(&mut root, &mut context, 1, 1);
        insert(&mut root, &mut context, 2, 2);
        let address = ReferenceCounter::as_ptr(root.as_ref().unwrap());

        insert(&mut root, &mut context, 3, 3);
        assert_eq!(ReferenceCounter::as_ptr(root.as_ref().unwrap()), address);
    }

    #[rstest]
    fn test_foreign_batch_copies_path_and_preserves_snapshot() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        for key in 0..64u32 {
            insert(&mut root, &mut context, key, key);
        }
        context.commit();
        let snapshot = root.clone();

        let mut next = UpdateContext::new(1);
        insert(&mut root, &mut next, 64, 64);
        remove(&mut root, &mut next, 0, 0);

        assert_eq!(count(&snapshot), 64);
        assert_eq!(lookup(&snapshot, 0, 0), Some(0));
        assert_eq!(lookup(&snapshot, 64, 64), None);
        assert_eq!(count(&root), 64);
        assert_eq!(lookup(&root, 0, 0), None);
    }

    #[rstest]
    fn test_declined_merge_changes_nothing() {
        let mut root = None;
        let mut context = UpdateContext::new(1);
        insert(&mut root, &mut context, 9, 9);
        let before = root.clone().unwrap();

        let mut keep = UpdateContext::with_merger(1, crate::persistent::KeepExisting);
        assert!(!TrieNode::assoc_root(&mut root, &mut keep, 9, Entry::new(9, 0)));
        assert!(ReferenceCounter::ptr_eq(&before, root.as_ref().unwrap()));
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(0b11111, 0, 31)]
    #[case(0b11111_00000, 5, 31)]
    #[case(0xC000_0000, 30, 3)]
    #[case(0xFFFF_FFFF, 35, 0)]
    fn test_fragment(#[case] hash: u32, #[case] shift: u32, #[case] expected: usize) {
        assert_eq!(fragment(hash, shift), expected);
    }

    #[rstest]
    fn test_headroom_growth() {
        let items = vec![1, 2, 3, 4];
        assert_eq!(copy_with_headroom(&items, 1).capacity(), 4);
        assert!(copy_with_headroom(&items, 100).capacity() >= 8);

        let mut single = Vec::with_capacity(2);
        single.extend([1, 2]);
        reserve_slot(&mut single, 1);
        assert_eq!(single.capacity(), 3);
    }
}
