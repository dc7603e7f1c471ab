//! Persistent (immutable) tree map based on Red-Black Tree.
//!
//! This module provides [`PersistentTreeMap`], an immutable sorted map
//! that uses structural sharing for efficient operations.
//!
//! # Overview
//!
//! `PersistentTreeMap` is based on a persistent Red-Black Tree, a self-balancing
//! binary search tree that provides efficient ordered map operations.
//!
//! - O(log N) get
//! - O(log N) assoc
//! - O(log N) dissoc
//! - O(log N) first/last
//! - O(log N + k) range queries where k is the number of results
//! - O(1) len and `is_empty`
//!
//! Keys are ordered by a [`Comparator`], [`NaturalOrder`] by default. `Eq` on
//! the keys is never consulted: two keys are the same key exactly when the
//! comparator says `Equal`.
//!
//! # Examples
//!
//! ```rust
//! use persistent_collections::persistent::PersistentTreeMap;
//!
//! let map = PersistentTreeMap::new()
//!     .assoc(3, "three")
//!     .assoc(1, "one")
//!     .assoc(2, "two");
//!
//! // Entries are always in sorted order
//! let keys: Vec<&i32> = map.keys().collect();
//! assert_eq!(keys, vec![&1, &2, &3]);
//!
//! // Range queries
//! let range: Vec<(&i32, &&str)> = map.range(1..3).collect();
//! assert_eq!(range.len(), 2); // 1 and 2
//! ```
//!
//! # Internal Structure
//!
//! The Red-Black Tree maintains the following invariants:
//! 1. Every node is either red or black
//! 2. The root is black
//! 3. Red nodes have only black children
//! 4. Every path from root to leaf has the same number of black nodes
//!
//! These invariants ensure the tree height is O(log N).

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::RangeBounds;

use super::comparator::{Comparator, NaturalOrder};
use super::context::{LastWriteWins, Merger, UpdateContext};
use super::entry::{Entry, Keys, Values};
use super::hashmap::expected_updates;
use super::rbtree::{Insertion, Link, TreeNode};
use super::tree_iter::{TreeIter, TreeRange, TreeSpliterator};
use super::view::MapView;
use super::ReferenceCounter;
use crate::error::CollectionError;

// =============================================================================
// PersistentTreeMap Definition
// =============================================================================

/// A persistent (immutable) sorted map based on Red-Black Tree.
///
/// # Time Complexity
///
/// | Operation      | Complexity |
/// |----------------|------------|
/// | `new`          | O(1)       |
/// | `get`          | O(log N)   |
/// | `assoc`        | O(log N)   |
/// | `dissoc`       | O(log N)   |
/// | `first`/`last` | O(log N)   |
/// | `range`        | O(log N + k) |
/// | `entry_at`     | O(N)       |
/// | `len`          | O(1)       |
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::PersistentTreeMap;
///
/// let map = PersistentTreeMap::new().assoc("b", 2).assoc("a", 1);
/// assert_eq!(map.first(), Some((&"a", &1)));
/// assert_eq!(map.last(), Some((&"b", &2)));
/// ```
pub struct PersistentTreeMap<K, V, C = NaturalOrder> {
    /// Root node of the tree; `None` when empty
    root: Link<K, V>,
    /// Number of entries
    length: usize,
    comparator: ReferenceCounter<C>,
}

impl<K, V> PersistentTreeMap<K, V> {
    /// Creates a new empty map ordered by `Ord`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, String> = PersistentTreeMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, C> PersistentTreeMap<K, V, C> {
    /// Creates a new empty map ordered by `comparator`.
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            root: None,
            length: 0,
            comparator: ReferenceCounter::new(comparator),
        }
    }

    /// Returns the number of entries in the map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the comparator that orders the keys.
    #[inline]
    #[must_use]
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns `true` if both maps share the same root.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.length == other.length
            && match (&self.root, &other.root) {
                (None, None) => true,
                (Some(mine), Some(theirs)) => ReferenceCounter::ptr_eq(mine, theirs),
                _ => false,
            }
    }

    /// Returns the entry with the smallest key.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        TreeNode::first(self.root.as_deref()).map(Entry::as_pair)
    }

    /// Returns the entry with the largest key.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        TreeNode::last(self.root.as_deref()).map(Entry::as_pair)
    }

    /// Returns an iterator over the entries in ascending key order.
    #[inline]
    pub fn iter(&self) -> TreeIter<'_, K, V> {
        TreeIter::ascending(self.root.as_deref(), self.length)
    }

    /// Returns an iterator over the entries in descending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, ()> = (1..=3).map(|key| (key, ())).collect();
    /// let keys: Vec<i32> = map.iter_descending().map(|(key, _)| *key).collect();
    /// assert_eq!(keys, vec![3, 2, 1]);
    /// ```
    #[inline]
    pub fn iter_descending(&self) -> TreeIter<'_, K, V> {
        TreeIter::descending(self.root.as_deref(), self.length)
    }

    /// Returns an iterator over the keys in ascending order.
    #[inline]
    pub fn keys(&self) -> Keys<TreeIter<'_, K, V>> {
        Keys::new(self.iter())
    }

    /// Returns an iterator over the values in ascending key order.
    #[inline]
    pub fn values(&self) -> Values<TreeIter<'_, K, V>> {
        Values::new(self.iter())
    }

    /// Returns a splittable cursor over the entries in ascending key order.
    #[inline]
    pub fn spliterator(&self) -> TreeSpliterator<'_, K, V, C> {
        TreeSpliterator::new(self.root.as_deref(), &*self.comparator, self.length)
    }

    /// Returns the entry at position `index` in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::IndexOutOfBounds`] if `index >= len()`.
    ///
    /// # Complexity
    ///
    /// O(index + log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::new().assoc(20, "b").assoc(10, "a");
    /// assert_eq!(map.entry_at(1), Ok((&20, &"b")));
    /// assert!(map.entry_at(2).is_err());
    /// ```
    pub fn entry_at(&self, index: usize) -> Result<(&K, &V), CollectionError> {
        self.iter()
            .nth(index)
            .ok_or(CollectionError::IndexOutOfBounds {
                index,
                length: self.length,
            })
    }

    /// Returns a read-only view of the map.
    #[inline]
    pub const fn as_map(&self) -> MapView<'_, Self> {
        MapView::new(self)
    }
}

impl<K, V, C: Comparator<K>> PersistentTreeMap<K, V, C> {
    /// Returns the entry stored under `key`.
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        TreeNode::find(self.root.as_deref(), &*self.comparator, key)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::new().assoc("hello".to_string(), 42);
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.find(key).map(Entry::value)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.find(key).is_some()
    }

    /// Returns an ascending iterator over the entries whose keys fall in `range`.
    ///
    /// Subtrees entirely outside the range are never visited.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, i32> = (0..10).map(|key| (key, key * key)).collect();
    /// let squares: Vec<i32> = map.range(3..=5).map(|(_, square)| *square).collect();
    /// assert_eq!(squares, vec![9, 16, 25]);
    /// ```
    pub fn range<R>(&self, range: R) -> TreeRange<'_, K, V, C>
    where
        R: RangeBounds<K>,
        K: Clone,
    {
        TreeRange::ascending(
            self.root.as_deref(),
            &*self.comparator,
            &range.start_bound().cloned(),
            range.end_bound().cloned(),
        )
    }

    /// Returns a descending iterator over the entries whose keys fall in `range`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, ()> = (0..10).map(|key| (key, ())).collect();
    /// let keys: Vec<i32> = map.range_descending(..4).map(|(key, _)| *key).collect();
    /// assert_eq!(keys, vec![3, 2, 1, 0]);
    /// ```
    pub fn range_descending<R>(&self, range: R) -> TreeRange<'_, K, V, C>
    where
        R: RangeBounds<K>,
        K: Clone,
    {
        TreeRange::descending(
            self.root.as_deref(),
            &*self.comparator,
            range.start_bound().cloned(),
            &range.end_bound().cloned(),
        )
    }
}

impl<K: Clone + Ord, V: Clone> PersistentTreeMap<K, V> {
    /// Creates a map containing a single key-value pair.
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().assoc(key, value)
    }
}

impl<K, V, C> PersistentTreeMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    fn rebuilt(&self, root: Link<K, V>, length: usize) -> Self {
        Self {
            root,
            length,
            comparator: ReferenceCounter::clone(&self.comparator),
        }
    }

    /// Returns a new map with `key` bound to `value`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn assoc(&self, key: K, value: V) -> Self {
        self.assoc_with(key, value, LastWriteWins)
    }

    /// Returns a new map with `key` bound to `value`, letting `merger` decide
    /// whether an existing binding is replaced.
    ///
    /// Returns a map `ptr_eq` to `self` if the merger declines.
    #[must_use]
    pub fn assoc_with<M: Merger<K, V>>(&self, key: K, value: V, merger: M) -> Self {
        let mut context = UpdateContext::with_merger(1, merger);
        let mut root = self.root.clone();
        let outcome =
            TreeNode::insert_root(&mut root, &mut context, &*self.comparator, Entry::new(key, value));
        context.commit();
        if outcome == Insertion::Unchanged {
            return self.clone();
        }
        self.rebuilt(root, self.length.saturating_add_signed(context.take_change()))
    }

    /// Returns a new map with every pair of `entries` added under one update
    /// context.
    #[must_use]
    pub fn assoc_all<I>(&self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.assoc_all_with(entries, LastWriteWins)
    }

    /// Like [`assoc_all`](Self::assoc_all), with `merger` resolving existing keys.
    #[must_use]
    pub fn assoc_all_with<I, M>(&self, entries: I, merger: M) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        M: Merger<K, V>,
    {
        let entries = entries.into_iter();
        let mut context = UpdateContext::with_merger(expected_updates(&entries), merger);
        let mut root = self.root.clone();
        let mut length = self.length;
        let mut changed = false;
        for (key, value) in entries {
            let outcome = TreeNode::insert_root(
                &mut root,
                &mut context,
                &*self.comparator,
                Entry::new(key, value),
            );
            changed |= outcome != Insertion::Unchanged;
            length = length.saturating_add_signed(context.take_change());
        }
        context.commit();
        if changed {
            self.rebuilt(root, length)
        } else {
            self.clone()
        }
    }

    /// Returns a new map without `key`.
    ///
    /// Returns a map `ptr_eq` to `self` if the key is absent.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn dissoc<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let mut context = UpdateContext::new(1);
        let mut root = self.root.clone();
        let removed = TreeNode::remove_root(&mut root, &mut context, &*self.comparator, key);
        context.commit();
        if !removed {
            return self.clone();
        }
        self.rebuilt(root, self.length.saturating_add_signed(context.take_change()))
    }

    /// Returns a new map without any of `keys`, removed under one update context.
    #[must_use]
    pub fn dissoc_all<'a, Q, I>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = &'a Q>,
        K: Borrow<Q>,
        Q: ?Sized + 'a,
        C: Comparator<Q>,
    {
        let keys = keys.into_iter();
        let mut context = UpdateContext::new(expected_updates(&keys));
        let mut root = self.root.clone();
        let mut length = self.length;
        let mut changed = false;
        for key in keys {
            changed |= TreeNode::remove_root(&mut root, &mut context, &*self.comparator, key);
            length = length.saturating_add_signed(context.take_change());
        }
        context.commit();
        if changed {
            self.rebuilt(root, length)
        } else {
            self.clone()
        }
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An owning iterator over the entries of a [`PersistentTreeMap`], in
/// ascending key order.
pub struct PersistentTreeMapIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for PersistentTreeMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for PersistentTreeMapIntoIterator<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl<K, V> ExactSizeIterator for PersistentTreeMapIntoIterator<K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, C> Clone for PersistentTreeMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
            comparator: ReferenceCounter::clone(&self.comparator),
        }
    }
}

impl<K, V, C: Default> Default for PersistentTreeMap<K, V, C> {
    #[inline]
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C> FromIterator<(K, V)> for PersistentTreeMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::default().assoc_all(iter)
    }
}

impl<K, V, C, const N: usize> From<[(K, V); N]> for PersistentTreeMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Default,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Clone, V: Clone, C> IntoIterator for PersistentTreeMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = PersistentTreeMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let entries: Vec<(K, V)> = self
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        PersistentTreeMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a PersistentTreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = TreeIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for PersistentTreeMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<K: Eq, V: Eq, C> Eq for PersistentTreeMap<K, V, C> {}

impl<K: Hash, V: Hash, C> Hash for PersistentTreeMap<K, V, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for PersistentTreeMap<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentTreeMap<i32, String>: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K: serde::Serialize, V: serde::Serialize, C> serde::Serialize for PersistentTreeMap<K, V, C> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentTreeMapVisitor<K, V> {
    marker: std::marker::PhantomData<fn() -> PersistentTreeMap<K, V>>,
}

#[cfg(feature = "serde")]
impl<K, V> PersistentTreeMapVisitor<K, V> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for PersistentTreeMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Clone + Ord,
    V: serde::Deserialize<'de> + Clone,
{
    type Value = PersistentTreeMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(entry) = access.next_entry()? {
            entries.push(entry);
        }
        Ok(PersistentTreeMap::new().assoc_all(entries))
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for PersistentTreeMap<K, V>
where
    K: serde::Deserialize<'de> + Clone + Ord,
    V: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentTreeMapVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================
