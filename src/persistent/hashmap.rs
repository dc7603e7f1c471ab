//! Persistent Hash Map (HAMT - Hash Array Mapped Trie).
//!
//! This module provides [`PersistentHashMap`], an immutable hash map
//! that uses structural sharing for efficient updates, and
//! [`MutableHashMap`], its transient counterpart for batch edits.
//!
//! # Overview
//!
//! `PersistentHashMap` is based on Phil Bagwell's Hash Array Mapped Trie.
//! Keys are hashed to 32 bits and the hash is consumed five bits per level,
//! lowest bits first. Sparse levels use bitmap-indexed nodes, dense levels
//! switch to 32-slot arrays, and keys whose full hashes collide share a
//! linear bucket.
//!
//! - O(log32 N) get (effectively O(1) for practical sizes)
//! - O(log32 N) assoc and dissoc
//! - O(1) len and is_empty
//!
//! # Examples
//!
//! ```rust
//! use persistent_collections::persistent::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .assoc("one".to_string(), 1)
//!     .assoc("two".to_string(), 2)
//!     .assoc("three".to_string(), 3);
//!
//! assert_eq!(map.get("one"), Some(&1));
//! assert_eq!(map.get("four"), None);
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.assoc("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));
//! assert_eq!(updated.get("one"), Some(&100));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::rc::Rc;

use super::context::{CapturePrevious, LastWriteWins, Merger, RejectDuplicates, UpdateContext};
use super::entry::{Entry, Keys, Values};
use super::trie::{NodeRef, TrieNode, hash_key};
use super::trie_iter::{TrieIter, TrieSpliterator};
use super::view::MapView;
use super::ReferenceCounter;
use crate::error::CollectionError;
use crate::tracing_helpers::debug_log;

// =============================================================================
// Default Hasher
// =============================================================================

/// Hash builder used when none is given.
///
/// Deterministic SipHash unless the `fxhash` or `ahash` feature is enabled.
#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
pub type DefaultHashBuilder =
    std::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>;

/// Hash builder used when none is given.
///
/// `FxHash` from `rustc-hash`, selected by the `fxhash` feature.
#[cfg(feature = "fxhash")]
pub type DefaultHashBuilder = rustc_hash::FxBuildHasher;

/// Hash builder used when none is given.
///
/// `AHash` with fixed keys, selected by the `ahash` feature.
#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
pub type DefaultHashBuilder = std::hash::BuildHasherDefault<ahash::AHasher>;

/// Size hint for a batch built from an iterator.
pub(crate) fn expected_updates<I: Iterator>(iter: &I) -> usize {
    iter.size_hint().0.max(1)
}

// =============================================================================
// PersistentHashMap Definition
// =============================================================================

/// A persistent (immutable) hash map based on HAMT.
///
/// `PersistentHashMap` is an immutable data structure that uses structural
/// sharing to efficiently support functional programming patterns.
///
/// Operations that leave the map unchanged (removing an absent key, or an
/// insertion the merger declines) return a map that is
/// [`ptr_eq`](Self::ptr_eq) to the original.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `get`          | O(log32 N)        |
/// | `assoc`        | O(log32 N)        |
/// | `dissoc`       | O(log32 N)        |
/// | `contains_key` | O(log32 N)        |
/// | `len`          | O(1)              |
/// | `transient`    | O(1)              |
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::PersistentHashMap;
///
/// let map = PersistentHashMap::singleton("key".to_string(), 42);
/// assert_eq!(map.get("key"), Some(&42));
/// ```
pub struct PersistentHashMap<K, V, S = DefaultHashBuilder> {
    /// Root node of the trie; `None` when empty
    root: Option<NodeRef<K, V>>,
    /// Number of entries
    length: usize,
    hasher: S,
}

impl<K, V> PersistentHashMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, S> PersistentHashMap<K, V, S> {
    /// Creates a new empty map that hashes keys with `hasher`.
    #[inline]
    #[must_use]
    pub const fn with_hasher(hasher: S) -> Self {
        Self {
            root: None,
            length: 0,
            hasher,
        }
    }

    pub(crate) const fn from_parts(root: Option<NodeRef<K, V>>, length: usize, hasher: S) -> Self {
        Self {
            root,
            length,
            hasher,
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
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

    /// Returns the map's hash builder.
    #[inline]
    #[must_use]
    pub const fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Returns `true` if both maps share the same root, which means one was
    /// produced from the other by a no-op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().assoc(1, "one");
    /// assert!(map.dissoc(&2).ptr_eq(&map));
    /// assert!(!map.dissoc(&1).ptr_eq(&map));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.length == other.length
            && match (&self.root, &other.root) {
                (None, None) => true,
                (Some(mine), Some(theirs)) => ReferenceCounter::ptr_eq(mine, theirs),
                _ => false,
            }
    }

    /// Returns an iterator over key-value pairs, in trie order.
    #[inline]
    pub fn iter(&self) -> TrieIter<'_, K, V> {
        TrieIter::new(self.root.as_deref(), self.length)
    }

    /// Returns an iterator over the keys.
    #[inline]
    pub fn keys(&self) -> Keys<TrieIter<'_, K, V>> {
        Keys::new(self.iter())
    }

    /// Returns an iterator over the values.
    #[inline]
    pub fn values(&self) -> Values<TrieIter<'_, K, V>> {
        Values::new(self.iter())
    }

    /// Returns a splittable cursor over the entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::{PersistentHashMap, Spliterator};
    ///
    /// let map: PersistentHashMap<i32, i32> = (0..100).map(|key| (key, key)).collect();
    /// let mut suffix = map.spliterator();
    /// let prefix = suffix.try_split().unwrap();
    /// assert_eq!(prefix.count() + suffix.count(), 100);
    /// ```
    #[inline]
    pub fn spliterator(&self) -> TrieSpliterator<'_, K, V> {
        TrieSpliterator::new(self.root.as_deref(), self.length)
    }

    /// Returns a read-only view of the map.
    #[inline]
    pub const fn as_map(&self) -> MapView<'_, Self> {
        MapView::new(self)
    }
}

impl<K, V, S> PersistentHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Returns the entry stored under `key`.
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let root = self.root.as_deref()?;
        root.find(hash_key(&self.hasher, key), key)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash` and
    /// `Eq` on the borrowed form must match those for the key type.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().assoc("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).map(Entry::value)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> PersistentHashMap<K, V> {
    /// Creates a map containing a single key-value pair.
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().assoc(key, value)
    }
}

impl<K, V, S> PersistentHashMap<K, V, S>
where
    K: Clone + Hash + Eq,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    /// Builds a map from parallel key and value lists.
    ///
    /// Later duplicates of a key win.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::LengthMismatch`] if the lists differ in length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<_, _> =
    ///     PersistentHashMap::from_keys_values(vec!["a", "b"], vec![1, 2]).unwrap();
    /// assert_eq!(map.get(&"b"), Some(&2));
    ///
    /// assert!(PersistentHashMap::<&str, i32>::from_keys_values(vec!["a"], vec![]).is_err());
    /// ```
    pub fn from_keys_values(keys: Vec<K>, values: Vec<V>) -> Result<Self, CollectionError> {
        if keys.len() != values.len() {
            return Err(CollectionError::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        Ok(keys.into_iter().zip(values).collect())
    }
}

impl<K, V, S> PersistentHashMap<K, V, S>
where
    K: Clone + Hash + Eq,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn rebuilt(&self, root: Option<NodeRef<K, V>>, length: usize) -> Self {
        Self::from_parts(root, length, self.hasher.clone())
    }

    /// Returns a new map with `key` bound to `value`.
    ///
    /// An existing binding is replaced.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
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
        let hash = hash_key(&self.hasher, &key);
        let changed = TrieNode::assoc_root(&mut root, &mut context, hash, Entry::new(key, value));
        context.commit();
        if !changed {
            return self.clone();
        }
        self.rebuilt(root, self.length.saturating_add_signed(context.take_change()))
    }

    /// Returns a new map with `key` bound to `value`, failing if the key is
    /// already present.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::DuplicateKey`] if `key` is already bound.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentHashMap;
    /// use persistent_collections::CollectionError;
    ///
    /// let map = PersistentHashMap::new().assoc("a", 1);
    /// assert_eq!(map.assoc_new("a", 2).unwrap_err(), CollectionError::DuplicateKey);
    /// assert_eq!(map.assoc_new("b", 2).unwrap().len(), 2);
    /// ```
    pub fn assoc_new(&self, key: K, value: V) -> Result<Self, CollectionError> {
        let mut context = UpdateContext::with_merger(1, RejectDuplicates::new());
        let mut root = self.root.clone();
        let hash = hash_key(&self.hasher, &key);
        TrieNode::assoc_root(&mut root, &mut context, hash, Entry::new(key, value));
        context.commit();
        if context.merger().rejected() {
            return Err(CollectionError::DuplicateKey);
        }
        Ok(self.rebuilt(root, self.length.saturating_add_signed(context.take_change())))
    }

    /// Returns a new map with every pair of `entries` added, in order.
    ///
    /// All insertions share one update context, so nodes created by earlier
    /// insertions are edited in place by later ones.
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
            let hash = hash_key(&self.hasher, &key);
            changed |= TrieNode::assoc_root(&mut root, &mut context, hash, Entry::new(key, value));
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
    /// O(log32 N)
    #[must_use]
    pub fn dissoc<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut context = UpdateContext::new(1);
        let mut root = self.root.clone();
        let hash = hash_key(&self.hasher, key);
        let removed = TrieNode::dissoc_root(&mut root, &mut context, hash, key);
        context.commit();
        if !removed {
            return self.clone();
        }
        self.rebuilt(root, self.length.saturating_add_signed(context.take_change()))
    }

    /// Returns a new map without any of `keys`, removed under one update context.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<String, i32> =
    ///     [("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)].into();
    /// let trimmed = map.dissoc_all(["a", "c", "z"]);
    /// assert_eq!(trimmed.len(), 1);
    /// assert!(trimmed.contains_key("b"));
    /// ```
    #[must_use]
    pub fn dissoc_all<'a, Q, I>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = &'a Q>,
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized + 'a,
    {
        let keys = keys.into_iter();
        let mut context = UpdateContext::new(expected_updates(&keys));
        let mut root = self.root.clone();
        let mut length = self.length;
        let mut changed = false;
        for key in keys {
            let hash = hash_key(&self.hasher, key);
            changed |= TrieNode::dissoc_root(&mut root, &mut context, hash, key);
            length = length.saturating_add_signed(context.take_change());
        }
        context.commit();
        if changed {
            self.rebuilt(root, length)
        } else {
            self.clone()
        }
    }

    /// Returns a transient copy of this map for batch edits.
    ///
    /// # Complexity
    ///
    /// O(1): the trie is shared until the transient edits it.
    #[must_use]
    pub fn transient(&self) -> MutableHashMap<K, V, S> {
        MutableHashMap::from_parts(self.root.clone(), self.length, self.hasher.clone())
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An owning iterator over key-value pairs of a [`PersistentHashMap`].
pub struct PersistentHashMapIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for PersistentHashMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIntoIterator<K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, S: Clone> Clone for PersistentHashMap<K, V, S> {
    fn clone(&self) -> Self {
        Self::from_parts(self.root.clone(), self.length, self.hasher.clone())
    }
}

impl<K, V, S: Default> Default for PersistentHashMap<K, V, S> {
    #[inline]
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> FromIterator<(K, V)> for PersistentHashMap<K, V, S>
where
    K: Clone + Hash + Eq,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::default().assoc_all(iter)
    }
}

impl<K, V, S, const N: usize> From<[(K, V); N]> for PersistentHashMap<K, V, S>
where
    K: Clone + Hash + Eq,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Clone, V: Clone, S> IntoIterator for PersistentHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = PersistentHashMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let entries: Vec<(K, V)> = self
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        PersistentHashMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a PersistentHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = TrieIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> PartialEq for PersistentHashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        if self.ptr_eq(other) {
            return true;
        }
        self.iter()
            .all(|(key, value)| other.get(key).is_some_and(|other_value| other_value == value))
    }
}

impl<K: Hash + Eq, V: Eq, S: BuildHasher> Eq for PersistentHashMap<K, V, S> {}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for PersistentHashMap<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentHashMap<i32, String>: Send, Sync);

// =============================================================================
// MutableHashMap Definition
// =============================================================================

/// A transient (temporarily mutable) hash map for efficient batch updates.
///
/// A `MutableHashMap` owns one long-lived [`UpdateContext`]. Nodes it creates
/// are stamped with that context and edited in place by later calls; nodes
/// it shares with a persistent map are copied on first write.
///
/// [`to_persistent_map`](Self::to_persistent_map) commits the context and
/// returns a persistent map sharing the current trie. The transient stays
/// usable: its next edit starts a fresh context, so the snapshot is never
/// modified.
///
/// # Design
///
/// - `PhantomData<Rc<()>>` ensures `!Send` and `!Sync`: a transient is
///   single-owner and single-threaded
/// - Clone is intentionally not implemented
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::{MutableHashMap, PersistentHashMap};
///
/// let persistent: PersistentHashMap<&str, i32> = [("a", 1), ("b", 2)].into();
///
/// let mut transient = persistent.transient();
/// assert_eq!(transient.put("a", 10), Some(1));
/// assert_eq!(transient.put("c", 3), None);
/// assert_eq!(transient.remove(&"b"), Some(2));
///
/// let updated = transient.persistent();
/// assert_eq!(updated.len(), 2);
/// assert_eq!(updated.get(&"a"), Some(&10));
/// assert_eq!(persistent.get(&"a"), Some(&1));
/// ```
pub struct MutableHashMap<K, V, S = DefaultHashBuilder> {
    root: Option<NodeRef<K, V>>,
    length: usize,
    hasher: S,
    context: UpdateContext,
    /// Marker to ensure `!Send` and `!Sync`.
    _marker: PhantomData<Rc<()>>,
}

static_assertions::assert_not_impl_any!(MutableHashMap<i32, i32>: Send, Sync);
static_assertions::assert_not_impl_any!(MutableHashMap<String, String>: Send, Sync);

impl<K, V> MutableHashMap<K, V> {
    /// Creates an empty transient map.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty transient map sized for about `expected_updates` edits
    /// per batch.
    #[must_use]
    pub fn with_expected_updates(expected_updates: usize) -> Self {
        let mut map = Self::new();
        map.context = UpdateContext::new(expected_updates);
        map
    }
}

impl<K, V, S> MutableHashMap<K, V, S> {
    /// Creates an empty transient map that hashes keys with `hasher`.
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(None, 0, hasher)
    }

    fn from_parts(root: Option<NodeRef<K, V>>, length: usize, hasher: S) -> Self {
        Self {
            root,
            length,
            hasher,
            context: UpdateContext::new(1),
            _marker: PhantomData,
        }
    }

    /// Returns the number of entries.
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

    /// Returns an iterator over key-value pairs, in trie order.
    #[inline]
    pub fn iter(&self) -> TrieIter<'_, K, V> {
        TrieIter::new(self.root.as_deref(), self.length)
    }

    /// Returns the live batch context, starting a new batch after a commit.
    fn batch(&mut self) -> &UpdateContext {
        if self.context.is_committed() {
            self.context = UpdateContext::new(self.context.expected_updates());
        }
        &self.context
    }
}

impl<K, V, S> MutableHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let root = self.root.as_deref()?;
        root.find(hash_key(&self.hasher, key), key).map(Entry::value)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K, V, S> MutableHashMap<K, V, S>
where
    K: Clone + Hash + Eq,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn apply_assoc<M: Merger<K, V>>(
        &mut self,
        context: &mut UpdateContext<M>,
        key: K,
        value: V,
    ) -> bool {
        let hash = hash_key(&self.hasher, &key);
        let changed = TrieNode::assoc_root(&mut self.root, context, hash, Entry::new(key, value));
        self.length = self.length.saturating_add_signed(context.take_change());
        changed
    }

    /// Binds `key` to `value` and returns the value it replaced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::MutableHashMap;
    ///
    /// let mut map = MutableHashMap::new();
    /// assert_eq!(map.put("a", 1), None);
    /// assert_eq!(map.put("a", 2), Some(1));
    /// ```
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let mut context = self.batch().rebind(CapturePrevious::new());
        self.apply_assoc(&mut context, key, value);
        context.into_merger().into_previous()
    }

    /// Binds `key` to `value`, letting `merger` decide whether an existing
    /// binding is replaced. Returns `true` if the map changed.
    pub fn put_with<M: Merger<K, V>>(&mut self, key: K, value: V, merger: M) -> bool {
        let mut context = self.batch().rebind(merger);
        self.apply_assoc(&mut context, key, value)
    }

    /// Binds `key` to `value`, or to `remapping(existing, value)` if the key
    /// is already bound.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::MutableHashMap;
    ///
    /// let mut counts = MutableHashMap::new();
    /// for word in ["a", "b", "a"] {
    ///     counts.merge(word, 1, |existing, added| existing + added);
    /// }
    /// assert_eq!(counts.get(&"a"), Some(&2));
    /// assert_eq!(counts.get(&"b"), Some(&1));
    /// ```
    pub fn merge<F>(&mut self, key: K, value: V, remapping: F)
    where
        F: FnOnce(&V, V) -> V,
    {
        let merged = match self.get(&key) {
            Some(existing) => remapping(existing, value),
            None => value,
        };
        self.put_with(key, merged, LastWriteWins);
    }

    /// Removes `key` and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut context = self.batch().rebind(CapturePrevious::new());
        let hash = hash_key(&self.hasher, key);
        if !TrieNode::dissoc_root(&mut self.root, &mut context, hash, key) {
            return None;
        }
        self.length = self.length.saturating_add_signed(context.take_change());
        context.into_merger().into_previous()
    }

    /// Commits the current batch and returns a persistent map sharing the trie.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn to_persistent_map(&mut self) -> PersistentHashMap<K, V, S> {
        self.context.commit();
        debug_log!(size = self.length, "transient map frozen");
        PersistentHashMap::from_parts(self.root.clone(), self.length, self.hasher.clone())
    }

    /// Consumes the transient and returns the persistent map.
    #[must_use]
    pub fn persistent(mut self) -> PersistentHashMap<K, V, S> {
        self.context.commit();
        debug_log!(size = self.length, "transient map frozen");
        PersistentHashMap::from_parts(self.root, self.length, self.hasher)
    }
}

impl<K, V> Default for MutableHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Extend<(K, V)> for MutableHashMap<K, V, S>
where
    K: Clone + Hash + Eq,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let mut context = self.batch().rebind(LastWriteWins);
        for (key, value) in iter {
            self.apply_assoc(&mut context, key, value);
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone> FromIterator<(K, V)> for MutableHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_expected_updates(expected_updates(&iter));
        map.extend(iter);
        map
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for MutableHashMap<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, S> serde::Serialize for PersistentHashMap<K, V, S>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: serde::Serializer,
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
struct PersistentHashMapVisitor<K, V, S> {
    marker: PhantomData<fn() -> PersistentHashMap<K, V, S>>,
}

#[cfg(feature = "serde")]
impl<K, V, S> PersistentHashMapVisitor<K, V, S> {
    const fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> serde::de::Visitor<'de> for PersistentHashMapVisitor<K, V, S>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone,
    S: BuildHasher + Clone + Default,
{
    type Value = PersistentHashMap<K, V, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut transient = MutableHashMap::with_hasher(S::default());
        while let Some((key, value)) = access.next_entry()? {
            transient.put_with(key, value, LastWriteWins);
        }
        Ok(transient.persistent())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> serde::Deserialize<'de> for PersistentHashMap<K, V, S>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone,
    S: BuildHasher + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentHashMapVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================
