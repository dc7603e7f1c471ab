//! Persistent Hash Set based on the hash trie.
//!
//! This module provides [`PersistentHashSet`], an immutable hash set that
//! uses structural sharing for efficient operations, and [`MutableHashSet`],
//! its transient counterpart.
//!
//! # Overview
//!
//! `PersistentHashSet` is a thin wrapper around
//! [`PersistentHashMap<T, ()>`](PersistentHashMap). Adding an element that
//! is already present keeps the stored element and returns a set that is
//! `ptr_eq` to the original.
//!
//! # Examples
//!
//! ```rust
//! use persistent_collections::persistent::PersistentHashSet;
//!
//! let set = PersistentHashSet::new()
//!     .conj(1)
//!     .conj(2)
//!     .conj(3);
//!
//! assert!(set.contains(&1));
//! assert!(!set.contains(&4));
//! assert_eq!(set.len(), 3);
//!
//! // Structural sharing: the original set is preserved
//! let updated = set.conj(4);
//! assert_eq!(set.len(), 3);
//! assert_eq!(updated.len(), 4);
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use super::context::KeepExisting;
use super::entry::Keys;
use super::hashmap::{DefaultHashBuilder, MutableHashMap, PersistentHashMap};
use super::trie_iter::{TrieIter, TrieSpliterator};
use super::view::SetView;

// =============================================================================
// PersistentHashSet Definition
// =============================================================================

/// A persistent (immutable) hash set based on HAMT.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `contains`     | O(log32 N)        |
/// | `conj`         | O(log32 N)        |
/// | `disj`         | O(log32 N)        |
/// | `len`          | O(1)              |
/// | `union`        | O(m log32 N)      |
/// | `intersection` | O(min(N, m) log32 max(N, m)) |
/// | `difference`   | O(m log32 N)      |
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::PersistentHashSet;
///
/// let set: PersistentHashSet<i32> = [1, 2, 3].into_iter().collect();
/// assert!(set.conj(2).ptr_eq(&set));
/// ```
pub struct PersistentHashSet<T, S = DefaultHashBuilder> {
    inner: PersistentHashMap<T, (), S>,
}

impl<T> PersistentHashSet<T> {
    /// Creates a new empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: PersistentHashMap::new(),
        }
    }
}

impl<T, S> PersistentHashSet<T, S> {
    /// Creates a new empty set that hashes elements with `hasher`.
    #[inline]
    #[must_use]
    pub const fn with_hasher(hasher: S) -> Self {
        Self {
            inner: PersistentHashMap::with_hasher(hasher),
        }
    }

    /// Returns the number of elements in the set.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns `true` if both sets share the same root.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }

    /// Returns an iterator over the elements, in trie order.
    #[inline]
    pub fn iter(&self) -> Keys<TrieIter<'_, T, ()>> {
        self.inner.keys()
    }

    /// Returns a splittable cursor over the elements.
    #[inline]
    pub fn spliterator(&self) -> Keys<TrieSpliterator<'_, T, ()>> {
        Keys::new(self.inner.spliterator())
    }

    /// Returns a read-only view of the set.
    #[inline]
    pub const fn as_set(&self) -> SetView<'_, Self> {
        SetView::new(self)
    }
}

impl<T: Hash + Eq, S: BuildHasher> PersistentHashSet<T, S> {
    /// Returns `true` if the set contains the element.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(element)
    }

    /// Returns `true` if every element of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|element| other.contains(element))
    }
}

impl<T: Clone + Hash + Eq> PersistentHashSet<T> {
    /// Creates a set containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::new().conj(element)
    }
}

impl<T, S> PersistentHashSet<T, S>
where
    T: Clone + Hash + Eq,
    S: BuildHasher + Clone,
{
    const fn wrap(inner: PersistentHashMap<T, (), S>) -> Self {
        Self { inner }
    }

    /// Returns a new set with `element` added.
    ///
    /// Returns a set `ptr_eq` to `self` if the element is already present.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    #[must_use]
    pub fn conj(&self, element: T) -> Self {
        Self::wrap(self.inner.assoc_with(element, (), KeepExisting))
    }

    /// Returns a new set without `element`.
    ///
    /// Returns a set `ptr_eq` to `self` if the element is absent.
    #[must_use]
    pub fn disj<Q>(&self, element: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Self::wrap(self.inner.dissoc(element))
    }

    /// Returns a new set with every element of `elements` added under one
    /// update context.
    #[must_use]
    pub fn conj_all<I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let entries = elements.into_iter().map(|element| (element, ()));
        Self::wrap(self.inner.assoc_all_with(entries, KeepExisting))
    }

    /// Returns a new set without any of `elements`.
    #[must_use]
    pub fn disj_all<'a, Q, I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = &'a Q>,
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized + 'a,
    {
        Self::wrap(self.inner.dissoc_all(elements))
    }

    /// Returns the union of two sets.
    ///
    /// The smaller set is inserted into the larger one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::PersistentHashSet;
    ///
    /// let left: PersistentHashSet<i32> = [1, 2].into_iter().collect();
    /// let right: PersistentHashSet<i32> = [2, 3].into_iter().collect();
    /// let union = left.union(&right);
    /// assert_eq!(union.len(), 3);
    /// ```
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let (larger, smaller) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        larger.conj_all(smaller.iter().cloned())
    }

    /// Returns the elements present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let (larger, smaller) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let shared = smaller
            .iter()
            .filter(|element| larger.contains(*element))
            .cloned();
        Self::with_hasher(self.inner.hasher().clone()).conj_all(shared)
    }

    /// Returns the elements of `self` that are not in `other`.
    ///
    /// Returns a set `ptr_eq` to `self` if the sets are disjoint.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.disj_all(other.iter())
    }

    /// Returns a transient copy of this set for batch edits.
    #[must_use]
    pub fn transient(&self) -> MutableHashSet<T, S> {
        MutableHashSet {
            inner: self.inner.transient(),
        }
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An owning iterator over the elements of a [`PersistentHashSet`].
pub struct PersistentHashSetIntoIterator<T> {
    elements: std::vec::IntoIter<T>,
}

impl<T> Iterator for PersistentHashSetIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.elements.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.elements.size_hint()
    }
}

impl<T> ExactSizeIterator for PersistentHashSetIntoIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T, S: Clone> Clone for PersistentHashSet<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, S: Default> Default for PersistentHashSet<T, S> {
    #[inline]
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T, S> FromIterator<T> for PersistentHashSet<T, S>
where
    T: Clone + Hash + Eq,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::default().conj_all(iter)
    }
}

impl<T, S, const N: usize> From<[T; N]> for PersistentHashSet<T, S>
where
    T: Clone + Hash + Eq,
    S: BuildHasher + Clone + Default,
{
    fn from(elements: [T; N]) -> Self {
        elements.into_iter().collect()
    }
}

impl<T: Clone, S> IntoIterator for PersistentHashSet<T, S> {
    type Item = T;
    type IntoIter = PersistentHashSetIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        let elements: Vec<T> = self.iter().cloned().collect();
        PersistentHashSetIntoIterator {
            elements: elements.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a PersistentHashSet<T, S> {
    type Item = &'a T;
    type IntoIter = Keys<TrieIter<'a, T, ()>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Hash + Eq, S: BuildHasher> PartialEq for PersistentHashSet<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Hash + Eq, S: BuildHasher> Eq for PersistentHashSet<T, S> {}

impl<T: fmt::Debug, S> fmt::Debug for PersistentHashSet<T, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentHashSet<String>: Send, Sync);

// =============================================================================
// MutableHashSet Definition
// =============================================================================

/// A transient (temporarily mutable) hash set for efficient batch updates.
///
/// A wrapper around [`MutableHashMap<T, ()>`](MutableHashMap); it inherits
/// the map's single-context batching and its `!Send`/`!Sync` marker.
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::MutableHashSet;
///
/// let mut transient = MutableHashSet::new();
/// assert!(transient.insert(1));
/// assert!(!transient.insert(1));
/// transient.extend([2, 3]);
///
/// let persistent = transient.persistent();
/// assert_eq!(persistent.len(), 3);
/// ```
pub struct MutableHashSet<T, S = DefaultHashBuilder> {
    inner: MutableHashMap<T, (), S>,
}

static_assertions::assert_not_impl_any!(MutableHashSet<i32>: Send, Sync);
static_assertions::assert_not_impl_any!(MutableHashSet<String>: Send, Sync);

impl<T> MutableHashSet<T> {
    /// Creates an empty transient set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: MutableHashMap::new(),
        }
    }
}

impl<T, S> MutableHashSet<T, S> {
    /// Creates an empty transient set that hashes elements with `hasher`.
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            inner: MutableHashMap::with_hasher(hasher),
        }
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> Keys<TrieIter<'_, T, ()>> {
        Keys::new(self.inner.iter())
    }
}

impl<T: Hash + Eq, S: BuildHasher> MutableHashSet<T, S> {
    /// Returns `true` if the set contains the element.
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(element)
    }
}

impl<T, S> MutableHashSet<T, S>
where
    T: Clone + Hash + Eq,
    S: BuildHasher + Clone,
{
    /// Adds `element`. Returns `true` if it was not present.
    pub fn insert(&mut self, element: T) -> bool {
        self.inner.put_with(element, (), KeepExisting)
    }

    /// Removes `element`. Returns `true` if it was present.
    pub fn remove<Q>(&mut self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(element).is_some()
    }

    /// Commits the current batch and returns a persistent set sharing the trie.
    #[must_use]
    pub fn to_persistent_set(&mut self) -> PersistentHashSet<T, S> {
        PersistentHashSet::wrap(self.inner.to_persistent_map())
    }

    /// Consumes the transient and returns the persistent set.
    #[must_use]
    pub fn persistent(self) -> PersistentHashSet<T, S> {
        PersistentHashSet::wrap(self.inner.persistent())
    }
}

impl<T> Default for MutableHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Extend<T> for MutableHashSet<T, S>
where
    T: Clone + Hash + Eq,
    S: BuildHasher + Clone,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.insert(element);
        }
    }
}

impl<T: Clone + Hash + Eq> FromIterator<T> for MutableHashSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: fmt::Debug, S> fmt::Debug for MutableHashSet<T, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize, S> serde::Serialize for PersistentHashSet<T, S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentHashSetVisitor<T, S> {
    marker: std::marker::PhantomData<fn() -> PersistentHashSet<T, S>>,
}

#[cfg(feature = "serde")]
impl<T, S> PersistentHashSetVisitor<T, S> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, T, S> serde::de::Visitor<'de> for PersistentHashSetVisitor<T, S>
where
    T: serde::Deserialize<'de> + Clone + Hash + Eq,
    S: BuildHasher + Clone + Default,
{
    type Value = PersistentHashSet<T, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut transient = MutableHashSet::with_hasher(S::default());
        while let Some(element) = seq.next_element()? {
            transient.insert(element);
        }
        Ok(transient.persistent())
    }
}

#[cfg(feature = "serde")]
impl<'de, T, S> serde::Deserialize<'de> for PersistentHashSet<T, S>
where
    T: serde::Deserialize<'de> + Clone + Hash + Eq,
    S: BuildHasher + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentHashSetVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set_of(elements: &[i32]) -> PersistentHashSet<i32> {
        elements.iter().copied().collect()
    }

    #[rstest]
    fn test_conj_existing_is_noop() {
        let set = set_of(&[1, 2]);
        assert!(set.conj(1).ptr_eq(&set));
        assert!(set.disj(&3).ptr_eq(&set));
    }

    #[rstest]
    #[case(&[1, 2, 3], &[3, 4], &[1, 2, 3, 4], &[3], &[1, 2])]
    #[case(&[], &[1], &[1], &[], &[])]
    #[case(&[1, 2], &[3, 4], &[1, 2, 3, 4], &[], &[1, 2])]
    fn test_set_algebra(
        #[case] left: &[i32],
        #[case] right: &[i32],
        #[case] union: &[i32],
        #[case] intersection: &[i32],
        #[case] difference: &[i32],
    ) {
        let (left, right) = (set_of(left), set_of(right));
        assert_eq!(left.union(&right), set_of(union));
        assert_eq!(left.intersection(&right), set_of(intersection));
        assert_eq!(left.difference(&right), set_of(difference));
    }

    #[rstest]
    fn test_difference_of_disjoint_sets_is_same_set() {
        let left = set_of(&[1, 2]);
        assert!(left.difference(&set_of(&[7])).ptr_eq(&left));
    }

    #[rstest]
    fn test_is_subset() {
        assert!(set_of(&[1]).is_subset(&set_of(&[1, 2])));
        assert!(!set_of(&[1, 3]).is_subset(&set_of(&[1, 2])));
    }

    #[rstest]
    fn test_transient_round_trip() {
        let base = set_of(&[1, 2, 3]);
        let mut transient = base.transient();
        assert!(transient.remove(&1));
        assert!(!transient.remove(&1));
        assert!(transient.insert(4));
        let snapshot = transient.to_persistent_set();
        transient.insert(5);

        assert_eq!(snapshot, set_of(&[2, 3, 4]));
        assert_eq!(transient.persistent(), set_of(&[2, 3, 4, 5]));
        assert_eq!(base, set_of(&[1, 2, 3]));
    }
}
