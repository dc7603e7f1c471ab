//! Persistent sorted set based on the red-black tree.
//!
//! [`PersistentTreeSet`] wraps a [`PersistentTreeMap<T, ()>`](PersistentTreeMap)
//! and inherits its ordering, range queries and structural sharing.
//!
//! # Examples
//!
//! ```rust
//! use persistent_collections::persistent::PersistentTreeSet;
//!
//! let set: PersistentTreeSet<i32> = [5, 1, 3].into_iter().collect();
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
//! assert_eq!(set.first(), Some(&1));
//! assert_eq!(set.range(2..).copied().collect::<Vec<_>>(), vec![3, 5]);
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::RangeBounds;

use super::comparator::{Comparator, NaturalOrder};
use super::context::KeepExisting;
use super::entry::Keys;
use super::tree_iter::{TreeIter, TreeRange, TreeSpliterator};
use super::treemap::PersistentTreeMap;
use super::view::SetView;

/// A persistent (immutable) sorted set.
///
/// # Time Complexity
///
/// | Operation      | Complexity   |
/// |----------------|--------------|
/// | `contains`     | O(log N)     |
/// | `conj`         | O(log N)     |
/// | `disj`         | O(log N)     |
/// | `first`/`last` | O(log N)     |
/// | `range`        | O(log N + k) |
/// | `len`          | O(1)         |
pub struct PersistentTreeSet<T, C = NaturalOrder> {
    inner: PersistentTreeMap<T, (), C>,
}

impl<T> PersistentTreeSet<T> {
    /// Creates a new empty set ordered by `Ord`.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: PersistentTreeMap::new(),
        }
    }
}

impl<T, C> PersistentTreeSet<T, C> {
    /// Creates a new empty set ordered by `comparator`.
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            inner: PersistentTreeMap::with_comparator(comparator),
        }
    }

    const fn wrap(inner: PersistentTreeMap<T, (), C>) -> Self {
        Self { inner }
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

    /// Returns `true` if both sets share the same root.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }

    /// Returns the comparator that orders the elements.
    #[must_use]
    pub fn comparator(&self) -> &C {
        self.inner.comparator()
    }

    /// Returns the smallest element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.inner.first().map(|(element, ())| element)
    }

    /// Returns the largest element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.inner.last().map(|(element, ())| element)
    }

    /// Returns an iterator over the elements in ascending order.
    #[inline]
    pub fn iter(&self) -> Keys<TreeIter<'_, T, ()>> {
        self.inner.keys()
    }

    /// Returns an iterator over the elements in descending order.
    #[inline]
    pub fn iter_descending(&self) -> Keys<TreeIter<'_, T, ()>> {
        Keys::new(self.inner.iter_descending())
    }

    /// Returns a splittable cursor over the elements in ascending order.
    #[inline]
    pub fn spliterator(&self) -> Keys<TreeSpliterator<'_, T, (), C>> {
        Keys::new(self.inner.spliterator())
    }

    /// Returns a read-only view of the set.
    #[inline]
    pub const fn as_set(&self) -> SetView<'_, Self> {
        SetView::new(self)
    }
}

impl<'a, K, V, C> Keys<TreeSpliterator<'a, K, V, C>> {
    /// Returns the comparator that defines the encounter order.
    pub const fn comparator(&self) -> &'a C {
        self.inner().comparator()
    }
}

impl<T, C: Comparator<T>> PersistentTreeSet<T, C> {
    /// Returns `true` if the set contains `element`.
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.inner.contains_key(element)
    }

    /// Returns an ascending iterator over the elements in `range`.
    pub fn range<R>(&self, range: R) -> Keys<TreeRange<'_, T, (), C>>
    where
        R: RangeBounds<T>,
        T: Clone,
    {
        Keys::new(self.inner.range(range))
    }

    /// Returns a descending iterator over the elements in `range`.
    pub fn range_descending<R>(&self, range: R) -> Keys<TreeRange<'_, T, (), C>>
    where
        R: RangeBounds<T>,
        T: Clone,
    {
        Keys::new(self.inner.range_descending(range))
    }

    /// Returns `true` if every element of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|element| other.contains(element))
    }
}

impl<T: Clone + Ord> PersistentTreeSet<T> {
    /// Creates a set containing a single element.
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::new().conj(element)
    }
}

impl<T: Clone, C: Comparator<T>> PersistentTreeSet<T, C> {
    /// Returns a new set with `element` added.
    ///
    /// Returns a set `ptr_eq` to `self` if an equal element is already present;
    /// the stored element is kept.
    #[must_use]
    pub fn conj(&self, element: T) -> Self {
        Self::wrap(self.inner.assoc_with(element, (), KeepExisting))
    }

    /// Returns a new set without `element`.
    #[must_use]
    pub fn disj<Q>(&self, element: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
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
        Q: ?Sized + 'a,
        C: Comparator<Q>,
    {
        Self::wrap(self.inner.dissoc_all(elements))
    }

    /// Returns the union of two sets, ordered by the comparator of `self`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.conj_all(other.iter().cloned())
    }

    /// Returns the elements present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let absent: Vec<&T> = self.iter().filter(|element| !other.contains(*element)).collect();
        self.disj_all(absent)
    }

    /// Returns the elements of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.disj_all(other.iter())
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An owning iterator over the elements of a [`PersistentTreeSet`], in
/// ascending order.
pub struct PersistentTreeSetIntoIterator<T> {
    elements: std::vec::IntoIter<T>,
}

impl<T> Iterator for PersistentTreeSetIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.elements.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.elements.size_hint()
    }
}

impl<T> DoubleEndedIterator for PersistentTreeSetIntoIterator<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.elements.next_back()
    }
}

impl<T> ExactSizeIterator for PersistentTreeSetIntoIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T, C> Clone for PersistentTreeSet<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, C: Default> Default for PersistentTreeSet<T, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T, C> FromIterator<T> for PersistentTreeSet<T, C>
where
    T: Clone,
    C: Comparator<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::default().conj_all(iter)
    }
}

impl<T, C, const N: usize> From<[T; N]> for PersistentTreeSet<T, C>
where
    T: Clone,
    C: Comparator<T> + Default,
{
    fn from(elements: [T; N]) -> Self {
        elements.into_iter().collect()
    }
}

impl<T: Clone, C> IntoIterator for PersistentTreeSet<T, C> {
    type Item = T;
    type IntoIter = PersistentTreeSetIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        let elements: Vec<T> = self.iter().cloned().collect();
        PersistentTreeSetIntoIterator {
            elements: elements.into_iter(),
        }
    }
}

impl<'a, T, C> IntoIterator for &'a PersistentTreeSet<T, C> {
    type Item = &'a T;
    type IntoIter = Keys<TreeIter<'a, T, ()>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq, C> PartialEq for PersistentTreeSet<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Eq, C> Eq for PersistentTreeSet<T, C> {}

impl<T: Hash, C> Hash for PersistentTreeSet<T, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<T: fmt::Debug, C> fmt::Debug for PersistentTreeSet<T, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentTreeSet<String>: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize, C> serde::Serialize for PersistentTreeSet<T, C> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
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
struct PersistentTreeSetVisitor<T> {
    marker: std::marker::PhantomData<fn() -> PersistentTreeSet<T>>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for PersistentTreeSetVisitor<T>
where
    T: serde::Deserialize<'de> + Clone + Ord,
{
    type Value = PersistentTreeSet<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut elements = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(element) = seq.next_element()? {
            elements.push(element);
        }
        Ok(PersistentTreeSet::new().conj_all(elements))
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for PersistentTreeSet<T>
where
    T: serde::Deserialize<'de> + Clone + Ord,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentTreeSetVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
