//! Key/value leaf shared by the trie and the red-black tree.

use std::fmt;
use std::iter::FusedIterator;

use super::spliterator::{Characteristics, Spliterator};

/// A key paired with its value.
///
/// Every leaf of a persistent collection stores one `Entry`. Sets use
/// `Entry<T, ()>`.
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::Entry;
///
/// let entry = Entry::new("answer", 42);
/// assert_eq!(entry.key(), &"answer");
/// assert_eq!(entry.value(), &42);
/// assert_eq!(entry.into_parts(), ("answer", 42));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Entry<K, V> {
    key: K,
    value: V,
}

impl<K, V> Entry<K, V> {
    /// Creates an entry.
    #[inline]
    #[must_use]
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// Returns the key.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Returns the value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Returns borrowed key and value as a tuple.
    #[inline]
    #[must_use]
    pub const fn as_pair(&self) -> (&K, &V) {
        (&self.key, &self.value)
    }

    /// Consumes the entry and returns its parts.
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for Entry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Entry<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:?}: {:?}", self.key, self.value)
    }
}

// =============================================================================
// Entry projections
// =============================================================================

/// Projects each `(key, value)` pair of an entry iterator onto the key.
///
/// Sets iterate through this adapter, so it forwards [`Spliterator`] as well.
#[derive(Clone)]
pub struct Keys<I> {
    inner: I,
}

impl<I> Keys<I> {
    pub(crate) const fn new(inner: I) -> Self {
        Self { inner }
    }

    /// Returns the underlying entry iterator.
    pub const fn inner(&self) -> &I {
        &self.inner
    }
}

impl<'a, K: 'a, V: 'a, I> Iterator for Keys<I>
where
    I: Iterator<Item = (&'a K, &'a V)>,
{
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: 'a, V: 'a, I> ExactSizeIterator for Keys<I> where
    I: ExactSizeIterator<Item = (&'a K, &'a V)>
{
}

impl<'a, K: 'a, V: 'a, I> FusedIterator for Keys<I> where I: FusedIterator<Item = (&'a K, &'a V)> {}

impl<'a, K: 'a, V: 'a, I> Spliterator for Keys<I>
where
    I: Spliterator<Item = (&'a K, &'a V)>,
{
    fn try_split(&mut self) -> Option<Self> {
        self.inner.try_split().map(Self::new)
    }

    fn estimate_size(&self) -> usize {
        self.inner.estimate_size()
    }

    fn characteristics(&self) -> Characteristics {
        self.inner.characteristics()
    }
}

/// Projects each `(key, value)` pair of an entry iterator onto the value.
#[derive(Clone)]
pub struct Values<I> {
    inner: I,
}

impl<I> Values<I> {
    pub(crate) const fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<'a, K: 'a, V: 'a, I> Iterator for Values<I>
where
    I: Iterator<Item = (&'a K, &'a V)>,
{
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: 'a, V: 'a, I> ExactSizeIterator for Values<I> where
    I: ExactSizeIterator<Item = (&'a K, &'a V)>
{
}

impl<'a, K: 'a, V: 'a, I> FusedIterator for Values<I> where I: FusedIterator<Item = (&'a K, &'a V)> {}
