//! Read-only adapters over persistent collections.
//!
//! [`MapView`] and [`SetView`] expose the lookup and iteration surface of a
//! persistent collection in the shape of a standard associative container.
//! Their mutators exist only to report [`CollectionError::UnsupportedOperation`].

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::ops::Index;

use super::comparator::Comparator;
use super::entry::{Entry, Keys, Values};
use super::hashmap::PersistentHashMap;
use super::hashset::PersistentHashSet;
use super::tree_iter::TreeIter;
use super::treemap::PersistentTreeMap;
use super::treeset::PersistentTreeSet;
use super::trie_iter::TrieIter;
use crate::error::CollectionError;

const fn unsupported(operation: &'static str) -> CollectionError {
    CollectionError::UnsupportedOperation { operation }
}

// =============================================================================
// Sources
// =============================================================================

/// A keyed collection that a [`MapView`] can read.
pub trait MapSource {
    /// Key type.
    type Key;
    /// Value type.
    type Value;
    /// Iterator over the entries.
    type Entries<'a>: Iterator<Item = (&'a Self::Key, &'a Self::Value)>
    where
        Self: 'a;

    /// Returns the value bound to `key`.
    fn lookup(&self, key: &Self::Key) -> Option<&Self::Value>;

    /// Returns the number of entries.
    fn size(&self) -> usize;

    /// Returns an iterator over the entries.
    fn entries(&self) -> Self::Entries<'_>;
}

/// A collection of elements that a [`SetView`] can read.
pub trait SetSource {
    /// Element type.
    type Element;
    /// Iterator over the elements.
    type Elements<'a>: Iterator<Item = &'a Self::Element>
    where
        Self: 'a;

    /// Returns `true` if `element` is present.
    fn includes(&self, element: &Self::Element) -> bool;

    /// Returns the number of elements.
    fn size(&self) -> usize;

    /// Returns an iterator over the elements.
    fn elements(&self) -> Self::Elements<'_>;
}

impl<K: Hash + Eq, V, S: BuildHasher> MapSource for PersistentHashMap<K, V, S> {
    type Key = K;
    type Value = V;
    type Entries<'a>
        = TrieIter<'a, K, V>
    where
        Self: 'a;

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Self::Entries<'_> {
        self.iter()
    }
}

impl<K, V, C: Comparator<K>> MapSource for PersistentTreeMap<K, V, C> {
    type Key = K;
    type Value = V;
    type Entries<'a>
        = TreeIter<'a, K, V>
    where
        Self: 'a;

    fn lookup(&self, key: &K) -> Option<&V> {
        self.find(key).map(Entry::value)
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Self::Entries<'_> {
        self.iter()
    }
}

impl<T: Hash + Eq, S: BuildHasher> SetSource for PersistentHashSet<T, S> {
    type Element = T;
    type Elements<'a>
        = Keys<TrieIter<'a, T, ()>>
    where
        Self: 'a;

    fn includes(&self, element: &T) -> bool {
        self.contains(element)
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn elements(&self) -> Self::Elements<'_> {
        self.iter()
    }
}

impl<T, C: Comparator<T>> SetSource for PersistentTreeSet<T, C> {
    type Element = T;
    type Elements<'a>
        = Keys<TreeIter<'a, T, ()>>
    where
        Self: 'a;

    fn includes(&self, element: &T) -> bool {
        self.contains(element)
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn elements(&self) -> Self::Elements<'_> {
        self.iter()
    }
}

// =============================================================================
// MapView
// =============================================================================

/// Read-only map adapter returned by `as_map`.
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::PersistentHashMap;
/// use persistent_collections::CollectionError;
///
/// let map = PersistentHashMap::new().assoc("a", 1);
/// let mut view = map.as_map();
///
/// assert_eq!(view[&"a"], 1);
/// assert_eq!(
///     view.insert("b", 2),
///     Err(CollectionError::UnsupportedOperation { operation: "insert" })
/// );
/// ```
pub struct MapView<'a, M> {
    map: &'a M,
}

impl<'a, M> MapView<'a, M> {
    pub(crate) const fn new(map: &'a M) -> Self {
        Self { map }
    }

    /// Returns the underlying collection.
    pub const fn source(&self) -> &'a M {
        self.map
    }
}

impl<'a, M: MapSource> MapView<'a, M> {
    /// Returns the value bound to `key`.
    pub fn get(&self, key: &M::Key) -> Option<&'a M::Value> {
        self.map.lookup(key)
    }

    /// Returns `true` if `key` is bound.
    pub fn contains_key(&self, key: &M::Key) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.map.size()
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the entries.
    pub fn iter(&self) -> M::Entries<'a> {
        self.map.entries()
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<M::Entries<'a>> {
        Keys::new(self.iter())
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<M::Entries<'a>> {
        Values::new(self.iter())
    }

    /// Always fails: the view is read-only.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnsupportedOperation`].
    pub fn insert(
        &mut self,
        _key: M::Key,
        _value: M::Value,
    ) -> Result<Option<M::Value>, CollectionError> {
        Err(unsupported("insert"))
    }

    /// Always fails: the view is read-only.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnsupportedOperation`].
    pub const fn remove(&mut self, _key: &M::Key) -> Result<Option<M::Value>, CollectionError> {
        Err(unsupported("remove"))
    }

    /// Always fails: the view is read-only.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnsupportedOperation`].
    pub const fn clear(&mut self) -> Result<(), CollectionError> {
        Err(unsupported("clear"))
    }
}

impl<M> Clone for MapView<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for MapView<'_, M> {}

impl<M: MapSource> Index<&M::Key> for MapView<'_, M> {
    type Output = M::Value;

    /// # Panics
    ///
    /// Panics if `key` is not bound.
    fn index(&self, key: &M::Key) -> &M::Value {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not present in map view"),
        }
    }
}

impl<'a, M: MapSource> IntoIterator for MapView<'a, M> {
    type Item = (&'a M::Key, &'a M::Value);
    type IntoIter = M::Entries<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<M> fmt::Debug for MapView<'_, M>
where
    M: MapSource,
    M::Key: fmt::Debug,
    M::Value: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// SetView
// =============================================================================

/// Read-only set adapter returned by `as_set`.
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::PersistentTreeSet;
///
/// let set: PersistentTreeSet<i32> = [3, 1, 2].into_iter().collect();
/// let mut view = set.as_set();
///
/// assert!(view.contains(&2));
/// assert_eq!(view.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
/// assert!(view.remove(&2).is_err());
/// ```
pub struct SetView<'a, S> {
    set: &'a S,
}

impl<'a, S> SetView<'a, S> {
    pub(crate) const fn new(set: &'a S) -> Self {
        Self { set }
    }

    /// Returns the underlying collection.
    pub const fn source(&self) -> &'a S {
        self.set
    }
}

impl<'a, S: SetSource> SetView<'a, S> {
    /// Returns `true` if `element` is present.
    pub fn contains(&self, element: &S::Element) -> bool {
        self.set.includes(element)
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.set.size()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> S::Elements<'a> {
        self.set.elements()
    }

    /// Always fails: the view is read-only.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnsupportedOperation`].
    pub fn insert(&mut self, _element: S::Element) -> Result<bool, CollectionError> {
        Err(unsupported("insert"))
    }

    /// Always fails: the view is read-only.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnsupportedOperation`].
    pub const fn remove(&mut self, _element: &S::Element) -> Result<bool, CollectionError> {
        Err(unsupported("remove"))
    }

    /// Always fails: the view is read-only.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnsupportedOperation`].
    pub const fn clear(&mut self) -> Result<(), CollectionError> {
        Err(unsupported("clear"))
    }
}

impl<S> Clone for SetView<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for SetView<'_, S> {}

impl<'a, S: SetSource> IntoIterator for SetView<'a, S> {
    type Item = &'a S::Element;
    type IntoIter = S::Elements<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S> fmt::Debug for SetView<'_, S>
where
    S: SetSource,
    S::Element: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}
