//! Parallel iteration over persistent collections.
//!
//! Every persistent facade exposes `par_iter()`, which hands its
//! [`Spliterator`] to rayon. Work is divided with
//! [`try_split`](Spliterator::try_split); each piece is then drained
//! sequentially on a worker thread.
//!
//! # Examples
//!
//! ```rust
//! use persistent_collections::persistent::PersistentTreeMap;
//! use rayon::prelude::*;
//!
//! let map: PersistentTreeMap<i32, i32> = (0..1000).map(|key| (key, key * 2)).collect();
//! let doubled: Vec<i32> = map.par_iter().map(|(_, value)| *value).collect();
//! assert_eq!(doubled, (0..1000).map(|key| key * 2).collect::<Vec<_>>());
//! ```

use rayon::iter::ParallelIterator;
use rayon::iter::plumbing::{Folder, UnindexedConsumer, UnindexedProducer, bridge_unindexed};

use super::entry::Keys;
use super::hashmap::PersistentHashMap;
use super::hashset::PersistentHashSet;
use super::spliterator::Spliterator;
use super::tree_iter::TreeSpliterator;
use super::treemap::PersistentTreeMap;
use super::treeset::PersistentTreeSet;
use super::trie_iter::TrieSpliterator;

/// A rayon [`ParallelIterator`] driven by a [`Spliterator`].
///
/// Ordered spliterators keep their encounter order through
/// order-preserving adaptors such as `collect`.
pub struct ParallelSpliterator<S> {
    spliterator: S,
}

impl<S> ParallelSpliterator<S> {
    /// Wraps `spliterator` for parallel consumption.
    pub const fn new(spliterator: S) -> Self {
        Self { spliterator }
    }
}

impl<S> ParallelIterator for ParallelSpliterator<S>
where
    S: Spliterator + Send,
    S::Item: Send,
{
    type Item = S::Item;

    fn drive_unindexed<Con>(self, consumer: Con) -> Con::Result
    where
        Con: UnindexedConsumer<Self::Item>,
    {
        bridge_unindexed(
            SpliteratorProducer {
                spliterator: self.spliterator,
            },
            consumer,
        )
    }
}

struct SpliteratorProducer<S> {
    spliterator: S,
}

impl<S> UnindexedProducer for SpliteratorProducer<S>
where
    S: Spliterator + Send,
    S::Item: Send,
{
    type Item = S::Item;

    // The split-off prefix goes left so ordered consumers see encounter order.
    fn split(mut self) -> (Self, Option<Self>) {
        match self.spliterator.try_split() {
            Some(prefix) => (Self { spliterator: prefix }, Some(self)),
            None => (self, None),
        }
    }

    fn fold_with<F>(self, folder: F) -> F
    where
        F: Folder<Self::Item>,
    {
        folder.consume_iter(self.spliterator)
    }
}

// =============================================================================
// Facade Entry Points
// =============================================================================

impl<K: Send + Sync, V: Send + Sync, S> PersistentHashMap<K, V, S> {
    /// Returns a parallel iterator over the entries.
    pub fn par_iter(&self) -> ParallelSpliterator<TrieSpliterator<'_, K, V>> {
        ParallelSpliterator::new(self.spliterator())
    }
}

impl<T: Send + Sync, S> PersistentHashSet<T, S> {
    /// Returns a parallel iterator over the elements.
    pub fn par_iter(&self) -> ParallelSpliterator<Keys<TrieSpliterator<'_, T, ()>>> {
        ParallelSpliterator::new(self.spliterator())
    }
}

impl<K: Send + Sync, V: Send + Sync, C: Sync> PersistentTreeMap<K, V, C> {
    /// Returns a parallel iterator over the entries in ascending key order.
    pub fn par_iter(&self) -> ParallelSpliterator<TreeSpliterator<'_, K, V, C>> {
        ParallelSpliterator::new(self.spliterator())
    }
}

impl<T: Send + Sync, C: Sync> PersistentTreeSet<T, C> {
    /// Returns a parallel iterator over the elements in ascending order.
    pub fn par_iter(&self) -> ParallelSpliterator<Keys<TreeSpliterator<'_, T, (), C>>> {
        ParallelSpliterator::new(self.spliterator())
    }
}

// =============================================================================
// Tests
// =============================================================================
