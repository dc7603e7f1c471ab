//! Persistent (immutable) collections.
//!
//! This module provides immutable collections that use structural sharing to
//! minimize copying:
//!
//! - [`PersistentHashMap`]: Persistent hash map (HAMT)
//! - [`PersistentHashSet`]: Persistent hash set (based on HAMT)
//! - [`PersistentTreeMap`]: Persistent sorted map (red-black tree)
//! - [`PersistentTreeSet`]: Persistent sorted set (red-black tree)
//! - [`MutableHashMap`] / [`MutableHashSet`]: transient editors over the
//!   same trie, frozen back into persistent values without copying
//!
//! # Structural Sharing
//!
//! Every update copies only the path from the root to the changed leaf. All
//! other nodes are shared between the old and the new version.
//!
//! # Update Contexts
//!
//! Each edit runs under an [`UpdateContext`]. Nodes remember the context that
//! created them and are mutated in place only while that context is live;
//! a persistent facade creates a fresh context per operation, so its updates
//! always copy. A transient keeps one context for the whole batch and edits
//! its own nodes in place.
//!
//! # Examples
//!
//! ## `PersistentHashMap`
//!
//! ```rust
//! use persistent_collections::persistent::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .assoc("one".to_string(), 1)
//!     .assoc("two".to_string(), 2);
//! assert_eq!(map.get("one"), Some(&1));
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.assoc("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get("one"), Some(&100)); // New version
//!
//! // Removing an absent key returns the same map
//! assert!(map.dissoc("three").ptr_eq(&map));
//! ```
//!
//! ## `MutableHashMap`
//!
//! ```rust
//! use persistent_collections::persistent::MutableHashMap;
//!
//! let mut transient = MutableHashMap::new();
//! for key in 0..100 {
//!     transient.put(key, key * key);
//! }
//! let snapshot = transient.to_persistent_map();
//!
//! transient.put(0, -1);
//! assert_eq!(snapshot.get(&0), Some(&0));
//! assert_eq!(transient.get(&0), Some(&-1));
//! ```
//!
//! ## `PersistentTreeMap`
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
//! let range: Vec<(&i32, &&str)> = map.range(2..).collect();
//! assert_eq!(range, vec![(&2, &"two"), (&3, &"three")]);
//! ```
//!
//! ## `PersistentHashSet`
//!
//! ```rust
//! use persistent_collections::persistent::PersistentHashSet;
//!
//! let set: PersistentHashSet<i32> = [1, 2, 3].into_iter().collect();
//! let other: PersistentHashSet<i32> = [2, 3, 4].into_iter().collect();
//!
//! assert_eq!(set.union(&other).len(), 4);        // {1, 2, 3, 4}
//! assert_eq!(set.intersection(&other).len(), 2); // {2, 3}
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod comparator;
mod context;
mod entry;
mod hashmap;
mod hashset;
mod rbtree;
mod spliterator;
mod tree_iter;
mod treemap;
mod treeset;
mod trie;
mod trie_iter;
mod view;

#[cfg(feature = "rayon")]
mod parallel;

pub use comparator::Comparator;
pub use comparator::ComparatorFn;
pub use comparator::NaturalOrder;
pub use comparator::ReverseOrder;
pub use context::CapturePrevious;
pub use context::KeepExisting;
pub use context::LastWriteWins;
pub use context::MergeWhen;
pub use context::Merger;
pub use context::RejectDuplicates;
pub use context::UpdateContext;
pub use entry::Entry;
pub use entry::Keys;
pub use entry::Values;
pub use hashmap::DefaultHashBuilder;
pub use hashmap::MutableHashMap;
pub use hashmap::PersistentHashMap;
pub use hashmap::PersistentHashMapIntoIterator;
pub use hashset::MutableHashSet;
pub use hashset::PersistentHashSet;
pub use hashset::PersistentHashSetIntoIterator;
pub use spliterator::Characteristics;
pub use spliterator::Spliterator;
pub use tree_iter::TreeIter;
pub use tree_iter::TreeRange;
pub use tree_iter::TreeSpliterator;
pub use treemap::PersistentTreeMap;
pub use treemap::PersistentTreeMapIntoIterator;
pub use treeset::PersistentTreeSet;
pub use treeset::PersistentTreeSetIntoIterator;
pub use trie_iter::TrieIter;
pub use trie_iter::TrieSpliterator;
pub use view::MapSource;
pub use view::MapView;
pub use view::SetSource;
pub use view::SetView;

#[cfg(feature = "rayon")]
pub use parallel::ParallelSpliterator;

// =============================================================================
// Tests
// =============================================================================
