//! # persistent-collections
//!
//! Persistent (immutable, structurally shared) hash and sorted collections
//! with transient batch editing.
//!
//! ## Overview
//!
//! - **Hash collections**: [`PersistentHashMap`](persistent::PersistentHashMap) and
//!   [`PersistentHashSet`](persistent::PersistentHashSet), backed by a
//!   hash array mapped trie (HAMT)
//! - **Transient collections**: [`MutableHashMap`](persistent::MutableHashMap) and
//!   [`MutableHashSet`](persistent::MutableHashSet), which edit the same trie in
//!   place and freeze back into a persistent value without a deep copy
//! - **Sorted collections**: [`PersistentTreeMap`](persistent::PersistentTreeMap) and
//!   [`PersistentTreeSet`](persistent::PersistentTreeSet), backed by a
//!   persistent red-black tree with pluggable comparators
//! - **Iteration**: ordinary iterators, pruned range iterators and splittable
//!   [`Spliterator`](persistent::Spliterator)s for parallel decomposition
//!
//! Every edit runs under an [`UpdateContext`](persistent::UpdateContext). Nodes
//! created by a context may be mutated in place while that context is live;
//! everything else is path-copied.
//!
//! ## Feature Flags
//!
//! - `arc`: use `Arc` instead of `Rc` so persistent values are `Send + Sync`
//! - `rayon`: parallel iteration over every persistent collection (implies `arc`)
//! - `serde`: `Serialize`/`Deserialize` implementations
//! - `tracing`: forward internal lifecycle events to the `tracing` crate
//! - `fxhash` / `ahash`: change the default hash builder
//! - `full`: `serde`, `rayon` and `tracing`
//!
//! ## Example
//!
//! ```rust
//! use persistent_collections::prelude::*;
//!
//! let map = PersistentHashMap::new()
//!     .assoc("a", 1)
//!     .assoc("b", 2)
//!     .dissoc(&"a");
//!
//! assert_eq!(map.len(), 1);
//! assert!(!map.contains_key(&"a"));
//! assert_eq!(map.get(&"b"), Some(&2));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports the collection types, the update machinery and the error type.
///
/// # Usage
///
/// ```rust
/// use persistent_collections::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::CollectionError;
    pub use crate::persistent::*;
}

mod tracing_helpers;

pub mod error;
pub mod persistent;

pub use error::CollectionError;
