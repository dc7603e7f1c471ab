//! Update contexts and merge policies.
//!
//! An [`UpdateContext`] is the capability token for one logical batch of
//! edits. Trie and tree nodes record the batch that created them; a node may
//! be mutated in place only while that same batch is live. Committing the
//! context retires its identity for good, so every later edit of those nodes
//! goes down the copy-on-write path.
//!
//! A [`Merger`] decides what happens when an edit meets an existing key and
//! observes insertions and deletions.
//!
//! # Examples
//!
//! ```rust
//! use persistent_collections::persistent::UpdateContext;
//!
//! let mut first = UpdateContext::new(1);
//! let second = UpdateContext::new(1);
//!
//! assert!(first.is_same_as(&first));
//! assert!(!first.is_same_as(&second));
//!
//! first.commit();
//! assert!(first.is_committed());
//! assert!(!first.is_same_as(&first));
//! ```

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Entry;
use crate::error::CollectionError;
use crate::tracing_helpers::debug_log;

// =============================================================================
// Edit Identity
// =============================================================================

static NEXT_EDIT: AtomicU64 = AtomicU64::new(1);

/// Unique identity of one uncommitted batch.
///
/// Identities are never reused, so a node stamped with a retired identity can
/// never be mutated again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct EditId(NonZeroU64);

impl EditId {
    fn next() -> Self {
        let raw = NEXT_EDIT.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }
}

#[cold]
#[track_caller]
fn committed() -> ! {
    panic!("{}", CollectionError::ContextCommitted)
}

// =============================================================================
// Merger
// =============================================================================

/// Conflict-resolution policy consulted by an [`UpdateContext`].
///
/// All methods have defaults: `insert` and `delete` ignore the notification
/// and `merge` always replaces (last write wins).
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::{Entry, Merger, PersistentHashMap};
///
/// /// Keeps the larger of the two values.
/// struct KeepMaximum;
///
/// impl<K> Merger<K, i32> for KeepMaximum {
///     fn merge(&mut self, existing: &Entry<K, i32>, incoming: &Entry<K, i32>) -> bool {
///         incoming.value() > existing.value()
///     }
/// }
///
/// let map = PersistentHashMap::new().assoc("a", 10);
/// assert_eq!(map.assoc_with("a", 5, KeepMaximum).get(&"a"), Some(&10));
/// assert_eq!(map.assoc_with("a", 50, KeepMaximum).get(&"a"), Some(&50));
/// ```
pub trait Merger<K, V> {
    /// Called once when a key that was absent is added.
    fn insert(&mut self, _entry: &Entry<K, V>) {}

    /// Called when `incoming` meets `existing` under an equal key.
    ///
    /// Returns `true` if `incoming` should replace `existing`. Returning
    /// `false` leaves the collection untouched.
    fn merge(&mut self, _existing: &Entry<K, V>, _incoming: &Entry<K, V>) -> bool {
        true
    }

    /// Called once when a key is removed.
    fn delete(&mut self, _entry: &Entry<K, V>) {}
}

impl<K, V, M: Merger<K, V> + ?Sized> Merger<K, V> for &mut M {
    fn insert(&mut self, entry: &Entry<K, V>) {
        (**self).insert(entry);
    }

    fn merge(&mut self, existing: &Entry<K, V>, incoming: &Entry<K, V>) -> bool {
        (**self).merge(existing, incoming)
    }

    fn delete(&mut self, entry: &Entry<K, V>) {
        (**self).delete(entry);
    }
}

/// Default policy: an incoming entry always replaces the existing one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LastWriteWins;

impl<K, V> Merger<K, V> for LastWriteWins {}

/// Never replaces an existing entry.
///
/// Used by set insertion, where re-adding a present element is a no-op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeepExisting;

impl<K, V> Merger<K, V> for KeepExisting {
    fn merge(&mut self, _existing: &Entry<K, V>, _incoming: &Entry<K, V>) -> bool {
        false
    }
}

/// Last-write-wins policy that remembers the displaced or deleted value.
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::{CapturePrevious, PersistentHashMap};
///
/// let map = PersistentHashMap::new().assoc("a", 1);
/// let mut capture = CapturePrevious::new();
/// let updated = map.assoc_with("a", 2, &mut capture);
///
/// assert_eq!(updated.get(&"a"), Some(&2));
/// assert_eq!(capture.into_previous(), Some(1));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturePrevious<V> {
    previous: Option<V>,
}

impl<V> CapturePrevious<V> {
    /// Creates a policy that has captured nothing yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Returns the captured value, if any.
    #[must_use]
    pub const fn previous(&self) -> Option<&V> {
        self.previous.as_ref()
    }

    /// Consumes the policy and returns the captured value.
    #[must_use]
    pub fn into_previous(self) -> Option<V> {
        self.previous
    }
}

impl<V> Default for CapturePrevious<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V: Clone> Merger<K, V> for CapturePrevious<V> {
    fn merge(&mut self, existing: &Entry<K, V>, _incoming: &Entry<K, V>) -> bool {
        self.previous = Some(existing.value().clone());
        true
    }

    fn delete(&mut self, entry: &Entry<K, V>) {
        self.previous = Some(entry.value().clone());
    }
}

/// Declines every replacement and records that one was attempted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RejectDuplicates {
    rejected: bool,
}

impl RejectDuplicates {
    /// Creates a policy that has rejected nothing yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { rejected: false }
    }

    /// Returns `true` if an existing key blocked an insertion.
    #[must_use]
    pub const fn rejected(&self) -> bool {
        self.rejected
    }
}

impl<K, V> Merger<K, V> for RejectDuplicates {
    fn merge(&mut self, _existing: &Entry<K, V>, _incoming: &Entry<K, V>) -> bool {
        self.rejected = true;
        false
    }
}

/// Replaces an existing value only when the predicate accepts
/// `(existing, incoming)`.
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::{MergeWhen, PersistentHashMap};
///
/// let map = PersistentHashMap::new().assoc("a", 3);
/// let kept = map.assoc_with("a", 1, MergeWhen(|old: &i32, new: &i32| new > old));
/// assert_eq!(kept.get(&"a"), Some(&3));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MergeWhen<F>(pub F);

impl<K, V, F> Merger<K, V> for MergeWhen<F>
where
    F: FnMut(&V, &V) -> bool,
{
    fn merge(&mut self, existing: &Entry<K, V>, incoming: &Entry<K, V>) -> bool {
        (self.0)(existing.value(), incoming.value())
    }
}

// =============================================================================
// UpdateContext
// =============================================================================

/// Capability token for one logical batch of edits.
///
/// A context carries a unique identity, a size hint, a merge policy and a
/// one-step size delta. Each trie or tree operation records `+1`, `0` or `-1`
/// in the delta; the caller reads it back with [`take_change`](Self::take_change)
/// and adjusts its size counter.
///
/// Committing a context retires its identity. Any later call to
/// [`insert`](Self::insert), [`merge`](Self::merge), [`delete`](Self::delete) or
/// a node operation under it panics.
///
/// A context is single-owner: sharing one between threads or between
/// interleaved batches is a precondition violation.
pub struct UpdateContext<M = LastWriteWins> {
    edit: Option<EditId>,
    expected_updates: usize,
    change: isize,
    merger: M,
}

impl UpdateContext {
    /// Creates a context with the default last-write-wins policy.
    ///
    /// `expected_updates` is a hint for how many edits the batch will make:
    /// `1` grows node arrays one slot at a time, larger values grow them
    /// geometrically.
    #[must_use]
    pub fn new(expected_updates: usize) -> Self {
        Self::with_merger(expected_updates, LastWriteWins)
    }
}

impl<M> UpdateContext<M> {
    /// Creates a context with a custom merge policy.
    #[must_use]
    pub fn with_merger(expected_updates: usize, merger: M) -> Self {
        Self {
            edit: Some(EditId::next()),
            expected_updates,
            change: 0,
            merger,
        }
    }

    /// Returns the size hint given at construction.
    #[inline]
    #[must_use]
    pub const fn expected_updates(&self) -> usize {
        self.expected_updates
    }

    /// Returns `true` if both contexts are uncommitted and belong to the
    /// same batch.
    #[inline]
    #[must_use]
    pub fn is_same_as<N>(&self, other: &UpdateContext<N>) -> bool {
        matches!((self.edit, other.edit), (Some(mine), Some(theirs)) if mine == theirs)
    }

    /// Returns `true` once [`commit`](Self::commit) has been called.
    #[inline]
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.edit.is_none()
    }

    /// Returns the size delta recorded since the last call and resets it to zero.
    #[inline]
    pub const fn take_change(&mut self) -> isize {
        let change = self.change;
        self.change = 0;
        change
    }

    /// Retires this context's identity.
    ///
    /// Nodes created under the context become immutable from now on.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn commit(&mut self) {
        if let Some(edit) = self.edit.take() {
            debug_log!(edit = edit.0.get(), "update context committed");
        }
    }

    /// Fails with [`CollectionError::ContextCommitted`] after `commit`.
    ///
    /// # Errors
    ///
    /// Returns `ContextCommitted` if the context is no longer live.
    pub const fn ensure_uncommitted(&self) -> Result<(), CollectionError> {
        if self.edit.is_some() {
            Ok(())
        } else {
            Err(CollectionError::ContextCommitted)
        }
    }

    /// Returns a context for the same batch with a different merge policy.
    ///
    /// Nodes owned by this context stay mutable through the returned one.
    /// The size delta starts at zero.
    ///
    /// The returned context copies the batch identity, not a link to it.
    /// Committing either one leaves the other live, so the copy must be
    /// dropped before this context is committed.
    ///
    /// # Panics
    ///
    /// Panics if this context has been committed.
    #[track_caller]
    #[must_use]
    pub fn rebind<N>(&self, merger: N) -> UpdateContext<N> {
        UpdateContext {
            edit: Some(self.edit()),
            expected_updates: self.expected_updates,
            change: 0,
            merger,
        }
    }

    /// Returns the merge policy.
    #[inline]
    #[must_use]
    pub const fn merger(&self) -> &M {
        &self.merger
    }

    /// Returns the merge policy mutably.
    #[inline]
    pub const fn merger_mut(&mut self) -> &mut M {
        &mut self.merger
    }

    /// Consumes the context and returns its merge policy.
    #[must_use]
    pub fn into_merger(self) -> M {
        self.merger
    }

    /// Identity of the live batch.
    #[inline]
    #[track_caller]
    pub(crate) fn edit(&self) -> EditId {
        match self.edit {
            Some(edit) => edit,
            None => committed(),
        }
    }

    /// Records that a new key is being added.
    ///
    /// # Panics
    ///
    /// Panics if this context has been committed.
    #[track_caller]
    pub fn insert<K, V>(&mut self, entry: &Entry<K, V>)
    where
        M: Merger<K, V>,
    {
        self.edit();
        self.change = 1;
        self.merger.insert(entry);
    }

    /// Asks the policy whether `incoming` replaces `existing`.
    ///
    /// # Panics
    ///
    /// Panics if this context has been committed.
    #[track_caller]
    pub fn merge<K, V>(&mut self, existing: &Entry<K, V>, incoming: &Entry<K, V>) -> bool
    where
        M: Merger<K, V>,
    {
        self.edit();
        self.change = 0;
        self.merger.merge(existing, incoming)
    }

    /// Records that a key is being removed.
    ///
    /// # Panics
    ///
    /// Panics if this context has been committed.
    #[track_caller]
    pub fn delete<K, V>(&mut self, entry: &Entry<K, V>)
    where
        M: Merger<K, V>,
    {
        self.edit();
        self.change = -1;
        self.merger.delete(entry);
    }
}

impl<M: fmt::Debug> fmt::Debug for UpdateContext<M> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UpdateContext")
            .field("committed", &self.is_committed())
            .field("expected_updates", &self.expected_updates)
            .field("change", &self.change)
            .field("merger", &self.merger)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_fresh_contexts_are_distinct() {
        let first = UpdateContext::new(1);
        let second = UpdateContext::new(1);

        assert!(first.is_same_as(&first));
        assert!(!first.is_same_as(&second));
        assert!(!second.is_same_as(&first));
    }

    #[rstest]
    fn test_commit_breaks_identity() {
        let mut context = UpdateContext::new(1);
        let rebound = context.rebind(KeepExisting);
        assert!(context.is_same_as(&rebound));

        context.commit();

        assert!(context.is_committed());
        assert!(!context.is_same_as(&rebound));
        assert!(!rebound.is_same_as(&context));
        assert_eq!(
            context.ensure_uncommitted(),
            Err(CollectionError::ContextCommitted)
        );
    }

    #[rstest]
    fn test_commit_twice_is_harmless() {
        let mut context = UpdateContext::new(1);
        context.commit();
        context.commit();
        assert!(context.is_committed());
    }

    #[rstest]
    fn test_change_is_read_and_reset() {
        let mut context = UpdateContext::new(1);
        let entry = Entry::new("k", 1);

        context.insert(&entry);
        assert_eq!(context.take_change(), 1);
        assert_eq!(context.take_change(), 0);

        context.delete(&entry);
        assert_eq!(context.take_change(), -1);

        assert!(context.merge(&entry, &Entry::new("k", 2)));
        assert_eq!(context.take_change(), 0);
    }

    #[rstest]
    #[should_panic(expected = "already been committed")]
    fn test_insert_after_commit_panics() {
        let mut context = UpdateContext::new(1);
        context.commit();
        context.insert(&Entry::new(1, 1));
    }

    #[rstest]
    #[should_panic(expected = "already been committed")]
    fn test_rebind_after_commit_panics() {
        let mut context = UpdateContext::new(1);
        context.commit();
        let _ = context.rebind(LastWriteWins);
    }

    #[rstest]
    fn test_rebound_copy_commits_independently() {
        let mut context = UpdateContext::new(4);
        let mut rebound = context.rebind(CapturePrevious::<i32>::new());
        assert!(rebound.is_same_as(&context));
        assert_eq!(rebound.expected_updates(), 4);

        rebound.commit();
        assert!(rebound.is_committed());
        assert!(!context.is_committed());

        let survivor = context.rebind(KeepExisting);
        context.commit();
        assert!(!survivor.is_committed());
        assert!(survivor.ensure_uncommitted().is_ok());
    }

    #[rstest]
    fn test_expected_updates_is_kept() {
        let context = UpdateContext::new(64);
        assert_eq!(context.expected_updates(), 64);
        assert_eq!(context.rebind(KeepExisting).expected_updates(), 64);
    }

    #[rstest]
    #[case(1, 2, true)]
    #[case(2, 1, false)]
    fn test_merge_when(#[case] existing: i32, #[case] incoming: i32, #[case] replaces: bool) {
        let mut context = UpdateContext::with_merger(1, MergeWhen(|old: &i32, new: &i32| new > old));
        assert_eq!(
            context.merge(&Entry::new("k", existing), &Entry::new("k", incoming)),
            replaces
        );
    }

    #[rstest]
    fn test_keep_existing_declines() {
        let mut context = UpdateContext::with_merger(1, KeepExisting);
        assert!(!context.merge(&Entry::new(1, "a"), &Entry::new(1, "b")));
    }

    #[rstest]
    fn test_capture_previous_records_displaced_and_deleted() {
        let mut context = UpdateContext::with_merger(1, CapturePrevious::new());
        context.insert(&Entry::new("k", 1));
        assert_eq!(context.merger().previous(), None);

        context.merge(&Entry::new("k", 1), &Entry::new("k", 2));
        assert_eq!(context.merger().previous(), Some(&1));

        context.delete(&Entry::new("k", 2));
        assert_eq!(context.into_merger().into_previous(), Some(2));
    }

    #[rstest]
    fn test_reject_duplicates_flags_collision() {
        let mut context = UpdateContext::with_merger(1, RejectDuplicates::new());
        context.insert(&Entry::new(1, ()));
        assert!(!context.merger().rejected());
        assert!(!context.merge(&Entry::new(1, ()), &Entry::new(1, ())));
        assert!(context.merger().rejected());
    }

    #[rstest]
    fn test_merger_by_mutable_reference() {
        let mut capture = CapturePrevious::new();
        {
            let mut context = UpdateContext::with_merger(1, &mut capture);
            context.delete(&Entry::new("k", 9));
        }
        assert_eq!(capture.previous(), Some(&9));
    }
}
