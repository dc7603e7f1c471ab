//! Splittable iteration cursors.
//!
//! A [`Spliterator`] is an [`Iterator`] that can hand off part of its
//! remaining elements to a new cursor, so a traversal can be decomposed for
//! parallel consumption. The size it reports is advisory once it has split.

use bitflags::bitflags;

bitflags! {
    /// Set of properties a spliterator guarantees about its elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_collections::persistent::Characteristics;
    ///
    /// let flags = Characteristics::SORTED | Characteristics::DISTINCT;
    /// assert!(flags.contains(Characteristics::SORTED));
    /// assert!(!flags.contains(Characteristics::SIZED));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Characteristics: u8 {
        /// Elements have a defined encounter order.
        const ORDERED = 1;
        /// No two elements are equal.
        const DISTINCT = 1 << 1;
        /// Encounter order follows the collection's comparator.
        const SORTED = 1 << 2;
        /// `estimate_size` is exact.
        const SIZED = 1 << 3;
        /// The source cannot change during traversal.
        const IMMUTABLE = 1 << 4;
    }
}

/// An iterator that can split off a prefix of its remaining elements.
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::{PersistentTreeSet, Spliterator};
///
/// let set: PersistentTreeSet<i32> = (0..100).collect();
/// let mut right = set.spliterator();
/// let left = right.try_split().expect("a large tree splits");
///
/// let mut all: Vec<i32> = left.copied().collect();
/// all.extend(right.copied());
/// assert_eq!(all, (0..100).collect::<Vec<_>>());
/// ```
pub trait Spliterator: Iterator + Sized {
    /// Splits off a cursor over a prefix of the remaining elements, or
    /// returns `None` when this cursor cannot be divided further.
    ///
    /// For `ORDERED` cursors the returned cursor covers elements that come
    /// strictly before everything left in `self`.
    fn try_split(&mut self) -> Option<Self>;

    /// Returns an estimate of the remaining elements; exact while `SIZED`.
    fn estimate_size(&self) -> usize;

    /// Returns the properties of this cursor's elements.
    fn characteristics(&self) -> Characteristics;

    /// Returns `true` if all `wanted` flags are reported.
    fn has_characteristics(&self, wanted: Characteristics) -> bool {
        self.characteristics().contains(wanted)
    }

    /// Returns the remaining size when it is known exactly.
    fn exact_size_if_known(&self) -> Option<usize> {
        self.has_characteristics(Characteristics::SIZED)
            .then(|| self.estimate_size())
    }

    /// Feeds the next element to `action`. Returns `false` once exhausted.
    fn try_advance<F>(&mut self, action: F) -> bool
    where
        F: FnOnce(Self::Item),
    {
        self.next().map(action).is_some()
    }

    /// Feeds every remaining element to `action`.
    fn for_each_remaining<F>(&mut self, action: F)
    where
        F: FnMut(Self::Item),
    {
        self.by_ref().for_each(action);
    }
}
