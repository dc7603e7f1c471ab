//! Orderings for the sorted collections.

use std::cmp::Ordering;
use std::fmt;

/// A total order over `T`.
///
/// Sorted collections consult only their comparator; `Eq` on the keys is
/// never used. Implementations must be consistent: `compare(a, b)` is
/// `Equal` exactly when `a` and `b` denote the same key.
pub trait Comparator<T: ?Sized> {
    /// Compares two values.
    fn compare(&self, left: &T, right: &T) -> Ordering;
}

/// Ordering given by `Ord`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, left: &T, right: &T) -> Ordering {
        left.cmp(right)
    }
}

/// The reverse of another comparator.
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::{NaturalOrder, PersistentTreeSet, ReverseOrder};
///
/// let set = PersistentTreeSet::with_comparator(ReverseOrder(NaturalOrder))
///     .conj(1)
///     .conj(3)
///     .conj(2);
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ReverseOrder<C>(pub C);

impl<T: ?Sized, C: Comparator<T>> Comparator<T> for ReverseOrder<C> {
    #[inline]
    fn compare(&self, left: &T, right: &T) -> Ordering {
        self.0.compare(right, left)
    }
}

/// Adapts a closure into a [`Comparator`].
///
/// # Examples
///
/// ```rust
/// use persistent_collections::persistent::{ComparatorFn, PersistentTreeMap};
///
/// let by_length = ComparatorFn::new(|left: &&str, right: &&str| left.len().cmp(&right.len()));
/// let map = PersistentTreeMap::with_comparator(by_length)
///     .assoc("ccc", 3)
///     .assoc("a", 1)
///     .assoc("bb", 2);
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["a", "bb", "ccc"]);
/// ```
#[derive(Clone, Copy)]
pub struct ComparatorFn<F> {
    function: F,
}

impl<F> ComparatorFn<F> {
    /// Wraps `function`.
    pub const fn new(function: F) -> Self {
        Self { function }
    }
}

impl<T: ?Sized, F> Comparator<T> for ComparatorFn<F>
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, left: &T, right: &T) -> Ordering {
        (self.function)(left, right)
    }
}

impl<F> fmt::Debug for ComparatorFn<F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("ComparatorFn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 2, Ordering::Less)]
    #[case(2, 2, Ordering::Equal)]
    #[case(3, 2, Ordering::Greater)]
    fn test_natural_order(#[case] left: i32, #[case] right: i32, #[case] expected: Ordering) {
        assert_eq!(NaturalOrder.compare(&left, &right), expected);
        assert_eq!(ReverseOrder(NaturalOrder).compare(&left, &right), expected.reverse());
    }

    #[rstest]
    fn test_natural_order_on_unsized() {
        assert_eq!(NaturalOrder.compare("apple", "banana"), Ordering::Less);
    }

    #[rstest]
    fn test_closure_comparator() {
        let modulo = ComparatorFn::new(|left: &i32, right: &i32| (left % 10).cmp(&(right % 10)));
        assert_eq!(modulo.compare(&19, &21), Ordering::Greater);
        assert_eq!(modulo.compare(&11, &21), Ordering::Equal);
    }
}
