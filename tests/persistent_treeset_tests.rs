//! Unit tests for PersistentTreeSet.

use persistent_collections::persistent::{
    ComparatorFn, NaturalOrder, PersistentTreeSet, ReverseOrder, Spliterator,
};
use rstest::rstest;

#[rstest]
fn test_conj_orders_elements() {
    let set = PersistentTreeSet::new().conj(3).conj(1).conj(2).conj(1);
    assert_eq!(set.len(), 3);
    assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[rstest]
fn test_first_last() {
    let set: PersistentTreeSet<char> = "persistent".chars().collect();
    assert_eq!(set.first(), Some(&'e'));
    assert_eq!(set.last(), Some(&'t'));
    assert_eq!(PersistentTreeSet::<char>::new().first(), None);
}

#[rstest]
fn test_disj_and_noops() {
    let set: PersistentTreeSet<i32> = (0..10).collect();
    assert!(set.disj(&99).ptr_eq(&set));
    assert!(set.conj(5).ptr_eq(&set));
    let smaller = set.disj(&5);
    assert!(!smaller.contains(&5));
    assert!(set.contains(&5));
}

#[rstest]
fn test_disj_all() {
    let set: PersistentTreeSet<i32> = (0..10).collect();
    let odd: Vec<i32> = (1..10).step_by(2).collect();
    let evens = set.disj_all(&odd);
    assert_eq!(evens.iter().copied().collect::<Vec<_>>(), vec![0, 2, 4, 6, 8]);
}

#[rstest]
#[case(1..4, vec![1, 2, 3])]
#[case(4..9, vec![4])]
#[case(7..9, vec![])]
fn test_range(#[case] range: std::ops::Range<i32>, #[case] expected: Vec<i32>) {
    let set: PersistentTreeSet<i32> = (0..5).collect();
    assert_eq!(set.range(range).copied().collect::<Vec<_>>(), expected);
}

#[rstest]
fn test_range_descending() {
    let set: PersistentTreeSet<i32> = (0..10).collect();
    assert_eq!(
        set.range_descending(3..6).copied().collect::<Vec<_>>(),
        vec![5, 4, 3]
    );
    assert_eq!(set.iter_descending().next(), Some(&9));
}

#[rstest]
fn test_reverse_comparator() {
    let set = PersistentTreeSet::with_comparator(ReverseOrder(NaturalOrder)).conj_all(0..5);
    assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![4, 3, 2, 1, 0]);
    assert_eq!(set.range(3..).copied().collect::<Vec<_>>(), vec![3, 2, 1, 0]);
    assert_eq!(set.range(..=3).copied().collect::<Vec<_>>(), vec![4, 3]);
}

#[rstest]
fn test_comparator_fn_by_length() {
    let by_length = ComparatorFn::new(|left: &&str, right: &&str| left.len().cmp(&right.len()));
    let set = PersistentTreeSet::with_comparator(by_length).conj_all(["ccc", "a", "bb", "dd"]);
    assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec!["a", "bb", "ccc"]);
}

#[rstest]
fn test_set_algebra() {
    let left: PersistentTreeSet<i32> = (0..6).collect();
    let right: PersistentTreeSet<i32> = (4..10).collect();
    assert_eq!(left.union(&right), (0..10).collect::<PersistentTreeSet<i32>>());
    assert_eq!(left.intersection(&right), PersistentTreeSet::<i32>::from([4, 5]));
    assert_eq!(left.difference(&right), (0..4).collect::<PersistentTreeSet<i32>>());
}

#[rstest]
fn test_spliterator_and_view() {
    let set: PersistentTreeSet<i32> = (0..64).collect();
    let mut upper = set.spliterator();
    let lower = upper.try_split().expect("tree splits");
    let joined: Vec<i32> = lower.chain(upper).copied().collect();
    assert_eq!(joined, (0..64).collect::<Vec<_>>());

    let view = set.as_set();
    assert!(view.contains(&63));
    assert_eq!(view.len(), 64);
}

#[rstest]
fn test_equal_sets_compare_equal() {
    let forward: PersistentTreeSet<i32> = (0..100).collect();
    let backward: PersistentTreeSet<i32> = (0..100).rev().collect();
    assert_eq!(forward, backward);
    assert_eq!(format!("{:?}", PersistentTreeSet::<i32>::from([2, 1])), "{1, 2}");
}
