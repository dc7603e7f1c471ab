//! Unit tests for PersistentHashSet and MutableHashSet.

use persistent_collections::CollectionError;
use persistent_collections::persistent::{MutableHashSet, PersistentHashSet};
use rstest::rstest;
use std::collections::BTreeSet;

fn sorted(set: &PersistentHashSet<i32>) -> Vec<i32> {
    set.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

// =============================================================================
// Basic Operations
// =============================================================================

#[rstest]
fn test_new_creates_empty_set() {
    let set: PersistentHashSet<i32> = PersistentHashSet::new();
    assert!(set.is_empty());
    assert!(!set.contains(&1));
}

#[rstest]
fn test_conj_and_disj() {
    let set = PersistentHashSet::new().conj(1).conj(2).conj(1);
    assert_eq!(set.len(), 2);
    assert_eq!(sorted(&set), vec![1, 2]);

    let removed = set.disj(&1);
    assert_eq!(sorted(&removed), vec![2]);
    assert_eq!(sorted(&set), vec![1, 2]);
}

#[rstest]
fn test_conj_present_element_returns_same_set() {
    let set = PersistentHashSet::singleton("x".to_string());
    assert!(set.conj("x".to_string()).ptr_eq(&set));
}

#[rstest]
fn test_disj_absent_element_returns_same_set() {
    let set: PersistentHashSet<i32> = (0..10).collect();
    assert!(set.disj(&42).ptr_eq(&set));
}

#[rstest]
fn test_contains_with_borrowed_form() {
    let set: PersistentHashSet<String> = ["alpha".to_string(), "beta".to_string()].into_iter().collect();
    assert!(set.contains("alpha"));
    assert!(!set.contains("gamma"));
}

#[rstest]
fn test_conj_all_and_disj_all() {
    let set = PersistentHashSet::new().conj_all(0..100);
    assert_eq!(set.len(), 100);
    let evens: Vec<i32> = (0..100).step_by(2).collect();
    let odds = set.disj_all(&evens);
    assert_eq!(odds.len(), 50);
    assert!(odds.iter().all(|element| element % 2 == 1));
}

// =============================================================================
// Set Algebra
// =============================================================================

#[rstest]
#[case(vec![1, 2, 3], vec![3, 4, 5], vec![1, 2, 3, 4, 5])]
#[case(vec![], vec![], vec![])]
#[case(vec![1], vec![], vec![1])]
fn test_union(#[case] left: Vec<i32>, #[case] right: Vec<i32>, #[case] expected: Vec<i32>) {
    let left: PersistentHashSet<i32> = left.into_iter().collect();
    let right: PersistentHashSet<i32> = right.into_iter().collect();
    assert_eq!(sorted(&left.union(&right)), expected);
    assert_eq!(left.union(&right), right.union(&left));
}

#[rstest]
fn test_intersection_and_difference() {
    let left: PersistentHashSet<i32> = (0..20).collect();
    let right: PersistentHashSet<i32> = (10..30).collect();
    assert_eq!(sorted(&left.intersection(&right)), (10..20).collect::<Vec<_>>());
    assert_eq!(sorted(&left.difference(&right)), (0..10).collect::<Vec<_>>());
    assert!(left.intersection(&right).is_subset(&left));
}

// =============================================================================
// Views
// =============================================================================

#[rstest]
fn test_set_view() {
    let set: PersistentHashSet<i32> = [1, 2].into_iter().collect();
    let mut view = set.as_set();
    assert!(view.contains(&1));
    assert_eq!(view.len(), 2);
    assert_eq!(view.iter().count(), 2);
    assert_eq!(
        view.insert(3),
        Err(CollectionError::UnsupportedOperation { operation: "insert" })
    );
    assert!(view.remove(&1).is_err());
    assert!(view.clear().is_err());
}

// =============================================================================
// MutableHashSet
// =============================================================================

#[rstest]
fn test_mutable_set_insert_remove() {
    let mut set = MutableHashSet::new();
    assert!(set.insert(1));
    assert!(!set.insert(1));
    assert!(set.insert(2));
    assert!(set.remove(&1));
    assert!(!set.remove(&1));
    assert_eq!(set.len(), 1);
    assert!(set.contains(&2));
}

#[rstest]
fn test_mutable_set_snapshot_isolated() {
    let mut transient: MutableHashSet<i32> = (0..100).collect();
    let snapshot = transient.to_persistent_set();
    for element in 0..50 {
        transient.remove(&element);
    }
    assert_eq!(snapshot.len(), 100);
    assert_eq!(transient.len(), 50);
    assert!(snapshot.contains(&0));
    assert!(!transient.contains(&0));
}

#[rstest]
fn test_transient_of_persistent_set() {
    let source: PersistentHashSet<i32> = (0..10).collect();
    let mut transient = source.transient();
    transient.insert(10);
    transient.remove(&0);
    let edited = transient.persistent();
    assert_eq!(sorted(&source), (0..10).collect::<Vec<_>>());
    assert_eq!(sorted(&edited), (1..=10).collect::<Vec<_>>());
}
