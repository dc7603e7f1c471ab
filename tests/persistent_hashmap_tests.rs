//! Unit tests for PersistentHashMap and MutableHashMap.

use persistent_collections::CollectionError;
use persistent_collections::persistent::{
    CapturePrevious, KeepExisting, MergeWhen, MutableHashMap, PersistentHashMap,
    RejectDuplicates, Spliterator,
};
use rstest::rstest;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasherDefault, Hasher};

// =============================================================================
// Hashers with controlled output
// =============================================================================

/// Returns the `u64` it was fed, so tests can place keys in chosen trie slots.
#[derive(Default)]
struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 = (self.0 << 8) | u64::from(*byte);
        }
    }

    fn write_u64(&mut self, value: u64) {
        self.0 = value;
    }
}

type IdentityBuildHasher = BuildHasherDefault<IdentityHasher>;

/// Sends every key to the same hash.
#[derive(Default)]
struct ConstantHasher;

impl Hasher for ConstantHasher {
    fn finish(&self) -> u64 {
        0x5eed
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

type ConstantBuildHasher = BuildHasherDefault<ConstantHasher>;

// =============================================================================
// Basic Construction Tests
// =============================================================================

#[rstest]
fn test_new_creates_empty_map() {
    let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.iter().count(), 0);
}

#[rstest]
fn test_singleton_creates_map_with_one_entry() {
    let map = PersistentHashMap::singleton("answer".to_string(), 42);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("answer"), Some(&42));
}

#[rstest]
fn test_from_array() {
    let map = PersistentHashMap::<_, _>::from([("a", 1), ("b", 2)]);
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&"b"), Some(&2));
}

#[rstest]
fn test_from_keys_values() {
    let map = PersistentHashMap::<_, _>::from_keys_values(vec![1, 2, 3], vec!['a', 'b', 'c'])
        .expect("lengths match");
    assert_eq!(map.get(&2), Some(&'b'));
    assert_eq!(map.len(), 3);
}

#[rstest]
fn test_from_keys_values_length_mismatch() {
    let result = PersistentHashMap::<i32, char>::from_keys_values(vec![1, 2, 3], vec!['a']);
    assert_eq!(
        result.err(),
        Some(CollectionError::LengthMismatch { keys: 3, values: 1 })
    );
}

// =============================================================================
// Assoc and Dissoc Tests
// =============================================================================

#[rstest]
fn test_assoc_assoc_dissoc_scenario() {
    let map = PersistentHashMap::new()
        .assoc("a", 1)
        .assoc("b", 2)
        .dissoc("a");
    assert_eq!(map.len(), 1);
    assert!(!map.contains_key("a"));
    assert_eq!(map.get("b"), Some(&2));
}

#[rstest]
fn test_assoc_preserves_original() {
    let original = PersistentHashMap::new().assoc(1, "one");
    let updated = original.assoc(1, "uno").assoc(2, "two");
    assert_eq!(original.len(), 1);
    assert_eq!(original.get(&1), Some(&"one"));
    assert_eq!(updated.len(), 2);
    assert_eq!(updated.get(&1), Some(&"uno"));
}

#[rstest]
fn test_dissoc_absent_key_returns_same_map() {
    let map = PersistentHashMap::new().assoc(1, 1).assoc(2, 2);
    assert!(map.dissoc(&3).ptr_eq(&map));
}

#[rstest]
fn test_dissoc_last_key_leaves_empty_map() {
    let map = PersistentHashMap::singleton(1, 1).dissoc(&1);
    assert!(map.is_empty());
    assert_eq!(map.get(&1), None);
    assert_eq!(map, PersistentHashMap::new());
}

#[rstest]
fn test_assoc_with_keep_existing_is_noop() {
    let map = PersistentHashMap::new().assoc("k", 1);
    assert!(map.assoc_with("k", 2, KeepExisting).ptr_eq(&map));
}

#[rstest]
fn test_assoc_with_capture_previous() {
    let map = PersistentHashMap::new().assoc("k", 1);
    let mut capture = CapturePrevious::new();
    let updated = map.assoc_with("k", 2, &mut capture);
    assert_eq!(capture.previous(), Some(&1));
    assert_eq!(updated.get("k"), Some(&2));
}

#[rstest]
#[case(1, 5, 5)]
#[case(5, 1, 5)]
fn test_assoc_with_merge_when(#[case] first: i32, #[case] second: i32, #[case] expected: i32) {
    let map = PersistentHashMap::new()
        .assoc("k", first)
        .assoc_with("k", second, MergeWhen(|old: &i32, new: &i32| new > old));
    assert_eq!(map.get("k"), Some(&expected));
}

#[rstest]
fn test_assoc_new_rejects_duplicate() {
    let map = PersistentHashMap::new().assoc("k", 1);
    assert_eq!(map.assoc_new("k", 2).err(), Some(CollectionError::DuplicateKey));
    let extended = map.assoc_new("j", 2).expect("fresh key");
    assert_eq!(extended.len(), 2);
}

#[rstest]
fn test_assoc_all_with_reject_duplicates() {
    let map = PersistentHashMap::new().assoc(1, "one");
    let mut policy = RejectDuplicates::new();
    let updated = map.assoc_all_with([(1, "uno"), (2, "two")], &mut policy);
    assert!(policy.rejected());
    assert_eq!(updated.get(&1), Some(&"one"));
    assert_eq!(updated.len(), 2);
}

#[rstest]
fn test_dissoc_all() {
    let map: PersistentHashMap<i32, i32> = (0..100).map(|key| (key, key)).collect();
    let removed: Vec<i32> = (0..100).filter(|key| key % 3 == 0).collect();
    let trimmed = map.dissoc_all(&removed);
    assert_eq!(trimmed.len(), 66);
    assert!(removed.iter().all(|key| !trimmed.contains_key(key)));
    assert!(trimmed.dissoc_all(&removed).ptr_eq(&trimmed));
}

// =============================================================================
// Hash Layout Tests
// =============================================================================

#[rstest]
fn test_keys_sharing_first_fragment_resolve() {
    let keys: Vec<u64> = (0..40).map(|index| index * 32 + 7).collect();
    let map: PersistentHashMap<u64, u64, IdentityBuildHasher> =
        keys.iter().map(|key| (*key, key * 10)).collect();
    assert_eq!(map.len(), 40);
    for key in &keys {
        assert_eq!(map.get(key), Some(&(key * 10)));
    }
    assert_eq!(map.get(&(40 * 32 + 7)), None);
}

#[rstest]
fn test_full_hash_collisions_resolve_and_shrink() {
    let map: PersistentHashMap<i32, i32, ConstantBuildHasher> =
        (0..40).map(|key| (key, -key)).collect();
    assert_eq!(map.len(), 40);
    assert!((0..40).all(|key| map.get(&key) == Some(&-key)));

    let shrunk = (0..39).fold(map.clone(), |acc, key| acc.dissoc(&key));
    assert_eq!(shrunk.len(), 1);
    assert_eq!(shrunk.get(&39), Some(&-39));
    assert_eq!(map.len(), 40);
}

#[rstest]
fn test_wide_trie_promotes_and_demotes() {
    let map: PersistentHashMap<u64, u64, IdentityBuildHasher> = (0..64).map(|key| (key, key)).collect();
    let sparse = (0..60).fold(map.clone(), |acc, key| acc.dissoc(&key));
    assert_eq!(sparse.len(), 4);
    let remaining: BTreeSet<u64> = sparse.keys().copied().collect();
    assert_eq!(remaining, (60..64).collect::<BTreeSet<u64>>());
    assert_eq!(map.len(), 64);
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[rstest]
fn test_iter_visits_every_entry_once() {
    let map: PersistentHashMap<i32, i32> = (0..1000).map(|key| (key, key * 2)).collect();
    let collected: HashMap<i32, i32> = map.iter().map(|(key, value)| (*key, *value)).collect();
    assert_eq!(collected.len(), 1000);
    assert!(collected.iter().all(|(key, value)| *value == key * 2));
    assert_eq!(map.iter().len(), 1000);
}

#[rstest]
fn test_values_and_owned_iteration() {
    let map = PersistentHashMap::<_, _>::from([(1, 10), (2, 20)]);
    let mut values: Vec<i32> = map.values().copied().collect();
    values.sort_unstable();
    assert_eq!(values, vec![10, 20]);

    let mut owned: Vec<(i32, i32)> = map.into_iter().collect();
    owned.sort_unstable();
    assert_eq!(owned, vec![(1, 10), (2, 20)]);
}

#[rstest]
fn test_spliterator_partitions_entries() {
    let map: PersistentHashMap<i32, i32> = (0..500).map(|key| (key, key)).collect();
    let mut right = map.spliterator();
    let left = right.try_split().expect("large trie splits");
    let mut seen: Vec<i32> = left.chain(right).map(|(key, _)| *key).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..500).collect::<Vec<_>>());
}

// =============================================================================
// Equality Tests
// =============================================================================

#[rstest]
fn test_equality_ignores_insertion_order() {
    let forward: PersistentHashMap<i32, i32> = (0..200).map(|key| (key, key)).collect();
    let backward: PersistentHashMap<i32, i32> = (0..200).rev().map(|key| (key, key)).collect();
    assert_eq!(forward, backward);
    assert_ne!(forward, backward.assoc(0, 1));
}

// =============================================================================
// View Tests
// =============================================================================

#[rstest]
fn test_map_view_reads_and_rejects_mutation() {
    let map = PersistentHashMap::new().assoc(1, "one");
    let mut view = map.as_map();
    assert_eq!(view.get(&1), Some(&"one"));
    assert_eq!(view[&1], "one");
    assert_eq!(view.len(), 1);
    assert_eq!(
        view.insert(2, "two"),
        Err(CollectionError::UnsupportedOperation { operation: "insert" })
    );
    assert_eq!(
        view.remove(&1),
        Err(CollectionError::UnsupportedOperation { operation: "remove" })
    );
    assert_eq!(
        view.clear(),
        Err(CollectionError::UnsupportedOperation { operation: "clear" })
    );
    assert_eq!(map.len(), 1);
}

// =============================================================================
// MutableHashMap Tests
// =============================================================================

#[rstest]
fn test_transient_snapshot_is_isolated() {
    let mut transient = MutableHashMap::new();
    for key in 0..1000 {
        transient.put(key, key);
    }
    let snapshot = transient.to_persistent_map();

    for key in 0..500 {
        transient.put(key, -key);
    }
    for key in 500..700 {
        transient.remove(&key);
    }
    transient.put(5000, 5000);

    assert_eq!(snapshot.len(), 1000);
    assert!((0..1000).all(|key| snapshot.get(&key) == Some(&key)));
    assert_eq!(snapshot.get(&5000), None);

    assert_eq!(transient.len(), 801);
    assert_eq!(transient.get(&3), Some(&-3));
    assert_eq!(transient.get(&600), None);
}

#[rstest]
fn test_transient_from_persistent_leaves_source_untouched() {
    let source: PersistentHashMap<i32, i32> = (0..300).map(|key| (key, key)).collect();
    let mut transient = source.transient();
    transient.put(0, 100);
    assert_eq!(transient.remove(&1), Some(1));
    let edited = transient.persistent();

    assert_eq!(source.get(&0), Some(&0));
    assert_eq!(source.get(&1), Some(&1));
    assert_eq!(edited.get(&0), Some(&100));
    assert_eq!(edited.len(), 299);
}

#[rstest]
fn test_transient_put_and_remove_report_previous() {
    let mut map = MutableHashMap::new();
    assert_eq!(map.put("a", 1), None);
    assert_eq!(map.put("a", 2), Some(1));
    assert_eq!(map.remove("a"), Some(2));
    assert_eq!(map.remove("a"), None);
    assert!(map.is_empty());
}

#[rstest]
fn test_transient_put_with_and_merge() {
    let mut map = MutableHashMap::new();
    assert!(map.put_with("k", 1, KeepExisting));
    assert!(!map.put_with("k", 2, KeepExisting));
    map.merge("k", 10, |existing, added| existing + added);
    map.merge("j", 7, |existing, added| existing + added);
    assert_eq!(map.get("k"), Some(&11));
    assert_eq!(map.get("j"), Some(&7));
}

#[rstest]
fn test_transient_survives_repeated_freezing() {
    let mut transient = MutableHashMap::with_expected_updates(64);
    let mut snapshots = Vec::new();
    for round in 0..5 {
        transient.extend((0..64).map(|key| (key, round)));
        snapshots.push(transient.to_persistent_map());
    }
    for (round, snapshot) in snapshots.iter().enumerate() {
        let expected = i32::try_from(round).expect("small round");
        assert!(snapshot.values().all(|value| *value == expected));
    }
}
