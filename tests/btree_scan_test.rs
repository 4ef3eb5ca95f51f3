//! Scenario 3 (spec section 8): after the insert and delete scenarios, a
//! full-range scan returns exactly the surviving keys in ascending order
//! with matching values.

mod common;

use rand::seq::SliceRandom;

use pagestore::btree;

use common::{fresh_table, setup, val_for_key};

const N: i64 = 5000;
const DELETE_COUNT: usize = 100;

#[test]
fn scan_after_insert_and_delete_returns_ordered_survivors() {
    setup();
    let (mut pool, mut files, table_id, path) = fresh_table("scan_survivors", 100, 1024);
    let mut rng = rand::thread_rng();

    let mut values = std::collections::HashMap::new();
    for k in 0..N {
        let value = val_for_key(k, &mut rng);
        btree::insert::insert(&mut pool, &mut files, table_id, k, &value).unwrap();
        values.insert(k, value);
    }

    let mut all_keys: Vec<i64> = (0..N).collect();
    all_keys.shuffle(&mut rng);
    for &k in &all_keys[..DELETE_COUNT] {
        btree::delete::delete(&mut pool, &mut files, table_id, k).unwrap();
        values.remove(&k);
    }

    let scanned = btree::scan::scan(&mut pool, &mut files, table_id, -1, N + 1).unwrap();
    assert_eq!(scanned.len(), (N as usize) - DELETE_COUNT);

    let mut expected_keys: Vec<i64> = values.keys().copied().collect();
    expected_keys.sort();
    let scanned_keys: Vec<i64> = scanned.iter().map(|(k, _)| *k).collect();
    assert_eq!(scanned_keys, expected_keys);

    for (k, v) in &scanned {
        assert_eq!(v, values.get(k).unwrap());
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn scan_bounds_are_inclusive_on_both_ends() {
    setup();
    let (mut pool, mut files, table_id, path) = fresh_table("scan_bounds", 16, 64);
    let mut rng = rand::thread_rng();

    for k in [10, 20, 30, 40, 50] {
        btree::insert::insert(&mut pool, &mut files, table_id, k, &val_for_key(k, &mut rng)).unwrap();
    }

    let got = btree::scan::scan(&mut pool, &mut files, table_id, 20, 40).unwrap();
    let keys: Vec<i64> = got.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![20, 30, 40]);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn scan_over_an_empty_tree_is_empty() {
    setup();
    let (mut pool, mut files, table_id, path) = fresh_table("scan_empty", 16, 64);

    let got = btree::scan::scan(&mut pool, &mut files, table_id, 0, 100).unwrap();
    assert!(got.is_empty());

    let _ = std::fs::remove_file(&path);
}
