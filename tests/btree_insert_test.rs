//! Scenario 1 (spec section 8): insert a large randomized key set and
//! confirm every key round-trips, then check the buffer pool's hit ratio
//! at two different frame-pool sizes.

mod common;

use rand::seq::SliceRandom;

use pagestore::btree;
use pagestore::page_id::TableId;

use common::{fresh_table, setup, val_for_key};

const N: i64 = 5000;

fn insert_shuffled(table_id: TableId, pool: &mut pagestore::buffer_pool::BufferPool, files: &mut pagestore::file::TableRegistry) {
    let mut rng = rand::thread_rng();
    let mut keys: Vec<i64> = (0..N).collect();
    keys.shuffle(&mut rng);

    for k in keys {
        let value = val_for_key(k, &mut rng);
        btree::insert::insert(pool, files, table_id, k, &value).unwrap();
    }
}

#[test]
fn insert_5000_keys_and_find_every_one() {
    setup();
    let (mut pool, mut files, table_id, path) = fresh_table("insert_5000", 100, 1024);

    insert_shuffled(table_id, &mut pool, &mut files);

    for k in 0..N {
        let found = btree::find(&mut pool, &mut files, table_id, k).unwrap();
        // The value was derived from its key (see `val_for_key`); its
        // first 8 bytes always encode the key regardless of the
        // randomized total size.
        assert_eq!(i64::from_le_bytes(found[..8].try_into().unwrap()), k);
        assert!(found.len() >= pagestore::consts::MIN_VALUE_SIZE);
        assert!(found.len() <= pagestore::consts::MAX_VALUE_SIZE);
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn duplicate_key_is_rejected() {
    setup();
    let (mut pool, mut files, table_id, path) = fresh_table("dup_key", 16, 64);
    let mut rng = rand::thread_rng();

    btree::insert::insert(&mut pool, &mut files, table_id, 7, &val_for_key(7, &mut rng)).unwrap();
    let err = btree::insert::insert(&mut pool, &mut files, table_id, 7, &val_for_key(7, &mut rng)).unwrap_err();
    assert!(matches!(err, pagestore::Error::DuplicateKey { .. }));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn out_of_range_value_size_is_rejected() {
    setup();
    let (mut pool, mut files, table_id, path) = fresh_table("bad_size", 16, 64);

    let too_small = vec![0u8; pagestore::consts::MIN_VALUE_SIZE - 1];
    let too_big = vec![0u8; pagestore::consts::MAX_VALUE_SIZE + 1];
    assert!(matches!(
        btree::insert::insert(&mut pool, &mut files, table_id, 1, &too_small),
        Err(pagestore::Error::InvalidArgument(_))
    ));
    assert!(matches!(
        btree::insert::insert(&mut pool, &mut files, table_id, 2, &too_big),
        Err(pagestore::Error::InvalidArgument(_))
    ));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn hit_ratio_is_at_least_75_percent_with_32_frames() {
    setup();
    let (mut pool, mut files, table_id, path) = fresh_table("hit_ratio_32", 32, 512);
    insert_shuffled(table_id, &mut pool, &mut files);
    pool.reset_stats();
    for k in 0..N {
        btree::find(&mut pool, &mut files, table_id, k).unwrap();
    }
    assert!(pool.hit_ratio() >= 0.75, "hit ratio was {}", pool.hit_ratio());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn hit_ratio_is_at_least_95_percent_with_256_frames() {
    setup();
    let (mut pool, mut files, table_id, path) = fresh_table("hit_ratio_256", 256, 2048);
    insert_shuffled(table_id, &mut pool, &mut files);
    pool.reset_stats();
    for k in 0..N {
        btree::find(&mut pool, &mut files, table_id, k).unwrap();
    }
    assert!(pool.hit_ratio() >= 0.95, "hit ratio was {}", pool.hit_ratio());
    let _ = std::fs::remove_file(&path);
}
