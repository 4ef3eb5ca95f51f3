//! Spec section 8's durability property: after `close_buffer_pool`,
//! reopening the file and walking the tree yields the identical key set
//! and values. Also covers scenario 6's magic-number reopen checks.

mod common;

use pagestore::btree;
use pagestore::buffer_pool::BufferPool;
use pagestore::file::TableRegistry;

use common::{setup, temp_path, val_for_key};

#[test]
fn reopening_after_flush_preserves_every_record() {
    setup();
    let path = temp_path("durability");
    let mut rng = rand::thread_rng();

    let mut expected = std::collections::HashMap::new();
    {
        let mut files = TableRegistry::new();
        let table_id = files.open_table_file(&path).unwrap();
        let mut pool = BufferPool::new(8, 32);

        for k in 0..1500i64 {
            let value = val_for_key(k, &mut rng);
            btree::insert::insert(&mut pool, &mut files, table_id, k, &value).unwrap();
            expected.insert(k, value);
        }
        for k in (0..1500i64).step_by(7) {
            btree::delete::delete(&mut pool, &mut files, table_id, k).unwrap();
            expected.remove(&k);
        }

        pool.flush_all(&mut files).unwrap();
        files.close_all().unwrap();
    }

    {
        let mut files = TableRegistry::new();
        let table_id = files.open_table_file(&path).unwrap();
        let mut pool = BufferPool::new(8, 32);

        let scanned = btree::scan::scan(&mut pool, &mut files, table_id, 0, 1500).unwrap();
        let mut expected_keys: Vec<i64> = expected.keys().copied().collect();
        expected_keys.sort();
        let scanned_keys: Vec<i64> = scanned.iter().map(|(k, _)| *k).collect();
        assert_eq!(scanned_keys, expected_keys);
        for (k, v) in &scanned {
            assert_eq!(v, expected.get(k).unwrap());
        }
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn reopening_with_correct_magic_preserves_the_tree() {
    setup();
    let path = temp_path("reopen_root");
    let mut rng = rand::thread_rng();
    let value = val_for_key(1, &mut rng);

    {
        let mut files = TableRegistry::new();
        let table_id = files.open_table_file(&path).unwrap();
        let mut pool = BufferPool::new(8, 32);
        btree::insert::insert(&mut pool, &mut files, table_id, 1, &value).unwrap();
        pool.flush_all(&mut files).unwrap();
        files.close_all().unwrap();
    }

    let mut files = TableRegistry::new();
    let table_id = files.open_table_file(&path).unwrap();
    let mut pool = BufferPool::new(8, 32);
    let found = btree::find(&mut pool, &mut files, table_id, 1).unwrap();
    assert_eq!(found, value);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn reopening_with_corrupted_magic_is_rejected() {
    setup();
    use std::io::Write;
    let path = temp_path("reopen_corrupt");

    {
        let mut files = TableRegistry::new();
        files.open_table_file(&path).unwrap();
        files.close_all().unwrap();
    }

    let mut file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.write_all(&[0u8; 8]).unwrap();
    drop(file);

    let mut files = TableRegistry::new();
    let err = files.open_table_file(&path).unwrap_err();
    assert!(matches!(err, pagestore::Error::FormatMismatch { .. }));

    let _ = std::fs::remove_file(&path);
}
