use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use pagestore::buffer_pool::BufferPool;
use pagestore::consts::{MAX_VALUE_SIZE, MIN_VALUE_SIZE};
use pagestore::file::TableRegistry;
use pagestore::{init_db, init_log, TableId};

/// Bring up logging and a freshly sized engine once per test binary. Safe to
/// call from every test; `init_db`/`init_log` are both idempotent.
pub fn setup() {
    init_log();
    let _ = init_db(1024, 64);
}

/// A scratch table path under the OS temp dir, unique per call so tests
/// running in parallel never collide on the same file.
pub fn temp_path(tag: &str) -> std::path::PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("pagestore_test_{}_{}.db", tag, n))
}

/// A value string of exactly `len` bytes, filled with `tag` so mismatches are
/// easy to spot.
pub fn val(tag: u8, len: usize) -> Vec<u8> {
    vec![tag; len]
}

/// A `[MIN_VALUE_SIZE, MAX_VALUE_SIZE]`-sized value whose bytes encode
/// `key`, so a round-tripped record can be checked against the key that
/// produced it without carrying a side table.
pub fn val_for_key(key: i64, rng: &mut impl Rng) -> Vec<u8> {
    let size = rng.gen_range(MIN_VALUE_SIZE, MAX_VALUE_SIZE + 1);
    let mut bytes = vec![0u8; size];
    bytes[..8].copy_from_slice(&key.to_le_bytes());
    for (i, b) in bytes.iter_mut().enumerate().skip(8) {
        *b = (key.wrapping_add(i as i64) % 251) as u8;
    }
    bytes
}

/// Build a standalone `(BufferPool, TableRegistry, table_id)` triple over a
/// fresh scratch file, bypassing the process-wide `Engine` singleton so
/// tests can vary frame/hashtable sizing independently (spec 8's
/// hit-ratio scenarios require both 32- and 256-frame pools in the same
/// process).
pub fn fresh_table(tag: &str, num_buf: usize, num_ht_entries: usize) -> (BufferPool, TableRegistry, TableId, PathBuf) {
    let path = temp_path(tag);
    let mut files = TableRegistry::new();
    let table_id = files.open_table_file(&path).unwrap();
    let pool = BufferPool::new(num_buf, num_ht_entries);
    (pool, files, table_id, path)
}
