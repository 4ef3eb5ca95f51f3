pub mod btree;
pub mod buffer_pool;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod file;
mod log;
pub mod page;
pub mod page_id;

pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};
pub use log::init_log;
pub use page_id::TableId;

use std::path::Path;

/// Bring up the process-wide engine with explicit frame and hashtable
/// sizing. Idempotent: a second call after the engine is already running
/// is a no-op (spec 6.1). Fails if `num_buf` is below the minimum frame
/// count (spec 4.2).
pub fn init_db(num_ht_entries: usize, num_buf: usize) -> Result<()> {
    engine::Engine::init(Config::new(num_ht_entries, num_buf))
}

/// Open (creating if necessary) the table file at `path` and return its
/// table id, allocating it from the process-wide engine (spec 6.1).
pub fn open_table<P: AsRef<Path>>(path: P) -> Result<TableId> {
    engine::Engine::global().open_table(path)
}

/// Insert `(key, value)` into `table_id`'s tree (spec 6.1's `db_insert`).
pub fn db_insert(table_id: TableId, key: i64, value: &[u8]) -> Result<()> {
    let mut e = engine::Engine::global();
    let (pool, files) = e.parts_mut();
    btree::insert::insert(pool, files, table_id, key, value)
}

/// Look up `key` in `table_id`'s tree (spec 6.1's `db_find`). Fails with
/// `EmptyTable` if the tree has no root yet (status 1) or `NotFound` if
/// the tree is non-empty but `key` is absent (status 2).
pub fn db_find(table_id: TableId, key: i64) -> Result<Vec<u8>> {
    let mut e = engine::Engine::global();
    let (pool, files) = e.parts_mut();
    btree::find(pool, files, table_id, key)
}

/// Delete `key` from `table_id`'s tree (spec 6.1's `db_delete`).
pub fn db_delete(table_id: TableId, key: i64) -> Result<()> {
    let mut e = engine::Engine::global();
    let (pool, files) = e.parts_mut();
    btree::delete::delete(pool, files, table_id, key)
}

/// Collect every record with a key in `[begin_key, end_key]` (spec 6.1's
/// `db_scan`).
pub fn db_scan(table_id: TableId, begin_key: i64, end_key: i64) -> Result<Vec<(i64, Vec<u8>)>> {
    let mut e = engine::Engine::global();
    let (pool, files) = e.parts_mut();
    btree::scan::scan(pool, files, table_id, begin_key, end_key)
}

/// Flush every dirty frame and close every open table file (spec 6.1's
/// `shutdown_db`).
pub fn shutdown_db() -> Result<()> {
    engine::Engine::global().shutdown()
}
