//! Ties the file layer and buffer pool together behind one process-wide
//! handle, mirroring the donor's `Database::global()` singleton built on
//! `once_cell::sync::OnceCell`.

use std::sync::{Mutex, MutexGuard};

use once_cell::sync::OnceCell;

use crate::buffer_pool::BufferPool;
use crate::config::Config;
use crate::error::Result;
use crate::file::TableRegistry;
use crate::page_id::TableId;

static ENGINE: OnceCell<Mutex<Engine>> = OnceCell::new();

pub struct Engine {
    files: TableRegistry,
    pool: BufferPool,
}

impl Engine {
    fn new(config: Config) -> Self {
        Engine {
            files: TableRegistry::new(),
            pool: BufferPool::new(config.num_buf, config.num_ht_entries),
        }
    }

    /// Initialize the process-wide engine. Safe to call more than once;
    /// later calls are ignored, matching `init_db`'s idempotent contract
    /// (spec 6.1). Rejects `config.num_buf` below the minimum without
    /// touching any already-initialized engine.
    pub fn init(config: Config) -> Result<()> {
        config.validate()?;
        let _ = ENGINE.get_or_init(|| Mutex::new(Engine::new(config)));
        Ok(())
    }

    /// Access the engine, initializing it with default sizing (spec 10.3)
    /// if `init` hasn't run yet.
    pub fn global() -> MutexGuard<'static, Engine> {
        ENGINE
            .get_or_init(|| Mutex::new(Engine::new(Config::default())))
            .lock()
            .expect("engine mutex poisoned")
    }

    pub fn open_table<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<TableId> {
        self.files.open_table_file(path)
    }

    pub fn files_mut(&mut self) -> &mut TableRegistry {
        &mut self.files
    }

    pub fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    /// Split the engine into independent mutable borrows of its two parts.
    /// The B+ tree needs both simultaneously (the pool resolves frames, the
    /// file layer backs pool misses) without either owning the other.
    pub fn parts_mut(&mut self) -> (&mut BufferPool, &mut TableRegistry) {
        (&mut self.pool, &mut self.files)
    }

    /// Hit count, miss count, and frame count, for the `p` shell command
    /// and the hit-ratio testable properties.
    pub fn buffer_stats(&self) -> (u64, u64, usize) {
        (self.pool.hits(), self.pool.misses(), self.pool.num_frames())
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.pool.flush_all(&mut self.files)?;
        self.files.close_all()?;
        Ok(())
    }
}
