//! The engine's one configurable surface: frame and hashtable sizing for
//! the buffer pool. The donor tree has no dedicated config module of its
//! own (page size is a lazily-initialized global in its `buffer_pool.rs`);
//! this keeps that shape rather than introducing a file-based or
//! env-driven configuration layer the spec never calls for.

use crate::consts::{DEFAULT_NUM_BUF, DEFAULT_NUM_HT_ENTRIES, MIN_NUM_BUF, PAGE_SIZE};
use crate::error::{Error, Result};

/// Sizing knobs for `init_db`/`Engine::init`. `page_size` is exposed for
/// documentation purposes only -- it is fixed at `PAGE_SIZE` and cannot be
/// changed, matching the on-disk format in spec 6.2.
#[derive(Copy, Clone, Debug)]
pub struct Config {
    pub num_ht_entries: usize,
    pub num_buf: usize,
    pub page_size: usize,
}

impl Config {
    pub fn new(num_ht_entries: usize, num_buf: usize) -> Self {
        Config {
            num_ht_entries,
            num_buf,
            page_size: PAGE_SIZE,
        }
    }

    /// `num_buf` must be at least `MIN_NUM_BUF` (spec 4.2, 6.1).
    pub(crate) fn validate(&self) -> Result<()> {
        if self.num_buf < MIN_NUM_BUF {
            return Err(Error::InvalidArgument(format!(
                "num_buf {} is below the minimum of {}",
                self.num_buf, MIN_NUM_BUF
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_NUM_HT_ENTRIES, DEFAULT_NUM_BUF)
    }
}
