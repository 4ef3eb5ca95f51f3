//! The B+ tree proper: search, insert (with leaf/internal splitting), and
//! delete (with coalescing and redistribution), all expressed over
//! `BufferPool` frames rather than raw pages so every mutation goes through
//! pin/dirty/unpin.

pub mod delete;
pub mod insert;
pub mod scan;
mod search;

pub use search::{find, find_leaf};

use crate::buffer_pool::BufferPool;
use crate::error::Result;
use crate::file::TableRegistry;
use crate::page::{HeaderView, HeaderViewMut};
use crate::page_id::{PageId, TableId};

/// Split point used by both the original reference layout and this one:
/// for an even-length run the midpoint, for an odd-length run one past the
/// midpoint. Matches `cut()` in the design this tree is ported from.
pub(crate) fn cut(length: usize) -> usize {
    if length % 2 == 0 {
        length / 2
    } else {
        length / 2 + 1
    }
}

pub(crate) fn read_root(pool: &mut BufferPool, files: &mut TableRegistry, table_id: TableId) -> Result<u64> {
    let f = pool.get_buffer(files, PageId::header(table_id))?;
    let root = HeaderView(pool.bytes(f)).root();
    pool.unpin(f)?;
    Ok(root)
}

pub(crate) fn write_root(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    root: u64,
) -> Result<()> {
    let f = pool.get_buffer(files, PageId::header(table_id))?;
    HeaderViewMut(pool.bytes_mut(f)).set_root(root);
    pool.unpin(f)?;
    Ok(())
}

pub(crate) fn set_parent(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    page_num: u64,
    parent: u64,
) -> Result<()> {
    let f = pool.get_buffer(files, PageId::new(table_id, page_num))?;
    crate::page::set_parent_of(pool.bytes_mut(f), parent);
    pool.unpin(f)?;
    Ok(())
}
