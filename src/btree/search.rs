use crate::buffer_pool::{BufferPool, FrameId};
use crate::consts::NONE_PAGE;
use crate::error::{Error, Result};
use crate::file::TableRegistry;
use crate::page::{InternalView, LeafView};
use crate::page_id::{PageId, TableId};

use super::read_root;

/// Descend from the root to the leaf that would hold `key`, per spec
/// 4.3.1. Returns the leaf pinned; the caller must unpin it. `Err` with
/// `EmptyTable` if the tree has no root yet.
pub fn find_leaf(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    key: i64,
) -> Result<FrameId> {
    let mut page_num = read_root(pool, files, table_id)?;
    if page_num == NONE_PAGE {
        return Err(Error::EmptyTable { table_id });
    }

    loop {
        let frame = pool.get_buffer(files, PageId::new(table_id, page_num))?;
        if crate::page::is_leaf(pool.bytes(frame)) {
            return Ok(frame);
        }
        let next = InternalView(pool.bytes(frame)).route(key);
        pool.unpin(frame)?;
        page_num = next;
    }
}

/// Point lookup: descend to the owning leaf and return a copy of the
/// record, if present (spec 6.1's `db_find`).
pub fn find(pool: &mut BufferPool, files: &mut TableRegistry, table_id: TableId, key: i64) -> Result<Vec<u8>> {
    let leaf_frame = find_leaf(pool, files, table_id, key)?;
    let view = LeafView(pool.bytes(leaf_frame));
    let result = view.find_slot(key).map(|i| view.record(i).to_vec());
    pool.unpin(leaf_frame)?;
    result.ok_or(Error::NotFound { table_id, key })
}
