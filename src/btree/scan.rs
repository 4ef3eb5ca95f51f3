use crate::buffer_pool::BufferPool;
use crate::consts::NONE_PAGE;
use crate::error::Result;
use crate::file::TableRegistry;
use crate::page::LeafView;
use crate::page_id::{PageId, TableId};

use super::read_root;

/// Collect every `(key, value)` with `begin_key <= key <= end_key`, walking
/// leaf-to-leaf via `right_sibling` pointers once the starting leaf is
/// located (spec 4.3's range scan, 6.1's `db_scan`). Returns entries in
/// ascending key order.
pub fn scan(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    begin_key: i64,
    end_key: i64,
) -> Result<Vec<(i64, Vec<u8>)>> {
    let mut results = Vec::new();
    if read_root(pool, files, table_id)? == NONE_PAGE {
        return Ok(results);
    }

    let mut leaf_frame = super::find_leaf(pool, files, table_id, begin_key)?;
    loop {
        let (entries, next_sibling) = {
            let view = LeafView(pool.bytes(leaf_frame));
            let mut entries = Vec::new();
            for i in 0..view.num_slots() {
                let k = view.slot_key(i);
                if k >= begin_key && k <= end_key {
                    entries.push((k, view.record(i).to_vec()));
                }
            }
            (entries, view.right_sibling())
        };
        results.extend(entries);
        pool.unpin(leaf_frame)?;

        if next_sibling == NONE_PAGE {
            break;
        }
        let next_frame = pool.get_buffer(files, PageId::new(table_id, next_sibling))?;
        let continue_scan = LeafView(pool.bytes(next_frame)).min_key().map_or(false, |k| k <= end_key);
        if !continue_scan {
            pool.unpin(next_frame)?;
            break;
        }
        leaf_frame = next_frame;
    }

    Ok(results)
}
