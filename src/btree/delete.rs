use crate::buffer_pool::{BufferPool, FrameId};
use crate::consts::{DATA_SIZE, INTERNAL_MIN_KEYS, NONE_PAGE, THRESHOLD};
use crate::error::{Error, Result};
use crate::file::TableRegistry;
use crate::page::{InternalView, InternalViewMut, LeafView, LeafViewMut, MAX_PAIRS};
use crate::page_id::{PageId, TableId};

use super::{read_root, set_parent, write_root};

/// Delete `key` from the table's tree, coalescing or redistributing
/// under-occupied nodes to keep every page at or above its minimum
/// occupancy (spec 4.3.3). Fails with `NotFound` if `key` is absent.
pub fn delete(pool: &mut BufferPool, files: &mut TableRegistry, table_id: TableId, key: i64) -> Result<()> {
    let leaf_frame = match super::find_leaf(pool, files, table_id, key) {
        Ok(frame) => frame,
        Err(Error::EmptyTable { .. }) => return Err(Error::NotFound { table_id, key }),
        Err(e) => return Err(e),
    };
    if LeafView(pool.bytes(leaf_frame)).find_slot(key).is_none() {
        pool.unpin(leaf_frame)?;
        return Err(Error::NotFound { table_id, key });
    }
    delete_entry(pool, files, table_id, leaf_frame, key)
}

/// Remove `key` from `frame` (a pinned leaf or internal page) and restore
/// the tree's occupancy invariants, recursing into the parent when a
/// coalescence bubbles a key up. Consumes the pin on `frame`.
fn delete_entry(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    frame: FrameId,
    key: i64,
) -> Result<()> {
    let is_leaf = crate::page::is_leaf(pool.bytes(frame));
    if is_leaf {
        LeafViewMut(pool.bytes_mut(frame)).remove_record(key);
    } else {
        let idx = InternalView(pool.bytes(frame)).insertion_index(key);
        InternalViewMut(pool.bytes_mut(frame)).remove_pair(idx);
    }
    pool.mark_dirty(frame);

    let this_page_num = pool.page_id(frame).page_num;
    let root = read_root(pool, files, table_id)?;
    if this_page_num == root {
        return adjust_root(pool, files, table_id, frame, is_leaf);
    }

    let (under_min, parent_num) = if is_leaf {
        let v = LeafView(pool.bytes(frame));
        (v.free_space() < THRESHOLD, v.parent())
    } else {
        let v = InternalView(pool.bytes(frame));
        (v.num_keys() < INTERNAL_MIN_KEYS, v.parent())
    };

    if !under_min {
        pool.unpin(frame)?;
        return Ok(());
    }

    let parent_frame = pool.get_buffer(files, PageId::new(table_id, parent_num))?;
    let neighbor_index = InternalView(pool.bytes(parent_frame))
        .child_index(this_page_num)
        .ok_or_else(|| Error::Corruption(format!("page {} missing from its own parent", this_page_num)))?;
    let k_prime_index = if neighbor_index == -1 { 0 } else { neighbor_index as usize };

    let (k_prime, neighbor_page_num) = {
        let v = InternalView(pool.bytes(parent_frame));
        if neighbor_index > 0 {
            (v.key(neighbor_index as usize), v.child(neighbor_index as usize - 1))
        } else if neighbor_index == -1 {
            (v.key(0), v.child(0))
        } else {
            (v.key(0), v.leftmost_child())
        }
    };

    let neighbor_frame = pool.get_buffer(files, PageId::new(table_id, neighbor_page_num))?;

    let is_coalescence = if is_leaf {
        let a = LeafView(pool.bytes(frame)).free_space();
        let b = LeafView(pool.bytes(neighbor_frame)).free_space();
        a + b >= DATA_SIZE
    } else {
        let a = InternalView(pool.bytes(frame)).num_keys();
        let b = InternalView(pool.bytes(neighbor_frame)).num_keys();
        a + b < MAX_PAIRS
    };

    if is_coalescence {
        coalesce_nodes(
            pool,
            files,
            table_id,
            frame,
            neighbor_frame,
            parent_frame,
            neighbor_index,
            k_prime,
            is_leaf,
        )
    } else {
        redistribute_nodes(
            pool,
            files,
            table_id,
            frame,
            neighbor_frame,
            parent_frame,
            neighbor_index,
            k_prime_index,
            k_prime,
            is_leaf,
        )
    }
}

fn adjust_root(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    frame: FrameId,
    is_leaf: bool,
) -> Result<()> {
    let occupancy = if is_leaf {
        LeafView(pool.bytes(frame)).num_slots()
    } else {
        InternalView(pool.bytes(frame)).num_keys()
    };
    if occupancy > 0 {
        pool.unpin(frame)?;
        return Ok(());
    }

    let page_num = pool.page_id(frame).page_num;
    if is_leaf {
        pool.unpin(frame)?;
        pool.free_page(files, table_id, page_num)?;
        write_root(pool, files, table_id, NONE_PAGE)
    } else {
        let new_root = InternalView(pool.bytes(frame)).leftmost_child();
        pool.unpin(frame)?;
        pool.free_page(files, table_id, page_num)?;
        set_parent(pool, files, table_id, new_root, NONE_PAGE)?;
        write_root(pool, files, table_id, new_root)
    }
}

/// Merge `frame` with its neighbor; whichever page is positionally to the
/// left survives and absorbs the right page's entries, and the right page
/// is freed (spec 4.3.3's coalescence branch).
fn coalesce_nodes(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    frame: FrameId,
    neighbor_frame: FrameId,
    parent_frame: FrameId,
    neighbor_index: i64,
    k_prime: i64,
    is_leaf: bool,
) -> Result<()> {
    let (left_frame, right_frame) = if neighbor_index == -1 {
        (frame, neighbor_frame)
    } else {
        (neighbor_frame, frame)
    };
    let left_page_num = pool.page_id(left_frame).page_num;
    let right_page_num = pool.page_id(right_frame).page_num;

    if is_leaf {
        let (right_sibling, entries) = {
            let v = LeafView(pool.bytes(right_frame));
            let entries: Vec<(i64, Vec<u8>)> = (0..v.num_slots()).map(|i| (v.slot_key(i), v.record(i).to_vec())).collect();
            (v.right_sibling(), entries)
        };
        let mut v = LeafViewMut(pool.bytes_mut(left_frame));
        for (k, val) in &entries {
            v.insert_record(*k, val);
        }
        v.set_right_sibling(right_sibling);
    } else {
        let (right_leftmost, right_pairs) = {
            let v = InternalView(pool.bytes(right_frame));
            let pairs: Vec<(i64, u64)> = (0..v.num_keys()).map(|i| (v.key(i), v.child(i))).collect();
            (v.leftmost_child(), pairs)
        };
        {
            let mut v = InternalViewMut(pool.bytes_mut(left_frame));
            let idx = v.num_keys();
            v.insert_pair(idx, k_prime, right_leftmost);
            for (k, c) in &right_pairs {
                let idx = v.num_keys();
                v.insert_pair(idx, *k, *c);
            }
        }
        set_parent(pool, files, table_id, right_leftmost, left_page_num)?;
        for (_, c) in &right_pairs {
            set_parent(pool, files, table_id, *c, left_page_num)?;
        }
    }

    pool.mark_dirty(left_frame);
    pool.unpin(left_frame)?;
    pool.unpin(right_frame)?;
    pool.free_page(files, table_id, right_page_num)?;

    delete_entry(pool, files, table_id, parent_frame, k_prime)
}

/// Move entries between `frame` and its neighbor so both stay at or above
/// minimum occupancy, instead of merging (spec 4.3.3's redistribution
/// branch). For leaves this moves records one at a time until `frame`'s
/// free space drops back below `THRESHOLD` (spec 4.3.4 step 8), since a
/// single record isn't guaranteed to clear an under-occupied leaf;
/// internal nodes always move exactly one key-pointer pair.
fn redistribute_nodes(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    frame: FrameId,
    neighbor_frame: FrameId,
    parent_frame: FrameId,
    neighbor_index: i64,
    k_prime_index: usize,
    k_prime: i64,
    is_leaf: bool,
) -> Result<()> {
    let node_page_num = pool.page_id(frame).page_num;

    if neighbor_index != -1 {
        // Neighbor is the left sibling: pull its last entry onto our front.
        if is_leaf {
            loop {
                let n = LeafView(pool.bytes(neighbor_frame)).num_slots();
                let (moved_key, moved_val) = {
                    let v = LeafView(pool.bytes(neighbor_frame));
                    (v.slot_key(n - 1), v.record(n - 1).to_vec())
                };
                LeafViewMut(pool.bytes_mut(neighbor_frame)).remove_record(moved_key);
                LeafViewMut(pool.bytes_mut(frame)).insert_record(moved_key, &moved_val);
                if LeafView(pool.bytes(frame)).free_space() < THRESHOLD {
                    break;
                }
            }
            let new_min = LeafView(pool.bytes(frame)).slot_key(0);
            InternalViewMut(pool.bytes_mut(parent_frame)).set_key(k_prime_index, new_min);
        } else {
            let n = InternalView(pool.bytes(neighbor_frame)).num_keys();
            let (last_key, last_child) = {
                let v = InternalView(pool.bytes(neighbor_frame));
                (v.key(n - 1), v.child(n - 1))
            };
            InternalViewMut(pool.bytes_mut(neighbor_frame)).remove_pair(n - 1);
            let old_leftmost = InternalView(pool.bytes(frame)).leftmost_child();
            {
                let mut v = InternalViewMut(pool.bytes_mut(frame));
                v.insert_pair(0, k_prime, old_leftmost);
                v.set_leftmost_child(last_child);
            }
            set_parent(pool, files, table_id, last_child, node_page_num)?;
            InternalViewMut(pool.bytes_mut(parent_frame)).set_key(k_prime_index, last_key);
        }
    } else {
        // Neighbor is the right sibling: pull its first entry onto our end.
        if is_leaf {
            loop {
                let (moved_key, moved_val) = {
                    let v = LeafView(pool.bytes(neighbor_frame));
                    (v.slot_key(0), v.record(0).to_vec())
                };
                LeafViewMut(pool.bytes_mut(neighbor_frame)).remove_record(moved_key);
                LeafViewMut(pool.bytes_mut(frame)).insert_record(moved_key, &moved_val);
                if LeafView(pool.bytes(frame)).free_space() < THRESHOLD {
                    break;
                }
            }
            let new_min = LeafView(pool.bytes(neighbor_frame)).slot_key(0);
            InternalViewMut(pool.bytes_mut(parent_frame)).set_key(k_prime_index, new_min);
        } else {
            let (first_key, old_neighbor_leftmost, new_neighbor_leftmost) = {
                let v = InternalView(pool.bytes(neighbor_frame));
                (v.key(0), v.leftmost_child(), v.child(0))
            };
            {
                let mut v = InternalViewMut(pool.bytes_mut(frame));
                let idx = v.num_keys();
                v.insert_pair(idx, k_prime, old_neighbor_leftmost);
            }
            set_parent(pool, files, table_id, old_neighbor_leftmost, node_page_num)?;
            {
                let mut v = InternalViewMut(pool.bytes_mut(neighbor_frame));
                v.remove_pair(0);
                v.set_leftmost_child(new_neighbor_leftmost);
            }
            InternalViewMut(pool.bytes_mut(parent_frame)).set_key(k_prime_index, first_key);
        }
    }

    pool.mark_dirty(frame);
    pool.mark_dirty(neighbor_frame);
    pool.mark_dirty(parent_frame);
    pool.unpin(frame)?;
    pool.unpin(neighbor_frame)?;
    pool.unpin(parent_frame)?;
    Ok(())
}
