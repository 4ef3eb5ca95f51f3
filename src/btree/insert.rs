use crate::buffer_pool::{BufferPool, FrameId};
use crate::consts::{DATA_SIZE, MAX_VALUE_SIZE, MIN_VALUE_SIZE, NONE_PAGE};
use crate::error::{Error, Result};
use crate::file::TableRegistry;
use crate::page::{InternalView, InternalViewMut, LeafView, LeafViewMut, MAX_PAIRS};
use crate::page_id::{PageId, TableId};

use super::{cut, read_root, set_parent, write_root};

/// Insert `(key, value)` into the table's tree, splitting leaves and
/// internal nodes as needed to keep every page within its order (spec
/// 4.3.2, 4.3.3). Fails with `DuplicateKey` if `key` is already present.
pub fn insert(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    key: i64,
    value: &[u8],
) -> Result<()> {
    if value.len() < MIN_VALUE_SIZE || value.len() > MAX_VALUE_SIZE {
        return Err(Error::InvalidArgument(format!(
            "value size {} outside [{}, {}]",
            value.len(),
            MIN_VALUE_SIZE,
            MAX_VALUE_SIZE
        )));
    }

    let root = read_root(pool, files, table_id)?;
    if root == NONE_PAGE {
        return start_new_tree(pool, files, table_id, key, value);
    }

    let leaf_frame = super::find_leaf(pool, files, table_id, key)?;
    if LeafView(pool.bytes(leaf_frame)).find_slot(key).is_some() {
        pool.unpin(leaf_frame)?;
        return Err(Error::DuplicateKey { table_id, key });
    }

    if LeafViewMut(pool.bytes_mut(leaf_frame)).has_room_for(value.len()) {
        LeafViewMut(pool.bytes_mut(leaf_frame)).insert_record(key, value);
        pool.mark_dirty(leaf_frame);
        pool.unpin(leaf_frame)?;
        Ok(())
    } else {
        split_leaf_and_insert(pool, files, table_id, leaf_frame, key, value)
    }
}

fn start_new_tree(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    key: i64,
    value: &[u8],
) -> Result<()> {
    let (frame, page_num) = pool.get_buffer_of_new_page(files, table_id)?;
    {
        let mut v = LeafViewMut(pool.bytes_mut(frame));
        v.init(NONE_PAGE);
        v.insert_record(key, value);
    }
    pool.mark_dirty(frame);
    pool.unpin(frame)?;
    write_root(pool, files, table_id, page_num)
}

fn split_leaf_and_insert(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    leaf_frame: FrameId,
    key: i64,
    value: &[u8],
) -> Result<()> {
    let (old_parent, old_right_sibling, mut entries) = {
        let view = LeafView(pool.bytes(leaf_frame));
        let entries: Vec<(i64, Vec<u8>)> = (0..view.num_slots())
            .map(|i| (view.slot_key(i), view.record(i).to_vec()))
            .collect();
        (view.parent(), view.right_sibling(), entries)
    };
    let insert_pos = entries.iter().position(|(k, _)| *k > key).unwrap_or(entries.len());
    entries.insert(insert_pos, (key, value.to_vec()));

    let mut cum = 0usize;
    let mut split = entries.len() - 1;
    for (i, (_, v)) in entries.iter().enumerate() {
        cum += LeafViewMut::entry_cost(v.len());
        if cum > DATA_SIZE / 2 {
            split = i + 1;
            break;
        }
    }
    let split = split.clamp(1, entries.len() - 1);

    let left_page_num = pool.page_id(leaf_frame).page_num;
    let (new_frame, new_page_num) = pool.get_buffer_of_new_page(files, table_id)?;

    {
        let mut v = LeafViewMut(pool.bytes_mut(new_frame));
        v.init(old_parent);
        for (k, val) in &entries[split..] {
            v.insert_record(*k, val);
        }
        v.set_right_sibling(old_right_sibling);
    }
    {
        let mut v = LeafViewMut(pool.bytes_mut(leaf_frame));
        v.init(old_parent);
        for (k, val) in &entries[..split] {
            v.insert_record(*k, val);
        }
        v.set_right_sibling(new_page_num);
    }

    pool.mark_dirty(leaf_frame);
    pool.mark_dirty(new_frame);

    let new_key = entries[split].0;
    pool.unpin(new_frame)?;
    pool.unpin(leaf_frame)?;

    insert_into_parent(pool, files, table_id, left_page_num, old_parent, new_key, new_page_num)
}

fn insert_into_parent(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    left_page_num: u64,
    left_parent: u64,
    key: i64,
    right_page_num: u64,
) -> Result<()> {
    if left_parent == NONE_PAGE {
        return insert_into_new_root(pool, files, table_id, left_page_num, key, right_page_num);
    }

    let parent_frame = pool.get_buffer(files, PageId::new(table_id, left_parent))?;
    let right_index = InternalView(pool.bytes(parent_frame)).insertion_index(key);
    let num_keys = InternalView(pool.bytes(parent_frame)).num_keys();

    if num_keys < MAX_PAIRS {
        InternalViewMut(pool.bytes_mut(parent_frame)).insert_pair(right_index, key, right_page_num);
        pool.mark_dirty(parent_frame);
        pool.unpin(parent_frame)?;
        Ok(())
    } else {
        split_internal_and_insert(pool, files, table_id, parent_frame, right_index, key, right_page_num)
    }
}

fn insert_into_new_root(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    left_page_num: u64,
    key: i64,
    right_page_num: u64,
) -> Result<()> {
    let (root_frame, root_page_num) = pool.get_buffer_of_new_page(files, table_id)?;
    {
        let mut v = InternalViewMut(pool.bytes_mut(root_frame));
        v.init(NONE_PAGE);
        v.set_leftmost_child(left_page_num);
        v.insert_pair(0, key, right_page_num);
    }
    pool.mark_dirty(root_frame);
    pool.unpin(root_frame)?;

    set_parent(pool, files, table_id, left_page_num, root_page_num)?;
    set_parent(pool, files, table_id, right_page_num, root_page_num)?;
    write_root(pool, files, table_id, root_page_num)
}

fn split_internal_and_insert(
    pool: &mut BufferPool,
    files: &mut TableRegistry,
    table_id: TableId,
    parent_frame: FrameId,
    right_index: usize,
    key: i64,
    right_page_num: u64,
) -> Result<()> {
    let (grandparent, old_leftmost, mut pairs) = {
        let v = InternalView(pool.bytes(parent_frame));
        let pairs: Vec<(i64, u64)> = (0..v.num_keys()).map(|i| (v.key(i), v.child(i))).collect();
        (v.parent(), v.leftmost_child(), pairs)
    };
    pairs.insert(right_index, (key, right_page_num));

    let split = cut(crate::consts::INTERNAL_ORDER) - 1;
    let k_prime = pairs[split].0;
    let new_leftmost = pairs[split].1;
    let left_pairs = pairs[..split].to_vec();
    let right_pairs = pairs[split + 1..].to_vec();

    let left_page_num = pool.page_id(parent_frame).page_num;
    let (new_frame, new_page_num) = pool.get_buffer_of_new_page(files, table_id)?;

    {
        let mut v = InternalViewMut(pool.bytes_mut(new_frame));
        v.init(grandparent);
        v.set_leftmost_child(new_leftmost);
        for (k, c) in &right_pairs {
            let idx = v.num_keys();
            v.insert_pair(idx, *k, *c);
        }
    }
    {
        let mut v = InternalViewMut(pool.bytes_mut(parent_frame));
        v.init(grandparent);
        v.set_leftmost_child(old_leftmost);
        for (k, c) in &left_pairs {
            let idx = v.num_keys();
            v.insert_pair(idx, *k, *c);
        }
    }

    pool.mark_dirty(parent_frame);
    pool.mark_dirty(new_frame);
    pool.unpin(parent_frame)?;
    pool.unpin(new_frame)?;

    set_parent(pool, files, table_id, new_leftmost, new_page_num)?;
    for (_, c) in &right_pairs {
        set_parent(pool, files, table_id, *c, new_page_num)?;
    }

    insert_into_parent(pool, files, table_id, left_page_num, grandparent, k_prime, new_page_num)
}
