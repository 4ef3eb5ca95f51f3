use super::raw::{read_i32, read_i64, read_u16, read_u64, write_i32, write_i64, write_u16, write_u64, PageBytes};
use crate::consts::{DATA_SIZE, NONE_PAGE, PAGE_SIZE, SLOT_SIZE};

const PARENT_OFF: usize = 0;
const IS_LEAF_OFF: usize = 8;
const NUM_SLOTS_OFF: usize = 12;
const FREE_SPACE_OFF: usize = 112;
const RIGHT_SIBLING_OFF: usize = 120;
const DATA_OFF: usize = 128;

fn slot_off(i: usize) -> usize {
    DATA_OFF + i * SLOT_SIZE
}

/// A view of a slotted leaf page. Slots grow from the low end of the data
/// region (`DATA_OFF` upward) and stay sorted by key; records grow from the
/// high end of the page (`PAGE_SIZE` downward) and are kept gap-free -- the
/// occupied record bytes always form the single contiguous range
/// `[PAGE_SIZE - used_record_bytes, PAGE_SIZE)`, regardless of the order
/// slots were inserted in (spec: "records... may be physically
/// interleaved"). A slot's `offset` is page-relative and absolute, matching
/// the convention used by non-split code paths (spec design notes, 9).
pub struct LeafView<'a>(pub &'a PageBytes);
pub struct LeafViewMut<'a>(pub &'a mut PageBytes);

impl<'a> LeafView<'a> {
    pub fn parent(&self) -> u64 {
        read_u64(self.0, PARENT_OFF)
    }

    pub fn num_slots(&self) -> usize {
        read_i32(self.0, NUM_SLOTS_OFF) as usize
    }

    pub fn free_space(&self) -> usize {
        read_u64(self.0, FREE_SPACE_OFF) as usize
    }

    pub fn right_sibling(&self) -> u64 {
        read_u64(self.0, RIGHT_SIBLING_OFF)
    }

    pub fn slot_key(&self, i: usize) -> i64 {
        read_i64(self.0, slot_off(i))
    }

    pub fn slot_size(&self, i: usize) -> usize {
        read_u16(self.0, slot_off(i) + 8) as usize
    }

    pub fn slot_offset(&self, i: usize) -> usize {
        read_u16(self.0, slot_off(i) + 10) as usize
    }

    pub fn record(&self, i: usize) -> &[u8] {
        let off = self.slot_offset(i);
        let size = self.slot_size(i);
        &self.0[off..off + size]
    }

    /// The smallest index whose key is `>= key`, i.e. where `key` would be
    /// inserted to keep slots ascending. Equals `num_slots()` if every slot
    /// key is smaller.
    pub fn find_index(&self, key: i64) -> usize {
        let n = self.num_slots();
        for i in 0..n {
            if self.slot_key(i) >= key {
                return i;
            }
        }
        n
    }

    /// Binary-search style exact lookup; `None` if `key` is absent.
    pub fn find_slot(&self, key: i64) -> Option<usize> {
        let n = self.num_slots();
        let idx = self.find_index(key);
        if idx < n && self.slot_key(idx) == key {
            Some(idx)
        } else {
            None
        }
    }

    pub fn min_key(&self) -> Option<i64> {
        if self.num_slots() == 0 {
            None
        } else {
            Some(self.slot_key(0))
        }
    }

}

impl<'a> LeafViewMut<'a> {
    pub fn as_view(&self) -> LeafView {
        LeafView(self.0)
    }

    pub fn parent(&self) -> u64 {
        read_u64(self.0, PARENT_OFF)
    }
    pub fn num_slots(&self) -> usize {
        read_i32(self.0, NUM_SLOTS_OFF) as usize
    }
    pub fn free_space(&self) -> usize {
        read_u64(self.0, FREE_SPACE_OFF) as usize
    }
    pub fn right_sibling(&self) -> u64 {
        read_u64(self.0, RIGHT_SIBLING_OFF)
    }
    pub fn slot_key(&self, i: usize) -> i64 {
        read_i64(self.0, slot_off(i))
    }
    pub fn slot_size(&self, i: usize) -> usize {
        read_u16(self.0, slot_off(i) + 8) as usize
    }
    pub fn slot_offset(&self, i: usize) -> usize {
        read_u16(self.0, slot_off(i) + 10) as usize
    }
    pub fn record(&self, i: usize) -> &[u8] {
        let off = self.slot_offset(i);
        let size = self.slot_size(i);
        &self.0[off..off + size]
    }
    pub fn find_index(&self, key: i64) -> usize {
        self.as_view().find_index(key)
    }
    pub fn find_slot(&self, key: i64) -> Option<usize> {
        self.as_view().find_slot(key)
    }
    pub fn min_key(&self) -> Option<i64> {
        self.as_view().min_key()
    }

    pub fn set_parent(&mut self, v: u64) {
        write_u64(self.0, PARENT_OFF, v)
    }

    pub fn set_right_sibling(&mut self, v: u64) {
        write_u64(self.0, RIGHT_SIBLING_OFF, v)
    }

    fn set_num_slots(&mut self, n: usize) {
        write_i32(self.0, NUM_SLOTS_OFF, n as i32)
    }

    fn set_free_space(&mut self, v: usize) {
        write_u64(self.0, FREE_SPACE_OFF, v as u64)
    }

    fn set_slot(&mut self, i: usize, key: i64, size: u16, offset: u16) {
        write_i64(self.0, slot_off(i), key);
        write_u16(self.0, slot_off(i) + 8, size);
        write_u16(self.0, slot_off(i) + 10, offset);
    }

    fn set_slot_offset(&mut self, i: usize, offset: u16) {
        write_u16(self.0, slot_off(i) + 10, offset);
    }

    /// Initialize a brand new, empty leaf page.
    pub fn init(&mut self, parent: u64) {
        write_i32(self.0, IS_LEAF_OFF, 1);
        self.set_parent(parent);
        self.set_num_slots(0);
        self.set_free_space(DATA_SIZE);
        self.set_right_sibling(NONE_PAGE);
    }

    fn used_record_bytes(&self) -> usize {
        let mut used = 0;
        for i in 0..self.num_slots() {
            used += self.slot_size(i);
        }
        used
    }

    fn heap_start(&self) -> usize {
        PAGE_SIZE - self.used_record_bytes()
    }

    /// How many bytes a record of `val_size` would cost, slot included.
    pub fn entry_cost(val_size: usize) -> usize {
        SLOT_SIZE + val_size
    }

    /// True if this leaf has room for a new `val_size`-byte record without
    /// splitting.
    pub fn has_room_for(&self, val_size: usize) -> bool {
        self.free_space() >= Self::entry_cost(val_size)
    }

    /// Insert `(key, value)` keeping slots in ascending key order. Caller
    /// guarantees `has_room_for(value.len())` and that `key` is absent.
    pub fn insert_record(&mut self, key: i64, value: &[u8]) {
        let index = self.find_index(key);
        let n = self.num_slots();
        let new_offset = self.heap_start() - value.len();

        for i in (index..n).rev() {
            let k = self.slot_key(i);
            let s = self.slot_size(i);
            let o = self.slot_offset(i);
            self.set_slot(i + 1, k, s as u16, o as u16);
        }
        self.set_slot(index, key, value.len() as u16, new_offset as u16);
        self.0[new_offset..new_offset + value.len()].copy_from_slice(value);

        self.set_num_slots(n + 1);
        self.set_free_space(self.free_space() - Self::entry_cost(value.len()));
    }

    /// Remove the slot holding `key`. Compacts the record heap so it stays
    /// gap-free. Returns `false` if `key` was absent.
    pub fn remove_record(&mut self, key: i64) -> bool {
        let index = match self.find_slot(key) {
            Some(i) => i,
            None => return false,
        };
        let removed_size = self.slot_size(index);
        let removed_offset = self.slot_offset(index);
        let start = self.heap_start();

        if removed_offset > start {
            // The region below the removed record (appended after it, so
            // physically lower in address space) shifts up to close the
            // gap, keeping the heap contiguous.
            self.0.copy_within(start..removed_offset, start + removed_size);
            let n = self.num_slots();
            for i in 0..n {
                if i == index {
                    continue;
                }
                let o = self.slot_offset(i);
                if o >= start && o < removed_offset {
                    self.set_slot_offset(i, (o + removed_size) as u16);
                }
            }
        }

        let n = self.num_slots();
        for i in index..n - 1 {
            let k = self.slot_key(i + 1);
            let s = self.slot_size(i + 1);
            let o = self.slot_offset(i + 1);
            self.set_slot(i, k, s as u16, o as u16);
        }
        self.set_num_slots(n - 1);
        self.set_free_space(self.free_space() + Self::entry_cost(removed_size));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::raw::empty_page;

    fn val(size: usize, fill: u8) -> Vec<u8> {
        vec![fill; size]
    }

    #[test]
    fn insert_keeps_slots_sorted_and_free_space_accurate() {
        let mut bytes = empty_page();
        let mut v = LeafViewMut(&mut bytes);
        v.init(NONE_PAGE);

        v.insert_record(20, &val(60, 2));
        v.insert_record(10, &val(70, 1));
        v.insert_record(30, &val(80, 3));

        assert_eq!(v.num_slots(), 3);
        assert_eq!((v.slot_key(0), v.slot_key(1), v.slot_key(2)), (10, 20, 30));
        assert_eq!(v.record(0), &val(70, 1)[..]);
        assert_eq!(v.record(1), &val(60, 2)[..]);
        assert_eq!(v.record(2), &val(80, 3)[..]);

        let used: usize = (60 + 70 + 80) + 3 * SLOT_SIZE;
        assert_eq!(v.free_space(), DATA_SIZE - used);
    }

    #[test]
    fn remove_compacts_heap_and_preserves_other_records() {
        let mut bytes = empty_page();
        let mut v = LeafViewMut(&mut bytes);
        v.init(NONE_PAGE);
        v.insert_record(10, &val(60, 1));
        v.insert_record(20, &val(60, 2));
        v.insert_record(30, &val(60, 3));

        assert!(v.remove_record(20));
        assert_eq!(v.num_slots(), 2);
        assert_eq!((v.slot_key(0), v.slot_key(1)), (10, 30));
        assert_eq!(v.record(0), &val(60, 1)[..]);
        assert_eq!(v.record(1), &val(60, 3)[..]);

        let used: usize = (60 + 60) + 2 * SLOT_SIZE;
        assert_eq!(v.free_space(), DATA_SIZE - used);

        assert!(!v.remove_record(999));
    }

    #[test]
    fn find_slot_reports_absence() {
        let mut bytes = empty_page();
        let mut v = LeafViewMut(&mut bytes);
        v.init(NONE_PAGE);
        v.insert_record(5, &val(50, 9));
        assert_eq!(v.find_slot(5), Some(0));
        assert_eq!(v.find_slot(6), None);
    }
}
