//! The on-disk page format: a 4 KiB block interpreted as one of four
//! variants depending on context (page 0 is always the header; every other
//! page is either on the free list or a B+ tree node, and a node page's
//! `is_leaf` field says which kind of node it is).

pub mod header;
pub mod internal;
pub mod leaf;
pub mod raw;

pub use header::{FreeView, FreeViewMut, HeaderView, HeaderViewMut};
pub use internal::{InternalView, InternalViewMut, MAX_PAIRS};
pub use leaf::{LeafView, LeafViewMut};
pub use raw::{empty_page, PageBytes};

use raw::{read_i32, read_u64, write_u64};

const IS_LEAF_OFF: usize = 8;
const PARENT_OFF: usize = 0;

/// Whether a node page (as opposed to the header or a free page) is an
/// internal node or a leaf, read straight from its `is_leaf` field.
pub fn is_leaf(bytes: &PageBytes) -> bool {
    read_i32(bytes, IS_LEAF_OFF) != 0
}

/// The parent page number of a node page. `InternalView` and `LeafView`
/// both place this at offset 0, so it can be read without knowing which
/// kind of node the page holds.
pub fn parent_of(bytes: &PageBytes) -> u64 {
    read_u64(bytes, PARENT_OFF)
}

pub fn set_parent_of(bytes: &mut PageBytes, parent: u64) {
    write_u64(bytes, PARENT_OFF, parent)
}
