use super::raw::{read_u64, write_u64, PageBytes};
use crate::consts::NONE_PAGE;

const MAGIC_OFF: usize = 0;
const FREE_HEAD_OFF: usize = 8;
const PAGE_COUNT_OFF: usize = 16;
const ROOT_OFF: usize = 24;

/// A read-only view of the header page (always page 0 of a table): magic
/// number, free-list head, total page count, and current root page number.
pub struct HeaderView<'a>(pub &'a PageBytes);

/// A mutable view of the header page.
pub struct HeaderViewMut<'a>(pub &'a mut PageBytes);

impl<'a> HeaderView<'a> {
    pub fn magic(&self) -> u64 {
        read_u64(self.0, MAGIC_OFF)
    }

    pub fn free_head(&self) -> u64 {
        read_u64(self.0, FREE_HEAD_OFF)
    }

    pub fn page_count(&self) -> u64 {
        read_u64(self.0, PAGE_COUNT_OFF)
    }

    pub fn root(&self) -> u64 {
        read_u64(self.0, ROOT_OFF)
    }

    pub fn has_root(&self) -> bool {
        self.root() != NONE_PAGE
    }
}

impl<'a> HeaderViewMut<'a> {
    pub fn as_view(&self) -> HeaderView {
        HeaderView(self.0)
    }

    pub fn magic(&self) -> u64 {
        read_u64(self.0, MAGIC_OFF)
    }

    pub fn free_head(&self) -> u64 {
        read_u64(self.0, FREE_HEAD_OFF)
    }

    pub fn page_count(&self) -> u64 {
        read_u64(self.0, PAGE_COUNT_OFF)
    }

    pub fn root(&self) -> u64 {
        read_u64(self.0, ROOT_OFF)
    }

    pub fn set_magic(&mut self, v: u64) {
        write_u64(self.0, MAGIC_OFF, v)
    }

    pub fn set_free_head(&mut self, v: u64) {
        write_u64(self.0, FREE_HEAD_OFF, v)
    }

    pub fn set_page_count(&mut self, v: u64) {
        write_u64(self.0, PAGE_COUNT_OFF, v)
    }

    pub fn set_root(&mut self, v: u64) {
        write_u64(self.0, ROOT_OFF, v)
    }

    /// Initialize a freshly allocated file's header: the recognition magic
    /// number, an empty root, and a free list threading every non-header
    /// page (1 through `page_count - 1`) in ascending order, terminated by
    /// `NONE_PAGE` at the tail. The caller is responsible for actually
    /// writing those free pages to disk; this only sets the header fields.
    pub fn init_fresh(&mut self, page_count: u64) {
        self.set_magic(crate::consts::MAGIC);
        self.set_page_count(page_count);
        self.set_root(NONE_PAGE);
        self.set_free_head(if page_count > 1 { 1 } else { NONE_PAGE });
    }
}

/// A view of a free page: just the next-free pointer in its first field.
pub struct FreeView<'a>(pub &'a PageBytes);
pub struct FreeViewMut<'a>(pub &'a mut PageBytes);

impl<'a> FreeView<'a> {
    pub fn next_free(&self) -> u64 {
        read_u64(self.0, 0)
    }
}

impl<'a> FreeViewMut<'a> {
    pub fn next_free(&self) -> u64 {
        read_u64(self.0, 0)
    }

    pub fn set_next_free(&mut self, v: u64) {
        write_u64(self.0, 0, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::raw::empty_page;

    #[test]
    fn init_fresh_threads_free_list() {
        let mut bytes = empty_page();
        HeaderViewMut(&mut bytes).init_fresh(2560);
        let h = HeaderView(&bytes);
        assert_eq!(h.magic(), crate::consts::MAGIC);
        assert_eq!(h.page_count(), 2560);
        assert_eq!(h.root(), NONE_PAGE);
        assert_eq!(h.free_head(), 1);
    }
}
