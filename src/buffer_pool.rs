//! The buffer pool: a fixed number of in-memory frames caching table pages,
//! indexed by a small hashtable over `(table_id, page_num)` and evicted with
//! a clock-sweep policy (spec 4.2). The B+ tree only ever touches pages
//! through a `FrameId` handle returned by `pin`/`get_buffer_of_new_page` --
//! it never holds a page number across a call that might trigger eviction.

use log::debug;

use crate::consts::MAX_USAGE_COUNT;
use crate::error::{Error, Result};
use crate::file::TableRegistry;
use crate::page::raw::{empty_page, PageBytes};
use crate::page::{FreeView, FreeViewMut, HeaderView, HeaderViewMut};
use crate::page_id::{PageId, TableId};

/// An opaque handle to a pinned frame. Never persisted or compared across
/// pool instances; valid only until the matching `unpin`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct FrameId(usize);

struct Frame {
    owner: Option<PageId>,
    bytes: Box<PageBytes>,
    dirty: bool,
    pin_count: u32,
    usage: u8,
}

impl Frame {
    fn empty() -> Self {
        Frame {
            owner: None,
            bytes: Box::new(empty_page()),
            dirty: false,
            pin_count: 0,
            usage: 0,
        }
    }
}

#[derive(Default)]
struct Stats {
    hits: u64,
    misses: u64,
}

/// A fixed-size cache of `num_buf` page frames over one or more open
/// tables. Frames are located by a chained hashtable keyed on
/// `PageId::bucket`, and reclaimed with a clock sweep over usage counters
/// that saturate at `MAX_USAGE_COUNT` (spec 4.2).
pub struct BufferPool {
    frames: Vec<Frame>,
    buckets: Vec<Vec<usize>>,
    clock_hand: usize,
    stats: Stats,
}

impl BufferPool {
    pub fn new(num_buf: usize, num_ht_entries: usize) -> Self {
        let mut frames = Vec::with_capacity(num_buf);
        for _ in 0..num_buf {
            frames.push(Frame::empty());
        }
        BufferPool {
            frames,
            buckets: vec![Vec::new(); num_ht_entries.max(1)],
            clock_hand: 0,
            stats: Stats::default(),
        }
    }

    fn bucket_index(&self, id: PageId) -> usize {
        id.bucket(self.buckets.len())
    }

    fn lookup(&self, id: PageId) -> Option<usize> {
        let b = self.bucket_index(id);
        self.buckets[b]
            .iter()
            .copied()
            .find(|&frame_idx| self.frames[frame_idx].owner == Some(id))
    }

    fn insert_index(&mut self, id: PageId, frame_idx: usize) {
        let b = self.bucket_index(id);
        self.buckets[b].push(frame_idx);
    }

    fn remove_index(&mut self, id: PageId, frame_idx: usize) {
        let b = self.bucket_index(id);
        self.buckets[b].retain(|&f| f != frame_idx);
        let _ = frame_idx;
    }

    /// Fetch the page `id`, loading it from `files` on a miss. Returns a
    /// pinned frame; the caller must `unpin` it exactly once.
    pub fn get_buffer(&mut self, files: &mut TableRegistry, id: PageId) -> Result<FrameId> {
        if let Some(idx) = self.lookup(id) {
            self.stats.hits += 1;
            let frame = &mut self.frames[idx];
            frame.pin_count += 1;
            frame.usage = (frame.usage + 1).min(MAX_USAGE_COUNT);
            return Ok(FrameId(idx));
        }

        self.stats.misses += 1;
        let idx = self.evict_or_allocate(files)?;
        files.read_page(id.table_id, id.page_num, &mut self.frames[idx].bytes)?;
        self.frames[idx].owner = Some(id);
        self.frames[idx].dirty = false;
        self.frames[idx].pin_count = 1;
        self.frames[idx].usage = 1;
        self.insert_index(id, idx);
        Ok(FrameId(idx))
    }

    /// Allocate a brand new page for `table_id` (popping the file's free
    /// list, doubling the file if exhausted) and return it pinned and
    /// zeroed, ready for the caller to initialize as a leaf or internal
    /// node.
    pub fn get_buffer_of_new_page(
        &mut self,
        files: &mut TableRegistry,
        table_id: TableId,
    ) -> Result<(FrameId, u64)> {
        let header_frame = self.get_buffer(files, PageId::header(table_id))?;
        let mut header_bytes = *self.frame(header_frame).bytes.clone();
        let mut free_head = HeaderView(&header_bytes).free_head();

        if free_head == crate::consts::NONE_PAGE {
            self.grow_table(files, table_id, &mut header_bytes)?;
            free_head = HeaderView(&header_bytes).free_head();
        }

        let mut popped = empty_page();
        files.read_page(table_id, free_head, &mut popped)?;
        let next_free = FreeView(&popped).next_free();
        HeaderViewMut(&mut header_bytes).set_free_head(next_free);
        self.frame_mut(header_frame).bytes = Box::new(header_bytes);
        self.frame_mut(header_frame).dirty = true;
        self.unpin(header_frame)?;

        let frame_idx = self.evict_or_allocate(files)?;
        self.frames[frame_idx].bytes = Box::new(empty_page());
        self.frames[frame_idx].owner = Some(PageId::new(table_id, free_head));
        self.frames[frame_idx].dirty = true;
        self.frames[frame_idx].pin_count = 1;
        self.frames[frame_idx].usage = 1;
        self.insert_index(PageId::new(table_id, free_head), frame_idx);
        Ok((FrameId(frame_idx), free_head))
    }

    fn grow_table(
        &mut self,
        files: &mut TableRegistry,
        table_id: TableId,
        header_bytes: &mut PageBytes,
    ) -> Result<()> {
        let old_count = HeaderView(header_bytes).page_count();
        let new_count = old_count * 2;
        debug!(
            "buffer pool growing table {} from {} to {} pages",
            table_id, old_count, new_count
        );
        for p in old_count..new_count {
            let next = if p == new_count - 1 {
                crate::consts::NONE_PAGE
            } else {
                p + 1
            };
            let mut free_bytes = empty_page();
            FreeViewMut(&mut free_bytes).set_next_free(next);
            files.write_page(table_id, p, &free_bytes)?;
        }
        HeaderViewMut(header_bytes).set_page_count(new_count);
        HeaderViewMut(header_bytes).set_free_head(old_count);
        Ok(())
    }

    /// Return `page_num` to the free list and drop it from the pool if
    /// present, without writing it back (its contents no longer matter).
    pub fn free_page(&mut self, files: &mut TableRegistry, table_id: TableId, page_num: u64) -> Result<()> {
        let id = PageId::new(table_id, page_num);
        if let Some(idx) = self.lookup(id) {
            if self.frames[idx].pin_count > 0 {
                return Err(Error::InvalidArgument(format!(
                    "cannot free pinned page {}",
                    id
                )));
            }
            self.remove_index(id, idx);
            self.frames[idx].owner = None;
            self.frames[idx].dirty = false;
        }

        let header_frame = self.get_buffer(files, PageId::header(table_id))?;
        let mut header_bytes = *self.frame(header_frame).bytes.clone();
        let old_head = HeaderView(&header_bytes).free_head();
        HeaderViewMut(&mut header_bytes).set_free_head(page_num);
        self.frame_mut(header_frame).bytes = Box::new(header_bytes);
        self.frame_mut(header_frame).dirty = true;
        self.unpin(header_frame)?;

        let mut freed = empty_page();
        FreeViewMut(&mut freed).set_next_free(old_head);
        files.write_page(table_id, page_num, &freed)?;
        Ok(())
    }

    fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.0]
    }

    fn frame_mut(&mut self, id: FrameId) -> &mut Frame {
        &mut self.frames[id.0]
    }

    /// The page identity backing a pinned frame.
    pub fn page_id(&self, id: FrameId) -> PageId {
        self.frames[id.0].owner.expect("frame has no owner")
    }

    pub fn bytes(&self, id: FrameId) -> &PageBytes {
        &self.frames[id.0].bytes
    }

    pub fn bytes_mut(&mut self, id: FrameId) -> &mut PageBytes {
        self.frames[id.0].dirty = true;
        &mut self.frames[id.0].bytes
    }

    pub fn mark_dirty(&mut self, id: FrameId) {
        self.frames[id.0].dirty = true;
    }

    /// Decrement the pin count on a frame. The frame remains cached (and a
    /// candidate for eviction once unpinned) until its page is requested
    /// again or it is swept out.
    pub fn unpin(&mut self, id: FrameId) -> Result<()> {
        let frame = &mut self.frames[id.0];
        if frame.pin_count == 0 {
            return Err(Error::InvalidArgument("unpin of an already-unpinned frame".into()));
        }
        frame.pin_count -= 1;
        Ok(())
    }

    /// Flush every dirty frame and clear the pool, forgetting all cached
    /// pages. Used on shutdown.
    pub fn flush_all(&mut self, files: &mut TableRegistry) -> Result<()> {
        for idx in 0..self.frames.len() {
            self.flush_frame(files, idx)?;
        }
        for b in &mut self.buckets {
            b.clear();
        }
        for frame in &mut self.frames {
            frame.owner = None;
            frame.pin_count = 0;
            frame.usage = 0;
        }
        Ok(())
    }

    fn flush_frame(&mut self, files: &mut TableRegistry, idx: usize) -> Result<()> {
        let frame = &self.frames[idx];
        if let Some(owner) = frame.owner {
            if frame.dirty {
                files.write_page(owner.table_id, owner.page_num, &frame.bytes)?;
            }
        }
        Ok(())
    }

    /// Fraction of `get_buffer` calls satisfied without a disk read, for the
    /// testable hit-ratio properties (spec 8).
    pub fn hit_ratio(&self) -> f64 {
        let total = self.stats.hits + self.stats.misses;
        if total == 0 {
            1.0
        } else {
            self.stats.hits as f64 / total as f64
        }
    }

    pub fn reset_stats(&mut self) {
        self.stats = Stats::default();
    }

    pub fn hits(&self) -> u64 {
        self.stats.hits
    }

    pub fn misses(&self) -> u64 {
        self.stats.misses
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Find a free frame, or sweep the clock hand over pinned/usage
    /// counters to find a victim, flushing it first if dirty. Errors if
    /// every frame is pinned (spec 4.2's capacity-exhausted condition).
    fn evict_or_allocate(&mut self, files: &mut TableRegistry) -> Result<usize> {
        if let Some(idx) = self.frames.iter().position(|f| f.owner.is_none()) {
            return Ok(idx);
        }

        let num_buf = self.frames.len();
        let mut swept = 0;
        loop {
            if swept > 2 * num_buf {
                return Err(Error::CapacityExhausted(
                    "buffer pool: every frame is pinned".into(),
                ));
            }
            let idx = self.clock_hand;
            self.clock_hand = (self.clock_hand + 1) % num_buf;
            swept += 1;

            let frame = &mut self.frames[idx];
            if frame.pin_count > 0 {
                continue;
            }
            if frame.usage > 0 {
                frame.usage -= 1;
                continue;
            }

            let owner = frame.owner.take().unwrap();
            let dirty = frame.dirty;
            frame.dirty = false;
            if dirty {
                files.write_page(owner.table_id, owner.page_num, &frame.bytes)?;
            }
            self.remove_index(owner, idx);
            debug!("evicted page {} from frame {}", owner, idx);
            return Ok(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::INITIAL_PAGE_COUNT;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("pagestore_bp_test_{}_{}.db", tag, n))
    }

    #[test]
    fn repeated_reads_of_same_page_are_cache_hits() {
        let path = temp_path("hits");
        let mut files = TableRegistry::new();
        let table_id = files.open_table_file(&path).unwrap();
        let page_num = files.file_alloc_page(table_id).unwrap();

        let mut pool = BufferPool::new(8, 32);
        for _ in 0..10 {
            let f = pool.get_buffer(&mut files, PageId::new(table_id, page_num)).unwrap();
            pool.unpin(f).unwrap();
        }
        assert!(pool.hit_ratio() >= 0.9);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn eviction_writes_back_dirty_frames() {
        let path = temp_path("evict");
        let mut files = TableRegistry::new();
        let table_id = files.open_table_file(&path).unwrap();

        let mut pool = BufferPool::new(2, 8);
        let (f0, p0) = pool.get_buffer_of_new_page(&mut files, table_id).unwrap();
        pool.bytes_mut(f0)[200] = 0xAB;
        pool.unpin(f0).unwrap();

        // Pull in enough distinct pages to force p0 out of the 2-frame pool.
        for _ in 0..5 {
            let (f, _) = pool.get_buffer_of_new_page(&mut files, table_id).unwrap();
            pool.unpin(f).unwrap();
        }

        let mut raw = crate::page::raw::empty_page();
        files.read_page(table_id, p0, &mut raw).unwrap();
        assert_eq!(raw[200], 0xAB);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn get_buffer_of_new_page_grows_file_when_exhausted() {
        let path = temp_path("grow");
        let mut files = TableRegistry::new();
        let table_id = files.open_table_file(&path).unwrap();
        let mut pool = BufferPool::new(4, 16);

        for _ in 0..(INITIAL_PAGE_COUNT) {
            let (f, _) = pool.get_buffer_of_new_page(&mut files, table_id).unwrap();
            pool.unpin(f).unwrap();
        }
        assert!(files.page_count(table_id).unwrap() > INITIAL_PAGE_COUNT);
        let _ = std::fs::remove_file(&path);
    }
}
