//! The file layer: a small table registry mapping open tables to file
//! handles, plus raw whole-page I/O. The B+ tree never calls into this
//! module directly -- it goes through the buffer pool, which uses
//! `read_page`/`write_page` on cache misses and on eviction.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, info};

use crate::consts::{HEADER_PAGE_NUM, INITIAL_PAGE_COUNT, MAGIC, MAX_TABLES, NONE_PAGE, PAGE_SIZE};
use crate::error::{Error, Result};
use crate::page::raw::{empty_page, PageBytes};
use crate::page::{FreeViewMut, HeaderView, HeaderViewMut};
use crate::page_id::TableId;

struct TableEntry {
    path: String,
    table_id: TableId,
    file: File,
}

/// Process-wide registry of open table files, bounded at `MAX_TABLES`
/// entries. Table ids are assigned monotonically starting at `MAGIC`
/// (2024), matching the reference implementation's choice to reuse the
/// magic number as the first id.
pub struct TableRegistry {
    next_id: TableId,
    entries: Vec<TableEntry>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self {
            next_id: MAGIC as TableId,
            entries: Vec::new(),
        }
    }

    fn find(&self, path: &str) -> Option<TableId> {
        self.entries.iter().find(|e| e.path == path).map(|e| e.table_id)
    }

    fn entry(&self, table_id: TableId) -> Result<&TableEntry> {
        self.entries
            .iter()
            .find(|e| e.table_id == table_id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown table id {}", table_id)))
    }

    fn entry_mut(&mut self, table_id: TableId) -> Result<&mut TableEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.table_id == table_id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown table id {}", table_id)))
    }

    /// Open an existing table file or create one, returning its table id.
    /// Returns a matching already-open id if `path` is already registered.
    pub fn open_table_file<P: AsRef<Path>>(&mut self, path: P) -> Result<TableId> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        if let Some(id) = self.find(&path_str) {
            return Ok(id);
        }

        if self.entries.len() >= MAX_TABLES {
            return Err(Error::CapacityExhausted(format!(
                "table registry full ({} entries)",
                MAX_TABLES
            )));
        }

        let is_new = !path.as_ref().exists() || std::fs::metadata(&path)?.len() == 0;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        if is_new {
            info!("creating new table file at {}", path_str);
            init_fresh_file(&mut file)?;
        } else {
            let magic = read_magic(&mut file)?;
            if magic != MAGIC {
                return Err(Error::FormatMismatch {
                    path: path_str,
                    magic,
                });
            }
            info!("reopened existing table file at {}", path_str);
        }

        let table_id = self.next_id;
        self.next_id += 1;
        self.entries.push(TableEntry {
            path: path_str,
            table_id,
            file,
        });
        Ok(table_id)
    }

    /// Positional read of exactly `PAGE_SIZE` bytes at `page_num *
    /// PAGE_SIZE`.
    pub fn read_page(&mut self, table_id: TableId, page_num: u64, dest: &mut PageBytes) -> Result<()> {
        let entry = self.entry_mut(table_id)?;
        entry
            .file
            .seek(SeekFrom::Start(page_num * PAGE_SIZE as u64))?;
        entry.file.read_exact(dest)?;
        Ok(())
    }

    /// Positional write of exactly `PAGE_SIZE` bytes at `page_num *
    /// PAGE_SIZE`. Durable (fsync'd) before returning.
    pub fn write_page(&mut self, table_id: TableId, page_num: u64, src: &PageBytes) -> Result<()> {
        let entry = self.entry_mut(table_id)?;
        entry
            .file
            .seek(SeekFrom::Start(page_num * PAGE_SIZE as u64))?;
        entry.file.write_all(src)?;
        entry.file.sync_data()?;
        Ok(())
    }

    /// File-level page allocation, redundant with the buffer pool's
    /// `get_buffer_of_new_page` (spec 4.1): kept for tests that exercise the
    /// file layer in isolation, implementing the identical free-list pop
    /// and file-doubling logic without going through any buffer frames.
    pub fn file_alloc_page(&mut self, table_id: TableId) -> Result<u64> {
        let mut header = empty_page();
        self.read_page(table_id, HEADER_PAGE_NUM, &mut header)?;
        let mut free_head = HeaderView(&header).free_head();

        if free_head == NONE_PAGE {
            let old_count = HeaderView(&header).page_count();
            let new_count = old_count * 2;
            debug!(
                "file_alloc_page: doubling table {} from {} to {} pages",
                table_id, old_count, new_count
            );
            for p in old_count..new_count {
                let next = if p == new_count - 1 { NONE_PAGE } else { p + 1 };
                let mut free_bytes = empty_page();
                FreeViewMut(&mut free_bytes).set_next_free(next);
                self.write_page(table_id, p, &free_bytes)?;
            }
            HeaderViewMut(&mut header).set_page_count(new_count);
            HeaderViewMut(&mut header).set_free_head(old_count);
            free_head = old_count;
        }

        let mut popped = empty_page();
        self.read_page(table_id, free_head, &mut popped)?;
        let next_free = crate::page::FreeView(&popped).next_free();
        HeaderViewMut(&mut header).set_free_head(next_free);
        self.write_page(table_id, HEADER_PAGE_NUM, &header)?;
        Ok(free_head)
    }

    /// File-level counterpart to `file_alloc_page`: prepend `page_num` onto
    /// the free list. Redundant with the buffer pool's `free_page`.
    pub fn file_free_page(&mut self, table_id: TableId, page_num: u64) -> Result<()> {
        let mut header = empty_page();
        self.read_page(table_id, HEADER_PAGE_NUM, &mut header)?;
        let old_head = HeaderView(&header).free_head();

        let mut freed = empty_page();
        FreeViewMut(&mut freed).set_next_free(old_head);
        self.write_page(table_id, page_num, &freed)?;

        HeaderViewMut(&mut header).set_free_head(page_num);
        self.write_page(table_id, HEADER_PAGE_NUM, &header)?;
        Ok(())
    }

    /// Number of pages in the table's file, header included.
    pub fn page_count(&mut self, table_id: TableId) -> Result<u64> {
        let mut header = empty_page();
        self.read_page(table_id, HEADER_PAGE_NUM, &mut header)?;
        Ok(HeaderView(&header).page_count())
    }

    /// Flush and close every open table file.
    pub fn close_all(&mut self) -> Result<()> {
        for entry in &mut self.entries {
            entry.file.sync_all()?;
        }
        self.entries.clear();
        Ok(())
    }
}

fn read_magic(file: &mut File) -> Result<u64> {
    file.seek(SeekFrom::Start(0))?;
    let mut header = empty_page();
    file.read_exact(&mut header)?;
    Ok(HeaderView(&header).magic())
}

/// Initialize a brand new file to `INITIAL_PAGE_COUNT` (2560) pages: a
/// header page plus a free list threading every other page, per spec 4.1.
fn init_fresh_file(file: &mut File) -> Result<()> {
    file.set_len(INITIAL_PAGE_COUNT * PAGE_SIZE as u64)?;

    let mut header = empty_page();
    HeaderViewMut(&mut header).init_fresh(INITIAL_PAGE_COUNT);
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&header)?;

    for p in 1..INITIAL_PAGE_COUNT {
        let next = if p == INITIAL_PAGE_COUNT - 1 { NONE_PAGE } else { p + 1 };
        let mut free_bytes = empty_page();
        FreeViewMut(&mut free_bytes).set_next_free(next);
        file.seek(SeekFrom::Start(p * PAGE_SIZE as u64))?;
        file.write_all(&free_bytes)?;
    }

    file.sync_all()?;
    Ok(())
}
