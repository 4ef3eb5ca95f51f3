//! The handful of fixed sizes and thresholds that the on-disk layout, the
//! buffer pool, and the B+ tree algorithms all agree on.

/// Size of a disk page and of a buffer-pool frame's backing array.
pub const PAGE_SIZE: usize = 4096;

/// Size of the fixed header shared by every node page (parent pointer,
/// is_leaf/num_keys, and the category-specific reserved region). Node data
/// (internal key/child pairs, or the leaf's slot+record region) occupies the
/// remaining `DATA_SIZE` bytes.
pub const HEADER_SIZE: usize = 128;

/// Bytes available for keys/children (internal) or slots+records (leaf).
pub const DATA_SIZE: usize = PAGE_SIZE - HEADER_SIZE;

/// Bytes occupied by one leaf slot descriptor: 8-byte key, 2-byte record
/// size, 2-byte page-relative offset.
pub const SLOT_SIZE: usize = 12;

/// Maximum number of (key, child) pairs an internal node can hold before it
/// must split. `DATA_SIZE / 16` (each pair is an 8-byte key + 8-byte child).
pub const INTERNAL_ORDER: usize = 249;

/// Minimum key count an internal node (other than the root) must retain
/// after a delete before it is considered under-occupied.
pub const INTERNAL_MIN_KEYS: usize = (INTERNAL_ORDER + 1) / 2 - 1;

/// Minimum free-space byte count a leaf must retain after a delete before it
/// is considered under-occupied and a candidate for coalescence or
/// redistribution.
pub const THRESHOLD: usize = 2500;

pub const MIN_VALUE_SIZE: usize = 50;
pub const MAX_VALUE_SIZE: usize = 112;

/// Saturating cap on a frame's clock-sweep usage counter.
pub const MAX_USAGE_COUNT: u8 = 5;

/// Upper bound on concurrently open tables in the table registry.
pub const MAX_TABLES: usize = 20;

/// Size a freshly created table file is initialized to.
pub const INITIAL_DB_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// `INITIAL_DB_FILE_SIZE / PAGE_SIZE`, i.e. 2560: page 0 is the header, the
/// remaining 2559 pages start out on the free list.
pub const INITIAL_PAGE_COUNT: u64 = INITIAL_DB_FILE_SIZE / PAGE_SIZE as u64;

/// Recognition value stored in every header page; a file whose header does
/// not carry this value is rejected as a format mismatch.
pub const MAGIC: u64 = 2024;

/// Sentinel for "no page" / "end of chain", represented as the all-ones
/// 64-bit pattern so it is unambiguous in both signed and unsigned contexts.
pub const NONE_PAGE: u64 = u64::MAX;

/// Page 0 is always the header page.
pub const HEADER_PAGE_NUM: u64 = 0;

/// Default frame count when the engine is brought up without an explicit
/// `init_db` call (spec 6.1's "reasonable default" contract).
pub const DEFAULT_NUM_BUF: usize = 100;

/// Default hashtable bucket count backing the buffer pool's frame index.
/// Oversized relative to `DEFAULT_NUM_BUF` to keep chain lengths short.
pub const DEFAULT_NUM_HT_ENTRIES: usize = 1024;

/// Minimum frame count the buffer pool can be configured with (spec 4.2,
/// 5): a splitting insert or redistributing delete holds up to three pins
/// at once, plus one frame for the header page.
pub const MIN_NUM_BUF: usize = 4;
