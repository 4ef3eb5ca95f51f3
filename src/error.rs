use std::fmt;

/// Errors produced by the storage engine.
///
/// Mirrors the status codes documented in the public API (section 6 of the
/// spec): each variant maps to exactly one of `invalid_argument`,
/// `duplicate_key`, `not_found`, `capacity_exhausted`, `format_mismatch` or
/// `io_failure`. `EmptyTable` covers `db_find`'s distinct "no root" status
/// (1, as opposed to 2 for an absent key in a non-empty tree). `Corruption`
/// is the one variant that is not meant to be handled -- it signals a
/// detected structural invariant violation and the caller should treat the
/// table as unusable.
#[derive(Debug)]
pub enum Error {
    InvalidArgument(String),
    DuplicateKey { table_id: i64, key: i64 },
    NotFound { table_id: i64, key: i64 },
    EmptyTable { table_id: i64 },
    CapacityExhausted(String),
    FormatMismatch { path: String, magic: u64 },
    Io(std::io::Error),
    Corruption(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::DuplicateKey { table_id, key } => {
                write!(f, "duplicate key {} in table {}", key, table_id)
            }
            Error::NotFound { table_id, key } => {
                write!(f, "key {} not found in table {}", key, table_id)
            }
            Error::EmptyTable { table_id } => {
                write!(f, "table {} has no root page", table_id)
            }
            Error::CapacityExhausted(msg) => write!(f, "capacity exhausted: {}", msg),
            Error::FormatMismatch { path, magic } => write!(
                f,
                "format mismatch: {} has magic number {}, expected the recognition value",
                path, magic
            ),
            Error::Io(e) => write!(f, "io failure: {}", e),
            Error::Corruption(msg) => write!(f, "structural invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
