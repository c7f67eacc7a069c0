//! Error type shared by the fetchers, the ZIP engine and the output writer.

use reqwest::StatusCode;

/// Shortcut for `Result<T, lszip::Error>`
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while locating, parsing, resolving,
/// extracting or writing entries of a remote archive.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Connection, DNS, TLS or timeout failure in the HTTP client.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local I/O failure (file source or output directory).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The server answered with a status that is neither 200 nor 206.
    #[error("HTTP request failed with status: {0}")]
    HttpStatus(StatusCode),

    /// Neither HEAD nor a range probe told us how large the archive is.
    #[error("server did not report the archive length")]
    MissingLength,

    /// The server ignored the `Range` header and sent the full body.
    #[error("server does not honour Range requests (status {0})")]
    RangeUnsupported(StatusCode),

    /// A range outside `0..size` was requested.
    #[error("invalid range {start}-{end} for archive of {size} bytes")]
    InvalidRange { start: u64, end: u64, size: u64 },

    /// The server answered with a different span than the one requested.
    #[error("range mismatch: requested {expected}, received {actual}")]
    RangeMismatch { expected: String, actual: String },

    /// No End of Central Directory record in the tail of the archive.
    #[error("end of central directory not found (not a ZIP file, or ZIP64)")]
    EocdNotFound,

    /// ZIP64 or multi-disk archive.
    #[error("unsupported archive: {0}")]
    UnsupportedArchive(String),

    #[error("central directory corrupt at entry {index}: {reason}")]
    CentralDirectoryCorrupt { index: usize, reason: String },

    /// A requested entry index is outside `0..count`.
    #[error("invalid entry index {index} (archive has {count} entries)")]
    InvalidIndex { index: i64, count: usize },

    #[error("local file header of {name:?} corrupt: {reason}")]
    LocalHeaderCorrupt { name: String, reason: String },

    #[error("unsupported compression method {method} for {name:?}")]
    UnsupportedCompressionMethod { name: String, method: u16 },

    #[error("{name:?} is encrypted")]
    Encrypted { name: String },

    /// Payload does not decode to the size or checksum the directory claims.
    #[error("entry {name:?} corrupt: {reason}")]
    EntryCorrupt { name: String, reason: String },

    /// Entry name would escape the output directory.
    #[error("refusing to write unsafe path {name:?}")]
    UnsafePath { name: String },
}

impl Error {
    pub(crate) fn cd_corrupt(index: usize, reason: impl Into<String>) -> Self {
        Error::CentralDirectoryCorrupt {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn entry_corrupt(name: &str, reason: impl Into<String>) -> Self {
        Error::EntryCorrupt {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
