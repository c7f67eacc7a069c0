//! Byte-range sources for archives.
//!
//! Everything the ZIP engine reads goes through [`RangeFetcher`], so the same
//! code lists a remote archive over HTTP, a local file, or a buffer in a test.

mod http;
mod local;
mod memory;

pub use http::{HttpOptions, HttpRangeFetcher};
pub use local::LocalFileFetcher;
pub use memory::MemoryFetcher;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Random access to a fixed-size archive by inclusive byte ranges.
#[async_trait]
pub trait RangeFetcher: Send + Sync {
    /// Fetch bytes `start..=end`.
    ///
    /// Implementations return exactly `end - start + 1` bytes or an error;
    /// a short answer is never passed through.
    async fn fetch(&self, start: u64, end: u64) -> Result<Vec<u8>>;

    /// Total size of the archive in bytes.
    fn size(&self) -> u64;

    /// Fetch `len` bytes starting at `offset`. A zero length needs no request.
    async fn fetch_len(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let end = offset
            .checked_add(len - 1)
            .ok_or_else(|| Error::InvalidRange {
                start: offset,
                end: u64::MAX,
                size: self.size(),
            })?;
        self.fetch(offset, end).await
    }
}

/// Reject ranges that are empty, reversed, or run past the end of the archive.
pub(crate) fn check_range(start: u64, end: u64, size: u64) -> Result<()> {
    if start > end || end >= size {
        return Err(Error::InvalidRange { start, end, size });
    }
    Ok(())
}

/// Guard the "exactly the requested length" guarantee of [`RangeFetcher::fetch`].
pub(crate) fn check_length(start: u64, end: u64, received: usize) -> Result<()> {
    let expected = end - start + 1;
    if received as u64 != expected {
        return Err(Error::RangeMismatch {
            expected: format!("{expected} bytes"),
            actual: format!("{received} bytes"),
        });
    }
    Ok(())
}
