//! Finding the End of Central Directory record.
//!
//! The record is the last structure in the file, followed only by the archive
//! comment (at most 65535 bytes). We first try the common no-comment case with
//! a 22-byte fetch, then fall back to one fetch of the largest possible tail
//! and scan it backwards.

use tracing::debug;

use crate::error::{Error, Result};
use crate::io::RangeFetcher;

use super::structures::EndOfCentralDirectory;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
const MAX_COMMENT_SIZE: u64 = 65535;

/// Largest tail that can hold the EOCD plus a full comment.
pub const TAIL_WINDOW: u64 = MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64;

/// Locate and parse the End of Central Directory record.
///
/// # Errors
///
/// [`Error::EocdNotFound`] when no acceptable record is in the tail, and
/// [`Error::UnsupportedArchive`] for ZIP64 or multi-disk archives.
pub async fn locate_eocd<F: RangeFetcher + ?Sized>(fetcher: &F) -> Result<EndOfCentralDirectory> {
    let size = fetcher.size();
    if size < EndOfCentralDirectory::SIZE as u64 {
        return Err(Error::EocdNotFound);
    }

    let eocd = match fast_path(fetcher, size).await? {
        Some(eocd) => eocd,
        None => {
            let window = TAIL_WINDOW.min(size);
            let window_start = size - window;
            let buf = fetcher.fetch(window_start, size - 1).await?;
            scan_for_eocd(&buf, window_start).ok_or(Error::EocdNotFound)?
        }
    };

    if eocd.is_zip64() {
        return Err(Error::UnsupportedArchive("ZIP64 archives are not supported".into()));
    }
    if eocd.is_multi_disk() {
        return Err(Error::UnsupportedArchive("multi-disk archives are not supported".into()));
    }

    debug!(
        offset = eocd.offset,
        entries = eocd.total_entries,
        cd_offset = eocd.cd_offset,
        cd_size = eocd.cd_size,
        comment = %String::from_utf8_lossy(&eocd.comment),
        "found end of central directory"
    );
    Ok(eocd)
}

/// The record sits in the last 22 bytes when the comment is empty.
async fn fast_path<F: RangeFetcher + ?Sized>(
    fetcher: &F,
    size: u64,
) -> Result<Option<EndOfCentralDirectory>> {
    let offset = size - EndOfCentralDirectory::SIZE as u64;
    let buf = fetcher.fetch(offset, size - 1).await?;
    Ok(scan_for_eocd(&buf, offset).filter(|eocd| eocd.offset == offset))
}

/// Scan `buf` (the archive tail starting at absolute `window_start`)
/// backwards for the End of Central Directory record.
///
/// A signature only counts when its comment length accounts for exactly the
/// bytes left in the window and its central directory ends before it. A
/// signature that happens to appear inside the comment never has enough bytes
/// after it to satisfy the first check, so the true record wins.
pub fn scan_for_eocd(buf: &[u8], window_start: u64) -> Option<EndOfCentralDirectory> {
    let last = buf.len().checked_sub(EndOfCentralDirectory::SIZE)?;

    for i in (0..=last).rev() {
        if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
            continue;
        }

        let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
        if comment_len != buf.len() - i - EndOfCentralDirectory::SIZE {
            continue;
        }

        let Ok(eocd) = EndOfCentralDirectory::from_bytes(&buf[i..], window_start + i as u64) else {
            continue;
        };
        if eocd.is_zip64() || eocd.cd_fits() {
            return Some(eocd);
        }
    }

    None
}
