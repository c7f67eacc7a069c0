//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`RangeFetcher`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. Read the Central Directory to get metadata for all files
//! 3. For extraction, read each file's Local File Header and data
//!
//! This approach is efficient for HTTP Range requests, as we only
//! need to fetch the file's tail to list contents.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::io::RangeFetcher;

use super::cp437;
use super::locator::locate_eocd;
use super::structures::*;
use super::table::EntryTable;

/// Low-level ZIP file parser.
///
/// Generic over the fetcher so the same code reads HTTP, local and in-memory
/// archives. Typically used through [`ZipExtractor`](super::ZipExtractor)
/// rather than directly.
pub struct ZipParser<F: RangeFetcher> {
    /// The underlying data source
    fetcher: Arc<F>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<F: RangeFetcher> ZipParser<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        let size = fetcher.size();
        Self { fetcher, size }
    }

    /// Find and parse the End of Central Directory record.
    pub async fn find_eocd(&self) -> Result<EndOfCentralDirectory> {
        locate_eocd(self.fetcher.as_ref()).await
    }

    /// Fetch the whole Central Directory in one request and parse it.
    ///
    /// # Errors
    ///
    /// [`Error::CentralDirectoryCorrupt`] if any header is malformed or the
    /// directory holds fewer headers than the EOCD declares.
    pub async fn read_central_directory(&self, eocd: &EndOfCentralDirectory) -> Result<EntryTable> {
        let cd_data = self
            .fetcher
            .fetch_len(eocd.cd_offset as u64, eocd.cd_size as u64)
            .await?;

        let table = parse_central_directory(&cd_data, eocd.total_entries as usize, self.size)?;
        debug!(entries = table.len(), "parsed central directory");
        Ok(table)
    }

    /// Fetch and parse the Local File Header of `entry`.
    pub async fn read_local_header(&self, entry: &CentralDirectoryEntry) -> Result<LocalFileHeader> {
        let corrupt = |reason: String| Error::LocalHeaderCorrupt {
            name: entry.name.clone(),
            reason,
        };

        if entry.local_header_offset + LFH_SIZE as u64 > self.size {
            return Err(corrupt(format!(
                "header at {} runs past the end of the archive",
                entry.local_header_offset
            )));
        }

        let lfh_buf = self
            .fetcher
            .fetch_len(entry.local_header_offset, LFH_SIZE as u64)
            .await?;

        LocalFileHeader::from_bytes(&lfh_buf)
            .ok_or_else(|| corrupt(format!("bad signature {:02x?}", &lfh_buf[0..4])))
    }

    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }
}

/// Parse `total_entries` Central Directory File Headers from `data`.
///
/// Entries are numbered in the order their headers appear. `archive_size`
/// bounds the local header offsets.
pub fn parse_central_directory(
    data: &[u8],
    total_entries: usize,
    archive_size: u64,
) -> Result<EntryTable> {
    let mut entries = Vec::with_capacity(total_entries);
    let mut cursor = Cursor::new(data);

    for index in 0..total_entries {
        let entry = parse_cdfh(&mut cursor, index, archive_size)?;
        entries.push(entry);
    }

    let trailing = data.len() - cursor.position() as usize;
    if trailing > 0 {
        warn!(trailing, "ignoring bytes after the last central directory header");
    }

    Ok(EntryTable::new(entries))
}

/// Parse a Central Directory File Header from a cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>, index: usize, archive_size: u64) -> Result<CentralDirectoryEntry> {
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if remaining < CDFH_MIN_SIZE {
        return Err(Error::cd_corrupt(
            index,
            format!("directory ends after {remaining} bytes, header needs {CDFH_MIN_SIZE}"),
        ));
    }

    // Read and verify the signature (PK\x01\x02)
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(Error::cd_corrupt(index, format!("bad signature {sig:02x?}")));
    }

    // Read fixed-size header fields
    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let compressed_size = cursor.read_u32::<LittleEndian>()?;
    let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
    let file_name_length = cursor.read_u16::<LittleEndian>()? as usize;
    let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;
    let file_comment_length = cursor.read_u16::<LittleEndian>()? as u64;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let lfh_offset = cursor.read_u32::<LittleEndian>()?;

    // Variable-length fields must fit in what is left of the directory
    let variable = file_name_length as u64 + extra_field_length + file_comment_length;
    if variable > (remaining - CDFH_MIN_SIZE) as u64 {
        return Err(Error::cd_corrupt(
            index,
            format!(
                "name/extra/comment need {variable} bytes, only {} left",
                remaining - CDFH_MIN_SIZE
            ),
        ));
    }

    let mut file_name_bytes = vec![0u8; file_name_length];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = decode_name(&file_name_bytes, flags);

    // Extra field and comment carry nothing we use without ZIP64
    cursor.set_position(cursor.position() + extra_field_length + file_comment_length);

    if compressed_size == u32::MAX || uncompressed_size == u32::MAX || lfh_offset == u32::MAX {
        return Err(Error::UnsupportedArchive(format!(
            "entry {index} ({file_name}) uses ZIP64 extensions"
        )));
    }

    if lfh_offset as u64 >= archive_size {
        return Err(Error::cd_corrupt(
            index,
            format!("local header offset {lfh_offset} is past the end of the archive"),
        ));
    }

    // Directory entries end with '/'
    let is_directory = file_name.ends_with('/');

    Ok(CentralDirectoryEntry {
        index,
        name: file_name,
        flags,
        compression_method: CompressionMethod::from_u16(compression_method),
        crc32,
        compressed_size: compressed_size as u64,
        uncompressed_size: uncompressed_size as u64,
        local_header_offset: lfh_offset as u64,
        last_mod_time,
        last_mod_date,
        is_directory,
    })
}

/// UTF-8 when the archiver says so, code page 437 otherwise.
fn decode_name(bytes: &[u8], flags: u16) -> String {
    if flags & FLAG_UTF8 != 0 {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        cp437::decode(bytes)
    }
}
