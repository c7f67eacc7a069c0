use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::RangeFetcher;

use super::parser::ZipParser;
use super::resolver;
use super::structures::{CentralDirectoryEntry, CompressionMethod, EndOfCentralDirectory};
use super::table::EntryTable;

/// Upper bound for the output buffer reserved before inflating.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// What extracting one resolved entry produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedEntry {
    /// A directory to create; carries no data.
    Directory { path: String },
    /// A file and its decompressed contents.
    File { path: String, data: Vec<u8> },
}

impl ExtractedEntry {
    /// Path relative to the output directory, as stored in the archive.
    pub fn path(&self) -> &str {
        match self {
            ExtractedEntry::Directory { path } | ExtractedEntry::File { path, .. } => path,
        }
    }
}

/// An opened archive: the EOCD and entry table are read once, then any
/// number of entries can be extracted with further range fetches.
pub struct ZipExtractor<F: RangeFetcher> {
    parser: ZipParser<F>,
    eocd: EndOfCentralDirectory,
    table: EntryTable,
}

impl<F: RangeFetcher> ZipExtractor<F> {
    /// Locate the EOCD and read the central directory.
    pub async fn open(fetcher: Arc<F>) -> Result<Self> {
        let parser = ZipParser::new(fetcher);
        let eocd = parser.find_eocd().await?;
        let table = parser.read_central_directory(&eocd).await?;
        Ok(Self::new(parser, eocd, table))
    }

    /// Assemble an extractor from parts already read by `parser`.
    pub fn new(parser: ZipParser<F>, eocd: EndOfCentralDirectory, table: EntryTable) -> Self {
        Self {
            parser,
            eocd,
            table,
        }
    }

    /// List all entries in the archive
    pub fn entries(&self) -> &EntryTable {
        &self.table
    }

    /// Archive comment bytes (not decoded).
    pub fn comment(&self) -> &[u8] {
        &self.eocd.comment
    }

    /// Map requested indices to entries, expanding directories.
    /// See [`resolver::resolve`].
    pub fn resolve(&self, requested: &[i64]) -> Result<Vec<&CentralDirectoryEntry>> {
        resolver::resolve(&self.table, requested)
    }

    /// Extract one entry. Directories need no fetch.
    pub async fn extract(&self, entry: &CentralDirectoryEntry) -> Result<ExtractedEntry> {
        if entry.is_directory {
            return Ok(ExtractedEntry::Directory {
                path: entry.name.clone(),
            });
        }

        info!(index = entry.index, name = %entry.name, "extracting");
        let data = self.extract_to_memory(entry).await?;
        Ok(ExtractedEntry::File {
            path: entry.name.clone(),
            data,
        })
    }

    /// Extract file data to memory
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedCompressionMethod`] for anything but stored/deflate
    /// - [`Error::Encrypted`] for encrypted entries
    /// - [`Error::LocalHeaderCorrupt`] if the local header is not where the
    ///   central directory says, or disagrees with it
    /// - [`Error::EntryCorrupt`] if the payload doesn't decode to the declared
    ///   size and CRC-32
    pub async fn extract_to_memory(&self, entry: &CentralDirectoryEntry) -> Result<Vec<u8>> {
        if entry.is_directory {
            return Ok(Vec::new());
        }

        if let CompressionMethod::Unknown(method) = entry.compression_method {
            return Err(Error::UnsupportedCompressionMethod {
                name: entry.name.clone(),
                method,
            });
        }
        if entry.is_encrypted() {
            return Err(Error::Encrypted {
                name: entry.name.clone(),
            });
        }
        if entry.compression_method == CompressionMethod::Stored
            && entry.compressed_size != entry.uncompressed_size
        {
            return Err(Error::entry_corrupt(
                &entry.name,
                format!(
                    "stored entry has compressed size {} but uncompressed size {}",
                    entry.compressed_size, entry.uncompressed_size
                ),
            ));
        }

        let lfh = self.parser.read_local_header(entry).await?;
        if lfh.compression_method != entry.compression_method {
            return Err(Error::LocalHeaderCorrupt {
                name: entry.name.clone(),
                reason: format!(
                    "method {} disagrees with central directory ({})",
                    lfh.compression_method, entry.compression_method
                ),
            });
        }

        // Sizes come from the central directory: with a data descriptor the
        // local header carries zeros.
        let data_offset = lfh.data_offset(entry.local_header_offset);
        if data_offset + entry.compressed_size > self.parser.fetcher().size() {
            return Err(Error::entry_corrupt(
                &entry.name,
                format!(
                    "{} bytes at offset {data_offset} run past the end of the archive",
                    entry.compressed_size
                ),
            ));
        }

        let raw = self
            .parser
            .fetcher()
            .fetch_len(data_offset, entry.compressed_size)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Deflate => inflate(&entry.name, &raw, entry.uncompressed_size)?,
            _ => raw,
        };

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(Error::entry_corrupt(
                &entry.name,
                format!("CRC-32 {:08x}, expected {:08x}", crc.sum(), entry.crc32),
            ));
        }

        debug!(
            name = %entry.name,
            compressed = entry.compressed_size,
            size = data.len(),
            "decoded entry"
        );
        Ok(data)
    }
}

/// Raw-deflate `raw`, which must inflate to exactly `expected` bytes.
fn inflate(name: &str, raw: &[u8], expected: u64) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected.min(MAX_PREALLOC) as usize);

    // One byte past the declared size is enough to detect an overlong stream
    DeflateDecoder::new(raw)
        .take(expected + 1)
        .read_to_end(&mut out)
        .map_err(|e| Error::entry_corrupt(name, format!("deflate stream: {e}")))?;

    if out.len() as u64 != expected {
        return Err(Error::entry_corrupt(
            name,
            format!("inflated to {} bytes, expected {expected}", out.len()),
        ));
    }
    Ok(out)
}
