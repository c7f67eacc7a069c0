//! ZIP archive parsing and extraction.
//!
//! This module reads ZIP archives through a [`RangeFetcher`](crate::io::RangeFetcher),
//! touching only the bytes it needs.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`locator`]: Finding the End of Central Directory record in the archive's tail
//! - [`parser`]: Low-level parsing of the central directory and local headers
//! - [`table`]: The ordered, read-only entry table
//! - [`resolver`]: Mapping user-selected indices to entries, expanding directories
//! - [`extractor`]: High-level extraction API for end users
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! This implementation reads the EOCD first (from the end of the file),
//! then the Central Directory, which allows listing files without reading
//! the entire archive - perfect for HTTP Range requests.
//!
//! ## Limitations
//!
//! - No ZIP64 (rejected with [`Error::UnsupportedArchive`](crate::Error::UnsupportedArchive))
//! - No encryption support
//! - No multi-disk archive support
//! - STORED and DEFLATE only

mod cp437;
pub mod extractor;
pub mod locator;
pub mod parser;
pub mod resolver;
pub mod structures;
pub mod table;

pub use extractor::{ExtractedEntry, ZipExtractor};
pub use parser::ZipParser;
pub use structures::*;
pub use table::EntryTable;
