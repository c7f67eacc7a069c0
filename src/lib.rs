//! # lszip
//!
//! List and selectively extract the entries of a ZIP archive that sits behind
//! an HTTP(S) URL, without downloading the archive.
//!
//! Only the bytes that matter are fetched with HTTP Range requests: the tail
//! of the archive to find the End of Central Directory record, the central
//! directory itself, and then, for each selected entry, its local header and
//! compressed data.
//!
//! ## Features
//!
//! - HTTP/HTTPS sources through Range requests, plus local files
//! - STORED and DEFLATE entries, verified against their CRC-32
//! - Selection by entry index; a directory index selects everything below it
//!
//! ZIP64 archives are not supported.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lszip::{HttpOptions, HttpRangeFetcher, ZipExtractor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = HttpRangeFetcher::connect(
//!         "https://example.com/archive.zip",
//!         &HttpOptions::default(),
//!     )
//!     .await?;
//!     let zip = ZipExtractor::open(Arc::new(fetcher)).await?;
//!
//!     for entry in zip.entries() {
//!         println!("{} : {}", entry.index, entry.name);
//!     }
//!
//!     // Entry 3 and, if it is a directory, everything inside it
//!     for entry in zip.resolve(&[3])? {
//!         let extracted = zip.extract(entry).await?;
//!         println!("{}", extracted.path());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod cli;
pub mod error;
pub mod io;
pub mod output;
pub mod zip;

#[cfg(test)]
mod test_support;

pub use cli::Cli;
pub use error::{Error, Result};
pub use io::{HttpOptions, HttpRangeFetcher, LocalFileFetcher, MemoryFetcher, RangeFetcher};
pub use output::OutputDir;
pub use zip::{CentralDirectoryEntry, EntryTable, ExtractedEntry, ZipExtractor};
