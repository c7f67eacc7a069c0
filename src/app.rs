//! The listing / extraction run driven by the CLI.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::io::RangeFetcher;
use crate::output::OutputDir;
use crate::zip::{EntryTable, ExtractedEntry, ZipExtractor, ZipParser};

/// What a run should do once the archive is open.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Don't print the listing
    pub skip_list: bool,
    /// Print sizes, method and timestamps in the listing
    pub long: bool,
    /// Entry indices to extract
    pub download: Vec<i64>,
    /// Base directory for extracted entries
    pub output_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            skip_list: false,
            long: false,
            download: Vec::new(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Counts of what a run wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub directories: usize,
}

/// Open the archive behind `fetcher`, print the listing to `out` and extract
/// the selected entries, one at a time, in central directory order.
///
/// The first failure stops the run. Its error names the phase (locate,
/// parse, resolve, extract, write) and, past resolving, the entry.
pub async fn run<F, W>(fetcher: Arc<F>, options: &RunOptions, out: &mut W) -> Result<RunSummary>
where
    F: RangeFetcher,
    W: Write,
{
    let parser = ZipParser::new(fetcher);
    let eocd = parser
        .find_eocd()
        .await
        .context("locate: no usable end of central directory")?;
    let table = parser
        .read_central_directory(&eocd)
        .await
        .context("parse: cannot read the central directory")?;
    let zip = ZipExtractor::new(parser, eocd, table);
    info!(entries = zip.entries().len(), "archive opened");

    if !options.skip_list {
        list_entries(zip.entries(), options.long, out).context("cannot print listing")?;
        if options.long && !zip.comment().is_empty() {
            print_comment(zip.comment(), out).context("cannot print listing")?;
        }
    }

    let mut summary = RunSummary::default();
    if options.download.is_empty() {
        return Ok(summary);
    }

    let selected = zip.resolve(&options.download).context("resolve")?;
    let output = OutputDir::new(&options.output_dir);
    info!(
        entries = selected.len(),
        dir = %output.base().display(),
        "extracting"
    );

    for entry in selected {
        let extracted = zip
            .extract(entry)
            .await
            .with_context(|| format!("extract: entry {} ({})", entry.index, entry.name))?;
        let path = output
            .write(&extracted)
            .await
            .with_context(|| format!("write: entry {} ({})", entry.index, entry.name))?;

        match extracted {
            ExtractedEntry::Directory { .. } => summary.directories += 1,
            ExtractedEntry::File { .. } => summary.files += 1,
        }
        info!(path = %path.display(), "extracted");
    }

    Ok(summary)
}

/// Print one line per entry.
///
/// The short format is `<index> : <name>`. The long format adds a header,
/// sizes, compression method and DOS timestamp.
pub fn list_entries<W: Write>(table: &EntryTable, long: bool, out: &mut W) -> std::io::Result<()> {
    if !long {
        for entry in table {
            writeln!(out, "{} : {}", entry.index, entry.name)?;
        }
        return Ok(());
    }

    writeln!(
        out,
        "{:>5}  {:>10}  {:>10}  {:<8}  {:>10}  {:>5}  Name",
        "Index", "Length", "Size", "Method", "Date", "Time"
    )?;
    writeln!(out, "{}", "-".repeat(70))?;

    for entry in table {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        writeln!(
            out,
            "{:>5}  {:>10}  {:>10}  {:<8}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.index,
            entry.uncompressed_size,
            entry.compressed_size,
            entry.compression_method.to_string(),
            year,
            month,
            day,
            hour,
            minute,
            entry.name
        )?;
    }

    Ok(())
}

/// Archive comment below the long listing, as `unzip -z` shows it.
fn print_comment<W: Write>(comment: &[u8], out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{}", "-".repeat(70))?;
    writeln!(out, "{}", String::from_utf8_lossy(comment).trim_end())
}
