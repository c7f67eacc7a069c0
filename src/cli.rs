use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::app::RunOptions;
use crate::io::HttpOptions;

#[derive(Parser, Debug)]
#[command(name = "lszip")]
#[command(version)]
#[command(about = "List and extract entries of a remote ZIP archive with HTTP Range requests", long_about = None)]
#[command(after_help = "Examples:\n  \
  lszip https://example.com/archive.zip                 list entries with their indices\n  \
  lszip -s -d 1,4 https://example.com/archive.zip       extract entries 1 and 4 only\n  \
  lszip -d 3 -o out https://example.com/archive.zip     extract entry 3 (a directory) into out/")]
pub struct Cli {
    /// ZIP archive URL (http:// or https://) or local path
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Don't print the entry listing
    #[arg(short = 's', long)]
    pub skip_list: bool,

    /// Long listing with sizes, method and modification time
    #[arg(short = 'l', long)]
    pub long: bool,

    /// Comma-separated entry indices to extract; directories bring their contents
    #[arg(
        short = 'd',
        long,
        value_name = "IDS",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    pub download: Vec<i64>,

    /// Extract into DIR instead of the current directory
    #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", env = "LSZIP_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Retries for requests that time out or fail to connect
    #[arg(long, value_name = "N", env = "LSZIP_RETRIES", default_value_t = 0)]
    pub retries: u32,

    /// More logging on stderr (-v, -vv, -vvv); RUST_LOG overrides
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            timeout: Duration::from_secs(self.timeout),
            retries: self.retries,
            ..Default::default()
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            skip_list: self.skip_list,
            long: self.long,
            download: self.download.clone(),
            output_dir: self.output_dir.clone(),
        }
    }

    /// Default `tracing` filter for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
