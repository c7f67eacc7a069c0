//! Main entry point for the lszip CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lszip::app::{self, RunSummary};
use lszip::{Cli, HttpRangeFetcher, LocalFileFetcher};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let options = cli.run_options();
    let mut stdout = std::io::stdout().lock();

    let summary = if cli.is_http_url() {
        let fetcher = HttpRangeFetcher::connect(&cli.source, &cli.http_options())
            .await
            .with_context(|| format!("connect: {}", cli.source))?;
        let fetcher = Arc::new(fetcher);

        let result = app::run(fetcher.clone(), &options, &mut stdout).await;
        // Reported whether or not the run succeeded
        eprintln!(
            "\nTotal bytes transferred from {}: {}",
            fetcher.url(),
            format_size(fetcher.transferred_bytes())
        );
        result?
    } else {
        let fetcher = LocalFileFetcher::open(Path::new(&cli.source))
            .with_context(|| format!("open: {}", cli.source))?;
        app::run(Arc::new(fetcher), &options, &mut stdout).await?
    };

    report(&summary);
    Ok(())
}

/// Logs go to stderr so stdout carries nothing but the listing.
fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lszip={}", cli.log_level())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(summary: &RunSummary) {
    if summary.files + summary.directories > 0 {
        info!(
            files = summary.files,
            directories = summary.directories,
            "extraction finished"
        );
    }
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
