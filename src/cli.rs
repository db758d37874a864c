//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use favicon_core::download::MAX_CHUNK_SIZE;

/// Resolve and download `.ico` favicons for a list of domains.
///
/// Each domain is probed over HTTPS then HTTP, falling back to its
/// registered domain. The resolved URL (or `!! Not found`) is printed per
/// domain and the icon is saved as `{domain}.ico` in the output directory.
#[derive(Parser, Debug)]
#[command(name = "favicons")]
#[command(author, version, about)]
pub struct Args {
    /// Domains to resolve (wildcards such as `*.example.com` allowed)
    #[arg(value_name = "DOMAIN")]
    pub domains: Vec<String>,

    /// Domain list file: year-column CSV or one domain per line
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory receiving `{domain}.ico` files [default: ./favicon_ico]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Domains processed concurrently (1-64) [default: 1]
    ///
    /// Above 1, output lines follow completion order and start with the
    /// domain and a tab.
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub concurrency: Option<u8>,

    /// Per-request probe timeout in seconds (1-3600) [default: 5]
    #[arg(short = 't', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Bytes per write when saving a favicon [default: 1024]
    #[arg(long, value_name = "BYTES", value_parser = parse_chunk_size)]
    pub chunk_size: Option<usize>,

    /// Keep partially written files when a download fails
    #[arg(long)]
    pub keep_partial: bool,

    /// Print a JSON report instead of one line per domain
    #[arg(long)]
    pub json: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_chunk_size(raw: &str) -> Result<usize, String> {
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("expected a positive integer, got '{raw}'"))?;
    if (1..=MAX_CHUNK_SIZE).contains(&value) {
        Ok(value)
    } else {
        Err(format!("must be between 1 and {MAX_CHUNK_SIZE}"))
    }
}
