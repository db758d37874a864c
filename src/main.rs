//! CLI entry point for the favicons tool.

use std::io::{self, IsTerminal, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use favicon_core::domain::dedup_preserving_order;
use favicon_core::{
    BatchRunner, DownloadOptions, FaviconDownloader, FaviconResolver, HttpProber,
    PartialFilePolicy, load_domain_file, parse_domain_list, probe_budget_for,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod app_config;
mod cli;
mod progress;

use app_config::{RunSettings, default_log_level, load_config};
use cli::Args;
use progress::{ReportMode, is_dumb_terminal, should_use_progress_bar, spawn_report_printer};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded = load_config(args.config.as_deref())?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config > default (info)
    let default_level = default_log_level(&args, loaded.config.as_ref());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    if let (Some(path), Some(_)) = (&loaded.path, &loaded.config) {
        debug!(path = %path.display(), "loaded config file");
    }

    let settings = RunSettings::resolve(&args, loaded.config.as_ref());
    debug!(?settings, "effective settings");

    let raw_domains = collect_domains(&args)?;
    if raw_domains.is_empty() {
        info!("No domains provided. Pass domains as arguments, use --input, or pipe a list via stdin.");
        info!("Example: favicons '*.example.com' example.org");
        return Ok(());
    }
    info!(domains = raw_domains.len(), "Favicons starting");

    let prober = HttpProber::new(settings.probe_timeout).context("Failed to build probe client")?;
    let resolver = FaviconResolver::new(Arc::new(prober))
        .with_probe_budget(probe_budget_for(settings.probe_timeout));
    let downloader = FaviconDownloader::new(DownloadOptions {
        connect_timeout: settings.download_connect_timeout,
        read_timeout: settings.download_read_timeout,
        chunk_size: settings.chunk_size,
        partial_files: if settings.keep_partial {
            PartialFilePolicy::Keep
        } else {
            PartialFilePolicy::Remove
        },
    })?;

    let (report_tx, report_rx) = mpsc::unbounded_channel();
    let runner = BatchRunner::new(
        Arc::new(resolver),
        Arc::new(downloader),
        settings.output_dir.clone(),
        settings.concurrency,
    )?
    .with_progress(report_tx);

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; cancelling remaining work");
            cancel_on_signal.cancel();
        }
    });

    let mode = ReportMode {
        lines: !args.json,
        bar: should_use_progress_bar(
            io::stderr().is_terminal(),
            args.quiet,
            args.json,
            is_dumb_terminal(),
        ),
        tag_domain: settings.concurrency > 1,
    };
    let printer = spawn_report_printer(report_rx, mode, raw_domains.len());

    let summary = runner.run(&raw_domains, &cancel).await?;
    // Dropping the runner closes the report channel so the printer drains and exits.
    drop(runner);
    if let Err(e) = printer.await {
        warn!(error = %e, "report printer task panicked");
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to render JSON report")?
        );
    }

    let totals = summary.totals;
    info!(
        downloaded = totals.downloaded,
        not_found = totals.not_found,
        transfer_failed = totals.transfer_failed,
        rejected = totals.rejected,
        cancelled = totals.cancelled,
        output_dir = %settings.output_dir.display(),
        "Favicons complete"
    );

    Ok(())
}

/// Gathers raw domains from `--input`, positional arguments, then stdin.
///
/// Stdin is read only when neither of the other two sources is given.
fn collect_domains(args: &Args) -> Result<Vec<String>> {
    let mut domains = Vec::new();

    if let Some(path) = &args.input {
        let from_file = load_domain_file(path)
            .with_context(|| format!("Failed to load domain list '{}'", path.display()))?;
        debug!(count = from_file.len(), "domains from input file");
        domains.extend(from_file);
    }
    domains.extend(args.domains.iter().map(|d| d.trim().to_string()));

    if args.input.is_none() && args.domains.is_empty() && !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read domains from stdin")?;
        domains.extend(parse_domain_list(&buffer));
    }

    Ok(dedup_preserving_order(
        domains.into_iter().filter(|d| !d.is_empty()),
    ))
}
