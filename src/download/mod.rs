//! Favicon download: stream a resolved URL to a file or writer.
//!
//! # Features
//!
//! - Streaming downloads written in fixed-size chunks (1024 bytes by default)
//! - Target files created only after a success status, truncated if present
//! - Configurable handling of partial files after a failed transfer
//! - Prompt abort through a cancellation token
//!
//! # Example
//!
//! ```no_run
//! use favicon_core::download::{DownloadOptions, FaviconDownloader};
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = FaviconDownloader::new(DownloadOptions::default())?;
//! let bytes = downloader
//!     .download_to_file(
//!         "https://example.com/favicon.ico",
//!         Path::new("./favicon_ico/example.com.ico"),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! println!("wrote {bytes} bytes");
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;

pub use client::{DownloadOptions, FaviconDownloader, PartialFilePolicy};
pub use constants::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
pub use error::DownloadError;

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
