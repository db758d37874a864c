//! Streaming favicon downloader.
//!
//! The response body is written to the sink in fixed-size chunks as it
//! arrives; the full payload is never buffered.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::http_client::{HttpTimeouts, build_http_client};

/// Placeholder path reported for IO errors on non-file sinks.
const STREAM_SINK_LABEL: &str = "<sink>";

/// What to do with a partially written file when a transfer fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialFilePolicy {
    /// Delete the partial file.
    #[default]
    Remove,
    /// Leave the partial file on disk.
    Keep,
}

/// Construction options for [`FaviconDownloader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// Time allowed for a whole transfer.
    pub read_timeout: Duration,
    /// Size of each write to the sink.
    pub chunk_size: usize,
    /// Handling of partial files after a failed transfer.
    pub partial_files: PartialFilePolicy,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            chunk_size: DEFAULT_CHUNK_SIZE,
            partial_files: PartialFilePolicy::default(),
        }
    }
}

/// Downloads favicon bytes to files or arbitrary async writers.
///
/// Create once and reuse: the inner client pools connections.
#[derive(Debug, Clone)]
pub struct FaviconDownloader {
    client: Client,
    chunk_size: usize,
    partial_files: PartialFilePolicy,
}

impl FaviconDownloader {
    /// Creates a downloader from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidChunkSize`] when the chunk size is 0 or
    /// above [`MAX_CHUNK_SIZE`], and [`DownloadError::Client`] when the HTTP
    /// client cannot be built.
    pub fn new(options: DownloadOptions) -> Result<Self, DownloadError> {
        if !(1..=MAX_CHUNK_SIZE).contains(&options.chunk_size) {
            return Err(DownloadError::InvalidChunkSize {
                value: options.chunk_size,
                max: MAX_CHUNK_SIZE,
            });
        }
        let client = build_http_client(HttpTimeouts {
            connect: options.connect_timeout,
            request: options.read_timeout,
        })
        .map_err(|source| DownloadError::Client { source })?;

        debug!(
            chunk_size = options.chunk_size,
            partial_files = ?options.partial_files,
            "creating favicon downloader"
        );
        Ok(Self {
            client,
            chunk_size: options.chunk_size,
            partial_files: options.partial_files,
        })
    }

    /// Returns the configured chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the configured partial file policy.
    #[must_use]
    pub fn partial_files(&self) -> PartialFilePolicy {
        self.partial_files
    }

    /// Streams `url` into `sink`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if the URL is invalid, the request fails or
    /// returns a non-success status, the stream drops, a write fails, or
    /// `cancel` fires.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn download<W>(
        &self,
        url: &str,
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let response = self.open(url, cancel).await?;
        self.stream_body(response, sink, url, Path::new(STREAM_SINK_LABEL), cancel)
            .await
    }

    /// Streams `url` into the file at `path`, creating or truncating it.
    ///
    /// The file is only created once the server has answered with a success
    /// status. If the transfer then fails, the partial file is handled per
    /// the configured [`PartialFilePolicy`].
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`download`](Self::download), plus
    /// [`DownloadError::Io`] when the file cannot be created.
    #[instrument(skip_all, fields(url = %url, path = %path.display()))]
    pub async fn download_to_file(
        &self,
        url: &str,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        let response = self.open(url, cancel).await?;

        let mut file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        let result = self
            .stream_body(response, &mut file, url, path, cancel)
            .await;
        drop(file);

        match result {
            Ok(bytes) => {
                info!(bytes, "download complete");
                Ok(bytes)
            }
            Err(error) => {
                match self.partial_files {
                    PartialFilePolicy::Remove => {
                        debug!("removing partial file after failed transfer");
                        if let Err(e) = tokio::fs::remove_file(path).await {
                            warn!(error = %e, "failed to remove partial file");
                        }
                    }
                    PartialFilePolicy::Keep => {
                        debug!("keeping partial file after failed transfer");
                    }
                }
                Err(error)
            }
        }
    }

    /// Sends the GET request and checks the status.
    async fn open(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if cancel.is_cancelled() {
            return Err(DownloadError::cancelled(url));
        }

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            sent = self.client.get(parsed).send() => {
                sent.map_err(|e| DownloadError::network(url, e))?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }

    /// Copies the response body to `sink`, `chunk_size` bytes per write.
    async fn stream_body<W>(
        &self,
        response: reqwest::Response,
        sink: &mut W,
        url: &str,
        sink_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
                next = stream.next() => next,
            };
            let Some(chunk_result) = next else {
                break;
            };
            let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

            for piece in chunk.chunks(self.chunk_size) {
                sink.write_all(piece)
                    .await
                    .map_err(|e| DownloadError::io(sink_path, e))?;
                bytes_written += piece.len() as u64;
            }
        }

        sink.flush()
            .await
            .map_err(|e| DownloadError::io(sink_path, e))?;
        Ok(bytes_written)
    }
}
