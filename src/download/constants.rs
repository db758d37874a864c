//! Constants for the download module (timeouts, chunking).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default size of each write to the sink, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Largest accepted chunk size (1 MiB).
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;
