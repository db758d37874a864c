//! Domain handling: list loading, wildcard normalization and registered
//! domain lookup.
//!
//! - [`parse_domain_list`] / [`load_domain_file`] - produce a deduplicated set
//!   of raw entries from a year-column CSV or a plain list
//! - [`normalize`] - strip `*.` wildcard prefixes
//! - [`registered_domain`] - eTLD+1 via the Public Suffix List

mod normalize;
mod registered;
mod source;

pub use normalize::normalize;
pub use registered::{is_registered_domain, registered_domain};
pub use source::{
    ListLayout, dedup_preserving_order, detect_layout, layout_for_path, load_domain_file,
    parse_domain_list, parse_domain_list_as,
};

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while loading a domain list.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The list file could not be read.
    #[error("failed to read domain list {path}: {source}")]
    Io {
        /// The file that failed to load.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    /// Creates an IO error for the given list path.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
