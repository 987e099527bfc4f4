use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Hard failures while reading a map document.
///
/// Anything the format allows but this crate does not support (external
/// tilesets, compressed layers, odd atlas sizes) is logged and skipped
/// instead of surfacing here.
#[derive(Debug, Error)]
pub enum MapError {
    /// The map file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The map file is not valid Tiled JSON.
    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// An in-memory JSON document failed to decode.
    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// Only `.json` exports are understood.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}
