//! Error types for cache operations.

use std::path::PathBuf;

use bacch_config::ConfigError;

/// Errors that can occur during cache operations.
///
/// Reading a snapshot is fail-safe: every snapshot variant below is turned
/// into a cache miss by [`BuildCache::load`](crate::BuildCache::load) and
/// never reaches the caller. Errors raised while rebuilding the
/// configuration or scanning the source directory are fatal and propagate.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files or
    /// listing the source directory.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A snapshot file has an invalid or missing header.
    #[error("invalid snapshot header in {path}: {reason}")]
    InvalidHeader {
        /// The snapshot file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the checksum of the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The snapshot file path.
        path: PathBuf,
        /// The checksum recorded in the header.
        expected: String,
        /// The checksum computed from the payload.
        actual: String,
    },

    /// The snapshot was written by a different version of bacch.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The snapshot file path.
        path: PathBuf,
        /// The running tool version.
        expected: String,
        /// The version recorded in the snapshot.
        actual: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The descriptor could not be loaded or violates a resource invariant.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
