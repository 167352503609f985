//! Binary snapshot files.
//!
//! A snapshot is a 4-byte little-endian header length, a bincode-encoded
//! [`SnapshotHeader`], and the bincode-encoded payload. The header carries
//! magic bytes, the snapshot format version, the bacch version that wrote it,
//! and a checksum of the payload, so truncated, foreign, or outdated files
//! are rejected before the payload is decoded.

use std::path::{Path, PathBuf};

use bacch_common::ContentHash;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Directory under the working directory that holds cache files.
pub const CACHE_DIR: &str = ".bacch";

/// File name of the build cache snapshot within [`CACHE_DIR`].
pub const SNAPSHOT_FILE: &str = "bacch.cache";

/// Magic bytes identifying a bacch snapshot.
const SNAPSHOT_MAGIC: [u8; 4] = *b"BACH";

/// Current snapshot format version. Increment on breaking changes to the
/// header or payload layout.
const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Header prepended to every snapshot for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic bytes: must be `b"BACH"`.
    pub magic: [u8; 4],

    /// Snapshot format version.
    pub format_version: u32,

    /// bacch version that produced this snapshot.
    pub tool_version: String,

    /// Content hash of the payload.
    pub checksum: ContentHash,
}

/// Returns the snapshot path for a working directory.
pub fn snapshot_path(wdir: &Path) -> PathBuf {
    wdir.join(CACHE_DIR).join(SNAPSHOT_FILE)
}

/// Encodes `value` with a validated header.
pub fn encode<T: Serialize>(value: &T, tool_version: &str) -> Result<Vec<u8>, CacheError> {
    let payload = bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    let header = SnapshotHeader {
        magic: SNAPSHOT_MAGIC,
        format_version: SNAPSHOT_FORMAT_VERSION,
        tool_version: tool_version.to_string(),
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Decodes snapshot bytes read from `path`, validating the header.
pub fn decode<T: DeserializeOwned>(
    raw: &[u8],
    path: &Path,
    tool_version: &str,
) -> Result<T, CacheError> {
    let invalid = |reason: &str| CacheError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let len_bytes: [u8; 4] = raw
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("file too short for header length"))?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_end = 4usize
        .checked_add(header_len)
        .filter(|end| *end <= raw.len())
        .ok_or_else(|| invalid("truncated header"))?;

    let (header, _): (SnapshotHeader, usize) =
        bincode::serde::decode_from_slice(&raw[4..header_end], bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;

    if header.magic != SNAPSHOT_MAGIC {
        return Err(invalid("missing magic bytes"));
    }
    if header.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(invalid(&format!(
            "unsupported format version {}",
            header.format_version
        )));
    }
    if header.tool_version != tool_version {
        return Err(CacheError::VersionMismatch {
            path: path.to_path_buf(),
            expected: tool_version.to_string(),
            actual: header.tool_version,
        });
    }

    let payload = &raw[header_end..];
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(CacheError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let (value, _): (T, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(|e| {
            CacheError::Serialization {
                reason: e.to_string(),
            }
        })?;
    Ok(value)
}

/// Writes `value` to `path`, creating the parent directory if needed.
pub fn write<T: Serialize>(path: &Path, value: &T, tool_version: &str) -> Result<(), CacheError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| CacheError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    let bytes = encode(value, tool_version)?;
    std::fs::write(path, bytes).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Reads and decodes the snapshot at `path`.
pub fn read<T: DeserializeOwned>(path: &Path, tool_version: &str) -> Result<T, CacheError> {
    let raw = std::fs::read(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    decode(&raw, path, tool_version)
}
