//! Content hashing for staleness detection and snapshot integrity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A 128-bit content hash computed using XXH3.
///
/// Two documents with the same `ContentHash` are assumed to have identical
/// content. Content entries record one per source document so that a
/// touched-but-unchanged file is not reported stale, and cache snapshots
/// carry one over their payload to detect corruption.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Reads a file and hashes its full contents.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        Ok(Self::from_bytes(&content))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}
