//! Per-document staleness tracking.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bacch_common::{ContentHash, DOCUMENT_EXT};
use bacch_config::ResourceSpec;
use serde::{Deserialize, Serialize};

/// Result of the most recent [`ContentEntry::check_status`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Not checked during this invocation.
    #[default]
    Unchecked,
    /// Content is identical to the last recorded check.
    Fresh,
    /// Content is new or changed since the last recorded check.
    Stale,
    /// The document could not be read.
    Missing,
}

/// Tracks one source document across invocations.
///
/// The entry records the document's modification time and content hash as
/// of its last check. The status itself is derived anew on every
/// invocation and is not persisted, so loading an unchanged project twice
/// writes the same snapshot bytes both times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Logical document name (file stem).
    name: String,

    /// Absolute path of the document.
    path: PathBuf,

    /// Language of the owning source resource.
    language: String,

    /// Modification time seen at the last successful check.
    mtime: Option<SystemTime>,

    /// Content hash seen at the last successful check.
    content_hash: Option<ContentHash>,

    #[serde(skip)]
    status: EntryStatus,
}

impl ContentEntry {
    /// Creates an unchecked entry for document `name` in the source resource.
    pub fn new(name: &str, source: &ResourceSpec) -> Self {
        Self {
            name: name.to_string(),
            path: source.path.join(format!("{name}.{DOCUMENT_EXT}")),
            language: source.language.clone(),
            mtime: None,
            content_hash: None,
            status: EntryStatus::Unchecked,
        }
    }

    /// Re-validates the entry against the filesystem.
    ///
    /// An unchanged modification time with a known hash short-circuits to
    /// [`EntryStatus::Fresh`]. Otherwise the document is hashed and compared
    /// with the hash recorded at the previous check.
    pub fn check_status(&mut self) {
        let mtime = match bacch_common::modified_time(&self.path) {
            Ok(mtime) => mtime,
            Err(e) => {
                log::debug!("{}: {e}", self.path.display());
                self.status = EntryStatus::Missing;
                return;
            }
        };

        if self.mtime == Some(mtime) && self.content_hash.is_some() {
            self.status = EntryStatus::Fresh;
            return;
        }

        match ContentHash::from_file(&self.path) {
            Ok(hash) => {
                self.status = if self.content_hash == Some(hash) {
                    EntryStatus::Fresh
                } else {
                    EntryStatus::Stale
                };
                self.content_hash = Some(hash);
                self.mtime = Some(mtime);
            }
            Err(e) => {
                log::debug!("{}: {e}", self.path.display());
                self.status = EntryStatus::Missing;
            }
        }
    }

    /// Logical document name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Language of the document.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Status from the most recent check in this invocation.
    pub fn status(&self) -> EntryStatus {
        self.status
    }

    /// Returns `true` if the document must be recompiled.
    pub fn is_stale(&self) -> bool {
        self.status == EntryStatus::Stale
    }

    /// Content hash recorded at the last successful check.
    pub fn content_hash(&self) -> Option<ContentHash> {
        self.content_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bacch_config::ResourceRole;
    use std::fs::File;
    use std::time::Duration;

    fn source(dir: &Path) -> ResourceSpec {
        ResourceSpec {
            name: "manuscript".to_string(),
            path: dir.to_path_buf(),
            language: "de".to_string(),
            role: ResourceRole::Source,
        }
    }

    fn touch_later(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn new_entry_is_bound_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let entry = ContentEntry::new("chapter1", &source(dir.path()));
        assert_eq!(entry.name(), "chapter1");
        assert_eq!(entry.path(), dir.path().join("chapter1.xml"));
        assert_eq!(entry.language(), "de");
        assert_eq!(entry.status(), EntryStatus::Unchecked);
        assert!(entry.content_hash().is_none());
    }

    #[test]
    fn first_check_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chapter1.xml"), "<chapter/>").unwrap();
        let mut entry = ContentEntry::new("chapter1", &source(dir.path()));

        entry.check_status();
        assert_eq!(entry.status(), EntryStatus::Stale);
        assert_eq!(
            entry.content_hash(),
            Some(ContentHash::from_bytes(b"<chapter/>"))
        );
    }

    #[test]
    fn unchanged_document_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chapter1.xml"), "<chapter/>").unwrap();
        let mut entry = ContentEntry::new("chapter1", &source(dir.path()));

        entry.check_status();
        entry.check_status();
        assert_eq!(entry.status(), EntryStatus::Fresh);
        assert!(!entry.is_stale());
    }

    #[test]
    fn touched_but_identical_document_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapter1.xml");
        std::fs::write(&path, "<chapter/>").unwrap();
        let mut entry = ContentEntry::new("chapter1", &source(dir.path()));
        entry.check_status();

        touch_later(&path, 10);
        entry.check_status();
        assert_eq!(entry.status(), EntryStatus::Fresh);
    }

    #[test]
    fn edited_document_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapter1.xml");
        std::fs::write(&path, "<chapter/>").unwrap();
        let mut entry = ContentEntry::new("chapter1", &source(dir.path()));
        entry.check_status();

        std::fs::write(&path, "<chapter><para/></chapter>").unwrap();
        touch_later(&path, 10);
        entry.check_status();
        assert!(entry.is_stale());
    }

    #[test]
    fn deleted_document_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapter1.xml");
        std::fs::write(&path, "<chapter/>").unwrap();
        let mut entry = ContentEntry::new("chapter1", &source(dir.path()));
        entry.check_status();

        std::fs::remove_file(&path).unwrap();
        entry.check_status();
        assert_eq!(entry.status(), EntryStatus::Missing);
        assert!(entry.content_hash().is_some());
    }

    #[test]
    fn status_is_not_serialized() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chapter1.xml"), "<chapter/>").unwrap();
        let mut entry = ContentEntry::new("chapter1", &source(dir.path()));
        entry.check_status();

        let bytes = bincode::serde::encode_to_vec(&entry, bincode::config::standard()).unwrap();
        let (back, _): (ContentEntry, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(back.status(), EntryStatus::Unchecked);
        assert_eq!(back.content_hash(), entry.content_hash());
    }
}
