//! Filesystem helpers shared by the descriptor loader and the build cache.

use std::path::Path;
use std::time::SystemTime;

/// File extension of source documents tracked by the content registry.
pub const DOCUMENT_EXT: &str = "xml";

/// Returns the last modification time of `path`.
pub fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Returns the logical document name for `path` if it carries the
/// document extension.
///
/// `chapter1.xml` yields `Some("chapter1")`; `notes.txt` and extensionless
/// names yield `None`.
pub fn document_stem(path: &Path) -> Option<&str> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    if ext != DOCUMENT_EXT {
        return None;
    }
    path.file_stem().and_then(|s| s.to_str())
}

/// Lists the logical names of the documents directly inside `dir`.
///
/// Only regular files with the document extension count; subdirectories are
/// not descended into. Names are sorted so callers see a stable order.
pub fn list_documents(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(stem) = document_stem(&path) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}
