//! Reconciliation of content entries with the source directory.

use std::collections::BTreeMap;

use bacch_config::Config;
use serde::Serialize;

use crate::entry::ContentEntry;
use crate::error::CacheError;

/// What a [`scan`] did to the content mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Documents seen for the first time; a new entry was created.
    pub created: Vec<String>,
    /// Documents that already had an entry; it was re-checked in place.
    pub revalidated: Vec<String>,
}

impl ScanReport {
    /// Returns `true` if the scan saw a document named `name`.
    pub fn saw(&self, name: &str) -> bool {
        self.created.iter().chain(&self.revalidated).any(|n| n == name)
    }
}

/// Scans the source resource and reconciles `content` with it.
///
/// Every document found gets exactly one entry: an existing entry is asked
/// to re-check its status, a missing one is created bound to the source
/// resource and checked immediately. Entries whose document has disappeared
/// are left untouched. No compilation happens here.
pub fn scan(
    config: &Config,
    content: &mut BTreeMap<String, ContentEntry>,
) -> Result<ScanReport, CacheError> {
    let source = config.source_resource()?;
    let names = bacch_common::list_documents(&source.path).map_err(|e| CacheError::Io {
        path: source.path.clone(),
        source: e,
    })?;

    let mut report = ScanReport::default();
    for name in names {
        match content.get_mut(&name) {
            Some(entry) => {
                entry.check_status();
                report.revalidated.push(name);
            }
            None => {
                let mut entry = ContentEntry::new(&name, source);
                entry.check_status();
                content.insert(name.clone(), entry);
                report.created.push(name);
            }
        }
    }

    log::debug!(
        "scanned {}: {} new, {} revalidated",
        source.path.display(),
        report.created.len(),
        report.revalidated.len()
    );
    Ok(report)
}
