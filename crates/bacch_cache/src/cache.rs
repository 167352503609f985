//! The persisted build cache.
//!
//! [`BuildCache::load`] is the single entry point of an invocation: it
//! decides whether the snapshot on disk can be reused, rebuilds the
//! configuration and content registry when it cannot, revalidates every
//! tracked document either way, and persists the result before returning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bacch_config::{Config, ConfigError, InvocationArgs};
use serde::{Deserialize, Serialize};

use crate::entry::ContentEntry;
use crate::error::CacheError;
use crate::registry::{self, ScanReport};
use crate::snapshot;

/// Version recorded in snapshots; a mismatch forces a rebuild.
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Why [`BuildCache::load`] reused or rebuilt its state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheOrigin {
    /// No readable snapshot; everything was rebuilt.
    #[default]
    Missing,
    /// The descriptor changed after the snapshot was taken.
    DescriptorChanged,
    /// The snapshot was taken for another descriptor.
    SourceChanged,
    /// The snapshot was taken for another working directory.
    WorkdirChanged,
    /// The caller asked for a resync.
    Resync,
    /// The snapshot was reused and its entries revalidated.
    Reused,
}

impl CacheOrigin {
    /// Returns `true` if the configuration was rebuilt from the descriptor.
    pub fn is_rebuild(&self) -> bool {
        !matches!(self, Self::Reused)
    }
}

/// Configuration plus per-document entries, persisted between invocations.
///
/// Callers own one instance per invocation. Only `content` and `config` are
/// written to disk; the origin, scan report, and snapshot location describe
/// the current invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildCache {
    content: BTreeMap<String, ContentEntry>,
    config: Config,

    #[serde(skip)]
    origin: CacheOrigin,

    #[serde(skip)]
    report: ScanReport,

    #[serde(skip)]
    snapshot_path: PathBuf,
}

impl BuildCache {
    /// Loads, reconciles, and persists the cache for `args`.
    ///
    /// An unreadable snapshot, a descriptor newer than the captured
    /// configuration, another descriptor or working directory than the
    /// snapshot was taken for, or `args.sync` all lead
    /// to a full rebuild. Otherwise the snapshot is kept and its entries are
    /// revalidated. Rebuild and scan errors are fatal and nothing is written
    /// when they occur.
    pub fn load(args: InvocationArgs) -> Result<Self, CacheError> {
        let args = absolute_args(args)?;
        let snapshot_path = snapshot::snapshot_path(&args.wdir);

        let previous = match snapshot::read::<BuildCache>(&snapshot_path, TOOL_VERSION) {
            Ok(previous) => Some(previous),
            Err(e) => {
                log::debug!("build cache miss: {e}");
                None
            }
        };

        let (content, config, origin) = match previous {
            Some(previous) => {
                let descriptor_mtime =
                    bacch_common::modified_time(&args.source).map_err(ConfigError::from)?;
                match previous.invalidation(&args, descriptor_mtime) {
                    Some(origin) => (BTreeMap::new(), rebuild_config(&args)?, origin),
                    None => (previous.content, previous.config, CacheOrigin::Reused),
                }
            }
            None => (BTreeMap::new(), rebuild_config(&args)?, CacheOrigin::Missing),
        };
        log::debug!("build cache origin: {origin:?}");

        let mut cache = Self {
            content,
            config,
            origin,
            report: ScanReport::default(),
            snapshot_path,
        };
        cache.report = registry::scan(&cache.config, &mut cache.content)?;
        cache.config.attach_args(args);
        cache.save()?;
        Ok(cache)
    }

    /// Returns the reason this snapshot can no longer be used, if any.
    fn invalidation(&self, args: &InvocationArgs, descriptor_mtime: SystemTime) -> Option<CacheOrigin> {
        if args.sync {
            return Some(CacheOrigin::Resync);
        }
        if descriptor_mtime > self.config.captured_mtime {
            return Some(CacheOrigin::DescriptorChanged);
        }
        let previous = self.config.invocation_args.as_ref();
        if previous.map(|a| &a.source) != Some(&args.source) {
            return Some(CacheOrigin::SourceChanged);
        }
        if previous.map(|a| &a.wdir) != Some(&args.wdir) {
            return Some(CacheOrigin::WorkdirChanged);
        }
        None
    }

    /// Persists the cache to its snapshot file.
    pub fn save(&self) -> Result<(), CacheError> {
        snapshot::write(&self.snapshot_path, self, TOOL_VERSION)
    }

    /// Removes the cache directory under `wdir`.
    ///
    /// Returns `false` if there was nothing to remove.
    pub fn clear(wdir: &Path) -> Result<bool, CacheError> {
        let dir = wdir.join(snapshot::CACHE_DIR);
        if !dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir).map_err(|e| CacheError::Io {
            path: dir,
            source: e,
        })?;
        Ok(true)
    }

    /// The project configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// All tracked entries keyed by document name.
    pub fn content(&self) -> &BTreeMap<String, ContentEntry> {
        &self.content
    }

    /// The entry for document `name`.
    pub fn entry(&self, name: &str) -> Option<&ContentEntry> {
        self.content.get(name)
    }

    /// Entries whose document changed since the previous invocation.
    pub fn stale_entries(&self) -> impl Iterator<Item = &ContentEntry> {
        self.content.values().filter(|e| e.is_stale())
    }

    /// Names of tracked entries whose document was not found by this scan.
    pub fn orphaned(&self) -> Vec<&str> {
        self.content
            .keys()
            .filter(|name| !self.report.saw(name))
            .map(String::as_str)
            .collect()
    }

    /// How this cache was obtained.
    pub fn origin(&self) -> CacheOrigin {
        self.origin
    }

    /// What the registry scan of this invocation did.
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// Location of the snapshot file.
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}

fn rebuild_config(args: &InvocationArgs) -> Result<Config, CacheError> {
    log::info!("rebuilding configuration from {}", args.source.display());
    Ok(bacch_config::load_config(&args.source, &args.wdir)?)
}

/// Makes the descriptor and working directory absolute so snapshots do not
/// depend on the directory the tool was started from.
fn absolute_args(args: InvocationArgs) -> Result<InvocationArgs, CacheError> {
    let absolute = |path: &Path| {
        std::path::absolute(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    };
    Ok(InvocationArgs {
        source: absolute(&args.source)?,
        wdir: absolute(&args.wdir)?,
        ..args
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryStatus;
    use std::fs::File;
    use std::time::Duration;

    const DESCRIPTOR: &str = r#"<bacch:project xmlns:bacch="http://avoceteditors.com/2016/bacch">
  <bacch:config>
    <bacch:resources>
      <bacch:resource id="src" role="src"/>
      <bacch:resource id="html" role="out"/>
    </bacch:resources>
    <bacch:prompts>
      <bacch:prompt id="shell"><bacch:ps role="1">$ </bacch:ps></bacch:prompt>
    </bacch:prompts>
    <bacch:builds>
      <bacch:build id="web" path="build/web" type="book" format="html"/>
    </bacch:builds>
  </bacch:config>
</bacch:project>"#;

    fn make_project() -> (tempfile::TempDir, InvocationArgs) {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::create_dir(dir.path().join("html")).unwrap();
        std::fs::write(src.join("chapter1.xml"), "<chapter/>").unwrap();
        std::fs::write(src.join("chapter2.xml"), "<chapter/>").unwrap();
        let descriptor = dir.path().join("project.xml");
        std::fs::write(&descriptor, DESCRIPTOR).unwrap();
        let args = InvocationArgs::for_descriptor(&descriptor);
        (dir, args)
    }

    fn touch_later(path: &Path) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();
    }

    #[test]
    fn first_load_builds_everything() {
        let (_dir, args) = make_project();
        let cache = BuildCache::load(args).unwrap();

        assert_eq!(cache.origin(), CacheOrigin::Missing);
        assert_eq!(cache.report().created, vec!["chapter1", "chapter2"]);
        assert_eq!(cache.stale_entries().count(), 2);
        assert!(cache.snapshot_path().exists());
        assert!(cache.config().invocation_args.is_some());
    }

    #[test]
    fn second_load_reuses_config() {
        let (_dir, args) = make_project();
        let first = BuildCache::load(args.clone()).unwrap();
        let second = BuildCache::load(args).unwrap();

        assert_eq!(second.origin(), CacheOrigin::Reused);
        assert_eq!(second.config().resources, first.config().resources);
        assert_eq!(second.config().builds, first.config().builds);
        assert_eq!(second.config().prompts, first.config().prompts);
        assert_eq!(
            second.config().captured_mtime,
            first.config().captured_mtime
        );
        assert!(second.report().created.is_empty());
        assert_eq!(second.report().revalidated, vec!["chapter1", "chapter2"]);
        assert!(second
            .content()
            .values()
            .all(|e| e.status() == EntryStatus::Fresh));
    }

    #[test]
    fn repeated_loads_write_identical_bytes() {
        let (_dir, args) = make_project();
        let first = BuildCache::load(args.clone()).unwrap();
        let bytes_first = std::fs::read(first.snapshot_path()).unwrap();
        let second = BuildCache::load(args).unwrap();
        let bytes_second = std::fs::read(second.snapshot_path()).unwrap();
        assert_eq!(bytes_first, bytes_second);
    }

    #[test]
    fn newer_descriptor_rebuilds() {
        let (_dir, args) = make_project();
        BuildCache::load(args.clone()).unwrap();

        touch_later(&args.source);
        let cache = BuildCache::load(args.clone()).unwrap();
        let on_disk = std::fs::metadata(&args.source).unwrap().modified().unwrap();

        assert_eq!(cache.origin(), CacheOrigin::DescriptorChanged);
        assert_eq!(cache.config().captured_mtime, on_disk);
        assert_eq!(cache.report().created, vec!["chapter1", "chapter2"]);
    }

    #[test]
    fn other_descriptor_in_same_wdir_rebuilds() {
        let (dir, args) = make_project();
        BuildCache::load(args.clone()).unwrap();

        let drafts = dir.path().join("drafts");
        std::fs::create_dir(&drafts).unwrap();
        std::fs::write(drafts.join("outline.xml"), "<chapter/>").unwrap();
        let alt = dir.path().join("alt.xml");
        std::fs::write(
            &alt,
            DESCRIPTOR.replace(r#"id="src" role="src""#, r#"id="drafts" role="src""#),
        )
        .unwrap();
        File::options()
            .write(true)
            .open(&alt)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(10))
            .unwrap();

        let cache = BuildCache::load(InvocationArgs {
            source: alt.clone(),
            ..args
        })
        .unwrap();
        assert_eq!(cache.origin(), CacheOrigin::SourceChanged);
        assert_eq!(cache.report().created, vec!["outline"]);
        assert!(cache.entry("chapter1").is_none());
        assert_eq!(
            cache.config().invocation_args.as_ref().map(|a| a.source.clone()),
            Some(alt)
        );
    }

    #[test]
    fn resync_rebuilds() {
        let (_dir, args) = make_project();
        BuildCache::load(args.clone()).unwrap();

        let cache = BuildCache::load(InvocationArgs { sync: true, ..args }).unwrap();
        assert_eq!(cache.origin(), CacheOrigin::Resync);
        assert_eq!(cache.report().created.len(), 2);
    }

    #[test]
    fn corrupt_snapshot_behaves_like_first_run() {
        let (dir, args) = make_project();
        let path = snapshot::snapshot_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"\x07\x00\x00\x00garbage").unwrap();

        let cache = BuildCache::load(args).unwrap();
        assert_eq!(cache.origin(), CacheOrigin::Missing);
        assert_eq!(cache.report().created, vec!["chapter1", "chapter2"]);
    }

    #[test]
    fn edited_document_is_the_only_stale_entry() {
        let (dir, args) = make_project();
        BuildCache::load(args.clone()).unwrap();

        let chapter2 = dir.path().join("src/chapter2.xml");
        std::fs::write(&chapter2, "<chapter><para>new</para></chapter>").unwrap();
        touch_later(&chapter2);

        let cache = BuildCache::load(args).unwrap();
        let stale: Vec<_> = cache.stale_entries().map(|e| e.name()).collect();
        assert_eq!(stale, vec!["chapter2"]);
    }

    #[test]
    fn deleted_document_is_orphaned_not_pruned() {
        let (dir, args) = make_project();
        BuildCache::load(args.clone()).unwrap();

        std::fs::remove_file(dir.path().join("src/chapter1.xml")).unwrap();
        let cache = BuildCache::load(args).unwrap();
        assert!(cache.entry("chapter1").is_some());
        assert_eq!(cache.orphaned(), vec!["chapter1"]);
    }

    #[test]
    fn rebuild_failure_writes_nothing() {
        let (dir, args) = make_project();
        std::fs::write(
            &args.source,
            DESCRIPTOR.replace(r#"role="out""#, r#"role="src""#),
        )
        .unwrap();

        let err = BuildCache::load(args).unwrap_err();
        assert!(matches!(
            err,
            CacheError::Config(ConfigError::AmbiguousSourceResource { .. })
        ));
        assert!(!snapshot::snapshot_path(dir.path()).exists());
    }

    #[test]
    fn clear_removes_cache_dir() {
        let (dir, args) = make_project();
        BuildCache::load(args).unwrap();

        assert!(BuildCache::clear(dir.path()).unwrap());
        assert!(!dir.path().join(snapshot::CACHE_DIR).exists());
        assert!(!BuildCache::clear(dir.path()).unwrap());
    }

    #[test]
    fn origin_rebuild_flag() {
        assert!(CacheOrigin::Missing.is_rebuild());
        assert!(CacheOrigin::Resync.is_rebuild());
        assert!(CacheOrigin::SourceChanged.is_rebuild());
        assert!(!CacheOrigin::Reused.is_rebuild());
    }
}
