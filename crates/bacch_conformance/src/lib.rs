//! Workflow test helpers for bacch projects.
//!
//! Provides an on-disk [`ProjectFixture`] that lays out a descriptor and
//! resource directories in a temporary directory and drives them through the
//! build cache and project loader the same way the CLI does.

#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use bacch_cache::{BuildCache, CacheError};
use bacch_config::InvocationArgs;
use bacch_project::{Project, ProjectError, ResourcePolicy};
use tempfile::TempDir;

/// A DocBook chapter with the given title.
pub fn chapter(title: &str) -> String {
    format!(r#"<chapter xmlns="http://docbook.org/ns/docbook"><title>{title}</title></chapter>"#)
}

/// Renders a descriptor declaring `resources` (raw `bacch:resource` elements).
pub fn descriptor(title: &str, resources: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://avoceteditors.com/2016/bacch"
         xmlns:book="http://docbook.org/ns/docbook">
  <book:info>
    <book:title>{title}</book:title>
  </book:info>
  <config>
    <resources>
      {resources}
    </resources>
    <prompts>
      <prompt id="default">
        <ps role="1">bacch&gt; </ps>
        <ps role="2">... </ps>
      </prompt>
    </prompts>
    <builds>
      <build id="html" path="html" type="book" format="html"/>
    </builds>
    <book id="long-road"/>
  </config>
</project>
"#
    )
}

/// The two-resource layout used by most scenarios: a `manuscript` source
/// resource in `./src` and an `html` output resource in `./html`.
pub const MANUSCRIPT_AND_HTML: &str = r#"<resource id="manuscript" role="src" path="src"/>
      <resource id="html" role="out" path="html"/>"#;

/// A project laid out in a temporary directory.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    /// Creates an empty fixture.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// Creates the standard scenario: `manuscript` and `html` resources with
    /// `chapter1.xml` and `chapter2.xml` in the source directory.
    pub fn manuscript() -> Self {
        let fixture = Self::new();
        fixture.write_descriptor(&descriptor("The Long Road", MANUSCRIPT_AND_HTML));
        fixture.mkdir("html");
        fixture.write("src/chapter1.xml", &chapter("Departure"));
        fixture.write("src/chapter2.xml", &chapter("Arrival"));
        fixture
    }

    /// Root of the fixture.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative` inside the fixture.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Path of the descriptor.
    pub fn descriptor_path(&self) -> PathBuf {
        self.path(bacch_config::DESCRIPTOR_FILE)
    }

    /// Path of the cache snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        bacch_cache::snapshot::snapshot_path(self.root())
    }

    /// Creates a directory and its parents.
    pub fn mkdir(&self, relative: &str) {
        std::fs::create_dir_all(self.path(relative)).expect("failed to create dir");
    }

    /// Writes a file, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create dir");
        }
        std::fs::write(path, content).expect("failed to write file");
    }

    /// Writes the descriptor.
    pub fn write_descriptor(&self, content: &str) {
        self.write(bacch_config::DESCRIPTOR_FILE, content);
    }

    /// Sets the modification time of `relative` to `secs` seconds from now.
    pub fn touch_later(&self, relative: &str, secs: u64) {
        let file = std::fs::File::options()
            .write(true)
            .open(self.path(relative))
            .expect("failed to open file");
        file.set_modified(SystemTime::now() + Duration::from_secs(secs))
            .expect("failed to set mtime");
    }

    /// Invocation arguments for this fixture.
    pub fn args(&self, sync: bool) -> InvocationArgs {
        let mut args = InvocationArgs::for_descriptor(&self.descriptor_path());
        args.sync = sync;
        args
    }

    /// Loads the build cache.
    pub fn load(&self) -> Result<BuildCache, CacheError> {
        BuildCache::load(self.args(false))
    }

    /// Loads the build cache with a forced resync.
    pub fn resync(&self) -> Result<BuildCache, CacheError> {
        BuildCache::load(self.args(true))
    }

    /// Builds a project from a loaded cache.
    pub fn project(&self, cache: &BuildCache) -> Result<Project, ProjectError> {
        Project::from_config(cache.config(), ResourcePolicy::default())
    }

    /// Raw bytes of the cache snapshot.
    pub fn snapshot_bytes(&self) -> Vec<u8> {
        std::fs::read(self.snapshot_path()).expect("failed to read snapshot")
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
