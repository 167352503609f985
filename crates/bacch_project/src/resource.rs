//! Registered resources and their compile capabilities.

use std::path::Path;

use bacch_common::DOCUMENT_EXT;
use bacch_config::ResourceSpec;
use indexmap::IndexMap;

use crate::document::DocumentTree;
use crate::error::ProjectError;
use crate::sections::{self, SectionIndex};

/// Registered resources keyed by id, in registration order.
pub type Resources = IndexMap<String, Resource>;

/// Maps resource ids to directories for cross-resource includes.
pub trait ResourceDirs {
    /// Returns the directory of resource `name`, if registered.
    fn resource_dir(&self, name: &str) -> Option<&Path>;
}

impl ResourceDirs for Resources {
    fn resource_dir(&self, name: &str) -> Option<&Path> {
        self.get(name).map(|r| r.spec().path.as_path())
    }
}

/// A content resource whose documents are build targets.
#[derive(Debug, Clone)]
pub struct SourceResource {
    spec: ResourceSpec,
    documents: Vec<String>,
}

/// A resource that receives build output. It owns no targets.
#[derive(Debug, Clone)]
pub struct OutputResource {
    spec: ResourceSpec,
}

/// A registered resource.
#[derive(Debug, Clone)]
pub enum Resource {
    /// Holds source documents.
    Source(SourceResource),
    /// Receives build output.
    Output(OutputResource),
}

impl Resource {
    /// Registers the resource described by `spec`.
    ///
    /// Source resources list their documents once, at registration.
    pub fn from_spec(spec: &ResourceSpec) -> Result<Self, ProjectError> {
        if !spec.role.is_source() {
            return Ok(Self::Output(OutputResource { spec: spec.clone() }));
        }
        let documents = bacch_common::list_documents(&spec.path).map_err(|e| ProjectError::Io {
            path: spec.path.clone(),
            source: e,
        })?;
        Ok(Self::Source(SourceResource {
            spec: spec.clone(),
            documents,
        }))
    }

    /// The declaration this resource was registered from.
    pub fn spec(&self) -> &ResourceSpec {
        match self {
            Self::Source(r) => &r.spec,
            Self::Output(r) => &r.spec,
        }
    }

    /// The resource id.
    pub fn name(&self) -> &str {
        &self.spec().name
    }

    /// Names of the documents this resource can compile.
    pub fn documents(&self) -> &[String] {
        match self {
            Self::Source(r) => &r.documents,
            Self::Output(_) => &[],
        }
    }

    /// Returns `true` if this resource owns `target`.
    ///
    /// A source resource owns one target per document. With no target
    /// requested it answers for its only document, and declines when it holds
    /// several.
    pub fn find_target(&self, target: Option<&str>) -> bool {
        match (self, target) {
            (Self::Source(r), Some(name)) => r.documents.iter().any(|d| d == name),
            (Self::Source(r), None) => r.documents.len() == 1,
            (Self::Output(_), _) => false,
        }
    }

    /// Indexes the sections of every document.
    ///
    /// Documents that cannot be read or parsed are skipped with a warning.
    pub fn fetch_section_data(&self) -> SectionIndex {
        let mut index = SectionIndex::default();
        let Self::Source(r) = self else {
            return index;
        };

        for name in &r.documents {
            let path = r.document_path(name);
            let sections = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| sections::index_document(&text).map_err(|e| e.to_string()));
            match sections {
                Ok(sections) => {
                    index.documents.insert(name.clone(), sections);
                }
                Err(e) => log::warn!("skipping {} in section index: {e}", path.display()),
            }
        }
        index
    }

    /// Compiles `target` into an assembled document tree.
    ///
    /// `resources` resolves `res:` prefixed includes.
    pub fn compile(
        &self,
        resources: &Resources,
        target: Option<&str>,
    ) -> Result<DocumentTree, ProjectError> {
        let r = match self {
            Self::Source(r) => r,
            Self::Output(r) => return Err(ProjectError::NotCompilable(r.spec.name.clone())),
        };
        let name = match target {
            Some(name) => r.documents.iter().find(|d| *d == name),
            None if r.documents.len() == 1 => r.documents.first(),
            None => None,
        }
        .ok_or_else(|| ProjectError::UnknownTarget {
            resource: r.spec.name.clone(),
            target: target.map(str::to_string),
        })?;

        log::info!("compiling {}:{name}", r.spec.name);
        DocumentTree::assemble(&r.document_path(name), resources)
    }
}

impl SourceResource {
    fn document_path(&self, name: &str) -> std::path::PathBuf {
        self.spec.path.join(format!("{name}.{DOCUMENT_EXT}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bacch_config::ResourceRole;

    fn spec(name: &str, path: &Path, role: &str) -> ResourceSpec {
        ResourceSpec {
            name: name.to_string(),
            path: path.to_path_buf(),
            language: "en".to_string(),
            role: ResourceRole::parse(role),
        }
    }

    fn source_with(docs: &[(&str, &str)]) -> (tempfile::TempDir, Resource) {
        let dir = tempfile::tempdir().unwrap();
        for (name, text) in docs {
            std::fs::write(dir.path().join(format!("{name}.xml")), text).unwrap();
        }
        let resource = Resource::from_spec(&spec("manuscript", dir.path(), "src")).unwrap();
        (dir, resource)
    }

    const CHAPTER: &str =
        r#"<chapter xmlns="http://docbook.org/ns/docbook"><title>One</title></chapter>"#;

    #[test]
    fn source_owns_its_documents() {
        let (_dir, r) = source_with(&[("chapter1", CHAPTER), ("chapter2", CHAPTER)]);
        assert!(matches!(r, Resource::Source(_)));
        assert_eq!(r.documents(), ["chapter1", "chapter2"]);
        assert!(r.find_target(Some("chapter1")));
        assert!(!r.find_target(Some("chapter3")));
        assert!(!r.find_target(None));
    }

    #[test]
    fn single_document_is_default_target() {
        let (_dir, r) = source_with(&[("book", CHAPTER)]);
        assert!(r.find_target(None));
        let tree = r.compile(&Resources::new(), None).unwrap();
        assert_eq!(tree.root.name, "chapter");
    }

    #[test]
    fn output_owns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let r = Resource::from_spec(&spec("html", dir.path(), "out")).unwrap();
        assert!(matches!(r, Resource::Output(_)));
        assert!(!r.find_target(Some("html")));
        assert!(!r.find_target(None));
        assert!(r.fetch_section_data().is_empty());
        assert!(matches!(
            r.compile(&Resources::new(), Some("html")),
            Err(ProjectError::NotCompilable(ref name)) if name == "html"
        ));
    }

    #[test]
    fn compile_unknown_target() {
        let (_dir, r) = source_with(&[("chapter1", CHAPTER)]);
        let err = r.compile(&Resources::new(), Some("epilogue")).unwrap_err();
        assert!(matches!(err, ProjectError::UnknownTarget { .. }));
    }

    #[test]
    fn section_data_skips_broken_documents() {
        let (_dir, r) = source_with(&[("chapter1", CHAPTER), ("broken", "<chapter>")]);
        let index = r.fetch_section_data();
        assert_eq!(index.documents.keys().collect::<Vec<_>>(), ["chapter1"]);
        assert_eq!(index.sections("chapter1").unwrap()[0].title.as_deref(), Some("One"));
    }

    #[test]
    fn resources_resolve_directories() {
        let (dir, r) = source_with(&[("chapter1", CHAPTER)]);
        let mut resources = Resources::new();
        resources.insert(r.name().to_string(), r);
        assert_eq!(resources.resource_dir("manuscript"), Some(dir.path()));
        assert_eq!(resources.resource_dir("html"), None);
    }
}
