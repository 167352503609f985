//! Configuration types built from `project.xml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Namespace URI of the bacch project vocabulary.
pub const BACCH_NS: &str = "http://avoceteditors.com/2016/bacch";

/// Namespace URI of DocBook 5.
pub const BOOK_NS: &str = "http://docbook.org/ns/docbook";

/// Namespace URI of XInclude.
pub const XI_NS: &str = "http://www.w3.org/2001/XInclude";

/// Namespace URI bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Language assumed for resources that do not declare `lang`.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Title used when the descriptor has no `book:info/book:title`.
pub const DEFAULT_TITLE: &str = "Untitled";

/// The project configuration parsed from `project.xml`.
///
/// Besides the declared sections, a `Config` remembers the descriptor's
/// modification time at the moment it was built. The build cache compares
/// that timestamp against the descriptor on disk to decide whether a
/// persisted `Config` can be reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Declared resources keyed by id, in declaration order.
    pub resources: IndexMap<String, ResourceSpec>,
    /// Declared build outputs keyed by id.
    pub builds: BTreeMap<String, BuildSpec>,
    /// Prompt groups keyed by id.
    pub prompts: BTreeMap<String, PromptSet>,
    /// Declared books keyed by id.
    pub books: BTreeMap<String, BookMeta>,
    /// Prefix to URI bindings used when querying the descriptor.
    pub namespaces: BTreeMap<String, String>,
    /// Project title and slogan.
    pub meta: ProjectMeta,
    /// Descriptor modification time read while this `Config` was built.
    pub captured_mtime: SystemTime,
    /// The request of the invocation that last loaded this `Config`.
    pub invocation_args: Option<InvocationArgs>,
}

impl Config {
    /// Returns the single resource carrying the source role.
    ///
    /// Exactly one source resource must be declared: none is reported as
    /// [`ConfigError::MissingSourceResource`], two or more as
    /// [`ConfigError::AmbiguousSourceResource`].
    pub fn source_resource(&self) -> Result<&ResourceSpec, ConfigError> {
        let mut sources = self.resources.values().filter(|r| r.role.is_source());
        let first = sources.next().ok_or(ConfigError::MissingSourceResource)?;
        if let Some(second) = sources.next() {
            return Err(ConfigError::AmbiguousSourceResource {
                first: first.name.clone(),
                second: second.name.clone(),
            });
        }
        Ok(first)
    }

    /// Attaches the request of the current invocation.
    pub fn attach_args(&mut self, args: InvocationArgs) {
        self.invocation_args = Some(args);
    }
}

/// A named content or output area declared in the descriptor.
///
/// The same entity serves the content registry (which only needs the source
/// directory) and the project's target resolver (which needs every field).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Resource id, unique within the descriptor.
    pub name: String,
    /// Absolute directory of the resource.
    pub path: PathBuf,
    /// Language code of the resource's documents.
    pub language: String,
    /// What the resource is used for.
    pub role: ResourceRole,
}

/// The function tag of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceRole {
    /// Canonical source documents (`src` or `source`).
    Source,
    /// Any other role, kept verbatim (e.g. `out`, `html`).
    Other(String),
}

impl ResourceRole {
    /// Parses a role or type attribute value.
    pub fn parse(value: &str) -> Self {
        match value {
            "src" | "source" => Self::Source,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns `true` for the source role.
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source)
    }

    /// Returns the role as written in descriptors.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Source => "src",
            Self::Other(s) => s,
        }
    }
}

/// A declared build output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSpec {
    /// Output path, as written in the descriptor.
    pub path: String,
    /// Build type (e.g. `book`, `article`).
    pub kind: String,
    /// Output format (e.g. `html`, `pdf`).
    pub format: String,
}

/// Primary and secondary prompt strings of a prompt group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSet {
    /// Prompt with role `1`.
    pub primary: String,
    /// Prompt with role `2`.
    pub secondary: String,
}

/// Per-book metadata. Reserved; books currently carry no fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMeta {}

/// Presentation metadata of the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// Project title.
    pub title: String,
    /// Optional project slogan.
    pub slogan: Option<String>,
}

impl Default for ProjectMeta {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            slogan: None,
        }
    }
}

/// The caller's request for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationArgs {
    /// Path to the descriptor.
    pub source: PathBuf,
    /// Working directory that resource ids are resolved against.
    pub wdir: PathBuf,
    /// Discard any persisted state and rebuild.
    pub sync: bool,
    /// Requested build target, if any.
    pub build: Option<String>,
}

impl InvocationArgs {
    /// Creates arguments for `source` with the working directory set to the
    /// descriptor's own directory.
    pub fn for_descriptor(source: &Path) -> Self {
        let wdir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            source: source.to_path_buf(),
            wdir,
            sync: false,
            build: None,
        }
    }
}

/// The namespace bindings every descriptor is queried with.
pub fn standard_namespaces() -> BTreeMap<String, String> {
    [("bacch", BACCH_NS), ("book", BOOK_NS), ("xi", XI_NS)]
        .into_iter()
        .map(|(prefix, uri)| (prefix.to_string(), uri.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str, role: &str) -> ResourceSpec {
        ResourceSpec {
            name: name.to_string(),
            path: PathBuf::from("/book").join(name),
            language: DEFAULT_LANGUAGE.to_string(),
            role: ResourceRole::parse(role),
        }
    }

    fn config_with(resources: &[(&str, &str)]) -> Config {
        Config {
            resources: resources
                .iter()
                .map(|(n, r)| (n.to_string(), resource(n, r)))
                .collect(),
            builds: BTreeMap::new(),
            prompts: BTreeMap::new(),
            books: BTreeMap::new(),
            namespaces: standard_namespaces(),
            meta: ProjectMeta::default(),
            captured_mtime: SystemTime::UNIX_EPOCH,
            invocation_args: None,
        }
    }

    #[test]
    fn role_aliases() {
        assert!(ResourceRole::parse("src").is_source());
        assert!(ResourceRole::parse("source").is_source());
        assert_eq!(ResourceRole::parse("out"), ResourceRole::Other("out".into()));
        assert_eq!(ResourceRole::parse("source").as_str(), "src");
        assert_eq!(ResourceRole::parse("html").as_str(), "html");
    }

    #[test]
    fn single_source_resource() {
        let config = config_with(&[("manuscript", "src"), ("html", "out")]);
        assert_eq!(config.source_resource().unwrap().name, "manuscript");
    }

    #[test]
    fn no_source_resource() {
        let config = config_with(&[("html", "out")]);
        assert!(matches!(
            config.source_resource(),
            Err(ConfigError::MissingSourceResource)
        ));
    }

    #[test]
    fn two_source_resources() {
        let config = config_with(&[("manuscript", "src"), ("drafts", "source")]);
        match config.source_resource() {
            Err(ConfigError::AmbiguousSourceResource { first, second }) => {
                assert_eq!(first, "manuscript");
                assert_eq!(second, "drafts");
            }
            other => panic!("expected AmbiguousSourceResource, got {other:?}"),
        }
    }

    #[test]
    fn default_meta() {
        let meta = ProjectMeta::default();
        assert_eq!(meta.title, "Untitled");
        assert!(meta.slogan.is_none());
    }

    #[test]
    fn args_for_descriptor_uses_parent_dir() {
        let args = InvocationArgs::for_descriptor(Path::new("/home/me/book/project.xml"));
        assert_eq!(args.wdir, PathBuf::from("/home/me/book"));
        assert!(!args.sync);
        assert!(args.build.is_none());
    }

    #[test]
    fn args_for_bare_descriptor_uses_dot() {
        let args = InvocationArgs::for_descriptor(Path::new("project.xml"));
        assert_eq!(args.wdir, PathBuf::from("."));
    }

    #[test]
    fn standard_namespace_prefixes() {
        let ns = standard_namespaces();
        assert_eq!(ns["bacch"], BACCH_NS);
        assert_eq!(ns["book"], BOOK_NS);
        assert_eq!(ns["xi"], XI_NS);
    }
}
