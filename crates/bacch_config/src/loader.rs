//! Descriptor loading and parsing.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use indexmap::IndexMap;
use roxmltree::Node;

use crate::error::ConfigError;
use crate::types::{
    standard_namespaces, BookMeta, BuildSpec, Config, ProjectMeta, PromptSet, ResourceRole,
    ResourceSpec, BACCH_NS, BOOK_NS, DEFAULT_LANGUAGE,
};
use crate::xml::{self, QName};

/// Conventional file name of the project descriptor.
pub const DESCRIPTOR_FILE: &str = "project.xml";

const CONFIG: QName = QName::new(BACCH_NS, "config");
const RESOURCES: QName = QName::new(BACCH_NS, "resources");
const PROMPTS: QName = QName::new(BACCH_NS, "prompts");
const PROMPT: QName = QName::new(BACCH_NS, "ps");
const BUILDS: QName = QName::new(BACCH_NS, "builds");
const BOOK: QName = QName::new(BACCH_NS, "book");
const SLOGAN: QName = QName::new(BACCH_NS, "slogan");
const INFO: QName = QName::new(BOOK_NS, "info");
const TITLE: QName = QName::new(BOOK_NS, "title");

/// Loads the descriptor at `descriptor` and builds a [`Config`].
///
/// Resource ids are resolved against `base_dir`, which is made absolute
/// first. The descriptor's modification time is read before its content, so
/// an edit racing with this call leaves a newer mtime on disk than the one
/// captured.
pub fn load_config(descriptor: &Path, base_dir: &Path) -> Result<Config, ConfigError> {
    let mtime = bacch_common::modified_time(descriptor)?;
    let content = xml::read_descriptor(descriptor)?;
    let base_dir = std::path::absolute(base_dir)?;
    log::debug!("parsing descriptor {}", descriptor.display());
    parse_descriptor(content.as_bytes(), mtime, &base_dir)
}

/// Parses descriptor bytes into a [`Config`] stamped with `mtime`.
///
/// The `bacch:config` section and its `bacch:prompts` and `bacch:builds`
/// children are required; their absence aborts with
/// [`ConfigError::MissingSection`]. `base_dir` is expected to be absolute.
pub fn parse_descriptor(
    content: &[u8],
    mtime: SystemTime,
    base_dir: &Path,
) -> Result<Config, ConfigError> {
    let text = std::str::from_utf8(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    let doc = xml::parse_xml(text)?;
    let root = doc.root_element();

    let config_node =
        xml::child(root, CONFIG).ok_or_else(|| ConfigError::MissingSection("bacch:config".into()))?;

    let resources = match xml::child(config_node, RESOURCES) {
        Some(node) => parse_resources(node, base_dir)?,
        None => IndexMap::new(),
    };

    let prompts_node = xml::child(config_node, PROMPTS)
        .ok_or_else(|| ConfigError::MissingSection("bacch:prompts".into()))?;
    let prompts = parse_prompts(prompts_node)?;

    let builds_node = xml::child(config_node, BUILDS)
        .ok_or_else(|| ConfigError::MissingSection("bacch:builds".into()))?;
    let builds = parse_builds(builds_node)?;

    let mut books = BTreeMap::new();
    for book in xml::children(config_node, BOOK) {
        let id = xml::require_attr(book, "id")?;
        books.insert(id.to_string(), BookMeta::default());
    }

    Ok(Config {
        resources,
        builds,
        prompts,
        books,
        namespaces: standard_namespaces(),
        meta: parse_meta(root),
        captured_mtime: mtime,
        invocation_args: None,
    })
}

/// Reads each resource element. `name`, `type`, and `path` are accepted in
/// place of `id` and `role`; without `path` the id doubles as the directory
/// relative to `base_dir`.
fn parse_resources(
    node: Node<'_, '_>,
    base_dir: &Path,
) -> Result<IndexMap<String, ResourceSpec>, ConfigError> {
    let mut resources = IndexMap::new();
    for element in xml::element_children(node) {
        let name = first_attr(element, "id", "name")?;
        let role = first_attr(element, "role", "type")?;
        let relative = xml::attr(element, "path").unwrap_or(name);
        let language = xml::attr(element, "lang").unwrap_or(DEFAULT_LANGUAGE);

        let spec = ResourceSpec {
            name: name.to_string(),
            path: normalize(&base_dir.join(relative)),
            language: language.to_string(),
            role: ResourceRole::parse(role),
        };
        if resources.insert(name.to_string(), spec).is_some() {
            log::warn!("resource '{name}' declared more than once; keeping the last declaration");
        }
    }
    Ok(resources)
}

/// Returns `primary`, falling back to its `alias`; the error names `primary`.
fn first_attr<'a>(node: Node<'a, '_>, primary: &str, alias: &str) -> Result<&'a str, ConfigError> {
    match xml::attr(node, alias) {
        Some(value) if node.attribute(primary).is_none() => Ok(value),
        _ => xml::require_attr(node, primary),
    }
}

fn parse_prompts(node: Node<'_, '_>) -> Result<BTreeMap<String, PromptSet>, ConfigError> {
    let mut prompts = BTreeMap::new();
    for group in xml::element_children(node) {
        let id = xml::require_attr(group, "id")?;
        let mut set = PromptSet::default();
        for prompt in xml::children(group, PROMPT) {
            let text = xml::text(prompt).to_string();
            match xml::require_attr(prompt, "role")? {
                "1" => set.primary = text,
                "2" => set.secondary = text,
                other => log::warn!("prompt group '{id}': ignoring prompt with role '{other}'"),
            }
        }
        prompts.insert(id.to_string(), set);
    }
    Ok(prompts)
}

fn parse_builds(node: Node<'_, '_>) -> Result<BTreeMap<String, BuildSpec>, ConfigError> {
    let mut builds = BTreeMap::new();
    for element in xml::element_children(node) {
        let id = xml::require_attr(element, "id")?;
        builds.insert(
            id.to_string(),
            BuildSpec {
                path: xml::require_attr(element, "path")?.to_string(),
                kind: xml::require_attr(element, "type")?.to_string(),
                format: xml::require_attr(element, "format")?.to_string(),
            },
        );
    }
    Ok(builds)
}

/// Title and slogan are optional; absent values keep the defaults.
fn parse_meta(root: Node<'_, '_>) -> ProjectMeta {
    let mut meta = ProjectMeta::default();
    if let Some(title) = xml::select(root, &[INFO, TITLE]).first() {
        meta.title = xml::text(*title).trim().to_string();
    }
    if let Some(slogan) = xml::select(root, &[INFO, SLOGAN]).first() {
        meta.slogan = Some(xml::text(*slogan).trim().to_string());
    }
    meta
}

/// Lexically removes `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
