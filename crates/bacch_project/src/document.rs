//! Owned document trees and XInclude assembly.
//!
//! `roxmltree` documents borrow their source text, so compiled targets are
//! converted into an owned [`Element`] tree that outlives the files it was
//! read from. While converting, `xi:include` elements are replaced by the
//! document they reference:
//!
//! - `href="part2.xml"` resolves against the including document's directory.
//! - `href="notes:glossary.xml"` resolves inside the resource named `notes`
//!   when `notes` is a registered resource, and may not leave its directory.
//! - `parse="text"` includes the referenced file as a text node.
//!
//! Remote references (`http://...`) are rejected.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use bacch_config::xml::{self, QName};
use bacch_config::{BACCH_NS, BOOK_NS, XI_NS, XML_NS};
use roxmltree::Node;

use crate::error::ProjectError;
use crate::resource::ResourceDirs;

const XI_INCLUDE: QName = QName::new(XI_NS, "include");

/// A compiled target: the assembled element tree of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTree {
    /// The document the tree was compiled from.
    pub source: PathBuf,
    /// The root element, with includes expanded.
    pub root: Element,
}

/// An element of an assembled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Namespace URI, if any.
    pub ns: Option<String>,
    /// Local name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
    /// Child elements and text.
    pub children: Vec<DocumentNode>,
}

/// An attribute of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, if any.
    pub ns: Option<String>,
    /// Local name.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentNode {
    /// A nested element.
    Element(Element),
    /// Character data.
    Text(String),
}

impl Element {
    /// Returns the child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            DocumentNode::Element(e) => Some(e),
            DocumentNode::Text(_) => None,
        })
    }

    /// Concatenates all text below this element.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            DocumentNode::Text(t) => out.push_str(t),
            DocumentNode::Element(e) => collect_text(e, out),
        }
    }
}

impl DocumentTree {
    /// Reads `path` and expands its includes.
    pub fn assemble(path: &Path, dirs: &dyn ResourceDirs) -> Result<Self, ProjectError> {
        let mut assembler = Assembler {
            dirs,
            stack: Vec::new(),
        };
        let root = assembler.load(path)?;
        Ok(Self {
            source: path.to_path_buf(),
            root,
        })
    }

    /// Serializes the tree as XML text, declaring every namespace it uses on
    /// the root element.
    pub fn to_xml(&self) -> String {
        let mut prefixes = BTreeMap::new();
        collect_namespaces(&self.root, &mut prefixes);

        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        write_element(&self.root, &prefixes, true, &mut out);
        out.push('\n');
        out
    }
}

struct Assembler<'a> {
    dirs: &'a dyn ResourceDirs,
    stack: Vec<PathBuf>,
}

impl Assembler<'_> {
    fn load(&mut self, path: &Path) -> Result<Element, ProjectError> {
        if self.stack.iter().any(|p| p == path) {
            return Err(ProjectError::IncludeCycle(path.to_path_buf()));
        }
        let text = read(path)?;
        let doc = xml::parse_document(&text).map_err(|e| ProjectError::Document {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        self.stack.push(path.to_path_buf());
        let root = self.convert(doc.root_element(), path)?;
        self.stack.pop();
        Ok(root)
    }

    fn convert(&mut self, node: Node<'_, '_>, path: &Path) -> Result<Element, ProjectError> {
        let mut children = Vec::new();
        for child in node.children() {
            if XI_INCLUDE.matches(child) {
                children.push(self.include(child, path)?);
            } else if child.is_element() {
                children.push(DocumentNode::Element(self.convert(child, path)?));
            } else if let Some(text) = child.text().filter(|_| child.is_text()) {
                children.push(DocumentNode::Text(text.to_string()));
            }
        }

        Ok(Element {
            ns: node.tag_name().namespace().map(str::to_string),
            name: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|a| Attribute {
                    ns: a.namespace().map(str::to_string),
                    name: a.name().to_string(),
                    value: a.value().to_string(),
                })
                .collect(),
            children,
        })
    }

    fn include(&mut self, node: Node<'_, '_>, path: &Path) -> Result<DocumentNode, ProjectError> {
        let href = node.attribute("href").ok_or_else(|| ProjectError::Document {
            path: path.to_path_buf(),
            reason: "xi:include without href".to_string(),
        })?;
        let target = self.resolve(href, path)?;
        log::debug!("including {} into {}", target.display(), path.display());

        if node.attribute("parse") == Some("text") {
            return Ok(DocumentNode::Text(read(&target)?));
        }
        Ok(DocumentNode::Element(self.load(&target)?))
    }

    fn resolve(&self, href: &str, path: &Path) -> Result<PathBuf, ProjectError> {
        let invalid = |reason: String| ProjectError::InvalidInclude {
            href: href.to_string(),
            path: path.to_path_buf(),
            reason,
        };

        let in_resource = href.split_once(':').and_then(|(resource, rest)| {
            self.dirs
                .resource_dir(resource)
                .map(|dir| (resource, dir, rest))
        });
        let target = match in_resource {
            Some((resource, dir, rest)) => {
                if !stays_inside(Path::new(rest)) {
                    return Err(invalid(format!(
                        "path leaves the directory of resource '{resource}'"
                    )));
                }
                dir.join(rest)
            }
            None if href.contains("://") => {
                return Err(invalid("remote includes are not supported".to_string()));
            }
            None => path.parent().unwrap_or(Path::new(".")).join(href),
        };
        if !target.is_file() {
            return Err(ProjectError::UnresolvedInclude {
                href: href.to_string(),
                path: path.to_path_buf(),
            });
        }
        Ok(target)
    }
}

/// Returns `true` if `relative` names a path below the directory it is
/// joined to.
fn stays_inside(relative: &Path) -> bool {
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => depth -= 1,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

fn read(path: &Path) -> Result<String, ProjectError> {
    std::fs::read_to_string(path).map_err(|e| ProjectError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn well_known_prefix(uri: &str) -> Option<&'static str> {
    match uri {
        BOOK_NS => Some("book"),
        BACCH_NS => Some("bacch"),
        XI_NS => Some("xi"),
        XML_NS => Some("xml"),
        _ => None,
    }
}

fn collect_namespaces(element: &Element, prefixes: &mut BTreeMap<String, String>) {
    let uris = element
        .ns
        .iter()
        .chain(element.attributes.iter().filter_map(|a| a.ns.as_ref()));
    for uri in uris {
        if !prefixes.contains_key(uri) {
            let prefix = match well_known_prefix(uri) {
                Some(p) => p.to_string(),
                None => format!("ns{}", prefixes.len()),
            };
            prefixes.insert(uri.clone(), prefix);
        }
    }
    for child in element.elements() {
        collect_namespaces(child, prefixes);
    }
}

fn qualified(ns: &Option<String>, name: &str, prefixes: &BTreeMap<String, String>) -> String {
    match ns.as_ref().and_then(|uri| prefixes.get(uri)) {
        Some(prefix) => format!("{prefix}:{name}"),
        None => name.to_string(),
    }
}

fn write_element(
    element: &Element,
    prefixes: &BTreeMap<String, String>,
    is_root: bool,
    out: &mut String,
) {
    let tag = qualified(&element.ns, &element.name, prefixes);
    out.push('<');
    out.push_str(&tag);
    if is_root {
        for (uri, prefix) in prefixes {
            if uri != XML_NS {
                let _ = write!(out, " xmlns:{prefix}=\"{}\"", escape(uri, true));
            }
        }
    }
    for attr in &element.attributes {
        let name = qualified(&attr.ns, &attr.name, prefixes);
        let _ = write!(out, " {name}=\"{}\"", escape(&attr.value, true));
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        match child {
            DocumentNode::Element(e) => write_element(e, prefixes, false, out),
            DocumentNode::Text(t) => out.push_str(&escape(t, false)),
        }
    }
    let _ = write!(out, "</{tag}>");
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
