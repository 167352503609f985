//! Thin read and query helpers over `roxmltree`.
//!
//! Descriptor and document queries are expressed as sequences of qualified
//! element names (`bacch:config` / `bacch:resources`) rather than XPath
//! strings. Every name carries its namespace URI so that prefixes chosen by
//! the author of a file do not matter.

use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};

use crate::error::ConfigError;

/// A namespace-qualified element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QName {
    /// Namespace URI.
    pub ns: &'static str,
    /// Local part of the name.
    pub local: &'static str,
}

impl QName {
    /// Creates a qualified name.
    pub const fn new(ns: &'static str, local: &'static str) -> Self {
        Self { ns, local }
    }

    /// Returns `true` if `node` is an element with this name.
    pub fn matches(&self, node: Node<'_, '_>) -> bool {
        node.is_element() && node.has_tag_name((self.ns, self.local))
    }
}

/// Reads a file into a string for parsing with [`parse_xml`].
///
/// `roxmltree` documents borrow their input, so callers keep the returned
/// text alive for as long as they query the tree.
pub fn read_descriptor(path: &Path) -> Result<String, ConfigError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Parses XML text into a document tree.
///
/// A `<!DOCTYPE>` declaration is accepted; DocBook sources commonly carry
/// one.
pub fn parse_document(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options)
}

/// Parses descriptor text, see [`parse_document`].
pub fn parse_xml(text: &str) -> Result<Document<'_>, ConfigError> {
    parse_document(text).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Returns the element children of `node` named `name`.
pub fn children<'a, 'input>(node: Node<'a, 'input>, name: QName) -> Vec<Node<'a, 'input>> {
    node.children().filter(|c| name.matches(*c)).collect()
}

/// Returns the first element child of `node` named `name`.
pub fn child<'a, 'input>(node: Node<'a, 'input>, name: QName) -> Option<Node<'a, 'input>> {
    node.children().find(|c| name.matches(*c))
}

/// Returns every element child of `node`, whatever its name.
pub fn element_children<'a, 'input>(node: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    node.children().filter(Node::is_element).collect()
}

/// Follows `path` one child step at a time from `node` and returns all
/// elements reached by the last step.
pub fn select<'a, 'input>(node: Node<'a, 'input>, path: &[QName]) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for step in path {
        current = current
            .into_iter()
            .flat_map(|n| children(n, *step))
            .collect();
    }
    current
}

/// Returns the value of an unqualified attribute.
pub fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name)
}

/// Returns the value of an unqualified attribute or a
/// [`ConfigError::MissingAttribute`] naming the element.
pub fn require_attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, ConfigError> {
    node.attribute(name)
        .ok_or_else(|| ConfigError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: name.to_string(),
        })
}

/// Returns the leading text of an element, or an empty string.
pub fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("")
}
