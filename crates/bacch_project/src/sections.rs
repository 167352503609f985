//! Section indexing of DocBook documents.

use std::collections::BTreeMap;

use bacch_config::xml::{self, QName};
use bacch_config::{BOOK_NS, XML_NS};
use roxmltree::Node;
use serde::Serialize;

const TITLE: QName = QName::new(BOOK_NS, "title");
const INFO: QName = QName::new(BOOK_NS, "info");

/// DocBook elements that open a section.
const SECTION_KINDS: &[&str] = &[
    "book", "part", "chapter", "preface", "appendix", "article", "section", "sect1", "sect2",
    "sect3", "sect4", "sect5",
];

/// One sectioning element of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// The `xml:id` of the element, if any.
    pub id: Option<String>,
    /// The section title, from `title` or `info/title`.
    pub title: Option<String>,
    /// The DocBook element name (`chapter`, `sect1`, ...).
    pub kind: String,
    /// Nesting depth; the outermost section is 0.
    pub depth: usize,
}

/// Sections of every document in a resource, keyed by document name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionIndex {
    /// Document name to its sections in document order.
    pub documents: BTreeMap<String, Vec<Section>>,
}

impl SectionIndex {
    /// Returns the sections of document `name`.
    pub fn sections(&self, name: &str) -> Option<&[Section]> {
        self.documents.get(name).map(Vec::as_slice)
    }

    /// Returns `true` if no document was indexed.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total number of sections across all documents.
    pub fn section_count(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }
}

/// Lists the sections of one document in document order.
pub fn index_document(text: &str) -> Result<Vec<Section>, roxmltree::Error> {
    let doc = xml::parse_document(text)?;
    let mut sections = Vec::new();
    walk(doc.root_element(), 0, &mut sections);
    Ok(sections)
}

fn walk(node: Node<'_, '_>, depth: usize, out: &mut Vec<Section>) {
    let is_section = node.tag_name().namespace() == Some(BOOK_NS)
        && SECTION_KINDS.contains(&node.tag_name().name());

    let child_depth = if is_section {
        out.push(Section {
            id: node.attribute((XML_NS, "id")).map(str::to_string),
            title: title_of(node),
            kind: node.tag_name().name().to_string(),
            depth,
        });
        depth + 1
    } else {
        depth
    };

    for child in xml::element_children(node) {
        walk(child, child_depth, out);
    }
}

fn title_of(node: Node<'_, '_>) -> Option<String> {
    let title = xml::child(node, TITLE)
        .or_else(|| xml::select(node, &[INFO, TITLE]).into_iter().next())?;
    let text: String = title
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAPTER: &str = r#"<chapter xmlns="http://docbook.org/ns/docbook" xml:id="ch1">
  <title>The  <emphasis>Long</emphasis> Road</title>
  <section xml:id="ch1-s1">
    <info><title>Departure</title></info>
    <para>Text.</para>
    <section>
      <title>Harbor</title>
    </section>
  </section>
  <sect1><para>No title.</para></sect1>
</chapter>"#;

    #[test]
    fn index_nested_sections() {
        let sections = index_document(CHAPTER).unwrap();
        let summary: Vec<_> = sections
            .iter()
            .map(|s| (s.kind.as_str(), s.depth, s.title.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("chapter", 0, Some("The Long Road")),
                ("section", 1, Some("Departure")),
                ("section", 2, Some("Harbor")),
                ("sect1", 1, None),
            ]
        );
        assert_eq!(sections[0].id.as_deref(), Some("ch1"));
        assert_eq!(sections[1].id.as_deref(), Some("ch1-s1"));
        assert_eq!(sections[2].id, None);
    }

    #[test]
    fn elements_outside_docbook_are_not_sections() {
        let sections = index_document("<chapter><title>Plain</title></chapter>").unwrap();
        assert!(sections.is_empty());
    }

    #[test]
    fn doctype_document_is_indexed() {
        let text = format!("<!DOCTYPE chapter>\n{CHAPTER}");
        let sections = index_document(&text).unwrap();
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0].title.as_deref(), Some("The Long Road"));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(index_document("<chapter>").is_err());
    }

    #[test]
    fn index_counts() {
        let mut index = SectionIndex::default();
        assert!(index.is_empty());
        index
            .documents
            .insert("chapter1".to_string(), index_document(CHAPTER).unwrap());
        assert_eq!(index.section_count(), 4);
        assert_eq!(index.sections("chapter1").map(<[Section]>::len), Some(4));
        assert!(index.sections("chapter2").is_none());
    }
}
