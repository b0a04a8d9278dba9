//! Markup parsing and document structure extraction.
//!
//! This module turns a markup tree into typed [`Element`]s (paragraphs,
//! headings, code blocks, quotes, lists, rules) and groups them into a
//! heading [`Outline`].
//!
//! Parsing never fails: nodes with unknown tags or unexpected shapes are
//! left out of the result and logged at debug level.

pub mod content;
pub mod outline;

pub use content::{Attribution, ContentSegment, parse_content, parse_plain_content};
pub use outline::{Document, Outline};

use crate::markup::{ElementNode, Node, Tag};
use tracing::debug;

/// The kind of a semantic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Paragraph,
    Heading,
    Code,
    Quote,
    ListItem,
    UnorderedList,
    OrderedList,
    HorizontalRule,
}

/// Heading context: level (`1..=6`, or `0` for a synthetic file heading) and search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingInfo {
    pub level: u8,
    pub search_term: String,
}

/// A semantic markup block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    pub tag: String,
    pub content: Vec<ContentSegment>,
    /// Present on headings only.
    pub heading: Option<HeadingInfo>,
    /// List items of a list, or the blocks inside a list item.
    pub sub_elements: Vec<Element>,
}

impl Element {
    fn new(kind: ElementKind, tag: impl Into<String>) -> Self {
        Self {
            kind,
            tag: tag.into(),
            content: Vec::new(),
            heading: None,
            sub_elements: Vec::new(),
        }
    }

    /// Level-0 heading standing in for a file without a leading `h1`.
    pub fn synthetic_heading(filename: &str) -> Self {
        Self {
            content: vec![ContentSegment::new(filename, Attribution::PLAIN)],
            heading: Some(HeadingInfo {
                level: 0,
                search_term: filename.to_string(),
            }),
            ..Self::new(ElementKind::Heading, "h0")
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        self.heading.as_ref().map(|h| h.level)
    }

    pub fn search_term(&self) -> Option<&str> {
        self.heading.as_ref().map(|h| h.search_term.as_str())
    }

    /// Concatenated raw text of the element's content.
    pub fn plain_text(&self) -> String {
        self.content.iter().map(|s| s.raw.as_str()).collect()
    }
}

/// Parse one markup node into at most one element.
///
/// With `including_text`, a bare text node becomes a paragraph; this is how
/// list items whose content is plain text get a body.
pub fn parse_element(node: &Node, including_text: bool) -> Option<Element> {
    match node {
        Node::Element(el) => parse_tagged(node, el),
        Node::Text(text) if including_text && !text.trim().is_empty() => Some(Element {
            content: parse_content(node),
            ..Element::new(ElementKind::Paragraph, "p")
        }),
        Node::Text(_) => None,
    }
}

fn parse_tagged(node: &Node, el: &ElementNode) -> Option<Element> {
    let Some(tag) = el.known_tag() else {
        debug!(tag = %el.tag, "skipping unknown tag");
        return None;
    };

    match tag {
        Tag::P => Some(Element {
            content: parse_content(node),
            ..Element::new(ElementKind::Paragraph, "p")
        }),
        Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6 => {
            let level = tag.heading_level().unwrap_or(1);
            let plain = parse_plain_content(node);
            Some(Element {
                content: parse_content(node),
                heading: Some(HeadingInfo {
                    level,
                    search_term: plain.raw.trim_matches([' ', '\n']).to_string(),
                }),
                ..Element::new(ElementKind::Heading, tag.as_ref())
            })
        }
        Tag::Pre => match sole_child_element(el) {
            Some((child, Tag::Code)) => Some(Element {
                content: vec![parse_plain_content(child)],
                ..Element::new(ElementKind::Code, "code")
            }),
            _ => {
                debug!("skipping pre without a single code child");
                None
            }
        },
        Tag::Blockquote => match sole_child_element(el) {
            Some((child, Tag::P)) => Some(Element {
                content: vec![parse_plain_content(child)],
                ..Element::new(ElementKind::Quote, "blockquote")
            }),
            _ => {
                debug!("skipping blockquote without a single paragraph child");
                None
            }
        },
        Tag::Ul | Tag::Ol => {
            let kind = if tag == Tag::Ul {
                ElementKind::UnorderedList
            } else {
                ElementKind::OrderedList
            };
            let items = el
                .children
                .iter()
                .filter(|c| c.as_element().and_then(ElementNode::known_tag) == Some(Tag::Li))
                .filter_map(|c| parse_element(c, true))
                .collect();
            Some(Element {
                sub_elements: items,
                ..Element::new(kind, tag.as_ref())
            })
        }
        Tag::Li => Some(Element {
            content: parse_content(node),
            sub_elements: el
                .children
                .iter()
                .filter_map(|c| parse_element(c, true))
                .collect(),
            ..Element::new(ElementKind::ListItem, "li")
        }),
        Tag::Hr => Some(Element::new(ElementKind::HorizontalRule, "hr")),
        _ => {
            debug!(tag = %el.tag, "no element for tag");
            None
        }
    }
}

/// The only element child of `el` (text children ignored), with its tag.
fn sole_child_element(el: &ElementNode) -> Option<(&Node, Tag)> {
    let mut elements = el.children.iter().filter(|c| c.as_element().is_some());
    let only = elements.next()?;
    if elements.next().is_some() {
        return None;
    }
    let tag = only.as_element()?.known_tag()?;
    Some((only, tag))
}

/// Parse the children of a root node, keeping the index of the node each element came from.
pub fn parse_children(root: &Node) -> Vec<(usize, Element)> {
    root.children()
        .iter()
        .enumerate()
        .filter_map(|(i, node)| parse_element(node, false).map(|e| (i, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::markdown;

    #[test]
    fn test_parse_headings() {
        let body = markdown::parse("# Title\nSome content\n\n## Section 1\nMore\n");
        let elements: Vec<_> = parse_children(&body).into_iter().map(|(_, e)| e).collect();
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0].kind, ElementKind::Heading);
        assert_eq!(elements[0].tag, "h1");
        assert_eq!(elements[0].heading_level(), Some(1));
        assert_eq!(elements[0].search_term(), Some("Title"));
        assert_eq!(elements[2].heading_level(), Some(2));
        assert_eq!(elements[2].search_term(), Some("Section 1"));
        assert_eq!(elements[1].kind, ElementKind::Paragraph);
    }

    #[test]
    fn test_heading_search_term_strips_formatting() {
        let body = markdown::parse("## **Bold** Section\n");
        let (_, heading) = parse_children(&body).remove(0);
        assert_eq!(heading.search_term(), Some("Bold Section"));
        assert_eq!(heading.content.len(), 2);
        assert!(heading.content[0].attribution.contains(Attribution::BOLD));
    }

    #[test]
    fn test_code_and_quote_blocks() {
        let body = markdown::parse("```\nlet x = 1;\n```\n\n> wise words\n");
        let elements: Vec<_> = parse_children(&body).into_iter().map(|(_, e)| e).collect();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].kind, ElementKind::Code);
        assert_eq!(elements[0].plain_text(), "let x = 1;\n");
        assert_eq!(elements[1].kind, ElementKind::Quote);
        assert_eq!(elements[1].plain_text(), "wise words");
    }

    #[test]
    fn test_unexpected_block_shapes_are_dropped() {
        let pre = Node::element("pre").with_child(Node::text("bare"));
        assert_eq!(parse_element(&pre, false), None);

        let quote = Node::element("blockquote").with_children([
            Node::element("p").with_child(Node::text("one")),
            Node::element("p").with_child(Node::text("two")),
        ]);
        assert_eq!(parse_element(&quote, false), None);

        assert_eq!(parse_element(&Node::element("script"), false), None);
        assert_eq!(parse_element(&Node::element("table"), false), None);
    }

    #[test]
    fn test_lists_only_take_items() {
        let ul = Node::element("ul").with_children([
            Node::element("li").with_child(Node::text("one")),
            Node::text("\n"),
            Node::element("p").with_child(Node::text("stray")),
            Node::element("li").with_children([
                Node::text("two"),
                Node::element("ul")
                    .with_child(Node::element("li").with_child(Node::text("nested"))),
            ]),
        ]);
        let list = parse_element(&ul, false).unwrap();
        assert_eq!(list.kind, ElementKind::UnorderedList);
        assert_eq!(list.sub_elements.len(), 2);

        let second = &list.sub_elements[1];
        assert_eq!(second.kind, ElementKind::ListItem);
        assert_eq!(second.plain_text(), "two");
        assert_eq!(second.sub_elements.len(), 2);
        assert_eq!(second.sub_elements[0].kind, ElementKind::Paragraph);
        assert_eq!(second.sub_elements[1].kind, ElementKind::UnorderedList);
    }

    #[test]
    fn test_ordered_list_and_rule() {
        let body = markdown::parse("1. a\n2. b\n\n***\n");
        let elements: Vec<_> = parse_children(&body).into_iter().map(|(_, e)| e).collect();
        assert_eq!(elements[0].kind, ElementKind::OrderedList);
        assert_eq!(elements[0].sub_elements.len(), 2);
        assert_eq!(elements[1].kind, ElementKind::HorizontalRule);
    }

    #[test]
    fn test_text_only_parsed_inside_items() {
        assert_eq!(parse_element(&Node::text("loose"), false), None);
        let p = parse_element(&Node::text("loose"), true).unwrap();
        assert_eq!(p.kind, ElementKind::Paragraph);
        assert_eq!(p.plain_text(), "loose");
    }

    #[test]
    fn test_synthetic_heading() {
        let h = Element::synthetic_heading("notes");
        assert_eq!(h.heading_level(), Some(0));
        assert_eq!(h.search_term(), Some("notes"));
        assert_eq!(h.tag, "h0");
        assert_eq!(h.plain_text(), "notes");
    }
}
