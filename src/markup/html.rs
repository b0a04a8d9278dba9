//! HTML source to markup tree.
//!
//! `scraper` (html5ever underneath) parses the source with browser error
//! recovery; the resulting DOM is copied into [`Node`]s. Comments, doctypes
//! and processing instructions are left out.

use super::{ElementNode, Node};
use scraper::{ElementRef, Html};
use tracing::debug;

/// Parse a whole HTML document and return its `body` element.
///
/// The parser always synthesizes a body, so missing `<html>`/`<body>`
/// tags still give one.
pub fn parse(source: &str) -> Node {
    let document = Html::parse_document(source);
    document
        .root_element()
        .child_elements()
        .find(|el| el.value().name() == "body")
        .map(convert_element)
        .unwrap_or_else(|| {
            debug!("html document without body");
            Node::element("body")
        })
}

/// Parse an HTML snippet as it would appear inside a `body`.
pub fn parse_fragment(source: &str) -> Vec<Node> {
    let fragment = Html::parse_fragment(source);
    convert_children(fragment.root_element())
}

fn convert_element(el: ElementRef<'_>) -> Node {
    let value = el.value();
    Node::Element(ElementNode {
        tag: value.name().to_ascii_lowercase(),
        attributes: value
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        children: convert_children(el),
    })
}

fn convert_children(el: ElementRef<'_>) -> Vec<Node> {
    let mut children = Vec::new();
    for child in el.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                let text: &str = text;
                children.push(Node::text(text));
            }
            scraper::Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    children.push(convert_element(child));
                }
            }
            _ => {}
        }
    }
    children
}
