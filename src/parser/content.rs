//! Inline content of parsed elements.
//!
//! Inline markup (`em`, `strong`, `code`, `a`) is flattened into a sequence
//! of [`ContentSegment`]s, each one a run of text carrying the union of the
//! attributions of the containers it sits in.

use crate::markup::{ElementNode, Node, Tag};
use bitflags::bitflags;
use indexmap::IndexMap;

/// Context key holding an anchor's target.
pub const CONTEXT_HREF: &str = "href";

bitflags! {
    /// Inline styling applied to a run of text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attribution: u8 {
        const PLAIN = 1 << 0;
        const EMPHASIS = 1 << 1;
        const BOLD = 1 << 2;
        const CODE = 1 << 3;
        const ANCHOR = 1 << 4;
    }
}

/// A run of text with its attribution and optional context (e.g. `href`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSegment {
    pub raw: String,
    pub attribution: Attribution,
    pub context: IndexMap<String, String>,
}

impl ContentSegment {
    pub fn new(raw: impl Into<String>, attribution: Attribution) -> Self {
        Self {
            raw: raw.into(),
            attribution,
            context: IndexMap::new(),
        }
    }

    /// Link target of an anchor segment.
    pub fn href(&self) -> Option<&str> {
        self.context.get(CONTEXT_HREF).map(String::as_str)
    }
}

/// Flatten the inline content of a node into attributed segments.
///
/// Nested lists are skipped: list items carry those as sub-elements instead.
pub fn parse_content(node: &Node) -> Vec<ContentSegment> {
    let mut segments = Vec::new();
    collect_segments(node, Attribution::PLAIN, &mut segments);
    segments
}

fn collect_segments(node: &Node, attribution: Attribution, out: &mut Vec<ContentSegment>) {
    let el = match node {
        Node::Text(text) => {
            out.push(ContentSegment::new(text.as_str(), attribution));
            return;
        }
        Node::Element(el) => el,
    };

    let attribution = match el.known_tag() {
        Some(Tag::Em) => attribution | Attribution::EMPHASIS,
        Some(Tag::Strong) => attribution | Attribution::BOLD,
        Some(Tag::Code) => attribution | Attribution::CODE,
        Some(Tag::A) => {
            out.push(anchor_segment(el, attribution | Attribution::ANCHOR));
            return;
        }
        Some(Tag::Ul | Tag::Ol) => return,
        _ => attribution,
    };

    for child in &el.children {
        collect_segments(child, attribution, out);
    }
}

/// Anchors are terminal: the label is the first text child, nested markup is ignored.
fn anchor_segment(el: &ElementNode, attribution: Attribution) -> ContentSegment {
    let label = el.children.iter().find_map(Node::as_text).unwrap_or_default();
    let mut segment = ContentSegment::new(label, attribution);
    if let Some(href) = el.attribute(CONTEXT_HREF) {
        segment
            .context
            .insert(CONTEXT_HREF.to_string(), href.to_string());
    }
    segment
}

/// All text below a node as one plain segment.
pub fn parse_plain_content(node: &Node) -> ContentSegment {
    ContentSegment::new(node.text_content(), Attribution::PLAIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribution_accumulates() {
        let p = Node::element("p").with_children([
            Node::text("plain "),
            Node::element("strong").with_child(
                Node::element("em").with_child(Node::text("both")),
            ),
            Node::element("code").with_child(Node::text("x")),
        ]);
        let segments = parse_content(&p);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].attribution, Attribution::PLAIN);
        assert_eq!(
            segments[1].attribution,
            Attribution::PLAIN | Attribution::BOLD | Attribution::EMPHASIS
        );
        assert_eq!(segments[1].raw, "both");
        assert_eq!(segments[2].attribution, Attribution::PLAIN | Attribution::CODE);
    }

    #[test]
    fn test_anchor_is_terminal() {
        let p = Node::element("p").with_child(
            Node::element("a")
                .with_attribute("href", "https://example.com")
                .with_children([
                    Node::text("label"),
                    Node::element("em").with_child(Node::text("ignored")),
                ]),
        );
        let segments = parse_content(&p);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].raw, "label");
        assert!(segments[0].attribution.contains(Attribution::ANCHOR));
        assert_eq!(segments[0].href(), Some("https://example.com"));
    }

    #[test]
    fn test_anchor_without_href() {
        let a = Node::element("a").with_child(Node::text("nowhere"));
        let segments = parse_content(&a);
        assert_eq!(segments[0].href(), None);
        assert_eq!(segments[0].raw, "nowhere");
    }

    #[test]
    fn test_nested_lists_are_skipped() {
        let li = Node::element("li").with_children([
            Node::text("item"),
            Node::element("ul").with_child(Node::element("li").with_child(Node::text("nested"))),
        ]);
        let raw: Vec<_> = parse_content(&li).into_iter().map(|s| s.raw).collect();
        assert_eq!(raw, vec!["item"]);
    }

    #[test]
    fn test_plain_content() {
        let h = Node::element("h2").with_children([
            Node::text(" Hello "),
            Node::element("em").with_child(Node::text("World")),
        ]);
        let plain = parse_plain_content(&h);
        assert_eq!(plain.raw, " Hello World");
        assert_eq!(plain.attribution, Attribution::PLAIN);
    }
}
