//! Generic markup tree consumed by the parser and the renderer.
//!
//! A [`Node`] is either an element (tag name, ordered attributes, ordered
//! children) or a run of text. Trees are produced by an external parser
//! (see [`markdown`] and [`html`]) and are only ever read by the rest of the crate.
//!
//! Tag names stay as strings on the tree; [`Tag`] is the closed set of names
//! the crate knows how to treat, each classified as block, inline or
//! otherwise visible. Names outside the set are skipped wherever they appear.

pub mod html;
pub mod markdown;

use indexmap::IndexMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// A node of the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(ElementNode),
    Text(String),
}

/// An element node: tag name, attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create an element node with no attributes or children.
    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element(ElementNode {
            tag: tag.into(),
            ..ElementNode::default()
        })
    }

    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Builder: set an attribute. No-op on text nodes.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Node::Element(el) = &mut self {
            el.attributes.insert(key.into(), value.into());
        }
        self
    }

    /// Builder: append a child. No-op on text nodes.
    pub fn with_child(mut self, child: Node) -> Self {
        if let Node::Element(el) = &mut self {
            el.children.push(child);
        }
        self
    }

    /// Builder: append several children. No-op on text nodes.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        if let Node::Element(el) = &mut self {
            el.children.extend(children);
        }
        self
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    /// Children of an element; text nodes have none.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Text(_) => &[],
        }
    }

    /// Concatenation of every text node below (and including) this node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => el.children.iter().for_each(|c| c.collect_text(out)),
        }
    }
}

impl ElementNode {
    /// The tag as a known [`Tag`], or `None` for names outside the supported set.
    pub fn known_tag(&self) -> Option<Tag> {
        self.tag.parse().ok()
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Child nodes that are elements, in order.
    pub fn child_elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// The text of an element whose only child is a single text node.
    pub fn sole_text(&self) -> Option<&str> {
        match self.children.as_slice() {
            [Node::Text(text)] => Some(text),
            _ => None,
        }
    }
}

/// How a tag participates in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    /// Forces a vertical gap and a margin reset.
    Block,
    /// Flows within the current line.
    Inline,
    /// Structural containers rendered through their children only.
    OtherVisible,
}

/// Every tag name the crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Tag {
    // block
    Address,
    Article,
    Aside,
    Blockquote,
    Canvas,
    Dd,
    Div,
    Dl,
    Dt,
    Fieldset,
    Figcaption,
    Figure,
    Footer,
    Form,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Header,
    Hr,
    Li,
    Main,
    Nav,
    Noscript,
    Ol,
    P,
    Pre,
    Section,
    Table,
    Tfoot,
    Ul,
    Video,
    // inline
    A,
    Abbr,
    Acronym,
    B,
    Bdo,
    Big,
    Br,
    Button,
    Cite,
    Code,
    Dfn,
    Del,
    Em,
    I,
    Img,
    Input,
    Kbd,
    Label,
    Map,
    Object,
    Output,
    Q,
    Samp,
    Select,
    Small,
    Span,
    Strong,
    Sub,
    Sup,
    Textarea,
    Time,
    Tt,
    Var,
    // other visible
    Html,
    Body,
    Thead,
    Tbody,
    Tr,
    Th,
    Td,
}

impl Tag {
    pub fn class(self) -> TagClass {
        use Tag::*;
        match self {
            Address | Article | Aside | Blockquote | Canvas | Dd | Div | Dl | Dt | Fieldset
            | Figcaption | Figure | Footer | Form | H1 | H2 | H3 | H4 | H5 | H6 | Header | Hr
            | Li | Main | Nav | Noscript | Ol | P | Pre | Section | Table | Tfoot | Ul | Video => {
                TagClass::Block
            }
            A | Abbr | Acronym | B | Bdo | Big | Br | Button | Cite | Code | Dfn | Del | Em | I
            | Img | Input | Kbd | Label | Map | Object | Output | Q | Samp | Select | Small
            | Span | Strong | Sub | Sup | Textarea | Time | Tt | Var => TagClass::Inline,
            Html | Body | Thead | Tbody | Tr | Th | Td => TagClass::OtherVisible,
        }
    }

    pub fn is_block(self) -> bool {
        self.class() == TagClass::Block
    }

    /// `1..=6` for `h1`..`h6`.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            Tag::H1 => Some(1),
            Tag::H2 => Some(2),
            Tag::H3 => Some(3),
            Tag::H4 => Some(4),
            Tag::H5 => Some(5),
            Tag::H6 => Some(6),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_tag_names_round_trip() {
        for tag in Tag::iter() {
            assert_eq!(tag.as_ref().parse::<Tag>().unwrap(), tag);
            assert_eq!(tag.as_ref(), tag.as_ref().to_lowercase());
        }
        assert_eq!("h3".parse::<Tag>().unwrap(), Tag::H3);
        assert!("script".parse::<Tag>().is_err());
    }

    #[test]
    fn test_tag_classification() {
        assert_eq!(Tag::P.class(), TagClass::Block);
        assert_eq!(Tag::Li.class(), TagClass::Block);
        assert_eq!(Tag::Em.class(), TagClass::Inline);
        assert_eq!(Tag::A.class(), TagClass::Inline);
        assert_eq!(Tag::Body.class(), TagClass::OtherVisible);
        assert_eq!(Tag::Td.class(), TagClass::OtherVisible);
        assert_eq!(Tag::iter().filter(|t| t.is_block()).count(), 34);
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(Tag::H1.heading_level(), Some(1));
        assert_eq!(Tag::H6.heading_level(), Some(6));
        assert_eq!(Tag::P.heading_level(), None);
    }

    #[test]
    fn test_node_helpers() {
        let link = Node::element("a")
            .with_attribute("href", "https://example.com")
            .with_child(Node::text("example"));
        let el = link.as_element().unwrap();
        assert_eq!(el.attribute("href"), Some("https://example.com"));
        assert_eq!(el.attribute("title"), None);
        assert_eq!(el.sole_text(), Some("example"));
        assert_eq!(el.known_tag(), Some(Tag::A));

        let p = Node::element("p").with_children([
            Node::text("one "),
            Node::element("em").with_child(Node::text("two")),
        ]);
        assert_eq!(p.text_content(), "one two");
        assert_eq!(p.as_element().unwrap().sole_text(), None);
        assert_eq!(p.as_element().unwrap().child_elements().count(), 1);
    }
}
