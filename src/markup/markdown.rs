//! Markdown source to markup tree.
//!
//! `pulldown-cmark` does the parsing; its event stream is folded into a
//! [`Node`] tree shaped like the DOM an HTML renderer would produce, rooted
//! at a `body` element. Raw HTML blocks are parsed with [`super::html`] and
//! spliced in; inline HTML tags open and close elements around the Markdown
//! between them.

use super::{ElementNode, Node, html};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag as MdTag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;
use tracing::trace;

/// Elements that never have content, so an inline opening tag is complete.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn closing_tag(raw: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^</\s*([A-Za-z][A-Za-z0-9-]*)\s*>$").expect("valid regex"))
        .captures(raw.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Parse markdown into a `body` element whose children are the document's blocks.
pub fn parse(markdown: &str) -> Node {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_DEFINITION_LIST);
    options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);

    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(markdown, options) {
        builder.push_event(event);
    }
    builder.finish()
}

/// An open element, or `None` for a subtree that is being discarded.
type Frame = Option<ElementNode>;

struct TreeBuilder {
    stack: Vec<Frame>,
    in_table_head: bool,
    /// Source of the raw HTML block being collected.
    html_block: Option<String>,
    /// Stack depths of elements opened by inline HTML tags.
    inline_html: Vec<usize>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            stack: vec![Some(element("body"))],
            in_table_head: false,
            html_block: None,
            inline_html: Vec::new(),
        }
    }
}

fn element(tag: &str) -> ElementNode {
    ElementNode {
        tag: tag.to_string(),
        ..ElementNode::default()
    }
}

impl TreeBuilder {
    fn push_event(&mut self, event: Event) {
        match event {
            Event::Start(MdTag::HtmlBlock) => self.html_block = Some(String::new()),
            Event::End(TagEnd::HtmlBlock) => {
                let source = self.html_block.take().unwrap_or_default();
                for node in html::parse_fragment(source.trim()) {
                    self.append(node);
                }
            }
            Event::Start(tag) => {
                let frame = self.open(tag);
                self.stack.push(frame);
            }
            Event::End(_) => {
                self.close_open_inline_html();
                self.close();
            }
            Event::Text(text) => self.append(Node::text(text.into_string())),
            Event::Code(code) | Event::InlineMath(code) | Event::DisplayMath(code) => {
                self.append(Node::element("code").with_child(Node::text(code.into_string())))
            }
            Event::SoftBreak => self.append(Node::text("\n")),
            Event::HardBreak => self.append(Node::element("br")),
            Event::Rule => self.append(Node::element("hr")),
            Event::TaskListMarker(checked) => {
                self.append(Node::text(if checked { "[x] " } else { "[ ] " }))
            }
            Event::FootnoteReference(label) => self.append(Node::text(format!("[^{label}]"))),
            Event::Html(raw) => match &mut self.html_block {
                Some(block) => block.push_str(&raw),
                None => self.inline_html(&raw),
            },
            Event::InlineHtml(raw) => self.inline_html(&raw),
        }
    }

    /// An inline tag: a closing tag ends the matching open element, an
    /// opening tag of a non-void element starts one, anything else is
    /// parsed and appended as is.
    fn inline_html(&mut self, raw: &str) {
        if let Some(name) = closing_tag(raw) {
            let top = self.stack.len() - 1;
            let matches = self.inline_html.last() == Some(&top)
                && matches!(self.stack.last(), Some(Some(el)) if el.tag.eq_ignore_ascii_case(name));
            if matches {
                self.inline_html.pop();
                self.close();
            } else {
                trace!(raw, "unmatched closing tag");
            }
            return;
        }

        let mut nodes = html::parse_fragment(raw);
        let opens = !raw.trim_end().ends_with("/>")
            && matches!(nodes.as_slice(), [Node::Element(el)]
                if el.children.is_empty() && !VOID_ELEMENTS.contains(&el.tag.as_str()));
        if opens {
            if let Some(Node::Element(el)) = nodes.pop() {
                self.stack.push(Some(el));
                self.inline_html.push(self.stack.len() - 1);
            }
            return;
        }
        for node in nodes {
            self.append(node);
        }
    }

    /// Close inline HTML elements still open on top of the stack, so a
    /// Markdown end event closes the element it belongs to.
    fn close_open_inline_html(&mut self) {
        while self.inline_html.last() == Some(&(self.stack.len() - 1)) {
            self.inline_html.pop();
            self.close();
        }
    }

    fn open(&mut self, tag: MdTag) -> Frame {
        let el = match tag {
            MdTag::Paragraph => element("p"),
            MdTag::Heading { level, .. } => element(&format!("h{}", level as usize)),
            MdTag::BlockQuote(_) => element("blockquote"),
            MdTag::CodeBlock(kind) => {
                // pre > code, the code element carrying the text
                self.stack.push(Some(element("pre")));
                let mut code = element("code");
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        code.attributes
                            .insert("class".to_string(), format!("language-{lang}"));
                    }
                }
                code
            }
            MdTag::List(Some(start)) => {
                let mut ol = element("ol");
                if start != 1 {
                    ol.attributes.insert("start".to_string(), start.to_string());
                }
                ol
            }
            MdTag::List(None) => element("ul"),
            MdTag::Item => element("li"),
            MdTag::FootnoteDefinition(_) => element("div"),
            MdTag::DefinitionList => element("dl"),
            MdTag::DefinitionListTitle => element("dt"),
            MdTag::DefinitionListDefinition => element("dd"),
            MdTag::Table(_) => element("table"),
            MdTag::TableHead => {
                self.in_table_head = true;
                element("thead")
            }
            MdTag::TableRow => element("tr"),
            MdTag::TableCell => element(if self.in_table_head { "th" } else { "td" }),
            MdTag::Emphasis => element("em"),
            MdTag::Strong => element("strong"),
            MdTag::Strikethrough => element("del"),
            MdTag::Superscript => element("sup"),
            MdTag::Subscript => element("sub"),
            MdTag::Link { dest_url, .. } => {
                let mut a = element("a");
                a.attributes
                    .insert("href".to_string(), dest_url.into_string());
                a
            }
            MdTag::Image { dest_url, .. } => {
                let mut img = element("img");
                img.attributes
                    .insert("src".to_string(), dest_url.into_string());
                img
            }
            other => {
                trace!(tag = ?other, "dropping unsupported markdown block");
                return None;
            }
        };
        Some(el)
    }

    fn close(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if let Some(el) = frame {
            let is_code_in_pre = el.tag == "code"
                && matches!(self.stack.last(), Some(Some(parent)) if parent.tag == "pre");
            if el.tag == "thead" {
                self.in_table_head = false;
            }
            self.append(Node::Element(el));
            if is_code_in_pre {
                // the synthetic pre closes with its code block
                self.close();
            }
        }
    }

    /// Append to the open element; adjacent text runs are merged into one node.
    fn append(&mut self, node: Node) {
        let Some(Some(parent)) = self.stack.last_mut() else {
            return;
        };
        match (parent.children.last_mut(), node) {
            (Some(Node::Text(last)), Node::Text(text)) => last.push_str(&text),
            (_, node) => parent.children.push(node),
        }
    }

    fn finish(mut self) -> Node {
        self.inline_html.clear();
        while self.stack.len() > 1 {
            self.close();
        }
        match self.stack.pop() {
            Some(Some(body)) => Node::Element(body),
            _ => Node::element("body"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(node: &Node) -> Vec<String> {
        node.children()
            .iter()
            .filter_map(Node::as_element)
            .map(|el| el.tag.clone())
            .collect()
    }

    #[test]
    fn test_blocks() {
        let body = parse("# Title\n\nSome *text*.\n\n---\n\n> quoted\n");
        assert_eq!(body.as_element().unwrap().tag, "body");
        assert_eq!(tags(&body), vec!["h1", "p", "hr", "blockquote"]);

        let p = &body.children()[1];
        assert_eq!(p.text_content(), "Some text.");
        assert_eq!(tags(p), vec!["em"]);
    }

    #[test]
    fn test_code_block_is_pre_code() {
        let body = parse("```rust\nfn main() {}\n```\n");
        let pre = body.children()[0].as_element().unwrap();
        assert_eq!(pre.tag, "pre");
        let code = pre.child_elements().next().unwrap();
        assert_eq!(code.tag, "code");
        assert_eq!(code.attribute("class"), Some("language-rust"));
        assert_eq!(code.sole_text(), Some("fn main() {}\n"));
    }

    #[test]
    fn test_multi_line_code_is_one_text_node() {
        let body = parse("```\nline one\n\tline two\n```\n");
        let pre = body.children()[0].as_element().unwrap();
        let code = pre.child_elements().next().unwrap();
        assert_eq!(code.sole_text(), Some("line one\n\tline two\n"));
    }

    #[test]
    fn test_lists() {
        let body = parse("- one\n- two\n\n3. three\n4. four\n");
        assert_eq!(tags(&body), vec!["ul", "ol"]);
        let ul = body.children()[0].as_element().unwrap();
        assert_eq!(ul.child_elements().filter(|c| c.tag == "li").count(), 2);
        let ol = body.children()[1].as_element().unwrap();
        assert_eq!(ol.attribute("start"), Some("3"));

        let plain = parse("1. one\n");
        let ol = plain.children()[0].as_element().unwrap();
        assert_eq!(ol.attribute("start"), None);
    }

    #[test]
    fn test_links_and_inline_code() {
        let body = parse("see [docs](https://docs.rs) and `code`");
        let p = body.children()[0].as_element().unwrap();
        let a = p.child_elements().find(|c| c.tag == "a").unwrap();
        assert_eq!(a.attribute("href"), Some("https://docs.rs"));
        assert_eq!(a.sole_text(), Some("docs"));
        assert!(p.child_elements().any(|c| c.tag == "code"));
    }

    #[test]
    fn test_strikethrough() {
        let body = parse("~~gone~~\n");
        let p = body.children()[0].as_element().unwrap();
        assert_eq!(p.child_elements().next().unwrap().tag, "del");
    }

    #[test]
    fn test_html_block_is_parsed() {
        let body = parse("intro\n\n<div class=\"box\">\n<address>Main St</address>\n</div>\n\nafter\n");
        assert_eq!(tags(&body), vec!["p", "div", "p"]);
        let div = body.children()[1].as_element().unwrap();
        assert_eq!(div.attribute("class"), Some("box"));
        assert!(div.child_elements().any(|c| c.tag == "address"));
        assert_eq!(body.children()[2].text_content(), "after");
    }

    #[test]
    fn test_inline_html_wraps_markdown() {
        let body = parse("press <kbd>*Ctrl*</kbd> now<br>done\n");
        let p = body.children()[0].as_element().unwrap();
        let tags: Vec<_> = p.child_elements().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["kbd", "br"]);
        let kbd = p.child_elements().next().unwrap();
        assert_eq!(kbd.child_elements().next().unwrap().tag, "em");
        assert_eq!(body.text_content(), "press Ctrl nowdone");
    }

    #[test]
    fn test_unclosed_inline_html_ends_with_its_block() {
        let body = parse("a <span>b <abbr>c\n\nnext\n");
        assert_eq!(tags(&body), vec!["p", "p"]);
        let span = body.children()[0].as_element().unwrap().child_elements().next().unwrap();
        assert_eq!(span.tag, "span");
        assert_eq!(span.child_elements().next().unwrap().tag, "abbr");
        assert_eq!(body.children()[1].text_content(), "next");
    }

    #[test]
    fn test_stray_closing_tag_is_ignored() {
        let body = parse("a</span> b <!-- c -->\n");
        assert_eq!(tags(&body), vec!["p"]);
        assert_eq!(body.text_content(), "a b ");
    }

    #[test]
    fn test_table_cells() {
        let body = parse("| a | b |\n|---|---|\n| 1 | 2 |\n");
        let table = body.children()[0].as_element().unwrap();
        assert_eq!(table.tag, "table");
        let head = table.child_elements().next().unwrap();
        assert_eq!(head.tag, "thead");
        assert!(head.children.iter().any(|n| n.as_element().is_some_and(|e| e.tag == "th")
            || n.children().iter().any(|c| c.as_element().is_some_and(|e| e.tag == "th"))));
    }
}
