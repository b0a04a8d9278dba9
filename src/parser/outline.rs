//! Heading outline of a parsed note.
//!
//! An [`Outline`] owns the flat element sequence of a note and an arena of
//! sections, one per heading. Each section's scope is the contiguous slice
//! of elements from its heading up to (not including) the next heading of
//! the same or a shallower level. Children point back at their parent
//! through the arena only; ownership runs strictly parent to children.

use super::Element;
use crate::markup::Node;
use crate::render::attributed::AttributedString;
use indextree::{Arena, NodeId};
use ratatui::style::{Color, Modifier, Style};
use std::ops::Range;

#[derive(Debug, Clone)]
enum HeadingRef {
    /// Index into the outline's elements.
    Element(usize),
    /// Stand-in heading for a note that does not open with an `h1`.
    Synthetic(Element),
}

#[derive(Debug, Clone)]
struct Section {
    heading: HeadingRef,
    scope: Range<usize>,
    search_term: String,
}

/// The heading tree of one note.
#[derive(Debug, Clone)]
pub struct Outline {
    arena: Arena<Section>,
    root: NodeId,
    elements: Vec<Element>,
    /// Index of the top-level markup node each element was parsed from.
    origins: Vec<usize>,
    node_count: usize,
}

impl Outline {
    /// Build the outline of a flat element sequence.
    ///
    /// A leading `h1` becomes the root heading; otherwise a level-0 heading
    /// named after `filename` is injected so the root always has one.
    pub fn build(elements: Vec<Element>, filename: &str) -> Self {
        let count = elements.len();
        Self::with_origins(elements, (0..count).collect(), count, filename)
    }

    /// Parse the children of a markup root and build their outline.
    pub fn from_node(root: &Node, filename: &str) -> Self {
        let (origins, elements) = super::parse_children(root).into_iter().unzip();
        Self::with_origins(elements, origins, root.children().len(), filename)
    }

    fn with_origins(
        elements: Vec<Element>,
        origins: Vec<usize>,
        node_count: usize,
        filename: &str,
    ) -> Self {
        let mut arena = Arena::new();
        let len = elements.len();

        let opens_with_h1 = elements.first().is_some_and(|e| e.tag == "h1");
        let (root_section, rest) = if opens_with_h1 {
            let search_term = elements[0].search_term().unwrap_or_default().to_string();
            (
                Section {
                    heading: HeadingRef::Element(0),
                    scope: 0..len,
                    search_term,
                },
                1..len,
            )
        } else {
            (
                Section {
                    heading: HeadingRef::Synthetic(Element::synthetic_heading(filename)),
                    scope: 0..len,
                    search_term: filename.to_string(),
                },
                0..len,
            )
        };

        let root = arena.new_node(root_section);
        partition(&mut arena, root, &elements, rest);

        Self {
            arena,
            root,
            elements,
            origins,
            node_count,
        }
    }

    /// The root document (the whole note).
    pub fn root(&self) -> Document<'_> {
        Document {
            outline: self,
            id: self.root,
        }
    }

    /// Every element of the note, in order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Shortcut for `self.root().traverse_query(query)`.
    pub fn find(&self, query: &str) -> Option<Document<'_>> {
        self.root().traverse_query(query)
    }

    /// Render the outline as a box-drawing tree, one entry per heading.
    ///
    /// Titles longer than `width` continue on following lines under the
    /// same indentation.
    pub fn render_tree(&self, width: usize) -> Vec<AttributedString> {
        let mut lines = Vec::new();
        let root = self.root();
        lines.extend(wrap_entry(
            AttributedString::default(),
            AttributedString::default(),
            root.search_term(),
            title_style(root.level()),
            width,
        ));
        let children: Vec<_> = root.children().collect();
        for (i, child) in children.iter().enumerate() {
            render_branch(*child, "", i + 1 == children.len(), width, &mut lines);
        }
        lines
    }
}

/// Split `elements[range]` into sibling sections appended under `parent`.
fn partition(arena: &mut Arena<Section>, parent: NodeId, elements: &[Element], range: Range<usize>) {
    let end = range.end;
    let mut i = range.start;
    while i < end {
        let Some(level) = elements[i].heading_level() else {
            i += 1;
            continue;
        };
        let j = (i + 1..end)
            .find(|&j| elements[j].heading_level().is_some_and(|l| l <= level))
            .unwrap_or(end);

        let id = arena.new_node(Section {
            heading: HeadingRef::Element(i),
            scope: i..j,
            search_term: elements[i].search_term().unwrap_or_default().to_string(),
        });
        parent.append(id, arena);
        partition(arena, id, elements, i + 1..j);
        i = j;
    }
}

/// A node of the outline: one heading and the elements in its scope.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    outline: &'a Outline,
    id: NodeId,
}

impl PartialEq for Document<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.outline, other.outline) && self.id == other.id
    }
}

impl<'a> Document<'a> {
    fn section(&self) -> &'a Section {
        self.outline.arena[self.id].get()
    }

    fn wrap(&self, id: NodeId) -> Document<'a> {
        Document {
            outline: self.outline,
            id,
        }
    }

    pub fn heading(&self) -> &'a Element {
        match &self.section().heading {
            HeadingRef::Element(i) => &self.outline.elements[*i],
            HeadingRef::Synthetic(el) => el,
        }
    }

    /// Heading level, `0` for a synthetic root.
    pub fn level(&self) -> u8 {
        self.heading().heading_level().unwrap_or(0)
    }

    pub fn search_term(&self) -> &'a str {
        &self.section().search_term
    }

    /// The elements in this document's scope, heading included.
    pub fn elements(&self) -> &'a [Element] {
        &self.outline.elements[self.section().scope.clone()]
    }

    /// Nested headings, in document order.
    pub fn children(&self) -> impl Iterator<Item = Document<'a>> + 'a {
        let outline = self.outline;
        self.id
            .children(&outline.arena)
            .map(move |id| Document { outline, id })
    }

    pub fn parent(&self) -> Option<Document<'a>> {
        self.outline.arena[self.id].parent().map(|id| self.wrap(id))
    }

    pub fn is_root(&self) -> bool {
        self.id == self.outline.root
    }

    /// Resolve a heading path below (and including) this document.
    ///
    /// The search term must be a case-sensitive prefix of `query`; the rest
    /// of the query, leading whitespace removed, is resolved against the
    /// children. The query has to be consumed completely to match; a
    /// query whose tail names no child resolves to nothing rather than to
    /// the deepest heading reached.
    ///
    /// ```
    /// use notegrid::Note;
    ///
    /// let note = Note::from_source("guide.md", "# Guide\n\n## Setup\n".to_string());
    /// let root = note.outline.root();
    /// assert_eq!(root.traverse_query("Guide Setup").unwrap().search_term(), "Setup");
    /// assert!(root.traverse_query("Guide Missing").is_none());
    /// ```
    pub fn traverse_query(&self, query: &str) -> Option<Document<'a>> {
        let remaining = query.strip_prefix(self.search_term())?.trim_start();
        if remaining.is_empty() {
            return Some(*self);
        }
        self.children()
            .find_map(|child| child.traverse_query(remaining))
    }

    /// Every heading path from this document to itself and each descendant, root first.
    pub fn sub_queries(&self) -> Vec<Vec<String>> {
        let term = self.search_term().to_string();
        let mut queries = vec![vec![term.clone()]];
        for child in self.children() {
            for path in child.sub_queries() {
                let mut full = Vec::with_capacity(path.len() + 1);
                full.push(term.clone());
                full.extend(path);
                queries.push(full);
            }
        }
        queries
    }

    /// The range of top-level markup nodes this document covers.
    ///
    /// Nodes that produced no element (unknown tags and the like) belong to
    /// the section they sit in.
    pub fn node_span(&self) -> Range<usize> {
        let outline = self.outline;
        if self.is_root() {
            return 0..outline.node_count;
        }
        match self.section().heading {
            HeadingRef::Synthetic(_) => 0..outline.node_count,
            HeadingRef::Element(_) => {
                let scope = &self.section().scope;
                let start = outline.origins[scope.start];
                let end = outline
                    .origins
                    .get(scope.end)
                    .copied()
                    .unwrap_or(outline.node_count);
                start..end
            }
        }
    }
}

fn title_style(level: u8) -> Style {
    match level {
        0 | 1 => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        2 => Style::default().add_modifier(Modifier::BOLD),
        _ => Style::default(),
    }
}

fn render_branch(
    doc: Document<'_>,
    prefix: &str,
    is_last: bool,
    width: usize,
    lines: &mut Vec<AttributedString>,
) {
    let branch = Style::default().fg(Color::Blue);
    let (connector, continuation) = if is_last {
        ("└── ", "    ")
    } else {
        ("├── ", "│   ")
    };
    let first = AttributedString::styled(format!("{prefix}{connector}"), branch);
    let rest = AttributedString::styled(format!("{prefix}{continuation}"), branch);
    lines.extend(wrap_entry(
        first,
        rest.clone(),
        doc.search_term(),
        title_style(doc.level()),
        width,
    ));

    let child_prefix = format!("{prefix}{continuation}");
    let children: Vec<_> = doc.children().collect();
    for (i, child) in children.iter().enumerate() {
        render_branch(*child, &child_prefix, i + 1 == children.len(), width, lines);
    }
}

/// `first` + title, wrapped to `width`, continuation lines prefixed with `rest`.
fn wrap_entry(
    first: AttributedString,
    rest: AttributedString,
    title: &str,
    style: Style,
    width: usize,
) -> Vec<AttributedString> {
    let mut out = Vec::new();
    let mut remaining = AttributedString::styled(title, style);
    let mut prefix = first;
    loop {
        let room = width.saturating_sub(prefix.width()).max(1);
        let (line, tail) = remaining.take_line(room, room);
        out.push(prefix + line);
        if tail.is_empty() {
            return out;
        }
        remaining = tail;
        prefix = rest.clone();
    }
}
