//! Text layout of a markup tree onto a character grid.
//!
//! [`render_html`] walks the tree depth first. Each handler receives a
//! [`RenderingContext`] by value (margins, pen style, cursor, list state)
//! and returns a [`PostRenderingContext`] with the cursor and flags after
//! it; the parent folds that into its own context before visiting the next
//! sibling. Nothing else carries state between nodes.
//!
//! Layout rules in brief:
//! - block tags leave a two-row gap before their content, once;
//! - headings get a `│` bar on the left and a `└┴──` rule below;
//! - text is whitespace-normalised and word-wrapped between the margins;
//! - preformatted text is drawn verbatim inside a padded box.

pub mod ansi;
pub mod attributed;
pub mod canvas;
pub mod util;
pub mod wrap;

pub use attributed::{AttributedSegment, AttributedString};
pub use canvas::{Canvas, Grid};
pub use wrap::{LineSlice, display_width, find_longest_non_breaking_segment, slice_for_line};

use crate::markup::{ElementNode, Node, Tag};
use ratatui::style::{Color, Modifier, Style};
use tracing::{debug, trace};
use util::{expand_tabs, is_blank_line, normalise_whitespace, strikethrough};

/// Rows left empty between blocks, plus the row the cursor moves off.
const BLOCK_GAP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Margins {
    left: usize,
    right: usize,
    top: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    /// Items print `list_item_index + 1`, so `<ol start="n">` begins at
    /// index `n - 1` and its first item reads `n.`; without `start` the
    /// index begins at 0.
    Ordered,
}

/// Layout state handed down to a node.
#[derive(Debug, Clone, Copy)]
pub struct RenderingContext {
    margins: Margins,
    pen: Style,
    cursor_x: usize,
    cursor_y: usize,
    /// The last text drawn ended in a space.
    ends_in_whitespace: bool,
    /// A block gap has just been emitted.
    did_end_block: bool,
    preformatted: bool,
    strikethrough: bool,
    list_tier: usize,
    list_item_index: usize,
    list_kind: ListKind,
}

/// Layout state handed back up after a node has been drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostRenderingContext {
    cursor_x: usize,
    cursor_y: usize,
    ends_in_whitespace: bool,
    did_end_block: bool,
    list_item_index: usize,
}

impl RenderingContext {
    fn new(width: usize, pen: Style) -> Self {
        let margins = Margins {
            left: 0,
            right: width,
            top: 0,
        };
        Self {
            margins,
            pen,
            cursor_x: margins.left,
            cursor_y: margins.top,
            ends_in_whitespace: false,
            // nothing above the first block, so no gap
            did_end_block: true,
            preformatted: false,
            strikethrough: false,
            list_tier: 0,
            list_item_index: 0,
            list_kind: ListKind::Unordered,
        }
    }

    fn apply_post(mut self, post: PostRenderingContext) -> Self {
        self.cursor_x = post.cursor_x;
        self.cursor_y = post.cursor_y;
        self.ends_in_whitespace = post.ends_in_whitespace;
        self.did_end_block = post.did_end_block;
        self.list_item_index = post.list_item_index;
        self
    }

    fn with_left_margin(mut self, left: usize) -> Self {
        self.margins.left = left;
        self.cursor_x = left;
        self
    }

    fn apply_block(mut self) -> Self {
        if !self.did_end_block {
            self.cursor_y += BLOCK_GAP;
            self.did_end_block = true;
        }
        self.cursor_x = self.margins.left;
        self
    }

    fn box_width(&self) -> usize {
        self.margins.right.saturating_sub(self.margins.left)
    }

    fn post(&self) -> PostRenderingContext {
        PostRenderingContext {
            cursor_x: self.cursor_x,
            cursor_y: self.cursor_y,
            ends_in_whitespace: self.ends_in_whitespace,
            did_end_block: self.did_end_block,
            list_item_index: self.list_item_index,
        }
    }
}

impl PostRenderingContext {
    fn apply_block(mut self, outer: &RenderingContext) -> Self {
        if !self.did_end_block {
            self.cursor_y += BLOCK_GAP;
        }
        self.did_end_block = true;
        self.cursor_x = outer.margins.left;
        self
    }
}

/// Lay out `root` onto `canvas` and return the row the cursor ends on.
///
/// The canvas width bounds every line; rows are used as needed, so the
/// return value is the height a scrolling view needs.
pub fn render_html<C: Canvas + ?Sized>(root: &Node, canvas: &mut C) -> usize {
    let ctx = RenderingContext::new(canvas.width(), canvas.base_style());
    let mut renderer = Renderer { canvas };
    renderer.node(root, ctx).cursor_y
}

struct Renderer<'a, C: ?Sized> {
    canvas: &'a mut C,
}

impl<C: Canvas + ?Sized> Renderer<'_, C> {
    fn node(&mut self, node: &Node, ctx: RenderingContext) -> PostRenderingContext {
        match node {
            Node::Element(el) => self.element(el, ctx),
            Node::Text(text) => self.text(text, ctx),
        }
    }

    fn element(&mut self, el: &ElementNode, outer: RenderingContext) -> PostRenderingContext {
        let Some(tag) = el.known_tag() else {
            trace!(tag = %el.tag, "not rendering unknown tag");
            return outer.post();
        };

        let mut ctx = if tag.is_block() {
            outer.apply_block()
        } else {
            outer
        };

        match tag {
            Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6 => {
                return self.heading(el, tag, ctx);
            }
            Tag::Hr => return self.rule(ctx),
            Tag::Ul | Tag::Ol => return self.list(el, tag, ctx),
            Tag::A => return self.anchor(el, ctx),
            Tag::Code => ctx.pen = ctx.pen.fg(Color::White).bg(Color::Black),
            Tag::Pre => ctx.preformatted = true,
            Tag::Em => ctx.pen = ctx.pen.add_modifier(Modifier::UNDERLINED),
            Tag::Strong => ctx.pen = ctx.pen.add_modifier(Modifier::BOLD),
            Tag::Dl | Tag::Dd => ctx = ctx.with_left_margin(ctx.margins.left + 2),
            Tag::Dt => ctx.pen = ctx.pen.fg(Color::Green).add_modifier(Modifier::BOLD),
            Tag::Li => {
                let bullet = match ctx.list_kind {
                    ListKind::Ordered => format!("{}.", ctx.list_item_index + 1),
                    ListKind::Unordered => " •".to_string(),
                };
                self.canvas.draw_str(
                    &bullet,
                    ctx.margins.left,
                    ctx.cursor_y,
                    ctx.pen.fg(Color::Magenta),
                );
                ctx = ctx.with_left_margin(ctx.margins.left + 3);
                ctx.list_item_index += 1;
            }
            Tag::Del => ctx.strikethrough = true,
            _ => {}
        }

        self.children(el, tag, ctx, &outer)
    }

    /// Render children left to right, threading the context through.
    /// A block closes with a gap and returns to `outer`'s left margin.
    fn children(
        &mut self,
        el: &ElementNode,
        tag: Tag,
        ctx: RenderingContext,
        outer: &RenderingContext,
    ) -> PostRenderingContext {
        let mut ctx = ctx;
        let mut post = ctx.post();
        for child in &el.children {
            post = self.node(child, ctx);
            ctx = ctx.apply_post(post);
        }
        if tag.is_block() {
            post = post.apply_block(outer);
        }
        post
    }

    fn heading(&mut self, el: &ElementNode, tag: Tag, outer: RenderingContext) -> PostRenderingContext {
        let level = usize::from(tag.heading_level().unwrap_or(1));
        let pad = 7 - level;
        let bar = "│".repeat(pad);
        let joint = format!("└{}", "┴".repeat(pad - 1));
        let rule_style = outer.pen.fg(Color::Blue);

        let mut ctx = outer.with_left_margin(outer.margins.left + pad + 1);
        ctx.pen = ctx.pen.fg(Color::Red).add_modifier(Modifier::BOLD);
        let mut post = self.children(el, tag, ctx, &outer);

        // the closing gap leaves two rows; the joint goes on the first
        if post.did_end_block && post.cursor_y > outer.cursor_y {
            post.cursor_y -= 1;
        }
        let y_end = post.cursor_y.max(outer.cursor_y);

        for y in outer.cursor_y..y_end {
            self.canvas.draw_str(&bar, outer.margins.left, y, rule_style);
        }
        self.canvas
            .draw_str(&joint, outer.margins.left, y_end, rule_style);
        let rule_len = self
            .canvas
            .width()
            .saturating_sub(outer.margins.left + pad + 1);
        self.canvas.draw_str(
            &"─".repeat(rule_len),
            outer.margins.left + pad,
            y_end,
            rule_style,
        );

        PostRenderingContext {
            cursor_x: outer.margins.left,
            cursor_y: y_end + BLOCK_GAP,
            did_end_block: true,
            ..post
        }
    }

    fn rule(&mut self, ctx: RenderingContext) -> PostRenderingContext {
        let line = "─".repeat(self.canvas.width());
        self.canvas
            .draw_str(&line, 0, ctx.cursor_y, ctx.pen.fg(Color::Magenta));
        PostRenderingContext {
            did_end_block: false,
            ..ctx.post()
        }
        .apply_block(&ctx)
    }

    fn list(&mut self, el: &ElementNode, tag: Tag, outer: RenderingContext) -> PostRenderingContext {
        let mut ctx = outer;
        ctx.list_tier += 1;
        ctx.list_item_index = list_start_index(el);
        ctx.list_kind = if tag == Tag::Ol {
            ListKind::Ordered
        } else {
            ListKind::Unordered
        };
        ctx = ctx.with_left_margin(ctx.margins.left + 2);
        trace!(tier = ctx.list_tier, kind = ?ctx.list_kind, "list");

        let mut post = self.children(el, tag, ctx, &outer);
        // numbering of an enclosing list continues where it was
        post.list_item_index = outer.list_item_index;
        post
    }

    fn anchor(&mut self, el: &ElementNode, ctx: RenderingContext) -> PostRenderingContext {
        let Some(href) = el.attribute("href") else {
            return self.children(el, Tag::A, ctx, &ctx);
        };

        if el.sole_text() == Some(href) {
            let mut ctx = ctx;
            ctx.pen = ctx.pen.fg(Color::Blue);
            return self.children(el, Tag::A, ctx, &ctx);
        }

        let post = self.children(el, Tag::A, ctx, &ctx);
        let left = ctx.margins.left;
        let right = ctx.margins.right;
        let paren_style = ctx.pen.fg(Color::Magenta);
        let href_style = ctx.pen.fg(Color::Blue);

        let mut x = post.cursor_x + 1;
        let mut y = post.cursor_y;
        if x >= right {
            x = left;
            y += 1;
        }
        self.canvas.draw_char('@', x, y, paren_style);
        x += 1;

        let target = format!("({href})");
        let mut rest = target.as_str();
        let mut opening = None;
        loop {
            let slice = slice_for_line(rest, right.saturating_sub(x), ctx.box_width());
            if opening.is_none() && !slice.line.is_empty() {
                opening = Some((x, y));
            }
            self.canvas.draw_str(slice.line, x, y, href_style);
            if slice.complete {
                x += display_width(slice.line);
                break;
            }
            x = left;
            y += 1;
            rest = slice.remainder;
        }

        // the target was drawn as one run; recolor its parentheses
        if let Some((ox, oy)) = opening {
            self.canvas.draw_char('(', ox, oy, paren_style);
        }
        self.canvas
            .draw_char(')', x.saturating_sub(1), y, paren_style);

        PostRenderingContext {
            cursor_x: x,
            cursor_y: y,
            ..post
        }
    }

    fn text(&mut self, raw: &str, ctx: RenderingContext) -> PostRenderingContext {
        if ctx.preformatted {
            return self.preformatted_text(raw, ctx);
        }

        let normal = normalise_whitespace(raw);
        let starts_with_space = normal.starts_with(' ');
        let ends_with_space = normal.ends_with(' ');
        let trimmed = if starts_with_space
            && (ctx.ends_in_whitespace || ctx.cursor_x == ctx.margins.left)
        {
            normal.trim_start_matches(' ')
        } else {
            normal.as_str()
        };
        let text = if ctx.strikethrough {
            strikethrough(trimmed)
        } else {
            trimmed.to_string()
        };

        if display_width(&text) == 0 {
            return ctx.post();
        }

        let box_width = ctx.box_width();
        let mut x = ctx.cursor_x;
        let mut y = ctx.cursor_y;
        if x > ctx.margins.right {
            x = ctx.margins.left;
            y += 1;
        }
        let mut room = ctx.margins.right.saturating_sub(x);
        let mut rest = text.as_str();

        loop {
            let slice = slice_for_line(rest, room, box_width);
            self.canvas.draw_str(slice.line, x, y, ctx.pen);
            if slice.complete {
                x += display_width(slice.line);
                break;
            }
            x = ctx.margins.left;
            y += 1;
            room = box_width;
            rest = slice.remainder;
        }

        PostRenderingContext {
            cursor_x: x,
            cursor_y: y,
            ends_in_whitespace: ends_with_space,
            did_end_block: false,
            list_item_index: ctx.list_item_index,
        }
    }

    fn preformatted_text(&mut self, raw: &str, ctx: RenderingContext) -> PostRenderingContext {
        let text = expand_tabs(raw);
        let box_width = self.canvas.width().saturating_sub(ctx.margins.left + 1);
        let blank = "\0".repeat(box_width);
        let lines: Vec<&str> = text.split('\n').collect();
        let mut y = ctx.cursor_y;

        if !lines.first().is_some_and(|l| is_blank_line(l)) {
            self.canvas.draw_str(&blank, ctx.margins.left, y, ctx.pen);
            y += 1;
        }
        for line in &lines {
            let pad = box_width.saturating_sub(display_width(line));
            let padded = format!("{line}{}", "\0".repeat(pad));
            self.canvas.draw_str(&padded, ctx.margins.left, y, ctx.pen);
            y += 1;
        }
        if !lines.last().is_some_and(|l| is_blank_line(l)) {
            self.canvas.draw_str(&blank, ctx.margins.left, y, ctx.pen);
            y += 1;
        }

        PostRenderingContext {
            cursor_y: y + 1,
            did_end_block: true,
            ..ctx.post()
        }
    }
}

/// Index of the first item of a list: `start - 1` for `<ol start>`, else 0.
fn list_start_index(el: &ElementNode) -> usize {
    let Some(start) = el.attribute("start") else {
        return 0;
    };
    match start.trim().parse::<usize>() {
        Ok(n) => n.saturating_sub(1),
        Err(err) => {
            debug!(start, %err, "ignoring list start attribute");
            0
        }
    }
}
