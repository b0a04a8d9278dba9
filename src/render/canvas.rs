//! The character-cell surface the renderer draws into.

use super::attributed::{AttributedSegment, AttributedString};
use ratatui::style::Style;
use ratatui::text::Line;
use unicode_width::UnicodeWidthChar;

/// A bounded-width grid of styled character cells.
///
/// Writes past the right edge are clipped. Rows below the last one are
/// created on demand; the renderer reports how many it used.
pub trait Canvas {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Style of cells nothing has been drawn into; the renderer starts from it.
    fn base_style(&self) -> Style;

    /// Draw `text` starting at column `x` of row `y`.
    fn draw_str(&mut self, text: &str, x: usize, y: usize, style: Style);

    fn draw_char(&mut self, ch: char, x: usize, y: usize, style: Style) {
        let mut buf = [0u8; 4];
        self.draw_str(ch.encode_utf8(&mut buf), x, y, style);
    }

    /// Draw each segment of `line` in its own style, left to right from column `x`.
    fn draw_attributed(&mut self, line: &AttributedString, x: usize, y: usize) {
        let mut x = x;
        for segment in line.segments() {
            self.draw_str(&segment.text, x, y, segment.style());
            x += super::wrap::display_width(&segment.text);
        }
    }
}

/// One cell. A wide character occupies its own cell and an empty continuation cell after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub symbol: String,
    pub style: Style,
}

impl Cell {
    fn blank(style: Style) -> Self {
        Self {
            symbol: " ".to_string(),
            style,
        }
    }
}

/// In-memory canvas with a fixed width and as many rows as have been drawn to.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    base_style: Style,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(width: usize) -> Self {
        Self::with_style(width, Style::default())
    }

    pub fn with_style(width: usize, base_style: Style) -> Self {
        Self {
            width,
            base_style,
            rows: Vec::new(),
        }
    }

    fn row_mut(&mut self, y: usize) -> &mut Vec<Cell> {
        while self.rows.len() <= y {
            self.rows.push(vec![Cell::blank(self.base_style); self.width]);
        }
        &mut self.rows[y]
    }

    /// Cells of row `y` up to the last one that was drawn with visible content or a non-base style.
    fn used_cells(&self, y: usize) -> &[Cell] {
        let Some(row) = self.rows.get(y) else {
            return &[];
        };
        let end = row
            .iter()
            .rposition(|c| c.symbol != " " || c.style != self.base_style)
            .map_or(0, |i| i + 1);
        &row[..end]
    }

    /// Plain text of a row, trailing blanks trimmed.
    pub fn row_text(&self, y: usize) -> String {
        let text: String = self.used_cells(y).iter().map(|c| c.symbol.as_str()).collect();
        text.trim_end().to_string()
    }

    /// Plain text of every row.
    pub fn lines(&self) -> Vec<String> {
        (0..self.rows.len()).map(|y| self.row_text(y)).collect()
    }

    /// A row as an attributed string, adjacent cells with equal style merged.
    pub fn row(&self, y: usize) -> AttributedString {
        let mut out = AttributedString::new();
        let mut current: Option<AttributedSegment> = None;
        for cell in self.used_cells(y) {
            match &mut current {
                Some(segment) if segment.style() == normalized(cell.style) => {
                    segment.text.push_str(&cell.symbol);
                }
                _ => {
                    out.extend(current.take());
                    current = Some(AttributedSegment::new(cell.symbol.as_str(), cell.style));
                }
            }
        }
        out.extend(current);
        out
    }

    /// Every row as a ratatui line.
    pub fn to_lines(&self) -> Vec<Line<'static>> {
        (0..self.rows.len()).map(|y| self.row(y).to_line()).collect()
    }
}

/// The style an [`AttributedSegment`] built from `style` reports.
fn normalized(style: Style) -> Style {
    AttributedSegment::new("", style).style()
}

impl Canvas for Grid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.rows.len()
    }

    fn base_style(&self) -> Style {
        self.base_style
    }

    fn draw_str(&mut self, text: &str, x: usize, y: usize, style: Style) {
        let width = self.width;
        let row = self.row_mut(y);
        let mut x = x;
        // cell that zero-width characters attach to
        let mut last = x.checked_sub(1);

        for ch in text.chars() {
            let ch = if ch == '\0' { ' ' } else { ch };
            match ch.width() {
                None => {}
                Some(0) => {
                    if let Some(cell) = last.and_then(|i| row.get_mut(i)) {
                        cell.symbol.push(ch);
                    }
                }
                Some(w) => {
                    if x + w <= width {
                        row[x] = Cell {
                            symbol: ch.to_string(),
                            style,
                        };
                        if w == 2 {
                            row[x + 1] = Cell {
                                symbol: String::new(),
                                style,
                            };
                        }
                        last = Some(x);
                    } else {
                        last = None;
                    }
                    x += w;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::{Color, Modifier};

    #[test]
    fn test_draw_and_read_back() {
        let mut grid = Grid::new(10);
        grid.draw_str("hello", 2, 1, Style::default());
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.lines(), vec!["", "  hello"]);
    }

    #[test]
    fn test_clips_at_width() {
        let mut grid = Grid::new(5);
        grid.draw_str("abcdefgh", 2, 0, Style::default());
        assert_eq!(grid.row_text(0), "  abc");
    }

    #[test]
    fn test_null_is_blank_and_zero_width_attaches() {
        let mut grid = Grid::new(10);
        grid.draw_str("a\u{0336}b\u{0336}\0\0", 0, 0, Style::default());
        assert_eq!(grid.row_text(0), "a\u{0336}b\u{0336}");

        grid.draw_char('x', 4, 0, Style::default());
        assert_eq!(grid.row_text(0), "a\u{0336}b\u{0336}  x");
    }

    #[test]
    fn test_wide_characters_take_two_cells() {
        let mut grid = Grid::new(6);
        grid.draw_str("日本語", 0, 0, Style::default());
        assert_eq!(grid.row_text(0), "日本語");
        grid.draw_str("x", 1, 1, Style::default());
        grid.draw_str("日本語", 1, 1, Style::default());
        // the last ideograph would straddle the edge
        assert_eq!(grid.row_text(1), " 日本");
    }

    #[test]
    fn test_row_merges_styles() {
        let red = Style::new().fg(Color::Red);
        let bold = Style::new().add_modifier(Modifier::BOLD);
        let mut grid = Grid::new(20);
        grid.draw_str("ab", 0, 0, red);
        grid.draw_str("cd", 2, 0, red);
        grid.draw_str("ef", 5, 0, bold);

        let row = grid.row(0);
        let texts: Vec<_> = row.segments().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", " ", "ef"]);
        assert_eq!(row.segments()[0].fg, Color::Red);
        assert_eq!(grid.to_lines().len(), 1);
    }

    #[test]
    fn test_styled_blanks_are_kept() {
        let mut grid = Grid::new(8);
        grid.draw_str("\0\0\0", 0, 0, Style::new().bg(Color::Black));
        assert_eq!(grid.row(0).width(), 3);
        assert_eq!(grid.row_text(0), "");
    }

    #[test]
    fn test_draw_attributed_keeps_segment_styles() {
        let red = Style::new().fg(Color::Red);
        let line = AttributedString::styled("ab", red) + AttributedString::plain("cd");
        let mut grid = Grid::new(8);
        grid.draw_attributed(&line, 1, 0);
        assert_eq!(grid.row_text(0), " abcd");
        assert_eq!(grid.row(0).segments()[1].fg, Color::Red);
    }
}
