//! Attributed strings: text runs with colors and modifiers.

use super::wrap::{display_width, slice_for_line};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::ops::Add;

/// A run of text with one set of attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedSegment {
    pub text: String,
    pub fg: Color,
    pub bg: Color,
    pub modifiers: Modifier,
}

impl AttributedSegment {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            fg: style.fg.unwrap_or(Color::Reset),
            bg: style.bg.unwrap_or(Color::Reset),
            modifiers: style.add_modifier,
        }
    }

    pub fn style(&self) -> Style {
        Style::new()
            .fg(self.fg)
            .bg(self.bg)
            .add_modifier(self.modifiers)
    }

    fn with_text(&self, text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..self.clone()
        }
    }
}

/// An ordered sequence of attributed segments.
///
/// Concatenation (`+`) is associative and keeps segment boundaries, so two
/// adjacent segments with the same attributes are not merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributedString {
    segments: Vec<AttributedSegment>,
}

impl AttributedString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, Style::default())
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self {
            segments: vec![AttributedSegment::new(text, style)],
        }
    }

    pub fn segments(&self) -> &[AttributedSegment] {
        &self.segments
    }

    pub fn push(&mut self, segment: AttributedSegment) {
        self.segments.push(segment);
    }

    /// Display width in terminal columns.
    pub fn width(&self) -> usize {
        self.segments.iter().map(|s| display_width(&s.text)).sum()
    }

    /// The text without attributes.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.is_empty())
    }

    /// Split off the part that fits on a line of `length` columns.
    ///
    /// Whole segments are taken while they fit; the first one that doesn't is
    /// cut with [`slice_for_line`], so word boundaries inside it are
    /// respected. `max_length` is the width of a fresh line, which decides
    /// whether an over-long word is deferred or chopped.
    pub fn take_line(&self, length: usize, max_length: usize) -> (Self, Self) {
        let mut line = Self::new();
        let mut remaining = length;
        let mut segments = self.segments.iter();

        for segment in segments.by_ref() {
            let width = display_width(&segment.text);
            if width <= remaining {
                line.push_non_empty(segment.clone());
                remaining -= width;
                continue;
            }

            let slice = slice_for_line(&segment.text, remaining, max_length);
            line.push_non_empty(segment.with_text(slice.line));
            let mut rest = Self::new();
            rest.push_non_empty(segment.with_text(slice.remainder));
            rest.segments.extend(segments.cloned());
            return (line, rest);
        }

        (line, Self::new())
    }

    fn push_non_empty(&mut self, segment: AttributedSegment) {
        if !segment.text.is_empty() {
            self.segments.push(segment);
        }
    }

    /// Convert to a ratatui line, one span per segment.
    pub fn to_line(&self) -> Line<'static> {
        Line::from(
            self.segments
                .iter()
                .map(|s| Span::styled(s.text.clone(), s.style()))
                .collect::<Vec<_>>(),
        )
    }
}

impl Add for AttributedString {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.segments.extend(rhs.segments);
        self
    }
}

impl Extend<AttributedSegment> for AttributedString {
    fn extend<I: IntoIterator<Item = AttributedSegment>>(&mut self, iter: I) {
        self.segments.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blue(text: &str) -> AttributedString {
        AttributedString::styled(text, Style::new().fg(Color::Black).bg(Color::Blue))
    }

    fn cyan(text: &str) -> AttributedString {
        AttributedString::styled(text, Style::new().fg(Color::Black).bg(Color::Cyan))
    }

    #[test]
    fn test_take_line_no_truncate() {
        let s = blue("hello");
        let (line, rest) = s.take_line(10, 100);
        assert_eq!(line, s);
        assert!(rest.is_empty());
        assert_eq!(rest.segments().len(), 0);
    }

    #[test]
    fn test_take_line() {
        let s = blue("hello is it me you're looking for?");
        let (line, rest) = s.take_line(10, 100);
        assert_eq!(line, blue("hello is"));
        assert_eq!(rest, blue("it me you're looking for?"));
    }

    #[test]
    fn test_take_line_multiple_segments() {
        let s = blue("hello!") + cyan(" is it me you're looking for?");
        let (line, rest) = s.take_line(10, 100);
        assert_eq!(line, blue("hello!") + cyan(" is"));
        assert_eq!(rest, cyan("it me you're looking for?"));
    }

    #[test]
    fn test_take_line_defers_long_word() {
        let s = blue("ab ") + cyan("unbreakable");
        let (line, rest) = s.take_line(6, 20);
        assert_eq!(line, blue("ab "));
        assert_eq!(rest, cyan("unbreakable"));

        // a fresh line can't be any wider, so the word is chopped
        let (line, rest) = cyan("unbreakable").take_line(6, 6);
        assert_eq!(line, cyan("unbrea"));
        assert_eq!(rest, cyan("kable"));
    }

    #[test]
    fn test_concatenation() {
        let a = blue("a");
        let b = cyan("b");
        let c = AttributedString::plain("c");
        assert_eq!((a.clone() + b.clone()) + c.clone(), a + (b + c));

        let s = blue("日本") + AttributedString::plain(" x");
        assert_eq!(s.width(), 6);
        assert_eq!(s.text(), "日本 x");
    }

    #[test]
    fn test_to_line() {
        let s = blue("one") + AttributedString::styled("two", Style::new().add_modifier(Modifier::BOLD));
        let line = s.to_line();
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].content, "one");
        assert_eq!(line.spans[0].style.bg, Some(Color::Blue));
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }
}
