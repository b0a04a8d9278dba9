//! Line wrapping for the character grid.
//!
//! Widths are terminal columns (wide characters count as two, combining
//! marks as zero). Words are separated by single spaces; text is expected to
//! be whitespace-normalised before it gets here.

use tracing::trace;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of `text` in terminal columns.
pub fn display_width(text: &str) -> usize {
    text.width()
}

/// Result of cutting one line off a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSlice<'a> {
    /// Text for the current line; empty when the caller must break first.
    pub line: &'a str,
    /// What is left for following lines.
    pub remainder: &'a str,
    /// `true` when `line` is the whole input.
    pub complete: bool,
}

/// Cut the part of `text` that goes on a line with `remaining` free columns.
///
/// In order of preference:
/// 1. the whole text, if it fits;
/// 2. the longest run of whole words that fits;
/// 3. nothing, if even the first word is too wide here but a fresh line
///    (`max_width` columns) is wider;
/// 4. a hard cut at `remaining` columns, dropping one leading space from
///    the remainder.
pub fn slice_for_line(text: &str, remaining: usize, max_width: usize) -> LineSlice<'_> {
    if text.width() <= remaining {
        return LineSlice {
            line: text,
            remainder: "",
            complete: true,
        };
    }

    let (segment, rest) = find_longest_non_breaking_segment(text, remaining);
    if segment.width() <= remaining {
        return LineSlice {
            line: segment,
            remainder: rest,
            complete: false,
        };
    }

    if remaining < max_width {
        return LineSlice {
            line: "",
            remainder: text,
            complete: false,
        };
    }

    let (line, rest) = split_at_width(text, remaining);
    trace!(line, "forced word break");
    LineSlice {
        line,
        remainder: rest.strip_prefix(' ').unwrap_or(rest),
        complete: false,
    }
}

/// Longest prefix of whole words whose width is at most `range`.
///
/// Greedily extends word by word and stops before the limit is exceeded.
/// The first word is always taken, even when it alone is wider than
/// `range`; callers compare widths to detect that case.
pub fn find_longest_non_breaking_segment(text: &str, range: usize) -> (&str, &str) {
    if text.width() <= range {
        return (text, "");
    }

    let Some(mut end) = text.find(' ') else {
        return (text, "");
    };
    let mut width = text[..end].width();

    loop {
        let word_start = end + 1;
        let next = text[word_start..]
            .find(' ')
            .map_or(text.len(), |p| word_start + p);
        let extended = width + 1 + text[word_start..next].width();
        if extended > range || next == text.len() {
            if extended <= range {
                return (text, "");
            }
            return (&text[..end], &text[word_start..]);
        }
        width = extended;
        end = next;
    }
}

/// Split at the last character boundary that keeps the head within `width`
/// columns. Always takes at least one character so callers make progress;
/// zero-width characters stay with the character they follow.
fn split_at_width(text: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    let mut cut = 0;
    for (i, ch) in text.char_indices() {
        let w = ch.width().unwrap_or(0);
        if w > 0 && used + w > width && cut > 0 {
            break;
        }
        used += w;
        cut = i + ch.len_utf8();
    }
    text.split_at(cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_find_longest_non_breaking_segment() {
        let text = "one two three four five";
        for range in 7..=12 {
            assert_eq!(
                find_longest_non_breaking_segment(text, range),
                ("one two", "three four five"),
                "range {range}"
            );
        }
        assert_eq!(
            find_longest_non_breaking_segment(text, 13),
            ("one two three", "four five")
        );
        assert_eq!(find_longest_non_breaking_segment(text, 100), (text, ""));
        assert_eq!(find_longest_non_breaking_segment(text, 2), ("one", "two three four five"));
    }

    #[test]
    fn test_slice_for_line_when_whole_string_fits() {
        let slice = slice_for_line("one two three four five", 100, 100);
        assert_eq!(
            slice,
            LineSlice {
                line: "one two three four five",
                remainder: "",
                complete: true,
            }
        );
    }

    #[test]
    fn test_slice_for_line_by_width() {
        let text = "one two three four five";
        for width in 0..25 {
            let expected = match width {
                0..=2 => ("", text, false),
                3..=6 => ("one", "two three four five", false),
                7..=12 => ("one two", "three four five", false),
                13..=17 => ("one two three", "four five", false),
                18..=22 => ("one two three four", "five", false),
                _ => (text, "", true),
            };
            let slice = slice_for_line(text, width, 100);
            assert_eq!(
                (slice.line, slice.remainder, slice.complete),
                expected,
                "width {width}"
            );
        }
    }

    #[test]
    fn test_slice_for_line_when_no_break() {
        let text = "onehellolongwordthatdoesntbreak is that a fact?";

        // a wider line might fit the word, so defer
        let slice = slice_for_line(text, 10, 11);
        assert_eq!((slice.line, slice.remainder, slice.complete), ("", text, false));

        // does chop if the next line isn't going to be any wider
        let slice = slice_for_line(text, 10, 10);
        assert_eq!(slice.line, "onehellolo");
        assert_eq!(slice.remainder, "ngwordthatdoesntbreak is that a fact?");
        assert!(!slice.complete);
    }

    #[test]
    fn test_forced_break_drops_one_leading_space() {
        let slice = slice_for_line("abcdef ghi", 6, 6);
        assert_eq!(slice.line, "abcdef");
        assert_eq!(slice.remainder, "ghi");
    }

    #[test]
    fn test_wide_characters() {
        // each ideograph is two columns
        assert_eq!(display_width("日本語"), 6);
        let slice = slice_for_line("日本 語", 5, 10);
        assert_eq!((slice.line, slice.remainder), ("日本", "語"));

        let slice = slice_for_line("日本語", 5, 5);
        assert_eq!((slice.line, slice.remainder), ("日本", "語"));
    }

    #[test]
    fn test_forced_break_always_progresses() {
        let slice = slice_for_line("abc", 0, 0);
        assert_eq!((slice.line, slice.remainder), ("a", "bc"));

        // combining marks stay with their base character
        let slice = slice_for_line("a\u{0336}b\u{0336}", 1, 1);
        assert_eq!(slice.line, "a\u{0336}");
    }

    fn words() -> impl Strategy<Value = String> {
        proptest::collection::vec("[a-z]{1,8}", 1..12).prop_map(|w| w.join(" "))
    }

    proptest! {
        #[test]
        fn prop_complete_iff_fits(text in words(), width in 1usize..60) {
            let slice = slice_for_line(&text, width, 60);
            prop_assert_eq!(slice.complete, display_width(&text) <= width);
            if slice.complete {
                prop_assert_eq!(slice.line, text.as_str());
            }
        }

        #[test]
        fn prop_breaks_at_word_boundary(text in words(), width in 1usize..60) {
            let slice = slice_for_line(&text, width, 60);
            if !slice.complete && !slice.line.is_empty() {
                let first_word = text.split(' ').next().unwrap_or_default();
                if display_width(first_word) <= width {
                    prop_assert!(display_width(slice.line) <= width);
                    prop_assert_eq!(format!("{} {}", slice.line, slice.remainder), text.clone());
                }
            }
        }

        #[test]
        fn prop_rewrapping_is_stable(text in words(), width in 1usize..60) {
            let first = slice_for_line(&text, width, 60);
            if !first.complete && !first.line.is_empty() {
                let joined = format!("{} {}", first.line, first.remainder);
                let second = slice_for_line(&joined, width, 60);
                prop_assert_eq!(first, second);
            }
        }
    }
}
