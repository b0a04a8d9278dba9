use regex::Regex;
use std::sync::OnceLock;

/// Combining long stroke overlay, drawn over the character before it.
pub const STRIKETHROUGH_COMBINING: char = '\u{0336}';

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Collapse every run of whitespace (newlines included) to a single space.
pub fn normalise_whitespace(text: &str) -> String {
    whitespace_run().replace_all(text, " ").into_owned()
}

/// Tabs become two spaces in preformatted text.
pub fn expand_tabs(text: &str) -> String {
    text.replace('\t', "  ")
}

/// Follow every non-space character with the combining strikethrough mark.
///
/// Spaces are left bare so the result still splits into words.
pub fn strikethrough(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for ch in text.chars() {
        out.push(ch);
        if ch != ' ' {
            out.push(STRIKETHROUGH_COMBINING);
        }
    }
    out
}

pub fn is_blank_line(line: &str) -> bool {
    line.chars().all(char::is_whitespace)
}
