//! Writing a rendered grid to a plain terminal stream.

use super::canvas::{Canvas, Grid};
use crossterm::queue;
use crossterm::style::{
    Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
    SetForegroundColor,
};
use ratatui::style::{Color, Modifier};
use std::io::{self, Write};

/// Write every row of `grid` with ANSI colors and attributes.
pub fn write_styled<W: Write>(out: &mut W, grid: &Grid) -> io::Result<()> {
    for y in 0..grid.height() {
        for segment in grid.row(y).segments() {
            queue!(
                out,
                SetForegroundColor(term_color(segment.fg)),
                SetBackgroundColor(term_color(segment.bg))
            )?;
            for attribute in term_attributes(segment.modifiers) {
                queue!(out, SetAttribute(attribute))?;
            }
            queue!(
                out,
                Print(&segment.text),
                SetAttribute(Attribute::Reset),
                ResetColor
            )?;
        }
        queue!(out, Print("\n"))?;
    }
    out.flush()
}

/// Write every row of `grid` as bare text.
pub fn write_plain<W: Write>(out: &mut W, grid: &Grid) -> io::Result<()> {
    for line in grid.lines() {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Reset => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        Color::Indexed(i) => TermColor::AnsiValue(i),
    }
}

fn term_attributes(modifiers: Modifier) -> Vec<Attribute> {
    [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
        (Modifier::ITALIC, Attribute::Italic),
    ]
    .into_iter()
    .filter(|(m, _)| modifiers.contains(*m))
    .map(|(_, a)| a)
    .collect()
}
