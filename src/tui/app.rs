use crate::library::Note;
use crate::markup::Node;
use crate::render::{Grid, render_html};
use crossterm::event::KeyCode;
use ratatui::text::Line;
use tracing::{debug, warn};

/// Share of the screen given to the outline pane, in percent.
pub const OUTLINE_WIDTH: u16 = 30;

pub struct App {
    pub note: Note,
    /// Section query the pager is restricted to, if any.
    pub section: Option<String>,
    max_width: Option<u16>,

    lines: Vec<Line<'static>>,
    outline_lines: Vec<Line<'static>>,
    /// Widths the current lines were laid out for; `None` forces a re-render.
    rendered_widths: Option<(u16, u16)>,

    pub scroll: u16,
    viewport_height: u16,
    pub show_outline: bool,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(note: Note, section: Option<String>, max_width: Option<u16>) -> Self {
        Self {
            note,
            section,
            max_width,
            lines: Vec::new(),
            outline_lines: Vec::new(),
            rendered_widths: None,
            scroll: 0,
            viewport_height: 0,
            show_outline: false,
            status_message: None,
            should_quit: false,
        }
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    pub fn outline_lines(&self) -> &[Line<'static>] {
        &self.outline_lines
    }

    pub fn title(&self) -> String {
        match &self.section {
            Some(section) => format!("notegrid - {} » {section}", self.note.name),
            None => format!("notegrid - {}", self.note.name),
        }
    }

    /// Markup shown in the pager: the selected section, or the whole note.
    fn body(&mut self) -> Node {
        if let Some(query) = &self.section {
            if let Some(section) = self.note.section(query) {
                return section;
            }
            self.status_message = Some(format!("✗ Section '{query}' not found, showing whole note"));
        }
        self.note.body.clone()
    }

    /// Lay out content and outline for the given pane sizes, re-rendering
    /// only when a width changed.
    pub fn layout(&mut self, content_width: u16, outline_width: u16, height: u16) {
        self.viewport_height = height;
        let content_width = self.max_width.map_or(content_width, |max| content_width.min(max));
        if self.rendered_widths != Some((content_width, outline_width)) {
            let body = self.body();
            let mut grid = Grid::new(content_width as usize);
            let end = render_html(&body, &mut grid);
            debug!(width = content_width, rows = end, "rendered note");
            self.lines = grid.to_lines();
            self.outline_lines = self
                .note
                .outline
                .render_tree(outline_width as usize)
                .iter()
                .map(|line| line.to_line())
                .collect();
            self.rendered_widths = Some((content_width, outline_width));
        }
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn max_scroll(&self) -> u16 {
        let total = u16::try_from(self.lines.len()).unwrap_or(u16::MAX);
        total.saturating_sub(self.viewport_height)
    }

    pub fn scroll_down(&mut self, amount: u16) {
        self.scroll = self.scroll.saturating_add(amount).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll = self.scroll.saturating_sub(amount);
    }

    fn page(&self) -> u16 {
        self.viewport_height.saturating_sub(1).max(1)
    }

    /// Re-read the note from disk; on failure the old content stays.
    pub fn reload(&mut self) {
        match Note::load(&self.note.path) {
            Ok(note) => {
                self.note = note;
                self.rendered_widths = None;
                self.status_message = Some("✓ Reloaded".to_string());
            }
            Err(err) => {
                warn!(%err, "reload failed");
                self.status_message = Some(format!("✗ Reload failed: {err}"));
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        self.status_message = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_up(1),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_down(self.page()),
            KeyCode::PageUp => self.scroll_up(self.page()),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = self.max_scroll(),
            KeyCode::Char('o') => {
                self.show_outline = !self.show_outline;
                self.rendered_widths = None;
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(source: &str) -> App {
        App::new(Note::from_source("/notes/test.md", source.to_string()), None, None)
    }

    fn long_note() -> String {
        (1..=20).map(|i| format!("para {i}\n\n")).collect()
    }

    #[test]
    fn test_layout_renders_once_per_width() {
        let mut app = app("# Title\n\nhello world\n");
        app.layout(20, 10, 5);
        assert!(!app.lines().is_empty());
        assert!(!app.outline_lines().is_empty());

        app.lines.clear();
        app.layout(20, 10, 5);
        assert!(app.lines().is_empty());
        app.layout(30, 10, 5);
        assert!(!app.lines().is_empty());
    }

    #[test]
    fn test_scrolling_is_clamped() {
        let mut app = app(&long_note());
        app.layout(20, 10, 5);
        let max = app.max_scroll();
        assert!(max > 0);

        app.handle_key(KeyCode::Char('k'));
        assert_eq!(app.scroll, 0);
        app.handle_key(KeyCode::Char('j'));
        assert_eq!(app.scroll, 1);
        app.handle_key(KeyCode::Char('G'));
        assert_eq!(app.scroll, max);
        app.handle_key(KeyCode::PageDown);
        assert_eq!(app.scroll, max);
        app.handle_key(KeyCode::Char('g'));
        assert_eq!(app.scroll, 0);
        app.handle_key(KeyCode::Char(' '));
        assert_eq!(app.scroll, 4);
    }

    #[test]
    fn test_growing_viewport_pulls_scroll_back() {
        let mut app = app(&long_note());
        app.layout(20, 10, 5);
        app.handle_key(KeyCode::End);
        app.layout(20, 10, 500);
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn test_max_width_caps_render_width() {
        let mut app = App::new(
            Note::from_source("/notes/test.md", "word ".repeat(30)),
            None,
            Some(10),
        );
        app.layout(80, 10, 5);
        assert!(app.lines().iter().all(|line| line.width() <= 10));
    }

    #[test]
    fn test_section_restricts_content() {
        let source = "# A\n\nintro\n\n## B\n\nbee text\n";
        let mut app = App::new(Note::from_source("/notes/t.md", source.to_string()), Some("A B".to_string()), None);
        app.layout(40, 10, 10);
        let text: String = app.lines().iter().map(|l| l.to_string()).collect();
        assert!(text.contains("bee text"));
        assert!(!text.contains("intro"));
        assert!(app.status_message.is_none());
        assert_eq!(app.title(), "notegrid - t » A B");
    }

    #[test]
    fn test_missing_section_falls_back() {
        let mut app = App::new(Note::from_source("/notes/t.md", "# A\n\nintro\n".to_string()), Some("Nope".to_string()), None);
        app.layout(40, 10, 10);
        assert!(app.status_message.is_some());
        let text: String = app.lines().iter().map(|l| l.to_string()).collect();
        assert!(text.contains("intro"));
    }

    #[test]
    fn test_quit_and_outline_toggle() {
        let mut app = app("# A\n");
        app.handle_key(KeyCode::Char('o'));
        assert!(app.show_outline);
        assert!(!app.should_quit);
        app.handle_key(KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_failed_reload_keeps_content() {
        let mut app = app("# Kept\n");
        app.layout(20, 10, 5);
        app.handle_key(KeyCode::Char('r'));
        assert!(app.status_message.as_deref().is_some_and(|m| m.starts_with("✗")));
        assert_eq!(app.note.outline.root().search_term(), "Kept");
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.md");
        std::fs::write(&path, "# Before\n").unwrap();
        let mut app = App::new(Note::load(&path).unwrap(), None, None);
        app.layout(20, 10, 5);
        std::fs::write(&path, "# After\n").unwrap();
        app.reload();
        assert_eq!(app.note.outline.root().search_term(), "After");
        assert_eq!(app.status_message.as_deref(), Some("✓ Reloaded"));
    }
}
