//! Interactive pager.

mod app;
mod ui;
mod watcher;

pub use app::App;

use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::Duration;
use tracing::warn;

/// Run the pager until the user quits.
///
/// Redraws after every event; the note is re-laid out whenever the
/// terminal width changes, and reloaded when the file changes on disk.
pub fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
    let mut file_watcher = match watcher::FileWatcher::new() {
        Ok(mut watcher) => {
            if let Err(err) = watcher.watch(&app.note.path) {
                warn!(%err, "live reload disabled");
            }
            Some(watcher)
        }
        Err(err) => {
            warn!(%err, "live reload disabled");
            None
        }
    };

    loop {
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                app.handle_key(key.code);
            }
        } else if file_watcher
            .as_mut()
            .is_some_and(|watcher| watcher.check_for_changes())
        {
            app.reload();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
