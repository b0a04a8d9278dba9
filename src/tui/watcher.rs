//! Live reload: watches the open note and reports when it changed on disk.

use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{AccessKind, AccessMode, ModifyKind},
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct FileWatcher {
    watcher: RecommendedWatcher,
    receiver: Receiver<Result<Event, notify::Error>>,
    /// Canonical path of the note and the directory actually watched.
    target: Option<(PathBuf, PathBuf)>,
    /// A change seen inside the debounce window, still to be reported.
    pending: bool,
    last_reload: Instant,
    debounce: Duration,
}

impl FileWatcher {
    pub fn new() -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;
        Ok(Self {
            watcher,
            receiver: rx,
            target: None,
            pending: false,
            last_reload: Instant::now(),
            debounce: Duration::from_millis(100),
        })
    }

    /// Watch `path`, replacing any previous target.
    ///
    /// The parent directory is watched so that editors which save by
    /// renaming a new file over the old one are still noticed.
    pub fn watch(&mut self, path: &Path) -> Result<(), notify::Error> {
        if let Some((_, dir)) = self.target.take() {
            let _ = self.watcher.unwatch(&dir);
        }
        let file = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        self.watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!(path = %file.display(), "watching note");
        self.target = Some((file, dir));
        self.pending = false;
        self.last_reload = Instant::now();
        Ok(())
    }

    /// Drain queued events; true when the note changed and the debounce
    /// window since the last reload has passed. A change inside the window
    /// is held and reported by a later call.
    pub fn check_for_changes(&mut self) -> bool {
        loop {
            match self.receiver.try_recv() {
                Ok(Ok(event)) => self.pending |= self.is_relevant(&event),
                Ok(Err(err)) => warn!(%err, "watch error"),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        self.take_pending(Instant::now())
    }

    fn take_pending(&mut self, now: Instant) -> bool {
        if !self.pending || now.saturating_duration_since(self.last_reload) < self.debounce {
            return false;
        }
        self.pending = false;
        self.last_reload = now;
        true
    }

    fn is_relevant(&self, event: &Event) -> bool {
        let Some((file, _)) = &self.target else {
            return false;
        };
        event.paths.iter().any(|p| p == file) && is_write(&event.kind)
    }
}

fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Name(_))
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Create(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use std::thread;

    fn changed_within(watcher: &mut FileWatcher, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if watcher.check_for_changes() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_watcher_creation() {
        assert!(FileWatcher::new().is_ok());
    }

    #[test]
    fn test_write_kinds() {
        assert!(is_write(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(is_write(&EventKind::Create(CreateKind::File)));
        assert!(!is_write(&EventKind::Remove(RemoveKind::File)));
    }

    #[test]
    fn test_only_the_watched_file_is_relevant() {
        let dir = tempfile::tempdir().unwrap();
        let note = dir.path().join("a.md");
        std::fs::write(&note, "# A\n").unwrap();

        let mut watcher = FileWatcher::new().unwrap();
        watcher.watch(&note).unwrap();
        let file = note.canonicalize().unwrap();
        let other = file.with_file_name("b.md");

        let kind = EventKind::Modify(ModifyKind::Any);
        assert!(watcher.is_relevant(&Event::new(kind).add_path(file)));
        assert!(!watcher.is_relevant(&Event::new(kind).add_path(other)));
    }

    #[test]
    fn test_change_inside_debounce_window_is_held() {
        let mut watcher = FileWatcher::new().unwrap();
        let start = watcher.last_reload;
        watcher.pending = true;

        assert!(!watcher.take_pending(start + Duration::from_millis(30)));
        assert!(watcher.pending);
        assert!(watcher.take_pending(start + Duration::from_millis(100)));
        assert!(!watcher.take_pending(start + Duration::from_millis(300)));
    }

    #[test]
    fn test_second_quick_write_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let note = dir.path().join("live.md");
        std::fs::write(&note, "# A\n").unwrap();

        let mut watcher = FileWatcher::new().unwrap();
        watcher.watch(&note).unwrap();
        thread::sleep(Duration::from_millis(150));

        std::fs::write(&note, "").unwrap();
        assert!(changed_within(&mut watcher, Duration::from_secs(2)));
        thread::sleep(Duration::from_millis(30));
        std::fs::write(&note, "# B\n").unwrap();
        assert!(changed_within(&mut watcher, Duration::from_secs(2)));
    }
}
