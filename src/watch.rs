// Polling file watcher that feeds `PreviewEvent::FileChanged`

use crate::session::PreviewEvent;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: Option<SystemTime>,
    len: u64,
}

fn stamp(path: &Path) -> Option<Stamp> {
    let meta = fs::metadata(path).ok()?;
    Some(Stamp {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}

/// Detects changes to one file by comparing modification time and length
/// between polls.
#[derive(Debug)]
pub struct FileWatcher {
    path: PathBuf,
    last: Option<Stamp>,
}

impl FileWatcher {
    /// Start watching; the file's current state is the baseline.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last = stamp(&path);
        Self { path, last }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Some(FileChanged)` if the file changed or reappeared since the last
    /// poll. A file disappearing is not reported.
    pub fn poll(&mut self) -> Option<PreviewEvent> {
        let current = stamp(&self.path);
        let changed = current.is_some() && current != self.last;
        self.last = current;
        if changed {
            tracing::debug!(path = %self.path.display(), "sketch file changed");
            Some(PreviewEvent::FileChanged)
        } else {
            None
        }
    }
}
