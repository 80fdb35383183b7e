use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::app::{App, FormatMode};
use crate::watcher::FileWatcher;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

impl App {
    /// Keep the transcript at `path` normalized until the process is stopped.
    ///
    /// # Errors
    /// Returns an error if the first pass fails or the file cannot be watched.
    pub fn watch(&self, path: &Path) -> Result<()> {
        self.format_file(path, FormatMode::Write)?;
        let mut watcher = self.make_file_watcher(path)?;
        info!(path = %watcher.target_path().display(), "watching transcript");
        loop {
            if let Err(err) = self.poll_watcher(&mut watcher) {
                warn!(error = %format!("{err:#}"), "reformat failed");
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub(super) fn make_file_watcher(&self, path: &Path) -> Result<FileWatcher> {
        FileWatcher::new(path, self.debounce)
            .with_context(|| format!("Failed to watch {}", path.display()))
    }

    /// Reformat the watched file once a debounced change is ready.
    ///
    /// Returns `true` if the file was rewritten. Our own rewrite shows up
    /// as one more change, which then normalizes to itself.
    pub(super) fn poll_watcher(&self, watcher: &mut FileWatcher) -> Result<bool> {
        if !watcher.take_change_ready() {
            return Ok(false);
        }
        let report = self.format_file(watcher.target_path(), FormatMode::Write)?;
        Ok(report.changed)
    }
}
