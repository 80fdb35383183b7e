//! File watching for `watch` mode.
//!
//! Uses notify crate for cross-platform file system events. Events are
//! collected on notify's thread and drained by polling, so the caller
//! decides when a reformat happens.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

/// Watches one transcript file and reports changes once they settle.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    target: WatchTarget,
    debounce: Duration,
    pending_since: Option<Instant>,
}

/// Paths an event may name when it concerns the watched file.
#[derive(Debug, Clone)]
struct WatchTarget {
    dir: PathBuf,
    path: PathBuf,
    name: Option<OsString>,
}

impl WatchTarget {
    fn new(path: &Path) -> Self {
        // OS event paths are absolute and canonical.
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let name = path.file_name().map(std::ffi::OsStr::to_os_string);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self { dir, path, name }
    }

    /// Directory-level events count too; several backends only report those.
    fn matches(&self, event: &Event) -> bool {
        event.paths.iter().any(|candidate| {
            candidate == &self.dir
                || candidate == &self.path
                || matches!(
                    (&self.name, candidate.file_name()),
                    (Some(name), Some(file)) if file == name
                )
        })
    }
}

impl FileWatcher {
    /// Start watching `path`.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the path cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        let target = WatchTarget::new(path.as_ref());
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&target.dir, RecursiveMode::NonRecursive)?;
        debug!(path = %target.path.display(), ?debounce, "file watcher started");

        Ok(Self {
            _watcher: watcher,
            rx,
            target,
            debounce,
            pending_since: None,
        })
    }

    /// The canonical path of the file being watched.
    pub fn target_path(&self) -> &Path {
        &self.target.path
    }

    /// Returns true once a change has been followed by a quiet period.
    pub fn take_change_ready(&mut self) -> bool {
        if self.drain_events() {
            self.pending_since = Some(Instant::now());
        }
        match self.pending_since {
            Some(since) if since.elapsed() >= self.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    /// Consume queued events; true if any concerned the target.
    fn drain_events(&self) -> bool {
        let mut relevant = 0u32;
        let mut ignored = 0u32;
        for event in self.rx.try_iter() {
            match event {
                Ok(ev) if self.target.matches(&ev) => relevant += 1,
                Ok(ev) => {
                    ignored += 1;
                    trace!(kind = ?ev.kind, paths = ?ev.paths, "ignoring unrelated event");
                }
                Err(err) => warn!(%err, "file watcher error"),
            }
        }
        if relevant + ignored > 0 {
            debug!(relevant, ignored, target = %self.target.path.display(), "polled file watcher");
        }
        relevant > 0
    }
}
