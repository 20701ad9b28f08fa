//! Watch mode: filesystem creation events trigger organize passes.
//!
//! The watcher is only an event source; the core boundary is
//! [`WatchAdapter::on_file_created`]. Passes are single-flight per root:
//! the adapter serializes on an internal lock, so a notification arriving
//! while a pass is in flight waits behind it instead of racing the
//! ledger's read-modify-write.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::duplicates::DispositionSource;
use crate::engine::{OrganizeEngine, OrganizeSummary};
use crate::error::Result;

/// Events the adapter reacts to.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A new file appeared under the watched root.
    FileCreated(PathBuf),
    /// The underlying watcher reported an error.
    Error(String),
}

/// Bridges creation notifications to organize passes.
pub struct WatchAdapter<'a> {
    engine: &'a OrganizeEngine,
    in_flight: Mutex<()>,
}

impl<'a> WatchAdapter<'a> {
    pub fn new(engine: &'a OrganizeEngine) -> Self {
        Self {
            engine,
            in_flight: Mutex::new(()),
        }
    }

    /// Entry point invoked for every creation notification.
    ///
    /// Uninteresting paths (hidden files, in-progress download artifacts)
    /// are filtered out before a pass is triggered.
    pub fn on_file_created(
        &self,
        path: &Path,
        disposition: &dyn DispositionSource,
    ) -> Result<OrganizeSummary> {
        if !should_process(path) {
            debug!("ignoring {}", path.display());
            return Ok(OrganizeSummary::default());
        }
        info!("new file detected: {}", path.display());
        let _flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.engine.run(disposition)
    }
}

/// Paths the watcher should not react to: hidden files and the in-progress
/// artifacts browsers and editors leave while writing.
pub fn should_process(path: &Path) -> bool {
    let filename = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };

    if filename.starts_with('.') {
        return false;
    }

    let temp_suffixes = [".tmp", ".part", ".crdownload", ".partial", ".download"];
    if temp_suffixes.iter().any(|s| filename.ends_with(s)) {
        return false;
    }

    let skip_names = ["desktop.ini", "thumbs.db"];
    if skip_names.iter().any(|n| filename.eq_ignore_ascii_case(n)) {
        return false;
    }

    true
}

/// Owns the notify subscription for one root.
pub struct FileWatcher {
    // Held for its Drop: dropping the watcher ends the subscription.
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
}

impl FileWatcher {
    /// Starts watching `root` recursively.
    pub fn new(root: &Path) -> Result<Self> {
        let (tx, rx) = channel();
        let config = Config::default().with_poll_interval(Duration::from_secs(2));
        let mut watcher = RecommendedWatcher::new(tx, config)?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        info!("watching {}", root.display());
        Ok(Self {
            _watcher: watcher,
            events: rx,
        })
    }

    /// Next event within `timeout`, or `None` when nothing relevant
    /// arrived. Modify/remove notifications are ignored.
    pub fn next_created(&self, timeout: Duration) -> Option<WatchEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(Ok(event)) => match event.kind {
                EventKind::Create(_) => event
                    .paths
                    .first()
                    .map(|p| WatchEvent::FileCreated(p.clone())),
                _ => None,
            },
            Ok(Err(e)) => Some(WatchEvent::Error(e.to_string())),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => None,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                Some(WatchEvent::Error("watcher disconnected".to_string()))
            }
        }
    }
}

/// Runs the watch loop until the process is stopped.
///
/// Per-pass failures are logged and monitoring continues; files affected
/// by an interrupted pass are simply re-discovered on the next one.
pub fn watch_forever(
    engine: &OrganizeEngine,
    root: &Path,
    disposition: &dyn DispositionSource,
) -> Result<()> {
    let watcher = FileWatcher::new(root)?;
    let adapter = WatchAdapter::new(engine);
    info!("real-time monitoring started for {}", root.display());

    loop {
        match watcher.next_created(Duration::from_millis(500)) {
            Some(WatchEvent::FileCreated(path)) => {
                match adapter.on_file_created(&path, disposition) {
                    Ok(summary) if summary.moved > 0 => {
                        info!("organized {} file(s)", summary.moved);
                    }
                    Ok(_) => {}
                    Err(e) => error!("organize pass failed: {e}"),
                }
            }
            Some(WatchEvent::Error(e)) => warn!("watch error: {e}"),
            None => {}
        }
    }
}
