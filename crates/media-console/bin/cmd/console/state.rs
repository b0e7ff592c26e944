use media_console::{tail_lines, FetchError, LogBatch, PendingFetch};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Represents which UI component has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Queue,
    Logs,
    Inspect,
}

/// Result of a background log fetch, delivered back to the render loop
pub(crate) struct LogResult {
    pub(crate) pending: PendingFetch,
    pub(crate) result: Result<LogBatch, FetchError>,
}

const DAEMON_LOG_REFRESH: Duration = Duration::from_secs(2);

/// Tail of the daemon's own log file on local disk
pub(crate) struct DaemonLogPanel {
    pub(crate) path: PathBuf,
    pub(crate) limit: usize,
    pub(crate) lines: Vec<String>,
    pub(crate) error: Option<String>,
    last_read: Option<Instant>,
}

impl DaemonLogPanel {
    pub(crate) fn new(path: PathBuf, limit: usize) -> Self {
        Self {
            path,
            limit,
            lines: Vec::new(),
            error: None,
            last_read: None,
        }
    }

    /// Re-read the file if the last read is older than the refresh period
    pub(crate) fn refresh(&mut self, now: Instant) {
        if self
            .last_read
            .is_some_and(|at| now.saturating_duration_since(at) < DAEMON_LOG_REFRESH)
        {
            return;
        }
        self.last_read = Some(now);

        match tail_lines(&self.path, self.limit) {
            Ok(lines) => {
                self.lines = lines;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read daemon log");
                self.error = Some(format!("Failed to read {}: {}", self.path.display(), e));
            }
        }
    }
}
