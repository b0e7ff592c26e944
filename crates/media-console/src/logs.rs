//! Incremental log tail for a single queue item, built on polling.
//!
//! The daemon only answers discrete `GET /api/logs` requests. [`LogTracker`]
//! keeps a sequence cursor and a bounded line buffer for the tracked item so
//! successive requests only return new events. Switching to another item
//! drops everything tracked so far.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{trace, warn};

use crate::client::{DaemonClient, LogQuery};
use crate::error::FetchError;
use crate::model::{LogBatch, LogEvent, LogLevel};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);
pub const DEFAULT_BUFFER_CAP: usize = 500;
/// Events requested when a cursor starts from scratch.
pub const DEFAULT_TAIL: usize = 200;

/// FIFO of formatted lines that never grows beyond its capacity.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    cap: usize,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            cap,
        }
    }

    pub fn push(&mut self, line: String) {
        self.lines.push_back(line);
        self.evict();
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        self.lines.extend(lines);
        self.evict();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.lines.iter().map(String::as_str)
    }

    fn evict(&mut self) {
        let excess = self.lines.len().saturating_sub(self.cap);
        self.lines.drain(..excess);
    }
}

/// Renders an event as a single display line.
pub fn format_event(event: &LogEvent) -> String {
    let mut line = format!(
        "{} {:<5} ",
        event.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        event.level.as_str().to_ascii_uppercase()
    );
    if let Some(component) = event.component.as_deref().filter(|c| !c.is_empty()) {
        line.push('[');
        line.push_str(component);
        line.push_str("] ");
    }
    line.push_str(event.message.trim_end());
    for (key, value) in &event.fields {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        line.push_str(value);
    }
    line
}

#[derive(Debug, Clone)]
pub struct LogTrackerConfig {
    /// Minimum time between two requests for the same item.
    pub debounce: Duration,
    pub buffer_cap: usize,
    pub tail: usize,
    pub min_level: LogLevel,
    pub component: Option<String>,
}

impl Default for LogTrackerConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            buffer_cap: DEFAULT_BUFFER_CAP,
            tail: DEFAULT_TAIL,
            min_level: LogLevel::Info,
            component: None,
        }
    }
}

/// A log request handed out by [`LogTracker::begin_refresh`].
///
/// Must be passed back to [`LogTracker::complete`] together with its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub item_id: u64,
    pub generation: u64,
    pub query: LogQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Debounced, or nothing selected.
    Skipped,
    /// Cursor advanced; carries the number of new lines.
    Appended(usize),
    /// The response belonged to an older request or another item.
    Discarded,
}

#[derive(Debug)]
struct CursorState {
    next_sequence: u64,
    buffer: LogBuffer,
    last_refresh_at: Option<Instant>,
    /// Generation of the request handed out and not yet completed.
    in_flight: Option<u64>,
}

impl CursorState {
    fn new(cap: usize) -> Self {
        Self {
            next_sequence: 0,
            buffer: LogBuffer::new(cap),
            last_refresh_at: None,
            in_flight: None,
        }
    }
}

/// Cursor and line buffer for the currently selected item.
#[derive(Debug)]
pub struct LogTracker {
    config: LogTrackerConfig,
    item: Option<u64>,
    cursor: CursorState,
    generation: u64,
    last_error: Option<FetchError>,
}

impl LogTracker {
    pub fn new(config: LogTrackerConfig) -> Self {
        let cursor = CursorState::new(config.buffer_cap);
        Self {
            config,
            item: None,
            cursor,
            generation: 0,
            last_error: None,
        }
    }

    /// Prepare the next request for `item`, if one is due.
    ///
    /// Selecting a different item than the tracked one discards the previous
    /// cursor and buffer before anything else. At most one request per item
    /// is outstanding: nothing is issued until the previous one has been
    /// passed to [`Self::complete`].
    pub fn begin_refresh(&mut self, item: Option<u64>, now: Instant) -> Option<PendingFetch> {
        let item_id = item?;
        if self.item != Some(item_id) {
            self.reset(item_id);
        }

        if self.cursor.in_flight.is_some() {
            return None;
        }
        if let Some(last) = self.cursor.last_refresh_at {
            if now.saturating_duration_since(last) < self.config.debounce {
                return None;
            }
        }
        self.cursor.last_refresh_at = Some(now);
        self.generation += 1;
        self.cursor.in_flight = Some(self.generation);

        Some(PendingFetch {
            item_id,
            generation: self.generation,
            query: self.next_query(item_id),
        })
    }

    /// Apply the result of a request obtained from [`Self::begin_refresh`].
    ///
    /// On failure the cursor and buffer are left as they were and the error
    /// is returned and kept for display.
    pub fn complete(
        &mut self,
        pending: PendingFetch,
        result: Result<LogBatch, FetchError>,
    ) -> Result<RefreshOutcome, FetchError> {
        if self.item != Some(pending.item_id) || pending.generation != self.generation {
            trace!(
                item_id = pending.item_id,
                generation = pending.generation,
                current = self.generation,
                "discarding stale log response"
            );
            return Ok(RefreshOutcome::Discarded);
        }
        self.cursor.in_flight = None;

        match result {
            Ok(batch) => {
                // Advance even on an empty batch so the same window is not
                // requested again.
                self.cursor.next_sequence = batch.next;
                let appended = batch.events.len();
                self.cursor
                    .buffer
                    .extend(batch.events.iter().map(format_event));
                self.last_error = None;
                Ok(RefreshOutcome::Appended(appended))
            }
            Err(err) => {
                warn!(item_id = pending.item_id, error = %err, "log fetch failed");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Synchronous refresh: prepare, fetch and apply in one call.
    pub fn refresh<C: DaemonClient + ?Sized>(
        &mut self,
        client: &C,
        item: Option<u64>,
        now: Instant,
    ) -> Result<RefreshOutcome, FetchError> {
        let Some(pending) = self.begin_refresh(item, now) else {
            return Ok(RefreshOutcome::Skipped);
        };
        let result = client.fetch_logs(&pending.query);
        self.complete(pending, result)
    }

    pub fn tracked_item(&self) -> Option<u64> {
        self.item
    }

    pub fn next_sequence(&self) -> u64 {
        self.cursor.next_sequence
    }

    pub fn lines(&self) -> &LogBuffer {
        &self.cursor.buffer
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    fn reset(&mut self, item_id: u64) {
        self.item = Some(item_id);
        self.cursor = CursorState::new(self.config.buffer_cap);
        self.last_error = None;
    }

    fn next_query(&self, item_id: u64) -> LogQuery {
        let base = LogQuery {
            item_id: Some(item_id),
            level: Some(self.config.min_level),
            component: self.config.component.clone(),
            ..Default::default()
        };

        if self.cursor.next_sequence == 0 {
            LogQuery {
                tail: true,
                limit: Some(self.config.tail),
                ..base
            }
        } else {
            LogQuery {
                since: Some(self.cursor.next_sequence),
                ..base
            }
        }
    }
}

impl Default for LogTracker {
    fn default() -> Self {
        Self::new(LogTrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn event(sequence: u64, message: &str) -> LogEvent {
        LogEvent {
            sequence,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap(),
            level: LogLevel::Warn,
            component: Some("encoder".to_string()),
            item_id: Some(1),
            message: message.to_string(),
            fields: BTreeMap::new(),
        }
    }

    #[test]
    fn test_buffer_keeps_newest_lines() {
        let mut buffer = LogBuffer::new(500);
        for n in 1..=600 {
            buffer.push(n.to_string());
        }

        assert_eq!(buffer.len(), 500);
        let expected: Vec<String> = (101..=600).map(|n| n.to_string()).collect();
        assert_eq!(buffer.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_buffer_evicts_after_bulk_append() {
        let mut buffer = LogBuffer::new(3);
        buffer.extend(["a", "b", "c", "d", "e"].map(String::from));
        assert_eq!(buffer.iter().collect::<Vec<_>>(), ["c", "d", "e"]);
    }

    #[test]
    fn test_formats_level_component_and_fields() {
        let mut ev = event(1, "bitrate dropped\n");
        ev.fields.insert("stage".to_string(), "encode".to_string());
        ev.fields.insert("fps".to_string(), "23".to_string());

        let line = format_event(&ev);
        let time = ev.timestamp.with_timezone(&Local).format("%H:%M:%S");
        assert_eq!(
            line,
            format!("{time} WARN  [encoder] bitrate dropped fps=23 stage=encode")
        );
    }

    #[test]
    fn test_first_request_tails_then_follows_cursor() {
        let mut tracker = LogTracker::default();
        let now = Instant::now();

        let first = tracker.begin_refresh(Some(7), now).unwrap();
        assert!(first.query.tail);
        assert_eq!(first.query.limit, Some(DEFAULT_TAIL));
        assert_eq!(first.query.since, None);
        assert_eq!(first.query.item_id, Some(7));

        let batch = LogBatch {
            events: vec![event(40, "a"), event(41, "b")],
            next: 41,
        };
        assert_eq!(
            tracker.complete(first, Ok(batch)),
            Ok(RefreshOutcome::Appended(2))
        );

        let second = tracker
            .begin_refresh(Some(7), now + DEFAULT_DEBOUNCE)
            .unwrap();
        assert!(!second.query.tail);
        assert_eq!(second.query.since, Some(41));
        assert_eq!(second.query.level, Some(LogLevel::Info));
    }

    #[test]
    fn test_empty_batch_still_advances_cursor() {
        let mut tracker = LogTracker::default();
        let pending = tracker.begin_refresh(Some(1), Instant::now()).unwrap();

        let outcome = tracker.complete(
            pending,
            Ok(LogBatch {
                events: Vec::new(),
                next: 42,
            }),
        );

        assert_eq!(outcome, Ok(RefreshOutcome::Appended(0)));
        assert_eq!(tracker.next_sequence(), 42);
        assert!(tracker.lines().is_empty());
    }

    #[test]
    fn test_debounce_suppresses_rapid_refreshes() {
        let mut tracker = LogTracker::default();
        let now = Instant::now();

        let pending = tracker.begin_refresh(Some(1), now).unwrap();
        tracker.complete(pending, Ok(LogBatch::default())).unwrap();
        assert!(tracker
            .begin_refresh(Some(1), now + Duration::from_millis(1500))
            .is_none());
        assert!(tracker.begin_refresh(None, now + DEFAULT_DEBOUNCE).is_none());
        assert!(tracker.begin_refresh(Some(1), now + DEFAULT_DEBOUNCE).is_some());
    }

    #[test]
    fn test_switching_items_drops_previous_state() {
        let mut tracker = LogTracker::default();
        let now = Instant::now();

        let pending = tracker.begin_refresh(Some(1), now).unwrap();
        tracker
            .complete(
                pending,
                Ok(LogBatch {
                    events: vec![event(5, "one")],
                    next: 5,
                }),
            )
            .unwrap();
        assert_eq!(tracker.lines().len(), 1);

        let pending = tracker.begin_refresh(Some(2), now).unwrap();
        assert_eq!(tracker.tracked_item(), Some(2));
        assert_eq!(tracker.next_sequence(), 0);
        assert!(tracker.lines().is_empty());
        assert!(pending.query.tail);

        // Coming back to the first item starts from scratch as well.
        let pending = tracker.begin_refresh(Some(1), now).unwrap();
        assert!(pending.query.tail);
        assert!(tracker.lines().is_empty());
    }

    #[test]
    fn test_failure_leaves_cursor_and_buffer_untouched() {
        let mut tracker = LogTracker::default();
        let now = Instant::now();

        let pending = tracker.begin_refresh(Some(3), now).unwrap();
        tracker
            .complete(
                pending,
                Ok(LogBatch {
                    events: vec![event(9, "ok")],
                    next: 9,
                }),
            )
            .unwrap();

        let pending = tracker.begin_refresh(Some(3), now + DEFAULT_DEBOUNCE).unwrap();
        let err = FetchError::Status(500);
        assert_eq!(tracker.complete(pending, Err(err.clone())), Err(err.clone()));
        assert_eq!(tracker.next_sequence(), 9);
        assert_eq!(tracker.lines().len(), 1);
        assert_eq!(tracker.last_error(), Some(&err));
    }

    #[test]
    fn test_slow_fetch_still_advances_cursor() {
        let mut tracker = LogTracker::default();
        let now = Instant::now();

        let pending = tracker.begin_refresh(Some(4), now).unwrap();
        // The next ticks arrive while the request is still outstanding.
        assert!(tracker.begin_refresh(Some(4), now + DEFAULT_DEBOUNCE).is_none());
        assert!(tracker
            .begin_refresh(Some(4), now + DEFAULT_DEBOUNCE * 2)
            .is_none());

        let batch = LogBatch {
            events: vec![event(12, "late but current")],
            next: 12,
        };
        assert_eq!(
            tracker.complete(pending, Ok(batch)),
            Ok(RefreshOutcome::Appended(1))
        );
        assert_eq!(tracker.next_sequence(), 12);

        let next = tracker
            .begin_refresh(Some(4), now + DEFAULT_DEBOUNCE * 2)
            .unwrap();
        assert_eq!(next.query.since, Some(12));
    }

    #[test]
    fn test_failed_fetch_releases_the_next_refresh() {
        let mut tracker = LogTracker::default();
        let now = Instant::now();

        let pending = tracker.begin_refresh(Some(4), now).unwrap();
        let err = FetchError::Timeout(Duration::from_secs(5));
        assert_eq!(tracker.complete(pending, Err(err.clone())), Err(err));
        assert!(tracker.begin_refresh(Some(4), now + DEFAULT_DEBOUNCE).is_some());
    }

    #[test]
    fn test_stale_generation_for_same_item_is_discarded() {
        let mut tracker = LogTracker::default();
        let now = Instant::now();

        let older = tracker.begin_refresh(Some(4), now).unwrap();
        tracker.begin_refresh(Some(5), now).unwrap();
        let newer = tracker.begin_refresh(Some(4), now).unwrap();
        assert!(newer.generation > older.generation);

        let older_batch = LogBatch {
            events: vec![event(10, "older")],
            next: 10,
        };
        assert_eq!(
            tracker.complete(older, Ok(older_batch)),
            Ok(RefreshOutcome::Discarded)
        );
        assert_eq!(tracker.next_sequence(), 0);

        let newer_batch = LogBatch {
            events: vec![event(12, "newer")],
            next: 12,
        };
        assert_eq!(
            tracker.complete(newer, Ok(newer_batch)),
            Ok(RefreshOutcome::Appended(1))
        );
        assert_eq!(tracker.next_sequence(), 12);
        assert_eq!(tracker.lines().len(), 1);
    }

    #[test]
    fn test_responses_for_previous_item_are_discarded() {
        let mut tracker = LogTracker::default();
        let now = Instant::now();

        let pending = tracker.begin_refresh(Some(1), now).unwrap();
        tracker.begin_refresh(Some(2), now).unwrap();

        let outcome = tracker.complete(
            pending,
            Ok(LogBatch {
                events: vec![event(3, "late")],
                next: 3,
            }),
        );
        assert_eq!(outcome, Ok(RefreshOutcome::Discarded));
        assert!(tracker.lines().is_empty());
    }
}
