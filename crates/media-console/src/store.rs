use chrono::{DateTime, Utc};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::FetchError;
use crate::model::{DaemonStatus, QueueItem};

/// Consecutive failures after which the daemon is shown as offline.
pub const OFFLINE_THRESHOLD: u32 = 2;

/// Run of uninterrupted failed polls.
///
/// The single source for both the poller's retry gate and the offline view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureCount(u32);

impl FailureCount {
    pub fn get(self) -> u32 {
        self.0
    }

    /// Whether the next poll is subject to backoff.
    pub fn gates_retry(self) -> bool {
        self.0 > 0
    }

    pub fn is_offline(self) -> bool {
        self.0 >= OFFLINE_THRESHOLD
    }

    fn record_failure(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Status and queue fetched together in one poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollResult {
    pub status: Option<DaemonStatus>,
    pub queue: Vec<QueueItem>,
}

/// Latest known remote state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub status: Option<DaemonStatus>,
    pub queue: Vec<QueueItem>,
    /// Time of the most recent attempt, successful or not.
    pub last_updated: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    /// Error of the most recent attempt, cleared by a success.
    pub last_error: Option<FetchError>,
    pub consecutive_failures: u32,
}

impl Snapshot {
    pub fn is_offline(&self) -> bool {
        FailureCount(self.consecutive_failures).is_offline()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    status: Option<DaemonStatus>,
    queue: Vec<QueueItem>,
    last_updated: Option<DateTime<Utc>>,
    last_success: Option<DateTime<Utc>>,
    last_error: Option<FetchError>,
    failures: FailureCount,
}

/// Shared container for the latest polled state.
///
/// Writers hand over owned values and readers receive independent copies, so
/// no caller ever holds a reference into the store. The lock is only held for
/// the in-memory copy.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    state: RwLock<StoreState>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a successful poll, replacing status and queue wholesale.
    pub fn record_success(&self, status: Option<DaemonStatus>, queue: Vec<QueueItem>) {
        let now = Utc::now();
        let mut state = self.write();
        state.status = status;
        state.queue = queue;
        state.last_error = None;
        state.last_updated = Some(now);
        state.last_success = Some(now);
        state.failures.reset();
    }

    /// Record a failed poll. Previously fetched data is kept.
    pub fn record_failure(&self, err: FetchError) {
        let mut state = self.write();
        state.last_error = Some(err);
        state.last_updated = Some(Utc::now());
        state.failures.record_failure();
    }

    pub fn update(&self, result: Result<PollResult, FetchError>) {
        match result {
            Ok(PollResult { status, queue }) => self.record_success(status, queue),
            Err(err) => self.record_failure(err),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.read();
        Snapshot {
            status: state.status.clone(),
            queue: state.queue.clone(),
            last_updated: state.last_updated,
            last_success: state.last_success,
            last_error: state.last_error.clone(),
            consecutive_failures: state.failures.get(),
        }
    }

    pub fn failures(&self) -> FailureCount {
        self.read().failures
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures().get()
    }

    pub fn is_offline(&self) -> bool {
        self.failures().is_offline()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemStatus, WorkflowStatus};

    fn item(id: u64, status: ItemStatus) -> QueueItem {
        QueueItem {
            id,
            title: format!("Disc {id}"),
            status,
            source_path: None,
            progress: None,
            error_message: None,
            updated_at: None,
        }
    }

    fn status(current: &str) -> DaemonStatus {
        DaemonStatus {
            running: true,
            workflow: WorkflowStatus {
                running: true,
                current_item: Some(current.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_success_replaces_queue_wholesale() {
        let store = SnapshotStore::new();
        store.record_success(
            Some(status("a")),
            vec![item(1, ItemStatus::Pending), item(2, ItemStatus::Encoding)],
        );
        store.record_success(Some(status("b")), vec![item(3, ItemStatus::Completed)]);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.queue, vec![item(3, ItemStatus::Completed)]);
        assert_eq!(snapshot.status, Some(status("b")));
        assert!(snapshot.last_error.is_none());

        store.record_success(None, Vec::new());
        let snapshot = store.snapshot();
        assert!(snapshot.queue.is_empty());
        assert!(snapshot.status.is_none());
    }

    #[test]
    fn test_failure_preserves_previous_data() {
        let store = SnapshotStore::new();
        store.record_success(Some(status("a")), vec![item(1, ItemStatus::Ripping)]);
        let before = store.snapshot();

        let err = FetchError::Transport("connection refused".to_string());
        store.record_failure(err.clone());

        let after = store.snapshot();
        assert_eq!(after.status, before.status);
        assert_eq!(after.queue, before.queue);
        assert_eq!(after.last_success, before.last_success);
        assert_eq!(
            after.last_error.map(|e| e.to_string()),
            Some(err.to_string())
        );
        assert!(after.last_updated >= before.last_updated);
    }

    #[test]
    fn test_counts_failures_and_resets_on_success() {
        let store = SnapshotStore::new();
        assert!(!store.is_offline());

        store.record_failure(FetchError::Status(500));
        assert_eq!(store.consecutive_failures(), 1);
        assert!(store.failures().gates_retry());
        assert!(!store.is_offline());

        for _ in 0..4 {
            store.update(Err(FetchError::Status(502)));
        }
        assert_eq!(store.snapshot().consecutive_failures, 5);
        assert!(store.is_offline());
        assert!(store.snapshot().is_offline());

        store.update(Ok(PollResult::default()));
        assert_eq!(store.consecutive_failures(), 0);
        assert!(!store.is_offline());
        assert!(store.snapshot().last_error.is_none());
    }

    #[test]
    fn test_snapshots_are_independent_copies() {
        let store = SnapshotStore::new();
        store.record_success(None, vec![item(1, ItemStatus::Pending)]);

        let mut first = store.snapshot();
        first.queue.push(item(2, ItemStatus::Failed));
        first.queue[0].title = "mutated".to_string();

        let second = store.snapshot();
        assert_eq!(second.queue, vec![item(1, ItemStatus::Pending)]);
    }

    #[test]
    fn test_concurrent_readers_see_whole_updates() {
        use std::sync::Arc;

        let store = Arc::new(SnapshotStore::new());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for n in 0..200u64 {
                    let queue = (0..n % 7).map(|id| item(id, ItemStatus::Pending)).collect();
                    store.record_success(Some(status(&n.to_string())), queue);
                }
            })
        };

        for _ in 0..200 {
            let snapshot = store.snapshot();
            if let Some(status) = snapshot.status {
                let n: u64 = status.workflow.current_item.unwrap().parse().unwrap();
                assert_eq!(snapshot.queue.len() as u64, n % 7);
            }
        }
        writer.join().unwrap();
    }
}
