//! Synchronization core of the media daemon console.
//!
//! The daemon only exposes stateless HTTP endpoints. [`Poller`] turns them
//! into a continuously refreshed [`Snapshot`] held by a [`SnapshotStore`],
//! backing off while the daemon is unreachable, and [`LogTracker`] turns the
//! logs endpoint into an incremental per-item tail.
//!
//! ```no_run
//! use std::sync::Arc;
//! use media_console::{HttpClient, Poller, PollerConfig, SnapshotStore};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(HttpClient::new("http://127.0.0.1:7487"));
//!     let store = Arc::new(SnapshotStore::new());
//!     let cancel = CancellationToken::new();
//!
//!     let handle = Poller::new(client, Arc::clone(&store), PollerConfig::default())
//!         .spawn(cancel.clone());
//!
//!     let snapshot = store.snapshot();
//!     println!("{} queued items", snapshot.queue.len());
//!
//!     cancel.cancel();
//!     handle.await.unwrap();
//! }
//! ```

pub mod backoff;
pub mod client;
pub mod error;
pub mod logs;
pub mod model;
pub mod poller;
pub mod store;
pub mod tail;

pub use backoff::{backoff, should_attempt, MAX_BACKOFF};
pub use client::{DaemonClient, HttpClient, LogQuery, DEFAULT_TIMEOUT};
pub use error::FetchError;
pub use logs::{
    format_event, LogBuffer, LogTracker, LogTrackerConfig, PendingFetch, RefreshOutcome,
};
pub use model::{
    DaemonStatus, ItemStatus, LogBatch, LogEvent, LogLevel, Progress, QueueItem, QueueResponse,
    WorkflowStatus,
};
pub use poller::{Poller, PollerConfig, DEFAULT_INTERVAL};
pub use store::{FailureCount, PollResult, Snapshot, SnapshotStore, OFFLINE_THRESHOLD};
pub use tail::tail_lines;
