use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::backoff::{backoff, should_attempt};
use crate::client::{DaemonClient, DEFAULT_TIMEOUT};
use crate::error::FetchError;
use crate::store::{PollResult, SnapshotStore};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Tick period; also the base of the failure backoff.
    pub interval: Duration,
    /// Bound on each individual request.
    pub request_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Background loop mirroring daemon status and queue into a [`SnapshotStore`].
pub struct Poller<C> {
    client: Arc<C>,
    store: Arc<SnapshotStore>,
    config: PollerConfig,
}

impl<C: DaemonClient> Poller<C> {
    pub fn new(client: Arc<C>, store: Arc<SnapshotStore>, config: PollerConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    /// Start polling on the current runtime until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!(interval = ?self.config.interval, "poller started");

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_attempt: Option<Instant> = None;

        loop {
            // Backoff is measured between tick deadlines, not wake-ups.
            let deadline = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                deadline = ticker.tick() => deadline,
            };

            let failures = self.store.consecutive_failures();
            let since_last = last_attempt.map(|at| deadline.saturating_duration_since(at));
            if !should_attempt(failures, since_last, self.config.interval) {
                trace!(
                    failures,
                    wait = ?backoff(failures, self.config.interval),
                    "backing off, skipping tick"
                );
                continue;
            }

            last_attempt = Some(deadline);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.poll_once() => {}
            }
        }

        info!("poller stopped");
    }

    /// Fetch status and queue once and commit the outcome to the store.
    pub async fn poll_once(&self) {
        match self.fetch().await {
            Ok(poll) => {
                debug!(items = poll.queue.len(), "poll succeeded");
                self.store.update(Ok(poll));
            }
            Err(err) => {
                let kind = err.kind();
                let message = err.to_string();
                self.store.record_failure(err);
                warn!(
                    error = %message,
                    kind,
                    failures = self.store.consecutive_failures(),
                    "poll failed"
                );
            }
        }
    }

    async fn fetch(&self) -> Result<PollResult, FetchError> {
        let status = self.call(|client| client.fetch_status()).await?;
        let queue = self.call(|client| client.fetch_queue()).await?;
        Ok(PollResult {
            status: Some(status),
            queue,
        })
    }

    async fn call<T, F>(&self, request: F) -> Result<T, FetchError>
    where
        T: Send + 'static,
        F: FnOnce(&C) -> Result<T, FetchError> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        let timeout = self.config.request_timeout;
        let task = tokio::task::spawn_blocking(move || request(&client));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(FetchError::Transport(format!(
                "request task failed: {join_err}"
            ))),
            Err(_) => Err(FetchError::Timeout(timeout)),
        }
    }
}
