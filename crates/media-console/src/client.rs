use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::model::{DaemonStatus, LogBatch, LogLevel, QueueItem, QueueResponse};

/// Upper bound for every request issued against the daemon.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only view of the daemon's HTTP API.
///
/// Implementations block; callers that live on an async runtime are expected
/// to run them on a blocking thread.
pub trait DaemonClient: Send + Sync + 'static {
    fn fetch_status(&self) -> Result<DaemonStatus, FetchError>;

    fn fetch_queue(&self) -> Result<Vec<QueueItem>, FetchError>;

    fn fetch_logs(&self, query: &LogQuery) -> Result<LogBatch, FetchError>;
}

/// Filter and cursor parameters of a log request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Only events with a sequence greater than this.
    pub since: Option<u64>,
    pub limit: Option<usize>,
    pub follow: bool,
    /// Return the most recent `limit` events instead of replaying from `since`.
    pub tail: bool,
    pub item_id: Option<u64>,
    /// Minimum severity.
    pub level: Option<LogLevel>,
    pub component: Option<String>,
}

impl LogQuery {
    /// Query string pairs for the parameters that are set.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(since) = self.since {
            pairs.push(("since", since.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if self.follow {
            pairs.push(("follow", "1".to_string()));
        }
        if self.tail {
            pairs.push(("tail", "1".to_string()));
        }
        if let Some(item_id) = self.item_id {
            pairs.push(("item", item_id.to_string()));
        }
        if let Some(level) = self.level {
            pairs.push(("level", level.as_str().to_string()));
        }
        if let Some(component) = self.component.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("component", component.to_string()));
        }
        pairs
    }
}

/// JSON-over-HTTP client for the daemon API.
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.agent.get(&url);
        for (key, value) in query {
            request = request.query(*key, value);
        }
        let mut response = request.call().map_err(|e| self.map_error(e))?;
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| self.map_error(e))
    }

    fn map_error(&self, err: ureq::Error) -> FetchError {
        match err {
            ureq::Error::StatusCode(code) => FetchError::Status(code),
            ureq::Error::Timeout(_) => FetchError::Timeout(self.timeout),
            ureq::Error::Json(e) => FetchError::Decode(e.to_string()),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

impl DaemonClient for HttpClient {
    fn fetch_status(&self) -> Result<DaemonStatus, FetchError> {
        self.get_json("/api/status", &[])
    }

    fn fetch_queue(&self) -> Result<Vec<QueueItem>, FetchError> {
        let response: QueueResponse = self.get_json("/api/queue", &[])?;
        Ok(response.items)
    }

    fn fetch_logs(&self, query: &LogQuery) -> Result<LogBatch, FetchError> {
        self.get_json("/api/logs", &query.to_pairs())
    }
}
