//! In-process emulation of the media daemon's HTTP API.
//!
//! Serves `/api/status`, `/api/queue` and `/api/logs` from mutable in-memory
//! state so the console can be exercised without a real daemon.

use media_console::{DaemonStatus, LogBatch, LogEvent, LogLevel, QueueItem, QueueResponse};
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tiny_http::{Header, Request, Response, Server};

const DEFAULT_TAIL: usize = 200;

#[derive(Debug, Default)]
struct DaemonState {
    status: DaemonStatus,
    queue: Vec<QueueItem>,
    logs: Vec<LogEvent>,
    failure: Option<u16>,
    raw_bodies: HashMap<String, String>,
    requests: Vec<String>,
}

/// A running fake daemon. Shuts down when dropped.
pub struct FakeDaemon {
    addr: SocketAddr,
    server: Arc<Server>,
    state: Arc<Mutex<DaemonState>>,
    handle: Option<JoinHandle<()>>,
}

impl FakeDaemon {
    /// Bind an ephemeral local port.
    pub fn start() -> io::Result<Self> {
        Self::bind("127.0.0.1:0")
    }

    pub fn bind(addr: &str) -> io::Result<Self> {
        let server = Server::http(addr).map_err(io::Error::other)?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| io::Error::other("fake daemon is not bound to an IP address"))?;

        let server = Arc::new(server);
        let state = Arc::new(Mutex::new(DaemonState::default()));

        let handle = {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            std::thread::Builder::new()
                .name("fake-daemon".into())
                .spawn(move || {
                    for request in server.incoming_requests() {
                        handle_request(&state, request);
                    }
                })?
        };

        Ok(Self {
            addr,
            server,
            state,
            handle: Some(handle),
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_status(&self, status: DaemonStatus) {
        self.lock().status = status;
    }

    pub fn set_queue(&self, queue: Vec<QueueItem>) {
        self.lock().queue = queue;
    }

    /// Append an event; sequences are expected to increase.
    pub fn push_log(&self, event: LogEvent) {
        self.lock().logs.push(event);
    }

    /// Answer every request with `code` until called again with `None`.
    pub fn fail_with(&self, code: Option<u16>) {
        self.lock().failure = code;
    }

    /// Serve `body` verbatim for `path` instead of the generated payload.
    pub fn serve_raw(&self, path: &str, body: &str) {
        self.lock()
            .raw_bodies
            .insert(path.to_string(), body.to_string());
    }

    /// Number of requests received for `path`, query string ignored.
    pub fn hits(&self, path: &str) -> usize {
        self.requests(path).len()
    }

    /// Full request URLs received for `path`, in arrival order.
    pub fn requests(&self, path: &str) -> Vec<String> {
        self.lock()
            .requests
            .iter()
            .filter(|url| url.split('?').next() == Some(path))
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, DaemonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn handle_request(state: &Mutex<DaemonState>, request: Request) {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let params = parse_query(query);

    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.requests.push(url.clone());

    if let Some(code) = state.failure {
        return respond_error(request, code, "injected failure");
    }
    if let Some(body) = state.raw_bodies.get(path) {
        return respond_body(request, body.clone().into_bytes());
    }

    match path {
        "/api/status" => respond_json(request, &state.status),
        "/api/queue" => {
            let response = QueueResponse {
                items: state.queue.clone(),
            };
            respond_json(request, &response)
        }
        "/api/logs" => {
            let batch = select_logs(&state.logs, &params);
            respond_json(request, &batch)
        }
        _ => respond_error(request, 404, "Not found"),
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key.to_string(), value.to_string())
        })
        .collect()
}

/// Applies the daemon's filtering and cursor rules to the stored events.
fn select_logs(logs: &[LogEvent], params: &HashMap<String, String>) -> LogBatch {
    let number = |key: &str| params.get(key).and_then(|v| v.parse::<u64>().ok());
    let tail = params.get("tail").is_some_and(|v| v == "1" || v == "true");
    let since = number("since").unwrap_or(0);
    let item = number("item");
    let limit = number("limit").map(|l| l as usize);
    let level = params
        .get("level")
        .and_then(|l| l.parse::<LogLevel>().ok())
        .unwrap_or(LogLevel::Debug);
    let component = params.get("component").filter(|c| !c.is_empty());

    let matching: Vec<&LogEvent> = logs
        .iter()
        .filter(|e| tail || e.sequence > since)
        .filter(|e| item.is_none() || e.item_id == item)
        .filter(|e| e.level >= level)
        .filter(|e| component.is_none() || e.component.as_ref() == component)
        .collect();

    let selected: Vec<LogEvent> = if tail {
        let limit = limit.unwrap_or(DEFAULT_TAIL);
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).cloned().collect()
    } else {
        let limit = limit.unwrap_or(usize::MAX);
        matching.into_iter().take(limit).cloned().collect()
    };

    let head = logs.iter().map(|e| e.sequence).max().unwrap_or(0);
    let next = selected
        .last()
        .map(|e| e.sequence)
        .unwrap_or(head)
        .max(since);

    LogBatch {
        events: selected,
        next,
    }
}

fn respond_json<T: Serialize>(request: Request, value: &T) {
    match serde_json::to_vec(value) {
        Ok(body) => respond_body(request, body),
        Err(e) => respond_error(request, 500, &format!("Internal server error: {}", e)),
    }
}

fn respond_body(request: Request, body: Vec<u8>) {
    let mut response = Response::from_data(body);
    if let Ok(header) =
        Header::from_bytes(b"Content-Type".as_slice(), b"application/json".as_slice())
    {
        response.add_header(header);
    }
    let _ = request.respond(response);
}

fn respond_error(request: Request, code: u16, msg: &str) {
    let _ = request.respond(Response::from_string(msg).with_status_code(code));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn event(sequence: u64, item: u64, level: LogLevel) -> LogEvent {
        LogEvent {
            sequence,
            timestamp: Utc::now(),
            level,
            component: Some("ripper".to_string()),
            item_id: Some(item),
            message: format!("event {sequence}"),
            fields: BTreeMap::new(),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_tail_returns_most_recent_matching_events() {
        let logs: Vec<LogEvent> = (1..=10).map(|n| event(n, n % 2, LogLevel::Info)).collect();
        let batch = select_logs(&logs, &params(&[("tail", "1"), ("limit", "2"), ("item", "0")]));

        let sequences: Vec<u64> = batch.events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![8, 10]);
        assert_eq!(batch.next, 10);
    }

    #[test]
    fn test_since_filters_and_reports_head_when_empty() {
        let logs = vec![
            event(1, 1, LogLevel::Info),
            event(2, 1, LogLevel::Debug),
            event(3, 2, LogLevel::Error),
        ];
        let batch = select_logs(&logs, &params(&[("since", "1"), ("item", "1"), ("level", "info")]));
        assert!(batch.events.is_empty());
        assert_eq!(batch.next, 3);
    }
}
