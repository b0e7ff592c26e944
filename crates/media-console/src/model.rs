use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Daemon status as returned by `GET /api/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub version: Option<String>,
    pub workflow: WorkflowStatus,
}

/// State of the daemon's processing workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowStatus {
    pub running: bool,
    pub current_item: Option<String>,
    pub current_stage: Option<String>,
    /// Item counts keyed by status name.
    pub queue_stats: BTreeMap<String, u64>,
    pub last_error: Option<String>,
}

/// A single entry of the daemon's work queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub status: ItemStatus,
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub progress: Option<Progress>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    /// Title for display, falling back to the source path and then the id.
    pub fn display_title(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        match &self.source_path {
            Some(path) if !path.is_empty() => path.clone(),
            _ => format!("item #{}", self.id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub stage: Option<String>,
    pub percent: f64,
    pub message: Option<String>,
}

/// Processing status of a queue item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ItemStatus {
    #[default]
    Pending,
    Identifying,
    Ripping,
    Encoding,
    Organizing,
    Completed,
    Failed,
    Review,
    /// A status this console does not know about yet.
    Other(String),
}

impl ItemStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Identifying => "identifying",
            ItemStatus::Ripping => "ripping",
            ItemStatus::Encoding => "encoding",
            ItemStatus::Organizing => "organizing",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
            ItemStatus::Review => "review",
            ItemStatus::Other(s) => s.as_str(),
        }
    }

    /// True while the daemon is actively working on the item.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ItemStatus::Identifying
                | ItemStatus::Ripping
                | ItemStatus::Encoding
                | ItemStatus::Organizing
        )
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ItemStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "pending" => ItemStatus::Pending,
            "identifying" => ItemStatus::Identifying,
            "ripping" => ItemStatus::Ripping,
            "encoding" => ItemStatus::Encoding,
            "organizing" => ItemStatus::Organizing,
            "completed" => ItemStatus::Completed,
            "failed" => ItemStatus::Failed,
            "review" => ItemStatus::Review,
            _ => ItemStatus::Other(s),
        })
    }
}

/// Envelope of `GET /api/queue`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueResponse {
    #[serde(default)]
    pub items: Vec<QueueItem>,
}

/// Severity of a daemon log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A structured log event emitted by the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub item_id: Option<u64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Response of `GET /api/logs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogBatch {
    #[serde(default)]
    pub events: Vec<LogEvent>,
    /// Sequence watermark to use as `since` on the next request.
    #[serde(default)]
    pub next: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_item_status_survives_decoding() {
        let item: QueueItem =
            serde_json::from_str(r#"{"id": 7, "status": "archiving"}"#).unwrap();
        assert_eq!(item.status, ItemStatus::Other("archiving".to_string()));
        assert_eq!(item.display_title(), "item #7");
        assert!(!item.status.is_active());
    }

    #[test]
    fn test_log_level_orders_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_status_tolerates_missing_fields() {
        let status: DaemonStatus = serde_json::from_str(r#"{"running": true}"#).unwrap();
        assert!(status.running);
        assert!(status.workflow.queue_stats.is_empty());
    }
}
