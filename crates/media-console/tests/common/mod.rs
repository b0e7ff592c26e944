#![allow(dead_code)]

use chrono::Utc;
use media_console::{DaemonStatus, ItemStatus, LogEvent, LogLevel, QueueItem, WorkflowStatus};
use std::collections::BTreeMap;

pub fn queue_item(id: u64, status: ItemStatus) -> QueueItem {
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

pub fn running_status(current: &str) -> DaemonStatus {
    DaemonStatus {
        running: true,
        pid: Some(4242),
        workflow: WorkflowStatus {
            running: true,
            current_item: Some(current.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn log_event(sequence: u64, item_id: u64, level: LogLevel, message: &str) -> LogEvent {
    LogEvent {
        sequence,
        timestamp: Utc::now(),
        level,
        component: Some("encoder".to_string()),
        item_id: Some(item_id),
        message: message.to_string(),
        fields: BTreeMap::new(),
    }
}
