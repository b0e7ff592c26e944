use chrono::Utc;
use media_console::{
    DaemonStatus, ItemStatus, LogEvent, LogLevel, Progress, QueueItem, WorkflowStatus,
};
use media_console_fake_daemon::FakeDaemon;
use std::collections::BTreeMap;
use std::thread::sleep;
use std::time::Duration;

const STAGES: [ItemStatus; 4] = [
    ItemStatus::Identifying,
    ItemStatus::Ripping,
    ItemStatus::Encoding,
    ItemStatus::Organizing,
];

fn queue_item(id: u64, title: &str) -> QueueItem {
    QueueItem {
        id,
        title: title.to_string(),
        status: ItemStatus::Pending,
        source_path: Some(format!("/media/incoming/{}.iso", title.to_lowercase().replace(' ', "_"))),
        progress: None,
        error_message: None,
        updated_at: Some(Utc::now()),
    }
}

fn main() {
    let addr = std::env::var("FAKE_DAEMON_ADDR").unwrap_or_else(|_| "127.0.0.1:7487".to_string());
    let daemon = match FakeDaemon::bind(&addr) {
        Ok(daemon) => daemon,
        Err(e) => {
            eprintln!("Failed to bind fake daemon to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    println!("Fake daemon listening on {}", daemon.url());
    println!("   Run: cargo run -p media-console --features tui -- --daemon-url {}\n", daemon.url());

    let mut queue = vec![
        queue_item(1, "Planet Earth Disc 1"),
        queue_item(2, "The Third Man"),
        queue_item(3, "Stalker"),
        queue_item(4, "Paris Texas"),
    ];
    let started_at = Utc::now();
    let mut sequence = 0u64;
    let mut tick = 0u64;

    loop {
        tick += 1;

        // Every 30s the daemon drops off the network for 8s.
        let outage = tick % 30 >= 22;
        daemon.fail_with(outage.then_some(503));

        let active = queue
            .iter()
            .position(|item| item.status != ItemStatus::Completed && item.status != ItemStatus::Failed);

        if let Some(index) = active {
            let item = &mut queue[index];
            let stage_index = STAGES.iter().position(|s| *s == item.status);
            let progress = item.progress.get_or_insert_with(Progress::default);
            progress.percent += 7.5;

            if stage_index.is_none() || progress.percent >= 100.0 {
                let next = stage_index.map_or(0, |i| i + 1);
                item.status = STAGES.get(next).cloned().unwrap_or(ItemStatus::Completed);
                progress.percent = 0.0;
            }
            progress.stage = Some(item.status.to_string());
            progress.message = Some(format!("{} {:.0}%", item.status, progress.percent));
            item.updated_at = Some(Utc::now());

            sequence += 1;
            let level = if tick % 11 == 0 { LogLevel::Warn } else { LogLevel::Info };
            let mut fields = BTreeMap::new();
            fields.insert("percent".to_string(), format!("{:.1}", progress.percent));
            daemon.push_log(LogEvent {
                sequence,
                timestamp: Utc::now(),
                level,
                component: Some(item.status.to_string()),
                item_id: Some(item.id),
                message: format!("{} progressing", item.display_title()),
                fields,
            });
        }

        let current = active.map(|i| &queue[i]);
        let mut queue_stats = BTreeMap::new();
        for item in &queue {
            *queue_stats.entry(item.status.to_string()).or_insert(0) += 1;
        }
        daemon.set_status(DaemonStatus {
            running: true,
            pid: Some(std::process::id()),
            started_at: Some(started_at),
            version: Some("0.9.0-fake".to_string()),
            workflow: WorkflowStatus {
                running: current.is_some(),
                current_item: current.map(QueueItem::display_title),
                current_stage: current.map(|item| item.status.to_string()),
                queue_stats,
                last_error: None,
            },
        });
        daemon.set_queue(queue.clone());

        sleep(Duration::from_secs(1));
    }
}
