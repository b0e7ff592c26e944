use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use eyre::{Result, WrapErr};
use media_console::{
    DaemonClient, HttpClient, LogLevel, LogTracker, LogTrackerConfig, Poller, PollerConfig,
    RefreshOutcome, Snapshot, SnapshotStore,
};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    widgets::TableState,
    DefaultTerminal, Frame,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use super::state::{DaemonLogPanel, Focus, LogResult};
use super::telemetry::{self, TraceLevel};
use super::views::bottom_bar::render_bottom_bar;
use super::views::main_view::render_main_view;
use super::views::status::render_status_bar;

#[derive(Debug, Parser)]
#[command(name = "media-console", about = "Terminal dashboard for a media-processing daemon")]
pub struct ConsoleArgs {
    /// Base URL of the daemon's HTTP API
    #[arg(
        long,
        env = "MEDIA_CONSOLE_DAEMON_URL",
        default_value = "http://127.0.0.1:7487"
    )]
    pub daemon_url: String,

    /// Poll interval in milliseconds; also the base of the retry backoff
    #[arg(long, default_value = "2000")]
    pub refresh_ms: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub timeout_ms: u64,

    /// Lowest log level requested from the daemon
    #[arg(long, default_value = "info")]
    pub min_level: LogLevel,

    /// Only show log events from this component
    #[arg(long)]
    pub component: Option<String>,

    /// Local path of the daemon's own log file, shown in a separate panel
    #[arg(long)]
    pub daemon_log: Option<PathBuf>,

    /// Number of lines kept from the daemon log file
    #[arg(long, default_value = "200")]
    pub daemon_log_lines: usize,

    /// Write the console's own diagnostics to this file
    #[arg(long)]
    pub trace_file: Option<PathBuf>,

    /// Verbosity of the diagnostics written to --trace-file
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: TraceLevel,
}

pub(crate) struct App {
    store: Arc<SnapshotStore>,
    client: Arc<HttpClient>,
    runtime: Handle,
    tracker: LogTracker,
    log_tx: UnboundedSender<LogResult>,
    log_rx: UnboundedReceiver<LogResult>,
    snapshot: Snapshot,
    daemon_url: String,
    exit: bool,
    paused: bool,
    show_logs: bool,
    focus: Focus,
    table_state: TableState,
    log_scroll: usize,
    daemon_log: Option<DaemonLogPanel>,
    show_daemon_log: bool,
}

impl ConsoleArgs {
    pub fn run(&self) -> Result<()> {
        let _trace_guard = telemetry::init(self.trace_file.as_deref(), self.log_level)?;

        let interval = Duration::from_millis(self.refresh_ms.max(1));
        let timeout = Duration::from_millis(self.timeout_ms.max(1));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("media-console")
            .enable_time()
            .build()
            .wrap_err("failed to start async runtime")?;

        let client = Arc::new(HttpClient::with_timeout(self.daemon_url.clone(), timeout));
        let store = Arc::new(SnapshotStore::new());
        let cancel = CancellationToken::new();

        let poller = {
            let _enter = runtime.enter();
            Poller::new(
                Arc::clone(&client),
                Arc::clone(&store),
                PollerConfig {
                    interval,
                    request_timeout: timeout,
                },
            )
            .spawn(cancel.clone())
        };

        tracing::info!(daemon_url = %self.daemon_url, ?interval, ?timeout, "console started");

        let (log_tx, log_rx) = mpsc::unbounded_channel();
        let tracker = LogTracker::new(LogTrackerConfig {
            min_level: self.min_level,
            component: self.component.clone().filter(|c| !c.is_empty()),
            ..Default::default()
        });

        let mut app = App {
            store,
            client,
            runtime: runtime.handle().clone(),
            tracker,
            log_tx,
            log_rx,
            snapshot: Snapshot::default(),
            daemon_url: self.daemon_url.clone(),
            exit: false,
            paused: false,
            show_logs: false,
            focus: Focus::Queue,
            table_state: TableState::default().with_selected(0),
            log_scroll: 0,
            daemon_log: self
                .daemon_log
                .clone()
                .map(|path| DaemonLogPanel::new(path, self.daemon_log_lines)),
            show_daemon_log: self.daemon_log.is_some(),
        };

        let mut terminal = ratatui::init();
        let app_result = app.run(&mut terminal);
        ratatui::restore();

        cancel.cancel();
        if let Err(e) = runtime.block_on(poller) {
            tracing::warn!(error = %e, "poller task ended abnormally");
        }
        runtime.shutdown_timeout(Duration::from_secs(1));
        tracing::info!("console stopped");

        app_result.map_err(|e| eyre::eyre!("TUI error: {}", e))
    }
}

impl App {
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        while !self.exit {
            self.drain_log_results();

            if !self.paused {
                self.snapshot = self.store.snapshot();
                self.clamp_selection();
                if self.show_logs {
                    self.request_logs(Instant::now());
                }
                if self.show_daemon_log {
                    if let Some(panel) = self.daemon_log.as_mut() {
                        panel.refresh(Instant::now());
                    }
                }
            }

            terminal.draw(|frame| self.draw(frame))?;

            self.handle_events()?;
        }
        Ok(())
    }

    fn drain_log_results(&mut self) {
        while let Ok(LogResult { pending, result }) = self.log_rx.try_recv() {
            // Failures are kept on the tracker and shown in the panel.
            if let Ok(RefreshOutcome::Appended(added)) = self.tracker.complete(pending, result) {
                if self.log_scroll > 0 {
                    self.log_scroll = (self.log_scroll + added).min(self.tracker.lines().len());
                }
            }
        }
    }

    /// Hand the next due log request to a blocking worker
    fn request_logs(&mut self, now: Instant) {
        let selected = self.selected_item_id();
        let Some(pending) = self.tracker.begin_refresh(selected, now) else {
            return;
        };

        let client = Arc::clone(&self.client);
        let tx = self.log_tx.clone();
        self.runtime.spawn_blocking(move || {
            let result = client.fetch_logs(&pending.query);
            // The receiver only goes away when the console is exiting.
            let _ = tx.send(LogResult { pending, result });
        });
    }

    fn selected_item_id(&self) -> Option<u64> {
        self.table_state
            .selected()
            .and_then(|i| self.snapshot.queue.get(i))
            .map(|item| item.id)
    }

    fn clamp_selection(&mut self) {
        let len = self.snapshot.queue.len();
        match self.table_state.selected() {
            Some(i) if len > 0 && i >= len => self.table_state.select(Some(len - 1)),
            None if len > 0 => self.table_state.select(Some(0)),
            _ => {}
        }
        if len == 0 && self.focus != Focus::Queue {
            self.focus = Focus::Queue;
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(frame.area());

        render_status_bar(frame, chunks[0], &self.snapshot, &self.daemon_url);

        let daemon_log = self.daemon_log.as_ref().filter(|_| self.show_daemon_log);
        render_main_view(
            frame,
            chunks[1],
            &self.snapshot,
            &self.daemon_url,
            &mut self.table_state,
            self.focus,
            self.show_logs,
            &self.tracker,
            self.paused,
            self.log_scroll,
            daemon_log,
        );

        render_bottom_bar(
            frame,
            chunks[2],
            self.focus,
            self.paused,
            self.daemon_log.is_some(),
        );
    }

    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    self.handle_key_event(key_event);
                }
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.exit = true,
            KeyCode::Char('o') | KeyCode::Char('O') => match self.focus {
                Focus::Queue => self.toggle_logs(),
                Focus::Logs | Focus::Inspect => self.hide_logs(),
            },
            KeyCode::Char('p') | KeyCode::Char('P') => self.paused = !self.paused,
            KeyCode::Char('d') | KeyCode::Char('D') => {
                if self.daemon_log.is_some() {
                    self.show_daemon_log = !self.show_daemon_log;
                }
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') => self.focus = Focus::Queue,
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') => {
                if self.show_logs && self.selected_item_id().is_some() {
                    self.focus = Focus::Logs;
                }
            }
            KeyCode::Char('i') | KeyCode::Char('I') => self.toggle_inspect(),
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                Focus::Queue | Focus::Inspect => self.select_previous_item(),
                Focus::Logs => {
                    self.log_scroll = (self.log_scroll + 1).min(self.tracker.lines().len());
                }
            },
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                Focus::Queue | Focus::Inspect => self.select_next_item(),
                Focus::Logs => self.log_scroll = self.log_scroll.saturating_sub(1),
            },
            _ => {}
        }
    }

    fn select_previous_item(&mut self) {
        if !self.snapshot.queue.is_empty() {
            let i = match self.table_state.selected() {
                Some(i) => i.saturating_sub(1),
                None => 0,
            };
            self.select_item(i);
        }
    }

    fn select_next_item(&mut self) {
        if !self.snapshot.queue.is_empty() {
            let i = match self.table_state.selected() {
                Some(i) => (i + 1).min(self.snapshot.queue.len() - 1),
                None => 0,
            };
            self.select_item(i);
        }
    }

    fn select_item(&mut self, index: usize) {
        if self.table_state.selected() != Some(index) {
            self.table_state.select(Some(index));
            self.log_scroll = 0;
        }
    }

    fn toggle_logs(&mut self) {
        if self.show_logs {
            self.hide_logs();
        } else if self.selected_item_id().is_some() {
            self.show_logs = true;
            self.log_scroll = 0;
        }
    }

    fn hide_logs(&mut self) {
        self.show_logs = false;
        self.log_scroll = 0;
        self.focus = Focus::Queue;
    }

    fn toggle_inspect(&mut self) {
        if self.focus == Focus::Inspect {
            self.focus = if self.show_logs {
                Focus::Logs
            } else {
                Focus::Queue
            };
        } else if self.selected_item_id().is_some() {
            self.focus = Focus::Inspect;
        }
    }
}
