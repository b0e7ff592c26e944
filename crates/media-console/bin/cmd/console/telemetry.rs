use clap::ValueEnum;
use eyre::{eyre, Result, WrapErr};
use std::fs::OpenOptions;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with a full filter directive.
const FILTER_ENV: &str = "MEDIA_CONSOLE_LOG";

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum TraceLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl TraceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceLevel::Error => "error",
            TraceLevel::Warn => "warn",
            TraceLevel::Info => "info",
            TraceLevel::Debug => "debug",
            TraceLevel::Trace => "trace",
        }
    }
}

/// Install the tracing subscriber writing to `file`.
///
/// The terminal belongs to the dashboard, so without a file nothing is
/// installed. The returned guard flushes the writer when dropped.
pub(crate) fn init(file: Option<&Path>, level: TraceLevel) -> Result<Option<WorkerGuard>> {
    let Some(path) = file else {
        return Ok(None);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("failed to open trace file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = match std::env::var(FILTER_ENV) {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) => EnvFilter::new(format!("media_console={}", level.as_str())),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(level == TraceLevel::Debug || level == TraceLevel::Trace)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| eyre!("failed to configure logging: {}", e))?;

    Ok(Some(guard))
}
