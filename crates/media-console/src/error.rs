use std::time::Duration;

/// Failure of a single request against the daemon.
///
/// Cloneable so that snapshots can hand out their own copy of the last error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Transport(String),
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("daemon responded with HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Short class name for display.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) | FetchError::Timeout(_) => "transport",
            FetchError::Status(_) => "protocol",
            FetchError::Decode(_) => "decode",
        }
    }
}
