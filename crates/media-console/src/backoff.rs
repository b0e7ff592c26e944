use std::time::Duration;

/// Longest wait between attempts, whatever the base interval.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Wait imposed before the next attempt after `failures` consecutive failures.
///
/// `base` with no failures, otherwise `base * 2^failures` capped at
/// [`MAX_BACKOFF`].
pub fn backoff(failures: u32, base: Duration) -> Duration {
    if failures == 0 {
        return base;
    }

    2u32.checked_pow(failures)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_BACKOFF, |wait| wait.min(MAX_BACKOFF))
}

/// Whether a tick should issue a fetch.
///
/// Only gated while failing: a tick is skipped when less than the backoff has
/// passed since the last attempt.
pub fn should_attempt(failures: u32, since_last_attempt: Option<Duration>, base: Duration) -> bool {
    match since_last_attempt {
        Some(elapsed) if failures > 0 => elapsed >= backoff(failures, base),
        _ => true,
    }
}
