use std::time::Duration;

/// Resolves once `check` returns true, re-checking every `interval`.
///
/// The first check runs immediately. There is no timeout: a check that never
/// turns true keeps this future pending forever. Timing comes from the tokio
/// clock, so tests can drive it with a paused runtime.
pub async fn poll_until<F>(interval: Duration, mut check: F)
where
    F: FnMut() -> bool,
{
    while !check() {
        tokio::time::sleep(interval).await;
    }
}
