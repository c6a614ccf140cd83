//! Retry utilities: backoff builders.
//!
//! Uses `backon` for exponential backoff with jitter.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Backoff for starting a generation request over HTTP.
///
/// Only the initial request is retried; a stream that fails after it
/// started is handled by the orchestrator's fallback.
///
/// - Min delay: 500ms
/// - Max delay: 8s
/// - Max attempts: 3
/// - Jitter enabled
pub fn http_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(8))
        .with_max_times(3)
        .with_jitter()
}
