//! Resending Video Intelligence requests.
//!
//! Reading an operation can be repeated freely. Submitting `videos:annotate`
//! starts a new long-running job on every call, so a submit is resent only
//! when the failure shows the service never accepted it: the connection was
//! never established, or the service answered 429.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::time::Duration;

use tracing::{debug, info_span, warn, Instrument};

use crate::error::{VideoIntelError, VideoIntelResult};
use crate::metrics::record_retry;

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 200;
const DEFAULT_MAX_DELAY_MS: u64 = 5000;

/// Backoff settings shared by every Video Intelligence request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Resends allowed after the first attempt.
    pub max_retries: u32,
    /// First backoff step, doubled per resend (ms).
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff step (ms).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryConfig {
    /// Read `VIDEOINTEL_RETRY_ATTEMPTS`, `VIDEOINTEL_RETRY_BASE_MS` and
    /// `VIDEOINTEL_RETRY_MAX_MS`, falling back to the defaults.
    pub fn from_env() -> Self {
        fn var<T: std::str::FromStr>(name: &str, default: T) -> T {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        }

        Self {
            max_retries: var("VIDEOINTEL_RETRY_ATTEMPTS", DEFAULT_ATTEMPTS),
            base_delay_ms: var("VIDEOINTEL_RETRY_BASE_MS", DEFAULT_BASE_DELAY_MS),
            max_delay_ms: var("VIDEOINTEL_RETRY_MAX_MS", DEFAULT_MAX_DELAY_MS),
        }
    }

    /// Wait before resend number `attempt` (0-based).
    ///
    /// A server hint wins. Otherwise the step is `base * 2^attempt` capped at
    /// `max_delay_ms`, jittered uniformly down to no less than `base_delay_ms`.
    pub fn backoff(&self, attempt: u32, server_hint_ms: Option<u64>) -> Duration {
        if let Some(hint) = server_hint_ms {
            return Duration::from_millis(hint);
        }

        let ceiling = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.max_delay_ms);
        let floor = self.base_delay_ms.min(ceiling);
        let spread = ceiling - floor;

        let jitter = if spread == 0 { 0 } else { random_u64() % (spread + 1) };
        Duration::from_millis(floor + jitter)
    }
}

/// A fresh random value from the std hasher's per-instance keys.
fn random_u64() -> u64 {
    RandomState::new().build_hasher().finish()
}

/// How safely a request can be sent a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// Reads with no side effect; any transient failure is resent.
    Safe,
    /// Creates server-side work; resent only if it was never accepted.
    IfUnsent,
}

impl Replay {
    /// Whether `err` permits another attempt under this rule.
    pub fn allows(self, err: &VideoIntelError) -> bool {
        match self {
            Replay::Safe => err.is_transient(),
            Replay::IfUnsent => err.was_not_accepted(),
        }
    }
}

/// Run `op`, resending it while `replay` allows the failure and attempts remain.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    replay: Replay,
    op: F,
) -> VideoIntelResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = VideoIntelResult<T>>,
{
    let mut attempt = 0;

    loop {
        let span = info_span!("videointel_request", operation = %operation, attempt = attempt + 1);

        let err = match op().instrument(span).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= config.max_retries || !replay.allows(&err) {
            debug!(operation = %operation, attempts = attempt + 1, ?replay, "Giving up: {}", err);
            return Err(err);
        }

        let delay = config.backoff(attempt, err.retry_after_ms());
        warn!(
            operation = %operation,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "Video Intelligence request failed, resending: {}",
            err
        );
        record_retry(operation);
        tokio::time::sleep(delay).await;

        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    async fn count_attempts(replay: Replay, fail_with: fn() -> VideoIntelError) -> (bool, u32) {
        let attempts = AtomicU32::new(0);
        let result: VideoIntelResult<()> = with_retry(&fast_config(), "test", replay, || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(fail_with())
        })
        .await;
        (result.is_ok(), attempts.load(Ordering::SeqCst))
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("VIDEOINTEL_RETRY_ATTEMPTS", "5");
        std::env::set_var("VIDEOINTEL_RETRY_BASE_MS", "not-a-number");
        std::env::remove_var("VIDEOINTEL_RETRY_MAX_MS");

        let config = RetryConfig::from_env();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay_ms, 200);
        assert_eq!(config.max_delay_ms, 5000);

        std::env::remove_var("VIDEOINTEL_RETRY_ATTEMPTS");
        std::env::remove_var("VIDEOINTEL_RETRY_BASE_MS");
    }

    #[test]
    fn test_backoff_uses_server_hint() {
        let config = RetryConfig::default();
        assert_eq!(config.backoff(0, Some(2000)), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_stays_within_bounds() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 400,
        };
        for attempt in 0..12 {
            let ms = config.backoff(attempt, None).as_millis() as u64;
            assert!((100..=400).contains(&ms), "attempt {attempt}: {ms}ms");
        }
        // First step has no room to jitter
        assert_eq!(config.backoff(0, None), Duration::from_millis(100));
    }

    #[test]
    fn test_backoff_base_above_cap() {
        let config = RetryConfig {
            max_retries: 1,
            base_delay_ms: 900,
            max_delay_ms: 300,
        };
        assert_eq!(config.backoff(4, None), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_safe_replay_recovers_from_server_error() {
        let attempts = AtomicU32::new(0);

        let result = with_retry(&fast_config(), "test", Replay::Safe, || async {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(VideoIntelError::from_http_status(503, "unavailable"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_safe_replay_exhausts_attempts() {
        let (ok, attempts) =
            count_attempts(Replay::Safe, || VideoIntelError::from_http_status(500, "boom")).await;
        assert!(!ok);
        assert_eq!(attempts, 4);
    }

    #[tokio::test]
    async fn test_client_error_is_never_resent() {
        for replay in [Replay::Safe, Replay::IfUnsent] {
            let (_, attempts) =
                count_attempts(replay, || VideoIntelError::from_http_status(400, "bad")).await;
            assert_eq!(attempts, 1, "{replay:?}");
        }
    }

    #[tokio::test]
    async fn test_unsent_replay_skips_server_error() {
        let (ok, attempts) =
            count_attempts(Replay::IfUnsent, || VideoIntelError::from_http_status(503, "busy")).await;
        assert!(!ok);
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_unsent_replay_resends_rate_limited() {
        let (_, attempts) = count_attempts(Replay::IfUnsent, || VideoIntelError::RateLimited(1)).await;
        assert_eq!(attempts, 4);
    }

    #[tokio::test]
    async fn test_connect_failure_counts_as_unsent() {
        // Nothing listens on port 1
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        let err = VideoIntelError::from(err);

        assert!(Replay::IfUnsent.allows(&err));
        assert!(Replay::Safe.allows(&err));
    }
}
