//! Connection establishment with linear backoff.
//!
//! Both the publish side and the consume side open their channel connection
//! through [`connect_with_retry`], each with its own [`RetryPolicy`].

use std::time::Duration;

use tracing::warn;

/// Retry policy for establishing a connection.
///
/// The wait before retrying attempt `n` (zero-based) is `base * (n + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base: Duration) -> Self {
        Self { max_attempts, base }
    }

    /// Linear backoff: `base * (attempt + 1)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base * (attempt + 1)
    }
}

/// All connection attempts failed. The caller cannot proceed and must treat
/// this as fatal; it is never retried indefinitely or silently swallowed.
#[derive(Debug, thiserror::Error)]
#[error("could not connect to {endpoint} after {attempts} attempts: {source}")]
pub struct ConnectError<E: std::error::Error> {
    pub endpoint: String,
    pub attempts: u32,
    #[source]
    pub source: E,
}

/// Attempt `attempt_fn` up to `policy.max_attempts` times, sleeping
/// `policy.delay(attempt)` between failed attempts.
///
/// Each attempt builds a fresh connection; no state leaks across attempts.
/// Every retry is logged with the attempt number and computed wait.
pub fn connect_with_retry<C, E, F>(
    endpoint: &str,
    policy: &RetryPolicy,
    mut attempt_fn: F,
) -> Result<C, ConnectError<E>>
where
    E: std::error::Error,
    F: FnMut() -> Result<C, E>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match attempt_fn() {
            Ok(conn) => return Ok(conn),
            Err(err) => {
                let wait = policy.delay(attempt);
                attempt += 1;
                warn!(
                    endpoint = %endpoint,
                    attempt,
                    max_attempts = attempts,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "channel not ready, retrying"
                );
                if attempt >= attempts {
                    return Err(ConnectError {
                        endpoint: endpoint.to_string(),
                        attempts,
                        source: err,
                    });
                }
                std::thread::sleep(wait);
            }
        }
    }
}
