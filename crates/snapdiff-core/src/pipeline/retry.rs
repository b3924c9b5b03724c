use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::{error, warn};

/// Fixed-delay retry bound for the I/O collaborators of the pipeline.
///
/// ```
/// # use std::time::Duration;
/// # use snapdiff_core::pipeline::RetryPolicy;
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries(), 5);
/// assert_eq!(policy.delay(), Duration::from_secs(20));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 5, delay: Duration::from_secs(20) }
    }
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` retries spaced by `delay`.
    #[must_use]
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that attempts the operation exactly once.
    #[must_use]
    pub fn no_retries() -> Self {
        Self { max_retries: 0, delay: Duration::ZERO }
    }

    /// Number of retries after the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Pause between two attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Runs `op` until it succeeds or the policy is exhausted.
///
/// Every error is treated as retryable. After `max_retries` retries, that is
/// `max_retries + 1` attempts in total, the last error is returned unchanged.
///
/// ```
/// # use std::time::Duration;
/// # use snapdiff_core::pipeline::{retry, RetryPolicy};
/// let mut attempts = 0;
/// let result: Result<u32, String> = retry(&RetryPolicy::new(3, Duration::ZERO), "count", || {
///     attempts += 1;
///     if attempts < 3 { Err(format!("attempt {attempts} failed")) } else { Ok(attempts) }
/// });
/// assert_eq!(result, Ok(3));
/// ```
pub fn retry<T, E, F>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Result<T, E>,
{
    let mut retries = 0u32;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if retries >= policy.max_retries => {
                error!(operation, attempts = retries + 1, error = %err, "giving up after repeated failures");
                return Err(err);
            }
            Err(err) => {
                retries += 1;
                warn!(
                    operation,
                    retry = retries,
                    max_retries = policy.max_retries,
                    error = %err,
                    "operation failed; retrying"
                );
                if !policy.delay.is_zero() {
                    thread::sleep(policy.delay);
                }
            }
        }
    }
}
