// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Exponential backoff for GitHub requests.
//!
//! Only the network-facing sources retry; inventory and database code never
//! does.

use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Error;

/// Attempts and delays for [`retry_with_backoff`].
#[derive(Debug, Clone,)]
pub struct RetryConfig
{
    /// Total attempts including the first (default: 3).
    pub max_attempts:     u32,
    /// Delay before the second attempt in milliseconds (default: 1000).
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after each failure (default: 2.0).
    pub backoff_factor:   f64,
}

impl Default for RetryConfig
{
    fn default() -> Self
    {
        Self {
            max_attempts: 3, initial_delay_ms: 1000, backoff_factor: 2.0,
        }
    }
}

impl RetryConfig
{
    /// Delay before attempt `attempt + 1`, `attempt` counting from one.
    pub fn delay_after(&self, attempt: u32,) -> Duration
    {
        let exponent = attempt.saturating_sub(1,) as i32;
        let millis = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent,);
        Duration::from_millis(millis as u64,)
    }
}

/// Runs `f` until it succeeds or `config.max_attempts` attempts failed.
///
/// # Errors
///
/// Returns the error of the last attempt.
///
/// # Example
///
/// ```no_run
/// use ecosystem_automation::{Error, retry::{RetryConfig, retry_with_backoff}};
///
/// # async fn example() -> Result<(), Error> {
/// let config = RetryConfig::default();
/// let tag = retry_with_backoff(&config, "latest release", || async {
///     Ok::<_, Error,>("v2.24.0".to_string(),)
/// },)
/// .await?;
/// assert_eq!(tag, "v2.24.0");
/// # Ok(())
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T,>(config: &RetryConfig, operation_name: &str, mut f: F,) -> Result<T, Error,>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error,>,>,
{
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(result,) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result,);
            }
            Err(error,) if attempt >= config.max_attempts => {
                warn!("{} failed after {} attempts: {}", operation_name, attempt, error);
                return Err(error,);
            }
            Err(error,) => {
                let delay = config.delay_after(attempt,);
                warn!(
                    "{} failed on attempt {}/{}: {}. Retrying in {}ms",
                    operation_name,
                    attempt,
                    config.max_attempts,
                    error,
                    delay.as_millis()
                );
                sleep(delay,).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;

    fn fast(max_attempts: u32,) -> RetryConfig
    {
        RetryConfig {
            max_attempts, initial_delay_ms: 10, backoff_factor: 2.0,
        }
    }

    #[test]
    fn default_values()
    {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_delay_ms, 1000);
        assert_eq!(config.backoff_factor, 2.0);
    }

    #[test]
    fn delays_grow_geometrically()
    {
        let config = RetryConfig::default();
        assert_eq!(config.delay_after(1,), Duration::from_millis(1000,));
        assert_eq!(config.delay_after(2,), Duration::from_millis(2000,));
        assert_eq!(config.delay_after(3,), Duration::from_millis(4000,));
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt()
    {
        let result = retry_with_backoff(&fast(3,), "test", || async { Ok::<_, Error,>(42,) },)
            .await
            .expect("should succeed",);
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn succeeds_after_failures()
    {
        let calls = Arc::new(AtomicU32::new(0,),);
        let counter = calls.clone();

        let result = retry_with_backoff(&fast(3,), "test", move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst,) < 2 {
                    Err(Error::service("temporary failure",),)
                } else {
                    Ok(42,)
                }
            }
        },)
        .await
        .expect("should succeed after retries",);

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst,), 3);
    }

    #[tokio::test]
    async fn returns_last_error_after_max_attempts()
    {
        let calls = Arc::new(AtomicU32::new(0,),);
        let counter = calls.clone();

        let result = retry_with_backoff(&fast(2,), "test", move || {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst,) + 1;
                Err::<i32, _,>(Error::service(format!("failure {attempt}"),),)
            }
        },)
        .await;

        assert!(matches!(result, Err(Error::Service { ref message }) if message == "failure 2"));
        assert_eq!(calls.load(Ordering::SeqCst,), 2);
    }
}
