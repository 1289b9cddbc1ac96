//! Sequential retry with exponential backoff

use std::future::Future;
use std::time::Duration;
use log::{debug, error, warn};

/// Retry policy for one orchestrated call
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy
{   pub max_attempts: usize
  , pub backoff_multiplier: f32
  , pub initial_backoff: Duration
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_attempts: usize
    , backoff_multiplier: f32
    , initial_backoff_ms: u64
    ) -> Self
    {   RetryPolicy
        {   max_attempts: max_attempts.max(1)
          , backoff_multiplier
          , initial_backoff: Duration::from_millis(
              initial_backoff_ms
            )
        }
    }

    /// Calculate backoff after the failed attempt `attempt` (0-based)
    pub fn backoff_for_attempt(
      &self
    , attempt: usize
    ) -> Duration
    {   let multiplier
          = self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(
          (self.initial_backoff.as_millis() as f32
            * multiplier) as u64
        )
    }

    /// Run `operation` until it succeeds, fails with a non-retryable
    /// error, or the attempts are used up. Attempts never overlap; the
    /// last error is returned on exhaustion.
    pub async fn run<T, F, Fut>(
      &self
    , mut operation: F
    ) -> crate::Result<T>
      where F: FnMut(usize) -> Fut
          , Fut: Future<Output = crate::Result<T>>
    {   let mut attempt = 0;
        loop
        {   debug!("Attempt {} of {}", attempt + 1, self.max_attempts);

            let err = match operation(attempt).await
            {   Ok(value) => {
                  debug!("Succeeded after {} attempt(s)", attempt + 1);
                  return Ok(value);
                }
              , Err(e) => e
            };

            if !err.is_retryable()
            {   error!("Not retrying {:?}: {}", err.kind(), err);
                return Err(err);
            }

            if attempt + 1 >= self.max_attempts
            {   error!("Failed after {} attempts: {}", self.max_attempts, err);
                return Err(err);
            }

            let delay = self.backoff_for_attempt(attempt);
            warn!(
              "Attempt {} failed ({}), retrying in {:?}",
              attempt + 1, err, delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::new(3, 2.0, 1000)
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn vendor_error() -> Error
    {   Error::VendorError
        {   provider: crate::Provider::OpenAI
          , status: 500
          , body: "boom".into()
        }
    }

    #[test]
    fn test_backoff_schedule()
    {   let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_for_attempt(2), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_surfaces_last_error_after_two_delays()
    {   let policy = RetryPolicy::default();
        let starts = Arc::new(Mutex::new(Vec::new()));
        let origin = Instant::now();

        let result: crate::Result<()> = policy.run(|attempt| {
          let starts = starts.clone();
          async move {
            starts.lock().unwrap().push(origin.elapsed());
            Err(Error::VendorError
            {   provider: crate::Provider::OpenAI
              , status: 500
              , body: format!("attempt {}", attempt)
            })
          }
        }).await;

        match result
        {   Err(Error::VendorError { body, .. }) => assert_eq!(body, "attempt 2")
          , other => panic!("unexpected {:?}", other)
        }
        let starts = starts.lock().unwrap().clone();
        assert_eq!(starts.len(), 3);
        let slack = Duration::from_millis(10);
        for (start, expected) in starts.iter().zip([0u64, 1, 3])
        {   let expected = Duration::from_secs(expected);
            assert!(*start >= expected && *start < expected + slack, "{:?}", starts);
        }
        let total = origin.elapsed();
        assert!(total >= Duration::from_secs(3) && total < Duration::from_secs(3) + slack);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_key_short_circuits()
    {   let calls = AtomicUsize::new(0);
        let origin = Instant::now();
        let result: crate::Result<()> = RetryPolicy::default().run(|_| {
          calls.fetch_add(1, Ordering::SeqCst);
          async { Err(Error::MissingCredential(crate::Provider::Zhipu)) }
        }).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("API Key"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(origin.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_second_attempt()
    {   let calls = AtomicUsize::new(0);
        let result = RetryPolicy::default().run(|attempt| {
          calls.fetch_add(1, Ordering::SeqCst);
          async move
          {   if attempt == 0 { Err(vendor_error()) } else { Ok("done") }
          }
        }).await;
        let value = tokio_test::assert_ok!(result);
        assert_eq!(value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_is_not_retried()
    {   let calls = AtomicUsize::new(0);
        let result: crate::Result<()> = RetryPolicy::default().run(|_| {
          calls.fetch_add(1, Ordering::SeqCst);
          async { Err(Error::malformed("no keys")) }
        }).await;
        tokio_test::assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
