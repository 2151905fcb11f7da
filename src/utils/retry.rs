// Retry logic with inference-server estimated_time hint support
// Author: kelexine (https://github.com/kelexine)

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Parse the `estimated_time` hint an inference server sends while a model
/// is still loading, e.g. `{"error": "Model x is currently loading",
/// "estimated_time": 20.0}`. Returns the delay, capped at 60 seconds.
pub fn parse_retry_delay(error_json: &str) -> Option<Duration> {
    let parsed: Value = serde_json::from_str(error_json).ok()?;
    let seconds = parsed.get("estimated_time")?.as_f64()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    // Cap at 60 seconds
    let capped_seconds = seconds.min(60.0);
    Some(Duration::from_millis((capped_seconds * 1000.0) as u64))
}

/// Upper bound on any single wait between attempts
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Backoff used when the server gives no loading estimate
pub fn create_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_secs(1),
        initial_interval: Duration::from_secs(1),
        randomization_factor: 0.25,
        multiplier: 2.0,
        max_interval: MAX_DELAY,
        // Cold models can take a while to come up
        max_elapsed_time: Some(Duration::from_secs(180)),
        ..Default::default()
    }
}

/// Rate limits and server-side failures are worth another attempt
pub fn is_retryable(status: u16) -> bool {
    matches!(status, 429 | 500 | 502..=504)
}

/// Run `operation` until it succeeds, fails with a non-retryable status, or
/// `max_attempts` attempts have been made.
///
/// Errors are `(status, body)` pairs. Between attempts the server's
/// `estimated_time` hint is honoured when present, otherwise the wait grows
/// exponentially.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    max_attempts: u32,
    mut operation: F,
) -> Result<T, (u16, String)>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, (u16, String)>>,
{
    let max_attempts = max_attempts.max(1);
    let mut backoff = create_backoff();

    let mut attempt = 0;
    loop {
        attempt += 1;
        let (status, body) = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(failure) => failure,
        };

        if !is_retryable(status) || attempt >= max_attempts {
            if attempt > 1 {
                warn!("{} gave up after {} attempts", operation_name, attempt);
            }
            return Err((status, body));
        }

        let hinted = parse_retry_delay(&body);
        let delay = hinted
            .or_else(|| backoff.next_backoff())
            .unwrap_or(MAX_DELAY);
        debug!(
            "{} got {} on attempt {}/{}, waiting {}ms{}",
            operation_name,
            status,
            attempt,
            max_attempts,
            delay.as_millis(),
            if hinted.is_some() { " (server estimate)" } else { "" }
        );

        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_parse_retry_delay() {
        let error_json = r#"{"error": "Model distilgpt2 is currently loading", "estimated_time": 0.457}"#;
        let delay = parse_retry_delay(error_json).unwrap();
        assert_eq!(delay.as_millis(), 457);

        // Capped at 60s
        let slow = r#"{"error": "loading", "estimated_time": 120.0}"#;
        assert_eq!(parse_retry_delay(slow).unwrap().as_secs(), 60);

        assert!(parse_retry_delay(r#"{"error": "bad request"}"#).is_none());
        assert!(parse_retry_delay("not json").is_none());
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(429));
        assert!(is_retryable(500));
        assert!(is_retryable(503));
        assert!(!is_retryable(400));
        assert!(!is_retryable(404));
    }

    #[tokio::test]
    async fn test_non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", 5, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err((400, "bad".to_string())) }
        })
        .await;

        assert_eq!(result, Err((400, "bad".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", 5, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err((503, r#"{"estimated_time": 0.001}"#.to_string()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
