//! Exponential backoff with jitter (C10), grounded on
//! `original_source/utils/retry.py`.
//!
//! A plain higher-order function rather than a decorator/attribute macro,
//! per the Open Question/design-note guidance to keep this a value, not
//! magic: `with_retry(&config, || async { ... }).await`.

use crate::error::Error;
use rand::Rng;
use std::time::Duration;
use tracing::warn;

/// Status codes that should never be retried — the request itself is wrong.
const NON_RETRYABLE_STATUS_CODES: &[u16] = &[400, 401, 403, 404, 422];

/// Status codes worth retrying — the server or edge is transiently unhappy.
const RETRYABLE_STATUS_CODES: &[u16] = &[429, 500, 502, 503, 504];

const NETWORK_KEYWORDS: &[&str] = &["connection", "timeout", "network", "unreachable", "unavailable", "temporarily"];

/// Retry policy. Defaults mirror the Python original's env-driven defaults.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn from_env() -> Self {
        let mut config = RetryConfig::default();
        if let Ok(v) = std::env::var("MAX_RETRIES") {
            if let Ok(n) = v.parse() {
                config.max_retries = n;
            }
        }
        if let Ok(v) = std::env::var("RETRY_BASE_DELAY") {
            if let Ok(s) = v.parse::<f64>() {
                config.base_delay = Duration::from_secs_f64(s);
            }
        }
        if let Ok(v) = std::env::var("RETRY_MAX_DELAY") {
            if let Ok(s) = v.parse::<f64>() {
                config.max_delay = Duration::from_secs_f64(s);
            }
        }
        if let Ok(v) = std::env::var("RETRY_BACKOFF_BASE") {
            if let Ok(b) = v.parse() {
                config.exponential_base = b;
            }
        }
        config
    }

    /// `min(base * exponential_base^attempt, max_delay)`, optionally
    /// widened by `* (0.5 + random()*0.5)` jitter.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let raw = self.base_delay.as_secs_f64() * self.exponential_base.powi(attempt as i32);
        let capped = raw.min(self.max_delay.as_secs_f64());
        let delay = if self.jitter {
            let factor = 0.5 + rand::rng().random::<f64>() * 0.5;
            capped * factor
        } else {
            capped
        };
        Duration::from_secs_f64(delay.max(0.0))
    }
}

/// Classify an error as retryable. Non-retryable status-code substrings are
/// checked FIRST — an error string that happens to mention both a
/// non-retryable and a retryable code is treated as non-retryable.
pub fn is_retryable_error(message: &str) -> bool {
    let lower = message.to_lowercase();

    for code in NON_RETRYABLE_STATUS_CODES {
        if lower.contains(&code.to_string()) {
            return false;
        }
    }
    for code in RETRYABLE_STATUS_CODES {
        if lower.contains(&code.to_string()) {
            return true;
        }
    }
    NETWORK_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn error_message(error: &Error) -> String {
    error.to_string()
}

/// Run `op` up to `config.max_retries + 1` times, sleeping per
/// `calculate_delay` between attempts, stopping early on a non-retryable
/// error or success.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, mut op: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, Error>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let message = error_message(&e);
                if attempt >= config.max_retries || !is_retryable_error(&message) {
                    return Err(e);
                }
                let delay = config.calculate_delay(attempt);
                warn!(
                    "Retryable error on attempt {}/{}: {} (retrying in {:?})",
                    attempt + 1,
                    config.max_retries + 1,
                    message,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_retryable_code_wins_even_if_retryable_code_also_present() {
        assert!(!is_retryable_error("HTTP 400 after a 500 upstream"));
    }

    #[test]
    fn retryable_status_code_detected() {
        assert!(is_retryable_error("received 503 Service Unavailable"));
    }

    #[test]
    fn network_keyword_detected() {
        assert!(is_retryable_error("connection reset by peer"));
    }

    #[test]
    fn unrelated_error_is_not_retryable() {
        assert!(!is_retryable_error("invalid JSON payload"));
    }

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let config = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };
        assert_eq!(config.calculate_delay(0), Duration::from_secs(1));
        assert_eq!(config.calculate_delay(1), Duration::from_secs(2));
        assert_eq!(config.calculate_delay(10), config.max_delay);
    }

    #[tokio::test]
    async fn with_retry_stops_after_non_retryable_error() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..RetryConfig::default()
        };
        let mut calls = 0;
        let result: Result<(), Error> = with_retry(&config, || {
            calls += 1;
            async { Err(Error::InvalidInput("HTTP 400 bad request".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
