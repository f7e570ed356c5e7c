//! Exponential backoff for provider HTTP calls.
//!
//! Retries on 408, 429 and 5xx responses and on network errors. Client
//! errors such as 400 or 401 fail immediately.

use anyhow::Result;
use reqwest::{Response, StatusCode};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(20),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based), without jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let secs = self.initial_delay.as_secs_f64() * exp;
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Run `operation` until it yields a successful response, a non-retryable
/// status, or the attempt budget runs out.
pub async fn with_retry<F, Fut>(
    config: &RetryConfig,
    provider_name: &str,
    operation: F,
) -> Result<Response>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<Response>>,
{
    let mut last_error = String::from("no attempt made");

    for attempt in 1..=config.max_attempts {
        match operation().await {
            Ok(response) if response.status().is_success() => {
                if attempt > 1 {
                    tracing::info!("{} succeeded on attempt {}", provider_name, attempt);
                }
                return Ok(response);
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if !is_retryable_status(status) {
                    anyhow::bail!("{} API error ({}): {}", provider_name, status, body);
                }
                tracing::warn!(
                    "{} returned {} on attempt {}/{}: {}",
                    provider_name,
                    status,
                    attempt,
                    config.max_attempts,
                    body.chars().take(200).collect::<String>()
                );
                last_error = format!("{} ({}): {}", provider_name, status, body);
            }
            Err(e) => {
                tracing::warn!(
                    "{} network error on attempt {}/{}: {}",
                    provider_name,
                    attempt,
                    config.max_attempts,
                    e
                );
                last_error = format!("{}: {}", provider_name, e);
            }
        }

        if attempt < config.max_attempts {
            let wait = config.delay_for(attempt) + jitter();
            tracing::info!(
                "{} retrying in {:.1}s",
                provider_name,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
        }
    }

    anyhow::bail!(
        "All {} attempts exhausted. Last error: {}",
        config.max_attempts,
        last_error
    )
}

/// Random 0-250ms added to each wait.
fn jitter() -> Duration {
    use rand::Rng;
    Duration::from_millis(rand::thread_rng().gen_range(0..250))
}
