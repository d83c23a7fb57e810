//! Resilient fetcher: one idempotent GET, retried under a `RetryPolicy` until it succeeds.
//!
//! The network itself sits behind the `Transport` trait so the retry loop and the
//! paginator can be driven by scripted responses in tests.

use crate::error::FetchError;
use std::thread::sleep;
use std::time::Duration;

/// A single GET attempt. Implementations must treat any non-2xx status as an error.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).get(url)
    }
}

/// Blocking HTTP transport over `reqwest`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("graphscrape/", env!("CARGO_PKG_VERSION")));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            // Error bodies from the graph API are small JSON blobs; keep a prefix for the log.
            let body = resp.text().unwrap_or_default();
            let message: String = body.chars().take(200).collect();
            return Err(FetchError::Status { status: status.as_u16(), message });
        }
        let bytes = resp.bytes().map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Retry strategy for the fetcher.
/// Delay before retry `n` (1-based) is `initial_backoff * multiplier^(n-1)`, capped at `max_backoff`.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    /// Unbounded retries with a fixed 5 second pause.
    fn default() -> Self {
        Self::fixed(Duration::from_secs(5))
    }
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { max_attempts: None, initial_backoff: delay, multiplier: 1.0, max_backoff: delay }
    }

    pub fn exponential(initial: Duration, multiplier: f64, max_backoff: Duration) -> Self {
        Self { max_attempts: None, initial_backoff: initial, multiplier: multiplier.max(1.0), max_backoff }
    }

    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n.max(1));
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.max_attempts = None;
        self
    }

    /// Backoff to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(64) as i32;
        let nanos = self.initial_backoff.as_nanos() as f64 * self.multiplier.powi(exp);
        let capped = nanos.min(self.max_backoff.as_nanos() as f64);
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_nanos(capped.round() as u64)
        } else {
            self.max_backoff
        }
    }

    fn gives_up_after(&self, attempt: u32) -> bool {
        matches!(self.max_attempts, Some(max) if attempt >= max)
    }
}

/// Replace the value of the `access_token` query parameter so URLs can be logged.
pub fn redact_token(url: &str) -> String {
    let Some(start) = url.find("access_token=") else { return url.to_string() };
    let value_start = start + "access_token=".len();
    let value_end = url[value_start..].find('&').map(|i| value_start + i).unwrap_or(url.len());
    format!("{}REDACTED{}", &url[..value_start], &url[value_end..])
}

/// Wraps a `Transport` with a retry policy. Transient failures never reach the caller
/// unless the policy is bounded and runs out of attempts.
pub struct ResilientFetcher<T: Transport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> ResilientFetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// GET `url`, retrying per policy. Blocks for as long as the policy allows.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match self.transport.get(url) {
                Ok(body) => {
                    if attempt > 1 {
                        tracing::info!(url = %redact_token(url), attempt, "request succeeded after retry");
                    }
                    return Ok(body);
                }
                Err(e) if self.policy.gives_up_after(attempt) => {
                    tracing::error!(url = %redact_token(url), attempt, error = %e, "giving up on request");
                    return Err(FetchError::RetriesExhausted { attempts: attempt, last: Box::new(e) });
                }
                Err(e) => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        url = %redact_token(url),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "request failed, retrying"
                    );
                    if !delay.is_zero() {
                        sleep(delay);
                    }
                }
            }
        }
    }
}
