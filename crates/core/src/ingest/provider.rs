use crate::config::parsed_var;
use crate::domain::{FundamentalsSnapshot, InsiderRecord, Ticker};
use crate::ingest::{FetchError, FetchOutcome};
use anyhow::Context;
use reqwest::StatusCode;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ATTEMPTS: u32 = 2;

#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Day-over-day percent change of the close. `Ok(None)` when fewer than two closes exist.
    async fn price_change_pct(&self, ticker: &Ticker) -> FetchOutcome<Option<f64>>;
}

#[async_trait::async_trait]
pub trait FundamentalsSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fundamentals(&self, ticker: &Ticker) -> FetchOutcome<FundamentalsSnapshot>;
}

#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Up to `limit` headlines in feed order.
    async fn headlines(&self, ticker: &Ticker, limit: usize) -> FetchOutcome<Vec<String>>;
}

#[async_trait::async_trait]
pub trait InsiderSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn insider_records(&self, ticker: &Ticker) -> FetchOutcome<Vec<InsiderRecord>>;
}

/// Timeout and attempt budget shared by the HTTP-backed sources.
#[derive(Debug, Clone, Copy)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub attempts: u32,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl HttpOptions {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: parsed_var::<u64>("HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            attempts: parsed_var::<u32>("HTTP_ATTEMPTS")
                .unwrap_or(defaults.attempts)
                .max(1),
        }
    }

    pub fn build_client(&self, name: &str) -> anyhow::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("dst-signal-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| format!("failed to build {name} http client"))
    }
}

/// Sends the request built by `make` until it succeeds or the attempt budget runs out.
/// Transport errors, 429 and 5xx are retried with exponential backoff; other statuses fail
/// immediately.
pub(crate) async fn send_with_retry<F>(
    source: &'static str,
    attempts: u32,
    mut make: F,
) -> Result<String, FetchError>
where
    F: FnMut() -> reqwest::RequestBuilder,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let backoff = Duration::from_secs(1 << (attempt - 1).min(4));

        let res = match make().send().await {
            Ok(res) => res,
            Err(err) => {
                if attempt >= attempts {
                    return Err(FetchError::Transport(err));
                }
                tracing::warn!(source, attempt, ?backoff, error = %err, "request failed; retrying");
                tokio::time::sleep(backoff).await;
                continue;
            }
        };

        let status = res.status();
        if !status.is_success() {
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < attempts {
                tracing::warn!(source, attempt, ?backoff, http_status = %status, "HTTP error; retrying");
                tokio::time::sleep(backoff).await;
                continue;
            }
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        return res.text().await.map_err(FetchError::Transport);
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    if body.chars().count() <= MAX {
        return body.to_string();
    }
    let mut out: String = body.chars().take(MAX).collect();
    out.push_str("...");
    out
}
