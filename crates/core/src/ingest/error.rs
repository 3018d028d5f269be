/// Why an upstream call produced no usable data.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream reported an error: {0}")]
    Upstream(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Result of one fetcher call. Fetchers never return `Err`; failures degrade to a value the
/// aggregator can score neutrally, but stay distinguishable from a genuinely empty answer.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Ok(T),
    Degraded(FetchError),
    Unsupported,
}

impl<T> FetchOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(v) => Some(v),
            Self::Degraded(_) | Self::Unsupported => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            Self::Ok(v) => FetchOutcome::Ok(f(v)),
            Self::Degraded(err) => FetchOutcome::Degraded(err),
            Self::Unsupported => FetchOutcome::Unsupported,
        }
    }

    /// Logs a degraded outcome under `source` and falls back to `T::default()`.
    pub fn unwrap_or_log(self, source: &'static str, ticker: &crate::domain::Ticker) -> T
    where
        T: Default,
    {
        match self {
            Self::Ok(v) => v,
            Self::Degraded(err) => {
                tracing::warn!(%ticker, source, error = %err, "fetch degraded; using empty value");
                T::default()
            }
            Self::Unsupported => {
                tracing::debug!(%ticker, source, "ticker unsupported by source");
                T::default()
            }
        }
    }
}

impl<T> From<Result<T, FetchError>> for FetchOutcome<T> {
    fn from(value: Result<T, FetchError>) -> Self {
        match value {
            Ok(v) => Self::Ok(v),
            Err(err) => Self::Degraded(err),
        }
    }
}
